//! In-memory session provider.
//!
//! Backs the `tabvault-rpc` reference binary and the test suite. Ids are
//! assigned from one monotonic counter; [`MemorySession::restart`]
//! reassigns every id while preserving structure, simulating the id
//! instability of a real provider restart.

use std::cell::Cell;
use std::collections::HashMap;

use crate::types::errors::ProviderError;
use crate::types::records::{GroupColor, SessionId};
use crate::types::session::{LiveGroup, LiveTab, LiveWindow};

use super::SessionProvider;

struct WindowState {
    id: SessionId,
}

struct GroupState {
    id: SessionId,
    window_id: SessionId,
    title: String,
    color: GroupColor,
    collapsed: bool,
}

struct TabState {
    id: SessionId,
    window_id: SessionId,
    group_id: Option<SessionId>,
    title: String,
    url: String,
    active: bool,
}

/// In-memory live session. Vec order is live order: groups within a
/// window and tabs within a group appear in insertion/move order.
pub struct MemorySession {
    next_id: SessionId,
    windows: Vec<WindowState>,
    groups: Vec<GroupState>,
    tabs: Vec<TabState>,
    focused: Option<SessionId>,
    fail_next: Cell<bool>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            windows: Vec::new(),
            groups: Vec::new(),
            tabs: Vec::new(),
            focused: None,
            fail_next: Cell::new(false),
        }
    }

    fn alloc(&mut self) -> SessionId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Makes the next faultable provider call fail with a transient error.
    pub fn fail_next(&self) {
        self.fail_next.set(true);
    }

    fn check_fault(&self) -> Result<(), ProviderError> {
        if self.fail_next.replace(false) {
            return Err(ProviderError::Transient("injected fault".to_string()));
        }
        Ok(())
    }

    fn group_state(&self, id: SessionId) -> Result<&GroupState, ProviderError> {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| ProviderError::NotFound(format!("group {}", id)))
    }

    fn to_live_group(&self, group: &GroupState) -> LiveGroup {
        LiveGroup {
            id: group.id,
            window_id: group.window_id,
            title: group.title.clone(),
            color: group.color,
            collapsed: group.collapsed,
        }
    }

    fn to_live_tab(&self, tab: &TabState) -> LiveTab {
        LiveTab {
            id: tab.id,
            window_id: tab.window_id,
            group_id: tab.group_id,
            title: tab.title.clone(),
            url: tab.url.clone(),
            active: tab.active,
        }
    }

    // --- Simulation helpers (the "user" side of the session) ---

    /// Opens a new window and focuses it. Same as the trait's
    /// `create_window`, named for test readability.
    pub fn add_window(&mut self) -> SessionId {
        let id = self.alloc();
        self.windows.push(WindowState { id });
        self.focused = Some(id);
        id
    }

    /// Creates an empty group in the window and returns its id.
    pub fn add_group(&mut self, window_id: SessionId, title: &str, color: GroupColor) -> SessionId {
        let group_id = self.alloc();
        self.groups.push(GroupState {
            id: group_id,
            window_id,
            title: title.to_string(),
            color,
            collapsed: false,
        });
        group_id
    }

    /// Opens a tab inside an existing group.
    pub fn add_tab(&mut self, group_id: SessionId, title: &str, url: &str) -> SessionId {
        let window_id = self
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.window_id)
            .unwrap_or(0);
        let id = self.alloc();
        self.tabs.push(TabState {
            id,
            window_id,
            group_id: Some(group_id),
            title: title.to_string(),
            url: url.to_string(),
            active: false,
        });
        id
    }

    /// Rewrites a tab's title and URL (a navigation).
    pub fn update_tab(&mut self, id: SessionId, title: &str, url: &str) {
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
            tab.title = title.to_string();
            tab.url = url.to_string();
        }
    }

    /// Closes a single tab. A group whose last tab closes disappears.
    pub fn close_tab(&mut self, id: SessionId) {
        let group = self
            .tabs
            .iter()
            .find(|t| t.id == id)
            .and_then(|t| t.group_id);
        self.tabs.retain(|t| t.id != id);
        if let Some(gid) = group {
            if !self.tabs.iter().any(|t| t.group_id == Some(gid)) {
                self.groups.retain(|g| g.id != gid);
            }
        }
    }

    /// Moves a group and its tabs to another window, placing it last.
    pub fn move_group(&mut self, group_id: SessionId, window_id: SessionId) {
        if let Some(pos) = self.groups.iter().position(|g| g.id == group_id) {
            let mut group = self.groups.remove(pos);
            group.window_id = window_id;
            self.groups.push(group);
            for tab in self.tabs.iter_mut().filter(|t| t.group_id == Some(group_id)) {
                tab.window_id = window_id;
            }
        }
    }

    /// Removes a group and closes all its tabs.
    pub fn remove_group(&mut self, group_id: SessionId) {
        self.groups.retain(|g| g.id != group_id);
        self.tabs.retain(|t| t.group_id != Some(group_id));
    }

    /// Closes a window along with its groups and tabs.
    pub fn close_window(&mut self, window_id: SessionId) {
        self.windows.retain(|w| w.id != window_id);
        self.groups.retain(|g| g.window_id != window_id);
        self.tabs.retain(|t| t.window_id != window_id);
        if self.focused == Some(window_id) {
            self.focused = None;
        }
    }

    /// Simulates a provider restart: every window, group, and tab gets a
    /// fresh id while structure and order are preserved. Focus is lost.
    pub fn restart(&mut self) {
        let mut window_map: HashMap<SessionId, SessionId> = HashMap::new();
        let mut group_map: HashMap<SessionId, SessionId> = HashMap::new();

        let window_ids: Vec<SessionId> = self.windows.iter().map(|w| w.id).collect();
        for old in window_ids {
            let new = self.alloc();
            window_map.insert(old, new);
        }
        let group_ids: Vec<SessionId> = self.groups.iter().map(|g| g.id).collect();
        for old in group_ids {
            let new = self.alloc();
            group_map.insert(old, new);
        }

        for window in &mut self.windows {
            window.id = window_map[&window.id];
        }
        for group in &mut self.groups {
            group.id = group_map[&group.id];
            group.window_id = window_map[&group.window_id];
        }
        let tab_ids: Vec<SessionId> = self.tabs.iter().map(|t| t.id).collect();
        let mut fresh_tab_ids = Vec::with_capacity(tab_ids.len());
        for _ in &tab_ids {
            fresh_tab_ids.push(self.next_id);
            self.next_id += 1;
        }
        for (tab, new_id) in self.tabs.iter_mut().zip(fresh_tab_ids) {
            tab.id = new_id;
            tab.window_id = window_map[&tab.window_id];
            tab.group_id = tab.group_id.map(|g| group_map[&g]);
        }
        self.focused = None;
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider for MemorySession {
    fn windows(&self) -> Result<Vec<LiveWindow>, ProviderError> {
        self.check_fault()?;
        Ok(self
            .windows
            .iter()
            .map(|w| LiveWindow {
                id: w.id,
                focused: self.focused == Some(w.id),
            })
            .collect())
    }

    fn window(&self, id: SessionId) -> Result<LiveWindow, ProviderError> {
        self.windows
            .iter()
            .find(|w| w.id == id)
            .map(|w| LiveWindow {
                id: w.id,
                focused: self.focused == Some(w.id),
            })
            .ok_or_else(|| ProviderError::NotFound(format!("window {}", id)))
    }

    fn create_window(&mut self) -> Result<LiveWindow, ProviderError> {
        self.check_fault()?;
        let id = self.alloc();
        self.windows.push(WindowState { id });
        // New windows open with one blank tab, like the real provider.
        let tab_id = self.alloc();
        self.tabs.push(TabState {
            id: tab_id,
            window_id: id,
            group_id: None,
            title: "New Tab".to_string(),
            url: "about:blank".to_string(),
            active: true,
        });
        self.focused = Some(id);
        Ok(LiveWindow { id, focused: true })
    }

    fn focus_window(&mut self, id: SessionId) -> Result<(), ProviderError> {
        if !self.windows.iter().any(|w| w.id == id) {
            return Err(ProviderError::NotFound(format!("window {}", id)));
        }
        self.focused = Some(id);
        Ok(())
    }

    fn focused_window(&self) -> Result<Option<SessionId>, ProviderError> {
        Ok(self.focused)
    }

    fn group(&self, id: SessionId) -> Result<LiveGroup, ProviderError> {
        self.check_fault()?;
        let group = self.group_state(id)?;
        Ok(self.to_live_group(group))
    }

    fn groups_in_window(&self, window_id: SessionId) -> Result<Vec<LiveGroup>, ProviderError> {
        Ok(self
            .groups
            .iter()
            .filter(|g| g.window_id == window_id)
            .map(|g| self.to_live_group(g))
            .collect())
    }

    fn update_group(
        &mut self,
        id: SessionId,
        title: Option<&str>,
        color: Option<GroupColor>,
        collapsed: Option<bool>,
    ) -> Result<LiveGroup, ProviderError> {
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| ProviderError::NotFound(format!("group {}", id)))?;
        if let Some(title) = title {
            group.title = title.to_string();
        }
        if let Some(color) = color {
            group.color = color;
        }
        if let Some(collapsed) = collapsed {
            group.collapsed = collapsed;
        }
        let live = LiveGroup {
            id: group.id,
            window_id: group.window_id,
            title: group.title.clone(),
            color: group.color,
            collapsed: group.collapsed,
        };
        Ok(live)
    }

    fn tab(&self, id: SessionId) -> Result<LiveTab, ProviderError> {
        self.tabs
            .iter()
            .find(|t| t.id == id)
            .map(|t| self.to_live_tab(t))
            .ok_or_else(|| ProviderError::NotFound(format!("tab {}", id)))
    }

    fn tabs_in_group(&self, group_id: SessionId) -> Result<Vec<LiveTab>, ProviderError> {
        self.check_fault()?;
        self.group_state(group_id)?;
        Ok(self
            .tabs
            .iter()
            .filter(|t| t.group_id == Some(group_id))
            .map(|t| self.to_live_tab(t))
            .collect())
    }

    fn create_tab(
        &mut self,
        window_id: SessionId,
        url: &str,
        active: bool,
    ) -> Result<LiveTab, ProviderError> {
        self.check_fault()?;
        if !self.windows.iter().any(|w| w.id == window_id) {
            return Err(ProviderError::NotFound(format!("window {}", window_id)));
        }
        let id = self.alloc();
        let tab = TabState {
            id,
            window_id,
            group_id: None,
            title: url.to_string(),
            url: url.to_string(),
            active,
        };
        let live = self.to_live_tab(&tab);
        self.tabs.push(tab);
        Ok(live)
    }

    fn focus_tab(&mut self, id: SessionId) -> Result<(), ProviderError> {
        let window_id = self
            .tabs
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.window_id)
            .ok_or_else(|| ProviderError::NotFound(format!("tab {}", id)))?;
        for tab in self.tabs.iter_mut().filter(|t| t.window_id == window_id) {
            tab.active = tab.id == id;
        }
        self.focused = Some(window_id);
        Ok(())
    }

    fn remove_tab(&mut self, id: SessionId) -> Result<(), ProviderError> {
        if !self.tabs.iter().any(|t| t.id == id) {
            return Err(ProviderError::NotFound(format!("tab {}", id)));
        }
        self.close_tab(id);
        Ok(())
    }

    fn group_tabs(
        &mut self,
        tab_ids: &[SessionId],
        group_id: Option<SessionId>,
        window_id: SessionId,
    ) -> Result<SessionId, ProviderError> {
        let target = match group_id {
            Some(id) => {
                self.group_state(id)?;
                id
            }
            None => {
                let id = self.alloc();
                self.groups.push(GroupState {
                    id,
                    window_id,
                    title: String::new(),
                    color: GroupColor::Grey,
                    collapsed: false,
                });
                id
            }
        };
        let target_window = self.group_state(target)?.window_id;
        for tab_id in tab_ids {
            let tab = self
                .tabs
                .iter_mut()
                .find(|t| t.id == *tab_id)
                .ok_or_else(|| ProviderError::NotFound(format!("tab {}", tab_id)))?;
            tab.group_id = Some(target);
            tab.window_id = target_window;
        }
        Ok(target)
    }
}
