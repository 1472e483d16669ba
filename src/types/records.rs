use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Session-scoped identifier assigned by the live session provider.
/// Valid only until the provider restarts.
pub type SessionId = i64;

/// Stable storage key for a record. Derived from the live id when the
/// record is created and re-derived whenever the record is rebound to a
/// new live id; meanwhile it outlives the id it was derived from.
pub type RecordKey = String;

/// Derives the storage key for a live id.
pub fn record_key(id: SessionId) -> RecordKey {
    id.to_string()
}

/// The closed set of group colors the session provider supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

/// Durable counterpart of a tab. Closed tabs have no live id; their URL
/// is the identity key for history merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabRecord {
    pub id: Option<SessionId>,
    pub closed: bool,
    pub title: String,
    pub url: String,
}

impl TabRecord {
    /// Builds an open record from a live tab's current state.
    pub fn open(id: SessionId, title: &str, url: &str) -> Self {
        Self {
            id: Some(id),
            closed: false,
            title: title.to_string(),
            url: url.to_string(),
        }
    }

    /// Marks the tab closed, clearing its live id.
    pub fn mark_closed(&mut self) {
        self.id = None;
        self.closed = true;
    }
}

/// Durable counterpart of a tab group. Owned by exactly one WindowRecord
/// at a time; moves transfer the record object, never duplicate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: Option<SessionId>,
    pub closed: bool,
    pub title: String,
    pub color: Option<GroupColor>,
    /// Always equals the key of the WindowRecord containing this group.
    pub window_key: RecordKey,
    pub collapsed: bool,
    /// Live ordering within the window when known; stale otherwise.
    pub position: u32,
    pub tabs: Vec<TabRecord>,
}

impl GroupRecord {
    /// Marks the group closed. Tab records are left untouched: tabs that
    /// were live at close time keep `closed: false` so resurrection
    /// recreates exactly them.
    pub fn mark_closed(&mut self) {
        self.closed = true;
    }

    /// Finds a tab record by live id if one is given, else by URL.
    pub fn find_tab_mut(
        &mut self,
        id: Option<SessionId>,
        url: &str,
    ) -> Option<&mut TabRecord> {
        if let Some(id) = id {
            if let Some(pos) = self.tabs.iter().position(|t| t.id == Some(id)) {
                return self.tabs.get_mut(pos);
            }
        }
        self.tabs.iter_mut().find(|t| t.url == url)
    }
}

/// Durable counterpart of a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: Option<SessionId>,
    pub closed: bool,
    pub name: Option<String>,
    pub groups: BTreeMap<RecordKey, GroupRecord>,
}

impl WindowRecord {
    /// Creates a fresh open record bound to a live window.
    pub fn fresh(id: SessionId) -> Self {
        Self {
            id: Some(id),
            closed: false,
            name: None,
            groups: BTreeMap::new(),
        }
    }

    /// Marks the window and all its groups closed.
    pub fn mark_closed(&mut self) {
        self.closed = true;
        for group in self.groups.values_mut() {
            group.mark_closed();
        }
    }
}

/// The sole persisted aggregate. Read and replaced atomically as one unit.
/// BTreeMap keys keep serialization order deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageDocument {
    pub windows: BTreeMap<RecordKey, WindowRecord>,
}

impl StorageDocument {
    /// Finds the window record bearing the given live id, if any.
    pub fn locate_window_by_id(&self, id: SessionId) -> Option<RecordKey> {
        self.windows
            .iter()
            .find(|(_, w)| w.id == Some(id))
            .map(|(key, _)| key.clone())
    }

    /// Finds the (window key, group key) location of the group record
    /// bearing the given live id, if any.
    pub fn locate_group_by_id(&self, id: SessionId) -> Option<(RecordKey, RecordKey)> {
        for (wkey, window) in &self.windows {
            for (gkey, group) in &window.groups {
                if group.id == Some(id) {
                    return Some((wkey.clone(), gkey.clone()));
                }
            }
        }
        None
    }

    /// Finds the (window key, group key) location of the group record
    /// owning an open tab with the given live id.
    pub fn locate_tab_owner(&self, tab_id: SessionId) -> Option<(RecordKey, RecordKey)> {
        for (wkey, window) in &self.windows {
            for (gkey, group) in &window.groups {
                if group.tabs.iter().any(|t| t.id == Some(tab_id)) {
                    return Some((wkey.clone(), gkey.clone()));
                }
            }
        }
        None
    }

    pub fn group(&self, window_key: &str, group_key: &str) -> Option<&GroupRecord> {
        self.windows.get(window_key)?.groups.get(group_key)
    }

    pub fn group_mut(&mut self, window_key: &str, group_key: &str) -> Option<&mut GroupRecord> {
        self.windows.get_mut(window_key)?.groups.get_mut(group_key)
    }

    /// Removes a group record from its window and returns it.
    pub fn take_group(&mut self, window_key: &str, group_key: &str) -> Option<GroupRecord> {
        self.windows.get_mut(window_key)?.groups.remove(group_key)
    }

    /// Inserts a group record under the given window, stamping its
    /// `window_key` so the ownership invariant holds.
    pub fn insert_group(
        &mut self,
        window_key: &str,
        group_key: RecordKey,
        mut group: GroupRecord,
    ) {
        group.window_key = window_key.to_string();
        if let Some(window) = self.windows.get_mut(window_key) {
            window.groups.insert(group_key, group);
        }
    }

    /// Drops every window record left with zero groups.
    pub fn prune_empty_windows(&mut self) {
        self.windows.retain(|_, w| !w.groups.is_empty());
    }
}
