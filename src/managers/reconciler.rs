//! Reconciliation between the live session and the durable mirror.
//!
//! The reconciler never trusts event payloads for state: every sync
//! re-reads the live objects it touches and rewrites the affected
//! records. Absence of a live object — whether reported as not-found or
//! degraded from a transient provider failure — always results in
//! "mark closed", never in record removal.

use std::collections::HashSet;

use log::warn;

use crate::database::Store;
use crate::managers::{identity_resolver, tab_merger};
use crate::session::SessionProvider;
use crate::types::errors::{EngineError, ProviderError};
use crate::types::events::SessionEvent;
use crate::types::records::{
    record_key, GroupRecord, RecordKey, SessionId, StorageDocument, WindowRecord,
};
use crate::types::session::{LiveGroup, LiveTab, LiveWindow};

/// Sync procedures driven by session events. Reads the live session,
/// resolves identities, merges tab history, and writes the document back
/// through the store.
pub struct Reconciler<'a, P: SessionProvider> {
    provider: &'a P,
    store: &'a Store,
}

impl<'a, P: SessionProvider> Reconciler<'a, P> {
    pub fn new(provider: &'a P, store: &'a Store) -> Self {
        Self { provider, store }
    }

    // --- Probes: absence and transient failure both read as "absent" ---

    fn probe_windows(&self) -> Vec<LiveWindow> {
        match self.provider.windows() {
            Ok(windows) => windows,
            Err(e) => {
                warn!("window listing degraded to empty: {}", e);
                Vec::new()
            }
        }
    }

    fn probe_window(&self, id: SessionId) -> Option<LiveWindow> {
        match self.provider.window(id) {
            Ok(window) => Some(window),
            Err(ProviderError::NotFound(_)) => None,
            Err(ProviderError::Transient(msg)) => {
                warn!("treating window {} as absent: {}", id, msg);
                None
            }
        }
    }

    fn probe_group(&self, id: SessionId) -> Option<LiveGroup> {
        match self.provider.group(id) {
            Ok(group) => Some(group),
            Err(ProviderError::NotFound(_)) => None,
            Err(ProviderError::Transient(msg)) => {
                warn!("treating group {} as absent: {}", id, msg);
                None
            }
        }
    }

    fn probe_groups_in_window(&self, window_id: SessionId) -> Vec<LiveGroup> {
        match self.provider.groups_in_window(window_id) {
            Ok(groups) => groups,
            Err(e) => {
                warn!("group listing for window {} degraded to empty: {}", window_id, e);
                Vec::new()
            }
        }
    }

    fn probe_tabs_in_group(&self, group_id: SessionId) -> Vec<LiveTab> {
        match self.provider.tabs_in_group(group_id) {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("tab listing for group {} degraded to empty: {}", group_id, e);
                Vec::new()
            }
        }
    }

    // --- Event entry point ---

    /// Applies one session event to the document. Focus changes carry no
    /// data mutation; the engine forwards them as notices.
    pub fn handle_event(&self, event: &SessionEvent) -> Result<(), EngineError> {
        match event {
            SessionEvent::GroupCreated { group } | SessionEvent::GroupMoved { group } => {
                self.sync_group(group.id, Some(group.window_id), true)
            }
            SessionEvent::GroupUpdated { group } => {
                self.sync_group(group.id, Some(group.window_id), false)
            }
            SessionEvent::GroupRemoved { group_id } => self.mark_group_closed(*group_id),
            SessionEvent::TabCreated { tab }
            | SessionEvent::TabUpdated { tab }
            | SessionEvent::TabMoved { tab } => match tab.group_id {
                Some(group_id) => self.sync_group(group_id, Some(tab.window_id), false),
                None => Ok(()),
            },
            SessionEvent::TabDetached { group_id, .. } => match group_id {
                Some(group_id) => self.sync_group(*group_id, None, true),
                None => Ok(()),
            },
            SessionEvent::TabAttached {
                group_id,
                window_id,
                ..
            } => match group_id {
                Some(group_id) => self.sync_group(*group_id, Some(*window_id), true),
                None => Ok(()),
            },
            SessionEvent::TabRemoved { tab_id, .. } => self.sync_tab_owner(*tab_id),
            SessionEvent::WindowRemoved { window_id } => self.mark_window_closed(*window_id),
            SessionEvent::WindowFocusChanged { .. } => Ok(()),
        }
    }

    // --- Full reconcile ---

    /// Rebuilds the whole mirror from the live session: binds every live
    /// window, syncs every live group, sweeps records whose live object
    /// is gone to closed, and prunes windows left without groups.
    /// Idempotent: a second run with no live changes writes an identical
    /// document.
    pub fn full_reconcile(&self) -> Result<(), EngineError> {
        let mut document = self.store.load()?;
        let live_windows = self.probe_windows();

        for window in &live_windows {
            self.sync_window_in(&mut document, window.id);
        }

        for window in &live_windows {
            for group in self.probe_groups_in_window(window.id) {
                self.sync_group_in(&mut document, group.id, Some(window.id), false);
            }
        }

        self.sweep_closed(&mut document);
        document.prune_empty_windows();
        self.store.save(&document)?;
        Ok(())
    }

    /// Marks every record whose live counterpart no longer exists as
    /// closed. Entities synced earlier in the same pass carry live ids
    /// that still probe, so they are never re-closed here.
    fn sweep_closed(&self, document: &mut StorageDocument) {
        for window in document.windows.values_mut() {
            let live = window.id.and_then(|id| self.probe_window(id));
            if live.is_none() {
                window.mark_closed();
                continue;
            }
            for group in window.groups.values_mut() {
                let alive = group.id.and_then(|id| self.probe_group(id)).is_some();
                if !alive {
                    group.mark_closed();
                }
            }
        }
    }

    // --- Single-entity sync ---

    /// Syncs one group's record from its live state, creating the record
    /// (and its window record) as needed.
    pub fn sync_group(
        &self,
        group_id: SessionId,
        window_id: Option<SessionId>,
        update_positions: bool,
    ) -> Result<(), EngineError> {
        let mut document = self.store.load()?;
        self.sync_group_in(&mut document, group_id, window_id, update_positions);
        self.store.save(&document)?;
        Ok(())
    }

    fn sync_group_in(
        &self,
        document: &mut StorageDocument,
        group_id: SessionId,
        window_id: Option<SessionId>,
        update_positions: bool,
    ) {
        let live = match self.probe_group(group_id) {
            Some(group) => group,
            None => return,
        };

        // Mid-detach: the group has left its window and has not arrived
        // anywhere yet. Strip it; the attach event re-syncs it.
        let window_id = match window_id {
            Some(id) => id,
            None => {
                if let Some((wkey, gkey)) = document.locate_group_by_id(group_id) {
                    document.take_group(&wkey, &gkey);
                }
                return;
            }
        };

        // Bounded retry instead of recursion: one window-sync attempt,
        // then one re-check.
        let mut window_key = None;
        for _ in 0..2 {
            match self.find_window_key(document, window_id) {
                Some(key) => {
                    window_key = Some(key);
                    break;
                }
                None => {
                    self.sync_window_in(document, window_id);
                }
            }
        }
        let window_key = match window_key {
            Some(key) => key,
            None => return,
        };

        let found = identity_resolver::resolve_group(document, &live, &window_key);
        let prior = found
            .as_ref()
            .and_then(|m| document.group(&m.window_key, &m.group_key))
            .map(|g| g.tabs.clone())
            .unwrap_or_default();
        let live_tabs = self.probe_tabs_in_group(group_id);
        let merged = tab_merger::merge_tab_history(&live_tabs, &prior);

        let siblings = self.probe_groups_in_window(window_id);
        let live_position = siblings
            .iter()
            .position(|g| g.id == group_id)
            .map(|i| i as u32);

        match found {
            Some(m) => {
                // take + insert so a cross-window move transfers the one
                // record instead of copying it.
                if let Some(mut record) = document.take_group(&m.window_key, &m.group_key) {
                    let position = live_position.unwrap_or(record.position);
                    record.id = Some(live.id);
                    record.closed = false;
                    record.title = live.title.clone();
                    record.color = Some(live.color);
                    record.collapsed = live.collapsed;
                    record.position = position;
                    record.tabs = merged;
                    document.insert_group(&window_key, m.group_key, record);
                }
            }
            None => {
                let record = GroupRecord {
                    id: Some(live.id),
                    closed: false,
                    title: live.title.clone(),
                    color: Some(live.color),
                    window_key: window_key.clone(),
                    collapsed: live.collapsed,
                    position: live_position.unwrap_or(0),
                    tabs: merged,
                };
                document.insert_group(&window_key, record_key(live.id), record);
            }
        }

        if update_positions {
            for (index, sibling) in siblings.iter().enumerate() {
                if sibling.id == group_id {
                    continue;
                }
                if let Some((wkey, gkey)) = document.locate_group_by_id(sibling.id) {
                    if let Some(record) = document.group_mut(&wkey, &gkey) {
                        record.position = index as u32;
                    }
                }
            }
        }
    }

    /// Binds a live window to a record, rekeying a matched record to the
    /// live id or creating a fresh one. Returns the record's key.
    fn sync_window_in(&self, document: &mut StorageDocument, window_id: SessionId) -> RecordKey {
        if let Some(key) = self.find_window_key(document, window_id) {
            if let Some(record) = document.windows.get_mut(&key) {
                record.id = Some(window_id);
                record.closed = false;
            }
            return key;
        }

        let live_titles: HashSet<String> = self
            .probe_groups_in_window(window_id)
            .into_iter()
            .map(|g| g.title)
            .collect();
        let live_window_ids: HashSet<SessionId> =
            self.probe_windows().into_iter().map(|w| w.id).collect();

        let new_key = record_key(window_id);
        match identity_resolver::resolve_window(document, &live_titles, &live_window_ids) {
            Some(old_key) => {
                if let Some(mut record) = document.windows.remove(&old_key) {
                    record.id = Some(window_id);
                    record.closed = false;
                    for group in record.groups.values_mut() {
                        group.window_key = new_key.clone();
                    }
                    document.windows.insert(new_key.clone(), record);
                }
            }
            None => {
                document
                    .windows
                    .insert(new_key.clone(), WindowRecord::fresh(window_id));
            }
        }
        new_key
    }

    fn find_window_key(
        &self,
        document: &StorageDocument,
        window_id: SessionId,
    ) -> Option<RecordKey> {
        let key = record_key(window_id);
        if document.windows.contains_key(&key) {
            return Some(key);
        }
        document.locate_window_by_id(window_id)
    }

    // --- Closed-marking ---

    fn mark_group_closed(&self, group_id: SessionId) -> Result<(), EngineError> {
        let mut document = self.store.load()?;
        if let Some((wkey, gkey)) = document.locate_group_by_id(group_id) {
            if let Some(record) = document.group_mut(&wkey, &gkey) {
                record.mark_closed();
            }
            self.store.save(&document)?;
        }
        Ok(())
    }

    fn mark_window_closed(&self, window_id: SessionId) -> Result<(), EngineError> {
        let mut document = self.store.load()?;
        if let Some(key) = document.locate_window_by_id(window_id) {
            if let Some(record) = document.windows.get_mut(&key) {
                record.mark_closed();
            }
            self.store.save(&document)?;
        }
        Ok(())
    }

    /// A tab was removed: find the record that owns it and re-sync that
    /// group from live state, using the live group's own window rather
    /// than the event payload.
    fn sync_tab_owner(&self, tab_id: SessionId) -> Result<(), EngineError> {
        let document = self.store.load()?;
        let owner = document.locate_tab_owner(tab_id).and_then(|(wkey, gkey)| {
            document.group(&wkey, &gkey).and_then(|g| g.id)
        });
        let group_id = match owner {
            Some(id) => id,
            None => return Ok(()),
        };
        match self.probe_group(group_id) {
            Some(live) => self.sync_group(group_id, Some(live.window_id), false),
            // The group vanished with its last tab; the group-removed
            // event marks it closed.
            None => Ok(()),
        }
    }
}
