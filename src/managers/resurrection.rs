//! Resurrection of durable records into live session objects.
//!
//! The reverse direction of reconciliation: given a record whose live
//! counterpart is gone, recreate (or just focus) the live object, then
//! rebind the record's identity — live ids and storage keys — to what the
//! provider handed back. Closed tabs are history and are never
//! resurrected.

use log::warn;

use crate::database::Store;
use crate::session::SessionProvider;
use crate::types::errors::{EngineError, ProviderError};
use crate::types::records::{record_key, RecordKey, SessionId, StorageDocument, TabRecord};

fn provider_err(e: ProviderError) -> EngineError {
    EngineError::Provider(e.to_string())
}

/// Recreates live objects from durable records and rebinds identities.
pub struct Resurrector<'a, P: SessionProvider> {
    provider: &'a mut P,
    store: &'a Store,
}

impl<'a, P: SessionProvider> Resurrector<'a, P> {
    pub fn new(provider: &'a mut P, store: &'a Store) -> Self {
        Self { provider, store }
    }

    /// Focuses the window bound to the record, creating a live window and
    /// rebinding the record if its id is stale. Returns the live id.
    pub fn resurrect_window(&mut self, window_key: &str) -> Result<SessionId, EngineError> {
        let mut document = self.store.load()?;
        let (window_id, _) = self.resurrect_window_in(&mut document, window_key)?;
        self.store.save(&document)?;
        Ok(window_id)
    }

    /// Focuses the group bound to the record, resurrecting its window and
    /// recreating its non-closed tabs if the group is gone. Returns the
    /// live group id.
    pub fn resurrect_group(
        &mut self,
        window_key: &str,
        group_key: &str,
    ) -> Result<SessionId, EngineError> {
        let mut document = self.store.load()?;
        let group_id = self.resurrect_group_in(&mut document, window_key, group_key)?;
        self.store.save(&document)?;
        Ok(group_id)
    }

    /// Focuses the live tab bound to the record, resurrecting the owning
    /// group and creating the tab if needed. Returns the live tab id.
    pub fn resurrect_tab(
        &mut self,
        window_key: &str,
        group_key: &str,
        tab: &TabRecord,
    ) -> Result<SessionId, EngineError> {
        if let Some(id) = tab.id {
            match self.provider.focus_tab(id) {
                Ok(()) => return Ok(id),
                Err(ProviderError::NotFound(_)) => {}
                Err(ProviderError::Transient(msg)) => {
                    warn!("focus of tab {} degraded to resurrection: {}", id, msg);
                }
            }
        }

        let mut document = self.store.load()?;
        let group_id = self.resurrect_group_in(&mut document, window_key, group_key)?;
        let (wkey, gkey) = document
            .locate_group_by_id(group_id)
            .ok_or_else(|| EngineError::RecordMissing(format!("group {}", group_id)))?;

        let live_tabs = self
            .provider
            .tabs_in_group(group_id)
            .map_err(provider_err)?;

        let tab_id = match live_tabs.iter().find(|t| t.url == tab.url) {
            // The URL is already open in the group; focus instead of
            // duplicating it.
            Some(existing) => {
                let _ = self.provider.focus_tab(existing.id);
                if let Some(record) = document
                    .group_mut(&wkey, &gkey)
                    .and_then(|g| g.find_tab_mut(tab.id, &tab.url))
                {
                    record.id = Some(existing.id);
                    record.closed = false;
                    record.title = existing.title.clone();
                }
                existing.id
            }
            None => {
                let group = self.provider.group(group_id).map_err(provider_err)?;
                let created = self
                    .provider
                    .create_tab(group.window_id, &tab.url, true)
                    .map_err(provider_err)?;
                self.provider
                    .group_tabs(&[created.id], Some(group_id), group.window_id)
                    .map_err(provider_err)?;
                if let Some(record) = document
                    .group_mut(&wkey, &gkey)
                    .and_then(|g| g.find_tab_mut(tab.id, &tab.url))
                {
                    record.id = Some(created.id);
                    record.closed = false;
                    record.title = created.title.clone();
                }
                created.id
            }
        };

        self.store.save(&document)?;
        Ok(tab_id)
    }

    /// Window resurrection against an already-loaded document. Returns the
    /// live window id and the record's (possibly rekeyed) storage key.
    fn resurrect_window_in(
        &mut self,
        document: &mut StorageDocument,
        window_key: &str,
    ) -> Result<(SessionId, RecordKey), EngineError> {
        let record = document
            .windows
            .get(window_key)
            .ok_or_else(|| EngineError::RecordMissing(format!("window {}", window_key)))?;

        if let Some(id) = record.id {
            match self.provider.focus_window(id) {
                Ok(()) => return Ok((id, window_key.to_string())),
                Err(ProviderError::NotFound(_)) => {}
                Err(ProviderError::Transient(msg)) => {
                    warn!("focus of window {} degraded to resurrection: {}", id, msg);
                }
            }
        }

        let live = self.provider.create_window().map_err(provider_err)?;
        let new_key = record_key(live.id);
        if let Some(mut record) = document.windows.remove(window_key) {
            record.id = Some(live.id);
            record.closed = false;
            for group in record.groups.values_mut() {
                group.window_key = new_key.clone();
            }
            document.windows.insert(new_key.clone(), record);
        }
        let _ = self.provider.focus_window(live.id);
        Ok((live.id, new_key))
    }

    /// Group resurrection against an already-loaded document.
    fn resurrect_group_in(
        &mut self,
        document: &mut StorageDocument,
        window_key: &str,
        group_key: &str,
    ) -> Result<SessionId, EngineError> {
        let record = document
            .group(window_key, group_key)
            .ok_or_else(|| EngineError::RecordMissing(format!("group {}", group_key)))?;

        if let Some(id) = record.id {
            if let Ok(group) = self.provider.group(id) {
                // Still live: bring it to the front.
                let _ = self.provider.focus_window(group.window_id);
                if let Ok(tabs) = self.provider.tabs_in_group(id) {
                    if let Some(first) = tabs.first() {
                        let _ = self.provider.focus_tab(first.id);
                    }
                }
                return Ok(id);
            }
        }

        let (window_id, window_key) = self.resurrect_window_in(document, window_key)?;

        let record = document
            .group(&window_key, group_key)
            .ok_or_else(|| EngineError::RecordMissing(format!("group {}", group_key)))?;
        let title = record.title.clone();
        let color = record.color;
        let to_open: Vec<(usize, String)> = record
            .tabs
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.closed)
            .map(|(i, t)| (i, t.url.clone()))
            .collect();

        let mut created: Vec<(usize, SessionId)> = Vec::new();
        for (index, url) in &to_open {
            let tab = self
                .provider
                .create_tab(window_id, url, false)
                .map_err(provider_err)?;
            created.push((*index, tab.id));
        }

        let group_id = if created.is_empty() {
            // Grouping needs at least one tab; seed with a throwaway.
            let throwaway = self
                .provider
                .create_tab(window_id, "about:blank", false)
                .map_err(provider_err)?;
            let group_id = self
                .provider
                .group_tabs(&[throwaway.id], None, window_id)
                .map_err(provider_err)?;
            self.provider
                .update_group(group_id, Some(&title), color, None)
                .map_err(provider_err)?;
            let _ = self.provider.remove_tab(throwaway.id);
            group_id
        } else {
            let tab_ids: Vec<SessionId> = created.iter().map(|(_, id)| *id).collect();
            let group_id = self
                .provider
                .group_tabs(&tab_ids, None, window_id)
                .map_err(provider_err)?;
            self.provider
                .update_group(group_id, Some(&title), color, None)
                .map_err(provider_err)?;
            group_id
        };

        if let Some(mut record) = document.take_group(&window_key, group_key) {
            record.id = Some(group_id);
            record.closed = false;
            for (index, live_id) in created {
                if let Some(tab) = record.tabs.get_mut(index) {
                    tab.id = Some(live_id);
                    tab.closed = false;
                }
            }
            document.insert_group(&window_key, record_key(group_id), record);
        }
        Ok(group_id)
    }
}
