//! Engine context for TabVault.
//!
//! [`Engine`] is the single per-process object owning the persistent
//! store, the session provider handle, and the notice channel. Every
//! reconcile, resurrection, and record command runs through it; the
//! dispatcher owns it on the worker thread so all mutations are
//! serialized.

use std::sync::mpsc::Sender;

use log::warn;

use crate::database::Store;
use crate::managers::reconciler::Reconciler;
use crate::managers::resurrection::Resurrector;
use crate::session::SessionProvider;
use crate::types::errors::EngineError;
use crate::types::events::{EngineNotice, SessionEvent};
use crate::types::records::{SessionId, StorageDocument, TabRecord};

/// Central engine struct: provider handle + store + notices.
pub struct Engine<P: SessionProvider> {
    provider: P,
    store: Store,
    notices: Option<Sender<EngineNotice>>,
}

impl<P: SessionProvider> Engine<P> {
    pub fn new(provider: P, store: Store) -> Self {
        Self {
            provider,
            store,
            notices: None,
        }
    }

    /// Registers the channel engine notices are forwarded on.
    pub fn subscribe_notices(&mut self, sender: Sender<EngineNotice>) {
        self.notices = Some(sender);
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    // --- Event ingestion ---

    /// Applies one session event. Focus changes are forwarded as notices;
    /// everything else reconciles the affected records.
    pub fn handle_event(&mut self, event: &SessionEvent) -> Result<(), EngineError> {
        if let SessionEvent::WindowFocusChanged { window_id } = event {
            if let Some(notices) = &self.notices {
                let _ = notices.send(EngineNotice::FocusChanged(*window_id));
            }
        }
        Reconciler::new(&self.provider, &self.store).handle_event(event)
    }

    /// Rebuilds the whole mirror from live state.
    pub fn full_reconcile(&mut self) -> Result<(), EngineError> {
        Reconciler::new(&self.provider, &self.store).full_reconcile()
    }

    // --- Resurrection commands ---

    pub fn open_window(&mut self, window_key: &str) -> Result<SessionId, EngineError> {
        Resurrector::new(&mut self.provider, &self.store).resurrect_window(window_key)
    }

    pub fn open_group(
        &mut self,
        window_key: &str,
        group_key: &str,
    ) -> Result<SessionId, EngineError> {
        Resurrector::new(&mut self.provider, &self.store).resurrect_group(window_key, group_key)
    }

    pub fn open_tab(
        &mut self,
        window_key: &str,
        group_key: &str,
        tab: &TabRecord,
    ) -> Result<SessionId, EngineError> {
        Resurrector::new(&mut self.provider, &self.store).resurrect_tab(window_key, group_key, tab)
    }

    // --- Queries ---

    pub fn focused_window(&self) -> Result<Option<SessionId>, EngineError> {
        self.provider
            .focused_window()
            .map_err(|e| EngineError::Provider(e.to_string()))
    }

    pub fn storage_snapshot(&self) -> Result<StorageDocument, EngineError> {
        Ok(self.store.load()?)
    }

    // --- Record commands ---

    /// Closes a group's live tabs, keeping the record as closed history.
    pub fn close_group(&mut self, group_id: SessionId) -> Result<(), EngineError> {
        let tabs = self.provider.tabs_in_group(group_id).unwrap_or_else(|e| {
            warn!("tab listing for group {} degraded to empty: {}", group_id, e);
            Vec::new()
        });
        for tab in tabs {
            if let Err(e) = self.provider.remove_tab(tab.id) {
                warn!("failed to remove tab {}: {}", tab.id, e);
            }
        }
        let mut document = self.store.load()?;
        if let Some((wkey, gkey)) = document.locate_group_by_id(group_id) {
            if let Some(record) = document.group_mut(&wkey, &gkey) {
                record.mark_closed();
            }
            self.store.save(&document)?;
        }
        Ok(())
    }

    /// Permanently deletes a window record and everything under it.
    pub fn delete_window(&mut self, window_key: &str) -> Result<(), EngineError> {
        let mut document = self.store.load()?;
        document
            .windows
            .remove(window_key)
            .ok_or_else(|| EngineError::RecordMissing(format!("window {}", window_key)))?;
        self.store.save(&document)?;
        Ok(())
    }

    /// Permanently deletes a group record.
    pub fn delete_group(&mut self, window_key: &str, group_key: &str) -> Result<(), EngineError> {
        let mut document = self.store.load()?;
        document
            .take_group(window_key, group_key)
            .ok_or_else(|| EngineError::RecordMissing(format!("group {}", group_key)))?;
        self.store.save(&document)?;
        Ok(())
    }

    /// Permanently deletes the first tab record with the given URL.
    pub fn delete_tab(
        &mut self,
        window_key: &str,
        group_key: &str,
        url: &str,
    ) -> Result<(), EngineError> {
        let mut document = self.store.load()?;
        let record = document
            .group_mut(window_key, group_key)
            .ok_or_else(|| EngineError::RecordMissing(format!("group {}", group_key)))?;
        let index = record
            .tabs
            .iter()
            .position(|t| t.url == url)
            .ok_or_else(|| EngineError::RecordMissing(format!("tab {}", url)))?;
        record.tabs.remove(index);
        self.store.save(&document)?;
        Ok(())
    }

    pub fn set_window_name(&mut self, window_key: &str, name: &str) -> Result<(), EngineError> {
        let mut document = self.store.load()?;
        let record = document
            .windows
            .get_mut(window_key)
            .ok_or_else(|| EngineError::RecordMissing(format!("window {}", window_key)))?;
        record.name = Some(name.to_string());
        self.store.save(&document)?;
        Ok(())
    }

    /// Drops every closed tab record from a group, keeping open ones.
    pub fn delete_closed_tabs(
        &mut self,
        window_key: &str,
        group_key: &str,
    ) -> Result<(), EngineError> {
        let mut document = self.store.load()?;
        let record = document
            .group_mut(window_key, group_key)
            .ok_or_else(|| EngineError::RecordMissing(format!("group {}", group_key)))?;
        record.tabs.retain(|t| !t.closed);
        self.store.save(&document)?;
        Ok(())
    }
}
