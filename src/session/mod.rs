//! The live-session boundary.
//!
//! [`SessionProvider`] is the seam between the engine and whatever owns
//! the real windows, tab groups, and tabs. All identifiers it hands out
//! are session-scoped: they are not stable across provider restarts,
//! which is the reason the identity resolver exists.

use crate::types::errors::ProviderError;
use crate::types::records::{GroupColor, SessionId};
use crate::types::session::{LiveGroup, LiveTab, LiveWindow};

pub mod memory;

pub use memory::MemorySession;

/// Operations the engine consumes from the live session.
///
/// Every call can fail with [`ProviderError::NotFound`] (the object is
/// gone — treated as "closed", never surfaced to the user) or
/// [`ProviderError::Transient`] (degraded to "absent" at the call site
/// and logged).
pub trait SessionProvider {
    fn windows(&self) -> Result<Vec<LiveWindow>, ProviderError>;
    fn window(&self, id: SessionId) -> Result<LiveWindow, ProviderError>;
    fn create_window(&mut self) -> Result<LiveWindow, ProviderError>;
    fn focus_window(&mut self, id: SessionId) -> Result<(), ProviderError>;
    fn focused_window(&self) -> Result<Option<SessionId>, ProviderError>;

    fn group(&self, id: SessionId) -> Result<LiveGroup, ProviderError>;
    fn groups_in_window(&self, window_id: SessionId) -> Result<Vec<LiveGroup>, ProviderError>;
    /// Updates the given fields of a group, leaving `None` fields untouched.
    fn update_group(
        &mut self,
        id: SessionId,
        title: Option<&str>,
        color: Option<GroupColor>,
        collapsed: Option<bool>,
    ) -> Result<LiveGroup, ProviderError>;

    fn tab(&self, id: SessionId) -> Result<LiveTab, ProviderError>;
    fn tabs_in_group(&self, group_id: SessionId) -> Result<Vec<LiveTab>, ProviderError>;
    fn create_tab(
        &mut self,
        window_id: SessionId,
        url: &str,
        active: bool,
    ) -> Result<LiveTab, ProviderError>;
    /// Activates the tab and focuses the window containing it.
    fn focus_tab(&mut self, id: SessionId) -> Result<(), ProviderError>;
    fn remove_tab(&mut self, id: SessionId) -> Result<(), ProviderError>;
    /// Moves tabs into `group_id`, or into a new group created in
    /// `window_id` when `group_id` is `None`. Returns the group's id.
    fn group_tabs(
        &mut self,
        tab_ids: &[SessionId],
        group_id: Option<SessionId>,
        window_id: SessionId,
    ) -> Result<SessionId, ProviderError>;
}
