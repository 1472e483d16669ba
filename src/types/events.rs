use serde::{Deserialize, Serialize};

use super::records::SessionId;
use super::session::{LiveGroup, LiveTab};

/// Notifications consumed from the session provider's event feed.
///
/// Delivery order follows the provider's dispatch order, which is not
/// guaranteed to be the causal order of the underlying changes; the
/// reconciler re-reads live state on every event rather than trusting
/// event payloads alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    GroupCreated { group: LiveGroup },
    GroupUpdated { group: LiveGroup },
    GroupMoved { group: LiveGroup },
    GroupRemoved { group_id: SessionId },
    TabCreated { tab: LiveTab },
    TabUpdated { tab: LiveTab },
    TabMoved { tab: LiveTab },
    /// A tab left its window mid-move. `group_id` is the group the tab
    /// belonged to before detaching, if any.
    TabDetached {
        tab_id: SessionId,
        group_id: Option<SessionId>,
    },
    TabAttached {
        tab_id: SessionId,
        group_id: Option<SessionId>,
        window_id: SessionId,
    },
    TabRemoved {
        tab_id: SessionId,
        window_id: SessionId,
    },
    WindowRemoved { window_id: SessionId },
    WindowFocusChanged { window_id: SessionId },
}

/// Notifications the engine emits toward the UI. No data mutation is
/// attached to these; they exist so a front end can follow focus.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineNotice {
    FocusChanged(SessionId),
}
