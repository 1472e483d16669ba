use serde::{Deserialize, Serialize};

use super::records::{GroupColor, SessionId};

/// A window as currently represented by the session provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveWindow {
    pub id: SessionId,
    pub focused: bool,
}

/// A tab group as currently represented by the session provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveGroup {
    pub id: SessionId,
    pub window_id: SessionId,
    pub title: String,
    pub color: GroupColor,
    pub collapsed: bool,
}

/// A tab as currently represented by the session provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveTab {
    pub id: SessionId,
    pub window_id: SessionId,
    pub group_id: Option<SessionId>,
    pub title: String,
    pub url: String,
    pub active: bool,
}
