//! Identity resolution between live session objects and durable records.
//!
//! Live ids are session-scoped, so after a provider restart (or a
//! close/reopen cycle) a live object and its durable record share no key.
//! The resolvers here bind them back together heuristically.
//!
//! Caveat surfaced to operators rather than auto-corrected: both
//! heuristics key on group titles, so duplicate group titles — within one
//! window, or across windows after a restart — can bind to the wrong
//! record. Keeping group titles unique keeps rebinding reliable.

use std::collections::HashSet;

use crate::types::records::{RecordKey, SessionId, StorageDocument};
use crate::types::session::LiveGroup;

/// Location of a matched group record inside the document.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMatch {
    pub window_key: RecordKey,
    pub group_key: RecordKey,
}

/// Matches a live group to a durable record.
///
/// Order of preference: exact live-id match anywhere in the document,
/// else title equality restricted to the group's current window.
/// Cross-window title matching is deliberately disabled: duplicate titles
/// across windows would bind a detached group to the wrong window, which
/// is worse than occasionally creating a duplicate record.
pub fn resolve_group(
    document: &StorageDocument,
    live: &LiveGroup,
    window_key: &str,
) -> Option<GroupMatch> {
    if let Some((wkey, gkey)) = document.locate_group_by_id(live.id) {
        return Some(GroupMatch {
            window_key: wkey,
            group_key: gkey,
        });
    }

    let window = document.windows.get(window_key)?;
    window
        .groups
        .iter()
        .find(|(_, g)| g.title == live.title)
        .map(|(gkey, _)| GroupMatch {
            window_key: window_key.to_string(),
            group_key: gkey.clone(),
        })
}

/// Matches a freshly observed live window to a durable record by group
/// title overlap.
///
/// Every stored window not already bound to a currently-live window is
/// scored by how many of its distinct group titles appear among the live
/// window's group titles. Highest score wins; ties break to the first
/// key in document order. Zero overlap means no match, and the caller
/// creates a brand-new record. A heuristic, not a guarantee.
pub fn resolve_window(
    document: &StorageDocument,
    live_titles: &HashSet<String>,
    live_window_ids: &HashSet<SessionId>,
) -> Option<RecordKey> {
    let mut best: Option<(RecordKey, usize)> = None;
    for (key, window) in &document.windows {
        if window
            .id
            .map_or(false, |id| live_window_ids.contains(&id))
        {
            continue;
        }
        let stored_titles: HashSet<&str> = window
            .groups
            .values()
            .map(|g| g.title.as_str())
            .collect();
        let score = stored_titles
            .iter()
            .filter(|t| live_titles.contains(**t))
            .count();
        if score > 0 && best.as_ref().map_or(true, |(_, b)| score > *b) {
            best = Some((key.clone(), score));
        }
    }
    best.map(|(key, _)| key)
}
