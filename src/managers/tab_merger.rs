//! Tab history merging.
//!
//! Combines a group's current live tabs with its previously stored tabs
//! into one deduplicated history list. A tab that is closed and later
//! reopened with the same URL counts as reopened: the stale history entry
//! is suppressed, not duplicated.

use std::collections::HashSet;

use crate::types::records::{SessionId, TabRecord};
use crate::types::session::LiveTab;

/// Merges live tabs with prior records into a deduplicated, ordered list.
///
/// Open tabs come first in live order, followed by surviving closed tabs
/// in their original relative order. For closed tabs the URL is the
/// identity key: at most one closed record per URL, and none whose URL is
/// currently open. Pure and deterministic.
pub fn merge_tab_history(live: &[LiveTab], prior: &[TabRecord]) -> Vec<TabRecord> {
    let mut combined: Vec<TabRecord> = live
        .iter()
        .map(|t| TabRecord::open(t.id, &t.title, &t.url))
        .collect();

    let live_ids: HashSet<SessionId> = live.iter().map(|t| t.id).collect();
    for record in prior {
        let still_open = record.id.map_or(false, |id| live_ids.contains(&id));
        if !still_open {
            let mut closed = record.clone();
            closed.mark_closed();
            combined.push(closed);
        }
    }

    let open_urls: HashSet<String> = combined
        .iter()
        .filter(|r| !r.closed)
        .map(|r| r.url.clone())
        .collect();

    let mut seen_closed: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(combined.len());
    for record in combined {
        if !record.closed {
            merged.push(record);
        } else if !open_urls.contains(&record.url) && seen_closed.insert(record.url.clone()) {
            merged.push(record);
        }
    }
    merged
}
