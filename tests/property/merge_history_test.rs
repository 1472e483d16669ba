//! Property-based tests for tab history merging.
//!
//! For any combination of live tabs and prior records, the merged list
//! keeps every live tab open in live order, keeps at most one closed
//! entry per URL, never keeps a closed entry for an open URL, and is
//! stable under re-merging.

use std::collections::HashSet;

use proptest::prelude::*;

use tabvault::managers::tab_merger::merge_tab_history;
use tabvault::types::records::TabRecord;
use tabvault::types::session::LiveTab;

const URLS: [&str; 5] = [
    "https://a.example/",
    "https://b.example/",
    "https://c.example/",
    "https://d.example/",
    "https://e.example/",
];

fn arb_url() -> impl Strategy<Value = String> {
    prop::sample::select(URLS.to_vec()).prop_map(String::from)
}

fn arb_live_tabs() -> impl Strategy<Value = Vec<LiveTab>> {
    prop::collection::vec(arb_url(), 0..5).prop_map(|urls| {
        urls.into_iter()
            .enumerate()
            .map(|(index, url)| LiveTab {
                id: 1000 + index as i64,
                window_id: 1,
                group_id: Some(10),
                title: url.clone(),
                url,
                active: false,
            })
            .collect()
    })
}

fn arb_prior_records() -> impl Strategy<Value = Vec<TabRecord>> {
    prop::collection::vec((arb_url(), prop::option::of(900i64..1005), any::<bool>()), 0..6)
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(url, id, closed)| TabRecord {
                    id: if closed { None } else { id },
                    closed,
                    title: url.clone(),
                    url,
                })
                .collect()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn merge_keeps_live_tabs_open_in_order(
        live in arb_live_tabs(),
        prior in arb_prior_records(),
    ) {
        let merged = merge_tab_history(&live, &prior);

        let open_ids: Vec<i64> = merged
            .iter()
            .filter(|t| !t.closed)
            .map(|t| t.id.expect("open records carry ids"))
            .collect();
        let live_ids: Vec<i64> = live.iter().map(|t| t.id).collect();
        prop_assert_eq!(open_ids, live_ids);

        // Open tabs form a prefix of the result.
        let first_closed = merged.iter().position(|t| t.closed).unwrap_or(merged.len());
        prop_assert!(merged[..first_closed].iter().all(|t| !t.closed));
        prop_assert!(merged[first_closed..].iter().all(|t| t.closed));
    }

    #[test]
    fn merge_deduplicates_closed_urls(
        live in arb_live_tabs(),
        prior in arb_prior_records(),
    ) {
        let merged = merge_tab_history(&live, &prior);

        let open_urls: HashSet<&str> = merged
            .iter()
            .filter(|t| !t.closed)
            .map(|t| t.url.as_str())
            .collect();

        let mut seen = HashSet::new();
        for record in merged.iter().filter(|t| t.closed) {
            prop_assert!(record.id.is_none());
            prop_assert!(!open_urls.contains(record.url.as_str()));
            prop_assert!(seen.insert(record.url.clone()), "duplicate closed URL");
        }
    }

    #[test]
    fn merge_never_invents_history(
        live in arb_live_tabs(),
        prior in arb_prior_records(),
    ) {
        let merged = merge_tab_history(&live, &prior);

        let prior_urls: HashSet<&str> = prior.iter().map(|t| t.url.as_str()).collect();
        for record in merged.iter().filter(|t| t.closed) {
            prop_assert!(prior_urls.contains(record.url.as_str()));
        }
    }

    #[test]
    fn merge_is_stable_under_remerge(
        live in arb_live_tabs(),
        prior in arb_prior_records(),
    ) {
        let merged = merge_tab_history(&live, &prior);
        let remerged = merge_tab_history(&live, &merged);
        prop_assert_eq!(merged, remerged);
    }
}
