//! History Store Property Tests
//!
//! Capacity, index assignment and stats consistency for arbitrary append sequences.

use bridge_core::capture::build_entry;
use bridge_core::{CaptureEntry, HistoryStore, ServiceDescriptor};
use proptest::prelude::*;

fn entry(host: &str, method: &str) -> CaptureEntry {
    let request = format!("{} / HTTP/1.1\r\nHost: {}\r\n\r\n", method, host);
    build_entry(
        request.as_bytes(),
        b"HTTP/1.1 200 OK\r\n\r\n",
        &ServiceDescriptor::new(host, 80, "http"),
    )
}

fn arb_capture() -> impl Strategy<Value = (String, String)> {
    (
        prop::sample::select(vec!["a.test", "b.test", "c.test", "d.test"]),
        prop::sample::select(vec!["GET", "POST", "PUT", "DELETE"]),
    )
        .prop_map(|(h, m)| (h.to_string(), m.to_string()))
}

proptest! {
    #[test]
    fn prop_store_retains_most_recent_captures(
        max in 1usize..16,
        captures in prop::collection::vec(arb_capture(), 0..48),
    ) {
        let store = HistoryStore::new(max);
        for (host, method) in &captures {
            store.append(entry(host, method));
        }

        let retained = store.get_all();
        prop_assert_eq!(retained.len(), captures.len().min(max));

        let expected = &captures[captures.len() - retained.len()..];
        for (kept, (host, method)) in retained.iter().zip(expected) {
            prop_assert_eq!(&kept.host, host);
            prop_assert_eq!(&kept.method, method);
        }
    }

    #[test]
    fn prop_index_is_length_before_append(
        max in 1usize..16,
        count in 0usize..48,
    ) {
        let store = HistoryStore::new(max);
        for k in 0..count {
            let assigned = store.append(entry("a.test", "GET"));
            prop_assert_eq!(assigned, k.min(max));
        }
        prop_assert!(store.len() <= max);
    }

    #[test]
    fn prop_stats_agree_with_snapshot(
        max in 1usize..16,
        captures in prop::collection::vec(arb_capture(), 0..48),
    ) {
        let store = HistoryStore::new(max);
        for (host, method) in &captures {
            store.append(entry(host, method));
        }

        let stats = store.stats();
        let snapshot = store.get_all();
        prop_assert_eq!(stats.total_requests, snapshot.len());
        prop_assert_eq!(stats.methods.values().sum::<usize>(), stats.total_requests);

        let mut hosts: Vec<String> = snapshot.iter().map(|e| e.host.clone()).collect();
        hosts.sort();
        hosts.dedup();
        prop_assert_eq!(stats.hosts, hosts);
    }
}

#[test]
fn test_saturated_store_reuses_final_index() {
    let store = HistoryStore::new(2);
    for host in ["a.test", "b.test", "c.test", "d.test"] {
        store.append(entry(host, "GET"));
    }
    let indexes: Vec<usize> = store.get_all().iter().map(|e| e.index).collect();
    assert_eq!(indexes, vec![2, 2]);
    assert_eq!(store.get_by_index(2).unwrap().host, "c.test");
    assert!(store.get_by_index(0).is_err());
}
