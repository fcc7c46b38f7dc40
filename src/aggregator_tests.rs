// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `aggregator.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::address_set::AddressSet;
    use crate::test_fixtures::ingress;
    use k8s_openapi::api::networking::v1::{IngressLoadBalancerIngress, IngressRule};
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    fn aggregator() -> IngressAggregator {
        IngressAggregator::new(Arc::new(ChangeNotifier::new()))
    }

    fn by_domain(records: Vec<DesiredRecord>) -> HashMap<String, AddressSet> {
        let mut index: HashMap<String, AddressSet> = HashMap::new();
        for record in records {
            index
                .entry(record.domain)
                .or_default()
                .extend_from(&record.addresses);
        }
        index
    }

    // =====================================================
    // Record derivation
    // =====================================================

    #[test]
    fn test_derive_records_one_per_host_sharing_addresses() {
        let ing = ingress("uid-1", &["a.example", "b.example"], &["10.0.0.1", "10.0.0.2"]);

        let records = derive_records(&ing);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].domain, "a.example");
        assert_eq!(records[1].domain, "b.example");
        for record in &records {
            assert_eq!(record.addresses.to_sorted_vec(), vec!["10.0.0.1", "10.0.0.2"]);
        }
    }

    #[test]
    fn test_derive_records_without_status_has_empty_addresses() {
        let mut ing = ingress("uid-1", &["a.example"], &[]);
        ing.status = None;

        let records = derive_records(&ing);

        assert_eq!(records.len(), 1);
        assert!(records[0].addresses.is_empty());
    }

    #[test]
    fn test_derive_records_skips_hostname_only_load_balancers() {
        let mut ing = ingress("uid-1", &["a.example"], &["10.0.0.1"]);
        if let Some(lb) = ing
            .status
            .as_mut()
            .and_then(|s| s.load_balancer.as_mut())
            .and_then(|lb| lb.ingress.as_mut())
        {
            lb.push(IngressLoadBalancerIngress {
                hostname: Some("lb.cloud.example".to_string()),
                ..Default::default()
            });
        }

        let records = derive_records(&ing);

        assert_eq!(records[0].addresses.to_sorted_vec(), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_derive_records_rule_without_host_yields_empty_domain() {
        let mut ing = ingress("uid-1", &[], &["10.0.0.1"]);
        if let Some(rules) = ing.spec.as_mut().and_then(|s| s.rules.as_mut()) {
            rules.push(IngressRule::default());
        }

        let records = derive_records(&ing);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].domain, "");
    }

    #[test]
    fn test_object_identity_prefers_uid() {
        let ing = ingress("abc-123", &[], &[]);
        assert_eq!(object_identity(&ing), "abc-123");
    }

    #[test]
    fn test_object_identity_falls_back_to_namespaced_name() {
        let mut ing = ingress("abc-123", &[], &[]);
        ing.metadata.uid = None;
        assert_eq!(object_identity(&ing), "default/ingress-abc-123");
    }

    // =====================================================
    // Event handling
    // =====================================================

    #[test]
    fn test_on_add_stores_records() {
        let agg = aggregator();
        agg.on_add(&ingress("uid-1", &["a.example"], &["1.1.1.1"]));

        let dump = agg.dump();
        assert_eq!(dump.len(), 1);
        assert_eq!(dump[0].domain, "a.example");
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_on_update_fully_replaces_previous_revision() {
        let agg = aggregator();
        let old = ingress("uid-1", &["old.example", "kept.example"], &["1.1.1.1"]);
        let new = ingress("uid-1", &["kept.example"], &["2.2.2.2"]);

        agg.on_add(&old);
        agg.on_update(&old, &new);

        let index = by_domain(agg.dump());
        assert_eq!(index.len(), 1, "stale host from old revision must vanish");
        assert_eq!(index["kept.example"].to_sorted_vec(), vec!["2.2.2.2"]);
    }

    #[test]
    fn test_on_update_across_identities_drops_old_identity() {
        let agg = aggregator();
        let old = ingress("uid-old", &["old.example"], &["1.1.1.1"]);
        let new = ingress("uid-new", &["new.example"], &["1.1.1.1"]);

        agg.on_add(&old);
        agg.on_update(&old, &new);

        let index = by_domain(agg.dump());
        assert!(!index.contains_key("old.example"));
        assert!(index.contains_key("new.example"));
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_on_delete_removes_all_contribution() {
        let agg = aggregator();
        let ing = ingress("uid-1", &["a.example", "b.example"], &["1.1.1.1"]);
        agg.on_add(&ing);
        agg.on_add(&ingress("uid-2", &["c.example"], &["3.3.3.3"]));

        agg.on_delete(&ing);

        let index = by_domain(agg.dump());
        assert!(!index.contains_key("a.example"));
        assert!(!index.contains_key("b.example"));
        assert!(index.contains_key("c.example"));
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_on_delete_unknown_identity_is_noop() {
        let agg = aggregator();
        agg.on_add(&ingress("uid-1", &["a.example"], &["1.1.1.1"]));

        agg.on_delete(&ingress("uid-unknown", &["a.example"], &["1.1.1.1"]));

        assert_eq!(agg.dump().len(), 1);
    }

    #[test]
    fn test_dump_keeps_shared_domains_from_distinct_objects() {
        let agg = aggregator();
        agg.on_add(&ingress("uid-1", &["b.x"], &["1.1.1.1"]));
        agg.on_add(&ingress("uid-2", &["b.x"], &["2.2.2.2"]));

        let dump = agg.dump();
        assert_eq!(dump.len(), 2);

        let index = by_domain(dump);
        assert_eq!(index["b.x"].to_sorted_vec(), vec!["1.1.1.1", "2.2.2.2"]);
    }

    #[test]
    fn test_preload_seeds_state() {
        let agg = aggregator();
        agg.preload(&[
            ingress("uid-1", &["a.example"], &["1.1.1.1"]),
            ingress("uid-2", &["b.example"], &["2.2.2.2"]),
        ]);

        assert_eq!(agg.len(), 2);
        assert_eq!(agg.dump().len(), 2);
    }

    // =====================================================
    // Signalling
    // =====================================================

    #[tokio::test]
    async fn test_events_signal_notifier_once_per_burst() {
        let agg = aggregator();
        let cancel = CancellationToken::new();

        let ing = ingress("uid-1", &["a.example"], &["1.1.1.1"]);
        agg.on_add(&ing);
        agg.on_update(&ing, &ing);
        agg.on_delete(&ing);

        let first = timeout(Duration::from_millis(50), agg.notifier().wait(&cancel)).await;
        assert_eq!(first.ok(), Some(true));

        let second = timeout(Duration::from_millis(50), agg.notifier().wait(&cancel)).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_preload_signals() {
        let agg = aggregator();
        let cancel = CancellationToken::new();

        agg.preload(&[]);

        let woke = timeout(Duration::from_millis(50), agg.notifier().wait(&cancel)).await;
        assert_eq!(woke.ok(), Some(true));
    }

    // =====================================================
    // Concurrency
    // =====================================================

    #[test]
    fn test_dump_concurrent_with_writes() {
        let agg = Arc::new(aggregator());

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let agg = agg.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let uid = format!("uid-{w}-{}", i % 10);
                        let ing = ingress(&uid, &["shared.example"], &["10.0.0.1"]);
                        if i % 3 == 0 {
                            agg.on_delete(&ing);
                        } else {
                            agg.on_add(&ing);
                        }
                    }
                })
            })
            .collect();

        let reader = {
            let agg = agg.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    for record in agg.dump() {
                        assert_eq!(record.domain, "shared.example");
                    }
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();

        // Each identity's last write (i = 190..199) decides its presence.
        for w in 0..4 {
            for slot in 0..10 {
                let last_i = 190 + slot;
                let ing = ingress(&format!("uid-{w}-{slot}"), &[], &[]);
                let present = agg.current.contains_key(&object_identity(&ing));
                assert_eq!(present, last_i % 3 != 0);
            }
        }
    }
}
