// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `watcher.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::test_fixtures::ingress;
    use std::sync::Mutex;

    /// Handler recording every callback as `"<op>:<uid>"`.
    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<String>>,
        updates: Mutex<Vec<(Vec<String>, Vec<String>)>>,
    }

    fn uid(ingress: &Ingress) -> String {
        ingress.metadata.uid.clone().unwrap_or_default()
    }

    fn hosts(ingress: &Ingress) -> Vec<String> {
        ingress
            .spec
            .as_ref()
            .and_then(|s| s.rules.as_ref())
            .into_iter()
            .flatten()
            .filter_map(|r| r.host.clone())
            .collect()
    }

    impl IngressEventHandler for RecordingHandler {
        fn on_add(&self, ingress: &Ingress) {
            self.calls.lock().unwrap().push(format!("add:{}", uid(ingress)));
        }

        fn on_update(&self, old: &Ingress, new: &Ingress) {
            self.calls.lock().unwrap().push(format!("update:{}", uid(new)));
            self.updates.lock().unwrap().push((hosts(old), hosts(new)));
        }

        fn on_delete(&self, ingress: &Ingress) {
            self.calls.lock().unwrap().push(format!("delete:{}", uid(ingress)));
        }
    }

    impl RecordingHandler {
        fn take_calls(&self) -> Vec<String> {
            let mut calls = std::mem::take(&mut *self.calls.lock().unwrap());
            calls.sort();
            calls
        }
    }

    fn dispatcher(seed: Vec<Ingress>) -> (Arc<RecordingHandler>, EventDispatcher) {
        let handler = Arc::new(RecordingHandler::default());
        let dispatcher = EventDispatcher::new(handler.clone(), seed);
        (handler, dispatcher)
    }

    // =====================================================
    // Live events
    // =====================================================

    #[test]
    fn test_seed_is_not_reported() {
        let (handler, _dispatcher) = dispatcher(vec![ingress("uid-1", &["a.example"], &[])]);
        assert!(handler.take_calls().is_empty());
    }

    #[test]
    fn test_apply_of_unknown_object_is_add() {
        let (handler, mut dispatcher) = dispatcher(Vec::new());

        dispatcher.dispatch(&Event::Apply(ingress("uid-1", &["a.example"], &["1.1.1.1"])));

        assert_eq!(handler.take_calls(), vec!["add:uid-1"]);
    }

    #[test]
    fn test_apply_of_seeded_object_is_update_with_previous_revision() {
        let old = ingress("uid-1", &["old.example"], &["1.1.1.1"]);
        let new = ingress("uid-1", &["new.example"], &["1.1.1.1"]);
        let (handler, mut dispatcher) = dispatcher(vec![old]);

        dispatcher.dispatch(&Event::Apply(new));

        assert_eq!(handler.take_calls(), vec!["update:uid-1"]);
        let updates = handler.updates.lock().unwrap();
        assert_eq!(updates[0].0, vec!["old.example"]);
        assert_eq!(updates[0].1, vec!["new.example"]);
    }

    #[test]
    fn test_second_apply_sees_first_as_old() {
        let (handler, mut dispatcher) = dispatcher(Vec::new());

        dispatcher.dispatch(&Event::Apply(ingress("uid-1", &["v1.example"], &[])));
        dispatcher.dispatch(&Event::Apply(ingress("uid-1", &["v2.example"], &[])));

        assert_eq!(handler.take_calls(), vec!["add:uid-1", "update:uid-1"]);
        let updates = handler.updates.lock().unwrap();
        assert_eq!(updates[0].0, vec!["v1.example"]);
    }

    #[test]
    fn test_delete_is_reported_and_forgotten() {
        let ing = ingress("uid-1", &["a.example"], &[]);
        let (handler, mut dispatcher) = dispatcher(vec![ing.clone()]);

        dispatcher.dispatch(&Event::Delete(ing.clone()));
        dispatcher.dispatch(&Event::Apply(ing));

        assert_eq!(handler.take_calls(), vec!["add:uid-1", "delete:uid-1"]);
    }

    fn renamed(mut ingress: Ingress, name: &str) -> Ingress {
        ingress.metadata.name = Some(name.to_string());
        ingress
    }

    #[test]
    fn test_apply_with_new_uid_under_same_name_is_delete_then_add() {
        let old = renamed(ingress("uid-old", &["old.example"], &[]), "web");
        let (handler, mut dispatcher) = dispatcher(vec![old]);

        dispatcher.dispatch(&Event::Apply(renamed(
            ingress("uid-new", &["new.example"], &[]),
            "web",
        )));

        let calls = handler.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["delete:uid-old", "add:uid-new"]);
    }

    // =====================================================
    // Re-list
    // =====================================================

    #[test]
    fn test_relist_reports_updates_and_vanished_objects() {
        let (handler, mut dispatcher) = dispatcher(vec![
            ingress("uid-1", &["a.example"], &[]),
            ingress("uid-2", &["b.example"], &[]),
        ]);

        dispatcher.dispatch(&Event::Init);
        dispatcher.dispatch(&Event::InitApply(ingress("uid-1", &["a.example"], &[])));
        dispatcher.dispatch(&Event::InitApply(ingress("uid-3", &["c.example"], &[])));
        dispatcher.dispatch(&Event::InitDone);

        assert_eq!(
            handler.take_calls(),
            vec!["add:uid-3", "delete:uid-2", "update:uid-1"]
        );
    }

    #[test]
    fn test_store_reflects_relist_afterwards() {
        let (handler, mut dispatcher) = dispatcher(vec![ingress("uid-1", &["a.example"], &[])]);

        dispatcher.dispatch(&Event::Init);
        dispatcher.dispatch(&Event::InitDone);
        handler.take_calls();

        // uid-1 vanished during the re-list, so it is new again.
        dispatcher.dispatch(&Event::Apply(ingress("uid-1", &["a.example"], &[])));
        assert_eq!(handler.take_calls(), vec!["add:uid-1"]);
    }

    #[test]
    fn test_relist_drops_records_of_object_recreated_under_same_name() {
        let aggregator = Arc::new(IngressAggregator::new(Arc::new(
            crate::notifier::ChangeNotifier::new(),
        )));
        let old = renamed(ingress("uid-old", &["old.example"], &["1.1.1.1"]), "web");
        aggregator.preload(std::slice::from_ref(&old));
        let mut dispatcher = EventDispatcher::new(aggregator.clone(), vec![old]);

        dispatcher.dispatch(&Event::Init);
        dispatcher.dispatch(&Event::InitApply(renamed(
            ingress("uid-new", &["new.example"], &["1.1.1.1"]),
            "web",
        )));
        dispatcher.dispatch(&Event::InitDone);

        let mut domains: Vec<String> = aggregator.dump().into_iter().map(|r| r.domain).collect();
        domains.sort();
        assert_eq!(domains, vec!["new.example"]);
        assert_eq!(aggregator.len(), 1);
    }

    #[test]
    fn test_empty_relist_of_empty_store_reports_nothing() {
        let (handler, mut dispatcher) = dispatcher(Vec::new());

        dispatcher.dispatch(&Event::Init);
        dispatcher.dispatch(&Event::InitDone);

        assert!(handler.take_calls().is_empty());
    }

    // =====================================================
    // Resync
    // =====================================================

    #[test]
    fn test_resync_redelivers_every_known_object_as_update() {
        let (handler, mut dispatcher) = dispatcher(vec![ingress("uid-1", &["a.example"], &[])]);
        dispatcher.dispatch(&Event::Apply(ingress("uid-2", &["b.example"], &[])));
        handler.take_calls();

        dispatcher.resync();

        assert_eq!(handler.take_calls(), vec!["update:uid-1", "update:uid-2"]);
    }

    #[tokio::test]
    async fn test_resync_drives_aggregator_signal() {
        let notifier = Arc::new(crate::notifier::ChangeNotifier::new());
        let aggregator = Arc::new(IngressAggregator::new(notifier.clone()));
        let dispatcher = EventDispatcher::new(
            aggregator.clone(),
            vec![ingress("uid-1", &["a.example"], &["1.1.1.1"])],
        );

        dispatcher.resync();

        assert_eq!(aggregator.len(), 1);
        let cancel = CancellationToken::new();
        let woke = tokio::time::timeout(Duration::from_millis(50), notifier.wait(&cancel)).await;
        assert_eq!(woke.ok(), Some(true));
    }
}
