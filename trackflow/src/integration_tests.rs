//! End-to-end dispatch tests: barrier ordering, bounded fan-out,
//! failure isolation, and callback behavior.

#[cfg(test)]
mod tests {
    use crate::adapter::{HttpServiceAdapter, ServiceAdapter};
    use crate::core::BatchRequest;
    use crate::dispatcher::BatchDispatcher;
    use crate::registry::{ServiceRegistry, StageConfig};
    use crate::reporter::{HttpResultReporter, ResultReporter};
    use crate::testing::{registry_with, work_items, CollectingReporter, ScriptedAdapter};
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn dispatcher_with(
        registry: ServiceRegistry,
        stage_order: &[&str],
        adapter: Arc<ScriptedAdapter>,
        reporter: Arc<CollectingReporter>,
    ) -> Arc<BatchDispatcher> {
        Arc::new(BatchDispatcher::new(
            Arc::new(registry),
            order(stage_order),
            adapter as Arc<dyn ServiceAdapter>,
            reporter as Arc<dyn ResultReporter>,
        ))
    }

    #[tokio::test]
    async fn test_no_item_is_dropped_in_any_stage() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let reporter = Arc::new(CollectingReporter::new());
        let dispatcher = dispatcher_with(
            registry_with(&[("analyzer", 3), ("transcriber", 2), ("generator", 5)]),
            &["analyzer", "transcriber", "generator"],
            Arc::clone(&adapter),
            Arc::clone(&reporter),
        );

        dispatcher
            .submit(BatchRequest::new(work_items(7), "https://cb.example.com"))
            .unwrap();
        reporter.wait_for_reports(3, Duration::from_secs(3)).await;

        for report in reporter.reports() {
            assert_eq!(report.results.len(), 7, "stage {} dropped items", report.stage);
        }
        assert_eq!(adapter.call_count(), 21);
    }

    #[tokio::test]
    async fn test_stage_barrier_ordering() {
        let clock = Arc::new(AtomicUsize::new(0));
        let adapter = Arc::new(
            ScriptedAdapter::new()
                .with_clock(Arc::clone(&clock))
                .with_latency(Duration::from_millis(10)),
        );
        let reporter = Arc::new(CollectingReporter::new().with_clock(clock));
        let dispatcher = dispatcher_with(
            registry_with(&[("a", 2), ("b", 5)]),
            &["a", "b"],
            Arc::clone(&adapter),
            Arc::clone(&reporter),
        );

        dispatcher
            .submit(BatchRequest::new(work_items(5), "https://cb.example.com"))
            .unwrap();
        reporter.wait_for_reports(2, Duration::from_secs(3)).await;

        let a_report_seq = reporter.reports()[0].seq;
        let last_a_call = adapter
            .calls_for_stage("a")
            .iter()
            .map(|c| c.seq)
            .max()
            .unwrap();
        let first_b_call = adapter
            .calls_for_stage("b")
            .iter()
            .map(|c| c.seq)
            .min()
            .unwrap();

        // Every stage-a call finished and was reported before any stage-b
        // call started.
        assert!(last_a_call < a_report_seq);
        assert!(a_report_seq < first_b_call);
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_stage_limit() {
        let adapter = Arc::new(ScriptedAdapter::new().with_latency(Duration::from_millis(15)));
        let reporter = Arc::new(CollectingReporter::new());
        let dispatcher = dispatcher_with(
            registry_with(&[("a", 2), ("b", 5)]),
            &["a", "b"],
            Arc::clone(&adapter),
            Arc::clone(&reporter),
        );

        dispatcher
            .submit(BatchRequest::new(work_items(8), "https://cb.example.com"))
            .unwrap();
        reporter.wait_for_reports(2, Duration::from_secs(3)).await;

        let gate_a = dispatcher.gate("a").unwrap();
        let gate_b = dispatcher.gate("b").unwrap();
        assert!(gate_a.peak_in_flight() <= 2);
        assert!(gate_b.peak_in_flight() <= 5);
        // The batch was wide enough to saturate the smaller gate.
        assert_eq!(gate_a.peak_in_flight(), 2);
        assert_eq!(gate_a.in_flight(), 0);
        assert_eq!(gate_b.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failing_item_still_reaches_next_stage() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.fail_item("a", "track-2", "injected failure");
        let reporter = Arc::new(CollectingReporter::new());
        let dispatcher = dispatcher_with(
            registry_with(&[("a", 2), ("b", 5)]),
            &["a", "b"],
            Arc::clone(&adapter),
            Arc::clone(&reporter),
        );

        dispatcher
            .submit(BatchRequest::new(work_items(5), "https://cb.example.com"))
            .unwrap();
        reporter.wait_for_reports(2, Duration::from_secs(3)).await;

        // Stage b fanned out over the original items, not stage a's
        // survivors.
        let b_items: Vec<String> = adapter
            .calls_for_stage("b")
            .into_iter()
            .map(|c| c.item)
            .collect();
        assert!(b_items.contains(&"track-2".to_string()));

        let reports = reporter.reports();
        let b_result_for_failed = reports[1]
            .results
            .iter()
            .find(|r| r.id == "track-2")
            .unwrap();
        assert!(b_result_for_failed.is_success());
    }

    #[tokio::test]
    async fn test_five_item_two_stage_scenario() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.fail_item("a", "track-3", "Service error: simulated 500");
        let reporter = Arc::new(CollectingReporter::new());
        let dispatcher = dispatcher_with(
            registry_with(&[("a", 2), ("b", 5)]),
            &["a", "b"],
            Arc::clone(&adapter),
            Arc::clone(&reporter),
        );

        dispatcher
            .submit(BatchRequest::new(work_items(5), "https://cb.example.com"))
            .unwrap();
        reporter.wait_for_reports(2, Duration::from_secs(3)).await;

        let reports = reporter.reports();
        assert_eq!(reports[0].stage, "a");
        assert_eq!(reports[0].results.len(), 5);
        assert_eq!(reports[0].results.iter().filter(|r| r.is_success()).count(), 4);

        let failed = reports[0].results.iter().find(|r| !r.is_success()).unwrap();
        assert_eq!(failed.id, "track-3");
        assert_eq!(failed.error.as_deref(), Some("Service error: simulated 500"));

        // Stage b reported after stage a, with all five results,
        // independent of stage a's outcome.
        assert_eq!(reports[1].stage, "b");
        assert_eq!(reports[1].results.len(), 5);
        assert!(reports[0].seq < reports[1].seq);
        assert!(reports[1].results.iter().all(crate::core::StageResult::is_success));
    }

    #[tokio::test]
    async fn test_rejection_makes_zero_outbound_requests() {
        let server = MockServer::start_async().await;
        let analyze = server
            .mock_async(|when, then| {
                when.method(POST).path("/a");
                then.status(200).json_body(serde_json::json!({}));
            })
            .await;

        // Stage b has an empty credential, so validation must reject the
        // batch before stage a sends anything.
        let registry = ServiceRegistry::new()
            .with_stage("a", StageConfig::new(server.url("/a"), "token").with_concurrency(2))
            .with_stage("b", StageConfig::new(server.url("/b"), ""));

        let dispatcher = Arc::new(BatchDispatcher::new(
            Arc::new(registry),
            order(&["a", "b"]),
            Arc::new(HttpServiceAdapter::new()),
            Arc::new(HttpResultReporter::new()),
        ));

        let err = dispatcher
            .submit(BatchRequest::new(work_items(3), server.url("/cb")))
            .unwrap_err();
        assert_eq!(err.to_string(), "b service not configured");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(analyze.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_http_round_trip_with_failing_stage() {
        let server = MockServer::start_async().await;
        let analyze = server
            .mock_async(|when, then| {
                when.method(POST).path("/a").header("authorization", "Bearer token");
                then.status(500).body("analyzer exploded");
            })
            .await;
        let generate = server
            .mock_async(|when, then| {
                when.method(POST).path("/b").header("authorization", "Bearer token");
                then.status(200).json_body(serde_json::json!({"artwork": "u r l"}));
            })
            .await;
        let callback_a = server
            .mock_async(|when, then| {
                when.method(POST).path("/cb").json_body_partial(r#"{"stage": "a"}"#);
                then.status(200);
            })
            .await;
        let callback_b = server
            .mock_async(|when, then| {
                when.method(POST).path("/cb").json_body_partial(r#"{"stage": "b"}"#);
                then.status(200);
            })
            .await;

        let registry = ServiceRegistry::new()
            .with_stage("a", StageConfig::new(server.url("/a"), "token").with_concurrency(2))
            .with_stage("b", StageConfig::new(server.url("/b"), "token").with_concurrency(5));

        let dispatcher = Arc::new(BatchDispatcher::new(
            Arc::new(registry),
            order(&["a", "b"]),
            Arc::new(HttpServiceAdapter::new()),
            Arc::new(HttpResultReporter::new()),
        ));

        dispatcher
            .submit(BatchRequest::new(work_items(5), server.url("/cb")))
            .unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while callback_b.hits_async().await < 1 {
            assert!(tokio::time::Instant::now() < deadline, "stage b callback never arrived");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Every item hit both services despite stage a failing wholesale.
        assert_eq!(analyze.hits_async().await, 5);
        assert_eq!(generate.hits_async().await, 5);
        assert_eq!(callback_a.hits_async().await, 1);
        assert_eq!(callback_b.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_callback_failure_does_not_stall_later_stages() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/a");
                then.status(200).json_body(serde_json::json!({}));
            })
            .await;
        let generate = server
            .mock_async(|when, then| {
                when.method(POST).path("/b");
                then.status(200).json_body(serde_json::json!({}));
            })
            .await;
        // The callback target rejects stage a's delivery outright.
        let callback_a = server
            .mock_async(|when, then| {
                when.method(POST).path("/cb").json_body_partial(r#"{"stage": "a"}"#);
                then.status(503).body("receiver down");
            })
            .await;
        let callback_b = server
            .mock_async(|when, then| {
                when.method(POST).path("/cb").json_body_partial(r#"{"stage": "b"}"#);
                then.status(200);
            })
            .await;

        let registry = ServiceRegistry::new()
            .with_stage("a", StageConfig::new(server.url("/a"), "token").with_concurrency(2))
            .with_stage("b", StageConfig::new(server.url("/b"), "token").with_concurrency(5));

        let dispatcher = Arc::new(BatchDispatcher::new(
            Arc::new(registry),
            order(&["a", "b"]),
            Arc::new(HttpServiceAdapter::new()),
            Arc::new(HttpResultReporter::new()),
        ));

        dispatcher
            .submit(BatchRequest::new(work_items(2), server.url("/cb")))
            .unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while callback_b.hits_async().await < 1 {
            assert!(tokio::time::Instant::now() < deadline, "stage b callback never arrived");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(callback_a.hits_async().await, 1);
        assert_eq!(generate.hits_async().await, 2);
    }
}
