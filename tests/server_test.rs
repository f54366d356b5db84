//! Integration tests for the reference collector

#[cfg(feature = "server")]
mod server_tests {
    use page_telemetry::page::{HeadlessPage, InteractionTrace, PageHost};
    use page_telemetry::server::{run, ServerConfig};
    use page_telemetry::{Config, Dimension, Event, PageRuntime, Viewport};
    use std::time::Duration;

    #[tokio::test]
    async fn test_health_endpoint() {
        let collector = run(ServerConfig::new(0)).await.expect("Failed to start collector");

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/health", collector.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");

        collector.shutdown();
    }

    #[tokio::test]
    async fn test_session_and_event_validation() {
        let collector = run(ServerConfig::new(0)).await.expect("Failed to start collector");
        let client = reqwest::Client::new();

        let bad_url = client
            .post(format!("{}/new_session", collector.url()))
            .json(&serde_json::json!({ "websiteURL": "not a url" }))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_url.status(), reqwest::StatusCode::BAD_REQUEST);

        let malformed = client
            .post(format!("{}/new_session", collector.url()))
            .body("{")
            .send()
            .await
            .unwrap();
        assert_eq!(malformed.status(), reqwest::StatusCode::BAD_REQUEST);

        let session: serde_json::Value = client
            .post(format!("{}/new_session", collector.url()))
            .json(&serde_json::json!({ "websiteURL": "https://a.example" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let session_id = session["sessionID"].as_str().unwrap().to_string();

        // A paste event on the resize endpoint is refused.
        let wrong_route = client
            .post(format!("{}/new_resize_event", collector.url()))
            .json(&serde_json::json!({
                "eventType": "copyAndPaste",
                "websiteURL": "https://a.example",
                "sessionID": session_id,
                "inputID": "email",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(wrong_route.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = wrong_route.json().await.unwrap();
        assert_eq!(body["code"], "WRONG_EVENT_TYPE");

        let unknown_session = client
            .post(format!("{}/new_event", collector.url()))
            .json(&serde_json::json!({
                "eventType": "copyAndPaste",
                "websiteURL": "https://a.example",
                "sessionID": "noSession",
                "inputID": "email",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(unknown_session.status(), reqwest::StatusCode::BAD_REQUEST);

        let get_session = client
            .get(format!("{}/new_session", collector.url()))
            .send()
            .await
            .unwrap();
        assert_eq!(get_session.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

        assert!(collector.events().await.is_empty());
        collector.shutdown();
    }

    #[tokio::test]
    async fn test_replayed_visit_is_recorded() {
        let collector = run(ServerConfig::new(0)).await.expect("Failed to start collector");

        let trace = InteractionTrace::from_json(
            r#"{
                "url": "https://shop.example/signup",
                "viewport": { "width": 800, "height": 600 },
                "steps": [
                    { "afterMs": 300, "action": "keyUp", "inputId": "email" },
                    { "afterMs": 10, "action": "paste", "inputId": "email" },
                    { "afterMs": 10, "action": "paste", "inputId": "email" },
                    { "afterMs": 10, "action": "resize", "width": 1024, "height": 768 },
                    { "afterMs": 400, "action": "submit", "formId": "signup" },
                    { "afterMs": 400, "action": "paste", "inputId": "card" }
                ]
            }"#,
        )
        .unwrap();

        let config = Config {
            collector_url: collector.url(),
            resize_debounce: Duration::from_millis(200),
            ..Config::default()
        };
        let page = HeadlessPage::new(trace.url.clone(), trace.viewport);
        let runtime = PageRuntime::new(config, page);
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        let (outcome, delivered) = tokio::join!(runtime.run(rx), trace.play(tx));
        assert_eq!(delivered, 6);

        let session = outcome.session.expect("session established");
        assert_eq!(
            outcome.host.cookie("session_id").as_deref(),
            Some(session.id())
        );

        let events = collector.events().await;
        let kinds: Vec<_> = events.iter().map(Event::kind).collect();
        assert_eq!(events.len(), 4, "kinds: {kinds:?}");

        let record = collector.session(session.id()).await.unwrap();
        assert_eq!(record.resize_from, Some(Dimension::from(Viewport::new(800, 600))));
        assert_eq!(record.resize_to, Some(Dimension::from(Viewport::new(1024, 768))));
        assert_eq!(record.copy_and_paste.len(), 2);
        assert_eq!(outcome.host.resubmissions().len(), 1);

        collector.shutdown();
    }
}
