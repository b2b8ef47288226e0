// Lifecycle tests against a real listener on an ephemeral port.
#[cfg(test)]
mod test {
    use std::time::Duration;

    use axon_adapter::{
        AdapterError, HttpAdapter,
        config::AdapterConfig,
        core::{AdapterEvent, CanonicalResponse, HttpMethod, RouteDescriptor},
        ports::flow_fn,
    };

    fn adapter() -> HttpAdapter {
        let config = AdapterConfig::builder()
            .listen_addr("127.0.0.1:0")
            .route("/ping", [HttpMethod::Get])
            .build();
        let mut adapter = HttpAdapter::new(&config).unwrap();
        adapter
            .set_request_flow(flow_fn(|_route, _request, reply| async move {
                reply.succeed(CanonicalResponse::ok("pong").with_exit_code(2));
            }))
            .unwrap();
        adapter
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_before_start_is_noop() {
        let mut adapter = adapter();
        let mut events = adapter.subscribe();

        adapter.stop().await.unwrap();

        assert!(!adapter.is_started());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_serve_stop_stop() {
        let mut adapter = adapter();
        let mut events = adapter.subscribe();

        let addr = adapter.start().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(adapter.local_addr(), Some(addr));

        let response = client()
            .get(format!("http://{addr}/ping"))
            .header("user-agent", "lifecycle-test")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.headers()["x-exit-code"], "2");
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.text().await.unwrap(), "pong");

        adapter.stop().await.unwrap();
        assert!(!adapter.is_started());
        assert!(client().get(format!("http://{addr}/ping")).send().await.is_err());

        adapter.stop().await.unwrap();

        let seen: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert!(seen.contains(&AdapterEvent::Started { addr }));
        assert_eq!(
            seen.iter()
                .filter(|event| matches!(event, AdapterEvent::Stopped))
                .count(),
            1
        );
        assert!(seen.iter().any(|event| matches!(
            event,
            AdapterEvent::Responded {
                status: 200,
                exit_code: 2,
                ..
            }
        )));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_double_start_is_an_error() {
        let mut adapter = adapter();
        let addr = adapter.start().await.unwrap();

        match adapter.start().await {
            Err(AdapterError::AlreadyStarted(running)) => assert_eq!(running, addr),
            other => panic!("expected AlreadyStarted, got {other:?}"),
        }

        adapter.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_peer_address_feeds_identification() {
        let config = AdapterConfig::builder()
            .listen_addr("127.0.0.1:0")
            .route("/who", [HttpMethod::Get])
            .build();
        let mut adapter = HttpAdapter::new(&config).unwrap();
        adapter
            .set_request_flow(flow_fn(|_route, request, reply| async move {
                reply.succeed(CanonicalResponse::ok(request.identification().to_string()));
            }))
            .unwrap();
        let addr = adapter.start().await.unwrap();

        let body = client()
            .get(format!("http://{addr}/who"))
            .header("user-agent", "probe")
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "127.0.0.1 | probe");

        adapter.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_register_twice_then_start() {
        let mut adapter = adapter();
        let routes = vec![RouteDescriptor::shared("/extra", [HttpMethod::Get])];

        assert_eq!(adapter.register(&routes).unwrap(), 1);
        assert_eq!(adapter.register(&routes).unwrap(), 0);

        let addr = adapter.start().await.unwrap();
        assert_eq!(adapter.loaded_routes().len(), 2);

        let response = client()
            .get(format!("http://{addr}/extra"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        adapter.stop().await.unwrap();
    }
}
