#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::{
        api::create_router,
        config::Config,
        db::{
            AddressRegistry, InMemoryAddressRegistry, InMemoryProgressTracker,
            InMemoryTransactionStore, ProgressTracker, TransactionStore,
        },
        models::{AddressTransactionsResponse, CurrentBlockResponse},
        state::AppState,
        tests::support::{tx, FailingTransactionStore, MockBlockSource},
    };

    fn app_state(source: MockBlockSource) -> Arc<AppState> {
        app_state_with_store(source, Arc::new(InMemoryTransactionStore::new()))
    }

    fn app_state_with_store(
        source: MockBlockSource,
        store: Arc<dyn TransactionStore>,
    ) -> Arc<AppState> {
        Arc::new(AppState {
            config: Config::default(),
            source: Arc::new(source),
            registry: Arc::new(InMemoryAddressRegistry::new()),
            store,
            progress: Arc::new(InMemoryProgressTracker::new()),
        })
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = app_state(MockBlockSource::new(1, 1));
        let (status, body) = send(create_router(state), "GET", "/healthz").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_current_block_comes_from_source() {
        let state = app_state(MockBlockSource::new(42, 42));
        let (status, body) = send(create_router(state), "GET", "/block/current").await;

        assert_eq!(status, StatusCode::OK);
        let response: CurrentBlockResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.block_number, 42);
    }

    #[tokio::test]
    async fn test_current_block_upstream_failure() {
        let state = app_state(MockBlockSource::new(42, 42).fail_heights_from(0));
        let (status, _) = send(create_router(state), "GET", "/block/current").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_parsed_block_reports_watermark() {
        let state = app_state(MockBlockSource::new(42, 42));
        state.progress.advance(17).await.unwrap();

        let (status, body) = send(create_router(state), "GET", "/block/parsed").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"blockNumber":17}"#);
    }

    #[tokio::test]
    async fn test_subscribe_then_lookup() {
        let state = app_state(MockBlockSource::new(1, 1));

        let (status, _) = send(create_router(state.clone()), "POST", "/subscribe/0xAbC").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(state.registry.is_subscribed("0xabc").await.unwrap());

        // Idempotent
        let (status, _) = send(create_router(state.clone()), "POST", "/subscribe/0xabc").await;
        assert_eq!(status, StatusCode::ACCEPTED);

        state.store.save("0xabc", &tx("0x999", "0xabc", "0xdef")).await.unwrap();

        let (status, body) =
            send(create_router(state.clone()), "GET", "/transactions/0xABC").await;
        assert_eq!(status, StatusCode::OK);
        let response: AddressTransactionsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.transactions.len(), 1);
        assert_eq!(response.transactions[0].hash, "0x999");

        let (status, body) = send(create_router(state), "GET", "/transactions/0xdef").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"transactions":[]}"#);
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal_error() {
        let store = Arc::new(FailingTransactionStore::new());
        let state = app_state_with_store(MockBlockSource::new(1, 1), store);

        let (status, body) = send(create_router(state), "GET", "/transactions/0xabc").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        // Backend details stay in the logs
        assert_eq!(json["error"], "Storage error occurred");
    }

    #[tokio::test]
    async fn test_blank_address_is_rejected() {
        let state = app_state(MockBlockSource::new(1, 1));

        let (status, _) = send(create_router(state.clone()), "POST", "/subscribe/%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(create_router(state), "GET", "/transactions/%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_transaction_json_shape() {
        let state = app_state(MockBlockSource::new(1, 1));
        state.store.save("0xabc", &tx("0x1", "0xabc", "0xdef")).await.unwrap();

        let (_, body) = send(create_router(state), "GET", "/transactions/0xabc").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let first = &json["transactions"][0];

        assert_eq!(first["from"], "0xabc");
        assert_eq!(first["blockHash"], "0xb10c");
        assert_eq!(first["transactionIndex"], 0);
        assert!(first.get("value").is_some());
    }
}
