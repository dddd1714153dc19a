#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::module_inception)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::payment::PaymentClient;
    use crate::store::Store;
    use crate::token::TokenService;

    use crate::http::{router, AppState};

    const TEST_SECRET: &str = "test-signing-secret";

    /// State over a lazy store client; tests in this module only exercise
    /// paths that fail or finish before any store access.
    async fn test_state(payment_base: &str) -> Result<AppState> {
        let store = Store::connect("mongodb://127.0.0.1:27017", "bistro-test").await?;
        Ok(AppState {
            store,
            tokens: Arc::new(TokenService::new(TEST_SECRET)),
            payments: PaymentClient::new(String::from("sk_test_key"), payment_base.to_string()),
        })
    }

    async fn test_server() -> Result<TestServer> {
        let state = test_state("http://127.0.0.1:9").await?;
        Ok(TestServer::new(router(state))?)
    }

    async fn spawn_processor(status: StatusCode, body: Value) -> Result<String> {
        let app = Router::new().route(
            "/v1/payment_intents",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{addr}"))
    }

    #[tokio::test]
    async fn health_returns_ok() -> Result<()> {
        let server = test_server().await?;

        let response = server.get("/health").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body.get("status"), Some(&Value::String("ok".into())));
        Ok(())
    }

    #[tokio::test]
    async fn root_greets() -> Result<()> {
        let server = test_server().await?;

        let response = server.get("/").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.text().contains("bistro"));
        Ok(())
    }

    #[tokio::test]
    async fn jwt_endpoint_issues_verifiable_token() -> Result<()> {
        let server = test_server().await?;

        let response = server
            .post("/jwt")
            .json(&json!({ "email": "alice@example.com" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        let token = body.get("token").and_then(Value::as_str).unwrap();

        let claims = TokenService::new(TEST_SECRET).verify(token)?;
        assert_eq!(claims.email, "alice@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn admin_route_rejects_missing_header() -> Result<()> {
        let server = test_server().await?;

        let response = server.get("/users").await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(
            body.get("message"),
            Some(&Value::String("missing authorization header".into()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn admin_route_rejects_garbage_token() -> Result<()> {
        let server = test_server().await?;

        let response = server
            .get("/users")
            .add_header("Authorization", "Bearer not-a-real-token")
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(
            body.get("message"),
            Some(&Value::String("invalid or expired token".into()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn admin_route_rejects_basic_scheme() -> Result<()> {
        let server = test_server().await?;

        let response = server
            .get("/users")
            .add_header("Authorization", "Basic YWJjOmRlZg==")
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn admin_status_denies_cross_identity_lookup() -> Result<()> {
        let state = test_state("http://127.0.0.1:9").await?;
        let token = state.tokens.issue("alice@example.com")?;
        let server = TestServer::new(router(state))?;

        let response = server
            .get("/users/admin/bob@example.com")
            .add_header("Authorization", format!("Bearer {token}"))
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(
            body.get("message"),
            Some(&Value::String("forbidden access".into()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn cart_delete_rejects_malformed_id() -> Result<()> {
        let server = test_server().await?;

        let response = server.delete("/carts/not-an-object-id").await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            body.get("message"),
            Some(&Value::String("malformed document id".into()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn payment_intent_returns_client_secret() -> Result<()> {
        let base = spawn_processor(
            StatusCode::OK,
            json!({ "id": "pi_1", "client_secret": "pi_1_secret_xyz" }),
        )
        .await?;
        let state = test_state(&base).await?;
        let server = TestServer::new(router(state))?;

        let response = server
            .post("/create-payment-intent")
            .json(&json!({ "price": 19.99 }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(
            body.get("clientSecret"),
            Some(&Value::String("pi_1_secret_xyz".into()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn payment_intent_surfaces_processor_failure() -> Result<()> {
        let base = spawn_processor(
            StatusCode::PAYMENT_REQUIRED,
            json!({ "error": { "message": "card declined" } }),
        )
        .await?;
        let state = test_state(&base).await?;
        let server = TestServer::new(router(state))?;

        let response = server
            .post("/create-payment-intent")
            .json(&json!({ "price": 19.99 }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(
            body.get("message"),
            Some(&Value::String("payment processor error".into()))
        );
        Ok(())
    }
}
