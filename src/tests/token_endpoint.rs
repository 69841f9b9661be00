// Full-stack pass over the relay: browser-shaped requests against the axum
// router, a mocked Twitch endpoint behind it. Pins the public wire contract
// (bodies, status codes, CORS stamp) and the scrape route.

#[cfg(test)]
mod test {

    use http::StatusCode;
    use httpmock::prelude::*;
    use serde_json::json;
    use serial_test::serial;

    use crate::config::settings::MetricsConfig;
    use crate::observability::metrics::get_metrics;
    use crate::observability::service_resources_metrics::collect_process_metrics;
    use crate::server::server::{router, AppState};
    use crate::sources::oauth2::Credentials;
    use crate::tests::common::{
        build_reqwest_client, cache_for, spawn_axum, test_credentials, Router,
    };

    async fn relay_router(token_url: String, credentials: Option<Credentials>) -> Router {
        let metrics = get_metrics().await;
        let state = AppState::new(cache_for(token_url, credentials), metrics);
        router(&MetricsConfig::default(), state)
    }

    #[tokio::test]
    async fn get_token_returns_the_relayed_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "access_token": "abc123", "expires_in": 3600 }));
            })
            .await;

        let app = relay_router(server.url("/oauth2/token"), test_credentials()).await;
        let (handle, addr) = spawn_axum(app).await;

        let client = build_reqwest_client();
        let response = client
            .get(format!("http://{addr}/get-token"))
            .send()
            .await
            .expect("get-token request");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "token": "abc123" }));

        // a second browser hit rides the cache
        let response = client
            .get(format!("http://{addr}/get-token"))
            .send()
            .await
            .expect("second request");
        assert_eq!(response.status(), StatusCode::OK);
        mock.assert_calls_async(1).await;

        handle.abort();
    }

    #[tokio::test]
    async fn upstream_failure_answers_with_the_public_error_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                // 200 but no access_token field, one of the absorbed failure shapes
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "expires_in": 3600 }));
            })
            .await;

        let app = relay_router(server.url("/oauth2/token"), test_credentials()).await;
        let (handle, addr) = spawn_axum(app).await;

        let client = build_reqwest_client();
        let response = client
            .get(format!("http://{addr}/get-token"))
            .send()
            .await
            .expect("get-token request");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // the failure reply is CORS-stamped too, or the extension never sees it
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            body,
            json!({ "error": "Could not get a valid token from Twitch." })
        );

        handle.abort();
    }

    #[tokio::test]
    async fn missing_credentials_answer_the_same_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "access_token": "unreachable", "expires_in": 3600 }));
            })
            .await;

        let app = relay_router(server.url("/oauth2/token"), None).await;
        let (handle, addr) = spawn_axum(app).await;

        let client = build_reqwest_client();
        let response = client
            .get(format!("http://{addr}/get-token"))
            .send()
            .await
            .expect("get-token request");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            body,
            json!({ "error": "Could not get a valid token from Twitch." })
        );
        mock.assert_calls_async(0).await;

        handle.abort();
    }

    #[tokio::test]
    async fn preflight_answers_no_content_with_cors_headers() {
        let server = MockServer::start_async().await;

        let app = relay_router(server.url("/oauth2/token"), test_credentials()).await;
        let (handle, addr) = spawn_axum(app).await;

        let client = build_reqwest_client();
        let response = client
            .request(reqwest::Method::OPTIONS, format!("http://{addr}/get-token"))
            .send()
            .await
            .expect("preflight request");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "GET, OPTIONS"
        );
        assert_eq!(
            headers.get("access-control-allow-headers").unwrap(),
            "Content-Type"
        );

        handle.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_browser_burst_fetches_exactly_once() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "access_token": "burst", "expires_in": 3600 }));
            })
            .await;

        let app = relay_router(server.url("/oauth2/token"), test_credentials()).await;
        let (handle, addr) = spawn_axum(app).await;

        let client = build_reqwest_client();
        let mut requests = Vec::new();
        for _ in 0..8 {
            let client = client.clone();
            let url = format!("http://{addr}/get-token");
            requests.push(tokio::spawn(async move {
                client.get(url).send().await.expect("burst request")
            }));
        }
        for request in requests {
            let response = request.await.expect("task join");
            assert_eq!(response.status(), StatusCode::OK);
        }

        mock.assert_calls_async(1).await;
        handle.abort();
    }

    #[tokio::test]
    #[serial]
    async fn metrics_scrape_exports_the_relay_families() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "access_token": "metered", "expires_in": 3600 }));
            })
            .await;

        let app = relay_router(server.url("/oauth2/token"), test_credentials()).await;
        let (handle, addr) = spawn_axum(app).await;

        let client = build_reqwest_client();
        client
            .get(format!("http://{addr}/get-token"))
            .send()
            .await
            .expect("get-token request");

        let response = client
            .get(format!("http://{addr}/metrics"))
            .send()
            .await
            .expect("metrics scrape");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.text().await.unwrap();
        assert!(body.contains("twitchrelay_token_requests_total"));
        assert!(body.contains("twitchrelay_token_refresh_duration_seconds"));
        assert!(body.contains("twitchrelay_token_expiry_unix_seconds"));

        handle.abort();
    }

    #[tokio::test]
    async fn disabled_metrics_remove_the_scrape_route() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "access_token": "unscraped", "expires_in": 3600 }));
            })
            .await;

        let metrics = get_metrics().await;
        let state = AppState::new(
            cache_for(server.url("/oauth2/token"), test_credentials()),
            metrics,
        );
        let app = router(
            &MetricsConfig {
                is_enabled: false,
                ..MetricsConfig::default()
            },
            state,
        );
        let (handle, addr) = spawn_axum(app).await;

        let client = build_reqwest_client();
        let response = client
            .get(format!("http://{addr}/metrics"))
            .send()
            .await
            .expect("metrics request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // the token endpoint is unaffected by the switch
        let response = client
            .get(format!("http://{addr}/get-token"))
            .send()
            .await
            .expect("get-token request");
        assert_eq!(response.status(), StatusCode::OK);

        // the resource collector honors the same switch and returns at once
        collect_process_metrics(false)
            .await
            .expect("disabled collector");

        handle.abort();
    }
}
