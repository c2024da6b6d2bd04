//! End-to-end tests for `KhipuClient` against a wiremock server.

use std::time::Duration;

use assert2::{check, let_assert};
use khipu::{
    AppInfo, Error, HyperClient, KhipuClient, Params, RequestOptions, USER_AGENT,
    resources::{BankType, BanksResponse},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn transport(max_network_retries: u32) -> HyperClient {
    HyperClient::builder()
        .max_network_retries(max_network_retries)
        .retry_delays(Duration::from_millis(1), Duration::from_millis(5))
        .build()
}

fn client(server: &MockServer, max_network_retries: u32) -> KhipuClient {
    KhipuClient::builder("test-key")
        .base_address(server.uri())
        .http_client(transport(max_network_retries))
        .build()
}

fn error_body(error_type: &str, code: &str, message: &str) -> serde_json::Value {
    json!({"error": {"type": error_type, "code": code, "message": message}})
}

#[tokio::test]
async fn lists_banks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/banks"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "banks": [
                {
                    "bank_id": "Bawdf",
                    "name": "DemoBank",
                    "message": "Este es un banco de pruebas.",
                    "min_amount": 200.0,
                    "type": "Persona",
                    "parent": "",
                    "logo_url": "https://s3.amazonaws.com/static.khipu.com/logos/bancos/chile/demobank-icon.png"
                },
                {
                    "bank_id": "kpw2L",
                    "name": "DemoBank Empresas",
                    "message": "",
                    "min_amount": 1000,
                    "type": "Empresa",
                    "parent": "Bawdf",
                    "logo_url": ""
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let banks = client(&server, 0).banks().await.expect("banks");

    check!(banks.banks.len() == 2);
    check!(banks.banks[0].name == "DemoBank");
    check!(banks.banks[1].bank_type == BankType::Empresa);
    check!(banks.banks[1].parent == "Bawdf");
}

#[tokio::test]
async fn get_merges_path_query_with_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/payments"))
        .and(query_param("page", "2"))
        .and(query_param("status", "done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payments": []})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, 0)
        .raw_request(
            "GET",
            "/v3/payments?page=2&status=pending",
            Params::new().with("status", "done"),
            RequestOptions::new(),
        )
        .await
        .expect("response");

    check!(response.status() == 200);
    check!(response.data() == Some(&json!({"payments": []})));
}

#[tokio::test]
async fn post_sends_json_body_and_headers() {
    #[derive(Debug, serde::Deserialize)]
    struct Created {
        payment_id: String,
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .and(header("Content-Type", "application/json"))
        .and(header("x-api-key", "test-key"))
        .and(header("Idempotency-Key", "order-1"))
        .and(body_json(json!({"amount": 1000, "currency": "CLP", "subject": "Order 1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payment_id": "p_1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let response = client
        .raw_request(
            "post",
            "/v3/payments",
            Params::new()
                .with("amount", 1000)
                .with("currency", "CLP")
                .with("subject", "Order 1"),
            RequestOptions::new().idempotency_key("order-1"),
        )
        .await
        .expect("response");

    let created: Created = client.deserialize(&response).expect("created");
    check!(created.payment_id == "p_1");
}

#[tokio::test]
async fn user_agent_identifies_the_application() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/banks"))
        .and(header("User-Agent", format!("{USER_AGENT} shop/1.0").as_str()))
        .and(header("X-Shop", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"banks": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = KhipuClient::builder("test-key")
        .base_address(server.uri())
        .app_info(AppInfo::new("shop").version("1.0"))
        .header("X-Shop", "main")
        .http_client(transport(0))
        .build();

    let banks: BanksResponse = client.banks().await.expect("banks");
    check!(banks.banks.is_empty());
}

#[tokio::test]
async fn api_errors_are_classified() {
    let server = MockServer::start().await;
    let cases = [
        ("/v3/idempotent", 400, error_body("idempotency_error", "", "Keys reused")),
        ("/v3/invalid", 400, error_body("invalid_request_error", "missing", "Missing amount")),
        ("/v3/auth", 401, error_body("authentication_error", "", "Bad key")),
        ("/v3/card", 402, error_body("card_error", "declined", "Declined")),
        ("/v3/forbidden", 403, error_body("permission_error", "", "Forbidden")),
        ("/v3/missing", 404, error_body("invalid_request_error", "", "Not found")),
        ("/v3/slow-down", 429, error_body("rate_limit_error", "", "Too many")),
        ("/v2/legacy", 400, error_body("invalid_request_error", "rate_limit", "Too many")),
    ];
    for (route, status, body) in &cases {
        Mock::given(method("POST"))
            .and(path(*route))
            .respond_with(ResponseTemplate::new(*status).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client(&server, 2);
    let mut errors = Vec::new();
    for (route, _, _) in &cases {
        let result = client
            .raw_request("POST", route, Params::new(), RequestOptions::new())
            .await;
        let_assert!(Err(err) = result);
        errors.push(err);
    }

    check!(matches!(errors[0], Error::Idempotency(_)));
    check!(matches!(errors[1], Error::InvalidRequest(_)));
    check!(matches!(errors[2], Error::Authentication(_)));
    check!(matches!(errors[3], Error::Card(_)));
    check!(matches!(errors[4], Error::Permission(_)));
    check!(matches!(errors[5], Error::InvalidRequest(_)));
    check!(matches!(errors[6], Error::RateLimit(_)));
    check!(matches!(errors[7], Error::RateLimit(_)));

    check!(errors[3].code() == Some("declined"));
    check!(errors[1].status() == Some(400));
    check!(errors[1].to_string().contains("Missing amount"));
}

#[tokio::test]
async fn non_json_error_body_is_a_generic_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/banks"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, 0).banks().await;

    let_assert!(Err(Error::Api(details)) = result);
    check!(details.http_status == Some(502));
    check!(details.http_body.as_deref() == Some("<html>Bad Gateway</html>"));
}

#[tokio::test]
async fn idempotent_requests_are_retried_on_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/banks"))
        .respond_with(ResponseTemplate::new(503).set_body_json(error_body("api_error", "", "Unavailable")))
        .expect(3)
        .mount(&server)
        .await;

    let result = client(&server, 2).banks().await;

    let_assert!(Err(Error::Api(details)) = result);
    check!(details.http_status == Some(503));
}

#[tokio::test]
async fn retry_recovers_when_the_server_does() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/banks"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/banks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"banks": []})))
        .expect(1)
        .mount(&server)
        .await;

    let banks = client(&server, 2).banks().await.expect("banks");
    check!(banks.banks.is_empty());
}

#[tokio::test]
async fn plain_posts_are_not_retried_on_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body("api_error", "", "boom")))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, 2)
        .raw_request("post", "/v3/payments", Params::new(), RequestOptions::new())
        .await;

    let_assert!(Err(Error::Api(_)) = result);
}

#[tokio::test]
async fn keyed_posts_are_retried_on_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .and(header("Idempotency-Key", "order-7"))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body("api_error", "", "boom")))
        .expect(3)
        .mount(&server)
        .await;

    let result = client(&server, 2)
        .raw_request(
            "post",
            "/v3/payments",
            Params::new(),
            RequestOptions::new().idempotency_key("order-7"),
        )
        .await;

    let_assert!(Err(Error::Api(_)) = result);
}

#[tokio::test]
async fn conflicts_are_retried_for_any_method() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(error_body("api_error", "", "Lock")))
        .expect(2)
        .mount(&server)
        .await;

    let result = client(&server, 1)
        .raw_request("post", "/v3/payments", Params::new(), RequestOptions::new())
        .await;

    let_assert!(Err(Error::Api(details)) = result);
    check!(details.http_status == Some(409));
}

#[tokio::test]
async fn unknown_method_fails_before_any_io() {
    let server = MockServer::start().await;

    let result = client(&server, 0)
        .raw_request("PATCH", "/v3/payments", Params::new(), RequestOptions::new())
        .await;

    let_assert!(Err(Error::ApiConnection(details)) = result);
    check!(details.message.as_deref().is_some_and(|m| m.contains("PATCH")));
    let_assert!(Some(received) = server.received_requests().await);
    check!(received.is_empty());
}

#[tokio::test]
async fn missing_api_key_fails_before_any_io() {
    let server = MockServer::start().await;
    let client = KhipuClient::builder("")
        .base_address(server.uri())
        .http_client(transport(0))
        .build();

    let result = client.banks().await;

    let_assert!(Err(Error::Authentication(details)) = result);
    check!(details.message.as_deref() == Some("No API key provided."));
    let_assert!(Some(received) = server.received_requests().await);
    check!(received.is_empty());
}

#[tokio::test]
async fn per_call_api_key_overrides_the_client_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/banks"))
        .and(header("x-api-key", "other-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"banks": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = KhipuClient::builder("")
        .base_address(server.uri())
        .http_client(transport(0))
        .build();

    let response = client
        .raw_request("get", "/v3/banks", Params::new(), RequestOptions::new().api_key("other-key"))
        .await
        .expect("response");
    check!(response.is_success());
}

#[tokio::test]
async fn shared_default_transport_without_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/banks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"banks": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = KhipuClient::builder("test-key")
        .base_address(server.uri())
        .build();

    let banks = client.banks().await.expect("banks");
    check!(banks.banks.is_empty());
    check!(khipu::default_http_client().config().max_network_retries == 2);
}
