use std::net::TcpListener;
use std::time::Duration;

use aperture_engine::{BackendApi, ClientErrorKind, ClientSettings, ReqwestBackendClient};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestBackendClient {
    let settings = ClientSettings {
        base_url: format!("{}/api/v1", server.uri()),
        ..ClientSettings::default()
    };
    ReqwestBackendClient::new(&settings).expect("client")
}

#[tokio::test]
async fn search_decodes_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .and(query_param("q", "invoice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "results": [{
                "id": "m-1",
                "sender": "billing@x.com",
                "subject": "Invoice #12",
                "preview": "...",
                "relevance_score": 0.92,
                "category": "Finance",
                "has_attachment": true
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).search("invoice").await.expect("search ok");
    assert_eq!(response.status, "success");
    assert_eq!(response.results.len(), 1);
    let hit = &response.results[0];
    assert_eq!(hit.sender, "billing@x.com");
    assert_eq!(hit.subject, "Invoice #12");
    assert_eq!(hit.category, "Finance");
    assert!(hit.has_attachment);
    assert!((hit.relevance_score - 0.92).abs() < f64::EPSILON);
}

#[tokio::test]
async fn search_query_is_url_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .and(query_param("q", "q3 report & #budget"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "success", "results": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let url = client.search_url("q3 report & #budget").unwrap();
    assert!(!url.as_str().contains(' '));
    assert!(!url.as_str().contains('#'));

    let response = client.search("q3 report & #budget").await.expect("search ok");
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn server_error_maps_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server).search("invoice").await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::HttpStatus(500));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).search("invoice").await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Malformed);
}

#[tokio::test]
async fn missing_status_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).jobs().await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Malformed);
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let settings = ClientSettings::for_backend("127.0.0.1", port, "/api/v1");
    let client = ReqwestBackendClient::new(&settings).unwrap();

    let err = client.jobs().await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Unreachable);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "success", "results": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let settings = ClientSettings {
        base_url: format!("{}/api/v1", server.uri()),
        request_timeout: Duration::from_millis(100),
        ..ClientSettings::default()
    };
    let client = ReqwestBackendClient::new(&settings).unwrap();

    let err = client.jobs().await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Timeout);
}

#[tokio::test]
async fn jobs_tolerate_numeric_ids_and_missing_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "results": [
                {"id": 7, "sender": "hr@acme.test", "subject": "Interview invite", "company": "Acme", "status": "Interview"},
                {"id": "j-2", "sender": "jobs@corp.test", "subject": "Thanks for applying"}
            ]
        })))
        .mount(&server)
        .await;

    let response = client_for(&server).jobs().await.expect("jobs ok");
    assert_eq!(response.results.len(), 2);
    assert_eq!(response.results[0].id, "7");
    assert_eq!(response.results[0].company.as_deref(), Some("Acme"));
    assert_eq!(response.results[0].status.as_deref(), Some("Interview"));
    assert_eq!(response.results[1].company, None);
    assert_eq!(response.results[1].status, None);
}

#[tokio::test]
async fn ingest_posts_to_gmail_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ingest/gmail"))
        .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({"status": "started"})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).trigger_ingest().await.expect("ingest ok");
}

#[tokio::test]
async fn ingest_failure_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ingest/gmail"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server).trigger_ingest().await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::HttpStatus(503));
}

#[tokio::test]
async fn health_is_served_from_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let health = client_for(&server).health().await.expect("health ok");
    assert_eq!(health.status, "ok");
}

#[test]
fn invalid_base_url_is_rejected() {
    let settings = ClientSettings {
        base_url: "not a url".to_string(),
        ..ClientSettings::default()
    };
    let err = ReqwestBackendClient::new(&settings).unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::InvalidUrl);
}
