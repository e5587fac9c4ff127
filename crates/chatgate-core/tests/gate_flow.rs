//! End-to-end checks of the guard and transport against a mock chat service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatgate_core::api::{ApiError, AuthTransport, ChatClient, HardNavigator, OutboundRequest};
use chatgate_core::router::{NavigationGuard, NavigationIntent, RouteRegistry};
use chatgate_core::{config, Credential, SessionStore};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl HardNavigator for RecordingNavigator {
    fn hard_redirect(&self, location: &str) {
        self.visits.lock().unwrap().push(location.to_string());
    }
}

struct Gate {
    session: SessionStore,
    navigator: Arc<RecordingNavigator>,
    guard: NavigationGuard,
    client: ChatClient,
}

fn gate(server: &MockServer, credential: Option<&str>, timeout: Duration) -> Gate {
    gate_at(&server.uri(), credential, timeout)
}

fn gate_at(base_url: &str, credential: Option<&str>, timeout: Duration) -> Gate {
    let session = SessionStore::new();
    if let Some(token) = credential {
        session.set(Credential::new(token));
    }
    let navigator = Arc::new(RecordingNavigator::default());
    let transport = AuthTransport::http(base_url, timeout, session.clone(), navigator.clone())
        .expect("test base url is a valid base address");
    let registry = RouteRegistry::new(config::default_routes()).expect("default routes are valid");

    Gate {
        guard: NavigationGuard::new(registry, session.clone()),
        client: ChatClient::new(transport),
        session,
        navigator,
    }
}

fn visits(g: &Gate) -> Vec<String> {
    g.navigator.visits.lock().unwrap().clone()
}

#[tokio::test]
async fn test_navigation_scenarios() {
    let server = MockServer::start().await;

    let anonymous = gate(&server, None, Duration::from_secs(5));
    let to_chats = NavigationIntent::new("/", "/chats");
    assert_eq!(anonymous.guard.resolve(&to_chats).destination(), "/login");

    let signed_in = gate(&server, Some("tok123"), Duration::from_secs(5));
    let to_login = NavigationIntent::new("/chats", "/login");
    assert_eq!(signed_in.guard.resolve(&to_login).destination(), "/chats");
}

#[tokio::test]
async fn test_credential_sent_verbatim_and_kept_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .and(header("authorization", "tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let g = gate(&server, Some("tok123"), Duration::from_secs(5));
    let response = g
        .client
        .transport()
        .send(OutboundRequest::get("/api/messages"))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(g.session.get(), Some(Credential::new("tok123")));
    assert!(visits(&g).is_empty());
}

#[tokio::test]
async fn test_rejection_clears_session_redirects_and_fails_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let g = gate(&server, Some("tok123"), Duration::from_secs(5));
    let result = g.client.conversations().await;

    assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    assert!(!g.session.is_present());
    assert_eq!(visits(&g), vec!["/login".to_string()]);

    // Guarded routes now bounce to login
    for target in ["/chats", "/chats/4"] {
        let resolution = g.guard.resolve(&NavigationIntent::new("/chats", target));
        assert_eq!(resolution.destination(), "/login");
    }
}

#[tokio::test]
async fn test_anonymous_request_has_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/liveness"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let g = gate(&server, None, Duration::from_secs(5));
    g.client.liveness().await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
    assert!(!g.session.is_present());
    assert!(visits(&g).is_empty());
}

#[tokio::test]
async fn test_slow_server_times_out_without_touching_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations/"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let g = gate(&server, Some("tok123"), Duration::from_millis(200));
    let err = g.client.conversations().await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
    assert!(g.session.is_present());
    assert!(visits(&g).is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error_not_a_session_event() {
    // Grab a free port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let g = gate_at(&format!("http://{}", addr), Some("tok123"), Duration::from_secs(5));
    let err = g.client.conversations().await.unwrap_err();

    assert!(matches!(err, ApiError::NetworkError(_)), "expected network error, got {:?}", err);
    assert!(g.session.is_present());
    assert!(visits(&g).is_empty());
}

#[tokio::test]
async fn test_login_then_authenticated_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_json(serde_json::json!({"username": "mario"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 7})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/"))
        .and(query_param("username", "lu"))
        .and(header("authorization", "Bearer 7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 8, "username": "luigi", "profile-photo": null}
        ])))
        .mount(&server)
        .await;

    let g = gate(&server, None, Duration::from_secs(5));
    assert_eq!(g.guard.resolve(&NavigationIntent::new("/", "/chats")).destination(), "/login");

    let id = g.client.login("mario").await.unwrap();
    assert_eq!(id, 7);
    assert_eq!(g.guard.resolve(&NavigationIntent::new("/login", "/chats")).destination(), "/chats");

    let users = g.client.search_users("lu").await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "luigi");
}

#[tokio::test]
async fn test_server_errors_are_not_session_events() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let g = gate(&server, Some("Bearer 1"), Duration::from_secs(5));
    let err = g.client.conversations().await.unwrap_err();

    assert!(matches!(err, ApiError::ServerError(ref body) if body == "boom"));
    assert!(g.session.is_present());
    assert!(visits(&g).is_empty());
}
