//! API integration tests
//!
//! Drive the full router in-process against the in-memory backend.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use fleet_server::{
    api,
    config::{AppConfig, AuthConfig, StorageBackend},
    repository::MemoryStore,
    AppState,
};

struct TestApp {
    router: Router,
    token: String,
}

impl TestApp {
    async fn new() -> Self {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.auth = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            bootstrap_username: Some("admin".to_string()),
            bootstrap_password: Some("admin123".to_string()),
            ..AuthConfig::default()
        };

        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        state.services.auth.ensure_bootstrap_admin().await.unwrap();
        let router = api::create_router(state);

        let mut app = Self {
            router,
            token: String::new(),
        };
        let (status, body) = app
            .send(Method::POST, "/api/auth/login", Some(json!({"username": "admin", "password": "admin123"})), false)
            .await;
        assert_eq!(status, StatusCode::OK);
        app.token = body["token"].as_str().unwrap().to_string();
        app
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>, auth: bool) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, false).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), true).await
    }

    async fn vehicle(&self, plate: &str) -> String {
        let (status, body) = self
            .post(
                "/api/vehicles",
                json!({
                    "licensePlate": plate,
                    "make": "Toyota",
                    "model": "Corolla",
                    "type": "sedan",
                    "location": "Casablanca"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn client(&self, first: &str, last: &str, cin: &str) -> String {
        let (status, body) = self
            .post(
                "/api/clients",
                json!({
                    "firstName": first,
                    "lastName": last,
                    "cin": cin,
                    "type": "new",
                    "location": "Casablanca",
                    "phone": "0600000000"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn assign(&self, vehicle_id: &str, client_id: &str) -> (StatusCode, Value) {
        self.post(
            "/api/assignments",
            json!({"vehicleId": vehicle_id, "clientId": client_id, "notes": "airport pickup"}),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/api/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_writes_require_a_token() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::POST, "/api/vehicles", Some(json!({})), false)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/vehicles/00000000-0000-0000-0000-000000000000")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay open
    let (status, body) = app.get("/api/vehicles").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/auth/me", None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert!(body.get("password").is_none());

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "admin", "password": "wrong"})),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    let (status, _) = app
        .post("/api/change-password", json!({"currentPassword": "admin123", "newPassword": "abc"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/change-password", json!({"currentPassword": "nope", "newPassword": "secret99"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/api/change-password", json!({"currentPassword": "admin123", "newPassword": "secret99"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "admin", "password": "secret99"})),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_vehicle_normalizes_and_rejects_duplicates() {
    let app = TestApp::new().await;
    let id = app.vehicle(" 12345-a-6 ").await;

    let (status, body) = app.get(&format!("/api/vehicles/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["licensePlate"], "12345-A-6");
    assert_eq!(body["status"], "available");
    assert_eq!(body["type"], "sedan");

    let (status, body) = app
        .post(
            "/api/vehicles",
            json!({
                "licensePlate": "12345-A-6",
                "make": "Kia",
                "model": "Picanto",
                "type": "sedan",
                "location": "Oujda"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_invalid_vehicle_reports_field_details() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            "/api/vehicles",
            json!({
                "licensePlate": "  ",
                "make": "Kia",
                "model": "Picanto",
                "type": "spaceship",
                "location": "Oujda",
                "status": "assigned"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_object().unwrap();
    assert!(details.contains_key("licensePlate"));
    assert!(details.contains_key("type"));
    assert!(details.contains_key("status"));
}

#[tokio::test]
async fn test_malformed_requests_are_bad_requests() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/clients")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"firstName\": "))
        .unwrap();
    let (status, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.get("/api/vehicles/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/api/clients/00000000-0000-0000-0000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cin_is_unique_ignoring_case() {
    let app = TestApp::new().await;
    app.client("Amina", "Alaoui", "AB123456").await;

    let (status, _) = app
        .post(
            "/api/clients",
            json!({
                "firstName": "Other",
                "lastName": "Person",
                "cin": "ab123456",
                "type": "existing",
                "location": "Fes",
                "phone": "0611111111"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.get("/api/clients?cin=ab123456").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["cin"], "AB123456");
}

#[tokio::test]
async fn test_assignment_lifecycle() {
    let app = TestApp::new().await;
    let v1 = app.vehicle("V1").await;
    let c1 = app.client("Amina", "Alaoui", "C1").await;
    let c2 = app.client("Omar", "Tazi", "C2").await;

    let (status, first) = app.assign(&v1, &c1).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "active");
    assert_eq!(first["endDate"], Value::Null);
    let first_id = first["id"].as_str().unwrap().to_string();

    let (_, vehicle) = app.get(&format!("/api/vehicles/{}", v1)).await;
    assert_eq!(vehicle["status"], "assigned");
    let (_, vehicles) = app.get("/api/vehicles").await;
    assert_eq!(vehicles[0]["assignedTo"], "Amina Alaoui");
    let (_, clients) = app.get("/api/clients").await;
    assert_eq!(clients[0]["assignedVehicle"], "Toyota Corolla (V1)");
    assert_eq!(clients[0]["available"], false);

    let (status, body) = app.assign(&v1, &c2).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "vehicle not available");

    let (status, current) = app.get(&format!("/api/clients/{}/current-assignment", c1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["id"], first_id.as_str());
    assert_eq!(current["vehiclePlate"], "V1");

    let (status, cancelled) = app.post(&format!("/api/assignments/{}/cancel", first_id), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert!(cancelled["endDate"].is_string());

    let (status, second) = app.assign(&v1, &c2).await;
    assert_eq!(status, StatusCode::CREATED);
    let second_id = second["id"].as_str().unwrap().to_string();

    let (status, done) = app.post(&format!("/api/assignments/{}/complete", second_id), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let (status, body) = app.post(&format!("/api/assignments/{}/complete", second_id), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "assignment not active");

    let (_, current) = app.get(&format!("/api/clients/{}/current-assignment", c2)).await;
    assert_eq!(current, Value::Null);

    let (_, history) = app.get(&format!("/api/clients/{}/assignment-history", c2)).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["status"], "completed");
    assert_eq!(history[0]["clientName"], "Omar Tazi");

    // Cancelled assignments are not history
    let (_, history) = app.get(&format!("/api/clients/{}/assignment-history", c1)).await;
    assert_eq!(history, json!([]));

    let (_, stats) = app.get("/api/stats").await;
    assert_eq!(stats["totalVehicles"], 1);
    assert_eq!(stats["availableVehicles"], 1);
    assert_eq!(stats["activeAssignments"], 0);
}

#[tokio::test]
async fn test_assignment_list_is_newest_first() {
    let app = TestApp::new().await;
    let v = app.vehicle("V1").await;
    let c = app.client("Amina", "Alaoui", "C1").await;

    for _ in 0..3 {
        let (_, a) = app.assign(&v, &c).await;
        let id = a["id"].as_str().unwrap();
        app.post(&format!("/api/assignments/{}/complete", id), json!({})).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (status, list) = app.get("/api/assignments").await;
    assert_eq!(status, StatusCode::OK);
    let starts: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["startDate"].as_str().unwrap())
        .collect();
    assert_eq!(starts.len(), 3);
    let mut sorted = starts.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(starts, sorted);
}

#[tokio::test]
async fn test_unknown_parties_are_not_found() {
    let app = TestApp::new().await;
    let v = app.vehicle("V1").await;
    let (status, _) = app.assign(&v, "00000000-0000-0000-0000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .get("/api/clients/00000000-0000-0000-0000-000000000000/assignment-history")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_with_history_needs_force() {
    let app = TestApp::new().await;
    let v = app.vehicle("V1").await;
    let c = app.client("Amina", "Alaoui", "C1").await;
    let (_, a) = app.assign(&v, &c).await;
    let id = a["id"].as_str().unwrap().to_string();

    let uri = format!("/api/clients/{}", c);
    let (status, _) = app.send(Method::DELETE, &uri, None, true).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.post(&format!("/api/assignments/{}/complete", id), json!({})).await;
    let (status, _) = app.send(Method::DELETE, &uri, None, true).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.send(Method::DELETE, &format!("{}?force=true", uri), None, true).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/assignments/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/vehicles/{}", v), None, true)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_patch_vehicle_status_rules() {
    let app = TestApp::new().await;
    let v = app.vehicle("V1").await;
    let c = app.client("Amina", "Alaoui", "C1").await;
    let uri = format!("/api/vehicles/{}", v);

    let (status, _) = app
        .send(Method::PATCH, &uri, Some(json!({"status": "assigned"})), true)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.assign(&v, &c).await;
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(json!({"status": "maintenance"})), true)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(json!({"location": "Tanger"})), true)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Tanger");
    assert_eq!(body["status"], "assigned");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/assignments"].is_object());
}
