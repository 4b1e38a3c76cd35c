//! End-to-end tests driving the router in-process

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use clubhub_api::{build_router, AppState};
use clubhub_core::{ClubStore, Config};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let config = Config::for_testing();
    let store = Arc::new(ClubStore::open(&config.store).unwrap());
    let state = Arc::new(AppState::new(store, &config).unwrap());
    build_router(state, true)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/registerUser",
        None,
        Some(json!({
            "email": email,
            "name": name,
            "password": "secret-pass",
            "institute_id": "CS-2024",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["authToken"].as_str().unwrap().to_string()
}

async fn create_club(app: &Router, token: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        Method::PUT,
        "/addClub",
        Some(token),
        Some(json!({ "clubName": name, "description": "A club for testing" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body
}

async fn create_event(app: &Router, token: &str, club_id: &str, title: &str, start: &str, end: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::PUT,
        &format!("/addEvent/{}", club_id),
        Some(token),
        Some(json!({
            "title": title,
            "description": "An event for testing",
            "venue": "Main Hall",
            "startTime": start,
            "endTime": end,
        })),
    )
    .await
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = app();
    let token = register(&app, "Ada@Campus.edu", "Ada").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/loginUser",
        None,
        Some(json!({ "email": "ada@campus.edu", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["authToken"].is_string());

    let (status, body) = send(&app, Method::GET, "/myData", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@campus.edu");
    assert_eq!(body["user"]["instituteId"], "CS-2024");
    assert!(body["user"].get("passwordHash").is_none());
    assert_eq!(body["includedInClubs"], json!([]));
}

#[tokio::test]
async fn test_registration_and_login_failures() {
    let app = app();
    register(&app, "ada@campus.edu", "Ada").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/registerUser",
        None,
        Some(json!({ "email": "ada@campus.edu", "name": "Ada", "password": "secret-pass", "instituteId": "CS1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/registerUser",
        None,
        Some(json!({ "email": "nope", "name": "Al", "password": "123", "instituteId": "C" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 4);

    let (wrong_status, wrong_body) = send(
        &app,
        Method::POST,
        "/loginUser",
        None,
        Some(json!({ "email": "ada@campus.edu", "password": "not-it" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        Method::POST,
        "/loginUser",
        None,
        Some(json!({ "email": "ghost@campus.edu", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/myData", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::GET, "/allUsers", Some("forged.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // auth runs before body parsing
    let (status, _) = send(&app, Method::PUT, "/addClub", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // public routes stay open
    let (status, body) = send(&app, Method::GET, "/allClubs", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_legacy_auth_token_header() {
    let app = app();
    let token = register(&app, "ada@campus.edu", "Ada").await;

    let request = Request::builder()
        .uri("/myData")
        .header("auth-token", token)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_club_lifecycle() {
    let app = app();
    let ada = register(&app, "ada@campus.edu", "Ada").await;
    let bob = register(&app, "bob@campus.edu", "Bob").await;

    let club = create_club(&app, &ada, "Robotics").await;
    let club_id = club["id"].as_str().unwrap().to_string();
    assert_eq!(club["clubName"], "Robotics");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/addClub",
        Some(&bob),
        Some(json!({ "clubName": "Robotics", "description": "Another robotics club" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/addClub",
        Some(&bob),
        Some(json!({ "clubName": "X", "description": "Too short a name" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "clubName");

    let (status, body) = send(&app, Method::GET, &format!("/clubData/{}", club_id), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], club_id.as_str());

    for _ in 0..2 {
        let (status, body) = send(&app, Method::PUT, &format!("/follow/{}", club_id), Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["followingClubs"], json!([club_id.clone()]));
    }
    let (_, body) = send(&app, Method::PUT, &format!("/unfollow/{}", club_id), Some(&bob), None).await;
    assert_eq!(body["followingClubs"], json!([]));

    let (status, _) = send(&app, Method::DELETE, &format!("/deleteClub/{}", club_id), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &format!("/deleteClub/{}", club_id), Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(format!("removed club id: {}", club_id)));

    let (status, _) = send(&app, Method::GET, &format!("/clubData/{}", club_id), Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/myData", Some(&ada), None).await;
    assert_eq!(body["user"]["memberships"], json!([]));
    assert_eq!(body["user"]["followingClubs"], json!([]));
}

#[tokio::test]
async fn test_events_and_organisers() {
    let app = app();
    let ada = register(&app, "ada@campus.edu", "Ada").await;
    let bob = register(&app, "bob@campus.edu", "Bob").await;
    let club = create_club(&app, &ada, "Robotics").await;
    let club_id = club["id"].as_str().unwrap();

    let (status, _) = create_event(&app, &bob, club_id, "Meetup", "2030-01-10T18:00:00Z", "2030-01-10T20:00:00Z").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = create_event(&app, &ada, club_id, "Meetup", "2030-01-10T20:00:00Z", "2030-01-10T18:00:00Z").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, late) = create_event(&app, &ada, club_id, "Late", "2030-03-01T18:00:00Z", "2030-03-01T20:00:00Z").await;
    assert_eq!(status, StatusCode::OK);
    let (_, early) = create_event(&app, &ada, club_id, "Early", "2030-01-01T18:00:00Z", "2030-01-01T20:00:00Z").await;
    let event_id = early["id"].as_str().unwrap();

    let (status, body) = send(&app, Method::GET, "/allEvents", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body.as_array().unwrap().iter().map(|e| e["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Early", "Late"]);
    assert_eq!(body[0]["clubName"], "Robotics");
    assert_eq!(body[0]["creatorName"], "Ada");

    let (status, body) = send(&app, Method::GET, &format!("/eventData/{}", event_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ofClub"], club_id);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/addOrganiser/{}", event_id),
        Some(&ada),
        Some(json!({ "email": "Bob@Campus.edu" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "email": "bob@campus.edu", "name": "Bob" }));

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/addOrganiser/{}", event_id),
        Some(&ada),
        Some(json!({ "email": "ada@campus.edu" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/addOrganiser/{}", event_id),
        Some(&bob),
        Some(json!({ "email": "bob@campus.edu" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/deleteOrganiser/{}/bob@campus.edu", event_id),
        Some(&ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "email": "ada@campus.edu", "name": "Ada" }]));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/deleteOrganiser/{}/bob@campus.edu", event_id),
        Some(&ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, &format!("/deleteEvent/{}", event_id), Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(format!("removed event {}", event_id)));

    // deleting the club takes the remaining event with it
    send(&app, Method::DELETE, &format!("/deleteClub/{}", club_id), Some(&ada), None).await;
    let (_, body) = send(&app, Method::GET, "/allEvents", None, None).await;
    assert_eq!(body, json!([]));
    let (status, _) = send(&app, Method::GET, &format!("/eventData/{}", late["id"].as_str().unwrap()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/myData", Some(&ada), None).await;
    assert_eq!(body["user"]["eventsCreated"], json!([]));
}

#[tokio::test]
async fn test_all_users_excludes_caller() {
    let app = app();
    let ada = register(&app, "ada@campus.edu", "Ada").await;
    register(&app, "bob@campus.edu", "Bob").await;

    let (status, body) = send(&app, Method::GET, "/allUsers", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "bob@campus.edu");
    assert!(users[0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_malformed_input() {
    let app = app();
    let ada = register(&app, "ada@campus.edu", "Ada").await;

    let (status, _) = send(&app, Method::GET, "/clubData/64f1c0ffee", Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, "/eventData/not-an-id", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/addClub")
        .header(header::AUTHORIZATION, format!("Bearer {}", ada))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/no/such/route", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // wrong method on a known path keeps the error envelope
    let (status, body) = send(&app, Method::GET, "/addClub", Some(&ada), None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body["error"].is_string(), "{}", body);

    // a percent-decoded segment that is not UTF-8
    let (status, body) = send(&app, Method::DELETE, "/deleteOrganiser/abc/%FF", Some(&ada), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("UTF-8"), "{}", body);
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"][0]["name"], "store");
}
