use axum::http::{self, Request, StatusCode};
use axum::routing::RouterIntoService;
use http_body_util::BodyExt;
use mock_server::{app, Board, Card, Column, Comment, Label};
use serde_json::Value;
use tower::{Service, ServiceExt};

const TOKEN: &str = "Bearer test-token";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn authed(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, TOKEN)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, TOKEN)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn call(
    app: &mut RouterIntoService<String>,
    request: Request<String>,
) -> axum::response::Response {
    ServiceExt::ready(app).await.unwrap().call(request).await.unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_token_returns_401_with_message() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/glo/boards")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn non_bearer_token_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/glo/user")
                .header(http::header::AUTHORIZATION, "Basic abc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_is_404_not_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/v1/glo/nope").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- boards ---

#[tokio::test]
async fn list_boards_empty() {
    let resp = app().oneshot(authed("GET", "/v1/glo/boards")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let boards: Vec<Board> = body_json(resp).await;
    assert!(boards.is_empty());
}

#[tokio::test]
async fn create_board_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/glo/boards", r#"{"name":"Roadmap"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let board: Board = body_json(resp).await;
    assert_eq!(board.name, "Roadmap");
    assert!(board.columns.is_empty());
}

#[tokio::test]
async fn create_board_without_name_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/glo/boards", r#"{"title":"x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_board_not_found_has_message() {
    let resp = app().oneshot(authed("GET", "/v1/glo/boards/missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Board not found");
}

#[tokio::test]
async fn get_user_returns_fixed_user() {
    let resp = app().oneshot(authed("GET", "/v1/glo/user")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = body_json(resp).await;
    assert_eq!(user["username"], "glo-mock");
}

// --- oauth ---

#[tokio::test]
async fn token_grant_needs_no_bearer() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/access_token")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(
                    r#"{"grant_type":"authorization_code","code":"c","client_id":"id","client_secret":"s"}"#
                        .to_string(),
                )
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let token: Value = body_json(resp).await;
    assert_eq!(token["token_type"], "bearer");
    assert!(token["access_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn token_grant_rejects_other_grant_types() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/oauth/access_token",
            r#"{"grant_type":"password","code":"c","client_id":"id","client_secret":"s"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "unsupported grant_type password");
}

// --- full lifecycle ---

#[tokio::test]
async fn board_lifecycle() {
    let mut app = app().into_service();

    // board
    let resp = call(&mut app, json_request("POST", "/v1/glo/boards", r#"{"name":"Plan"}"#)).await;
    let board: Board = body_json(resp).await;
    let b = board.id;

    // two columns; the second is inserted in front
    let resp = call(
        &mut app,
        json_request("POST", &format!("/v1/glo/boards/{b}/columns"), r#"{"name":"Done","position":0}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let done: Column = body_json(resp).await;

    let resp = call(
        &mut app,
        json_request("POST", &format!("/v1/glo/boards/{b}/columns"), r#"{"name":"Todo"}"#),
    )
    .await;
    let todo: Column = body_json(resp).await;
    assert_eq!(todo.position, 0);

    let resp = call(&mut app, authed("GET", &format!("/v1/glo/boards/{b}"))).await;
    let board: Board = body_json(resp).await;
    let names: Vec<&str> = board.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Todo", "Done"]);

    // move "Done" to the front
    let resp = call(
        &mut app,
        json_request(
            "POST",
            &format!("/v1/glo/boards/{b}/columns/{}", done.id),
            r#"{"position":0}"#,
        ),
    )
    .await;
    let moved: Column = body_json(resp).await;
    assert_eq!(moved.position, 0);

    // card
    let resp = call(
        &mut app,
        json_request(
            "POST",
            &format!("/v1/glo/boards/{b}/cards"),
            &format!(r#"{{"name":"Write","column_id":"{}"}}"#, todo.id),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let card: Card = body_json(resp).await;
    let k = card.id;

    // batch
    let resp = call(
        &mut app,
        json_request(
            "POST",
            &format!("/v1/glo/boards/{b}/cards/batch"),
            &format!(
                r#"{{"cards":[{{"name":"A","column_id":"{0}"}},{{"name":"B","column_id":"{0}"}}],"send_notification":false}}"#,
                done.id
            ),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let batch: Value = body_json(resp).await;
    assert_eq!(batch["cards"].as_array().map(Vec::len), Some(2));

    let resp = call(
        &mut app,
        authed("GET", &format!("/v1/glo/boards/{b}/columns/{}/cards", done.id)),
    )
    .await;
    let in_done: Vec<Card> = body_json(resp).await;
    assert_eq!(in_done.len(), 2);

    // label
    let resp = call(
        &mut app,
        json_request(
            "POST",
            &format!("/v1/glo/boards/{b}/labels"),
            r#"{"name":"bug","color":{"r":255,"g":0,"b":0,"a":1.0}}"#,
        ),
    )
    .await;
    let label: Label = body_json(resp).await;
    let resp = call(
        &mut app,
        json_request(
            "POST",
            &format!("/v1/glo/boards/{b}/cards/{k}"),
            &format!(r#"{{"labels":[{{"id":"{}"}}]}}"#, label.id),
        ),
    )
    .await;
    let edited: Card = body_json(resp).await;
    assert_eq!(edited.name, "Write");
    assert_eq!(edited.labels.len(), 1);

    // comments
    let comments = format!("/v1/glo/boards/{b}/cards/{k}/comments");
    let resp = call(&mut app, json_request("POST", &comments, r#"{"text":"first"}"#)).await;
    let comment: Comment = body_json(resp).await;
    assert_eq!(comment.card_id, k);

    let resp = call(&mut app, authed("GET", &format!("/v1/glo/boards/{b}/cards/{k}"))).await;
    let card: Card = body_json(resp).await;
    assert_eq!(card.comment_count, 1);

    let resp = call(
        &mut app,
        json_request("POST", &format!("{comments}/{}", comment.id), r#"{"text":"edited"}"#),
    )
    .await;
    let comment: Comment = body_json(resp).await;
    assert_eq!(comment.text, "edited");

    let resp = call(&mut app, authed("DELETE", &format!("{comments}/{}", comment.id))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = call(&mut app, authed("GET", &comments)).await;
    let left: Vec<Comment> = body_json(resp).await;
    assert!(left.is_empty());

    // deleting the board removes everything under it
    let resp = call(&mut app, authed("DELETE", &format!("/v1/glo/boards/{b}"))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = call(&mut app, authed("GET", &format!("/v1/glo/boards/{b}/cards/{k}"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = call(&mut app, authed("GET", "/v1/glo/boards")).await;
    let boards: Vec<Board> = body_json(resp).await;
    assert!(boards.is_empty());
}
