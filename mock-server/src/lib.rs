//! In-memory stand-in for the Glo board API.
//!
//! Serves the `/v1/glo` resource routes behind a bearer-token check and the
//! `/oauth/access_token` exchange. Errors are JSON objects with a `message`
//! field, like the real service.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    pub position: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub columns: Vec<Column>,
    pub labels: Vec<Label>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub board_id: String,
    pub column_id: String,
    pub position: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    pub labels: Vec<Value>,
    pub assignees: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub comment_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub board_id: String,
    pub card_id: String,
}

#[derive(Deserialize)]
pub struct NewBoard {
    pub name: String,
}

#[derive(Deserialize)]
pub struct BoardEdit {
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct NewColumn {
    pub name: String,
    #[serde(default)]
    pub position: u32,
}

#[derive(Deserialize)]
pub struct ColumnEdit {
    pub name: Option<String>,
    pub position: Option<u32>,
}

#[derive(Clone, Deserialize)]
pub struct NewCard {
    pub name: String,
    pub column_id: String,
    pub position: Option<u32>,
    pub description: Option<Value>,
    #[serde(default)]
    pub labels: Vec<Value>,
    #[serde(default)]
    pub assignees: Vec<Value>,
    pub due_date: Option<String>,
}

#[derive(Deserialize)]
pub struct CardBatch {
    pub cards: Vec<NewCard>,
    #[serde(default)]
    pub send_notification: bool,
}

#[derive(Deserialize)]
pub struct CardEdit {
    pub name: Option<String>,
    pub column_id: Option<String>,
    pub position: Option<u32>,
    pub description: Option<Value>,
    pub labels: Option<Vec<Value>>,
    pub assignees: Option<Vec<Value>>,
    pub due_date: Option<String>,
}

#[derive(Deserialize)]
pub struct NewLabel {
    pub name: String,
    pub color: Option<Color>,
}

#[derive(Deserialize)]
pub struct LabelEdit {
    pub name: Option<String>,
    pub color: Option<Color>,
}

#[derive(Deserialize)]
pub struct CommentText {
    pub text: String,
}

#[derive(Deserialize)]
pub struct TokenGrant {
    pub grant_type: String,
    pub code: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Default)]
pub struct Store {
    boards: Vec<Board>,
    cards: Vec<Card>,
    comments: Vec<Comment>,
}

pub type Db = Arc<RwLock<Store>>;

/// A JSON error response: `{"message": ...}` with the given status.
#[derive(Debug)]
pub struct Failure(StatusCode, String);

impl Failure {
    fn not_found(what: &str) -> Self {
        Failure(StatusCode::NOT_FOUND, format!("{what} not found"))
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));

    let glo = Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route(
            "/boards/{board_id}",
            get(get_board).post(edit_board).delete(delete_board),
        )
        .route("/boards/{board_id}/columns", post(create_column))
        .route(
            "/boards/{board_id}/columns/{column_id}",
            post(edit_column).delete(delete_column),
        )
        .route(
            "/boards/{board_id}/columns/{column_id}/cards",
            get(list_cards_of_column),
        )
        .route(
            "/boards/{board_id}/cards",
            get(list_cards_of_board).post(create_card),
        )
        .route("/boards/{board_id}/cards/batch", post(create_card_batch))
        .route(
            "/boards/{board_id}/cards/{card_id}",
            get(get_card).post(edit_card).delete(delete_card),
        )
        .route(
            "/boards/{board_id}/cards/{card_id}/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/boards/{board_id}/cards/{card_id}/comments/{comment_id}",
            post(edit_comment).delete(delete_comment),
        )
        .route("/boards/{board_id}/labels", post(create_label))
        .route(
            "/boards/{board_id}/labels/{label_id}",
            post(edit_label).delete(delete_label),
        )
        .route("/user", get(get_user))
        .route_layer(middleware::from_fn(require_bearer));

    Router::new()
        .nest("/v1/glo", glo)
        .route("/oauth/access_token", post(grant_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_bearer(request: Request, next: Next) -> Result<Response, Failure> {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !token.trim().is_empty());
    if !authorized {
        return Err(Failure(StatusCode::UNAUTHORIZED, "Unauthorized".to_string()));
    }
    Ok(next.run(request).await)
}

// --- boards ---

async fn list_boards(State(db): State<Db>) -> Json<Vec<Board>> {
    Json(db.read().await.boards.clone())
}

async fn create_board(
    State(db): State<Db>,
    Json(input): Json<NewBoard>,
) -> (StatusCode, Json<Board>) {
    let board = Board {
        id: new_id(),
        name: input.name,
        columns: Vec::new(),
        labels: Vec::new(),
    };
    info!(id = %board.id, "board created");
    db.write().await.boards.push(board.clone());
    (StatusCode::CREATED, Json(board))
}

async fn get_board(
    State(db): State<Db>,
    Path(board_id): Path<String>,
) -> Result<Json<Board>, Failure> {
    let store = db.read().await;
    store.board(&board_id).cloned().map(Json)
}

async fn edit_board(
    State(db): State<Db>,
    Path(board_id): Path<String>,
    Json(input): Json<BoardEdit>,
) -> Result<Json<Board>, Failure> {
    let mut store = db.write().await;
    let board = store.board_mut(&board_id)?;
    if let Some(name) = input.name {
        board.name = name;
    }
    info!(id = %board_id, "board edited");
    Ok(Json(board.clone()))
}

async fn delete_board(
    State(db): State<Db>,
    Path(board_id): Path<String>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    store.board(&board_id)?;
    store.boards.retain(|b| b.id != board_id);
    store.cards.retain(|c| c.board_id != board_id);
    store.comments.retain(|c| c.board_id != board_id);
    info!(id = %board_id, "board deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- columns ---

async fn create_column(
    State(db): State<Db>,
    Path(board_id): Path<String>,
    Json(input): Json<NewColumn>,
) -> Result<(StatusCode, Json<Column>), Failure> {
    let mut store = db.write().await;
    let board = store.board_mut(&board_id)?;
    let column = Column {
        id: new_id(),
        name: input.name,
        position: 0,
    };
    let id = column.id.clone();
    let at = (input.position as usize).min(board.columns.len());
    board.columns.insert(at, column);
    renumber(&mut board.columns);
    let column = board.column(&id)?.clone();
    info!(id = %column.id, board = %board_id, "column created");
    Ok((StatusCode::CREATED, Json(column)))
}

async fn edit_column(
    State(db): State<Db>,
    Path((board_id, column_id)): Path<(String, String)>,
    Json(input): Json<ColumnEdit>,
) -> Result<Json<Column>, Failure> {
    let mut store = db.write().await;
    let board = store.board_mut(&board_id)?;
    let index = board
        .columns
        .iter()
        .position(|c| c.id == column_id)
        .ok_or_else(|| Failure::not_found("Column"))?;
    let mut column = board.columns.remove(index);
    if let Some(name) = input.name {
        column.name = name;
    }
    let at = input
        .position
        .map_or(index, |p| (p as usize).min(board.columns.len()));
    board.columns.insert(at, column);
    renumber(&mut board.columns);
    info!(id = %column_id, board = %board_id, "column edited");
    Ok(Json(board.column(&column_id)?.clone()))
}

async fn delete_column(
    State(db): State<Db>,
    Path((board_id, column_id)): Path<(String, String)>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    let board = store.board_mut(&board_id)?;
    board.column(&column_id)?;
    board.columns.retain(|c| c.id != column_id);
    renumber(&mut board.columns);
    let removed: Vec<String> = store
        .cards
        .iter()
        .filter(|c| c.column_id == column_id)
        .map(|c| c.id.clone())
        .collect();
    store.cards.retain(|c| c.column_id != column_id);
    store.comments.retain(|c| !removed.contains(&c.card_id));
    info!(id = %column_id, board = %board_id, cards = removed.len(), "column deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn renumber(columns: &mut [Column]) {
    for (position, column) in columns.iter_mut().enumerate() {
        column.position = position as u32;
    }
}

// --- cards ---

async fn list_cards_of_board(
    State(db): State<Db>,
    Path(board_id): Path<String>,
) -> Result<Json<Vec<Card>>, Failure> {
    let store = db.read().await;
    store.board(&board_id)?;
    Ok(Json(
        store
            .cards
            .iter()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect(),
    ))
}

async fn list_cards_of_column(
    State(db): State<Db>,
    Path((board_id, column_id)): Path<(String, String)>,
) -> Result<Json<Vec<Card>>, Failure> {
    let store = db.read().await;
    store.board(&board_id)?.column(&column_id)?;
    Ok(Json(
        store
            .cards
            .iter()
            .filter(|c| c.column_id == column_id)
            .cloned()
            .collect(),
    ))
}

async fn create_card(
    State(db): State<Db>,
    Path(board_id): Path<String>,
    Json(input): Json<NewCard>,
) -> Result<(StatusCode, Json<Card>), Failure> {
    let mut store = db.write().await;
    let card = store.insert_card(&board_id, input)?;
    info!(id = %card.id, board = %board_id, "card created");
    Ok((StatusCode::CREATED, Json(card)))
}

async fn create_card_batch(
    State(db): State<Db>,
    Path(board_id): Path<String>,
    Json(input): Json<CardBatch>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let mut store = db.write().await;
    let board = store.board(&board_id)?;
    for card in &input.cards {
        board.column(&card.column_id)?;
    }
    let mut created = Vec::with_capacity(input.cards.len());
    for card in input.cards {
        created.push(store.insert_card(&board_id, card)?);
    }
    info!(
        board = %board_id,
        count = created.len(),
        notify = input.send_notification,
        "card batch created"
    );
    Ok((StatusCode::CREATED, Json(json!({ "cards": created }))))
}

async fn get_card(
    State(db): State<Db>,
    Path((board_id, card_id)): Path<(String, String)>,
) -> Result<Json<Card>, Failure> {
    let store = db.read().await;
    store.card(&board_id, &card_id).cloned().map(Json)
}

async fn edit_card(
    State(db): State<Db>,
    Path((board_id, card_id)): Path<(String, String)>,
    Json(input): Json<CardEdit>,
) -> Result<Json<Card>, Failure> {
    let mut store = db.write().await;
    if let Some(column_id) = &input.column_id {
        store.board(&board_id)?.column(column_id)?;
    }
    let card = store.card_mut(&board_id, &card_id)?;
    if let Some(name) = input.name {
        card.name = name;
    }
    if let Some(column_id) = input.column_id {
        card.column_id = column_id;
    }
    if let Some(position) = input.position {
        card.position = position;
    }
    if input.description.is_some() {
        card.description = input.description;
    }
    if let Some(labels) = input.labels {
        card.labels = labels;
    }
    if let Some(assignees) = input.assignees {
        card.assignees = assignees;
    }
    if input.due_date.is_some() {
        card.due_date = input.due_date;
    }
    info!(id = %card_id, board = %board_id, "card edited");
    Ok(Json(card.clone()))
}

async fn delete_card(
    State(db): State<Db>,
    Path((board_id, card_id)): Path<(String, String)>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    store.card(&board_id, &card_id)?;
    store.cards.retain(|c| c.id != card_id);
    store.comments.retain(|c| c.card_id != card_id);
    info!(id = %card_id, board = %board_id, "card deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- labels ---

async fn create_label(
    State(db): State<Db>,
    Path(board_id): Path<String>,
    Json(input): Json<NewLabel>,
) -> Result<(StatusCode, Json<Label>), Failure> {
    let mut store = db.write().await;
    let board = store.board_mut(&board_id)?;
    let label = Label {
        id: new_id(),
        name: input.name,
        color: input.color,
    };
    board.labels.push(label.clone());
    info!(id = %label.id, board = %board_id, "label created");
    Ok((StatusCode::CREATED, Json(label)))
}

async fn edit_label(
    State(db): State<Db>,
    Path((board_id, label_id)): Path<(String, String)>,
    Json(input): Json<LabelEdit>,
) -> Result<Json<Label>, Failure> {
    let mut store = db.write().await;
    let label = store
        .board_mut(&board_id)?
        .labels
        .iter_mut()
        .find(|l| l.id == label_id)
        .ok_or_else(|| Failure::not_found("Label"))?;
    if let Some(name) = input.name {
        label.name = name;
    }
    if input.color.is_some() {
        label.color = input.color;
    }
    info!(id = %label_id, board = %board_id, "label edited");
    Ok(Json(label.clone()))
}

async fn delete_label(
    State(db): State<Db>,
    Path((board_id, label_id)): Path<(String, String)>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    let board = store.board_mut(&board_id)?;
    let before = board.labels.len();
    board.labels.retain(|l| l.id != label_id);
    if board.labels.len() == before {
        return Err(Failure::not_found("Label"));
    }
    info!(id = %label_id, board = %board_id, "label deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- comments ---

async fn list_comments(
    State(db): State<Db>,
    Path((board_id, card_id)): Path<(String, String)>,
) -> Result<Json<Vec<Comment>>, Failure> {
    let store = db.read().await;
    store.card(&board_id, &card_id)?;
    Ok(Json(
        store
            .comments
            .iter()
            .filter(|c| c.card_id == card_id)
            .cloned()
            .collect(),
    ))
}

async fn create_comment(
    State(db): State<Db>,
    Path((board_id, card_id)): Path<(String, String)>,
    Json(input): Json<CommentText>,
) -> Result<(StatusCode, Json<Comment>), Failure> {
    let mut store = db.write().await;
    store.card_mut(&board_id, &card_id)?.comment_count += 1;
    let comment = Comment {
        id: new_id(),
        text: input.text,
        board_id,
        card_id,
    };
    store.comments.push(comment.clone());
    info!(id = %comment.id, card = %comment.card_id, "comment created");
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn edit_comment(
    State(db): State<Db>,
    Path((board_id, card_id, comment_id)): Path<(String, String, String)>,
    Json(input): Json<CommentText>,
) -> Result<Json<Comment>, Failure> {
    let mut store = db.write().await;
    let comment = store.comment_mut(&board_id, &card_id, &comment_id)?;
    comment.text = input.text;
    info!(id = %comment_id, card = %card_id, "comment edited");
    Ok(Json(comment.clone()))
}

async fn delete_comment(
    State(db): State<Db>,
    Path((board_id, card_id, comment_id)): Path<(String, String, String)>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    store.comment_mut(&board_id, &card_id, &comment_id)?;
    store.comments.retain(|c| c.id != comment_id);
    let card = store.card_mut(&board_id, &card_id)?;
    card.comment_count = card.comment_count.saturating_sub(1);
    info!(id = %comment_id, card = %card_id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- user & oauth ---

async fn get_user() -> Json<Value> {
    Json(json!({
        "id": "mock-user",
        "username": "glo-mock",
        "name": "Glo Mock",
        "email": "mock@example.com"
    }))
}

async fn grant_token(Json(input): Json<TokenGrant>) -> Result<Json<Value>, Failure> {
    if input.grant_type != "authorization_code" {
        return Err(Failure(
            StatusCode::BAD_REQUEST,
            format!("unsupported grant_type {}", input.grant_type),
        ));
    }
    if input.code.is_empty() || input.client_id.is_empty() || input.client_secret.is_empty() {
        return Err(Failure(
            StatusCode::BAD_REQUEST,
            "code, client_id and client_secret are required".to_string(),
        ));
    }
    info!(client_id = %input.client_id, "access token granted");
    Ok(Json(json!({
        "access_token": new_id(),
        "refresh_token": new_id(),
        "token_type": "bearer",
        "expires_in": 3600
    })))
}

impl Store {
    fn board(&self, id: &str) -> Result<&Board, Failure> {
        self.boards
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| Failure::not_found("Board"))
    }

    fn board_mut(&mut self, id: &str) -> Result<&mut Board, Failure> {
        self.boards
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| Failure::not_found("Board"))
    }

    fn card(&self, board_id: &str, card_id: &str) -> Result<&Card, Failure> {
        self.board(board_id)?;
        self.cards
            .iter()
            .find(|c| c.board_id == board_id && c.id == card_id)
            .ok_or_else(|| Failure::not_found("Card"))
    }

    fn card_mut(&mut self, board_id: &str, card_id: &str) -> Result<&mut Card, Failure> {
        self.board(board_id)?;
        self.cards
            .iter_mut()
            .find(|c| c.board_id == board_id && c.id == card_id)
            .ok_or_else(|| Failure::not_found("Card"))
    }

    fn comment_mut(
        &mut self,
        board_id: &str,
        card_id: &str,
        comment_id: &str,
    ) -> Result<&mut Comment, Failure> {
        self.card(board_id, card_id)?;
        self.comments
            .iter_mut()
            .find(|c| c.card_id == card_id && c.id == comment_id)
            .ok_or_else(|| Failure::not_found("Comment"))
    }

    fn insert_card(&mut self, board_id: &str, input: NewCard) -> Result<Card, Failure> {
        self.board(board_id)?.column(&input.column_id)?;
        let in_column = self
            .cards
            .iter()
            .filter(|c| c.column_id == input.column_id)
            .count() as u32;
        let card = Card {
            id: new_id(),
            name: input.name,
            board_id: board_id.to_string(),
            column_id: input.column_id,
            position: input.position.unwrap_or(in_column),
            description: input.description,
            labels: input.labels,
            assignees: input.assignees,
            due_date: input.due_date,
            comment_count: 0,
        };
        self.cards.push(card.clone());
        Ok(card)
    }
}

impl Board {
    fn column(&self, id: &str) -> Result<&Column, Failure> {
        self.columns
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Failure::not_found("Column"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with_columns(names: &[&str]) -> Board {
        let mut columns: Vec<Column> = names
            .iter()
            .map(|name| Column {
                id: name.to_string(),
                name: name.to_string(),
                position: 99,
            })
            .collect();
        renumber(&mut columns);
        Board {
            id: "b".to_string(),
            name: "Board".to_string(),
            columns,
            labels: Vec::new(),
        }
    }

    #[test]
    fn renumber_assigns_dense_positions() {
        let board = board_with_columns(&["a", "b", "c"]);
        let positions: Vec<u32> = board.columns.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn new_column_defaults_position_to_zero() {
        let input: NewColumn = serde_json::from_str(r#"{"name":"Todo"}"#).unwrap();
        assert_eq!(input.position, 0);
    }

    #[test]
    fn new_card_requires_column() {
        let result: Result<NewCard, _> = serde_json::from_str(r#"{"name":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn insert_card_appends_to_column() {
        let mut store = Store::default();
        store.boards.push(board_with_columns(&["todo"]));
        let input: NewCard =
            serde_json::from_str(r#"{"name":"one","column_id":"todo"}"#).unwrap();
        let first = store.insert_card("b", input.clone()).unwrap();
        let second = store.insert_card("b", input).unwrap();
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn insert_card_rejects_unknown_column() {
        let mut store = Store::default();
        store.boards.push(board_with_columns(&["todo"]));
        let input: NewCard =
            serde_json::from_str(r#"{"name":"one","column_id":"done"}"#).unwrap();
        let err = store.insert_card("b", input).unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert_eq!(err.1, "Column not found");
    }

    #[test]
    fn card_serializes_without_empty_options() {
        let card = Card {
            id: "k".to_string(),
            name: "Card".to_string(),
            board_id: "b".to_string(),
            column_id: "c".to_string(),
            position: 0,
            description: None,
            labels: Vec::new(),
            assignees: Vec::new(),
            due_date: None,
            comment_count: 0,
        };
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["comment_count"], 0);
    }
}
