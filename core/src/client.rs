//! Resource façade for the Glo board API.
//!
//! # Design
//! `GloBoardApi` holds only its endpoints and a shared transport. Every
//! method composes a [`RequestBuilder`] with a fixed path and verb, builds it
//! and returns a typed [`Execution`]; nothing is sent until the caller awaits
//! it or hands it a callback. Credentials are passed to each call, so one
//! façade can serve several accounts.

use std::borrow::Cow;
use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::{Credentials, Endpoints};
use crate::dispatch::Execution;
use crate::error::ConstructionError;
use crate::request::{params_from, Params, RequestBuilder};
use crate::transport::Transport;
use crate::types::{
    Board, BoardUpdate, Card, CardBatch, CardUpdate, Color, Column, ColumnUpdate, Comment, Label,
    LabelUpdate, NewCard, Query, User,
};

const BOARDS: &str = "/v1/glo/boards";

/// Client for boards, columns, cards, labels, comments and the current user.
#[derive(Clone)]
pub struct GloBoardApi {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
}

impl GloBoardApi {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_endpoints(transport, Endpoints::default())
    }

    pub fn with_endpoints(transport: impl Transport + 'static, endpoints: Endpoints) -> Self {
        Self {
            transport: Arc::new(transport),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    // --- boards ---

    pub fn get_boards(
        &self,
        credentials: &Credentials,
        query: Option<&Query>,
    ) -> Result<Execution<Vec<Board>>, ConstructionError> {
        self.read(credentials, BOARDS.to_string(), query)
    }

    pub fn get_board(
        &self,
        credentials: &Credentials,
        board_id: &str,
        query: Option<&Query>,
    ) -> Result<Execution<Board>, ConstructionError> {
        self.read(credentials, board_path(board_id)?, query)
    }

    pub fn create_board(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> Result<Execution<Board>, ConstructionError> {
        self.write(credentials, BOARDS.to_string(), params_from(&json!({ "name": name }))?)
    }

    pub fn edit_board(
        &self,
        credentials: &Credentials,
        board_id: &str,
        update: &BoardUpdate,
    ) -> Result<Execution<Board>, ConstructionError> {
        self.write(credentials, board_path(board_id)?, params_from(update)?)
    }

    pub fn delete_board(
        &self,
        credentials: &Credentials,
        board_id: &str,
    ) -> Result<Execution<()>, ConstructionError> {
        self.remove(credentials, board_path(board_id)?)
    }

    // --- columns ---

    /// Create a column; `position` defaults to the first slot.
    pub fn create_column(
        &self,
        credentials: &Credentials,
        board_id: &str,
        name: &str,
        position: Option<u32>,
    ) -> Result<Execution<Column>, ConstructionError> {
        let body = params_from(&json!({ "name": name, "position": position.unwrap_or(0) }))?;
        self.write(credentials, format!("{}/columns", board_path(board_id)?), body)
    }

    pub fn edit_column(
        &self,
        credentials: &Credentials,
        board_id: &str,
        column_id: &str,
        update: &ColumnUpdate,
    ) -> Result<Execution<Column>, ConstructionError> {
        self.write(credentials, column_path(board_id, column_id)?, params_from(update)?)
    }

    pub fn delete_column(
        &self,
        credentials: &Credentials,
        board_id: &str,
        column_id: &str,
    ) -> Result<Execution<()>, ConstructionError> {
        self.remove(credentials, column_path(board_id, column_id)?)
    }

    // --- cards ---

    pub fn get_cards_of_board(
        &self,
        credentials: &Credentials,
        board_id: &str,
        query: Option<&Query>,
    ) -> Result<Execution<Vec<Card>>, ConstructionError> {
        self.read(credentials, format!("{}/cards", board_path(board_id)?), query)
    }

    pub fn get_cards_of_column(
        &self,
        credentials: &Credentials,
        board_id: &str,
        column_id: &str,
        query: Option<&Query>,
    ) -> Result<Execution<Vec<Card>>, ConstructionError> {
        self.read(credentials, format!("{}/cards", column_path(board_id, column_id)?), query)
    }

    /// Create `card` in `column_id`. The column argument wins over any
    /// `column_id` already set on the card.
    pub fn create_card(
        &self,
        credentials: &Credentials,
        board_id: &str,
        column_id: &str,
        card: &NewCard,
    ) -> Result<Execution<Card>, ConstructionError> {
        let mut body = params_from(card)?;
        body.insert("column_id".to_string(), column_id.into());
        self.write(credentials, format!("{}/cards", board_path(board_id)?), body)
    }

    /// Create several cards at once. Each card names its own column.
    pub fn create_batch_of_cards(
        &self,
        credentials: &Credentials,
        board_id: &str,
        cards: &[NewCard],
        send_notification: bool,
    ) -> Result<Execution<CardBatch>, ConstructionError> {
        let body = params_from(&json!({ "cards": cards, "send_notification": send_notification }))?;
        self.write(credentials, format!("{}/cards/batch", board_path(board_id)?), body)
    }

    pub fn get_card(
        &self,
        credentials: &Credentials,
        board_id: &str,
        card_id: &str,
        query: Option<&Query>,
    ) -> Result<Execution<Card>, ConstructionError> {
        self.read(credentials, card_path(board_id, card_id)?, query)
    }

    pub fn edit_card(
        &self,
        credentials: &Credentials,
        board_id: &str,
        card_id: &str,
        update: &CardUpdate,
    ) -> Result<Execution<Card>, ConstructionError> {
        self.write(credentials, card_path(board_id, card_id)?, params_from(update)?)
    }

    pub fn delete_card(
        &self,
        credentials: &Credentials,
        board_id: &str,
        card_id: &str,
    ) -> Result<Execution<()>, ConstructionError> {
        self.remove(credentials, card_path(board_id, card_id)?)
    }

    // --- labels ---

    pub fn create_label(
        &self,
        credentials: &Credentials,
        board_id: &str,
        name: &str,
        color: Color,
    ) -> Result<Execution<Label>, ConstructionError> {
        let body = params_from(&json!({ "name": name, "color": color }))?;
        self.write(credentials, format!("{}/labels", board_path(board_id)?), body)
    }

    pub fn edit_label(
        &self,
        credentials: &Credentials,
        board_id: &str,
        label_id: &str,
        update: &LabelUpdate,
    ) -> Result<Execution<Label>, ConstructionError> {
        self.write(credentials, label_path(board_id, label_id)?, params_from(update)?)
    }

    pub fn delete_label(
        &self,
        credentials: &Credentials,
        board_id: &str,
        label_id: &str,
    ) -> Result<Execution<()>, ConstructionError> {
        self.remove(credentials, label_path(board_id, label_id)?)
    }

    // --- comments ---

    pub fn get_comments_of_card(
        &self,
        credentials: &Credentials,
        board_id: &str,
        card_id: &str,
        query: Option<&Query>,
    ) -> Result<Execution<Vec<Comment>>, ConstructionError> {
        self.read(credentials, comments_path(board_id, card_id)?, query)
    }

    pub fn create_comment(
        &self,
        credentials: &Credentials,
        board_id: &str,
        card_id: &str,
        text: &str,
    ) -> Result<Execution<Comment>, ConstructionError> {
        let body = params_from(&json!({ "text": text }))?;
        self.write(credentials, comments_path(board_id, card_id)?, body)
    }

    pub fn edit_comment(
        &self,
        credentials: &Credentials,
        board_id: &str,
        card_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<Execution<Comment>, ConstructionError> {
        let body = params_from(&json!({ "text": text }))?;
        let path = comment_path(board_id, card_id, comment_id)?;
        self.write(credentials, path, body)
    }

    pub fn delete_comment(
        &self,
        credentials: &Credentials,
        board_id: &str,
        card_id: &str,
        comment_id: &str,
    ) -> Result<Execution<()>, ConstructionError> {
        let path = comment_path(board_id, card_id, comment_id)?;
        self.remove(credentials, path)
    }

    // --- user ---

    pub fn get_user(
        &self,
        credentials: &Credentials,
        query: Option<&Query>,
    ) -> Result<Execution<User>, ConstructionError> {
        self.read(credentials, "/v1/glo/user".to_string(), query)
    }

    fn board_request(&self, credentials: &Credentials, path: String) -> RequestBuilder {
        let builder = RequestBuilder::for_endpoint(&self.endpoints.boards).with_path(path);
        match credentials.access_token() {
            Some(token) => builder.with_auth(token),
            None => builder,
        }
    }

    fn read<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        path: String,
        query: Option<&Query>,
    ) -> Result<Execution<T>, ConstructionError> {
        let query = query.map(params_from).transpose()?;
        let request = self
            .board_request(credentials, path)
            .with_query_parameters(query)
            .build()?;
        Ok(request.execute(&self.transport, Method::GET).json())
    }

    fn write<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        path: String,
        body: Params,
    ) -> Result<Execution<T>, ConstructionError> {
        let request = self
            .board_request(credentials, path)
            .with_headers([("Content-Type", "application/json")])
            .with_body_parameters(body)
            .build()?;
        Ok(request.execute(&self.transport, Method::POST).json())
    }

    fn remove(
        &self,
        credentials: &Credentials,
        path: String,
    ) -> Result<Execution<()>, ConstructionError> {
        let request = self.board_request(credentials, path).build()?;
        Ok(request.execute(&self.transport, Method::DELETE).empty())
    }
}

fn board_path(board_id: &str) -> Result<String, ConstructionError> {
    Ok(format!("{BOARDS}/{}", segment(board_id)?))
}

fn column_path(board_id: &str, column_id: &str) -> Result<String, ConstructionError> {
    Ok(format!("{}/columns/{}", board_path(board_id)?, segment(column_id)?))
}

fn card_path(board_id: &str, card_id: &str) -> Result<String, ConstructionError> {
    Ok(format!("{}/cards/{}", board_path(board_id)?, segment(card_id)?))
}

fn label_path(board_id: &str, label_id: &str) -> Result<String, ConstructionError> {
    Ok(format!("{}/labels/{}", board_path(board_id)?, segment(label_id)?))
}

fn comments_path(board_id: &str, card_id: &str) -> Result<String, ConstructionError> {
    Ok(format!("{}/comments", card_path(board_id, card_id)?))
}

fn comment_path(
    board_id: &str,
    card_id: &str,
    comment_id: &str,
) -> Result<String, ConstructionError> {
    Ok(format!("{}/{}", comments_path(board_id, card_id)?, segment(comment_id)?))
}

/// Encode `id` as exactly one path segment.
///
/// `.` and `..` cannot be represented: URL parsing collapses them whatever
/// their encoding.
fn segment(id: &str) -> Result<Cow<'_, str>, ConstructionError> {
    match id {
        "" | "." | ".." => Err(ConstructionError::InvalidId(id.to_string())),
        _ => Ok(urlencoding::encode(id)),
    }
}
