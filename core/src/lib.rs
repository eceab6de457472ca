//! Client core for the Glo board API.
//!
//! # Overview
//! Describes HTTP calls as immutable [`Request`] values, assembles their
//! URLs, and runs them through a pluggable [`Transport`]. Every outcome is
//! either a parsed [`Response`] or a normalized [`ApiError`], and is
//! delivered as a future or to a callback, whichever the caller asks for.
//!
//! # Design
//! - The core does no I/O of its own. A transport receives a fully prepared
//!   request (URL, headers, serialized body) and returns the raw answer.
//! - [`RequestBuilder`] is persistent: building never aliases builder state.
//! - Construction errors ([`ConstructionError`]) are kept apart from call
//!   failures ([`ApiError`]) and surface before anything is sent.
//! - [`GloBoardApi`] maps every board, column, card, label, comment and user
//!   operation onto one builder chain, plus the OAuth code flow.
//!
//! ```no_run
//! # async fn demo() -> Result<(), glo_core::Error> {
//! use glo_core::{Credentials, GloBoardApi, UreqTransport};
//!
//! let api = GloBoardApi::new(UreqTransport::new());
//! let creds = Credentials::from_env();
//! let boards = api.get_boards(&creds, None)?.await?;
//! # let _ = boards;
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod execute;
pub mod http;
pub mod request;
pub mod transport;
pub mod types;

pub use client::GloBoardApi;
pub use config::{Credentials, Endpoint, Endpoints};
pub use dispatch::{dispatch, Deferred, Execution};
pub use error::{ApiError, ConstructionError, Error, FailureKind};
pub use execute::{Body, Response};
pub use self::http::{PreparedRequest, RawResponse, Scheme, TransportFailure};
pub use request::{params_from, Params, Request, RequestBuilder};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    AccessToken, Board, BoardUpdate, Card, CardBatch, CardUpdate, Color, Column, ColumnUpdate,
    Comment, Description, IdRef, Label, LabelUpdate, NewCard, Query, Sort, User,
};
