//! Dual-mode completion: await the outcome, or hand it to a callback.
//!
//! # Design
//! [`Execution`] is consumed by whichever convention the caller picks.
//! Awaiting goes through `IntoFuture`; `callback` takes `self` by value and
//! returns nothing. One execution therefore settles exactly one future or
//! invokes exactly one callback, never both.
//!
//! Callbacks are driven by spawning onto the ambient tokio runtime. Outside a
//! runtime the operation runs to completion on a dedicated thread with its
//! own single-threaded runtime, and the callback fires there.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::runtime::{Builder, Handle};

use crate::error::ApiError;
use crate::execute::{run, Response};
use crate::http::PreparedRequest;
use crate::transport::Transport;

/// An awaitable outcome.
pub type Deferred<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'static>>;

/// Route `operation`'s outcome to `callback` when one is given, otherwise
/// return it as a [`Deferred`].
pub fn dispatch<T, Fut, F>(operation: Fut, callback: Option<F>) -> Option<Deferred<T>>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    F: FnOnce(Result<T, ApiError>) + Send + 'static,
{
    match callback {
        Some(callback) => {
            deliver(operation, callback);
            None
        }
        None => Some(Box::pin(operation)),
    }
}

fn deliver<T, Fut, F>(operation: Fut, callback: F)
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    F: FnOnce(Result<T, ApiError>) + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move { callback(operation.await) });
        }
        Err(_) => {
            std::thread::spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        return callback(Err(ApiError::transport(format!(
                            "cannot start a runtime for the request: {e}"
                        ))))
                    }
                };
                callback(runtime.block_on(operation));
            });
        }
    }
}

/// One prepared call, not yet sent.
///
/// Nothing happens until it is awaited or given a callback.
#[must_use = "an execution does nothing until awaited or given a callback"]
pub struct Execution<T> {
    request: PreparedRequest,
    transport: Arc<dyn Transport>,
    decode: fn(Response) -> Result<T, ApiError>,
}

impl Execution<Response> {
    pub(crate) fn new(request: PreparedRequest, transport: Arc<dyn Transport>) -> Self {
        Self {
            request,
            transport,
            decode: Ok,
        }
    }

    /// Decode the response body as `U`.
    pub fn json<U: DeserializeOwned>(self) -> Execution<U> {
        Execution {
            request: self.request,
            transport: self.transport,
            decode: Response::json::<U>,
        }
    }

    /// Succeed with `()` whatever the body holds.
    pub fn empty(self) -> Execution<()> {
        Execution {
            request: self.request,
            transport: self.transport,
            decode: discard,
        }
    }
}

fn discard(_: Response) -> Result<(), ApiError> {
    Ok(())
}

impl<T: Send + 'static> Execution<T> {
    /// The call as it will be handed to the transport.
    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    /// Deliver the outcome to `callback` instead of a future.
    pub fn callback<F>(self, callback: F)
    where
        F: FnOnce(Result<T, ApiError>) + Send + 'static,
    {
        dispatch(self.into_deferred(), Some(callback));
    }

    fn into_deferred(self) -> Deferred<T> {
        let Execution {
            request,
            transport,
            decode,
        } = self;
        Box::pin(async move { run(transport.as_ref(), request).await.and_then(decode) })
    }
}

impl<T: Send + 'static> IntoFuture for Execution<T> {
    type Output = Result<T, ApiError>;
    type IntoFuture = Deferred<T>;

    fn into_future(self) -> Self::IntoFuture {
        self.into_deferred()
    }
}
