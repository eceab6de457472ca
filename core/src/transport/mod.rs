//! Transport capabilities.
//!
//! The core never speaks HTTP itself. A [`Transport`] receives a
//! [`PreparedRequest`] and reports either the raw response or a failure.
//! Plain async closures are transports, which keeps tests free of any HTTP
//! stack; [`UreqTransport`] is the default implementation for real traffic.

#[cfg(feature = "ureq")]
mod ureq_3;

use std::future::Future;

use async_trait::async_trait;

use crate::http::{PreparedRequest, RawResponse, TransportFailure};

#[cfg(feature = "ureq")]
pub use self::ureq_3::UreqTransport;

/// Performs the network I/O for one prepared request.
///
/// Implementations may answer an error status either with a non-2xx
/// [`RawResponse`] or with a [`TransportFailure`] carrying the status; the
/// engine normalizes both the same way. Timeouts and cancellation are the
/// implementation's concern.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportFailure>;
}

#[async_trait]
impl<F, Fut> Transport for F
where
    F: Fn(PreparedRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawResponse, TransportFailure>> + Send + 'static,
{
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportFailure> {
        (self)(request).await
    }
}
