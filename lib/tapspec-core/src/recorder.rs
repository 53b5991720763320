use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::uri::PathAndQuery;
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri, Version, request, response};
use http_body::Body as _;
use http_body_util::BodyExt;
use tracing::debug;

use crate::capture::{Capture, Tee};
use crate::transport::{Body, Transport};

/// Request head as it was handed to the transport.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method.
    pub method: Method,
    /// Target URI.
    pub uri: Uri,
    /// HTTP version requested.
    pub version: Version,
    /// Request headers.
    pub headers: HeaderMap,
}

impl RecordedRequest {
    /// The request target: path and query, `/` when the URI has no path.
    pub fn target(&self) -> &str {
        self.uri.path_and_query().map_or("/", PathAndQuery::as_str)
    }
}

impl From<&request::Parts> for RecordedRequest {
    fn from(parts: &request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers: parts.headers.clone(),
        }
    }
}

/// Response head as it was returned by the transport.
#[derive(Debug, Clone)]
pub struct RecordedResponse {
    /// Protocol version of the response.
    pub version: Version,
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
}

impl From<&response::Parts> for RecordedResponse {
    fn from(parts: &response::Parts) -> Self {
        Self {
            version: parts.version,
            status: parts.status,
            headers: parts.headers.clone(),
        }
    }
}

/// One completed request/response round trip.
///
/// Body captures keep filling while the caller reads the response, so an
/// exchange drained before its body was consumed shows the bytes read so far.
#[derive(Debug, Clone)]
pub struct Exchange {
    request: RecordedRequest,
    response: RecordedResponse,
    request_body: Option<Capture>,
    response_body: Capture,
}

impl Exchange {
    /// The request head.
    pub fn request(&self) -> &RecordedRequest {
        &self.request
    }

    /// The response head.
    pub fn response(&self) -> &RecordedResponse {
        &self.response
    }

    /// Bytes read from the request body, `None` when the request had no body.
    pub fn request_body(&self) -> Option<&Capture> {
        self.request_body.as_ref()
    }

    /// Bytes read from the response body so far.
    pub fn response_body(&self) -> &Capture {
        &self.response_body
    }
}

/// Transport decorator logging every successful exchange.
///
/// Clones share the same log, so one recorder can be handed to every
/// collaborator issuing requests and drained from a single place.
///
/// # Example
///
/// ```rust
/// # use http::{Request, Response};
/// # use tapspec_core::{Body, Transport, full, empty};
/// # #[derive(Debug, Clone)]
/// # struct Echo;
/// # impl Transport for Echo {
/// #     type Error = http::Error;
/// #     async fn dispatch(&self, _request: Request<Body>) -> Result<Response<Body>, Self::Error> {
/// #         Response::builder().body(full(r#"{"a":1}"#))
/// #     }
/// # }
/// # #[tokio::main]
/// # async fn main() -> Result<(), tapspec_core::BoxError> {
/// use http_body_util::BodyExt;
///
/// let recorder = tapspec_core::install(Echo);
///
/// let request = Request::get("https://example.com/posts").body(empty())?;
/// let response = recorder.dispatch(request).await?;
/// let _body = response.into_body().collect().await?;
///
/// for exchange in recorder.drain() {
///     println!("{}", tapspec_core::render(&exchange));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Recorder<T> {
    transport: T,
    log: Arc<Mutex<Vec<Exchange>>>,
}

/// Wraps `transport` into a [`Recorder`].
pub fn install<T>(transport: T) -> Recorder<T>
where
    T: Transport,
{
    Recorder::new(transport)
}

impl<T> Recorder<T> {
    /// Wraps `transport` with an empty log.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            log: Arc::default(),
        }
    }

    /// The wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Takes every exchange logged so far, oldest first, leaving the log empty.
    pub fn drain(&self) -> Vec<Exchange> {
        mem::take(&mut *self.lock())
    }

    /// Takes the `count` most recent exchanges, oldest first.
    ///
    /// The whole log is cleared, older exchanges are dropped.
    pub fn drain_last(&self, count: usize) -> Vec<Exchange> {
        let mut exchanges = self.drain();
        let skipped = exchanges.len().saturating_sub(count);
        exchanges.split_off(skipped)
    }

    /// Number of exchanges waiting to be drained.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no exchange is waiting to be drained.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn append(&self, exchange: Exchange) {
        self.lock().push(exchange);
    }

    // a panic can't happen between taking the lock and finishing a push or a swap
    fn lock(&self) -> MutexGuard<'_, Vec<Exchange>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Transport for Recorder<T>
where
    T: Transport,
{
    type Error = T::Error;

    async fn dispatch(&self, request: Request<Body>) -> Result<Response<Body>, Self::Error> {
        let (parts, body) = request.into_parts();
        let recorded_request = RecordedRequest::from(&parts);

        let (body, request_body) = if body.is_end_stream() {
            (body, None)
        } else {
            let capture = Capture::new();
            (Tee::new(body, capture.clone()).boxed(), Some(capture))
        };

        debug!(method = %parts.method, uri = %parts.uri, "sending...");
        let response = self
            .transport
            .dispatch(Request::from_parts(parts, body))
            .await
            .inspect_err(|error| debug!(%error, "dispatch failed, nothing recorded"))?;
        debug!(status = %response.status(), "...receiving");

        let (parts, body) = response.into_parts();
        let response_body = Capture::new();
        let exchange = Exchange {
            request: recorded_request,
            response: RecordedResponse::from(&parts),
            request_body,
            response_body: response_body.clone(),
        };
        self.append(exchange);

        let body = Tee::new(body, response_body).boxed();
        Ok(Response::from_parts(parts, body))
    }
}
