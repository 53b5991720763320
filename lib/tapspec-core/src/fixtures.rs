//! Transports and bodies shared by the unit tests.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use http_body::Frame;
use http_body_util::BodyExt;

use crate::{Body, BoxError, Transport, full};

/// Body handing out one chunk per poll.
pub(crate) struct Chunked {
    chunks: VecDeque<Bytes>,
}

impl http_body::Body for Chunked {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        Poll::Ready(self.get_mut().chunks.pop_front().map(|chunk| Ok(Frame::data(chunk))))
    }

    fn is_end_stream(&self) -> bool {
        self.chunks.is_empty()
    }
}

pub(crate) fn chunked(chunks: &[&'static str]) -> Body {
    let chunks = chunks.iter().map(|chunk| Bytes::from_static(chunk.as_bytes()));
    Chunked {
        chunks: chunks.collect(),
    }
    .boxed()
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("stub transport failure")]
pub(crate) struct StubError;

/// Transport answering every request with the same canned response.
///
/// The request body is read frame by frame and dropped before answering, the
/// way a real client streams it onto the wire.
#[derive(Debug, Clone)]
pub(crate) struct StubTransport {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: &'static str,
    fail: bool,
}

impl StubTransport {
    pub(crate) fn ok(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            body,
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok("")
        }
    }

    pub(crate) fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
        self
    }
}

impl Transport for StubTransport {
    type Error = StubError;

    async fn dispatch(&self, request: Request<Body>) -> Result<Response<Body>, StubError> {
        let mut body = request.into_body();
        while let Some(frame) = body.frame().await {
            frame.map_err(|_| StubError)?;
        }
        if self.fail {
            return Err(StubError);
        }

        let mut response = Response::new(full(self.body));
        *response.status_mut() = self.status;
        for (name, value) in &self.headers {
            response.headers_mut().append(name.clone(), value.clone());
        }
        Ok(response)
    }
}
