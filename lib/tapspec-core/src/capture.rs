//! Tee capture of request and response bodies.
//!
//! A [`Tee`] sits between a byte stream and its consumer. Every chunk the
//! consumer reads is handed back untouched and also appended to a [`Capture`].
//! The capture only ever sees what was actually read: nothing is read ahead,
//! so a consumer that stops early leaves a prefix behind.

use std::io::{self, Read};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use tokio::io::{AsyncRead, ReadBuf};

/// Growable byte sink filled by a [`Tee`].
///
/// Clones share the same buffer, so the recorder can keep one handle while
/// the tee owned by the consumer keeps writing into the other.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    buffer: Arc<Mutex<BytesMut>>,
}

impl Capture {
    /// Creates an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the bytes captured so far.
    pub fn bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.lock())
    }

    /// Number of bytes captured so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(crate) fn append(&self, chunk: &[u8]) {
        if !chunk.is_empty() {
            self.lock().extend_from_slice(chunk);
        }
    }

    // appends never leave the buffer half-written, a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, BytesMut> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<&[u8]> for Capture {
    fn from(value: &[u8]) -> Self {
        let capture = Self::new();
        capture.append(value);
        capture
    }
}

/// Stream decorator copying every byte read into a [`Capture`].
///
/// `Tee` implements [`Read`], [`AsyncRead`] and [`Body`] whenever the wrapped
/// stream does. Results, errors and end-of-stream are forwarded verbatim.
/// Dropping the tee drops the wrapped stream, the capture stays readable.
#[derive(Debug)]
pub struct Tee<S> {
    inner: S,
    capture: Capture,
}

impl<S> Tee<S> {
    /// Wraps `inner`, appending everything read from it to `capture`.
    pub fn new(inner: S, capture: Capture) -> Self {
        Self { inner, capture }
    }

    /// The capture this tee writes into.
    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    /// Unwraps the original stream; later reads are no longer captured.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Read for Tee<S>
where
    S: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.inner.read(buf)?;
        if let Some(read) = buf.get(..count) {
            self.capture.append(read);
        }
        Ok(count)
    }
}

impl<S> AsyncRead for Tee<S>
where
    S: AsyncRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let polled = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = polled
            && let Some(read) = buf.filled().get(before..)
        {
            this.capture.append(read);
        }
        polled
    }
}

impl<B> Body for Tee<B>
where
    B: Body<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if let Poll::Ready(Some(Ok(frame))) = &polled
            && let Some(data) = frame.data_ref()
        {
            this.capture.append(data);
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
