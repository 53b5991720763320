//! # Tapspec Core
//!
//! Record the HTTP traffic of a client and turn it into markdown transcripts
//! for protocol documentation.
//!
//! - [`install`] wraps any [`Transport`] into a [`Recorder`]. The recorder is a
//!   transport too: requests go through unchanged while their bodies, and the
//!   bodies of the responses, are copied as they are read.
//! - [`Recorder::drain`] hands back every [`Exchange`] completed so far.
//! - [`render`] turns an exchange into fenced markdown blocks, and an
//!   [`ExampleBook`] collects named transcripts into one JSON document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use http::Request;
//! use http_body_util::BodyExt;
//! use tapspec_core::{ExampleBook, ReqwestTransport, Transport, empty, full, install};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), tapspec_core::BoxError> {
//! let recorder = install(ReqwestTransport::default());
//!
//! let request = Request::get("https://example.com/posts?limit=2").body(empty())?;
//! let response = recorder.dispatch(request).await?;
//! // bodies are captured while they are read
//! response.into_body().collect().await?;
//!
//! let request = Request::post("https://example.com/posts")
//!     .header("content-type", "application/json")
//!     .body(full(r#"{"text":"hello"}"#))?;
//! recorder.dispatch(request).await?.into_body().collect().await?;
//!
//! let mut book = ExampleBook::new();
//! let [feed, new_post] = <[_; 2]>::try_from(recorder.drain()).map_err(|_| "two exchanges")?;
//! book.insert("posts_feed", &feed)?;
//! book.insert("new_post", &new_post)?;
//! book.write_to("target/examples.json")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Capture semantics
//!
//! Capture is a tee, not a forced read: a body that is never read leaves an
//! empty capture, and the matching JSON block is left out of the transcript.
//! Only exchanges whose dispatch succeeded are recorded.

mod book;
mod capture;
mod error;
mod recorder;
mod transcript;
mod transport;

#[cfg(test)]
mod fixtures;

pub use self::book::ExampleBook;
pub use self::capture::{Capture, Tee};
pub use self::error::TapspecError;
pub use self::recorder::{Exchange, RecordedRequest, RecordedResponse, Recorder, install};
pub use self::transcript::{EXCLUDED_HEADERS, Transcriber, render};
#[cfg(feature = "reqwest")]
pub use self::transport::ReqwestTransport;
pub use self::transport::{Body, BoxError, Transport, empty, full};
