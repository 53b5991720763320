/// Errors raised by the recorder's own surfaces.
///
/// Failures of a wrapped transport are not converted into this type: a
/// [`Recorder`](crate::Recorder) reports exactly the error type of the
/// transport it wraps.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TapspecError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when network requests fail, timeouts occur, or connection issues arise.
    #[cfg(feature = "reqwest")]
    ReqwestError(reqwest::Error),

    /// HTTP protocol error from the http crate.
    HttpError(http::Error),

    /// JSON serialization error, when writing an example book.
    JsonError(serde_json::Error),

    /// I/O error, when writing an example book to disk.
    IoError(std::io::Error),

    /// Example names are used as keys of the written document and cannot be blank.
    #[display("Invalid example name: {name:?}")]
    #[from(skip)]
    InvalidExampleName {
        /// The rejected name.
        name: String,
    },
}
