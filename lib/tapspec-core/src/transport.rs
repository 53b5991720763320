use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};

/// Boxed error carried by [`Body`] streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request and response body type flowing through a [`Transport`].
pub type Body = BoxBody<Bytes, BoxError>;

/// A body without any data, for requests that carry no payload.
pub fn empty() -> Body {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// A body holding `data` in a single frame.
pub fn full(data: impl Into<Bytes>) -> Body {
    let data: Bytes = data.into();
    Full::new(data).map_err(|never| match never {}).boxed()
}

/// Something able to send an HTTP request and yield its response.
///
/// This is the only capability the [`Recorder`](crate::Recorder) needs from
/// the transport it wraps, and the recorder implements it in turn, so a
/// recording transport can be handed to any code written against this trait.
///
/// # Example
///
/// ```rust
/// use http::{Request, Response, StatusCode};
/// use tapspec_core::{Body, Transport, full};
///
/// #[derive(Debug, Clone)]
/// struct Teapot;
///
/// impl Transport for Teapot {
///     type Error = http::Error;
///
///     async fn dispatch(&self, _request: Request<Body>) -> Result<Response<Body>, Self::Error> {
///         Response::builder()
///             .status(StatusCode::IM_A_TEAPOT)
///             .body(full("short and stout"))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Error reported when the request could not be completed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends `request` and resolves to the response head with a streaming body.
    fn dispatch(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, Self::Error>> + Send;
}

impl<T> Transport for Arc<T>
where
    T: Transport,
{
    type Error = T::Error;

    fn dispatch(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, Self::Error>> + Send {
        T::dispatch(self, request)
    }
}

impl<T> Transport for &T
where
    T: Transport,
{
    type Error = T::Error;

    fn dispatch(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, Self::Error>> + Send {
        T::dispatch(self, request)
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use http::{Request, Response};
    use http_body_util::BodyExt;
    use tracing::debug;

    use super::{Body, Transport};
    use crate::TapspecError;

    /// [`Transport`] backed by a [`reqwest::Client`].
    ///
    /// Pooling, redirects, TLS and timeouts are whatever the client was built with.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Wraps an already configured client.
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        /// The wrapped client.
        pub fn client(&self) -> &reqwest::Client {
            &self.client
        }
    }

    impl From<reqwest::Client> for ReqwestTransport {
        fn from(client: reqwest::Client) -> Self {
            Self::new(client)
        }
    }

    impl Transport for ReqwestTransport {
        type Error = TapspecError;

        async fn dispatch(&self, request: Request<Body>) -> Result<Response<Body>, TapspecError> {
            let request = reqwest::Request::try_from(request.map(reqwest::Body::wrap))?;
            debug!(method = %request.method(), url = %request.url(), "executing");
            let response = self.client.execute(request).await?;

            let response: Response<reqwest::Body> = response.into();
            Ok(response.map(|body| body.map_err(Into::into).boxed()))
        }
    }
}
