use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Method;

/// Request configuration handed to the transport unchanged.
///
/// The controller never inspects these values and they are not part of the
/// cache key.
///
/// # Examples
///
/// ```
/// use fetchstate::RequestOptions;
/// use std::time::Duration;
///
/// let options = RequestOptions::default()
///     .header("Accept", "application/json")
///     .timeout(Duration::from_secs(10));
/// assert_eq!(options.headers.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method.
    ///
    /// Default: GET
    pub method: Method,

    /// Headers sent with the request, in order.
    ///
    /// Default: empty
    pub headers: Arc<[(String, String)]>,

    /// Raw request body.
    ///
    /// Default: None
    pub body: Option<Bytes>,

    /// Per-request timeout applied by transports that support one.
    ///
    /// Default: None
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Arc::new([]),
            body: None,
            timeout: None,
        }
    }
}

impl RequestOptions {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a single header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Replace all headers.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What to retrieve: a target locator plus optional request configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    pub target: String,
    pub options: Option<RequestOptions>,
}

impl RequestDescriptor {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), options: None }
    }

    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// An empty target means "do nothing".
    #[must_use]
    pub fn is_empty(&self) -> bool { self.target.is_empty() }
}

impl From<&str> for RequestDescriptor {
    fn from(target: &str) -> Self { Self::new(target) }
}

impl From<String> for RequestDescriptor {
    fn from(target: String) -> Self { Self::new(target) }
}

impl From<Option<&str>> for RequestDescriptor {
    fn from(target: Option<&str>) -> Self { Self::new(target.unwrap_or_default()) }
}
