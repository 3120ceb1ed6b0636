use std::future::Future;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::data::RequestOptions;
use crate::error::{Error, Result};

/// A completed transport exchange: status plus raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, body: body.into() }
    }

    /// Response with status 200 and a JSON-encoded body.
    pub fn json_ok<S: serde::Serialize>(value: &S) -> Result<Self> {
        Ok(Self::new(200, serde_json::to_vec(value)?))
    }

    /// `true` for 2xx statuses.
    #[must_use]
    pub fn is_ok(&self) -> bool { (200..300).contains(&self.status) }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(e.to_string()))
    }

    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| Error::Decode(format!("invalid UTF-8: {e}")))
    }
}

/// The "perform request" capability a controller is built on.
///
/// Implementations resolve with whatever the server answered, including
/// non-success statuses; they fail only when no response was obtained.
///
/// # Implementations
///
/// - [`ReqwestTransport`]: production implementation using `reqwest`
/// - in-process scripted transports for testing
pub trait Transport: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Perform one request for `target`.
    ///
    /// `options` is passed through untouched from the request descriptor.
    fn perform(
        &self,
        target: &str,
        options: Option<&RequestOptions>,
    ) -> impl Future<Output = std::result::Result<TransportResponse, Self::Error>> + Send;
}

/// Run one request and turn the response into a payload or an error.
pub(crate) async fn retrieve<C, T>(transport: &C, target: &str, options: Option<&RequestOptions>) -> Result<T>
where
    C: Transport,
    T: DeserializeOwned,
{
    let response = transport
        .perform(target, options)
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;

    if !response.is_ok() {
        return Err(crate::core::application_error(response.status, &response.body));
    }

    response.json()
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use reqwest::{Client, Proxy};

    use super::*;

    /// Settings for building the reqwest client behind [`ReqwestTransport`].
    #[derive(Debug, Clone, Default)]
    pub struct TransportSettings {
        /// Prefix for targets that are not absolute URLs.
        pub base_url: Option<String>,
        /// Headers sent with every request.
        pub default_headers: Vec<(String, String)>,
        /// Proxy URLs; `https://` proxies serve secure targets, the rest plain ones.
        pub proxies: Vec<String>,
        pub connect_timeout: Option<Duration>,
        pub user_agent: Option<String>,
    }

    impl TransportSettings {
        #[must_use]
        pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = Some(base_url.into());
            self
        }

        #[must_use]
        pub fn default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
            self.default_headers.push((key.into(), value.into()));
            self
        }

        #[must_use]
        pub fn proxy(mut self, url: impl Into<String>) -> Self {
            self.proxies.push(url.into());
            self
        }

        #[must_use]
        pub fn connect_timeout(mut self, timeout: Duration) -> Self {
            self.connect_timeout = Some(timeout);
            self
        }

        #[must_use]
        pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
            self.user_agent = Some(user_agent.into());
            self
        }

        fn build_client(&self) -> Result<Client> {
            let mut cb = Client::builder();

            let (secure, insecure): (Vec<&String>, Vec<&String>) =
                self.proxies.iter().partition(|u| u.starts_with("https://"));

            for u in secure {
                cb = cb.proxy(
                    Proxy::https(u.as_str()).map_err(|source| Error::InvalidProxy { url: u.clone(), source })?,
                );
            }

            for u in insecure {
                cb = cb.proxy(
                    Proxy::http(u.as_str()).map_err(|source| Error::InvalidProxy { url: u.clone(), source })?,
                );
            }

            if !self.default_headers.is_empty() {
                cb = cb.default_headers(header_map(&self.default_headers)?);
            }
            if let Some(timeout) = self.connect_timeout {
                cb = cb.connect_timeout(timeout);
            }
            if let Some(ref user_agent) = self.user_agent {
                cb = cb.user_agent(user_agent.as_str());
            }

            cb.build().map_err(Error::ClientBuild)
        }
    }

    fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| Error::InvalidHeader(key.clone()))?;
            let value = HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(format!("{key}: {value}")))?;
            map.append(name, value);
        }
        Ok(map)
    }

    /// Production transport over `reqwest`.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
        base_url: Option<String>,
    }

    impl ReqwestTransport {
        /// Create a transport with default client settings.
        pub fn new() -> Result<Self> { Self::from_settings(TransportSettings::default()) }

        pub fn from_settings(settings: TransportSettings) -> Result<Self> {
            let client = settings.build_client()?;
            Ok(Self { client, base_url: settings.base_url })
        }

        /// Wrap an existing client.
        pub fn with_client(client: Client) -> Self { Self { client, base_url: None } }

        /// Resolve a target against the base URL.
        pub fn resolve(&self, target: &str) -> String {
            match &self.base_url {
                Some(base) if !target.starts_with("http://") && !target.starts_with("https://") => {
                    format!("{}/{}", base.trim_end_matches('/'), target.trim_start_matches('/'))
                }
                _ => target.to_string(),
            }
        }
    }

    impl Transport for ReqwestTransport {
        type Error = reqwest::Error;

        async fn perform(
            &self,
            target: &str,
            options: Option<&RequestOptions>,
        ) -> std::result::Result<TransportResponse, Self::Error> {
            let url = self.resolve(target);
            let mut request = match options {
                Some(options) => {
                    let mut request = self.client.request(options.method.clone(), url);
                    for (key, value) in options.headers.iter() {
                        request = request.header(key.as_str(), value.as_str());
                    }
                    if let Some(ref body) = options.body {
                        request = request.body(body.clone());
                    }
                    request
                }
                None => self.client.get(url),
            };
            if let Some(timeout) = options.and_then(|o| o.timeout) {
                request = request.timeout(timeout);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;

            Ok(TransportResponse { status, body })
        }
    }

}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ReqwestTransport, TransportSettings};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_is_ok() {
        assert!(TransportResponse::new(200, "").is_ok());
        assert!(TransportResponse::new(204, "").is_ok());
        assert!(!TransportResponse::new(199, "").is_ok());
        assert!(!TransportResponse::new(304, "").is_ok());
        assert!(!TransportResponse::new(404, "").is_ok());
    }

    #[test]
    fn test_response_json() {
        let response = TransportResponse::new(200, "[1,2,3]");
        let data: Vec<u32> = response.json().unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn test_response_json_invalid() {
        let response = TransportResponse::new(200, "not json");
        assert!(matches!(response.json::<Vec<u32>>(), Err(Error::Decode(_))));
    }

    #[test]
    fn test_response_text_invalid_utf8() {
        let response = TransportResponse::new(200, vec![0xff, 0xfe]);
        assert!(response.text().is_err());
    }

    #[test]
    fn test_json_ok() {
        let response = TransportResponse::json_ok(&vec![1, 2]).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(&response.body[..], b"[1,2]");
    }
}
