use std::time::Duration;

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, ValueEnum};
use fetchstate::{ControllerOptions, Method, RequestOptions, TransportSettings};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Parser)]
#[command(name = "fetchstate", version = env!("CARGO_PKG_VERSION"), about = "Retrieve targets through a fetch controller and print each resulting state", long_about = None)]
pub struct App {
    /// Targets to retrieve, in order. Relative targets need --base-url.
    #[arg(required = true, value_parser = NonEmptyStringValueParser::new())]
    pub targets: Vec<String>,

    /// Prefix joined onto targets that are not absolute URLs.
    #[arg(long, env = "FETCHSTATE_BASE_URL")]
    pub base_url: Option<String>,

    /// Request header as NAME:VALUE, repeatable.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    #[arg(short = 'X', long, default_value = "GET", value_parser = parse_method)]
    pub method: Method,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Proxy URL, repeatable.
    #[arg(long = "proxy")]
    pub proxies: Vec<String>,

    /// Always go to the network, even for targets already retrieved.
    #[arg(long)]
    pub no_cache: bool,

    /// Let a late result of a replaced target overwrite the newer state.
    #[arg(long)]
    pub keep_superseded: bool,

    /// Log filter directive; falls back to RUST_LOG, then `warn`.
    #[arg(long)]
    pub log: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Hide the spinner.
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{s}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|_| format!("invalid method `{s}`"))
}

impl App {
    pub fn request_options(&self) -> RequestOptions {
        let options = RequestOptions::default()
            .method(self.method.clone())
            .headers(self.headers.clone());
        match self.timeout {
            Some(secs) => options.timeout(Duration::from_secs(secs)),
            None => options,
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        let settings = TransportSettings {
            proxies: self.proxies.clone(),
            ..TransportSettings::default()
        }
        .user_agent(concat!("fetchstate/", env!("CARGO_PKG_VERSION")));
        match &self.base_url {
            Some(base) => settings.base_url(base.as_str()),
            None => settings,
        }
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions::default()
            .cache(!self.no_cache)
            .discard_superseded(!self.keep_superseded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let app = App::try_parse_from(["fetchstate", "https://example.com/items"]).unwrap();
        assert_eq!(app.targets, vec!["https://example.com/items"]);
        assert_eq!(app.method, Method::GET);
        assert_eq!(app.log_format, LogFormat::Compact);

        let options = app.controller_options();
        assert!(options.cache);
        assert!(options.discard_superseded);
        assert!(app.request_options().timeout.is_none());
    }

    #[test]
    fn test_targets_required() {
        assert!(App::try_parse_from(["fetchstate"]).is_err());
    }

    #[test]
    fn test_empty_target_rejected() {
        assert!(App::try_parse_from(["fetchstate", ""]).is_err());
        assert!(App::try_parse_from(["fetchstate", "/a", ""]).is_err());
    }

    #[test]
    fn test_headers_and_method() {
        let app = App::try_parse_from([
            "fetchstate",
            "-X",
            "post",
            "-H",
            "Accept: application/json",
            "--header",
            "X-Trace:1",
            "/items",
        ])
        .unwrap();
        let options = app.request_options();
        assert_eq!(options.method, Method::POST);
        assert_eq!(
            &*options.headers,
            &[
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Trace".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_bad_header_rejected() {
        assert!(App::try_parse_from(["fetchstate", "-H", "no-colon", "/items"]).is_err());
        assert!(App::try_parse_from(["fetchstate", "-H", ":value", "/items"]).is_err());
    }

    #[test]
    fn test_controller_toggles() {
        let app = App::try_parse_from(["fetchstate", "--no-cache", "--keep-superseded", "/a"]).unwrap();
        let options = app.controller_options();
        assert!(!options.cache);
        assert!(!options.discard_superseded);
    }

    #[test]
    fn test_transport_settings() {
        let app = App::try_parse_from([
            "fetchstate",
            "--base-url",
            "http://api.test",
            "--proxy",
            "http://127.0.0.1:3128",
            "--timeout",
            "5",
            "/a",
        ])
        .unwrap();
        let settings = app.transport_settings();
        assert_eq!(settings.base_url.as_deref(), Some("http://api.test"));
        assert_eq!(settings.proxies, vec!["http://127.0.0.1:3128"]);
        assert_eq!(app.request_options().timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_log_format() {
        let app = App::try_parse_from(["fetchstate", "--log-format", "json", "--log", "fetchstate=debug", "/a"]).unwrap();
        assert_eq!(app.log_format, LogFormat::Json);
        assert_eq!(app.log.as_deref(), Some("fetchstate=debug"));
    }
}
