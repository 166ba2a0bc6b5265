//! Server configuration from environment variables.
//!
//! Values are read once at startup; `.env` loading is done by the
//! binary before this module is consulted.

use std::env;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Default port when neither the CLI flag nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 8080;

/// CORS origin policy for browser clients.
///
/// `CORS_ORIGINS` is a comma-separated allow-list; the single value
/// `*` (also the default) permits any origin. Entries that are not
/// valid header values are dropped with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

impl AllowedOrigins {
    pub fn from_env() -> Self {
        match env::var("CORS_ORIGINS") {
            Ok(raw) => Self::parse(&raw),
            Err(_) => AllowedOrigins::Any,
        }
    }

    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return AllowedOrigins::Any;
        }
        let origins = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                    None
                }
            })
            .collect();
        AllowedOrigins::List(origins)
    }

    pub fn to_cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any);
        match self {
            AllowedOrigins::Any => layer.allow_origin(Any),
            AllowedOrigins::List(origins) => layer.allow_origin(origins.clone()),
        }
    }
}

/// Resolve the listen port: CLI flag wins, then `PORT`, then the
/// default.
pub fn resolve_port(cli_port: Option<u16>) -> u16 {
    if let Some(port) = cli_port {
        return port;
    }
    match env::var("PORT") {
        Ok(raw) => match raw.parse() {
            Ok(port) => port,
            Err(_) => {
                tracing::warn!("Ignoring invalid PORT value '{}'", raw);
                DEFAULT_PORT
            }
        },
        Err(_) => DEFAULT_PORT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_and_empty_mean_any_origin() {
        // テスト項目: "*" と空文字列が Any として解釈される
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(AllowedOrigins::parse("*"), AllowedOrigins::Any);
        assert_eq!(AllowedOrigins::parse("  "), AllowedOrigins::Any);
    }

    #[test]
    fn test_comma_separated_origins_become_allow_list() {
        // テスト項目: カンマ区切りの origin がリストとして解釈される
        // given (前提条件):
        let raw = "http://localhost:5173, https://polls.example.com";

        // when (操作):
        let origins = AllowedOrigins::parse(raw);

        // then (期待する結果):
        let AllowedOrigins::List(values) = origins else {
            panic!("expected an allow-list");
        };
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], "http://localhost:5173");
        assert_eq!(values[1], "https://polls.example.com");
    }

    #[test]
    fn test_invalid_origin_entries_are_dropped() {
        // テスト項目: ヘッダ値として不正な origin が無視される
        // given (前提条件):
        let raw = "http://ok.example.com,bad\nvalue";

        // when (操作):
        let origins = AllowedOrigins::parse(raw);

        // then (期待する結果):
        let AllowedOrigins::List(values) = origins else {
            panic!("expected an allow-list");
        };
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_cli_port_wins_over_default() {
        // テスト項目: CLI のポート指定がデフォルトより優先される
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(resolve_port(Some(3000)), 3000);
    }
}
