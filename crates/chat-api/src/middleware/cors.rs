//! CORS policy for the browser client.

use std::str::FromStr;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tracing::warn;

use chat_core::config::app::CorsConfig;

/// Build the layer from `[server.cors]`.
///
/// With `*` origins the layer answers any origin but never with
/// credentials, so the `jwt` cookie only works once origins are listed.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let any_origin = config.allows_any_origin();
    let any_header = config.allowed_headers.iter().any(|h| h == "*");

    let layer = CorsLayer::new()
        .allow_methods(parse_all::<Method>(&config.allowed_methods, "method"))
        .max_age(Duration::from_secs(config.max_age_seconds));

    let layer = if any_origin {
        layer.allow_origin(Any)
    } else {
        layer
            .allow_origin(AllowOrigin::list(parse_all::<HeaderValue>(
                &config.allowed_origins,
                "origin",
            )))
            .allow_credentials(true)
    };

    // `Any` headers cannot be combined with credentials; mirror instead.
    match (any_header, any_origin) {
        (true, true) => layer.allow_headers(Any),
        (true, false) => layer.allow_headers(AllowHeaders::mirror_request()),
        (false, _) => layer.allow_headers(parse_all::<HeaderName>(&config.allowed_headers, "header")),
    }
}

fn parse_all<T: FromStr>(values: &[String], what: &str) -> Vec<T> {
    values
        .iter()
        .filter_map(|raw| match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(value = %raw, kind = what, "Ignoring unparseable CORS entry");
                None
            }
        })
        .collect()
}
