//! Locating a session token in an incoming request.
//!
//! Lookup order: the session cookie, then an `Authorization: Bearer`
//! header, then (handshake only) a `token` query parameter.

/// Raw header and query values a token may be read from.
#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialSources<'a> {
    /// The full `Cookie` header value.
    pub cookie_header: Option<&'a str>,
    /// The full `Authorization` header value.
    pub authorization: Option<&'a str>,
    /// The `token` query parameter.
    pub query_token: Option<&'a str>,
}

impl<'a> CredentialSources<'a> {
    /// First non-empty token in lookup order.
    pub fn resolve(&self, cookie_name: &str) -> Option<&'a str> {
        self.cookie_header
            .and_then(|header| cookie_value(header, cookie_name))
            .or_else(|| self.authorization.and_then(bearer_token))
            .or_else(|| self.query_token.map(str::trim).filter(|t| !t.is_empty()))
    }
}

/// Value of cookie `name` in a `Cookie` header, if present and non-empty.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        let value = value.trim().trim_matches('"');
        (key.trim() == name && !value.is_empty()).then_some(value)
    })
}

/// Token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
