use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

pub const USER_HEADER: &str = "user";

/// Caller identity taken verbatim from the `user` header. No header, or an
/// empty one, means an anonymous caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User(pub Option<String>);

impl User {
    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for User {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let name = parts
            .headers
            .get(USER_HEADER)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .filter(|name| !name.is_empty());
        Ok(User(name))
    }
}
