//! Result of resolving a bearer token through the introspection authority.

use serde::Deserialize;

/// Introspection answer: `{active, username}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub username: String,
}

impl TokenInfo {
    /// The username this token authenticates, if the token is usable.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        (self.active && !self.username.is_empty()).then_some(self.username.as_str())
    }
}
