use crate::error::Result;
use std::collections::BTreeMap;

/// Per-domain access tokens used when cloning private repositories.
pub trait CredentialStore: Send + Sync {
    fn get_token(&self, domain: &str) -> Option<String>;

    fn save_token(&self, domain: &str, token: &str) -> Result<()>;

    /// Returns `false` when no token was stored for `domain`.
    fn remove_token(&self, domain: &str) -> Result<bool>;

    /// Domain to masked token.
    fn list_tokens(&self) -> BTreeMap<String, String>;
}
