use crate::error::{IoContext, Result, SkillError};
use crate::traits::CredentialStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CredentialFile {
    tokens: BTreeMap<String, String>,
}

/// Tokens stored in plain JSON under the eskill directory.
///
/// Reads never fail: a missing or unparsable file is an empty set.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CredentialFile {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return CredentialFile::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), "Ignoring unreadable credentials file: {}", e);
            CredentialFile::default()
        })
    }

    fn store(&self, file: &CredentialFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).fs_context("Failed to create", parent)?;
        }
        let content = serde_json::to_string_pretty(file).map_err(|e| SkillError::Config {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, content).fs_context("Failed to write credentials", &self.path)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get_token(&self, domain: &str) -> Option<String> {
        self.load()
            .tokens
            .get(domain)
            .filter(|t| !t.is_empty())
            .cloned()
    }

    fn save_token(&self, domain: &str, token: &str) -> Result<()> {
        let mut file = self.load();
        file.tokens.insert(domain.to_string(), token.to_string());
        self.store(&file)?;
        tracing::info!(domain, "Saved access token");
        Ok(())
    }

    fn remove_token(&self, domain: &str) -> Result<bool> {
        let mut file = self.load();
        if file.tokens.remove(domain).is_none() {
            return Ok(false);
        }
        self.store(&file)?;
        Ok(true)
    }

    fn list_tokens(&self) -> BTreeMap<String, String> {
        self.load()
            .tokens
            .into_iter()
            .map(|(domain, token)| {
                let masked = mask_token(&token);
                (domain, masked)
            })
            .collect()
    }
}

/// Keeps the first and last four characters of long tokens.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}
