use std::path::PathBuf;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, SkillError>;

#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("Unsupported source: {0}")]
    InvalidSource(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("{what} not found: {target}")]
    NotFound { what: &'static str, target: String },

    #[error("No skills found in {}", .0.display())]
    NoSkillsFound(PathBuf),

    #[error("Authentication required for {0}")]
    AuthRequired(String),

    #[error("Authentication failed for {domain}: {message}")]
    AuthFailed { domain: String, message: String },

    #[error("Command `{command}` timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },

    #[error("Command `{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("{action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl SkillError {
    pub fn not_found(what: &'static str, target: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            target: target.into(),
        }
    }

    pub fn fs(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Attaches a path and action to raw `std::io` failures.
pub trait IoContext<T> {
    fn fs_context(self, action: &'static str, path: &std::path::Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn fs_context(self, action: &'static str, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| SkillError::fs(action, path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_error_names_path() {
        let err = SkillError::fs(
            "Failed to create",
            "/tmp/x",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.to_string().starts_with("Failed to create /tmp/x"));
    }

    #[test]
    fn not_found_message() {
        let err = SkillError::not_found("Agent", "vim");
        assert_eq!(err.to_string(), "Agent not found: vim");
    }
}
