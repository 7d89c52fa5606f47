use crate::config::Config;
use crate::error::{Result, SkillError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// `--agent all` and no `--agent` both mean every detected agent.
pub const ALL_AGENTS: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every directory of every detected agent.
    Global,
    /// Only directories inside the current project.
    Local,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Local => write!(f, "local"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// The shared entry is a symlink to the source (development mode).
    Link,
    Copy,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Link => write!(f, "link"),
            Method::Copy => write!(f, "copy"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub agent: Option<String>,
    pub link: bool,
    pub copy: bool,
    pub global: bool,
    pub local: bool,
    /// Install every discovered skill without asking.
    pub all: bool,
    pub force: bool,
    pub registry: Option<String>,
    /// Per-command timeout in milliseconds.
    pub timeout: Option<u64>,
}

impl InstallOptions {
    pub fn validate(&self) -> Result<()> {
        if self.link && self.copy {
            return Err(SkillError::InvalidOptions(
                "--link and --copy cannot be used together".into(),
            ));
        }
        if self.global && self.local {
            return Err(SkillError::InvalidOptions(
                "--global and --local cannot be used together".into(),
            ));
        }
        if self.timeout == Some(0) {
            return Err(SkillError::InvalidOptions("--timeout must be positive".into()));
        }
        if let Some(registry) = &self.registry
            && url::Url::parse(registry).is_err()
        {
            return Err(SkillError::InvalidOptions(format!(
                "--registry is not a valid URL: {registry}"
            )));
        }
        Ok(())
    }

    /// A specific agent id, or `None` for all of them.
    pub fn agent_filter(&self) -> Option<&str> {
        self.agent
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty() && *a != ALL_AGENTS)
    }

    /// Scope decided without asking: flags first, then configuration.
    pub fn fixed_scope(&self, config: &Config) -> Option<Scope> {
        if self.global {
            Some(Scope::Global)
        } else if self.local {
            Some(Scope::Local)
        } else {
            config.default_scope
        }
    }

    pub fn fixed_method(&self, config: &Config) -> Option<Method> {
        if self.link {
            Some(Method::Link)
        } else if self.copy {
            Some(Method::Copy)
        } else {
            config.default_method
        }
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }
}
