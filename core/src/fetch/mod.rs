//! Brings a source onto local disk so it can be scanned.

mod git;
mod npm;

pub use npm::{DEFAULT_REGISTRY, registry_from_npmrc};

use crate::config::{Config, Environment};
use crate::error::{IoContext, Result, SkillError};
use crate::install::InstallOptions;
use crate::source::{self, SourceKind};
use crate::traits::{CommandSpec, CredentialStore, ProcessRunner, Prompter, RunError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A directory ready for scanning. Temporary staging is deleted on drop.
#[derive(Debug)]
pub struct Staged {
    pub dir: PathBuf,
    _temp: Option<TempDir>,
}

impl Staged {
    pub fn local(dir: PathBuf) -> Self {
        Self { dir, _temp: None }
    }

    fn temporary(dir: PathBuf, temp: TempDir) -> Self {
        Self {
            dir,
            _temp: Some(temp),
        }
    }

    /// True when the content lives in a directory that goes away with
    /// this value, so it must be copied rather than linked.
    pub fn is_temporary(&self) -> bool {
        self._temp.is_some()
    }
}

pub struct Fetcher {
    runner: Arc<dyn ProcessRunner>,
    credentials: Arc<dyn CredentialStore>,
    prompter: Arc<dyn Prompter>,
    env: Environment,
    cwd: PathBuf,
}

impl Fetcher {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        credentials: Arc<dyn CredentialStore>,
        prompter: Arc<dyn Prompter>,
        env: Environment,
        cwd: PathBuf,
    ) -> Self {
        Self {
            runner,
            credentials,
            prompter,
            env,
            cwd,
        }
    }

    pub async fn fetch(
        &self,
        input: &str,
        kind: SourceKind,
        options: &InstallOptions,
        config: &Config,
    ) -> Result<Staged> {
        match kind {
            SourceKind::GitUrl => {
                let info = source::parse_git_url(input)
                    .ok_or_else(|| SkillError::InvalidSource(input.to_string()))?;
                let timeout = options.timeout_override().unwrap_or(config.git_timeout());
                self.clone_repo(&info, timeout).await
            }
            SourceKind::LocalPath => self.local(input),
            SourceKind::RegistryPackage => {
                let timeout = options.timeout_override().unwrap_or(config.npm_timeout());
                let registry = options.registry.as_deref().or(config.registry.as_deref());
                self.install_package(input, registry, timeout).await
            }
        }
    }

    fn local(&self, input: &str) -> Result<Staged> {
        let path = source::resolve_local(input, &self.cwd);
        if !path.exists() {
            return Err(SkillError::not_found("Path", path.display().to_string()));
        }
        let path = path.canonicalize().fs_context("Failed to resolve", &path)?;
        Ok(Staged::local(path))
    }

    /// Stored token first, then the `ESKILL_TOKEN_*` variable.
    fn lookup_token(&self, domain: &str) -> Option<String> {
        self.credentials
            .get_token(domain)
            .or_else(|| self.env.var(&source::token_env_var(domain)).map(str::to_string))
    }

    async fn run(&self, command: &CommandSpec, timeout: Duration) -> Result<String> {
        match self.runner.run(command, timeout).await {
            Ok(output) => Ok(output.stdout),
            Err(RunError::Timeout(after)) => Err(SkillError::Timeout {
                command: command.to_string(),
                after,
            }),
            Err(e) => Err(SkillError::CommandFailed {
                command: command.to_string(),
                message: command.redact(e.to_string().trim()),
            }),
        }
    }
}

fn staging_dir(prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .fs_context("Failed to create temporary directory", Path::new(prefix))
}
