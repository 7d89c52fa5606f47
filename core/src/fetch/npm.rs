use super::{Fetcher, Staged, staging_dir};
use crate::error::{Result, SkillError};
use crate::source;
use crate::traits::CommandSpec;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

const NPMRC: &str = ".npmrc";
const CONFIG_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

impl Fetcher {
    /// Installs `spec` with npm into a temporary prefix and stages the
    /// package directory.
    pub(super) async fn install_package(
        &self,
        spec: &str,
        registry: Option<&str>,
        timeout: Duration,
    ) -> Result<Staged> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(SkillError::InvalidSource(spec.to_string()));
        }

        let registry = match registry {
            Some(r) => r.to_string(),
            None => self.resolve_registry().await,
        };
        tracing::info!(package = spec, registry = %registry, "Installing from registry");

        let temp = staging_dir("eskill-npm-")?;
        let command = install_command(spec, &registry, temp.path(), &self.env.home);
        self.run(&command, timeout).await?;

        let name = source::package_name(spec);
        let staged = temp.path().join("node_modules").join(name);
        if !staged.is_dir() {
            return Err(SkillError::not_found("Package", name.to_string()));
        }
        Ok(Staged::temporary(staged, temp))
    }

    /// Nearest `.npmrc`, then `npm config get registry`, then the public
    /// registry.
    async fn resolve_registry(&self) -> String {
        if let Some(registry) = registry_from_npmrc(&self.cwd) {
            tracing::debug!(registry = %registry, "Registry from .npmrc");
            return registry;
        }

        let query = CommandSpec::new("npm").args(["config", "get", "registry"]);
        match self.run(&query, CONFIG_QUERY_TIMEOUT).await {
            Ok(stdout) => {
                let value = stdout.trim();
                if !value.is_empty() && value != "undefined" {
                    return value.to_string();
                }
            }
            Err(e) => tracing::debug!("npm config lookup failed: {}", e),
        }
        DEFAULT_REGISTRY.to_string()
    }
}

fn install_command(spec: &str, registry: &str, prefix: &Path, home: &Path) -> CommandSpec {
    CommandSpec::new("npm")
        .args(["install", spec, "--prefix"])
        .arg(prefix.to_string_lossy())
        .arg(format!("--registry={registry}"))
        .args([
            "--no-save",
            "--silent",
            "--no-bin-links",
            "--prefer-offline",
        ])
        .env("npm_config_cache", home.join(".npm").to_string_lossy())
        .env("npm_config_prefix", home.join(".npm-global").to_string_lossy())
        .env("npm_config_global", "false")
}

/// Registry from the nearest `.npmrc` at or above `start`. Only the nearest
/// file is consulted; its first `registry=` or `@scope:registry=` line wins.
pub fn registry_from_npmrc(start: &Path) -> Option<String> {
    let npmrc = find_npmrc(start)?;
    let content = fs::read_to_string(&npmrc).ok()?;
    content.lines().find_map(parse_registry_line)
}

fn find_npmrc(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(NPMRC))
        .find(|candidate| candidate.is_file())
}

fn parse_registry_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.starts_with('#') || line.starts_with(';') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let is_registry = key == "registry"
        || key
            .strip_prefix('@')
            .and_then(|k| k.split_once(':'))
            .is_some_and(|(_, rest)| rest == "registry");
    let value = value.trim();
    (is_registry && !value.is_empty()).then(|| value.to_string())
}
