use crate::error::{Result, SkillError};
use crate::install::{Method, Scope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ESKILL_DIR: &str = ".eskill";
const ESKILL_HOME_VAR: &str = "ESKILL_HOME";

pub const DEFAULT_GIT_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_NPM_TIMEOUT_MS: u64 = 180_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub default_scope: Option<Scope>,
    pub default_method: Option<Method>,
    pub git_timeout_ms: u64,
    pub npm_timeout_ms: u64,
    pub registry: Option<String>,
    /// Agents that must receive full copies instead of symlinks.
    pub copy_agents: Vec<String>,
    pub disabled_agents: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_scope: None,
            default_method: None,
            git_timeout_ms: DEFAULT_GIT_TIMEOUT_MS,
            npm_timeout_ms: DEFAULT_NPM_TIMEOUT_MS,
            registry: None,
            copy_agents: Vec::new(),
            disabled_agents: Vec::new(),
        }
    }
}

impl Config {
    pub fn git_timeout(&self) -> Duration {
        Duration::from_millis(self.git_timeout_ms)
    }

    pub fn npm_timeout(&self) -> Duration {
        Duration::from_millis(self.npm_timeout_ms)
    }

    pub fn load_or_default(paths: &AppPaths) -> Result<Self> {
        let config_path = paths.config_file();
        match std::fs::read_to_string(&config_path) {
            Ok(content) => toml::from_str(&content).map_err(|e| SkillError::Config {
                path: config_path,
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(SkillError::fs("Failed to read config", config_path, e)),
        }
    }
}

/// Snapshot of the process environment that path resolution depends on.
///
/// Everything that reads `HOME`, `XDG_CONFIG_HOME` or agent overrides goes
/// through this value so resolution stays a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct Environment {
    pub home: PathBuf,
    pub config_home: PathBuf,
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            config_home: home.join(".config"),
            home,
            vars: BTreeMap::new(),
        }
    }

    pub fn from_process() -> Self {
        let vars: BTreeMap<String, String> = std::env::vars().collect();
        let home = vars
            .get("HOME")
            .filter(|h| !h.trim().is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut env = Environment::new(home);
        env.vars = vars;
        if let Some(xdg) = env.var("XDG_CONFIG_HOME") {
            env.config_home = PathBuf::from(xdg);
        }
        env
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == "XDG_CONFIG_HOME" {
            self.config_home = PathBuf::from(&value);
        }
        self.vars.insert(key, value);
        self
    }

    /// Returns a variable only when it is set to something non-blank.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn shorten(&self, path: &Path) -> String {
        match path.strip_prefix(&self.home) {
            Ok(rest) if !self.home.as_os_str().is_empty() => {
                format!("~/{}", rest.display())
            }
            _ => path.display().to_string(),
        }
    }
}

/// Locations of eskill's own per-user state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(env: &Environment) -> Self {
        match env.var(ESKILL_HOME_VAR) {
            Some(dir) => Self::new(dir),
            None => Self::new(env.home.join(ESKILL_DIR)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.root.join("skills")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.root.join("credentials.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn app_paths_default_under_home() {
        let env = Environment::new("/home/dev");
        let paths = AppPaths::resolve(&env);
        assert_eq!(paths.skills_dir(), PathBuf::from("/home/dev/.eskill/skills"));
        assert_eq!(
            paths.credentials_file(),
            PathBuf::from("/home/dev/.eskill/credentials.json")
        );
    }

    #[test]
    fn app_paths_honour_override() {
        let env = Environment::new("/home/dev").with_var("ESKILL_HOME", "/opt/eskill");
        assert_eq!(AppPaths::resolve(&env).root(), Path::new("/opt/eskill"));
    }

    #[test]
    fn blank_vars_are_ignored() {
        let env = Environment::new("/home/dev").with_var("CODEX_HOME", "   ");
        assert_eq!(env.var("CODEX_HOME"), None);
    }

    #[test]
    fn xdg_override_moves_config_home() {
        let env = Environment::new("/home/dev").with_var("XDG_CONFIG_HOME", "/xdg");
        assert_eq!(env.config_home, PathBuf::from("/xdg"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let tmp = TempDir::new().unwrap();
        let paths = AppPaths::new(tmp.path().join("app"));

        let config = Config {
            default_method: Some(Method::Copy),
            copy_agents: vec!["trae".to_string()],
            ..Default::default()
        };
        std::fs::create_dir_all(paths.root()).unwrap();
        std::fs::write(paths.config_file(), toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_or_default(&paths).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.git_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn missing_config_is_default() {
        let tmp = TempDir::new().unwrap();
        let paths = AppPaths::new(tmp.path());
        assert_eq!(Config::load_or_default(&paths).unwrap(), Config::default());
    }

    #[test]
    fn broken_config_names_file() {
        let tmp = TempDir::new().unwrap();
        let paths = AppPaths::new(tmp.path());
        std::fs::write(paths.config_file(), "git_timeout_ms = \"soon\"").unwrap();

        let err = Config::load_or_default(&paths).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
