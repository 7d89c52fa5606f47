//! Catalog of coding agents and where each one reads skills from.

pub mod catalog;

use crate::config::{Config, Environment};
use std::path::{Path, PathBuf};

pub use catalog::BUILTIN_AGENTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Home,
    /// `$XDG_CONFIG_HOME`, or `~/.config`.
    ConfigHome,
    /// The current working directory.
    Project,
}

/// One way an agent locates a skills directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirRule {
    Under(Base, &'static [&'static str]),
    /// `$var/<tail>` when set, otherwise `~/<fallback>/<tail>`.
    EnvOverride {
        var: &'static str,
        fallback: &'static [&'static str],
        tail: &'static [&'static str],
    },
    /// `~/<marker>/<tail>` for the first marker directory that exists,
    /// defaulting to the first marker.
    FirstExisting {
        markers: &'static [&'static str],
        tail: &'static [&'static str],
    },
}

impl DirRule {
    pub fn resolve(&self, cwd: &Path, env: &Environment) -> PathBuf {
        match self {
            DirRule::Under(base, parts) => {
                let root = match base {
                    Base::Home => env.home.clone(),
                    Base::ConfigHome => env.config_home.clone(),
                    Base::Project => cwd.to_path_buf(),
                };
                join_all(root, parts)
            }
            DirRule::EnvOverride {
                var,
                fallback,
                tail,
            } => {
                let root = match env.var(var) {
                    Some(dir) => PathBuf::from(dir),
                    None => join_all(env.home.clone(), fallback),
                };
                join_all(root, tail)
            }
            DirRule::FirstExisting { markers, tail } => {
                let chosen = markers
                    .iter()
                    .find(|m| env.home.join(m).exists())
                    .or(markers.first())
                    .copied()
                    .unwrap_or_default();
                join_all(env.home.join(chosen), tail)
            }
        }
    }
}

fn join_all(root: PathBuf, parts: &[&str]) -> PathBuf {
    parts.iter().fold(root, |acc, p| acc.join(p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentTarget {
    pub id: &'static str,
    pub display_name: &'static str,
    pub rules: &'static [DirRule],
    pub enabled: bool,
    /// The agent cannot follow symlinks and needs full copies.
    pub prefer_copy: bool,
}

impl AgentTarget {
    pub fn resolve_directories(&self, cwd: &Path, env: &Environment) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::with_capacity(self.rules.len());
        for rule in self.rules {
            let dir = rule.resolve(cwd, env);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }
}

/// An agent together with its directories for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAgent {
    pub agent: AgentTarget,
    pub dirs: Vec<PathBuf>,
}

impl ResolvedAgent {
    pub fn skill_paths(&self, skill: &str) -> Vec<PathBuf> {
        self.dirs.iter().map(|d| d.join(skill)).collect()
    }

    /// Any skills directory, or its parent, already on disk.
    pub fn is_installed(&self) -> bool {
        self.dirs
            .iter()
            .any(|d| d.exists() || d.parent().is_some_and(Path::exists))
    }
}

#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentTarget>,
    env: Environment,
}

impl AgentRegistry {
    pub fn new(agents: Vec<AgentTarget>, env: Environment) -> Self {
        Self { agents, env }
    }

    /// Built-in catalog with `copy_agents` / `disabled_agents` applied.
    pub fn builtin(env: Environment, config: &Config) -> Self {
        let agents = BUILTIN_AGENTS
            .iter()
            .map(|agent| {
                let mut agent = *agent;
                if config.copy_agents.iter().any(|id| id == agent.id) {
                    agent.prefer_copy = true;
                }
                if config.disabled_agents.iter().any(|id| id == agent.id) {
                    agent.enabled = false;
                }
                agent
            })
            .collect();
        Self::new(agents, env)
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn list(&self) -> &[AgentTarget] {
        &self.agents
    }

    pub fn enabled(&self) -> impl Iterator<Item = &AgentTarget> {
        self.agents.iter().filter(|a| a.enabled)
    }

    /// Looks up an enabled agent by id.
    pub fn get(&self, id: &str) -> Option<&AgentTarget> {
        self.enabled().find(|a| a.id == id)
    }

    pub fn resolve(&self, agent: &AgentTarget, cwd: &Path) -> ResolvedAgent {
        ResolvedAgent {
            agent: *agent,
            dirs: agent.resolve_directories(cwd, &self.env),
        }
    }

    pub fn resolve_all(&self, cwd: &Path) -> Vec<ResolvedAgent> {
        self.enabled().map(|a| self.resolve(a, cwd)).collect()
    }

    pub fn detect_installed(&self, cwd: &Path) -> Vec<ResolvedAgent> {
        self.resolve_all(cwd)
            .into_iter()
            .filter(ResolvedAgent::is_installed)
            .collect()
    }
}

/// Local scope: keeps only directories under `cwd`, dropping agents left
/// with none.
pub fn restrict_to_project(agents: Vec<ResolvedAgent>, cwd: &Path) -> Vec<ResolvedAgent> {
    agents
        .into_iter()
        .filter_map(|mut resolved| {
            resolved.dirs.retain(|d| d.starts_with(cwd));
            (!resolved.dirs.is_empty()).then_some(resolved)
        })
        .collect()
}
