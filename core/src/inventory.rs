//! Listing and removal of installed skills.

use crate::agents::{AgentRegistry, AgentTarget, ResolvedAgent};
use crate::config::AppPaths;
use crate::error::{Result, SkillError};
use crate::install::ALL_AGENTS;
use crate::linker::{Linker, is_symlink};
use crate::skills::{EntryMode, SharedStore, strip_scope};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct InstalledSkill {
    pub name: String,
    pub path: PathBuf,
    /// `None` when the entry has no readable manifest.
    pub version: Option<String>,
    pub description: Option<String>,
    pub mode: EntryMode,
    pub linked_agents: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct AgentStatus {
    pub agent: AgentTarget,
    /// Each resolved directory and whether it exists.
    pub dirs: Vec<(PathBuf, bool)>,
}

#[derive(Debug, Clone)]
pub struct AgentsOverview {
    pub agents: Vec<AgentStatus>,
    pub shared_dir: PathBuf,
    pub shared_exists: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveReport {
    pub name: String,
    /// Mode of the deleted shared entry; `None` when it was kept.
    pub shared: Option<EntryMode>,
    pub unlinked: Vec<(&'static str, PathBuf)>,
    pub failed: Vec<(PathBuf, String)>,
    /// Symlinks still pointing at the removed entry.
    pub leftovers: Vec<PathBuf>,
}

pub struct Inventory {
    agents: AgentRegistry,
    store: SharedStore,
    cwd: PathBuf,
}

impl Inventory {
    pub fn new(agents: AgentRegistry, paths: &AppPaths, cwd: impl Into<PathBuf>) -> Self {
        Self {
            agents,
            store: SharedStore::new(paths.skills_dir()),
            cwd: cwd.into(),
        }
    }

    pub fn shared_dir(&self) -> &Path {
        self.store.root()
    }

    pub fn list_installed(&self) -> Result<Vec<InstalledSkill>> {
        let linker = Linker::new(&self.store);
        let resolved = self.agents.resolve_all(&self.cwd);

        let skills = self
            .store
            .entries()?
            .into_iter()
            .map(|entry| {
                let linked_agents = resolved
                    .iter()
                    .filter(|agent| linker.is_linked(&entry.name, agent))
                    .map(|agent| agent.agent.display_name)
                    .collect();
                let (version, description) = match entry.skill {
                    Some(skill) => (Some(skill.version), skill.description),
                    None => (None, None),
                };
                InstalledSkill {
                    name: entry.name,
                    path: entry.path,
                    version,
                    description,
                    mode: entry.mode,
                    linked_agents,
                }
            })
            .collect();
        Ok(skills)
    }

    pub fn list_agents(&self) -> AgentsOverview {
        let agents = self
            .agents
            .list()
            .iter()
            .map(|agent| AgentStatus {
                agent: *agent,
                dirs: agent
                    .resolve_directories(&self.cwd, self.agents.env())
                    .into_iter()
                    .map(|dir| {
                        let exists = dir.exists();
                        (dir, exists)
                    })
                    .collect(),
            })
            .collect();
        AgentsOverview {
            agents,
            shared_dir: self.store.root().to_path_buf(),
            shared_exists: self.store.root().is_dir(),
        }
    }

    /// Unlinks `name` from one agent, or from every agent and then deletes
    /// the shared entry.
    pub fn remove(&self, name: &str, agent: Option<&str>) -> Result<RemoveReport> {
        let name = strip_scope(name.trim());
        if !self.store.contains(name) {
            return Err(SkillError::not_found("Skill", name));
        }

        let agent = agent.map(str::trim).filter(|a| !a.is_empty() && *a != ALL_AGENTS);
        let targets: Vec<ResolvedAgent> = match agent {
            Some(id) => {
                let target = self
                    .agents
                    .get(id)
                    .ok_or_else(|| SkillError::not_found("Agent", id))?;
                vec![self.agents.resolve(target, &self.cwd)]
            }
            None => self.agents.resolve_all(&self.cwd),
        };

        let linker = Linker::new(&self.store);
        let mut report = RemoveReport {
            name: name.to_string(),
            ..Default::default()
        };

        for target in &targets {
            let result = linker.unpublish(name, target);
            for path in result.succeeded {
                tracing::info!(skill = name, agent = target.agent.id, path = %path.display(), "Unlinked");
                report.unlinked.push((target.agent.display_name, path));
            }
            report.failed.extend(result.failed);
        }

        if agent.is_none() {
            report.shared = Some(self.store.remove(name)?);
            report.leftovers = self.leftover_links(name);
            for path in &report.leftovers {
                tracing::warn!(skill = name, path = %path.display(), "Symlink left behind");
            }
        }

        Ok(report)
    }

    /// Symlinks named `name` in any agent directory, disabled agents included.
    fn leftover_links(&self, name: &str) -> Vec<PathBuf> {
        self.agents
            .list()
            .iter()
            .flat_map(|agent| agent.resolve_directories(&self.cwd, self.agents.env()))
            .map(|dir| dir.join(name))
            .filter(|path| is_symlink(path))
            .collect()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use crate::install::Method;
    use crate::skills::load_skill;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        home: PathBuf,
        inventory: Inventory,
    }

    impl Fixture {
        fn new(config: Config) -> Self {
            let tmp = TempDir::new().unwrap();
            let home = tmp.path().join("home");
            let cwd = tmp.path().join("project");
            fs::create_dir_all(&cwd).unwrap();
            let registry = AgentRegistry::builtin(Environment::new(&home), &config);
            let paths = AppPaths::new(tmp.path().join("app"));
            let inventory = Inventory::new(registry, &paths, &cwd);
            Self {
                tmp,
                home,
                inventory,
            }
        }

        /// Installs `name` into the shared dir and links it to `agents`.
        fn install(&self, name: &str, agents: &[&str]) {
            let src = self.tmp.path().join("src").join(name);
            fs::create_dir_all(&src).unwrap();
            fs::write(src.join("SKILL.md"), "---\ndescription: Test\nversion: 2.0.0\n---\n")
                .unwrap();
            let store = &self.inventory.store;
            store
                .materialize(&load_skill(&src).unwrap(), Method::Copy, false)
                .unwrap();
            let linker = Linker::new(store);
            for id in agents {
                let registry = &self.inventory.agents;
                let resolved = registry.resolve(registry.get(id).unwrap(), &self.inventory.cwd);
                assert!(linker.publish(name, &resolved, resolved.agent.prefer_copy).ok());
            }
        }
    }

    #[test]
    fn lists_entries_with_linked_agents() {
        let fx = Fixture::new(Config::default());
        fx.install("alpha", &["cursor", "claude"]);
        fx.install("beta", &[]);

        let installed = fx.inventory.list_installed().unwrap();
        assert_eq!(installed.len(), 2);
        assert_eq!(installed[0].name, "alpha");
        assert_eq!(installed[0].version.as_deref(), Some("2.0.0"));
        assert_eq!(installed[0].description.as_deref(), Some("Test"));
        assert_eq!(installed[0].mode, EntryMode::Copy);
        assert_eq!(installed[0].linked_agents, vec!["Claude Code", "Cursor"]);
        assert!(installed[1].linked_agents.is_empty());
    }

    #[test]
    fn remove_from_one_agent_keeps_the_rest() {
        let fx = Fixture::new(Config::default());
        fx.install("alpha", &["cursor", "claude"]);

        let report = fx.inventory.remove("alpha", Some("cursor")).unwrap();
        assert_eq!(report.unlinked.len(), 1);
        assert!(report.shared.is_none());
        assert!(!fx.home.join(".cursor/skills/alpha").exists());
        assert!(is_symlink(&fx.home.join(".claude/skills/alpha")));
        assert!(fx.inventory.shared_dir().join("alpha").exists());

        let installed = fx.inventory.list_installed().unwrap();
        assert_eq!(installed[0].linked_agents, vec!["Claude Code"]);
    }

    #[test]
    fn remove_leaves_hand_written_agent_skills_alone() {
        let fx = Fixture::new(Config::default());
        fx.install("alpha", &["cursor"]);
        let own = fx.home.join(".claude/skills/alpha");
        fs::create_dir_all(&own).unwrap();
        fs::write(own.join("SKILL.md"), "---\ndescription: Mine\n---\n").unwrap();
        fs::write(own.join("notes.md"), "keep").unwrap();

        let installed = fx.inventory.list_installed().unwrap();
        assert_eq!(installed[0].linked_agents, vec!["Cursor"]);

        let report = fx.inventory.remove("alpha", Some("claude")).unwrap();
        assert!(report.unlinked.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, own);

        let report = fx.inventory.remove("alpha", None).unwrap();
        assert_eq!(report.unlinked.len(), 1);
        assert_eq!(fs::read_to_string(own.join("notes.md")).unwrap(), "keep");
    }

    #[test]
    fn full_remove_deletes_links_and_entry() {
        let fx = Fixture::new(Config {
            copy_agents: vec!["trae".into()],
            ..Default::default()
        });
        fx.install("alpha", &["cursor", "trae"]);

        let report = fx.inventory.remove("@org/alpha", None).unwrap();
        assert_eq!(report.name, "alpha");
        assert_eq!(report.shared, Some(EntryMode::Copy));
        assert_eq!(report.unlinked.len(), 2);
        assert!(report.leftovers.is_empty());
        assert!(fs::symlink_metadata(fx.home.join(".cursor/skills/alpha")).is_err());
        assert!(!fx.home.join(".trae/skills/alpha").exists());
        assert!(fx.inventory.list_installed().unwrap().is_empty());
    }

    #[test]
    fn disabled_agent_links_are_reported_as_leftovers() {
        let fx = Fixture::new(Config::default());
        fx.install("alpha", &["roo"]);
        let disabled = Fixture {
            inventory: Inventory::new(
                AgentRegistry::builtin(
                    Environment::new(&fx.home),
                    &Config {
                        disabled_agents: vec!["roo".into()],
                        ..Default::default()
                    },
                ),
                &AppPaths::new(fx.tmp.path().join("app")),
                fx.tmp.path().join("project"),
            ),
            ..fx
        };

        let report = disabled.inventory.remove("alpha", None).unwrap();
        assert_eq!(report.leftovers, vec![disabled.home.join(".roo/skills/alpha")]);
    }

    #[test]
    fn unknown_names_are_not_found() {
        let fx = Fixture::new(Config::default());
        assert!(matches!(
            fx.inventory.remove("ghost", None),
            Err(SkillError::NotFound { what: "Skill", .. })
        ));

        fx.install("alpha", &[]);
        assert!(matches!(
            fx.inventory.remove("alpha", Some("vim")),
            Err(SkillError::NotFound { what: "Agent", .. })
        ));
    }

    #[test]
    fn agents_overview_reports_directories() {
        let fx = Fixture::new(Config::default());
        fs::create_dir_all(fx.home.join(".cursor/skills")).unwrap();

        let overview = fx.inventory.list_agents();
        assert_eq!(overview.agents.len(), crate::agents::BUILTIN_AGENTS.len());
        assert!(!overview.shared_exists);
        let cursor = overview
            .agents
            .iter()
            .find(|a| a.agent.id == "cursor")
            .unwrap();
        assert_eq!(cursor.dirs, vec![(fx.home.join(".cursor/skills"), true)]);
        let gemini = overview
            .agents
            .iter()
            .find(|a| a.agent.id == "gemini")
            .unwrap();
        assert!(!gemini.dirs[0].1);
    }
}
