//! Install orchestration: fetch, scan, select, publish.

mod flow;
mod options;

pub use flow::{Event, State, Steps, next_state};
pub use options::{ALL_AGENTS, InstallOptions, Method, Scope};

use crate::agents::{AgentRegistry, ResolvedAgent, restrict_to_project};
use crate::config::{AppPaths, Config};
use crate::error::{Result, SkillError};
use crate::fetch::{Fetcher, Staged};
use crate::linker::{LinkReport, Linker};
use crate::skills::{SharedStore, SharedWrite, Skill, scan};
use crate::source::{self, SourceKind};
use crate::traits::{Answer, CredentialStore, ProcessRunner, Prompter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub agent_id: &'static str,
    pub display_name: &'static str,
    pub report: LinkReport,
}

#[derive(Debug, Clone)]
pub struct SkillOutcome {
    pub skill: Skill,
    /// `Err` carries the message when the shared entry could not be written.
    pub shared: std::result::Result<SharedWrite, String>,
    pub agents: Vec<AgentOutcome>,
}

impl SkillOutcome {
    pub fn installed(&self) -> bool {
        self.shared.is_ok()
    }

    pub fn agents_succeeded(&self) -> usize {
        self.agents.iter().filter(|a| a.report.ok()).count()
    }
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub scope: Scope,
    pub method: Method,
    pub shared_dir: PathBuf,
    pub target_agents: usize,
    pub skills: Vec<SkillOutcome>,
}

impl InstallReport {
    pub fn installed_count(&self) -> usize {
        self.skills.iter().filter(|s| s.installed()).count()
    }
}

#[derive(Debug)]
pub enum InstallOutcome {
    Installed(InstallReport),
    Cancelled,
}

pub struct Installer {
    prompter: Arc<dyn Prompter>,
    fetcher: Fetcher,
    agents: AgentRegistry,
    paths: AppPaths,
    config: Config,
    cwd: PathBuf,
}

/// Choices made during the selection stages.
#[derive(Default)]
struct Selection {
    skills: Vec<usize>,
    scope: Option<Scope>,
    method: Option<Method>,
}

impl Installer {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        credentials: Arc<dyn CredentialStore>,
        prompter: Arc<dyn Prompter>,
        agents: AgentRegistry,
        paths: AppPaths,
        config: Config,
        cwd: PathBuf,
    ) -> Self {
        let fetcher = Fetcher::new(
            runner,
            credentials,
            prompter.clone(),
            agents.env().clone(),
            cwd.clone(),
        );
        Self {
            prompter,
            fetcher,
            agents,
            paths,
            config,
            cwd,
        }
    }

    pub async fn install(&self, input: &str, options: &InstallOptions) -> Result<InstallOutcome> {
        options.validate()?;
        if let Some(id) = options.agent_filter()
            && self.agents.get(id).is_none()
        {
            return Err(SkillError::not_found("Agent", id));
        }

        let scope_fixed = options.fixed_scope(&self.config);
        let method_fixed = options.fixed_method(&self.config);

        let mut state = State::Identifying;
        let mut steps = Steps::default();
        let mut kind = SourceKind::LocalPath;
        let mut staged: Option<Staged> = None;
        let mut found: Vec<Skill> = Vec::new();
        let mut selection = Selection::default();
        let mut report: Option<InstallReport> = None;
        let mut failure: Option<SkillError> = None;

        loop {
            let event = match state {
                State::Identifying => {
                    kind = source::classify(input, &self.cwd);
                    if kind == SourceKind::RegistryPackage && options.link {
                        // --link only makes sense for a path on disk
                        kind = SourceKind::LocalPath;
                    }
                    tracing::info!(source = input, kind = ?kind, "Identified source");
                    Event::Proceed
                }
                State::Fetching => match self.fetcher.fetch(input, kind, options, &self.config).await {
                    Ok(dir) => {
                        staged = Some(dir);
                        Event::Proceed
                    }
                    Err(e) => fail(&mut failure, e),
                },
                State::Scanning => {
                    let dir = staged.as_ref().map(|s| s.dir.clone()).unwrap_or_default();
                    match scan(&dir) {
                        Ok(skills) if skills.is_empty() => {
                            fail(&mut failure, SkillError::NoSkillsFound(dir))
                        }
                        Ok(skills) => {
                            found = skills;
                            tracing::info!(count = found.len(), "Found skills");
                            steps = Steps {
                                skills: !options.all && found.len() > 1,
                                scope: scope_fixed.is_none(),
                                method: method_fixed.is_none(),
                            };
                            Event::Proceed
                        }
                        Err(e) => fail(&mut failure, e),
                    }
                }
                State::SelectingSkills => {
                    if steps.skills {
                        match self.prompter.select_skills(&found) {
                            Answer::Value(picked) if picked.is_empty() => {
                                tracing::info!("No skills selected");
                                Event::Cancel
                            }
                            Answer::Value(picked) => {
                                selection.skills =
                                    picked.into_iter().filter(|i| *i < found.len()).collect();
                                Event::Proceed
                            }
                            Answer::Back => Event::Back,
                            Answer::Cancel => Event::Cancel,
                        }
                    } else {
                        selection.skills = (0..found.len()).collect();
                        Event::Proceed
                    }
                }
                State::SelectingScope => match scope_fixed {
                    Some(scope) => {
                        selection.scope = Some(scope);
                        Event::Proceed
                    }
                    None => answer_into(
                        self.prompter.select_scope(Scope::Global),
                        &mut selection.scope,
                    ),
                },
                State::SelectingMethod => match method_fixed {
                    Some(method) => {
                        selection.method = Some(method);
                        Event::Proceed
                    }
                    None => answer_into(
                        self.prompter.select_method(Method::Link),
                        &mut selection.method,
                    ),
                },
                State::Publishing => match staged.as_ref() {
                    Some(staged) => {
                        let chosen: Vec<&Skill> =
                            selection.skills.iter().map(|i| &found[*i]).collect();
                        report = Some(self.publish(
                            &chosen,
                            staged,
                            selection.scope.unwrap_or(Scope::Global),
                            selection.method.unwrap_or(Method::Link),
                            options,
                        ));
                        Event::Proceed
                    }
                    None => fail(&mut failure, SkillError::InvalidSource(input.to_string())),
                },
                State::Done => {
                    return report
                        .take()
                        .map(InstallOutcome::Installed)
                        .ok_or_else(|| SkillError::InvalidSource(input.to_string()));
                }
                State::Cancelled => return Ok(InstallOutcome::Cancelled),
                State::Failed => {
                    return Err(failure
                        .take()
                        .unwrap_or_else(|| SkillError::InvalidSource(input.to_string())));
                }
            };
            state = next_state(state, event, steps);
        }
    }

    fn targets(&self, options: &InstallOptions, scope: Scope) -> Vec<ResolvedAgent> {
        let targets = match options.agent_filter().and_then(|id| self.agents.get(id)) {
            Some(agent) => vec![self.agents.resolve(agent, &self.cwd)],
            None => self.agents.detect_installed(&self.cwd),
        };
        match scope {
            Scope::Global => targets,
            Scope::Local => restrict_to_project(targets, &self.cwd),
        }
    }

    fn publish(
        &self,
        skills: &[&Skill],
        staged: &Staged,
        scope: Scope,
        method: Method,
        options: &InstallOptions,
    ) -> InstallReport {
        let store = SharedStore::new(self.paths.skills_dir());
        let linker = Linker::new(&store);
        let targets = self.targets(options, scope);
        if targets.is_empty() {
            tracing::warn!(scope = %scope, "No agents detected, installing to the shared directory only");
        }

        let shared_method = if staged.is_temporary() {
            Method::Copy
        } else {
            method
        };

        let mut outcomes = Vec::with_capacity(skills.len());
        for skill in skills {
            tracing::info!(skill = %skill.name, "Installing");
            let shared = store
                .materialize(skill, shared_method, options.force)
                .map_err(|e| {
                    tracing::warn!(skill = %skill.name, "Shared write failed: {}", e);
                    e.to_string()
                });

            let agents = if shared.is_ok() {
                targets
                    .iter()
                    .map(|target| {
                        let use_copy = method == Method::Copy || target.agent.prefer_copy;
                        AgentOutcome {
                            agent_id: target.agent.id,
                            display_name: target.agent.display_name,
                            report: linker.publish(&skill.name, target, use_copy),
                        }
                    })
                    .collect()
            } else {
                Vec::new()
            };

            outcomes.push(SkillOutcome {
                skill: (*skill).clone(),
                shared,
                agents,
            });
        }

        InstallReport {
            scope,
            method,
            shared_dir: store.root().to_path_buf(),
            target_agents: targets.len(),
            skills: outcomes,
        }
    }
}

fn fail(slot: &mut Option<SkillError>, error: SkillError) -> Event {
    tracing::debug!("Install failed: {}", error);
    *slot = Some(error);
    Event::Fail
}

fn answer_into<T>(answer: Answer<T>, slot: &mut Option<T>) -> Event {
    match answer {
        Answer::Value(v) => {
            *slot = Some(v);
            Event::Proceed
        }
        Answer::Back => Event::Back,
        Answer::Cancel => Event::Cancel,
    }
}
