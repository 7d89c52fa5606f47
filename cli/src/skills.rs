use crate::prompt::DialoguerPrompter;
use anyhow::{Context as _, Result};
use console::style;
use eskill_core::{
    AgentRegistry, AppPaths, Config, EntryMode, Environment, FileCredentialStore,
    InstallOptions, InstallOutcome, InstallReport, Installer, Inventory, SharedWrite,
    SkillOutcome, SystemRunner,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Process-wide state shared by every command.
pub struct Context {
    pub env: Environment,
    pub paths: AppPaths,
    pub config: Config,
    pub cwd: PathBuf,
    pub credentials: Arc<FileCredentialStore>,
}

impl Context {
    pub fn load() -> Result<Self> {
        let env = Environment::from_process();
        let paths = AppPaths::resolve(&env);
        let config = Config::load_or_default(&paths)?;
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let credentials = Arc::new(FileCredentialStore::new(paths.credentials_file()));
        Ok(Self {
            env,
            paths,
            config,
            cwd,
            credentials,
        })
    }

    fn registry(&self) -> AgentRegistry {
        AgentRegistry::builtin(self.env.clone(), &self.config)
    }

    fn inventory(&self) -> Inventory {
        Inventory::new(self.registry(), &self.paths, &self.cwd)
    }
}

pub async fn install(ctx: &Context, source: &str, options: &InstallOptions) -> Result<()> {
    println!("{} Analyzing {}", style("→").cyan(), style(source).bold());

    let installer = Installer::new(
        Arc::new(SystemRunner::new()),
        ctx.credentials.clone(),
        Arc::new(DialoguerPrompter),
        ctx.registry(),
        ctx.paths.clone(),
        ctx.config.clone(),
        ctx.cwd.clone(),
    );

    let outcome = installer
        .install(source, options)
        .await
        .with_context(|| format!("Failed to install {source}"))?;

    match outcome {
        InstallOutcome::Cancelled => {
            println!("{} Cancelled, nothing installed", style("!").yellow());
            Ok(())
        }
        InstallOutcome::Installed(report) => {
            print_install_report(ctx, &report);
            if report.installed_count() == 0 {
                anyhow::bail!("No skill could be installed from {source}");
            }
            Ok(())
        }
    }
}

fn print_install_report(ctx: &Context, report: &InstallReport) {
    println!();
    for outcome in &report.skills {
        print_skill_outcome(outcome);
    }

    if report.target_agents == 0 {
        println!(
            "{} No agents detected, skills are only in {}",
            style("!").yellow(),
            style(ctx.env.shorten(&report.shared_dir)).cyan()
        );
    }

    println!();
    println!(
        "{} Installed {} skill(s) ({}, {})",
        style("✓").green().bold(),
        report.installed_count(),
        report.scope,
        report.method
    );
}

fn print_skill_outcome(outcome: &SkillOutcome) {
    let skill = &outcome.skill;
    let write = match &outcome.shared {
        Ok(write) => write,
        Err(message) => {
            println!(
                "  {} {} {}",
                style("✗").red().bold(),
                style(&skill.name).white().bold(),
                style(message).dim()
            );
            return;
        }
    };

    let note = match write {
        SharedWrite::KeptExisting => " (exists, links refreshed; use --force to replace)",
        SharedWrite::AlreadyShared => " (already in shared directory)",
        SharedWrite::CopiedAfterLinkFailure => " (symlink failed, copied)",
        SharedWrite::Copied | SharedWrite::Linked => "",
    };
    println!(
        "  {} {} {}{}",
        style("✓").green().bold(),
        style(&skill.name).white().bold(),
        style(format!("v{}", skill.version)).dim(),
        style(note).yellow()
    );

    for agent in &outcome.agents {
        if agent.report.ok() {
            println!("    {} {}", style("→").green(), agent.display_name);
        } else if let Some((path, reason)) = agent.report.failed.first() {
            println!(
                "    {} {} {}",
                style("✗").red(),
                agent.display_name,
                style(format!("{}: {reason}", path.display())).dim()
            );
        }
    }
}

pub fn remove(ctx: &Context, skill: &str, agent: Option<&str>) -> Result<()> {
    let report = ctx
        .inventory()
        .remove(skill, agent)
        .with_context(|| format!("Failed to remove {skill}"))?;

    for (agent, path) in &report.unlinked {
        println!(
            "  {} {} {}",
            style("→").green(),
            agent,
            style(ctx.env.shorten(path)).dim()
        );
    }
    for (path, reason) in &report.failed {
        println!(
            "  {} {} {}",
            style("!").yellow(),
            ctx.env.shorten(path),
            style(reason).dim()
        );
    }

    match (&report.shared, agent) {
        (Some(_), _) => println!(
            "{} Skill '{}' removed",
            style("✓").green().bold(),
            report.name
        ),
        (None, Some(agent)) => println!(
            "{} Skill '{}' unlinked from {}",
            style("✓").green().bold(),
            report.name,
            agent
        ),
        (None, None) => {}
    }

    for path in &report.leftovers {
        println!(
            "{} Symlink left behind: {}",
            style("!").yellow(),
            ctx.env.shorten(path)
        );
    }
    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    let installed = ctx.inventory().list_installed()?;

    if installed.is_empty() {
        println!("{} No skills installed", style("!").yellow());
        println!();
        println!("Install a skill:");
        println!("  eskill install <package | git-url | path>");
        return Ok(());
    }

    println!(
        "{} Installed skills ({})",
        style("✓").green().bold(),
        installed.len()
    );
    println!();

    for skill in installed {
        let version = skill
            .version
            .map(|v| format!("v{v}"))
            .unwrap_or_else(|| "no SKILL.md".to_string());
        match &skill.description {
            Some(description) => println!(
                "  {} {} - {}",
                style(&skill.name).white().bold(),
                style(version).dim(),
                description
            ),
            None => println!(
                "  {} {}",
                style(&skill.name).white().bold(),
                style(version).dim()
            ),
        }

        match &skill.mode {
            EntryMode::Copy => println!("    Mode:   copy"),
            EntryMode::Link { target } => {
                println!("    Mode:   link → {}", ctx.env.shorten(target))
            }
        }

        if skill.linked_agents.is_empty() {
            println!("    Agents: {}", style("none").dim());
        } else {
            println!("    Agents: {}", skill.linked_agents.join(", "));
        }
        println!();
    }

    Ok(())
}

pub fn agents(ctx: &Context) -> Result<()> {
    let overview = ctx.inventory().list_agents();

    let status = if overview.shared_exists {
        style("ready").green()
    } else {
        style("not created yet").dim()
    };
    println!(
        "Shared directory: {} ({})",
        style(ctx.env.shorten(&overview.shared_dir)).cyan(),
        status
    );
    println!();

    for status in &overview.agents {
        let agent = &status.agent;
        let mut header = format!("  {:<12} {}", agent.id, agent.display_name);
        if !agent.enabled {
            header.push_str(" (disabled)");
        }
        if agent.prefer_copy {
            header.push_str(" (copy)");
        }
        println!("{}", style(header).bold());

        for (dir, exists) in &status.dirs {
            let path = ctx.env.shorten(dir);
            if *exists {
                println!("    {} {}", style("✓").green(), path);
            } else {
                println!("    {} {}", style("·").dim(), style(path).dim());
            }
        }
    }

    Ok(())
}
