use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{MultiSelect, Password, Select};
use eskill_core::{Answer, Method, Prompter, Scope, Skill};

const NAME_WIDTH: usize = 20;
const DESCRIPTION_WIDTH: usize = 40;

/// Terminal prompts. Esc answers "back", a terminal error cancels.
pub struct DialoguerPrompter;

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn skill_label(skill: &Skill) -> String {
    let name = truncate(&skill.name, NAME_WIDTH);
    match skill.description.as_deref() {
        Some(description) => format!(
            "{name:<NAME_WIDTH$} {}",
            style(format!("- {}", truncate(description, DESCRIPTION_WIDTH))).dim()
        ),
        None => name,
    }
}

fn answer<T>(result: dialoguer::Result<Option<T>>) -> Answer<T> {
    match result {
        Ok(Some(value)) => Answer::Value(value),
        Ok(None) => Answer::Back,
        Err(e) => {
            tracing::debug!("Prompt aborted: {}", e);
            Answer::Cancel
        }
    }
}

impl Prompter for DialoguerPrompter {
    fn select_skills(&self, skills: &[Skill]) -> Answer<Vec<usize>> {
        println!();
        println!(
            "{} Found {} skills",
            style("📦").cyan(),
            style(skills.len()).bold()
        );
        let labels: Vec<String> = skills.iter().map(skill_label).collect();
        answer(
            MultiSelect::with_theme(&ColorfulTheme::default())
                .with_prompt("Select skills (space to toggle, enter to confirm)")
                .items(&labels)
                .interact_opt(),
        )
    }

    fn select_scope(&self, default: Scope) -> Answer<Scope> {
        let choices = [Scope::Global, Scope::Local];
        let labels = [
            "Global  - every detected agent",
            "Local   - this project only",
        ];
        let selected = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Install scope (esc to go back)")
            .items(&labels)
            .default(choices.iter().position(|c| *c == default).unwrap_or(0))
            .interact_opt();
        answer(selected.map(|i| i.map(|i| choices[i])))
    }

    fn select_method(&self, default: Method) -> Answer<Method> {
        let choices = [Method::Link, Method::Copy];
        let labels = [
            "Link  - symlink agents to the shared copy",
            "Copy  - give every agent its own copy",
        ];
        let selected = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Install method (esc to go back)")
            .items(&labels)
            .default(choices.iter().position(|c| *c == default).unwrap_or(0))
            .interact_opt();
        answer(selected.map(|i| i.map(|i| choices[i])))
    }

    fn ask_token(&self, domain: &str) -> Option<String> {
        println!();
        println!(
            "{} Authentication required for {}",
            style("🔒").yellow(),
            style(domain).bold()
        );
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Access token for {domain} (empty to skip)"))
            .allow_empty_password(true)
            .interact()
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}
