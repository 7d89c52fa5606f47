use crate::skills::Context;
use anyhow::{Context as _, Result};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use eskill_core::CredentialStore;
use eskill_core::source::normalize_domain;

pub fn handle(
    ctx: &Context,
    domain: Option<String>,
    token: Option<String>,
    list: bool,
    remove: Option<String>,
) -> Result<()> {
    if list {
        return list_tokens(ctx);
    }
    if let Some(domain) = remove {
        return remove_token(ctx, &normalize_domain(&domain));
    }

    let domain = match domain {
        Some(domain) => domain,
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Domain (e.g. git.internal.corp)")
            .interact_text()
            .context("Failed to read domain")?,
    };
    let domain = normalize_domain(&domain);
    if domain.is_empty() {
        anyhow::bail!("Domain cannot be empty");
    }

    let token = match token {
        Some(token) => token,
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Access token for {domain}"))
            .interact()
            .context("Failed to read token")?,
    };
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Token cannot be empty");
    }

    ctx.credentials.save_token(&domain, token)?;
    println!(
        "{} Token saved for {}",
        style("✓").green().bold(),
        style(&domain).cyan()
    );
    Ok(())
}

fn list_tokens(ctx: &Context) -> Result<()> {
    let tokens = ctx.credentials.list_tokens();
    if tokens.is_empty() {
        println!("{} No tokens configured", style("!").yellow());
        return Ok(());
    }

    println!("{} Configured tokens", style("🔐").cyan());
    for (domain, masked) in tokens {
        println!("  - {}: {}", style(domain).bold(), style(masked).dim());
    }
    Ok(())
}

fn remove_token(ctx: &Context, domain: &str) -> Result<()> {
    if ctx.credentials.remove_token(domain)? {
        println!(
            "{} Removed token for {}",
            style("✓").green().bold(),
            domain
        );
        Ok(())
    } else {
        anyhow::bail!("No token found for {domain}")
    }
}
