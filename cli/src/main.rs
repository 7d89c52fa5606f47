use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use eskill_core::InstallOptions;

mod auth;
mod prompt;
mod skills;

#[derive(Parser)]
#[command(name = "eskill", version)]
#[command(about = "eskill - Install skills once, share them with every coding agent", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install skills from a registry package, Git URL or local path
    #[command(visible_alias = "add")]
    Install {
        source: String,
        /// Target agent id, or `all`
        #[arg(short, long)]
        agent: Option<String>,
        /// Install every skill found without asking
        #[arg(long)]
        all: bool,
        #[arg(long, conflicts_with = "local")]
        global: bool,
        #[arg(long)]
        local: bool,
        /// Symlink the source into the shared directory (development mode)
        #[arg(long, conflicts_with = "copy")]
        link: bool,
        #[arg(long)]
        copy: bool,
        /// Replace an existing shared entry
        #[arg(short, long)]
        force: bool,
        #[arg(short, long)]
        registry: Option<String>,
        /// Timeout for git/npm in milliseconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Unlink a skill from agents and delete it
    #[command(visible_aliases = ["rm", "uninstall"])]
    Remove {
        skill: String,
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Show installed skills
    #[command(visible_alias = "ls")]
    List,
    /// Show supported agents and their skill directories
    #[command(visible_alias = "list-agents")]
    Agents,
    /// Manage access tokens for private Git hosts
    Auth {
        domain: Option<String>,
        #[arg(short, long)]
        token: Option<String>,
        #[arg(short, long)]
        list: bool,
        #[arg(short, long, value_name = "DOMAIN")]
        remove: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(command: Commands) -> Result<()> {
    let ctx = skills::Context::load()?;

    match command {
        Commands::Install {
            source,
            agent,
            all,
            global,
            local,
            link,
            copy,
            force,
            registry,
            timeout,
        } => {
            let options = InstallOptions {
                agent,
                link,
                copy,
                global,
                local,
                all,
                force,
                registry,
                timeout,
            };
            skills::install(&ctx, &source, &options).await
        }
        Commands::Remove { skill, agent } => skills::remove(&ctx, &skill, agent.as_deref()),
        Commands::List => skills::list(&ctx),
        Commands::Agents => skills::agents(&ctx),
        Commands::Auth {
            domain,
            token,
            list,
            remove,
        } => auth::handle(&ctx, domain, token, list, remove),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command).await {
        eprintln!("{} {:#}", style("✗").red().bold(), e);
        std::process::exit(1);
    }
}
