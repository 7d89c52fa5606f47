pub mod agents;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetch;
pub mod install;
pub mod inventory;
pub mod linker;
pub mod process;
pub mod skills;
pub mod source;
pub mod traits;

pub use agents::{AgentRegistry, AgentTarget, ResolvedAgent};
pub use config::*;
pub use credentials::{FileCredentialStore, mask_token};
pub use error::*;
pub use install::{
    InstallOptions, InstallOutcome, InstallReport, Installer, Method, Scope, SkillOutcome,
};
pub use inventory::{AgentsOverview, InstalledSkill, Inventory, RemoveReport};
pub use process::SystemRunner;
pub use skills::{EntryMode, SharedWrite, Skill};
pub use traits::{Answer, CommandSpec, CredentialStore, ProcessRunner, Prompter};
