pub mod credentials;
pub mod prompt;
pub mod runner;

pub use credentials::CredentialStore;
pub use prompt::{Answer, Prompter};
pub use runner::{CommandOutput, CommandSpec, ProcessRunner, RunError};
