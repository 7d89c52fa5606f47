use crate::install::{Method, Scope};
use crate::skills::Skill;

/// Outcome of one interactive question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer<T> {
    Value(T),
    Back,
    Cancel,
}

pub trait Prompter: Send + Sync {
    /// Indices into `skills` of the ones the user picked.
    fn select_skills(&self, skills: &[Skill]) -> Answer<Vec<usize>>;

    fn select_scope(&self, default: Scope) -> Answer<Scope>;

    fn select_method(&self, default: Method) -> Answer<Method>;

    /// Asks for a fresh access token. `None` means the user declined.
    fn ask_token(&self, domain: &str) -> Option<String>;
}
