use super::manifest::{Skill, has_manifest, load_skill};
use crate::error::{IoContext, Result, SkillError};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const DEPENDENCY_DIR: &str = "node_modules";

/// Finds skills in `root`: the root itself when it carries a manifest, plus
/// every immediate subdirectory that does. Not recursive.
pub fn scan(root: &Path) -> Result<Vec<Skill>> {
    if !root.is_dir() {
        return Err(SkillError::not_found("Directory", root.display().to_string()));
    }

    let mut found = Vec::new();

    if has_manifest(root) {
        found.push(load_skill(root)?);
    }

    let mut subdirs: Vec<_> = fs::read_dir(root)
        .fs_context("Failed to read", root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && name != DEPENDENCY_DIR
        })
        .map(|entry| entry.path())
        .collect();
    subdirs.sort();

    for dir in subdirs {
        if !has_manifest(&dir) {
            continue;
        }
        match load_skill(&dir) {
            Ok(skill) => found.push(skill),
            Err(e) => tracing::warn!(path = %dir.display(), "Skipping skill: {}", e),
        }
    }

    Ok(dedupe(found))
}

fn dedupe(skills: Vec<Skill>) -> Vec<Skill> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter(|skill| {
            if is_unsafe_skill_name(&skill.name) {
                tracing::warn!(name = %skill.name, "Skipping unsafe skill name");
                return false;
            }
            if !seen.insert(skill.name.clone()) {
                tracing::warn!(
                    name = %skill.name,
                    path = %skill.path.display(),
                    "Skipping duplicate skill name"
                );
                return false;
            }
            true
        })
        .collect()
}

pub fn is_unsafe_skill_name(name: &str) -> bool {
    name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
        || name.starts_with('.')
        || name.trim().is_empty()
}
