//! Fans shared skill entries out into agent directories.

use crate::agents::ResolvedAgent;
use crate::error::{IoContext, Result, SkillError};
use crate::skills::SharedStore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SKIPPED_ON_COPY: &[&str] = &[".git", "node_modules"];

/// Written into every agent copy so only our own copies are ever replaced
/// or removed.
pub const COPY_MARKER: &str = ".eskill-copy";

/// Per-directory results of one publish or unpublish call.
#[derive(Debug, Default, Clone)]
pub struct LinkReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl LinkReport {
    /// At least one of the agent's directories was handled.
    pub fn ok(&self) -> bool {
        !self.succeeded.is_empty()
    }
}

pub struct Linker<'a> {
    store: &'a SharedStore,
}

impl<'a> Linker<'a> {
    pub fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    pub fn publish(&self, skill: &str, agent: &ResolvedAgent, use_copy: bool) -> LinkReport {
        let mut report = LinkReport::default();
        let source = self.store.entry_path(skill);

        if !source.exists() {
            let message = format!("shared entry missing: {}", source.display());
            for target in agent.skill_paths(skill) {
                report.failed.push((target, message.clone()));
            }
            return report;
        }

        for target in agent.skill_paths(skill) {
            match publish_one(&source, &target, use_copy) {
                Ok(()) => report.succeeded.push(target),
                Err(e) => {
                    tracing::warn!(
                        skill,
                        agent = agent.agent.id,
                        path = %target.display(),
                        "Link failed: {}",
                        e
                    );
                    report.failed.push((target, e.to_string()));
                }
            }
        }

        if report.ok() {
            tracing::info!(
                skill,
                agent = agent.agent.id,
                dirs = report.succeeded.len(),
                copy = use_copy,
                "Published"
            );
        }
        report
    }

    pub fn unpublish(&self, skill: &str, agent: &ResolvedAgent) -> LinkReport {
        let mut report = LinkReport::default();

        for target in agent.skill_paths(skill) {
            if fs::symlink_metadata(&target).is_err() {
                continue;
            }
            let result = if is_symlink(&target) {
                remove_link(&target).fs_context("Failed to remove", &target)
            } else if is_managed_copy(&target) {
                fs::remove_dir_all(&target).fs_context("Failed to remove", &target)
            } else {
                tracing::warn!(path = %target.display(), "Not a managed link, leaving in place");
                report
                    .failed
                    .push((target, "not a symlink or managed copy".to_string()));
                continue;
            };
            match result {
                Ok(()) => report.succeeded.push(target),
                Err(e) => report.failed.push((target, e.to_string())),
            }
        }

        report
    }

    /// Some directory of `agent` holds `skill` as a link to the shared
    /// entry, or as a copy.
    pub fn is_linked(&self, skill: &str, agent: &ResolvedAgent) -> bool {
        let shared = self.store.entry_path(skill);
        agent.skill_paths(skill).iter().any(|path| {
            if is_symlink(path) {
                points_to(path, &shared)
            } else {
                is_managed_copy(path)
            }
        })
    }
}

fn publish_one(source: &Path, target: &Path, use_copy: bool) -> Result<()> {
    if let Some(parent) = target.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).fs_context("Failed to create directory", parent)?;
    }

    if fs::symlink_metadata(target).is_ok() {
        if is_symlink(target) {
            remove_link(target).fs_context("Failed to remove existing link", target)?;
        } else if is_managed_copy(target) {
            fs::remove_dir_all(target).fs_context("Failed to remove existing copy", target)?;
        } else {
            return Err(SkillError::fs(
                "Refusing to replace",
                target,
                io::Error::new(io::ErrorKind::AlreadyExists, "not a symlink or managed copy"),
            ));
        }
    }

    if use_copy {
        copy_dir(source, target)?;
        let marker = target.join(COPY_MARKER);
        fs::write(&marker, source.to_string_lossy().as_bytes())
            .fs_context("Failed to write", &marker)
    } else {
        symlink_dir(source, target).fs_context("Failed to create symlink", target)
    }
}

fn points_to(link: &Path, shared: &Path) -> bool {
    if read_link_target(link).as_deref() == Some(shared) {
        return true;
    }
    match (link.canonicalize(), shared.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn is_managed_copy(path: &Path) -> bool {
    !is_symlink(path) && path.join(COPY_MARKER).is_file()
}

pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

pub fn read_link_target(path: &Path) -> Option<PathBuf> {
    if !is_symlink(path) {
        return None;
    }
    fs::read_link(path).ok()
}

#[cfg(unix)]
pub fn symlink_dir(source: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
pub fn symlink_dir(source: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(source, target)
}

#[cfg(unix)]
pub fn remove_link(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
pub fn remove_link(path: &Path) -> io::Result<()> {
    fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}

/// Recursive copy that follows symlinks and skips VCS and dependency
/// directories.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).fs_context("Failed to create", dest)?;

    let walker = WalkDir::new(src)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !SKIPPED_ON_COPY.contains(&name.as_ref())
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            SkillError::fs("Failed to read", path, io::Error::other(e.to_string()))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| SkillError::fs("Failed to copy", entry.path(), io::Error::other(e)))?;
        let dest_path = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path).fs_context("Failed to create", &dest_path)?;
        } else {
            fs::copy(entry.path(), &dest_path).fs_context("Failed to copy", entry.path())?;
        }
    }
    Ok(())
}
