use super::manifest::{Skill, load_skill};
use crate::error::{IoContext, Result, SkillError};
use crate::install::Method;
use crate::linker::{copy_dir, is_symlink, read_link_target, remove_link, symlink_dir};
use std::fs;
use std::path::{Path, PathBuf};

/// What `materialize` did with the shared entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedWrite {
    /// Source already is the shared entry; nothing written.
    AlreadyShared,
    /// An entry existed and `force` was not set; it was left as is.
    KeptExisting,
    Copied,
    Linked,
    /// Symlink creation failed and a full copy was written instead.
    CopiedAfterLinkFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryMode {
    Copy,
    Link { target: PathBuf },
}

#[derive(Debug, Clone)]
pub struct SharedEntry {
    pub name: String,
    pub path: PathBuf,
    pub mode: EntryMode,
    /// Manifest metadata; `None` when the entry has no readable `SKILL.md`.
    pub skill: Option<Skill>,
}

/// The shared skills directory every agent link points back to.
#[derive(Debug, Clone)]
pub struct SharedStore {
    root: PathBuf,
}

impl SharedStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// True for real entries and for symlinks, dangling ones included.
    pub fn contains(&self, name: &str) -> bool {
        fs::symlink_metadata(self.entry_path(name)).is_ok()
    }

    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).fs_context("Failed to create shared directory", &self.root)
    }

    pub fn materialize(&self, skill: &Skill, method: Method, force: bool) -> Result<SharedWrite> {
        self.ensure_root()?;
        let target = self.entry_path(&skill.name);

        if self.contains(&skill.name) {
            if same_location(&skill.path, &target) {
                tracing::info!(skill = %skill.name, "Already in shared directory");
                return Ok(SharedWrite::AlreadyShared);
            }

            let dangling = is_symlink(&target) && !target.exists();
            if !force && !dangling {
                tracing::info!(skill = %skill.name, "Exists, updating links only");
                return Ok(SharedWrite::KeptExisting);
            }

            tracing::info!(skill = %skill.name, path = %target.display(), "Removing existing entry");
            remove_entry(&target)?;
        }

        match method {
            Method::Copy => {
                copy_dir(&skill.path, &target)?;
                Ok(SharedWrite::Copied)
            }
            Method::Link => {
                let source = skill
                    .path
                    .canonicalize()
                    .fs_context("Failed to resolve", &skill.path)?;
                match symlink_dir(&source, &target) {
                    Ok(()) => Ok(SharedWrite::Linked),
                    Err(e) => {
                        tracing::warn!(
                            skill = %skill.name,
                            path = %target.display(),
                            "Symlink failed ({}), falling back to copy",
                            e
                        );
                        copy_dir(&skill.path, &target)?;
                        Ok(SharedWrite::CopiedAfterLinkFailure)
                    }
                }
            }
        }
    }

    /// Deletes the entry. A symlinked entry is unlinked, its source untouched.
    pub fn remove(&self, name: &str) -> Result<EntryMode> {
        let path = self.entry_path(name);
        if !self.contains(name) {
            return Err(SkillError::not_found("Skill", name));
        }
        let mode = entry_mode(&path);
        remove_entry(&path)?;
        Ok(mode)
    }

    pub fn entries(&self) -> Result<Vec<SharedEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).fs_context("Failed to read", &self.root)? {
            let entry = entry.fs_context("Failed to read", &self.root)?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if !path.is_dir() && !is_symlink(&path) {
                continue;
            }
            let skill = load_skill(&path)
                .map_err(|e| tracing::debug!(path = %path.display(), "No manifest: {}", e))
                .ok();
            entries.push(SharedEntry {
                mode: entry_mode(&path),
                name,
                path,
                skill,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

fn entry_mode(path: &Path) -> EntryMode {
    match read_link_target(path) {
        Some(target) => EntryMode::Link { target },
        None => EntryMode::Copy,
    }
}

fn remove_entry(path: &Path) -> Result<()> {
    if is_symlink(path) {
        remove_link(path).fs_context("Failed to remove", path)
    } else if path.is_dir() {
        fs::remove_dir_all(path).fs_context("Failed to remove", path)
    } else {
        fs::remove_file(path).fs_context("Failed to remove", path)
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
