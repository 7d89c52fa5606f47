use crate::error::{IoContext, Result, SkillError};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const MANIFEST_FILE: &str = "SKILL.md";
pub const DESCRIPTOR_FILE: &str = "package.json";
pub const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub name: String,
    pub path: PathBuf,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
struct PackageDescriptor {
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FrontMatter {
    description: Option<String>,
    version: Option<String>,
}

static DESCRIPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?im)^\s*description:\s*(?:"([^"]+)"|'([^']+)'|([^'"\r\n]+))"#)
        .expect("valid regex")
});

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?im)^\s*version:\s*(?:"([^"]+)"|'([^']+)'|([^'"\r\n]+))"#)
        .expect("valid regex")
});

pub fn has_manifest(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}

pub fn load_skill(skill_dir: &Path) -> Result<Skill> {
    let md_path = skill_dir.join(MANIFEST_FILE);
    if !md_path.is_file() {
        return Err(SkillError::not_found("SKILL.md", skill_dir.display().to_string()));
    }

    let descriptor = read_descriptor(skill_dir);
    let content = fs::read_to_string(&md_path).fs_context("Failed to read", &md_path)?;
    let front = parse_front_matter(&content);

    let name = descriptor
        .name
        .as_deref()
        .map(strip_scope)
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| dir_name(skill_dir));

    let description = descriptor
        .description
        .or(front.description)
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let version = descriptor
        .version
        .or(front.version)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());

    Ok(Skill {
        name,
        path: skill_dir.to_path_buf(),
        description,
        version,
    })
}

fn read_descriptor(skill_dir: &Path) -> PackageDescriptor {
    let pkg_path = skill_dir.join(DESCRIPTOR_FILE);
    let Ok(content) = fs::read_to_string(&pkg_path) else {
        return PackageDescriptor::default();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::debug!(path = %pkg_path.display(), "Ignoring invalid package.json: {}", e);
        PackageDescriptor::default()
    })
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("skill")
        .to_string()
}

/// `@scope/name` → `name`.
pub fn strip_scope(name: &str) -> &str {
    match name.strip_prefix('@').and_then(|rest| rest.split_once('/')) {
        Some((_, bare)) => bare,
        None => name,
    }
}

/// The leading `---` fenced block, if the manifest opens with one.
fn front_matter_block(content: &str) -> Option<String> {
    let lines: Vec<&str> = content.trim_start().lines().collect();
    if lines.first().map(|l| l.trim()) != Some("---") {
        return None;
    }
    let closing = lines[1..].iter().position(|l| l.trim() == "---")?;
    Some(lines[1..=closing].join("\n"))
}

fn parse_front_matter(content: &str) -> FrontMatter {
    let Some(block) = front_matter_block(content) else {
        return FrontMatter::default();
    };

    if let Ok(serde_yaml::Value::Mapping(map)) = serde_yaml::from_str::<serde_yaml::Value>(&block)
    {
        let field = |key: &str| {
            map.get(key).and_then(|v| match v {
                serde_yaml::Value::String(s) => Some(s.clone()),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        };
        return FrontMatter {
            description: field("description"),
            version: field("version"),
        };
    }

    FrontMatter {
        description: capture_value(&DESCRIPTION_LINE, &block),
        version: capture_value(&VERSION_LINE, &block),
    }
}

fn capture_value(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().trim().to_string())
}
