use super::{AgentTarget, Base, DirRule};

const fn agent(
    id: &'static str,
    display_name: &'static str,
    rules: &'static [DirRule],
) -> AgentTarget {
    AgentTarget {
        id,
        display_name,
        rules,
        enabled: true,
        prefer_copy: false,
    }
}

pub const BUILTIN_AGENTS: &[AgentTarget] = &[
    agent(
        "amp",
        "AMP",
        &[
            DirRule::Under(Base::ConfigHome, &["agents", "skills"]),
            DirRule::Under(Base::Project, &[".agents", "skills"]),
        ],
    ),
    agent(
        "antigravity",
        "Antigravity",
        &[
            DirRule::Under(Base::Home, &[".gemini", "antigravity", "skills"]),
            DirRule::Under(Base::Project, &[".agent", "skills"]),
            DirRule::Under(Base::Project, &[".shared", "skills"]),
        ],
    ),
    agent(
        "claude",
        "Claude Code",
        &[DirRule::EnvOverride {
            var: "CLAUDE_CONFIG_DIR",
            fallback: &[".claude"],
            tail: &["skills"],
        }],
    ),
    agent(
        "clawdbot",
        "ClawdBot",
        &[DirRule::FirstExisting {
            markers: &[".openclaw", ".clawdbot", ".moltbot"],
            tail: &["skills"],
        }],
    ),
    agent("cline", "Cline", &[DirRule::Under(Base::Home, &[".cline", "skills"])]),
    agent(
        "codex",
        "Codex",
        &[DirRule::EnvOverride {
            var: "CODEX_HOME",
            fallback: &[".codex"],
            tail: &["skills"],
        }],
    ),
    agent("cursor", "Cursor", &[DirRule::Under(Base::Home, &[".cursor", "skills"])]),
    agent("droid", "Droid", &[DirRule::Under(Base::Home, &[".factory", "skills"])]),
    agent("gemini", "Gemini", &[DirRule::Under(Base::Home, &[".gemini", "skills"])]),
    agent(
        "copilot",
        "GitHub Copilot",
        &[DirRule::Under(Base::Home, &[".copilot", "skills"])],
    ),
    agent(
        "goose",
        "Goose",
        &[DirRule::Under(Base::ConfigHome, &["goose", "skills"])],
    ),
    agent("kilo", "Kilo Code", &[DirRule::Under(Base::Home, &[".kilocode", "skills"])]),
    agent("kiro", "Kiro CLI", &[DirRule::Under(Base::Home, &[".kiro", "skills"])]),
    agent(
        "opencode",
        "OpenCode",
        &[DirRule::Under(Base::ConfigHome, &["opencode", "skills"])],
    ),
    agent("roo", "Roo Code", &[DirRule::Under(Base::Home, &[".roo", "skills"])]),
    agent("trae", "Trae", &[DirRule::Under(Base::Home, &[".trae", "skills"])]),
    agent(
        "windsurf",
        "Windsurf",
        &[
            DirRule::Under(Base::Home, &[".windsurf", "skills"]),
            DirRule::Under(Base::Home, &[".codeium", "windsurf", "skills"]),
        ],
    ),
    agent("qoder", "Qoder", &[DirRule::Under(Base::Home, &[".qoder", "skills"])]),
    agent(
        "continue",
        "Continue",
        &[DirRule::Under(Base::Home, &[".continue", "skills"])],
    ),
];
