use super::{Fetcher, Staged, staging_dir};
use crate::error::{Result, SkillError};
use crate::source::GitInfo;
use crate::traits::CommandSpec;
use std::path::Path;
use std::time::Duration;

/// Fallback clone directory when the repository name is unusable.
const CLONE_DIR: &str = "repo";

impl Fetcher {
    /// Clones `info` into a temporary directory, trying in turn: HTTPS
    /// (with a known token), SSH, then a freshly prompted token.
    pub(super) async fn clone_repo(&self, info: &GitInfo, timeout: Duration) -> Result<Staged> {
        let temp = staging_dir("eskill-git-")?;
        // the clone root doubles as the skill name for single-skill repos
        let dest = temp.path().join(clone_dir_name(info));
        let domain = info.host.as_str();

        let token = self.lookup_token(domain);
        let https = match &token {
            Some(token) => {
                tracing::info!(domain, "Cloning with stored token");
                clone_command(info, &info.authenticated_url(token), &dest).secret(token.as_str())
            }
            None => clone_command(info, &info.clone_url, &dest),
        };

        if let Err(https_err) = self.clone_once(&https, &dest, timeout).await {
            if matches!(https_err, SkillError::Timeout { .. }) {
                return Err(https_err);
            }
            tracing::warn!(domain, "HTTPS clone failed, trying SSH: {}", https_err);

            let ssh = clone_command(info, &info.ssh_url(), &dest);
            if let Err(ssh_err) = self.clone_once(&ssh, &dest, timeout).await {
                if matches!(ssh_err, SkillError::Timeout { .. }) {
                    return Err(ssh_err);
                }
                tracing::warn!(domain, "SSH clone failed: {}", ssh_err);
                self.clone_with_new_token(info, &dest, timeout).await?;
            }
        }

        let staged = match &info.subpath {
            Some(sub) => dest.join(sub),
            None => dest,
        };
        if !staged.is_dir() {
            return Err(SkillError::not_found(
                "Path",
                format!("{} in {}", info.subpath.as_deref().unwrap_or(""), info.clone_url),
            ));
        }
        Ok(Staged::temporary(staged, temp))
    }

    async fn clone_with_new_token(&self, info: &GitInfo, dest: &Path, timeout: Duration) -> Result<()> {
        let domain = info.host.as_str();
        let token = self
            .prompter
            .ask_token(domain)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SkillError::AuthRequired(domain.to_string()))?;
        self.credentials.save_token(domain, &token)?;

        let retry = clone_command(info, &info.authenticated_url(&token), dest).secret(token.as_str());
        self.clone_once(&retry, dest, timeout).await.map_err(|e| match e {
            SkillError::CommandFailed { message, .. } => SkillError::AuthFailed {
                domain: domain.to_string(),
                message,
            },
            other => other,
        })
    }

    async fn clone_once(&self, command: &CommandSpec, dest: &Path, timeout: Duration) -> Result<()> {
        // git refuses to clone into a non-empty directory left by a failed attempt
        if dest.exists()
            && let Err(e) = std::fs::remove_dir_all(dest)
        {
            tracing::warn!(path = %dest.display(), "Failed to clear previous clone attempt: {}", e);
        }
        self.run(command, timeout).await.map(|_| ())
    }
}

fn clone_dir_name(info: &GitInfo) -> &str {
    match info.repo.as_str() {
        "" | "." | ".." => CLONE_DIR,
        repo => repo,
    }
}

fn clone_command(info: &GitInfo, url: &str, dest: &Path) -> CommandSpec {
    let mut cmd = CommandSpec::new("git").args(["clone", "--depth", "1", "--quiet"]);
    if info.explicit_branch {
        cmd = cmd.args(["--branch", info.branch.as_str(), "--single-branch"]);
    }
    cmd.arg(url)
        .arg(dest.to_string_lossy())
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_SSH_COMMAND", "ssh -o BatchMode=yes")
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::config::{Config, Environment};
    use crate::install::InstallOptions;
    use crate::source::{SourceKind, parse_git_url};
    use crate::traits::{CommandOutput, CredentialStore, RunError};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Harness {
        _tmp: TempDir,
        runner: Arc<FakeRunner>,
        credentials: Arc<MemoryCredentials>,
        prompter: Arc<ScriptedPrompter>,
        fetcher: Fetcher,
    }

    fn harness(
        credentials: MemoryCredentials,
        prompter: ScriptedPrompter,
        env: impl FnOnce(Environment) -> Environment,
        runner: FakeRunner,
    ) -> Harness {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(runner);
        let credentials = Arc::new(credentials);
        let prompter = Arc::new(prompter);
        let fetcher = Fetcher::new(
            runner.clone(),
            credentials.clone(),
            prompter.clone(),
            env(Environment::new(tmp.path())),
            tmp.path().to_path_buf(),
        );
        Harness {
            _tmp: tmp,
            runner,
            credentials,
            prompter,
            fetcher,
        }
    }

    async fn fetch(h: &Harness, url: &str) -> Result<Staged> {
        h.fetcher
            .fetch(
                url,
                SourceKind::GitUrl,
                &InstallOptions::default(),
                &Config::default(),
            )
            .await
    }

    fn succeed_when(pred: impl Fn(&str) -> bool + Send + Sync + 'static) -> FakeRunner {
        FakeRunner::new(move |cmd| {
            let url = &cmd.args[cmd.args.len() - 2];
            if pred(url) {
                write_skill(&clone_dest(cmd).join("skills/pdf"), "PDF");
                Ok(CommandOutput::default())
            } else {
                failure(&format!("fatal: could not read from {url}"))
            }
        })
    }

    #[tokio::test]
    async fn public_clone_uses_plain_https() {
        let h = harness(
            MemoryCredentials::default(),
            ScriptedPrompter::default(),
            |e| e,
            succeed_when(|_| true),
        );
        let staged = fetch(&h, "https://github.com/anthropics/skills").await.unwrap();
        assert!(staged.dir.join("skills/pdf/SKILL.md").exists());

        let calls = h.runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "git");
        assert_eq!(
            &calls[0].args[..5],
            &["clone", "--depth", "1", "--quiet", "https://github.com/anthropics/skills.git"]
        );
        assert!(calls[0].envs.contains(&("GIT_TERMINAL_PROMPT".into(), "0".into())));
        assert!(clone_dest(&calls[0]).ends_with("skills"));
    }

    #[tokio::test]
    async fn parent_subpath_is_invalid_and_never_cloned() {
        let h = harness(
            MemoryCredentials::default(),
            ScriptedPrompter::default(),
            |e| e,
            succeed_when(|_| true),
        );
        let err = fetch(&h, "https://github.com/o/r/tree/main/../../..")
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::InvalidSource(_)));
        assert!(h.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn explicit_branch_and_subpath() {
        let h = harness(
            MemoryCredentials::default(),
            ScriptedPrompter::default(),
            |e| e,
            succeed_when(|_| true),
        );
        let staged = fetch(&h, "https://github.com/o/r/tree/dev/skills/pdf")
            .await
            .unwrap();
        assert!(staged.dir.ends_with("r/skills/pdf"));
        let args = &h.runner.calls()[0].args;
        let pos = args.iter().position(|a| a == "--branch").unwrap();
        assert_eq!(args[pos + 1], "dev");
        assert_eq!(args[pos + 2], "--single-branch");
    }

    #[tokio::test]
    async fn missing_subpath_is_not_found() {
        let h = harness(
            MemoryCredentials::default(),
            ScriptedPrompter::default(),
            |e| e,
            succeed_when(|_| true),
        );
        let err = fetch(&h, "https://github.com/o/r/tree/main/nope").await.unwrap_err();
        assert!(matches!(err, SkillError::NotFound { .. }));
    }

    #[tokio::test]
    async fn stored_token_is_inlined_and_redacted() {
        let h = harness(
            MemoryCredentials::with("git.corp.io", "tok-123456789"),
            ScriptedPrompter::default(),
            |e| e,
            succeed_when(|url| url.contains("oauth2:tok-123456789@")),
        );
        fetch(&h, "https://git.corp.io/team/sub/repo/-/tree/main/skills")
            .await
            .unwrap();
        let call = &h.runner.calls()[0];
        assert!(!call.to_string().contains("tok-123456789"));
        assert!(call.to_string().contains("oauth2:***@git.corp.io/team/sub/repo.git"));
    }

    #[tokio::test]
    async fn env_token_is_used_when_nothing_is_stored() {
        let h = harness(
            MemoryCredentials::default(),
            ScriptedPrompter::default(),
            |e| e.with_var("ESKILL_TOKEN_GIT_CORP_IO", "envtoken99"),
            succeed_when(|url| url.contains("oauth2:envtoken99@")),
        );
        fetch(&h, "git@git.corp.io:team/repo.git").await.unwrap();
        assert_eq!(h.runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_ssh() {
        let h = harness(
            MemoryCredentials::default(),
            ScriptedPrompter::default(),
            |e| e,
            succeed_when(|url| url.starts_with("git@")),
        );
        fetch(&h, "https://gitlab.com/o/r").await.unwrap();
        let calls = h.runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].args.contains(&"git@gitlab.com:o/r.git".to_string()));
        assert_eq!(h.prompter.times_asked("token"), 0);
    }

    #[tokio::test]
    async fn prompted_token_is_saved_and_retried() {
        let prompter = ScriptedPrompter::default();
        prompter.tokens.lock().unwrap().push(Some("fresh-token-abc".into()));
        let h = harness(
            MemoryCredentials::default(),
            prompter,
            |e| e,
            succeed_when(|url| url.contains("oauth2:fresh-token-abc@")),
        );
        fetch(&h, "https://git.corp.io/team/repo.git").await.unwrap();
        assert_eq!(h.runner.calls().len(), 3);
        assert_eq!(
            h.credentials.get_token("git.corp.io").as_deref(),
            Some("fresh-token-abc")
        );
    }

    #[tokio::test]
    async fn declined_prompt_is_auth_required() {
        let h = harness(
            MemoryCredentials::default(),
            ScriptedPrompter::default(),
            |e| e,
            succeed_when(|_| false),
        );
        let err = fetch(&h, "https://git.corp.io/team/repo.git").await.unwrap_err();
        assert!(matches!(err, SkillError::AuthRequired(ref d) if d == "git.corp.io"));
    }

    #[tokio::test]
    async fn rejected_token_is_auth_failed_without_leaking_it() {
        let prompter = ScriptedPrompter::default();
        prompter.tokens.lock().unwrap().push(Some("bad-token-xyz".into()));
        let runner = FakeRunner::new(|cmd| {
            let url = &cmd.args[cmd.args.len() - 2];
            failure(&format!("fatal: Authentication failed for '{url}'"))
        });
        let h = harness(MemoryCredentials::default(), prompter, |e| e, runner);
        let err = fetch(&h, "https://git.corp.io/team/repo.git").await.unwrap_err();
        match err {
            SkillError::AuthFailed { domain, message } => {
                assert_eq!(domain, "git.corp.io");
                assert!(!message.contains("bad-token-xyz"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn timeout_stops_the_chain() {
        let runner = FakeRunner::new(|_| Err(RunError::Timeout(Duration::from_millis(5))));
        let h = harness(
            MemoryCredentials::default(),
            ScriptedPrompter::default(),
            |e| e,
            runner,
        );
        let err = fetch(&h, "https://github.com/o/r").await.unwrap_err();
        assert!(matches!(err, SkillError::Timeout { .. }));
        assert_eq!(h.runner.calls().len(), 1);
        assert_eq!(h.prompter.times_asked("token"), 0);
    }

    #[test]
    fn branch_flag_only_when_explicit() {
        let info = parse_git_url("https://github.com/o/r").unwrap();
        let cmd = clone_command(&info, &info.clone_url, Path::new("/tmp/x"));
        assert!(!cmd.args.contains(&"--branch".to_string()));
        assert_eq!(cmd.args.last().map(String::as_str), Some("/tmp/x"));
    }
}
