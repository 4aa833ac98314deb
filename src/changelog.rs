//! Release notes from the git commit log

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::process::{CommandSpec, ProcessError, ProcessRunner};

/// `git log` format: abbreviated hash, tab, subject
const LOG_FORMAT: &str = "--pretty=format:%h%x09%s";

/// One commit in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    pub hash: String,
    pub subject: String,
}

/// Parse `git log` output written with [`LOG_FORMAT`]
pub fn parse_log(output: &str) -> Vec<CommitEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (hash, subject) = line.split_once('\t')?;
            let hash = hash.trim();
            if hash.is_empty() {
                return None;
            }
            Some(CommitEntry {
                hash: hash.to_string(),
                subject: subject.trim().to_string(),
            })
        })
        .collect()
}

/// The most recent tag before HEAD, or `None` if there is none
pub async fn previous_tag(runner: &dyn ProcessRunner) -> Option<String> {
    let command = CommandSpec::new("git").args(["describe", "--tags", "--abbrev=0", "HEAD^"]);

    match runner.run(&command).await {
        Ok(output) => Some(output.stdout.trim().to_string()).filter(|tag| !tag.is_empty()),
        Err(e) => {
            debug!("No previous tag: {}", e);
            None
        }
    }
}

/// Commits after `since` (or the whole history) up to HEAD
pub async fn collect_commits(
    runner: &dyn ProcessRunner,
    since: Option<&str>,
) -> Result<Vec<CommitEntry>, ProcessError> {
    let mut command = CommandSpec::new("git").args(["log", LOG_FORMAT]);
    if let Some(since) = since {
        command = command.arg(format!("{}..HEAD", since));
    }

    let output = runner.run(&command).await?;
    let commits = parse_log(&output.stdout);
    info!(
        "Collected {} commits since {}",
        commits.len(),
        since.unwrap_or("the first commit")
    );
    Ok(commits)
}

/// Render commits as a markdown section
pub fn render_markdown(heading: &str, date: NaiveDate, commits: &[CommitEntry]) -> String {
    let mut out = format!("## {} ({})\n\n", heading, date.format("%Y-%m-%d"));

    if commits.is_empty() {
        out.push_str("- No changes.\n");
    }
    for commit in commits {
        out.push_str(&format!("- {} ({})\n", commit.subject, commit.hash));
    }

    out
}
