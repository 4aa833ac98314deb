//! CI metadata from GitHub Actions environment variables

use crate::github::{ReleaseError, RepositoryId};

/// Prefix of `GITHUB_REF` for tag builds
const TAG_REF_PREFIX: &str = "refs/tags/";

/// Build metadata exposed by the CI runner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    pub github_actions: bool,
    pub repository: Option<String>,
    pub sha: Option<String>,
    pub git_ref: Option<String>,
    pub ref_name: Option<String>,
    pub run_id: Option<String>,
    pub run_number: Option<u64>,
    pub server_url: Option<String>,
    pub token: Option<String>,
}

impl CiEnvironment {
    /// Reads the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads variables through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            github_actions: var("GITHUB_ACTIONS").is_some_and(|v| v.eq_ignore_ascii_case("true")),
            repository: var("GITHUB_REPOSITORY"),
            sha: var("GITHUB_SHA"),
            git_ref: var("GITHUB_REF"),
            ref_name: var("GITHUB_REF_NAME"),
            run_id: var("GITHUB_RUN_ID"),
            run_number: var("GITHUB_RUN_NUMBER").and_then(|v| v.parse().ok()),
            server_url: var("GITHUB_SERVER_URL"),
            token: var("GITHUB_TOKEN"),
        }
    }

    pub fn is_ci(&self) -> bool {
        self.github_actions
    }

    /// The `GITHUB_REPOSITORY` value as a repository id
    pub fn repository(&self) -> Option<Result<RepositoryId, ReleaseError>> {
        self.repository.as_deref().map(str::parse)
    }

    /// The tag being built, if this is a tag build
    pub fn tag(&self) -> Option<&str> {
        self.git_ref.as_deref()?.strip_prefix(TAG_REF_PREFIX)
    }

    /// Link to the current workflow run
    pub fn run_url(&self) -> Option<String> {
        Some(format!(
            "{}/{}/actions/runs/{}",
            self.server_url.as_deref()?.trim_end_matches('/'),
            self.repository.as_deref()?,
            self.run_id.as_deref()?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> CiEnvironment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CiEnvironment::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn reads_github_actions_variables() {
        let ci = env(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_REPOSITORY", "octo/app"),
            ("GITHUB_SHA", "abc123"),
            ("GITHUB_REF", "refs/tags/v1.2.0"),
            ("GITHUB_REF_NAME", "v1.2.0"),
            ("GITHUB_RUN_ID", "987"),
            ("GITHUB_RUN_NUMBER", "15"),
            ("GITHUB_SERVER_URL", "https://github.com"),
            ("GITHUB_TOKEN", "secret"),
        ]);

        assert!(ci.is_ci());
        assert_eq!(ci.sha.as_deref(), Some("abc123"));
        assert_eq!(ci.run_number, Some(15));
        assert_eq!(ci.token.as_deref(), Some("secret"));
        assert_eq!(ci.tag(), Some("v1.2.0"));
        assert_eq!(
            ci.repository().unwrap().unwrap(),
            RepositoryId {
                owner: "octo".to_string(),
                name: "app".to_string()
            }
        );
        assert_eq!(
            ci.run_url().as_deref(),
            Some("https://github.com/octo/app/actions/runs/987")
        );
    }

    #[test]
    fn empty_environment_is_not_ci() {
        let ci = env(&[]);

        assert_eq!(ci, CiEnvironment::default());
        assert!(!ci.is_ci());
        assert_eq!(ci.tag(), None);
        assert!(ci.repository().is_none());
        assert_eq!(ci.run_url(), None);
    }

    #[test]
    fn branch_builds_have_no_tag() {
        let ci = env(&[("GITHUB_REF", "refs/heads/main"), ("GITHUB_REF_NAME", "main")]);

        assert_eq!(ci.tag(), None);
    }

    #[test]
    fn blank_values_are_unset() {
        let ci = env(&[("GITHUB_TOKEN", "  "), ("GITHUB_RUN_NUMBER", "not-a-number")]);

        assert_eq!(ci.token, None);
        assert_eq!(ci.run_number, None);
    }

    #[test]
    fn invalid_repository_is_reported() {
        let ci = env(&[("GITHUB_REPOSITORY", "no-slash")]);

        assert!(matches!(
            ci.repository(),
            Some(Err(ReleaseError::InvalidRepository(_)))
        ));
    }

    #[test]
    #[serial_test::serial]
    fn from_env_reads_process_environment() {
        // SAFETY: serialized with every other test that touches the environment
        unsafe {
            std::env::set_var("GITHUB_SHA", "feedbeef");
        }

        let ci = CiEnvironment::from_env();

        unsafe {
            std::env::remove_var("GITHUB_SHA");
        }
        assert_eq!(ci.sha.as_deref(), Some("feedbeef"));
    }
}
