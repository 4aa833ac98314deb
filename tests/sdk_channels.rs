//! SDK channel resolution and installation E2E tests

mod helper;

use std::sync::Arc;

use tempfile::TempDir;

use helper::{RecordingRunner, StubFetcher, index_json};
use dotnet_ci_helpers::sdk::{
    ChannelResolver, InstallError, InstallScript, ResolveError, ResolvedChannel, SdkInstaller,
    resolve_channels,
};

const INDEX_URL: &str = "https://example.com/release-metadata/releases-index.json";

/// Release index as published, newest line first
const PUBLISHED_INDEX: &str = r#"{
    "releases-index": [
        {
            "channel-version": "10.0",
            "latest-release": "10.0.0-rc.2.25502.107",
            "latest-sdk": "10.0.100-rc.2.25502.107",
            "release-type": "lts",
            "support-phase": "go-live"
        },
        {
            "channel-version": "9.0",
            "latest-release": "9.0.9",
            "latest-sdk": "9.0.305",
            "release-type": "sts",
            "support-phase": "active"
        },
        {
            "channel-version": "8.0",
            "latest-release": "8.0.20",
            "latest-sdk": "8.0.414",
            "release-type": "lts",
            "support-phase": "active"
        },
        {
            "channel-version": "7.0",
            "latest-sdk": "7.0.410",
            "support-phase": "eol"
        },
        {
            "channel-version": "6.0",
            "latest-sdk": "6.0.425",
            "support-phase": "eol"
        },
        {
            "channel-version": "3.1",
            "latest-sdk": "3.1.426",
            "support-phase": "eol"
        }
    ]
}"#;

fn tokens(channels: &[ResolvedChannel]) -> Vec<String> {
    channels.iter().map(ResolvedChannel::token).collect()
}

#[test]
fn resolves_typical_build_matrix() {
    let channels = resolve_channels(
        &["3.1.x", "6.x.x", "8.0.x", "9.0.100", "10.x.x"],
        PUBLISHED_INDEX,
    )
    .unwrap();

    assert_eq!(tokens(&channels), vec!["3.1", "6.0.4xx", "8.0.4xx", "9.0.1xx"]);
}

#[test]
fn stable_major_lines_from_index() {
    let index = index_json(&["6.0.425", "7.0.410"]);

    let channels = resolve_channels(&["6.x.x", "7.x.x"], &index).unwrap();

    assert_eq!(tokens(&channels), vec!["6.0.4xx", "7.0.4xx"]);
}

#[test]
fn forced_patch_determines_band() {
    let channels = resolve_channels(&["9.0.100"], &index_json(&["9.0.305"])).unwrap();

    assert_eq!(channels, vec![ResolvedChannel::new(9, 0, 100)]);
    assert_eq!(tokens(&channels), vec!["9.0.1xx"]);
}

#[test]
fn prerelease_only_majors_fail_with_no_match() {
    let index = index_json(&["10.0.100-preview.7.25380.108", "10.0.100-rc.1.25451.107"]);

    let result = resolve_channels(&["10.x.x"], &index);

    assert!(matches!(result, Err(ResolveError::NoMatch { .. })));
}

#[tokio::test]
async fn resolver_reads_index_through_fetcher() {
    let fetcher = StubFetcher::new().with_body(INDEX_URL, PUBLISHED_INDEX);
    let resolver = ChannelResolver::new(Arc::new(fetcher), INDEX_URL);

    let channels = resolver.resolve(&["8.x.x", "8.0.x"]).await.unwrap();

    assert_eq!(tokens(&channels), vec!["8.0.4xx"]);
}

#[tokio::test]
async fn resolver_surfaces_missing_index() {
    let resolver = ChannelResolver::new(Arc::new(StubFetcher::new()), INDEX_URL);

    let result = resolver.resolve(&["8.x.x"]).await;

    assert!(matches!(result, Err(ResolveError::Fetch(_))));
}

#[tokio::test]
async fn installer_downloads_script_and_installs_each_channel() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(
        StubFetcher::new()
            .with_body(INDEX_URL, PUBLISHED_INDEX)
            .with_body(InstallScript::Bash.url(), "#!/usr/bin/env bash\n"),
    );
    let runner = Arc::new(RecordingRunner::new());
    let installer = SdkInstaller::new(
        ChannelResolver::new(fetcher.clone(), INDEX_URL),
        fetcher,
        runner.clone(),
        &dir.path().join("scripts"),
        &dir.path().join("dotnet"),
    )
    .with_script(InstallScript::Bash);

    let installed = installer.install(&["8.x.x", "9.0.100"]).await.unwrap();

    assert_eq!(tokens(&installed), vec!["8.0.4xx", "9.0.1xx"]);
    let script = dir.path().join("scripts/dotnet-install.sh");
    assert!(script.exists());
    let install_dir = dir.path().join("dotnet").display().to_string();
    let commands: Vec<Vec<String>> = runner.commands().into_iter().map(|c| c.args).collect();
    assert_eq!(
        commands,
        vec![
            vec![
                script.display().to_string(),
                "--channel".to_string(),
                "8.0.4xx".to_string(),
                "--install-dir".to_string(),
                install_dir.clone(),
            ],
            vec![
                script.display().to_string(),
                "--channel".to_string(),
                "9.0.1xx".to_string(),
                "--install-dir".to_string(),
                install_dir,
            ],
        ]
    );
}

#[tokio::test]
async fn installer_runs_nothing_when_resolution_fails() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(StubFetcher::new().with_body(INDEX_URL, r#"{"unexpected": true}"#));
    let runner = Arc::new(RecordingRunner::new());
    let installer = SdkInstaller::new(
        ChannelResolver::new(fetcher.clone(), INDEX_URL),
        fetcher,
        runner.clone(),
        &dir.path().join("scripts"),
        &dir.path().join("dotnet"),
    );

    let result = installer.install(&["8.x.x"]).await;

    assert!(matches!(
        result,
        Err(InstallError::Resolve(ResolveError::Parse(_)))
    ));
    assert!(runner.commands().is_empty());
}
