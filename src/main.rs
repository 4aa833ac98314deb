use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use dotnet_ci_helpers::changelog;
use dotnet_ci_helpers::ci::CiEnvironment;
use dotnet_ci_helpers::config::{ToolConfig, data_dir, default_install_dir};
use dotnet_ci_helpers::github::{AssetUpload, NewRelease, Release, ReleaseClient, RepositoryId};
use dotnet_ci_helpers::http::{HttpFetcher, TextFetcher};
use dotnet_ci_helpers::logging;
use dotnet_ci_helpers::process::{ProcessRunner, SystemProcessRunner};
use dotnet_ci_helpers::sdk::{ChannelResolver, ResolvedChannel, SdkInstaller, restore_workloads};
use dotnet_ci_helpers::solution::Solution;

#[derive(Parser)]
#[command(name = "dotnet-ci-helpers")]
#[command(version, about = "CI helpers for .NET builds")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file as JSON lines instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve SDK version patterns (e.g. 8.0.x) to installer channels
    Channels {
        /// Version patterns; defaults to sdk.channels from the config
        patterns: Vec<String>,
    },
    /// Resolve and install SDK channels with the dotnet-install script
    InstallSdk {
        /// Version patterns; defaults to sdk.channels from the config
        patterns: Vec<String>,

        #[arg(long)]
        install_dir: Option<PathBuf>,
    },
    /// Run `dotnet workload restore`
    WorkloadRestore { solution: PathBuf },
    /// List the projects of a solution
    Projects {
        solution: PathBuf,

        /// Only projects whose property matches, e.g. IsPackable=true
        #[arg(long, value_parser = parse_key_value)]
        property: Option<(String, String)>,
    },
    /// Render commits since the previous tag as markdown
    Changelog {
        /// Start of the range (defaults to the previous tag)
        #[arg(long)]
        since: Option<String>,

        /// Section heading (defaults to the current tag)
        #[arg(long)]
        heading: Option<String>,
    },
    /// Manage GitHub releases
    Release(ReleaseArgs),
}

#[derive(Args)]
struct ReleaseArgs {
    /// Repository as owner/name (defaults to GITHUB_REPOSITORY)
    #[arg(long)]
    repo: Option<String>,

    #[command(subcommand)]
    action: ReleaseAction,
}

#[derive(Subcommand)]
enum ReleaseAction {
    /// Create a draft release
    Create {
        tag: String,

        /// Commit or branch to tag (defaults to GITHUB_SHA)
        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        name: Option<String>,

        /// File whose contents become the release body
        #[arg(long)]
        notes_file: Option<PathBuf>,

        #[arg(long)]
        prerelease: bool,
    },
    /// Upload files as release assets, replacing same-named ones
    Upload {
        tag: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Append notes to the release body (defaults to the generated changelog)
    Notes {
        tag: String,

        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        #[arg(long)]
        text: Option<String>,
    },
    /// Publish a draft release
    Publish { tag: String },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got \"{}\"", s)),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.verbose, cli.log_file.as_deref())?;
    let config = ToolConfig::load_or_default(cli.config.as_deref())?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

async fn run(command: Command, config: ToolConfig) -> anyhow::Result<()> {
    let runner = SystemProcessRunner;

    match command {
        Command::Channels { patterns } => {
            let patterns = patterns_or_config(patterns, &config)?;
            let fetcher: Arc<dyn TextFetcher> = Arc::new(HttpFetcher::new()?);
            let resolver = ChannelResolver::new(fetcher, &config.releases_index_url);

            for channel in resolver.resolve(&patterns).await? {
                println!("{}", channel);
            }
        }
        Command::InstallSdk {
            patterns,
            install_dir,
        } => {
            let patterns = patterns_or_config(patterns, &config)?;
            let install_dir = install_dir
                .or_else(|| config.sdk.install_dir.clone())
                .unwrap_or_else(default_install_dir);
            let fetcher: Arc<dyn TextFetcher> = Arc::new(HttpFetcher::new()?);
            let installer = SdkInstaller::new(
                ChannelResolver::new(fetcher.clone(), &config.releases_index_url),
                fetcher,
                Arc::new(runner),
                &data_dir().join("scripts"),
                &install_dir,
            );

            let installed = installer.install(&patterns).await?;
            println!(
                "{}",
                installed
                    .iter()
                    .map(ResolvedChannel::token)
                    .collect::<Vec<_>>()
                    .join("\n")
            );
        }
        Command::WorkloadRestore { solution } => {
            restore_workloads(&runner, &solution).await?;
        }
        Command::Projects { solution, property } => {
            let solution = Solution::load(&solution)?;
            let projects = match &property {
                Some((key, value)) => solution.projects_with_property(key, value),
                None => solution.projects.iter().collect(),
            };
            for project in projects {
                println!("{}\t{}", project.name, project.path.display());
            }
        }
        Command::Changelog { since, heading } => {
            print!("{}", render_changelog(&runner, since, heading).await?);
        }
        Command::Release(args) => run_release(args, &config, &runner).await?,
    }

    Ok(())
}

async fn run_release(
    args: ReleaseArgs,
    config: &ToolConfig,
    runner: &dyn ProcessRunner,
) -> anyhow::Result<()> {
    let ci = CiEnvironment::from_env();
    let repo: RepositoryId = match (&args.repo, ci.repository()) {
        (Some(repo), _) => repo.parse()?,
        (None, Some(repo)) => repo?,
        (None, None) => bail!("No repository given and GITHUB_REPOSITORY is not set"),
    };
    if ci.token.is_none() {
        warn!("GITHUB_TOKEN is not set; requests are unauthenticated");
    }
    let client = ReleaseClient::new(&config.github.api_url, ci.token.clone())?;

    match args.action {
        ReleaseAction::Create {
            tag,
            target,
            name,
            notes_file,
            prerelease,
        } => {
            let mut release = NewRelease::new(&tag)
                .name(name.as_deref().unwrap_or(&tag))
                .prerelease(prerelease);
            if let Some(target) = target.or_else(|| ci.sha.clone()) {
                release = release.target(&target);
            }
            if let Some(path) = notes_file {
                let body = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                release = release.body(&body);
            }

            let created = client.create_draft(&repo, release).await?;
            println!("{}", created.html_url.unwrap_or_else(|| created.id.to_string()));
        }
        ReleaseAction::Upload { tag, files } => {
            let release = require_release(&client, &repo, &tag).await?;
            for file in files {
                let asset = AssetUpload::from_path(&file)
                    .await
                    .with_context(|| format!("failed to read {}", file.display()))?;
                client.upload_asset(&repo, &release, asset).await?;
            }
        }
        ReleaseAction::Notes { tag, file, text } => {
            let release = require_release(&client, &repo, &tag).await?;
            let notes = match (file, text) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, Some(text)) => text,
                (None, None) => render_changelog(runner, None, Some(tag.clone())).await?,
            };
            client.append_notes(&repo, release.id, notes.trim_end()).await?;
        }
        ReleaseAction::Publish { tag } => {
            let release = require_release(&client, &repo, &tag).await?;
            let published = client.publish(&repo, release.id).await?;
            println!(
                "{}",
                published
                    .html_url
                    .unwrap_or_else(|| published.id.to_string())
            );
        }
    }

    Ok(())
}

async fn require_release(
    client: &ReleaseClient,
    repo: &RepositoryId,
    tag: &str,
) -> anyhow::Result<Release> {
    client
        .find_release_by_tag(repo, tag)
        .await?
        .with_context(|| format!("No release tagged {} in {}", tag, repo))
}

async fn render_changelog(
    runner: &dyn ProcessRunner,
    since: Option<String>,
    heading: Option<String>,
) -> anyhow::Result<String> {
    let since = match since {
        Some(since) => Some(since),
        None => changelog::previous_tag(runner).await,
    };
    let heading = heading
        .or_else(|| CiEnvironment::from_env().tag().map(str::to_string))
        .unwrap_or_else(|| "Unreleased".to_string());

    let commits = changelog::collect_commits(runner, since.as_deref()).await?;
    Ok(changelog::render_markdown(
        &heading,
        chrono::Local::now().date_naive(),
        &commits,
    ))
}

fn patterns_or_config(patterns: Vec<String>, config: &ToolConfig) -> anyhow::Result<Vec<String>> {
    if !patterns.is_empty() {
        return Ok(patterns);
    }
    if config.sdk.channels.is_empty() {
        bail!("No SDK version patterns given and sdk.channels is empty in the config");
    }
    Ok(config.sdk.channels.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("IsPackable=true", Some(("IsPackable", "true")))]
    #[case(" TargetFramework = net8.0 ", Some(("TargetFramework", "net8.0")))]
    #[case("Empty=", Some(("Empty", "")))]
    #[case("=true", None)]
    #[case("no-separator", None)]
    fn parse_key_value_splits_on_first_equals(
        #[case] input: &str,
        #[case] expected: Option<(&str, &str)>,
    ) {
        let result = parse_key_value(input).ok();
        assert_eq!(
            result,
            expected.map(|(k, v)| (k.to_string(), v.to_string()))
        );
    }

    #[test]
    fn patterns_fall_back_to_config() {
        let mut config = ToolConfig::default();
        config.sdk.channels = vec!["8.0.x".to_string()];

        assert_eq!(
            patterns_or_config(vec![], &config).unwrap(),
            vec!["8.0.x".to_string()]
        );
        assert_eq!(
            patterns_or_config(vec!["9.x.x".to_string()], &config).unwrap(),
            vec!["9.x.x".to_string()]
        );
        assert!(patterns_or_config(vec![], &ToolConfig::default()).is_err());
    }
}
