//! SDK installation through the official dotnet-install scripts

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::http::TextFetcher;
use crate::process::{CommandSpec, ProcessRunner};
use crate::sdk::channel::ResolvedChannel;
use crate::sdk::error::InstallError;
use crate::sdk::resolver::ChannelResolver;

/// Flavor of the dotnet-install script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallScript {
    /// dotnet-install.sh, run with bash
    Bash,
    /// dotnet-install.ps1, run with pwsh
    PowerShell,
}

impl InstallScript {
    pub fn for_current_platform() -> Self {
        if cfg!(windows) {
            Self::PowerShell
        } else {
            Self::Bash
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Self::Bash => "https://dot.net/v1/dotnet-install.sh",
            Self::PowerShell => "https://dot.net/v1/dotnet-install.ps1",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Bash => "dotnet-install.sh",
            Self::PowerShell => "dotnet-install.ps1",
        }
    }

    /// Command that installs `channel` into `install_dir`
    pub fn command(
        &self,
        script: &Path,
        channel: &ResolvedChannel,
        install_dir: &Path,
    ) -> CommandSpec {
        let script = script.display().to_string();
        let install_dir = install_dir.display().to_string();

        match self {
            Self::Bash => CommandSpec::new("bash").arg(script).args([
                "--channel".to_string(),
                channel.token(),
                "--install-dir".to_string(),
                install_dir,
            ]),
            Self::PowerShell => CommandSpec::new("pwsh")
                .args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-File"])
                .arg(script)
                .args([
                    "-Channel".to_string(),
                    channel.token(),
                    "-InstallDir".to_string(),
                    install_dir,
                ]),
        }
    }
}

/// Resolves channels and installs each of them
pub struct SdkInstaller {
    resolver: ChannelResolver,
    fetcher: Arc<dyn TextFetcher>,
    runner: Arc<dyn ProcessRunner>,
    script: InstallScript,
    script_dir: PathBuf,
    install_dir: PathBuf,
}

impl SdkInstaller {
    pub fn new(
        resolver: ChannelResolver,
        fetcher: Arc<dyn TextFetcher>,
        runner: Arc<dyn ProcessRunner>,
        script_dir: &Path,
        install_dir: &Path,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            runner,
            script: InstallScript::for_current_platform(),
            script_dir: script_dir.to_path_buf(),
            install_dir: install_dir.to_path_buf(),
        }
    }

    pub fn with_script(mut self, script: InstallScript) -> Self {
        self.script = script;
        self
    }

    /// Install every channel `requests` resolves to
    ///
    /// Stops at the first failing install.
    pub async fn install<S: AsRef<str> + Sync>(
        &self,
        requests: &[S],
    ) -> Result<Vec<ResolvedChannel>, InstallError> {
        let channels = self.resolver.resolve(requests).await?;
        let script = self.ensure_script().await?;

        for channel in &channels {
            info!(
                "Installing .NET SDK channel {} into {}",
                channel,
                self.install_dir.display()
            );
            let command = self.script.command(&script, channel, &self.install_dir);
            self.runner.run(&command).await?;
        }

        Ok(channels)
    }

    /// Download the install script unless a non-empty copy is already on disk
    ///
    /// The download lands in a `.part` file that is renamed into place, so an
    /// interrupted write never leaves a truncated script behind.
    async fn ensure_script(&self) -> Result<PathBuf, InstallError> {
        let path = self.script_dir.join(self.script.file_name());
        let cached = tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.len() > 0);
        if cached {
            debug!("Using cached install script {}", path.display());
            return Ok(path);
        }

        let url = self.script.url();
        let content = self.fetcher.fetch_text(url).await?;
        if content.trim().is_empty() {
            return Err(InstallError::EmptyScript(url.to_string()));
        }

        tokio::fs::create_dir_all(&self.script_dir).await?;
        let partial = self
            .script_dir
            .join(format!("{}.part", self.script.file_name()));
        tokio::fs::write(&partial, content).await?;
        tokio::fs::rename(&partial, &path).await?;
        info!("Downloaded {} to {}", url, path.display());

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockTextFetcher;
    use crate::process::{MockProcessRunner, ProcessError, ProcessOutput};
    use crate::sdk::error::ResolveError;
    use mockall::Sequence;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    const INDEX_URL: &str = "https://example.com/releases-index.json";
    const INDEX: &str = r#"{"releases-index": [
        {"latest-sdk": "9.0.305"},
        {"latest-sdk": "8.0.404"}
    ]}"#;

    fn fetcher_with_script() -> MockTextFetcher {
        let mut fetcher = MockTextFetcher::new();
        fetcher
            .expect_fetch_text()
            .with(eq(INDEX_URL))
            .returning(|_| Ok(INDEX.to_string()));
        fetcher
            .expect_fetch_text()
            .with(eq(InstallScript::Bash.url()))
            .times(1)
            .returning(|_| Ok("#!/usr/bin/env bash\necho install\n".to_string()));
        fetcher
    }

    fn installer(
        fetcher: MockTextFetcher,
        runner: MockProcessRunner,
        dir: &TempDir,
    ) -> SdkInstaller {
        let fetcher: Arc<dyn TextFetcher> = Arc::new(fetcher);
        SdkInstaller::new(
            ChannelResolver::new(fetcher.clone(), INDEX_URL),
            fetcher,
            Arc::new(runner),
            &dir.path().join("scripts"),
            &dir.path().join("dotnet"),
        )
        .with_script(InstallScript::Bash)
    }

    #[test]
    fn bash_command_passes_channel_and_install_dir() {
        let command = InstallScript::Bash.command(
            Path::new("/tmp/dotnet-install.sh"),
            &ResolvedChannel::new(8, 0, 404),
            Path::new("/opt/dotnet"),
        );

        assert_eq!(
            command.to_string(),
            "bash /tmp/dotnet-install.sh --channel 8.0.4xx --install-dir /opt/dotnet"
        );
    }

    #[test]
    fn powershell_command_uses_pwsh_parameters() {
        let command = InstallScript::PowerShell.command(
            Path::new("dotnet-install.ps1"),
            &ResolvedChannel::new(3, 1, 426),
            Path::new("dotnet"),
        );

        assert_eq!(
            command.to_string(),
            "pwsh -NoProfile -ExecutionPolicy Bypass -File dotnet-install.ps1 -Channel 3.1 -InstallDir dotnet"
        );
    }

    #[tokio::test]
    async fn install_runs_script_once_per_channel_in_order() {
        let dir = TempDir::new().unwrap();
        let mut runner = MockProcessRunner::new();
        let mut seq = Sequence::new();
        for token in ["9.0.3xx", "8.0.4xx"] {
            runner
                .expect_run()
                .withf(move |command| command.program == "bash" && command.args[2] == token)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(ProcessOutput::default()));
        }

        let installed = installer(fetcher_with_script(), runner, &dir)
            .install(&["9.x.x", "8.x.x"])
            .await
            .unwrap();

        assert_eq!(
            installed,
            vec![
                ResolvedChannel::new(9, 0, 305),
                ResolvedChannel::new(8, 0, 404)
            ]
        );
        let script = std::fs::read_to_string(dir.path().join("scripts/dotnet-install.sh")).unwrap();
        assert!(script.contains("echo install"));
    }

    #[tokio::test]
    async fn install_reuses_downloaded_script() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
        std::fs::write(dir.path().join("scripts/dotnet-install.sh"), "cached").unwrap();

        let mut fetcher = MockTextFetcher::new();
        fetcher
            .expect_fetch_text()
            .with(eq(INDEX_URL))
            .times(1)
            .returning(|_| Ok(INDEX.to_string()));
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| Ok(ProcessOutput::default()));

        let installed = installer(fetcher, runner, &dir)
            .install(&["8.0.x"])
            .await
            .unwrap();

        assert_eq!(installed, vec![ResolvedChannel::new(8, 0, 404)]);
    }

    #[tokio::test]
    async fn install_replaces_truncated_script_and_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let scripts = dir.path().join("scripts");
        std::fs::create_dir_all(&scripts).unwrap();
        std::fs::write(scripts.join("dotnet-install.sh"), "").unwrap();
        std::fs::write(scripts.join("dotnet-install.sh.part"), "#!/usr/bin/env ba").unwrap();
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| Ok(ProcessOutput::default()));

        installer(fetcher_with_script(), runner, &dir)
            .install(&["8.0.x"])
            .await
            .unwrap();

        let script = std::fs::read_to_string(scripts.join("dotnet-install.sh")).unwrap();
        assert!(script.contains("echo install"));
        assert!(!scripts.join("dotnet-install.sh.part").exists());
    }

    #[tokio::test]
    async fn install_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let mut runner = MockProcessRunner::new();
        runner.expect_run().times(1).returning(|command| {
            Err(ProcessError::NonZeroExit {
                command: command.to_string(),
                code: Some(1),
                stderr: "download failed".to_string(),
            })
        });

        let result = installer(fetcher_with_script(), runner, &dir)
            .install(&["9.x.x", "8.x.x"])
            .await;

        assert!(matches!(result, Err(InstallError::Process(_))));
    }

    #[tokio::test]
    async fn install_does_not_download_script_when_nothing_resolves() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = MockTextFetcher::new();
        fetcher
            .expect_fetch_text()
            .with(eq(INDEX_URL))
            .returning(|_| Ok(INDEX.to_string()));
        let runner = MockProcessRunner::new();

        let result = installer(fetcher, runner, &dir).install(&["5.x.x"]).await;

        assert!(matches!(
            result,
            Err(InstallError::Resolve(ResolveError::NoMatch { .. }))
        ));
    }

    #[tokio::test]
    async fn install_rejects_empty_script() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = MockTextFetcher::new();
        fetcher
            .expect_fetch_text()
            .with(eq(INDEX_URL))
            .returning(|_| Ok(INDEX.to_string()));
        fetcher
            .expect_fetch_text()
            .with(eq(InstallScript::Bash.url()))
            .returning(|_| Ok(String::new()));
        let runner = MockProcessRunner::new();

        let result = installer(fetcher, runner, &dir).install(&["8.x.x"]).await;

        assert!(matches!(result, Err(InstallError::EmptyScript(_))));
    }
}
