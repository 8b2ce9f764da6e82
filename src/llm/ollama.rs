//! Model runtime preparation for the ollama CLI

use anyhow::{bail, Context, Result};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::Settings;

/// `<command> --version` runs and exits 0.
pub async fn is_installed(command: &str) -> bool {
    Command::new(command)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Whether `<command> list` mentions `model`.
pub async fn model_available(command: &str, model: &str) -> Result<bool> {
    let output = Command::new(command)
        .arg("list")
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to run '{} list'", command))?;

    if !output.status.success() {
        bail!(
            "'{} list' failed: {}",
            command,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).contains(model))
}

pub async fn pull_model(command: &str, model: &str) -> Result<()> {
    tracing::info!("Pulling model {}...", model);

    let output = Command::new(command)
        .args(["pull", model])
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to run '{} pull {}'", command, model))?;

    if !output.status.success() {
        bail!(
            "Failed to pull model {}: {}",
            model,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    tracing::info!("Model {} is ready", model);
    Ok(())
}

/// Make sure the configured runtime can serve the configured model.
///
/// Custom commands (non-empty `llm.args`) are not ollama and are left alone.
pub async fn prepare(settings: &Settings) -> Result<()> {
    let command = settings.llm.command.as_str();
    let model = settings.llm.model.as_str();

    if !settings.llm.args.is_empty() {
        tracing::debug!("Custom inference command '{}', skipping model check", command);
        return Ok(());
    }

    if !is_installed(command).await {
        bail!(
            "'{}' is not installed or not on PATH. Install ollama from https://ollama.com first.",
            command
        );
    }

    if model_available(command, model).await? {
        tracing::debug!("Model {} already available", model);
        return Ok(());
    }

    pull_model(command, model).await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// A fake ollama that answers `--version`, `list` and `pull`.
    fn fake_ollama(dir: &Path, listed: &str, pull_exit: i32) -> String {
        let path = dir.join("fake-ollama");
        let script = format!(
            "#!/bin/sh\n\
case \"$1\" in\n\
  --version) echo 'ollama version 0.0.0' ;;\n\
  list) printf 'NAME ID SIZE\\n{listed} abc 4GB\\n' ;;\n\
  pull) echo pulled >> \"{log}\"; exit {pull_exit} ;;\n\
  *) exit 1 ;;\n\
esac\n",
            log = dir.join("pulls.log").display(),
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    fn settings_for(command: &str, model: &str) -> Settings {
        let mut settings = Settings::default();
        settings.llm.command = command.to_string();
        settings.llm.model = model.to_string();
        settings
    }

    #[tokio::test]
    async fn missing_binary_is_not_installed() {
        assert!(!is_installed("recap-test-no-such-binary").await);
    }

    #[tokio::test]
    async fn listed_model_is_not_pulled() {
        let tmp = tempfile::tempdir().unwrap();
        let command = fake_ollama(tmp.path(), "breeze:f16", 0);

        assert!(is_installed(&command).await);
        assert!(model_available(&command, "breeze:f16").await.unwrap());

        prepare(&settings_for(&command, "breeze:f16")).await.unwrap();
        assert!(!tmp.path().join("pulls.log").exists());
    }

    #[tokio::test]
    async fn missing_model_is_pulled() {
        let tmp = tempfile::tempdir().unwrap();
        let command = fake_ollama(tmp.path(), "other:latest", 0);

        prepare(&settings_for(&command, "breeze:f16")).await.unwrap();
        assert!(tmp.path().join("pulls.log").exists());
    }

    #[tokio::test]
    async fn failed_pull_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let command = fake_ollama(tmp.path(), "other:latest", 1);

        let err = prepare(&settings_for(&command, "breeze:f16")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to pull model breeze:f16"));
    }

    #[tokio::test]
    async fn uninstalled_runtime_is_an_error() {
        let err = prepare(&settings_for("recap-test-no-such-binary", "m"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not installed"));
    }

    #[tokio::test]
    async fn custom_command_skips_checks() {
        let mut settings = settings_for("recap-test-no-such-binary", "m");
        settings.llm.args = vec!["--flag".to_string()];

        prepare(&settings).await.unwrap();
    }
}
