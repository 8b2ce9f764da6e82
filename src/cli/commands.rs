//! CLI command implementations

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::cli::args::ConfigCommand;
use crate::config::Settings;
use crate::llm::{build_backend, ollama, ResponseParser};
use crate::storage::SummaryRecord;
use crate::summarize::{SummarizeRequest, SummaryPipeline};
use crate::text::{detect, ChunkSplitter};
use crate::RecapError;

/// Summarize a transcript and save the result
pub async fn summarize(
    settings: &Settings,
    input: Option<PathBuf>,
    url: String,
    output_dir: Option<PathBuf>,
    json: bool,
    skip_check: bool,
) -> Result<()> {
    let mut settings = settings.clone();
    if let Some(dir) = output_dir {
        settings.output.output_dir = Some(dir);
    }

    let source_text = read_input(input.as_deref())?;
    if source_text.trim().is_empty() {
        return Err(RecapError::EmptyInput.into());
    }

    if skip_check {
        tracing::debug!("Skipping model runtime check");
    } else {
        ollama::prepare(&settings)
            .await
            .context("Model runtime is not ready (use --skip-check to bypass)")?;
    }

    let pipeline = Arc::new(SummaryPipeline::from_settings(&settings));

    let interrupt = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling inference");
                pipeline.cancel();
            }
        })
    };

    let result = pipeline
        .summarize(SummarizeRequest {
            source_text,
            source_url: url,
        })
        .await;
    interrupt.abort();

    let response = result.context("Summarization failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("Summary saved to: {}", response.output_path.display());
    println!();
    print_record(&response.record);

    Ok(())
}

/// Parse raw model output with the configured vocabulary
pub fn parse_output(settings: &Settings, file: Option<PathBuf>, json: bool) -> Result<()> {
    let raw = read_input(file.as_deref())?;
    let record = ResponseParser::new(settings.parser.clone()).parse(&raw);

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }

    Ok(())
}

/// Show how a transcript would be split
pub fn preview_chunks(settings: &Settings, file: Option<PathBuf>) -> Result<()> {
    let text = read_input(file.as_deref())?;
    let splitter = ChunkSplitter::new(
        settings.chunking.max_chunk_size,
        settings.chunking.overlap,
    );
    let chunks = splitter.split(&text);

    if chunks.is_empty() {
        println!("No chunks (input is empty)");
        return Ok(());
    }

    println!(
        "{:<6} {:<8} {:<6} {:<8} {}",
        "Chunk", "Chars", "Lang", "Overlap", "Preview"
    );
    println!("{}", "-".repeat(70));

    for chunk in &chunks {
        println!(
            "{:<6} {:<8} {:<6} {:<8} {}",
            chunk.index,
            chunk.char_len(),
            detect(&chunk.text).code(),
            chunk.overlap,
            truncate(&chunk.text, 40)
        );
    }

    println!();
    println!(
        "{} chunks (max {} chars, overlap {} chars)",
        chunks.len(),
        splitter.max_chunk_size(),
        splitter.overlap_size()
    );

    Ok(())
}

pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(settings)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: &'static str,
    detail: String,
}

#[derive(Serialize)]
struct DoctorReport {
    command: String,
    model: String,
    checks: Vec<DoctorCheck>,
    notes: Vec<String>,
}

/// Run diagnostic checks to help troubleshoot local setup issues.
pub async fn run_doctor(settings: &Settings, json: bool) -> Result<()> {
    let report = collect_doctor_report(settings).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("recap doctor");
    println!("command: {}", report.command);
    println!("model: {}", report.model);
    println!();

    for check in &report.checks {
        println!("{:<10} {:<8} {}", check.name, check.status, check.detail);
    }

    if !report.notes.is_empty() {
        println!();
        for note in &report.notes {
            println!("{}", note);
        }
    }

    Ok(())
}

async fn collect_doctor_report(settings: &Settings) -> DoctorReport {
    let command = settings.llm.command.as_str();
    let custom = !settings.llm.args.is_empty();
    let mut notes = Vec::new();
    let mut checks = Vec::new();

    if custom {
        let found = command_exists(command);
        checks.push(DoctorCheck {
            name: "command",
            status: if found { "ok" } else { "missing" },
            detail: format!("custom inference command '{}'", command),
        });
        checks.push(DoctorCheck {
            name: "model",
            status: "skipped",
            detail: "not checked for custom commands".to_string(),
        });
    } else {
        let installed = ollama::is_installed(command).await;
        checks.push(DoctorCheck {
            name: "command",
            status: if installed { "ok" } else { "missing" },
            detail: format!("'{} --version'", command),
        });

        let (status, detail) = if !installed {
            ("skipped", "runtime not installed".to_string())
        } else {
            match ollama::model_available(command, &settings.llm.model).await {
                Ok(true) => ("ok", "model is available locally".to_string()),
                Ok(false) => {
                    notes.push(format!(
                        "hint: run `{} pull {}` or let `recap summarize` pull it",
                        command, settings.llm.model
                    ));
                    ("missing", "model not pulled yet".to_string())
                }
                Err(e) => ("error", format!("{:#}", e)),
            }
        };
        checks.push(DoctorCheck {
            name: "model",
            status,
            detail,
        });

        if !installed {
            notes.push("hint: install ollama from https://ollama.com".to_string());
        }
    }

    let output_dir = settings.output_dir();
    checks.push(DoctorCheck {
        name: "output",
        status: if output_dir.is_dir() { "ok" } else { "absent" },
        detail: output_dir.display().to_string(),
    });

    if let Err(e) = settings.validate() {
        notes.push(format!("warning: {}", e));
    }

    DoctorReport {
        command: build_backend(settings).describe(),
        model: settings.llm.model.clone(),
        checks,
        notes,
    }
}

// Helper functions

/// Read a file, or stdin when no path is given
fn read_input(path: Option<&Path>) -> Result<String> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| RecapError::Input(format!("Failed to read {}: {}", path.display(), e)))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| RecapError::Input(format!("Failed to read stdin: {}", e)))?;
            text
        }
    };
    Ok(text)
}

fn print_record(record: &SummaryRecord) {
    println!("Summary:");
    for (i, point) in record.summary.iter().enumerate() {
        println!("  {}. {}", i + 1, point);
    }
    println!();
    println!("Conclusion:");
    println!("  {}", record.conclusion);
    println!();
    println!("Action Items:");
    for (i, item) in record.action_items.iter().enumerate() {
        println!("  {}. {}", i + 1, item);
    }
}

fn command_exists(bin: &str) -> bool {
    Command::new(bin)
        .arg("--help")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

fn truncate(s: &str, max_chars: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let head: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("會議記錄摘要生成助手", 6), "會議記...");
        assert_eq!(truncate("two\nlines", 20), "two lines");
    }
}
