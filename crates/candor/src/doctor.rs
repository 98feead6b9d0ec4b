// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `candor doctor` command implementation.
//!
//! Runs diagnostic checks against the Candor environment: configuration
//! validity, host reachability, and availability of the judge and fallback
//! models on the host.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use candor_config::CandorConfig;
use candor_core::CandorError;
use candor_ollama::OllamaHost;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

/// Run the `candor doctor` command.
///
/// With `--plain`, disables colored output.
pub async fn run_doctor(config: &CandorConfig, plain: bool) -> Result<(), CandorError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = Vec::new();

    results.push(check_config().await);

    match OllamaHost::from_config(&config.host) {
        Ok(host) => {
            let host_check = check_host(&host).await;
            let host_reachable = host_check.status == CheckStatus::Pass;
            results.push(host_check);

            if host_reachable {
                results.push(check_model(&host, "judge model", &config.guard.judge_model).await);
                results.push(
                    check_model(&host, "fallback model", &config.guard.fallback_model).await,
                );
            }
        }
        Err(err) => {
            results.push(CheckResult {
                name: "Host client".to_string(),
                status: CheckStatus::Fail,
                message: err.to_string(),
                duration: Duration::ZERO,
            });
        }
    }

    print_results(&results, use_color);
    Ok(())
}

/// Check configuration loads without errors.
async fn check_config() -> CheckResult {
    let start = Instant::now();
    match candor_config::load_and_validate() {
        Ok(_) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Pass,
            message: "valid".to_string(),
            duration: start.elapsed(),
        },
        Err(errors) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Fail,
            message: format!("{} error(s)", errors.len()),
            duration: start.elapsed(),
        },
    }
}

/// Check the Ollama host responds to a version probe.
async fn check_host(host: &OllamaHost) -> CheckResult {
    let start = Instant::now();
    match host.ping().await {
        Ok(version) => CheckResult {
            name: "Host".to_string(),
            status: CheckStatus::Pass,
            message: format!("ollama {version} at {}", host.base_url()),
            duration: start.elapsed(),
        },
        Err(err) => CheckResult {
            name: "Host".to_string(),
            status: CheckStatus::Fail,
            message: format!("unreachable: {err}"),
            duration: start.elapsed(),
        },
    }
}

/// Check that a configured model is installed on the host.
async fn check_model(host: &OllamaHost, label: &str, model: &str) -> CheckResult {
    let start = Instant::now();
    let name = format!("Model ({label})");
    match host.list_models().await {
        Ok(models) => {
            if model_present(&models, model) {
                CheckResult {
                    name,
                    status: CheckStatus::Pass,
                    message: format!("{model} installed"),
                    duration: start.elapsed(),
                }
            } else {
                CheckResult {
                    name,
                    status: CheckStatus::Warn,
                    message: format!("{model} not found; run `ollama pull {model}`"),
                    duration: start.elapsed(),
                }
            }
        }
        Err(err) => CheckResult {
            name,
            status: CheckStatus::Fail,
            message: format!("could not list models: {err}"),
            duration: start.elapsed(),
        },
    }
}

/// Matches a configured model id against installed tags, treating a bare
/// name as equivalent to its `:latest` tag.
fn model_present(installed: &[String], model: &str) -> bool {
    installed
        .iter()
        .any(|tag| tag == model || tag.as_str() == format!("{model}:latest"))
}

/// Print the check table and a summary line.
fn print_results(results: &[CheckResult], use_color: bool) {
    println!();
    println!("  candor doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in results {
        let duration_ms = result.duration.as_millis();
        let line = match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "✓".green(),
                        result.name,
                        result.message
                    )
                } else {
                    format!(
                        "    [OK]   {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Warn => {
                warn_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "!".yellow(),
                        result.name,
                        result.message.yellow()
                    )
                } else {
                    format!(
                        "    [WARN] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "✗".red(),
                        result.name,
                        result.message.red()
                    )
                } else {
                    format!(
                        "    [FAIL] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
        };
        println!("{line}");
    }

    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }

    println!();
}
