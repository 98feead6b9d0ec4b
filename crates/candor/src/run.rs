// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `candor run` command implementation.
//!
//! Reads a conversation (JSON array of `{role, content}` turns) from a file
//! or stdin, runs the refusal guard over it, streams status events to
//! stderr, and prints the final reply to stdout.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use candor_config::CandorConfig;
use candor_core::{CandorError, Conversation, StatusPhase};
use candor_guard::{ChannelSink, RefusalGuard};
use candor_ollama::OllamaHost;
use colored::Colorize;

pub async fn run_guard(
    config: &CandorConfig,
    primary_model: &str,
    generate: bool,
    file: Option<&Path>,
) -> Result<(), CandorError> {
    let conversation = read_conversation(file)?;
    // Kept aside so the user still gets an answer if the swap goes fatally
    // wrong after the reply was already produced.
    let original_reply = conversation
        .final_assistant()
        .map(|turn| turn.content.clone());

    let host = Arc::new(OllamaHost::from_config(&config.host)?);
    let (sink, mut events) = ChannelSink::new();
    let guard = RefusalGuard::new(host, Arc::new(sink), &config.guard);

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let line = format!("[{}] {}", event.phase, event.message);
            match event.phase {
                StatusPhase::Warning | StatusPhase::Error => eprintln!("{}", line.yellow()),
                _ => eprintln!("{}", line.dimmed()),
            }
        }
    });

    let result = if generate {
        guard.generate_and_process(conversation, primary_model).await
    } else {
        guard.process(conversation, primary_model).await
    };

    // Dropping the guard drops the sink's sender, letting the printer drain
    // the remaining events and exit.
    drop(guard);
    let _ = printer.await;

    match result {
        Ok(reply) => {
            println!("{}", reply.text);
            Ok(())
        }
        Err(err) => {
            // Never leave the user with nothing: surface the reply we had.
            if let Some(text) = original_reply {
                println!("{text}");
            }
            eprintln!(
                "{}",
                format!("The fallback could not be completed: {err}").red()
            );
            Err(err)
        }
    }
}

/// Reads the conversation JSON from a file, or stdin when no path is given.
fn read_conversation(file: Option<&Path>) -> Result<Conversation, CandorError> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            CandorError::Config(format!("failed to read {}: {e}", path.display()))
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| CandorError::Config(format!("failed to read stdin: {e}")))?;
            buf
        }
    };

    serde_json::from_str(&raw)
        .map_err(|e| CandorError::Config(format!("invalid conversation JSON: {e}")))
}
