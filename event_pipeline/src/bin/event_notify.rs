// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Event Notify Tool
//!
//! Producer tool: reads a JSON array of events from stdin or a file, fills
//! in missing source identity and creation timestamps, and notifies each
//! event into a pipeline built from the given configuration. Accepted ids
//! print to stdout, one per line.
//!
//! ```text
//! event_notify --config config.toml < events.json
//! event_notify --config config.toml -f events.json
//! ```
//!
//! Exit code 0 on success; non-zero on the first error.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::error;

use event_pipeline::application::services::{Processor, ProcessorOptions};
use event_pipeline::infrastructure::builder::{PluginRegistry, StackBuilder, StackBuilderOptions};
use event_pipeline::infrastructure::config::{stack_config, ProcessorConfig};
use event_pipeline::infrastructure::logging::init_tracing;
use event_pipeline::infrastructure::services::registry::ServiceRegistry;
use event_pipeline_domain::{load_database, Event, EventSource};

#[derive(Debug, Parser)]
#[command(name = "event_notify", about = "Notify events into the pipeline", version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: PathBuf,

    /// Read events from this file instead of stdin
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.debug);
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let events = read_events(args.file.as_deref())?;

    let config = ProcessorConfig::from_file(&args.config)
        .with_context(|| format!("loading configuration '{}'", args.config.display()))?;
    config.validate().context("validating configuration")?;

    let db = Arc::new(load_database(&config.event_db.files, &config.event_db.dirs).context("loading event database")?);
    let mut builder = StackBuilder::new(
        Arc::new(ServiceRegistry::new()),
        Arc::new(PluginRegistry::standard()),
        StackBuilderOptions {
            certs_dir: config.paths.certs_dir.clone(),
            data_dir: config.paths.data_dir.clone(),
            cache_dir: config.paths.cache_dir.clone(),
        },
    );
    let mut stack_defs = Vec::new();
    for file in &config.stack.files {
        stack_defs.extend(stack_config::defs_from_file(file)?);
    }
    for dir in &config.stack.dirs {
        stack_defs.extend(stack_config::defs_from_dir(dir)?);
    }
    builder.build_all(&stack_defs).context("building stacks")?;
    builder
        .validate(&config.stack.main)
        .context("validating stack graph")?;
    builder.start().await.context("starting plugin services")?;

    let main_stack = builder
        .stack(&config.stack.main)
        .ok_or_else(|| anyhow::anyhow!("main stack '{}' not found", config.stack.main))?;
    let processor = Processor::new(main_stack, builder.all_stacks(), db, ProcessorOptions::default());

    let default_source = EventSource::default_source();
    let mut failure = Ok(());
    for mut event in events {
        if event.source.is_unset() {
            event.source = default_source.clone();
        }
        if event.created.is_none() {
            event.created = Some(Utc::now());
        }
        match processor.notify_event(None, event).await {
            Ok(id) => println!("{}", id),
            Err(err) => {
                failure = Err(anyhow::anyhow!(err).context("notify event"));
                break;
            }
        }
    }

    processor.close().await;
    builder.shutdown().await.context("shutting down plugin services")?;
    failure
}

fn read_events(file: Option<&std::path::Path>) -> anyhow::Result<Vec<Event>> {
    let text = match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("opening file '{}'", path.display()))?
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading event data from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&text).context("unmarshalling events")
}
