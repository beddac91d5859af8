// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Event Pipeline Daemon
//!
//! Composition root for the processor: loads configuration, builds the
//! schema catalog and the stack graph, starts the dispatcher, and runs
//! until a shutdown signal arrives.
//!
//! ```text
//! event_pipeline --config /etc/event-pipeline/config.toml [--debug] [--dry-run]
//! ```
//!
//! `--dry-run` validates configuration and stack construction, then exits
//! without starting the service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use event_pipeline::application::services::{Hooks, Processor, ProcessorOptions};
use event_pipeline::infrastructure::builder::{PluginRegistry, StackBuilder, StackBuilderOptions};
use event_pipeline::infrastructure::config::{stack_config, ProcessorConfig};
use event_pipeline::infrastructure::logging::init_tracing;
use event_pipeline::infrastructure::metrics::{MetricsObserver, MetricsService};
use event_pipeline::infrastructure::services::registry::ServiceRegistry;
use event_pipeline_bootstrap::{BootstrapLogger, ConsoleLogger, ShutdownCoordinator};
use event_pipeline_domain::{load_database, WorkerCount};

#[derive(Debug, Parser)]
#[command(name = "event_pipeline", about = "Security event processor", version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Check configuration and stack construction, then exit
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);
    let logger = ConsoleLogger::new();

    let config = ProcessorConfig::from_file(&args.config)
        .with_context(|| format!("loading configuration '{}'", args.config.display()))?;
    config.validate().context("validating configuration")?;

    // schema catalog
    let db = Arc::new(load_database(&config.event_db.files, &config.event_db.dirs).context("loading event database")?);
    logger.info("event database loaded");

    // stack graph
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

    if args.dry_run {
        println!("configuration seems ok");
        return Ok(());
    }

    builder.start().await.context("starting plugin services")?;

    // metrics over the hook system
    let metrics = Arc::new(MetricsService::new().context("creating metrics service")?);
    let mut hooks = Hooks::new();
    MetricsObserver::new(Arc::clone(&metrics)).register(&mut hooks);

    let mut options = ProcessorOptions::default().with_hooks(hooks);
    if let Some(workers) = config.processor.workers {
        options = options.with_workers(WorkerCount::new(workers).context("configuring workers")?);
    }
    if let Some(buffer_size) = config.processor.buffer_size {
        options = options.with_buffer_size(buffer_size);
    }

    let main_stack = builder
        .stack(&config.stack.main)
        .ok_or_else(|| anyhow::anyhow!("main stack '{}' not found", config.stack.main))?;
    let processor = Processor::new(main_stack, builder.all_stacks(), db, options);
    info!(main = %config.stack.main, stacks = builder.names().len(), "event pipeline started");

    // run until SIGINT/SIGTERM
    let coordinator = ShutdownCoordinator::default();
    coordinator.listen_for_signals();
    coordinator.token().cancelled().await;

    processor.close().await;
    builder.shutdown().await.context("shutting down plugin services")?;
    coordinator.complete_shutdown();
    logger.info("event pipeline finished");
    Ok(())
}
