// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Agora maintenance server binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use agora_server::{build_check_registry, build_scheduler, build_stores};
use agora_server_config::LoggingConfig;
use agora_server_services::{ServiceAuditSink, TracingAuditSink};

/// Agora server - background maintenance core for the Agora forum.
#[derive(Parser, Debug)]
#[command(
	name = "agora-server",
	about = "Agora forum maintenance server",
	version
)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/agora/server.toml)
	#[arg(long)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Load and validate configuration, then exit
	CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => agora_server_config::load_config_with_file(path)?,
		None => agora_server_config::load_config()?,
	};

	if let Some(Command::CheckConfig) = args.command {
		println!("configuration ok");
		return Ok(());
	}

	init_tracing(&config.logging);

	let pool = agora_server_db::create_pool(&config.database.url).await?;
	agora_server_db::ensure_schema(&pool).await?;

	let stores = build_stores(&pool);
	let audit: Arc<dyn ServiceAuditSink> = Arc::new(TracingAuditSink);

	let scheduler = build_scheduler(&stores, &config.jobs, audit);
	scheduler
		.start(Duration::from_secs(config.jobs.tick_interval_secs))
		.await?;

	let registry = build_check_registry(&pool, &stores, &config.checks, &config.jobs);
	let sweep_interval = Duration::from_secs(config.checks.sweep_interval_secs);
	let sweep = tokio::spawn(async move {
		let mut interval = tokio::time::interval(sweep_interval);
		loop {
			interval.tick().await;
			let report = registry.run_all().await;
			for problem in report.problems() {
				tracing::warn!(
					check_id = %problem.check_id,
					priority = problem.priority.as_str(),
					"problem check reported an issue"
				);
			}
			tracing::info!(
				status = ?report.status,
				checks = report.reports.len(),
				"problem check sweep completed"
			);
		}
	});

	tracing::info!("agora-server started");
	tokio::signal::ctrl_c().await?;
	tracing::info!("shutting down");

	sweep.abort();
	scheduler.shutdown().await;

	Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

	if logging.json {
		tracing_subscriber::fmt()
			.json()
			.with_env_filter(filter)
			.init();
	} else {
		tracing_subscriber::fmt().with_env_filter(filter).init();
	}
}
