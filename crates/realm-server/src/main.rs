// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Realm server maintenance binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use realm_server::AuditRetentionJob;
use realm_server_config::{ServerConfig, MAX_RETENTION_DAYS};
use realm_server_db::{create_pool, run_migrations, AuditRepository};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Realm server - user import and audit maintenance.
#[derive(Parser, Debug)]
#[command(name = "realm-server", about = "Realm server maintenance commands", version)]
struct Args {
	/// Path to a TOML config file. Defaults to /etc/realm/server.toml.
	#[arg(long, env = "REALM_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Apply embedded database migrations
	Migrate,

	/// Delete audit entries older than the retention period, once
	PurgeAudit {
		/// Override the configured retention in days
		#[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_RETENTION_DAYS))]
		max_age_days: Option<i64>,
	},

	/// Run the periodic audit purge until interrupted
	Retention,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => realm_server_config::load_config_with_file(path.clone()),
		None => realm_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(database = %config.database.url, command = ?args.command, "starting realm-server");

	let pool = create_pool(&config.database.url)
		.await
		.with_context(|| format!("failed to open database {}", config.database.url))?;
	run_migrations(&pool)
		.await
		.context("failed to run migrations")?;

	match args.command {
		Command::Migrate => {
			tracing::info!("migrations applied");
		}
		Command::PurgeAudit { max_age_days } => {
			let days = max_age_days.unwrap_or(config.audit.retention_days);
			let job = AuditRetentionJob::new(Arc::new(AuditRepository::new(pool)), days);
			let deleted = job.run_once().await.context("audit purge failed")?;
			println!("deleted {deleted} audit entries older than {days} days");
		}
		Command::Retention => run_retention(&config, pool).await?,
	}

	Ok(())
}

async fn run_retention(config: &ServerConfig, pool: sqlx::SqlitePool) -> anyhow::Result<()> {
	if !config.audit.retention_enabled {
		tracing::warn!("audit retention is disabled in configuration; nothing to do");
		return Ok(());
	}

	let job = Arc::new(AuditRetentionJob::new(
		Arc::new(AuditRepository::new(pool)),
		config.audit.retention_days,
	));
	let shutdown = CancellationToken::new();
	let handle = job.spawn(
		Duration::from_secs(config.audit.purge_interval_secs),
		shutdown.clone(),
	);

	tokio::signal::ctrl_c()
		.await
		.context("failed to listen for ctrl-c")?;
	tracing::info!("shutdown signal received");

	shutdown.cancel();
	handle.await.context("retention task panicked")?;
	Ok(())
}
