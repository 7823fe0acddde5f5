use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::archive::ArchiveDecision;
use crate::cli::args::{Cli, Commands};
use crate::models::{DatasetFile, Job};
use crate::processors::{
    ArchivalOrchestrator, FileCleanup, FileRetentionScanner, RecordRetentionPurger,
};
use crate::settings::Settings;
use crate::utils::{truncate_to_hour, CUTOFF_FORMAT};
use crate::writers::PgRecordStore;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    info!(
        "Settings loaded: retention {}h, {} datatypes, worker queue {:?}",
        settings.retention_hours,
        settings.datatypes.len(),
        settings.worker_queue
    );

    match cli.command {
        Commands::Process {
            input_path,
            data_dir,
        } => {
            let store = PgRecordStore::new(settings.database.connect_options());
            let orchestrator = ArchivalOrchestrator::new(settings, store);

            let mut job = Job::new(vec![
                input_path.display().to_string(),
                data_dir.display().to_string(),
            ]);
            let result = orchestrator.handle_job(&mut job).await;

            println!("{}", serde_json::to_string_pretty(&job)?);
            let report = result.context("Archive job could not start")?;
            println!("\n{}", report.summary());
        }

        Commands::Scan { dir, at, delete } => {
            let current = truncate_to_hour(at.unwrap_or_else(Utc::now));
            let scanner = FileRetentionScanner::new(settings.retention()).with_dry_run(!delete);

            println!("Scanning {} at {}", dir.display(), current);
            println!(
                "Cutoff: {}",
                settings.retention().cutoff(current).format(CUTOFF_FORMAT)
            );

            match scanner.scan(&dir, current).await? {
                FileCleanup::Skipped => println!("Directory does not exist"),
                FileCleanup::Failed(e) => return Err(e.into()),
                FileCleanup::Scanned(report) => {
                    for name in &report.selected {
                        println!("  expired: {}", name);
                    }
                    for name in &report.unparseable {
                        println!("  skipped: {}", name);
                    }
                    if delete {
                        println!(
                            "Deleted {} of {} expired files",
                            report.deleted.len(),
                            report.selected.len()
                        );
                        for failure in &report.failures {
                            println!("  error: {}", failure);
                        }
                    } else {
                        println!("{} expired files (dry run)", report.selected.len());
                    }
                }
            }
        }

        Commands::Inspect { filename, at } => {
            let current = truncate_to_hour(at.unwrap_or_else(Utc::now));
            let dataset = DatasetFile::parse(&filename)?;
            let decision = ArchiveDecision::evaluate(&dataset, current);

            println!("Region: {}", dataset.region);
            println!("Dataset Hour: {}", dataset.timestamp);
            println!("Current Hour: {}", current);
            match &decision.archive_filename {
                Some(name) => println!("Archive: yes, as {}", name),
                None => println!("Archive: no"),
            }
            println!(
                "Expired: {}",
                settings.retention().is_expired(dataset.timestamp, current)
            );

            let purger = RecordRetentionPurger::new(settings.retention());
            for datatype in &settings.datatypes {
                match purger.plan(&dataset.region, datatype, current) {
                    Ok(plan) => println!("  {} [$1 = {}]", plan.statement(), plan.cutoff_literal()),
                    Err(e) => println!("  {}: {}", datatype.name, e),
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let initialized = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    initialized.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}
