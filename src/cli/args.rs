use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dataset-archiver")]
#[command(about = "Archive current-hour datasets and purge expired files and rows")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one archive job: archive the current snapshot, then purge expired data
    Process {
        #[arg(short, long, help = "Newly arrived dataset file")]
        input_path: PathBuf,

        #[arg(short, long, help = "Root of the per-region dataset tree")]
        data_dir: PathBuf,
    },

    /// List files in a directory that fall outside the retention window
    Scan {
        #[arg(short, long, help = "Directory of <region>_<YYYYMMDD>T<HHMM>Z files")]
        dir: PathBuf,

        #[arg(long, help = "Evaluate at this RFC 3339 instant [default: now]")]
        at: Option<DateTime<Utc>>,

        #[arg(long, default_value = "false", help = "Delete the listed files")]
        delete: bool,
    },

    /// Show how a filename is parsed and whether it would be archived
    Inspect {
        filename: String,

        #[arg(long, help = "Evaluate at this RFC 3339 instant [default: now]")]
        at: Option<DateTime<Utc>>,
    },
}
