//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{DEFAULT_ETL_SOURCE, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT};
use crate::etl::SourceFormat;

/// Triqueta activities backend: API server, ETL worker and maintenance tasks
#[derive(Parser, Debug)]
#[command(name = "triqueta")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging for this crate and the ORM
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Background work: ETL worker and popularity recalculation
    Jobs(JobsArgs),

    /// Run ETL batches from the command line
    Etl(EtlArgs),
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_SERVER_HOST, env = "SERVER_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_SERVER_PORT, env = "SERVER_PORT")]
    pub port: u16,
}

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Drop everything and re-run all migrations
    Fresh,
}

#[derive(Parser, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub action: JobsAction,
}

#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// Process queued ETL batches until interrupted
    Work,
    /// Recalculate popularity once and exit
    Popularity,
}

#[derive(Parser, Debug)]
pub struct EtlArgs {
    #[command(subcommand)]
    pub action: EtlAction,
}

#[derive(Subcommand, Debug)]
pub enum EtlAction {
    /// Run one batch synchronously and print its report
    Run {
        /// CSV or JSON file to ingest
        #[arg(short, long)]
        file: PathBuf,

        /// Payload format; inferred from the file extension when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Source label stamped on loaded activities
        #[arg(short, long, default_value = DEFAULT_ETL_SOURCE)]
        source: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for SourceFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => SourceFormat::Csv,
            FormatArg::Json => SourceFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_etl_run() {
        let cli = Cli::parse_from([
            "triqueta", "etl", "run", "--file", "eventos.csv", "--format", "json",
        ]);
        let Commands::Etl(EtlArgs {
            action: EtlAction::Run { file, format, source },
        }) = cli.command
        else {
            panic!("expected etl run");
        };

        assert_eq!(file, PathBuf::from("eventos.csv"));
        assert_eq!(format, Some(FormatArg::Json));
        assert_eq!(source, DEFAULT_ETL_SOURCE);
    }

    #[test]
    fn parses_popularity_job() {
        let cli = Cli::parse_from(["triqueta", "-v", "jobs", "popularity"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Jobs(JobsArgs {
                action: JobsAction::Popularity
            })
        ));
    }
}
