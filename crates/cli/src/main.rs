//! Tellerbank CLI - teller console with directory login and audit trail
//!
//! Usage:
//! ```bash
//! tellerbank --directory data/directory.json            # interactive teller session
//! tellerbank audit --from 2026-01-01 --outcome fail
//! tellerbank audit --account 0b7e4f7e-3f0a-4c8e-9a51-0d3c2f1b9a10 --kind lodgement,withdrawal
//! echo 's3cret' | tellerbank hash-secret --username jdoe --group "Bank Teller"
//! tellerbank generate-key
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod console;
mod menu;

use commands::{audit, run, secret};

/// Tellerbank - single-teller console banking with audited transactions
#[derive(Parser)]
#[command(name = "tellerbank")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(long, env = "TELLERBANK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Audit trail directory
    #[arg(long, env = "TELLERBANK_AUDIT_DIR", default_value = "data/audit", global = true)]
    pub audit_dir: PathBuf,

    /// Directory file with tellers and administrators
    #[arg(
        long,
        env = "TELLERBANK_DIRECTORY",
        default_value = "data/directory.json",
        global = true
    )]
    pub directory: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive teller session (default)
    Run,

    /// Show audit records
    Audit {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Account number
        #[arg(long)]
        account: Option<String>,
        /// Teller (or username for login records)
        #[arg(long)]
        teller: Option<String>,
        /// Transaction kinds (comma-separated, e.g. lodgement,withdrawal)
        #[arg(long, value_delimiter = ',')]
        kind: Option<Vec<String>>,
        /// Outcome filter
        #[arg(long)]
        outcome: Option<OutcomeArg>,
        /// Hide authentication records
        #[arg(long)]
        transactions_only: bool,
    },

    /// Hash a secret read from stdin for the directory file
    HashSecret {
        /// Print a full directory entry for this username
        #[arg(long)]
        username: Option<String>,
        /// Display name for the directory entry
        #[arg(long)]
        display_name: Option<String>,
        /// Group membership (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,
    },

    /// Generate a key for audit justification encryption
    GenerateKey,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutcomeArg {
    Success,
    Fail,
}

impl OutcomeArg {
    pub fn to_core(self) -> tellerbank_core::Outcome {
        match self {
            OutcomeArg::Success => tellerbank_core::Outcome::Success,
            OutcomeArg::Fail => tellerbank_core::Outcome::Fail,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing on stderr, stdout belongs to the console
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            run::run(cli.config.as_deref(), &cli.audit_dir, &cli.directory)?;
        }

        Commands::Audit {
            from,
            to,
            account,
            teller,
            kind,
            outcome,
            transactions_only,
        } => {
            let query = audit::AuditQuery {
                from,
                to,
                account,
                teller,
                kinds: kind,
                outcome,
                transactions_only,
            };
            audit::run_audit(cli.config.as_deref(), &cli.audit_dir, query)?;
        }

        Commands::HashSecret {
            username,
            display_name,
            groups,
        } => {
            secret::hash(username.as_deref(), display_name.as_deref(), &groups)?;
        }

        Commands::GenerateKey => {
            let config = tellerbank_business::BankConfig::load(cli.config.as_deref())?;
            secret::generate_key(&config.encryption_key_env);
        }
    }

    Ok(())
}
