//! Interactive teller console

use anyhow::{bail, Context, Result};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tellerbank_business::{BankConfig, ServiceContext};
use tellerbank_persistence::{DirectoryFile, FieldCipher, JsonlAuditSink};
use tracing::{info, warn};

use crate::console::Console;
use crate::menu::{run_session, SessionEnd};

/// Wire the collaborators and run one teller session on stdin/stdout
pub fn run(config_path: Option<&Path>, audit_dir: &Path, directory_path: &Path) -> Result<()> {
    let config = BankConfig::load(config_path).context("Failed to load configuration")?;

    let mut audit = JsonlAuditSink::new(audit_dir)
        .with_context(|| format!("Failed to open audit directory {}", audit_dir.display()))?;
    match FieldCipher::from_env(&config.encryption_key_env)
        .with_context(|| format!("Invalid key in {}", config.encryption_key_env))?
    {
        Some(cipher) => audit = audit.with_cipher(cipher),
        None => warn!(
            env = %config.encryption_key_env,
            "no audit encryption key set, justifications stored in plaintext"
        ),
    }

    let directory = DirectoryFile::load(directory_path).with_context(|| {
        format!("Failed to load directory file {}", directory_path.display())
    })?;

    let mut ctx = ServiceContext::new(Arc::new(audit), Arc::new(directory), config);
    info!(audit_dir = %audit_dir.display(), "teller console started");

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());

    match run_session(&mut ctx, &mut console).context("Console session failed")? {
        SessionEnd::Refused => bail!("authentication failed"),
        SessionEnd::Completed { accounts } => {
            console.say(format!("Session ended. {} account(s) held in memory.", accounts))?;
            Ok(())
        }
    }
}
