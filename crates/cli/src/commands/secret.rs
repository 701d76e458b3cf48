//! Provisioning helpers: directory password hashes and audit encryption keys

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead};
use tellerbank_persistence::{hash_secret, DirectoryUser, FieldCipher};

/// Read a secret from stdin and print its argon2 hash.
///
/// With `username`, prints a ready-to-paste directory entry instead.
pub fn hash(username: Option<&str>, display_name: Option<&str>, groups: &[String]) -> Result<()> {
    let mut secret = String::new();
    io::stdin()
        .lock()
        .read_line(&mut secret)
        .context("Failed to read secret from stdin")?;
    let secret = secret.trim_end_matches(['\r', '\n']);
    if secret.is_empty() {
        bail!("secret cannot be empty");
    }

    println!("{}", render(secret, username, display_name, groups)?);
    Ok(())
}

fn render(
    secret: &str,
    username: Option<&str>,
    display_name: Option<&str>,
    groups: &[String],
) -> Result<String> {
    let Some(username) = username else {
        return Ok(hash_secret(secret)?);
    };

    let mut user = DirectoryUser::new(username, secret)?;
    if let Some(name) = display_name {
        user = user.with_display_name(name);
    }
    for group in groups {
        user = user.with_group(group);
    }
    Ok(serde_json::to_string_pretty(&user)?)
}

/// Print a fresh hex key for the audit encryption variable
pub fn generate_key(env_var: &str) {
    println!("{}={}", env_var, FieldCipher::generate_key_hex());
}
