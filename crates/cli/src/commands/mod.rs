//! Subcommand implementations.

pub mod lookup;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database URL from `PRESSLY_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Option<SecretString> {
    std::env::var("PRESSLY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.is_empty())
        .map(SecretString::from)
}
