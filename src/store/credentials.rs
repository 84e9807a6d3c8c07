use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use tracing::{error, warn};

/// How passwords are written to the users snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordScheme {
    #[default]
    Argon2,
    /// Raw text. Only for local fixtures.
    Plain,
}

impl PasswordScheme {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2" => Ok(Self::Argon2),
            "plain" => Ok(Self::Plain),
            other => anyhow::bail!("unknown password scheme: {other}"),
        }
    }

    pub fn seal(self, plain: &str) -> anyhow::Result<String> {
        match self {
            Self::Plain => Ok(plain.to_string()),
            Self::Argon2 => hash_password(plain),
        }
    }
}

fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Compares a supplied password with the stored value, whichever scheme
/// wrote it.
pub fn password_matches(stored: &str, supplied: &str) -> bool {
    if stored.starts_with("$argon2") {
        return match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(supplied.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!(error = %e, "stored argon2 hash is malformed");
                false
            }
        };
    }
    stored == supplied
}
