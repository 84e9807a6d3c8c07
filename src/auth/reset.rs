use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

/// How long an issued code stays redeemable.
pub const CODE_TTL: Duration = Duration::from_secs(15 * 60);
/// Wrong guesses allowed before the code is burned.
pub const MAX_ATTEMPTS: u32 = 5;

struct PendingCode {
    code: String,
    issued_at: Instant,
    failures: u32,
}

/// Pending one-time password-reset codes, keyed by lower-cased email.
#[derive(Default)]
pub struct ResetCodes {
    codes: Mutex<HashMap<String, PendingCode>>,
}

impl ResetCodes {
    /// Issues a fresh 4-digit code, replacing any earlier one for `email`.
    pub async fn issue(&self, email: &str) -> String {
        let code = rand::thread_rng().gen_range(1000..10000).to_string();
        self.codes.lock().await.insert(
            email.to_lowercase(),
            PendingCode {
                code: code.clone(),
                issued_at: Instant::now(),
                failures: 0,
            },
        );
        code
    }

    /// Consumes the code on success. Expired codes and codes that reached
    /// `MAX_ATTEMPTS` wrong guesses are dropped and never match again.
    pub async fn redeem(&self, email: &str, code: &str) -> bool {
        let mut codes = self.codes.lock().await;
        let key = email.to_lowercase();
        let Some(pending) = codes.get_mut(&key) else {
            return false;
        };

        if pending.issued_at.elapsed() > CODE_TTL {
            codes.remove(&key);
            warn!(email = %key, "reset code expired");
            return false;
        }
        if pending.code == code.trim() {
            codes.remove(&key);
            return true;
        }

        pending.failures += 1;
        if pending.failures >= MAX_ATTEMPTS {
            codes.remove(&key);
            warn!(email = %key, "reset code burned after repeated failures");
        }
        false
    }
}
