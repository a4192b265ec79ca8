//! Webhook secret lookup and signature checks.
//!
//! The relay itself never verifies deliveries: it always passes [`NoSecret`].
//! Provider parsers still honour a resolver that does return a secret, so the
//! parsers can be reused where verification is wanted.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{WebhookEvent, WebhookParseError};

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;

/// Supplies the shared secret a delivery should be verified against.
pub trait SecretResolver: Send + Sync {
    /// Secret for the parsed `event`, or `None` to skip verification.
    fn secret(&self, event: &WebhookEvent) -> Option<String>;
}

/// Resolver that never returns a secret, disabling verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecret;

impl SecretResolver for NoSecret {
    fn secret(&self, _event: &WebhookEvent) -> Option<String> {
        None
    }
}

impl<F> SecretResolver for F
where
    F: Fn(&WebhookEvent) -> Option<String> + Send + Sync,
{
    fn secret(&self, event: &WebhookEvent) -> Option<String> {
        self(event)
    }
}

/// Check a hex encoded HMAC-SHA256 of `body`, optionally prefixed with `sha256=`.
pub(crate) fn verify_hmac_sha256(
    secret: &str,
    body: &[u8],
    signature: &str,
) -> Result<(), WebhookParseError> {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    let expected = hex::decode(signature).map_err(|_| WebhookParseError::SignatureMismatch)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookParseError::SignatureMismatch)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| WebhookParseError::SignatureMismatch)
}

/// Check a plain shared token, as sent by GitLab.
pub(crate) fn verify_token(secret: &str, token: &str) -> Result<(), WebhookParseError> {
    if secret.as_bytes() == token.as_bytes() {
        Ok(())
    } else {
        Err(WebhookParseError::SignatureMismatch)
    }
}

/// Run `check` against the resolved secret when `event` is present and a
/// non-empty secret exists for it.
pub(crate) fn authenticate<C>(
    event: Option<WebhookEvent>,
    secrets: &dyn SecretResolver,
    check: C,
) -> Result<Option<WebhookEvent>, WebhookParseError>
where
    C: FnOnce(&str) -> Result<(), WebhookParseError>,
{
    if let Some(event) = &event {
        if let Some(secret) = secrets.secret(event).filter(|s| !s.is_empty()) {
            check(&secret)?;
        }
    }
    Ok(event)
}
