//! Signed resume-correlation tokens.
//!
//! A test that suspends for an external redirect embeds a token in the
//! redirect URL (conventionally as the OAuth `state` parameter). The
//! callback handler verifies the token before invoking `resume`, which is
//! what ties an anonymous inbound redirect back to the suspended sequence
//! result. Tokens are detached Ed25519 signatures over a SHA-256 digest of
//! the payload, base64url-transported.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL;
use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Errors from token verification.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed resume token")]
    Malformed,

    #[error("resume token signature verification failed")]
    BadSignature,
}

/// The claims carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeClaims {
    pub result_id: String,
    pub endpoint: String,
}

/// Signs and verifies resume-correlation tokens. One signer lives for the
/// process lifetime; tokens do not survive key rotation, which is fine
/// because a suspended run can simply be started over.
pub struct TokenSigner {
    signing_key: SigningKey,
}

impl TokenSigner {
    /// Generate a fresh signing key.
    pub fn generate() -> TokenSigner {
        TokenSigner {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: [u8; 32]) -> TokenSigner {
        TokenSigner {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Produce a token binding a sequence-result id to a wait endpoint.
    pub fn sign(&self, result_id: &str, endpoint: &str) -> String {
        let nonce: u64 = rand::random();
        let payload = format!("{}|{}|{:016x}", result_id, endpoint, nonce);
        let digest = Sha256::digest(payload.as_bytes());
        let signature = self.signing_key.sign(&digest);
        format!(
            "{}.{}",
            BASE64URL.encode(payload.as_bytes()),
            BASE64URL.encode(signature.to_bytes())
        )
    }

    /// Verify a token and extract its claims.
    pub fn verify(&self, token: &str) -> Result<ResumeClaims, TokenError> {
        let (payload_b64, signature_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let payload = BASE64URL
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        let signature_bytes: [u8; 64] = BASE64URL
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?
            .try_into()
            .map_err(|_| TokenError::Malformed)?;
        let signature = Signature::from_bytes(&signature_bytes);

        let digest = Sha256::digest(&payload);
        self.signing_key
            .verifying_key()
            .verify(&digest, &signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = String::from_utf8(payload).map_err(|_| TokenError::Malformed)?;
        let mut parts = payload.split('|');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(result_id), Some(endpoint), Some(_nonce)) => Ok(ResumeClaims {
                result_id: result_id.to_string(),
                endpoint: endpoint.to_string(),
            }),
            _ => Err(TokenError::Malformed),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
