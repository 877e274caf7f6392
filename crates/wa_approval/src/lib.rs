//! wa_approval — the script-approval signer/verifier (C11).
//!
//! Binds a signature to `(canonical_session_abs, sha256(content), session_id)`
//! under a per-session secret. Signing is a human UI step (the host IDE
//! extension calls `sign` after a developer approves a script in a dialog);
//! this crate only provides the primitive, never a self-serve path for the
//! agent to sign its own scripts.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("session secret must be non-empty")]
    EmptySecret,
    #[error("stored signature is not valid hex: {0}")]
    InvalidSignatureEncoding(#[from] hex::FromHexError),
}

/// Opaque per-session HMAC key. `Debug` never prints the key material.
#[derive(Clone)]
pub struct SessionSecret(Vec<u8>);

impl SessionSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ApprovalError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ApprovalError::EmptySecret);
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionSecret").field(&"<redacted>").finish()
    }
}

/// The bind payload's byte form: `canonical_session_abs || content_hash ||
/// session_id`, each segment taken as-is (no delimiter — each input is
/// already a fixed-shape, delimiter-free string: a canonical address, a
/// `sha256:<hex>` digest, and a session id).
fn bind_payload(script_session_abs: &str, content_hash: &str, session_id: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(script_session_abs.len() + content_hash.len() + session_id.len());
    payload.extend_from_slice(script_session_abs.as_bytes());
    payload.extend_from_slice(content_hash.as_bytes());
    payload.extend_from_slice(session_id.as_bytes());
    payload
}

/// Produce a hex-encoded HMAC-SHA256 signature over the bind payload. This
/// is the one function a human-approved signing flow calls; nothing in
/// this core invokes it on the agent's behalf.
pub fn sign(secret: &SessionSecret, script_session_abs: &str, content_hash: &str, session_id: &str) -> String {
    let payload = bind_payload(script_session_abs, content_hash, session_id);
    let mut mac = HmacSha256::new_from_slice(&secret.0).expect("HMAC accepts keys of any length");
    mac.update(&payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Recompute the bind payload and check it against a stored hex signature
/// in constant time. A malformed signature is a verification failure, not
/// an error — this function never raises.
pub fn verify(
    secret: &SessionSecret,
    script_session_abs: &str,
    content_hash: &str,
    session_id: &str,
    stored_signature_hex: &str,
) -> bool {
    let Ok(expected_bytes) = hex::decode(stored_signature_hex) else {
        return false;
    };
    let payload = bind_payload(script_session_abs, content_hash, session_id);
    let Ok(mut mac) = HmacSha256::new_from_slice(&secret.0) else {
        return false;
    };
    mac.update(&payload);
    mac.verify_slice(&expected_bytes).is_ok()
}

/// What the verifier needs from the opaque active-contract object (spec
/// §3: "an opaque object provided by the contract subsystem"). The
/// contract subsystem is out of scope; this trait is the seam it must
/// satisfy for `exec_signed` to be checkable.
pub trait SignedScriptContract {
    fn session_id(&self) -> &str;
    fn session_secret(&self) -> &SessionSecret;
    /// Hex-encoded HMAC stored on the contract at sign time, if any.
    fn stored_signature(&self) -> Option<&str>;
}

/// The `exec_signed` predicate's actual implementation -- the predicate
/// itself is a thin caller into this module. A contract with no stored
/// signature never verifies.
pub fn verify_contract<C: SignedScriptContract>(contract: &C, script_session_abs: &str, content_hash: &str) -> bool {
    match contract.stored_signature() {
        Some(sig) => verify(contract.session_secret(), script_session_abs, content_hash, contract.session_id(), sig),
        None => false,
    }
}

/// Convenience wrapper: hash file bytes the same way the signer and
/// verifier both expect (`sha256:<hex>`, via `wa_common`).
pub fn content_hash(file_bytes: &[u8]) -> String {
    wa_common::sha256_bytes(file_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestContract {
        session_id: String,
        secret: SessionSecret,
        stored_signature: Option<String>,
    }

    impl SignedScriptContract for TestContract {
        fn session_id(&self) -> &str {
            &self.session_id
        }
        fn session_secret(&self) -> &SessionSecret {
            &self.secret
        }
        fn stored_signature(&self) -> Option<&str> {
            self.stored_signature.as_deref()
        }
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let secret = SessionSecret::new(b"top-secret-session-key".to_vec()).unwrap();
        let sig = sign(&secret, "root:ck3raven_data/wip/build.sh", "sha256:abc123", "session-42");
        assert!(verify(&secret, "root:ck3raven_data/wip/build.sh", "sha256:abc123", "session-42", &sig));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let secret = SessionSecret::new(b"correct-key".to_vec()).unwrap();
        let other = SessionSecret::new(b"wrong-key".to_vec()).unwrap();
        let sig = sign(&secret, "root:ck3raven_data/wip/build.sh", "sha256:abc123", "session-42");
        assert!(!verify(&other, "root:ck3raven_data/wip/build.sh", "sha256:abc123", "session-42", &sig));
    }

    #[test]
    fn verify_rejects_tampered_content_hash() {
        let secret = SessionSecret::new(b"k".to_vec()).unwrap();
        let sig = sign(&secret, "root:ck3raven_data/wip/build.sh", "sha256:abc123", "session-42");
        assert!(!verify(&secret, "root:ck3raven_data/wip/build.sh", "sha256:deadbeef", "session-42", &sig));
    }

    #[test]
    fn verify_rejects_malformed_hex() {
        let secret = SessionSecret::new(b"k".to_vec()).unwrap();
        assert!(!verify(&secret, "root:repo/a", "sha256:abc", "s1", "not-hex-zz"));
    }

    #[test]
    fn empty_secret_is_rejected_at_construction() {
        assert!(matches!(SessionSecret::new(Vec::<u8>::new()), Err(ApprovalError::EmptySecret)));
    }

    #[test]
    fn verify_contract_with_no_stored_signature_always_fails() {
        let secret = SessionSecret::new(b"k".to_vec()).unwrap();
        let contract = TestContract { session_id: "s1".into(), secret, stored_signature: None };
        assert!(!verify_contract(&contract, "root:repo/a", "sha256:abc"));
    }

    #[test]
    fn verify_contract_checks_stored_signature_against_recomputed_payload() {
        let secret = SessionSecret::new(b"k".to_vec()).unwrap();
        let sig = sign(&secret, "root:repo/a", "sha256:abc", "s1");
        let contract = TestContract { session_id: "s1".into(), secret, stored_signature: Some(sig) };
        assert!(verify_contract(&contract, "root:repo/a", "sha256:abc"));
        assert!(!verify_contract(&contract, "root:repo/a", "sha256:different"));
    }

    #[test]
    fn debug_never_prints_secret_bytes() {
        let secret = SessionSecret::new(b"super-secret-value".to_vec()).unwrap();
        let shown = format!("{:?}", secret);
        assert!(!shown.contains("super-secret-value"));
    }

    #[test]
    fn content_hash_matches_wa_common_sha256() {
        assert_eq!(content_hash(b"hello"), wa_common::sha256_bytes(b"hello"));
    }
}
