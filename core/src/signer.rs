//! Selective signing and verification of report fields.
//!
//! The canonical byte sequence is `path=value;` for every signed field,
//! in the recorded order. Values use their canonical string forms
//! (decimals keep their scale, dates are ISO-8601). The sequence is
//! signed with RSA-PSS over SHA-256.
//!
//! Verification rebuilds the sequence from the paths stored in the
//! signature itself. A tampered value, corrupted signature, or wrong key
//! yields `Ok(false)`; only input the verifier cannot interpret at all
//! (unknown key id, undecodable base64, a stored path the schema no
//! longer resolves) is an error.

use crate::error::{ReportError, ReportResult};
use crate::keys::KeyProvider;
use crate::report::{CreditScoreReport, ReportSignature};
use crate::signed_fields::{accessor_for, select_present_fields};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use sha2::Sha256;

/// Sign the report fields currently present from the candidate list.
///
/// Unavailable or invalid key material is fatal; a report cannot be
/// produced without a valid signature.
pub fn sign<K: KeyProvider>(
    report: &CreditScoreReport,
    keys: &K,
) -> ReportResult<ReportSignature> {
    let signed_field_paths = select_present_fields(report);
    let canonical = canonical_sequence(report, &signed_field_paths)?;

    let (private_key, key_id) = keys.current_signing_key()?;
    let signing_key = BlindedSigningKey::<Sha256>::new(private_key);
    let signature = signing_key.sign_with_rng(&mut rand::thread_rng(), canonical.as_bytes());

    Ok(ReportSignature {
        signature: BASE64.encode(signature.to_vec()),
        key_id,
        signed_field_paths,
    })
}

/// Check a report against its stored signature.
pub fn verify<K: KeyProvider>(
    report: &CreditScoreReport,
    signature: &ReportSignature,
    keys: &K,
) -> ReportResult<bool> {
    let public_key = keys.public_key(signature.key_id)?;

    let canonical = canonical_sequence(report, &signature.signed_field_paths)?;

    let raw = BASE64
        .decode(&signature.signature)
        .map_err(|e| ReportError::MalformedSignature(format!("signature is not base64: {e}")))?;
    let decoded = Signature::try_from(raw.as_slice())
        .map_err(|e| ReportError::MalformedSignature(format!("bad signature bytes: {e}")))?;

    let verifying_key = VerifyingKey::<Sha256>::new(public_key);
    let valid = verifying_key
        .verify(canonical.as_bytes(), &decoded)
        .is_ok();

    if !valid {
        log::warn!(
            "report signature verification failed for user {} (key id {})",
            report.user_id,
            signature.key_id
        );
    }

    Ok(valid)
}

fn canonical_sequence(report: &CreditScoreReport, paths: &[String]) -> ReportResult<String> {
    let mut out = String::new();
    for path in paths {
        let accessor =
            accessor_for(path).ok_or_else(|| ReportError::UnknownSignedField {
                path: path.clone(),
            })?;
        let value = accessor(report).ok_or_else(|| ReportError::MissingSignedField {
            path: path.clone(),
        })?;
        out.push_str(path);
        out.push('=');
        out.push_str(&value);
        out.push(';');
    }
    Ok(out)
}
