//! Key-provider capability consumed by the signer.
//!
//! Key storage and rotation policy live elsewhere; the core only needs
//! "the current signing key" and "the public key for a given key id".
//! Public keys are archived in the store in DER (SPKI) form so a report
//! signed under a rotated-out key can still be verified.

use crate::error::{ReportError, ReportResult};
use crate::store::ReportStore;
use crate::types::KeyId;
use chrono::{DateTime, Utc};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::collections::HashMap;
use uuid::Uuid;

pub const SIGNING_KEY_BITS: usize = 2048;

pub trait KeyProvider {
    /// The key reports are signed with right now, plus its id.
    fn current_signing_key(&self) -> ReportResult<(RsaPrivateKey, KeyId)>;

    /// The public key a given signature was made under.
    fn public_key(&self, key_id: KeyId) -> ReportResult<RsaPublicKey>;
}

/// In-memory key provider: one live signing key plus the archive of
/// every public key that ever signed a report.
pub struct KeyRing {
    current: RsaPrivateKey,
    current_key_id: KeyId,
    archived: HashMap<KeyId, RsaPublicKey>,
}

impl KeyRing {
    pub fn new(private_key: RsaPrivateKey, key_id: KeyId) -> Self {
        let mut archived = HashMap::new();
        archived.insert(key_id, RsaPublicKey::from(&private_key));
        Self {
            current: private_key,
            current_key_id: key_id,
            archived,
        }
    }

    /// Generate a fresh RSA signing key with a random key id.
    pub fn generate() -> ReportResult<Self> {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), SIGNING_KEY_BITS)
            .map_err(|e| ReportError::Signing(format!("key generation failed: {e}")))?;
        Ok(Self::new(private_key, Uuid::new_v4()))
    }

    pub fn current_key_id(&self) -> KeyId {
        self.current_key_id
    }

    pub fn current_public_key(&self) -> RsaPublicKey {
        RsaPublicKey::from(&self.current)
    }

    /// Add a rotated-out public key to the archive.
    pub fn register_public_key(&mut self, key_id: KeyId, public_key: RsaPublicKey) {
        self.archived.insert(key_id, public_key);
    }

    pub fn public_key_der(&self, key_id: KeyId) -> ReportResult<Vec<u8>> {
        let key = self
            .archived
            .get(&key_id)
            .ok_or(ReportError::UnknownKey { key_id })?;
        encode_public_key_der(key)
    }

    /// Load every archived public key persisted in the store.
    pub fn load_archive(&mut self, store: &ReportStore) -> ReportResult<()> {
        for (key_id, der) in store.public_keys()? {
            let key = decode_public_key_der(&der)?;
            self.archived.insert(key_id, key);
        }
        Ok(())
    }

    /// Persist the current public key, cross-checking an existing row.
    ///
    /// A stored key that differs from the live key under the same id is
    /// a security-relevant inconsistency and is logged, not repaired.
    pub fn sync_archive(&self, store: &ReportStore, now: DateTime<Utc>) -> ReportResult<()> {
        let der = encode_public_key_der(&self.current_public_key())?;
        match store.public_key_der(self.current_key_id)? {
            Some(stored) if stored != der => {
                log::error!(
                    "stored public key for key id {} does not match the live key",
                    self.current_key_id
                );
            }
            Some(_) => {}
            None => {
                store.insert_public_key(self.current_key_id, &der, now)?;
                log::info!("archived new public key with key id {}", self.current_key_id);
            }
        }
        Ok(())
    }
}

impl<K: KeyProvider + ?Sized> KeyProvider for &K {
    fn current_signing_key(&self) -> ReportResult<(RsaPrivateKey, KeyId)> {
        (**self).current_signing_key()
    }

    fn public_key(&self, key_id: KeyId) -> ReportResult<RsaPublicKey> {
        (**self).public_key(key_id)
    }
}

impl KeyProvider for KeyRing {
    fn current_signing_key(&self) -> ReportResult<(RsaPrivateKey, KeyId)> {
        Ok((self.current.clone(), self.current_key_id))
    }

    fn public_key(&self, key_id: KeyId) -> ReportResult<RsaPublicKey> {
        self.archived
            .get(&key_id)
            .cloned()
            .ok_or(ReportError::UnknownKey { key_id })
    }
}

pub fn encode_public_key_der(key: &RsaPublicKey) -> ReportResult<Vec<u8>> {
    Ok(key
        .to_public_key_der()
        .map_err(|e| ReportError::Signing(format!("public key encoding failed: {e}")))?
        .as_bytes()
        .to_vec())
}

pub fn decode_public_key_der(der: &[u8]) -> ReportResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(der)
        .map_err(|e| ReportError::CorruptRecord(format!("public key deserialization failed: {e}")))
}
