//! Creator identities: ed25519 key pairs keyed by creator name
use std::collections::HashMap;

use cav_core::CavError;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

pub struct CreatorIdentity {
    name: String,
    signing_key: SigningKey,
}

impl CreatorIdentity {
    pub fn generate<R: Rng + ?Sized>(name: impl Into<String>, rng: &mut R) -> Self {
        let secret: [u8; 32] = rng.gen();
        Self::from_secret(name, &secret)
    }

    pub fn from_secret(name: impl Into<String>, secret: &[u8; 32]) -> Self {
        Self {
            name: name.into(),
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key().as_bytes())
    }

    /// blake3 of the public key, hex
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.verifying_key().as_bytes())
            .to_hex()
            .to_string()
    }

    /// Hex-encoded signature over `message`.
    pub fn sign(&self, message: &[u8]) -> String {
        hex::encode(self.signing_key.sign(message).to_bytes())
    }

    pub fn verify(&self, message: &[u8], signature_hex: &str) -> Result<(), CavError> {
        verify_signature(&self.public_key_hex(), message, signature_hex)
    }
}

impl std::fmt::Debug for CreatorIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("CreatorIdentity")
            .field("name", &self.name)
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

/// Check a hex ed25519 signature against a hex public key.
pub fn verify_signature(
    public_key_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<(), CavError> {
    let key: [u8; 32] = decode_fixed(public_key_hex, "public key")?;
    let signature: [u8; 64] = decode_fixed(signature_hex, "signature")?;

    let key = VerifyingKey::from_bytes(&key)
        .map_err(|e| CavError::LedgerError(format!("invalid public key: {e}")))?;
    key.verify(message, &Signature::from_bytes(&signature))
        .map_err(|_| CavError::LedgerError("signature does not verify".to_string()))
}

fn decode_fixed<const N: usize>(value: &str, what: &str) -> Result<[u8; N], CavError> {
    let bytes =
        hex::decode(value).map_err(|e| CavError::LedgerError(format!("{what} is not hex: {e}")))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        CavError::LedgerError(format!("{what} must be {N} bytes, got {}", b.len()))
    })
}

/// Creator name → identity, created on first use.
pub struct IdentityRegistry {
    identities: HashMap<String, CreatorIdentity>,
    rng: StdRng,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            identities: HashMap::new(),
            rng,
        }
    }

    /// The identity registered for `name`, generating one if needed.
    pub fn identity_for(&mut self, name: &str) -> &CreatorIdentity {
        let name = name.trim();
        let rng = &mut self.rng;
        self.identities.entry(name.to_string()).or_insert_with(|| {
            let identity = CreatorIdentity::generate(name, rng);
            info!(
                creator = name,
                fingerprint = %identity.fingerprint(),
                "Created creator identity"
            );
            identity
        })
    }

    pub fn get(&self, name: &str) -> Option<&CreatorIdentity> {
        self.identities.get(name.trim())
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
