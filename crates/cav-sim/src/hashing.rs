//! Content hashes in `0x` + 64 lowercase hex form.
use cav_core::HashMode;
use rand::Rng;

/// Hash for `content` under `mode`.
///
/// `Digest` is stable for a given content reference; `Random` draws 32 bytes.
pub fn content_hash<R: Rng + ?Sized>(mode: HashMode, content: &str, rng: &mut R) -> String {
    match mode {
        HashMode::Digest => format!("0x{}", blake3::hash(content.as_bytes()).to_hex()),
        HashMode::Random => random_hash(rng),
    }
}

pub(crate) fn random_hash<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 32] = rng.gen();
    format!("0x{}", hex::encode(bytes))
}
