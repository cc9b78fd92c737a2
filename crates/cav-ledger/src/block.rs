//! Ledger blocks and their hashing
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creator key and signature recorded in the genesis block.
pub const GENESIS_CREATOR: &str = "GENESIS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub content_hash: String,
    pub creator_public_key: String,
    pub signature: String,
    pub previous_hash: String,
    pub nonce: u64,
    /// Hex blake3 of every other field
    pub hash: String,
}

/// Everything the block hash covers, in a fixed field order.
#[derive(Serialize)]
struct Header<'a> {
    index: u64,
    timestamp: &'a DateTime<Utc>,
    content_hash: &'a str,
    creator_public_key: &'a str,
    signature: &'a str,
    previous_hash: &'a str,
    nonce: u64,
}

impl Block {
    pub fn genesis() -> Self {
        let mut block = Self {
            index: 0,
            timestamp: Utc::now(),
            content_hash: format!("0x{}", "0".repeat(64)),
            creator_public_key: GENESIS_CREATOR.to_string(),
            signature: GENESIS_CREATOR.to_string(),
            previous_hash: "0".to_string(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Unmined successor of `previous`.
    pub fn next(
        previous: &Block,
        content_hash: impl Into<String>,
        creator_public_key: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            index: previous.index + 1,
            timestamp: Utc::now(),
            content_hash: content_hash.into(),
            creator_public_key: creator_public_key.into(),
            signature: signature.into(),
            previous_hash: previous.hash.clone(),
            nonce: 0,
            hash: String::new(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.creator_public_key == GENESIS_CREATOR
    }

    pub fn calculate_hash(&self) -> String {
        let header = Header {
            index: self.index,
            timestamp: &self.timestamp,
            content_hash: &self.content_hash,
            creator_public_key: &self.creator_public_key,
            signature: &self.signature,
            previous_hash: &self.previous_hash,
            nonce: self.nonce,
        };
        let data = serde_json::to_vec(&header).unwrap_or_default();
        blake3::hash(&data).to_hex().to_string()
    }

    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        has_leading_zeros(&self.hash, difficulty)
    }

    /// Increment the nonce until the hash has `difficulty` leading zeros.
    pub fn mine(&mut self, difficulty: usize) {
        self.nonce = 0;
        self.hash = self.calculate_hash();
        while !has_leading_zeros(&self.hash, difficulty) {
            self.nonce += 1;
            self.hash = self.calculate_hash();
        }
    }
}

fn has_leading_zeros(hash: &str, n: usize) -> bool {
    hash.len() >= n && hash.bytes().take(n).all(|b| b == b'0')
}
