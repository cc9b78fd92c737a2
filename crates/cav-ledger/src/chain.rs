//! The chain itself: append with proof-of-work, validation, lookup.
use cav_core::{CavError, LedgerConfig};
use tracing::{debug, info};

use crate::block::Block;
use crate::identity::verify_signature;
use crate::report::{RegistrationRecord, VerificationReport};

#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    difficulty: usize,
}

impl Ledger {
    /// New ledger holding only the genesis block.
    pub fn new(difficulty: usize) -> Self {
        Self {
            chain: vec![Block::genesis()],
            difficulty,
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.difficulty)
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn last(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Mine and append a block for `content_hash` signed by `public_key`.
    ///
    /// Each content hash may be registered once.
    pub fn append(
        &mut self,
        content_hash: &str,
        public_key: &str,
        signature: &str,
    ) -> Result<&Block, CavError> {
        if let Some(existing) = self.find(content_hash) {
            return Err(CavError::LedgerError(format!(
                "content {content_hash} already registered in block {}",
                existing.index
            )));
        }
        let previous = self
            .chain
            .last()
            .ok_or_else(|| CavError::LedgerError("ledger has no genesis block".to_string()))?;

        let mut block = Block::next(previous, content_hash, public_key, signature);
        block.mine(self.difficulty);
        self.validate_block(&block, previous)?;

        debug!(index = block.index, nonce = block.nonce, hash = %block.hash, "Mined block");
        info!(index = block.index, content_hash, "Appended block");
        self.chain.push(block);
        Ok(&self.chain[self.chain.len() - 1])
    }

    /// Checks `block` as the successor of `previous`.
    pub fn validate_block(&self, block: &Block, previous: &Block) -> Result<(), CavError> {
        let fail = |reason: String| Err(CavError::LedgerError(format!("block {}: {reason}", block.index)));

        if previous.index + 1 != block.index {
            return fail(format!("expected index {}", previous.index + 1));
        }
        if block.previous_hash != previous.hash {
            return fail("previous hash does not match".to_string());
        }
        if block.hash != block.calculate_hash() {
            return fail("stored hash does not match contents".to_string());
        }
        if !block.meets_difficulty(self.difficulty) {
            return fail(format!("hash lacks {} leading zeros", self.difficulty));
        }
        verify_signature(
            &block.creator_public_key,
            block.content_hash.as_bytes(),
            &block.signature,
        )
        .or_else(|e| fail(e.to_string()))
    }

    /// Genesis integrity plus every link in order.
    pub fn is_valid_chain(&self) -> bool {
        let Some(genesis) = self.chain.first() else {
            return false;
        };
        if !genesis.is_genesis() || genesis.hash != genesis.calculate_hash() {
            return false;
        }
        self.chain
            .windows(2)
            .all(|pair| self.validate_block(&pair[1], &pair[0]).is_ok())
    }

    /// First non-genesis block registering `content_hash`.
    pub fn find(&self, content_hash: &str) -> Option<&Block> {
        self.chain
            .iter()
            .skip(1)
            .find(|b| b.content_hash == content_hash)
    }

    pub fn verification_report(&self, content_hash: &str) -> VerificationReport {
        match self.find(content_hash) {
            Some(block) => VerificationReport::verified(RegistrationRecord::from(block)),
            None => VerificationReport::not_found(),
        }
    }
}
