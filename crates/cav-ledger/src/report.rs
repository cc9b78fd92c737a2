//! Provenance reports answered from the ledger
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::Block;

pub const VERIFIED_CONFIDENCE: f64 = 0.95;
pub const NOT_FOUND_CONFIDENCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Verified,
    NotFound,
}

/// The block that first registered a piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub content_hash: String,
    pub creator_public_key: String,
    pub signature: String,
    pub block_hash: String,
}

impl From<&Block> for RegistrationRecord {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            timestamp: block.timestamp,
            content_hash: block.content_hash.clone(),
            creator_public_key: block.creator_public_key.clone(),
            signature: block.signature.clone(),
            block_hash: block.hash.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub status: ReportStatus,
    pub confidence: f64,
    pub message: String,
    pub is_original: bool,
    pub first_seen: Option<DateTime<Utc>>,
    pub registration: Option<RegistrationRecord>,
}

impl VerificationReport {
    pub fn verified(record: RegistrationRecord) -> Self {
        Self {
            status: ReportStatus::Verified,
            confidence: VERIFIED_CONFIDENCE,
            message: "Content registered in ledger".to_string(),
            is_original: true,
            first_seen: Some(record.timestamp),
            registration: Some(record),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: ReportStatus::NotFound,
            confidence: NOT_FOUND_CONFIDENCE,
            message: "Content not found in ledger".to_string(),
            is_original: false,
            first_seen: None,
            registration: None,
        }
    }
}
