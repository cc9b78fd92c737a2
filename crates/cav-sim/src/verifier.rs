//! Simulated verification: authenticity score, flags, and detector signals.
use cav_core::{
    CavError, ConfidenceLevel, DetectionSignal, OperationContext, OperationInput, OperationKind,
    OperationResult, ResultProvider, SimulationConfig, VerificationResult,
};
use chrono::Utc;
use rand::Rng;
use tracing::debug;

use crate::hashing::content_hash;
use crate::SimRng;

/// Signals above this score contribute their finding to the evidence list.
pub const EVIDENCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    AiGeneration,
    Tampering,
}

struct Detector {
    name: &'static str,
    family: Family,
    finding: &'static str,
}

const DETECTORS: [Detector; 8] = [
    Detector {
        name: "frequency_analysis",
        family: Family::AiGeneration,
        finding: "Unnatural frequency domain patterns detected",
    },
    Detector {
        name: "noise_residual",
        family: Family::AiGeneration,
        finding: "Suspicious noise residual patterns detected",
    },
    Detector {
        name: "gan_fingerprint",
        family: Family::AiGeneration,
        finding: "GAN fingerprint patterns detected",
    },
    Detector {
        name: "diffusion_artifact",
        family: Family::AiGeneration,
        finding: "Diffusion model artifacts detected",
    },
    Detector {
        name: "error_level_analysis",
        family: Family::Tampering,
        finding: "Error Level Analysis indicates possible re-compression",
    },
    Detector {
        name: "clone_detection",
        family: Family::Tampering,
        finding: "Cloning/forgery patterns detected",
    },
    Detector {
        name: "splicing_detection",
        family: Family::Tampering,
        finding: "Possible image splicing detected",
    },
    Detector {
        name: "metadata_consistency",
        family: Family::Tampering,
        finding: "Metadata does not match visual content",
    },
];

pub struct SimulatedVerifier {
    config: SimulationConfig,
    rng: SimRng,
}

impl SimulatedVerifier {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            rng: SimRng::from_entropy(),
        }
    }

    /// Reproducible draws for tests and demos.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SimRng::seeded(seed),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

impl ResultProvider for SimulatedVerifier {
    fn kind(&self) -> OperationKind {
        OperationKind::Verification
    }

    fn id(&self) -> &'static str {
        "sim.verifier"
    }

    fn generate(
        &self,
        input: &OperationInput,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CavError> {
        let content = input.content().ok_or(CavError::InvalidInputError)?;
        let mut rng = self.rng.lock();

        let is_ai_generated = rng.gen::<f64>() < self.config.ai_probability;
        let is_tampered = rng.gen::<f64>() < self.config.tamper_probability;
        let authenticity_score = if is_ai_generated || is_tampered {
            rng.gen_range(0.6..0.8)
        } else {
            rng.gen_range(0.8..=1.0)
        };

        let mut signals = Vec::with_capacity(DETECTORS.len());
        let mut evidence = Vec::new();
        for detector in &DETECTORS {
            let flagged = match detector.family {
                Family::AiGeneration => is_ai_generated,
                Family::Tampering => is_tampered,
            };
            let score: f64 = if flagged {
                rng.gen_range(0.55..=1.0)
            } else {
                rng.gen_range(0.0..EVIDENCE_THRESHOLD)
            };
            if score > EVIDENCE_THRESHOLD {
                evidence.push(detector.finding.to_string());
            }
            signals.push(DetectionSignal {
                name: detector.name.to_string(),
                score,
                confidence: if score >= self.config.high_confidence_threshold {
                    ConfidenceLevel::High
                } else {
                    ConfidenceLevel::Medium
                },
            });
        }

        let content_hash = content_hash(self.config.hash_mode, content, &mut *rng);
        debug!(
            operation_id = %ctx.operation_id,
            generation = ctx.generation,
            authenticity_score,
            is_ai_generated,
            is_tampered,
            "Simulated verification"
        );

        Ok(OperationResult::Verification(VerificationResult {
            authenticity_score,
            is_ai_generated,
            is_tampered,
            signals,
            evidence,
            content_hash,
            timestamp: Utc::now(),
        }))
    }
}
