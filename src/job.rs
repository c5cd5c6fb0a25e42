use crate::cost::CostPenalties;
use crate::error::PfResult;
use crate::plan::PlanDocument;
use sha2::{Digest, Sha256};

/// Stable identity of one search job. Two invocations with the same plan,
/// penalties and strategy hash identically, so hosts can dedupe repeated
/// searches or key result caches on it.
#[derive(Debug, Clone)]
pub struct JobIdentifier {
    pub hash: String,
}

impl JobIdentifier {
    pub fn from_parts(
        plan: &PlanDocument,
        penalties: &CostPenalties,
        strategy: &str,
    ) -> PfResult<Self> {
        let mut hasher = Sha256::new();

        let plan_json = serde_json::to_string(plan)?;
        hasher.update(plan_json.as_bytes());

        let penalties_json = serde_json::to_string(penalties)?;
        hasher.update(penalties_json.as_bytes());

        hasher.update(strategy.as_bytes());

        Ok(Self {
            hash: hex::encode(hasher.finalize()),
        })
    }
}
