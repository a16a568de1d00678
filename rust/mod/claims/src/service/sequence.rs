use chrono::{DateTime, Utc};

use factorclaim_core::ServiceError;

use crate::service::FactorService;

/// KV prefix of the per-day claim counters.
const SEQ_PREFIX: &str = "claims/seq/";

impl FactorService {
    /// Allocate the next claim number for the day of `now`:
    /// `CLM-YYYYMMDD-NNNN`, with `NNNN` starting at 0001 each day.
    pub(crate) fn next_claim_id(&self, now: DateTime<Utc>) -> Result<String, ServiceError> {
        let day = now.format("%Y%m%d").to_string();
        let seq = self
            .kv
            .increment(&format!("{}{}", SEQ_PREFIX, day), 1)
            .map_err(ServiceError::storage)?;
        Ok(format!("CLM-{}-{:04}", day, seq))
    }
}
