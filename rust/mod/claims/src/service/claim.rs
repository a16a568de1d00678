use chrono::Utc;
use tracing::{debug, info};

use factorclaim_core::{new_id, now_rfc3339, ListParams, ListResult, ServiceError};
use factorclaim_sql::Value;

use crate::model::{
    ApproveClaim, Claim, ClaimFilter, ClaimItem, ClaimStatus, CreateClaim, UpdateClaim, User,
    UserType, VerifyClaim,
};
use crate::service::item::{is_old, item_age};
use crate::service::{FactorService, Filter};
use crate::validate::Validator;

/// How many times a write is retried when another request changed the
/// claim between read and write.
const WRITE_ATTEMPTS: usize = 3;

fn not_found() -> ServiceError {
    ServiceError::NotFound("Claim not found".into())
}

fn denied(claim: &Claim, action: &str) -> ServiceError {
    ServiceError::Conflict(format!(
        "claim {} cannot {} (status: {})",
        claim.claim_id, action, claim.status
    ))
}

fn claim_indexes(c: &Claim) -> Vec<(&'static str, Value)> {
    vec![
        ("rep_id", Value::from(c.rep_id.as_str())),
        ("merchant_id", Value::from(c.merchant_id.as_str())),
        ("status", Value::from(c.status.as_str())),
        ("verified", Value::from(c.verified)),
        ("updated_at", Value::from(c.updated_at.as_str())),
    ]
}

impl FactorService {
    /// File a new claim. It starts in `Bilty Pending`, unverified.
    pub fn create_claim(&self, input: CreateClaim, caller: &User) -> Result<Claim, ServiceError> {
        if caller.user_type == UserType::Rep && input.rep_id != caller.id {
            return Err(ServiceError::PermissionDenied(
                "Reps can only file claims for themselves".into(),
            ));
        }
        Validator::new().len("notes", &input.notes, 0, 500).finish()?;

        self.get_record::<User>("users", &input.rep_id)?
            .ok_or_else(|| ServiceError::NotFound("Rep not found".into()))?;
        self.get_merchant(&input.merchant_id)?;
        self.check_claim_items(&input.items)?;

        let now = Utc::now();
        let ts = now.to_rfc3339();
        let claim = Claim {
            id: new_id(),
            claim_id: self.next_claim_id(now)?,
            rep_id: input.rep_id,
            merchant_id: input.merchant_id,
            date: ts.clone(),
            items: input.items,
            status: ClaimStatus::BiltyPending,
            bilty_number: None,
            verified: false,
            verified_by: None,
            verified_at: None,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            notes: input.notes,
            created_at: ts.clone(),
            updated_at: ts,
        };

        let mut indexes = claim_indexes(&claim);
        indexes.push(("claim_id", Value::from(claim.claim_id.as_str())));
        indexes.push(("created_at", Value::from(claim.created_at.as_str())));
        self.insert_record("claims", &claim.id, &claim, &indexes)?;

        info!(claim_id = %claim.claim_id, rep_id = %claim.rep_id, "claim filed");
        Ok(claim)
    }

    /// Every line needs a known item and a positive quantity; items older
    /// than 15 months need `force_add`.
    fn check_claim_items(&self, items: &[ClaimItem]) -> Result<(), ServiceError> {
        let mut v = Validator::new();
        v.check(!items.is_empty(), "items", "at least one item is required");
        for (i, line) in items.iter().enumerate() {
            v.check(line.quantity > 0, &format!("items[{i}].quantity"), "must be greater than 0")
                .len(&format!("items[{i}].notes"), &line.notes, 0, 200);
        }
        v.finish()?;

        let now = Utc::now();
        for line in items {
            let item = self
                .get_item(&line.item_id)
                .map_err(|_| ServiceError::NotFound(format!("Item {} not found", line.item_id)))?;
            if is_old(&item, now) && !line.force_add {
                let (_, months) = item_age(&item, now);
                return Err(ServiceError::Validation(format!(
                    "Item {} (batch {}) is {} months old (older than 15 months). \
                     Set force_add to include it.",
                    item.model_name, item.batch, months
                )));
            }
        }
        Ok(())
    }

    pub fn get_claim(&self, id: &str) -> Result<Claim, ServiceError> {
        self.get_record("claims", id)?.ok_or_else(not_found)
    }

    /// Look a claim up by its `CLM-...` number.
    pub fn get_claim_by_number(&self, claim_id: &str) -> Result<Claim, ServiceError> {
        self.find_first("claims", &[Filter::Eq("claim_id", Value::from(claim_id))])?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Claim with claim_id '{}' not found", claim_id))
            })
    }

    pub fn list_claims(
        &self,
        filter: &ClaimFilter,
        page: &ListParams,
    ) -> Result<ListResult<Claim>, ServiceError> {
        let mut filters = Vec::new();
        if let Some(ref rep) = filter.rep_id {
            filters.push(Filter::Eq("rep_id", Value::from(rep.as_str())));
        }
        if let Some(ref merchant) = filter.merchant_id {
            filters.push(Filter::Eq("merchant_id", Value::from(merchant.as_str())));
        }
        if let Some(verified) = filter.verified {
            filters.push(Filter::Eq("verified", Value::from(verified)));
        }
        if let Some(status) = filter.status {
            filters.push(Filter::Eq("status", Value::from(status.as_str())));
        }
        self.list_records("claims", &filters, page)
    }

    pub fn list_unverified_claims(&self, page: &ListParams) -> Result<ListResult<Claim>, ServiceError> {
        self.list_claims(
            &ClaimFilter {
                verified: Some(false),
                ..Default::default()
            },
            page,
        )
    }

    pub fn list_rep_claims(
        &self,
        rep_id: &str,
        page: &ListParams,
    ) -> Result<ListResult<Claim>, ServiceError> {
        self.list_claims(
            &ClaimFilter {
                rep_id: Some(rep_id.to_string()),
                ..Default::default()
            },
            page,
        )
    }

    /// Edit the items or notes of a claim that is still open.
    pub fn update_claim(&self, id: &str, patch: UpdateClaim) -> Result<Claim, ServiceError> {
        Validator::new()
            .opt_len("notes", patch.notes.as_deref(), 0, 500)
            .finish()?;
        if let Some(ref items) = patch.items {
            self.check_claim_items(items)?;
        }

        self.modify_claim(id, "edit", &ClaimStatus::open(), |claim| {
            if let Some(ref items) = patch.items {
                claim.items = items.clone();
            }
            if let Some(ref notes) = patch.notes {
                claim.notes = notes.clone();
            }
        })
    }

    pub fn delete_claim(&self, id: &str) -> Result<(), ServiceError> {
        if !self.delete_record("claims", id)? {
            return Err(not_found());
        }
        info!(id = %id, "claim deleted");
        Ok(())
    }

    /// Record the shipment (bilty) number; the claim then awaits approval.
    /// Also used to correct a number while approval is pending.
    pub fn update_bilty(&self, id: &str, bilty_number: &str) -> Result<Claim, ServiceError> {
        let bilty_number = bilty_number.trim();
        Validator::new()
            .len("bilty_number", bilty_number, 1, 50)
            .finish()?;

        let from = [ClaimStatus::BiltyPending, ClaimStatus::ApprovalPending];
        self.modify_claim(id, "update bilty", &from, |claim| {
            claim.bilty_number = Some(bilty_number.to_string());
            claim.status = ClaimStatus::ApprovalPending;
        })
    }

    /// Factory approval. Approving also verifies the claim.
    pub fn approve_claim(
        &self,
        id: &str,
        input: ApproveClaim,
        caller: &User,
    ) -> Result<Claim, ServiceError> {
        Validator::new()
            .opt_len("notes", input.notes.as_deref(), 0, 500)
            .finish()?;

        let now = now_rfc3339();
        self.modify_claim(id, "approve", &[ClaimStatus::ApprovalPending], |claim| {
            claim.status = ClaimStatus::Approved;
            claim.verified = true;
            claim.verified_by = Some(caller.id.clone());
            claim.verified_at = Some(now.clone());
            claim.approved_by = Some(caller.id.clone());
            claim.approved_at = Some(now.clone());
            if let Some(ref notes) = input.notes {
                claim.notes = notes.clone();
            }
        })
    }

    pub fn reject_claim(&self, id: &str, reason: &str, caller: &User) -> Result<Claim, ServiceError> {
        let reason = reason.trim();
        Validator::new().len("reason", reason, 1, 500).finish()?;

        let claim = self.modify_claim(id, "reject", &ClaimStatus::open(), |claim| {
            claim.status = ClaimStatus::Rejected;
            claim.rejection_reason = Some(reason.to_string());
        })?;
        info!(claim_id = %claim.claim_id, by = %caller.id, "claim rejected");
        Ok(claim)
    }

    /// Mark a claim verified without changing its status.
    pub fn verify_claim(
        &self,
        id: &str,
        input: VerifyClaim,
        caller: &User,
    ) -> Result<Claim, ServiceError> {
        Validator::new()
            .opt_len("notes", input.notes.as_deref(), 0, 500)
            .opt_len("verified_by", input.verified_by.as_deref(), 1, 100)
            .finish()?;

        let verifier = input.verified_by.unwrap_or_else(|| caller.id.clone());
        let now = now_rfc3339();
        let from = [
            ClaimStatus::BiltyPending,
            ClaimStatus::ApprovalPending,
            ClaimStatus::Approved,
        ];
        self.modify_claim(id, "verify", &from, |claim| {
            claim.verified = true;
            claim.verified_by = Some(verifier.clone());
            claim.verified_at = Some(now.clone());
            if let Some(ref notes) = input.notes {
                claim.notes = notes.clone();
            }
        })
    }

    /// Read-check-write a claim. `apply` runs only when the current status is
    /// in `allowed`. The write is conditional on `updated_at` being unchanged;
    /// on a lost race the claim is re-read and the check repeated.
    fn modify_claim<F>(
        &self,
        id: &str,
        action: &str,
        allowed: &[ClaimStatus],
        apply: F,
    ) -> Result<Claim, ServiceError>
    where
        F: Fn(&mut Claim),
    {
        for _ in 0..WRITE_ATTEMPTS {
            let mut claim = self.get_claim(id)?;
            if !allowed.contains(&claim.status) {
                return Err(denied(&claim, action));
            }

            let from = claim.status;
            let seen = claim.updated_at.clone();
            apply(&mut claim);
            claim.updated_at = now_rfc3339();

            let written = self.update_record_if(
                "claims",
                id,
                &claim,
                &claim_indexes(&claim),
                Some(("updated_at", Value::from(seen))),
            )?;
            if written {
                debug!(
                    claim_id = %claim.claim_id,
                    action,
                    from = %from,
                    to = %claim.status,
                    "claim updated"
                );
                return Ok(claim);
            }
        }
        Err(ServiceError::Conflict(format!(
            "claim {} is being modified concurrently, try again",
            id
        )))
    }
}
