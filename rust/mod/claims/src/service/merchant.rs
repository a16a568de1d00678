use factorclaim_core::{new_id, now_rfc3339, ListParams, ListResult, ServiceError};
use factorclaim_sql::Value;

use crate::model::{CreateMerchant, Merchant, MerchantFilter, UpdateMerchant};
use crate::service::{FactorService, Filter};
use crate::validate::Validator;

const SEARCH_COLUMNS: &[&str] = &["name", "address"];

fn not_found() -> ServiceError {
    ServiceError::NotFound("Merchant not found".into())
}

fn validate_merchant(m: &Merchant) -> Result<(), ServiceError> {
    Validator::new()
        .len("name", &m.name, 1, 100)
        .len("address", &m.address, 1, 200)
        .len("contact", &m.contact, 10, 15)
        .email("email", m.email.as_deref())
        .finish()
}

fn merchant_indexes(m: &Merchant) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::from(m.name.as_str())),
        ("address", Value::from(m.address.as_str())),
        ("is_active", Value::from(m.is_active)),
        ("updated_at", Value::from(m.updated_at.as_str())),
    ]
}

impl FactorService {
    pub fn create_merchant(&self, input: CreateMerchant) -> Result<Merchant, ServiceError> {
        let now = now_rfc3339();
        let merchant = Merchant {
            id: new_id(),
            name: input.name.trim().to_string(),
            address: input.address.trim().to_string(),
            contact: input.contact.trim().to_string(),
            email: input.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        validate_merchant(&merchant)?;

        let mut indexes = merchant_indexes(&merchant);
        indexes.push(("created_at", Value::from(merchant.created_at.as_str())));
        self.insert_record("merchants", &merchant.id, &merchant, &indexes)?;
        Ok(merchant)
    }

    pub fn get_merchant(&self, id: &str) -> Result<Merchant, ServiceError> {
        self.get_record("merchants", id)?.ok_or_else(not_found)
    }

    pub fn list_merchants(
        &self,
        filter: &MerchantFilter,
        page: &ListParams,
    ) -> Result<ListResult<Merchant>, ServiceError> {
        let mut filters = Vec::new();
        if let Some(active) = filter.is_active {
            filters.push(Filter::Eq("is_active", Value::from(active)));
        }
        self.list_records("merchants", &filters, page)
    }

    pub fn update_merchant(
        &self,
        id: &str,
        patch: UpdateMerchant,
    ) -> Result<Merchant, ServiceError> {
        let mut merchant = self.get_merchant(id)?;
        if let Some(v) = patch.name {
            merchant.name = v.trim().to_string();
        }
        if let Some(v) = patch.address {
            merchant.address = v.trim().to_string();
        }
        if let Some(v) = patch.contact {
            merchant.contact = v.trim().to_string();
        }
        if let Some(v) = patch.email {
            let v = v.trim().to_string();
            merchant.email = (!v.is_empty()).then_some(v);
        }
        if let Some(v) = patch.is_active {
            merchant.is_active = v;
        }
        validate_merchant(&merchant)?;
        merchant.updated_at = now_rfc3339();

        if !self.update_record("merchants", &merchant.id, &merchant, &merchant_indexes(&merchant))? {
            return Err(not_found());
        }
        Ok(merchant)
    }

    pub fn delete_merchant(&self, id: &str) -> Result<(), ServiceError> {
        if !self.delete_record("merchants", id)? {
            return Err(not_found());
        }
        Ok(())
    }

    /// Case-insensitive substring search over name and address.
    pub fn search_merchants(
        &self,
        term: &str,
        page: &ListParams,
    ) -> Result<ListResult<Merchant>, ServiceError> {
        self.list_records(
            "merchants",
            &[Filter::AnyContains(SEARCH_COLUMNS, term.trim().to_string())],
            page,
        )
    }
}
