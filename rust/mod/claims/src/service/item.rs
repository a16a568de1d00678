use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use factorclaim_core::{new_id, now_rfc3339, parse_timestamp, ListParams, ListResult, ServiceError};
use factorclaim_sql::Value;

use crate::model::{CreateItem, Item, ItemAge, ItemFilter, UpdateItem};
use crate::service::{FactorService, Filter};
use crate::validate::Validator;

/// Items produced more than this many days ago need confirmation before
/// they go on a claim (15 months of 30 days).
pub const OLD_ITEM_DAYS: i64 = 450;

const SEARCH_COLUMNS: &[&str] = &["model_name", "item_type", "batch", "supplier", "contractor"];

fn not_found() -> ServiceError {
    ServiceError::NotFound("Item not found".into())
}

/// Parse and normalize a production date to RFC 3339.
fn production_date(raw: &str) -> Result<String, ServiceError> {
    parse_timestamp(raw)
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| {
            ServiceError::Validation(
                "production_date: expected an RFC 3339 timestamp or YYYY-MM-DD".into(),
            )
        })
}

/// Age of an item in days and whole 30-day months. An unparseable stored
/// date counts as brand new.
pub(crate) fn item_age(item: &Item, now: DateTime<Utc>) -> (i64, i64) {
    let days = parse_timestamp(&item.production_date)
        .map(|d| (now - d).num_days())
        .unwrap_or(0);
    (days, days.div_euclid(30))
}

pub(crate) fn is_old(item: &Item, now: DateTime<Utc>) -> bool {
    parse_timestamp(&item.production_date)
        .map(|d| d < now - Duration::days(OLD_ITEM_DAYS))
        .unwrap_or(false)
}

fn validate_item(item: &Item) -> Result<(), ServiceError> {
    Validator::new()
        .len("model_name", &item.model_name, 1, 100)
        .len("item_type", &item.item_type, 1, 50)
        .len("batch", &item.batch, 1, 50)
        .positive("wattage", item.wattage)
        .len("supplier", &item.supplier, 1, 100)
        .opt_len("contractor", item.contractor.as_deref(), 1, 100)
        .len("notes", &item.notes, 0, 500)
        .finish()
}

fn item_indexes(item: &Item) -> Vec<(&'static str, Value)> {
    vec![
        ("model_name", Value::from(item.model_name.as_str())),
        ("item_type", Value::from(item.item_type.as_str())),
        ("batch", Value::from(item.batch.as_str())),
        ("supplier", Value::from(item.supplier.as_str())),
        ("contractor", Value::from(item.contractor.clone())),
        ("production_date", Value::from(item.production_date.as_str())),
        ("updated_at", Value::from(item.updated_at.as_str())),
    ]
}

impl FactorService {
    pub fn create_item(&self, input: CreateItem) -> Result<Item, ServiceError> {
        let now = now_rfc3339();
        let item = Item {
            id: new_id(),
            model_name: input.model_name.trim().to_string(),
            item_type: input.item_type.trim().to_string(),
            batch: input.batch.trim().to_string(),
            production_date: production_date(&input.production_date)?,
            wattage: input.wattage,
            supplier: input.supplier.trim().to_string(),
            contractor: input.contractor.map(|c| c.trim().to_string()),
            notes: input.notes,
            created_at: now.clone(),
            updated_at: now,
        };
        validate_item(&item)?;

        let mut indexes = item_indexes(&item);
        indexes.push(("created_at", Value::from(item.created_at.as_str())));
        self.insert_record("items", &item.id, &item, &indexes)?;
        Ok(item)
    }

    pub fn get_item(&self, id: &str) -> Result<Item, ServiceError> {
        self.get_record("items", id)?.ok_or_else(not_found)
    }

    pub fn list_items(
        &self,
        filter: &ItemFilter,
        page: &ListParams,
    ) -> Result<ListResult<Item>, ServiceError> {
        let mut filters = Vec::new();
        if let Some(ref m) = filter.model_name {
            filters.push(Filter::Contains("model_name", m.clone()));
        }
        if let Some(ref t) = filter.item_type {
            filters.push(Filter::Contains("item_type", t.clone()));
        }
        if let Some(ref b) = filter.batch {
            filters.push(Filter::Eq("batch", Value::from(b.as_str())));
        }
        self.list_records("items", &filters, page)
    }

    pub fn update_item(&self, id: &str, patch: UpdateItem) -> Result<Item, ServiceError> {
        let mut item = self.get_item(id)?;

        if let Some(v) = patch.model_name {
            item.model_name = v.trim().to_string();
        }
        if let Some(v) = patch.item_type {
            item.item_type = v.trim().to_string();
        }
        if let Some(v) = patch.batch {
            item.batch = v.trim().to_string();
        }
        if let Some(v) = patch.production_date {
            item.production_date = production_date(&v)?;
        }
        if let Some(v) = patch.wattage {
            item.wattage = v;
        }
        if let Some(v) = patch.supplier {
            item.supplier = v.trim().to_string();
        }
        if let Some(v) = patch.contractor {
            item.contractor = Some(v.trim().to_string());
        }
        if let Some(v) = patch.notes {
            item.notes = v;
        }
        validate_item(&item)?;
        item.updated_at = now_rfc3339();

        if !self.update_record("items", &item.id, &item, &item_indexes(&item))? {
            return Err(not_found());
        }
        Ok(item)
    }

    pub fn delete_item(&self, id: &str) -> Result<(), ServiceError> {
        if !self.delete_record("items", id)? {
            return Err(not_found());
        }
        Ok(())
    }

    /// Barcode lookup: exact batch first, then ignoring case.
    pub fn find_item_by_batch(&self, code: &str) -> Result<Item, ServiceError> {
        let code = code.trim();
        debug!(batch = %code, "barcode lookup");

        let exact: Option<Item> =
            self.find_first("items", &[Filter::Eq("batch", Value::from(code))])?;
        let found = match exact {
            Some(item) => Some(item),
            None => self.find_first("items", &[Filter::EqNoCase("batch", code.to_string())])?,
        };

        found.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Item with barcode '{}' not found. Please verify the item exists in inventory.",
                code
            ))
        })
    }

    /// Case-insensitive substring search over the descriptive columns.
    pub fn search_items(
        &self,
        term: &str,
        page: &ListParams,
    ) -> Result<ListResult<Item>, ServiceError> {
        self.list_records(
            "items",
            &[Filter::AnyContains(SEARCH_COLUMNS, term.trim().to_string())],
            page,
        )
    }

    /// Report how old an item is and whether it needs confirmation.
    pub fn check_item_age(&self, id: &str) -> Result<ItemAge, ServiceError> {
        let item = self.get_item(id)?;
        Ok(age_report(&item, Utc::now()))
    }
}

fn age_report(item: &Item, now: DateTime<Utc>) -> ItemAge {
    let (_, months) = item_age(item, now);
    let old = is_old(item, now);
    let message = if old {
        format!(
            "This item is {} months old (older than 15 months). Please confirm before adding to claim.",
            months
        )
    } else {
        "Item is within acceptable age range".to_string()
    };
    ItemAge {
        item_id: item.id.clone(),
        model_name: item.model_name.clone(),
        batch: item.batch.clone(),
        production_date: item.production_date.clone(),
        age_months: months,
        is_old: old,
        requires_confirmation: old,
        message,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::service::testutil;

    pub(crate) fn sample(batch: &str, days_old: i64) -> CreateItem {
        CreateItem {
            model_name: "LED Panel 2x2".into(),
            item_type: "Panel".into(),
            batch: batch.into(),
            production_date: (Utc::now() - Duration::days(days_old)).to_rfc3339(),
            wattage: 40.0,
            supplier: "Lumina".into(),
            contractor: None,
            notes: String::new(),
        }
    }

    #[test]
    fn create_normalizes_date() {
        let (_dir, svc) = testutil::service();
        let mut input = sample("B-1", 0);
        input.production_date = "2024-01-15".into();
        let item = svc.create_item(input).unwrap();
        assert_eq!(item.production_date, "2024-01-15T00:00:00+00:00");

        let mut bad = sample("B-2", 0);
        bad.production_date = "15/01/2024".into();
        assert!(matches!(svc.create_item(bad), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn create_validates() {
        let (_dir, svc) = testutil::service();
        let mut bad = sample("", 0);
        bad.wattage = 0.0;
        bad.contractor = Some(String::new());
        let err = svc.create_item(bad).unwrap_err().to_string();
        assert!(err.contains("batch:"), "{err}");
        assert!(err.contains("wattage:"), "{err}");
        assert!(err.contains("contractor:"), "{err}");
    }

    #[test]
    fn barcode_lookup() {
        let (_dir, svc) = testutil::service();
        let item = svc.create_item(sample("AB/2024/07", 10)).unwrap();

        assert_eq!(svc.find_item_by_batch("AB/2024/07").unwrap().id, item.id);
        assert_eq!(svc.find_item_by_batch("  ab/2024/07 ").unwrap().id, item.id);

        let err = svc.find_item_by_batch("ZZ-1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Item with barcode 'ZZ-1' not found. Please verify the item exists in inventory."
        );
    }

    #[test]
    fn exact_batch_preferred() {
        let (_dir, svc) = testutil::service();
        let upper = svc.create_item(sample("BATCH-X", 1)).unwrap();
        let lower = svc.create_item(sample("batch-x", 1)).unwrap();
        assert_eq!(svc.find_item_by_batch("BATCH-X").unwrap().id, upper.id);
        assert_eq!(svc.find_item_by_batch("batch-x").unwrap().id, lower.id);
    }

    #[test]
    fn list_and_search() {
        let (_dir, svc) = testutil::service();
        svc.create_item(sample("B-1", 1)).unwrap();
        let mut bulb = sample("B-2", 1);
        bulb.model_name = "Bulb 12W".into();
        bulb.item_type = "Bulb".into();
        bulb.contractor = Some("Rafiq & Sons".into());
        svc.create_item(bulb).unwrap();

        let page = ListParams::default();
        let by_model = svc
            .list_items(
                &ItemFilter {
                    model_name: Some("bulb".into()),
                    ..Default::default()
                },
                &page,
            )
            .unwrap();
        assert_eq!(by_model.total, 1);

        let by_batch = svc
            .list_items(
                &ItemFilter {
                    batch: Some("B-1".into()),
                    ..Default::default()
                },
                &page,
            )
            .unwrap();
        assert_eq!(by_batch.total, 1);

        assert_eq!(svc.search_items("rafiq", &page).unwrap().total, 1);
        assert_eq!(svc.search_items("lumina", &page).unwrap().total, 2);
        assert_eq!(svc.search_items("100%", &page).unwrap().total, 0);
    }

    #[test]
    fn update_and_delete() {
        let (_dir, svc) = testutil::service();
        let item = svc.create_item(sample("B-1", 1)).unwrap();
        let updated = svc
            .update_item(
                &item.id,
                UpdateItem {
                    wattage: Some(18.5),
                    notes: Some("recounted".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.wattage, 18.5);
        assert_eq!(updated.batch, "B-1");

        let err = svc
            .update_item(
                &item.id,
                UpdateItem {
                    wattage: Some(-1.0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        svc.delete_item(&item.id).unwrap();
        assert!(matches!(svc.get_item(&item.id), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn age_boundaries() {
        let (_dir, svc) = testutil::service();
        let fresh = svc.create_item(sample("B-1", 100)).unwrap();
        let edge = svc.create_item(sample("B-2", 449)).unwrap();
        let old = svc.create_item(sample("B-3", 451)).unwrap();

        let report = svc.check_item_age(&fresh.id).unwrap();
        assert_eq!(report.age_months, 3);
        assert!(!report.is_old);
        assert_eq!(report.message, "Item is within acceptable age range");

        assert!(!svc.check_item_age(&edge.id).unwrap().is_old);

        let report = svc.check_item_age(&old.id).unwrap();
        assert!(report.is_old);
        assert!(report.requires_confirmation);
        assert_eq!(report.age_months, 15);
        assert_eq!(
            report.message,
            "This item is 15 months old (older than 15 months). Please confirm before adding to claim."
        );
    }
}
