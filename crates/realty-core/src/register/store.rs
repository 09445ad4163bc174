use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

use crate::error::RealtyError;
use crate::real_estate::property::{analyze_property, validate_assumptions, PropertyAnalysis, PropertyAssumptions};
use crate::types::{Money, Rate};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A registered property with its derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: String,
    #[serde(flatten)]
    pub assumptions: PropertyAssumptions,
    #[serde(flatten)]
    pub analysis: PropertyAnalysis,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub purchase_price: Option<Money>,
    #[serde(default)]
    pub market_value: Option<Money>,
    #[serde(default)]
    pub annual_rent: Option<Money>,
    #[serde(default)]
    pub annual_expenses: Option<Money>,
    #[serde(default)]
    pub vacancy_rate: Option<Rate>,
    #[serde(default)]
    pub appreciation_rate: Option<Rate>,
    #[serde(default)]
    pub rent_growth_rate: Option<Rate>,
    #[serde(default)]
    pub expense_growth_rate: Option<Rate>,
    #[serde(default)]
    pub hold_years: Option<u32>,
}

impl PropertyUpdate {
    fn apply(self, a: &mut PropertyAssumptions) {
        if let Some(v) = self.name {
            a.name = v;
        }
        if let Some(v) = self.location {
            a.location = v;
        }
        if let Some(v) = self.purchase_price {
            a.purchase_price = v;
        }
        if let Some(v) = self.market_value {
            a.market_value = v;
        }
        if let Some(v) = self.annual_rent {
            a.annual_rent = v;
        }
        if let Some(v) = self.annual_expenses {
            a.annual_expenses = v;
        }
        if let Some(v) = self.vacancy_rate {
            a.vacancy_rate = v;
        }
        if let Some(v) = self.appreciation_rate {
            a.appreciation_rate = v;
        }
        if let Some(v) = self.rent_growth_rate {
            a.rent_growth_rate = v;
        }
        if let Some(v) = self.expense_growth_rate {
            a.expense_growth_rate = v;
        }
        if let Some(v) = self.hold_years {
            a.hold_years = v;
        }
    }
}

/// In-memory property register. Listing preserves insertion order.
#[derive(Debug, Default)]
pub struct PropertyStore {
    records: RwLock<Vec<PropertyRecord>>,
}

// ---------------------------------------------------------------------------
// Store operations
// ---------------------------------------------------------------------------

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A register pre-loaded with the four demonstration assets.
    pub fn with_demo_properties() -> RealtyResult<Self> {
        let store = Self::new();
        store.replace_all(demo_properties())?;
        Ok(store)
    }

    pub fn create(&self, assumptions: PropertyAssumptions) -> RealtyResult<PropertyRecord> {
        let record = new_record(assumptions)?;
        debug!(id = %record.id, name = %record.assumptions.name, "property created");
        self.write().push(record.clone());
        Ok(record)
    }

    pub fn list(&self) -> Vec<PropertyRecord> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn get(&self, id: &str) -> RealtyResult<PropertyRecord> {
        self.read()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Merge the update into the stored assumptions and recompute metrics.
    /// The record is left untouched when the merged assumptions are invalid.
    pub fn update(&self, id: &str, update: PropertyUpdate) -> RealtyResult<PropertyRecord> {
        let mut records = self.write();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;

        let mut merged = record.assumptions.clone();
        update.apply(&mut merged);
        validate_assumptions(&merged)?;

        record.analysis = analyze_property(&merged);
        record.assumptions = merged;
        debug!(id, "property updated");
        Ok(record.clone())
    }

    pub fn delete(&self, id: &str) -> RealtyResult<()> {
        let mut records = self.write();
        let idx = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;
        records.remove(idx);
        debug!(id, "property deleted");
        Ok(())
    }

    /// Swap the whole register for fresh records built from `seeds`.
    /// Nothing changes if any seed is invalid. Returns the number removed.
    pub fn replace_all(&self, seeds: Vec<PropertyAssumptions>) -> RealtyResult<usize> {
        let fresh = seeds
            .into_iter()
            .map(new_record)
            .collect::<RealtyResult<Vec<_>>>()?;
        let mut records = self.write();
        let removed = records.len();
        *records = fresh;
        debug!(removed, seeded = records.len(), "property register replaced");
        Ok(removed)
    }

    pub fn clear(&self) {
        self.write().clear();
        debug!("property register cleared");
    }

    // Writers never leave a record half-applied; poisoned data is consistent.
    fn read(&self) -> RwLockReadGuard<'_, Vec<PropertyRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<PropertyRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn new_record(assumptions: PropertyAssumptions) -> RealtyResult<PropertyRecord> {
    validate_assumptions(&assumptions)?;
    Ok(PropertyRecord {
        id: Uuid::new_v4().to_string(),
        analysis: analyze_property(&assumptions),
        assumptions,
    })
}

fn not_found(id: &str) -> RealtyError {
    RealtyError::NotFound {
        entity: "Property".into(),
        id: id.into(),
    }
}

#[allow(clippy::too_many_arguments)]
fn seed(
    name: &str,
    location: &str,
    purchase_price: Money,
    market_value: Money,
    annual_rent: Money,
    annual_expenses: Money,
    vacancy_rate: Rate,
    appreciation_rate: Rate,
    rent_growth_rate: Rate,
    expense_growth_rate: Rate,
) -> PropertyAssumptions {
    PropertyAssumptions {
        name: name.into(),
        location: location.into(),
        purchase_price,
        market_value,
        annual_rent,
        annual_expenses,
        vacancy_rate,
        appreciation_rate,
        rent_growth_rate,
        expense_growth_rate,
        hold_years: 10,
    }
}

/// Demonstration assets used to seed a fresh register.
pub fn demo_properties() -> Vec<PropertyAssumptions> {
    vec![
        seed(
            "Aurora High-Rise",
            "Seattle, WA",
            4_200_000.0,
            4_850_000.0,
            620_000.0,
            260_000.0,
            0.06,
            0.035,
            0.025,
            0.018,
        ),
        seed(
            "Harborfront Lofts",
            "Miami, FL",
            3_150_000.0,
            3_520_000.0,
            480_000.0,
            190_000.0,
            0.08,
            0.032,
            0.024,
            0.017,
        ),
        seed(
            "Canyon Ridge Estates",
            "Austin, TX",
            5_050_000.0,
            5_640_000.0,
            710_000.0,
            315_000.0,
            0.05,
            0.038,
            0.027,
            0.016,
        ),
        seed(
            "Summit View Offices",
            "Denver, CO",
            2_780_000.0,
            3_150_000.0,
            360_000.0,
            155_000.0,
            0.07,
            0.031,
            0.022,
            0.015,
        ),
    ]
}
