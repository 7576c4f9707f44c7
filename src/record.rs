//! Service records: the maintenance entries tracked by the application.
use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{Entity, Result, ServiceDate, ServiceLogError};

/// What kind of item a service record is about.
///
/// Unknown identifiers found in stored data are kept verbatim in
/// [`Category::Unknown`] so they survive a read-modify-write cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    HomeAppliances,
    Vehicles,
    Entertainment,
    Computing,
    Security,
    Other,
    Unknown(String),
}

impl Category {
    /// All categories offered when creating a record.
    pub const KNOWN: [Category; 6] = [
        Category::HomeAppliances,
        Category::Vehicles,
        Category::Entertainment,
        Category::Computing,
        Category::Security,
        Category::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::HomeAppliances => "home_appliances",
            Category::Vehicles => "vehicles",
            Category::Entertainment => "entertainment",
            Category::Computing => "computing",
            Category::Security => "security",
            Category::Other => "other",
            Category::Unknown(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Category::HomeAppliances => "Home Appliances",
            Category::Vehicles => "Vehicles",
            Category::Entertainment => "Entertainment",
            Category::Computing => "Computing",
            Category::Security => "Security",
            Category::Other => "Other",
            Category::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "home_appliances" => Category::HomeAppliances,
            "vehicles" => Category::Vehicles,
            "entertainment" => Category::Entertainment,
            "computing" => Category::Computing,
            "security" => Category::Security,
            "other" => Category::Other,
            _ => Category::Unknown(value),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for Category {
    type Err = ServiceLogError;

    /// Strict parse for user input: only the known identifiers are accepted.
    fn from_str(s: &str) -> Result<Self> {
        match Category::from(s.trim().to_lowercase()) {
            Category::Unknown(raw) => Err(ServiceLogError::InvalidInput {
                message: format!(
                    "unknown category '{}', expected one of: {}",
                    raw,
                    Category::KNOWN
                        .iter()
                        .map(Category::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
            known => Ok(known),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a record is still ahead of us or already done.
///
/// Derived from the record's date relative to today; today itself counts as
/// completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Upcoming,
    Completed,
}

impl ServiceStatus {
    pub fn of(date: ServiceDate, today: NaiveDate) -> Self {
        if date.naive() > today {
            ServiceStatus::Upcoming
        } else {
            ServiceStatus::Completed
        }
    }
}

/// A single maintenance entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: String,
    pub category: Category,
    pub item_name: String,
    pub repair_type: String,
    /// `MM - DD - YYYY`. Kept as text so a malformed value read from storage
    /// only drops the record from date views instead of failing the whole list.
    pub date: String,
    /// Decimal amount stored as text.
    pub cost: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub reminder_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ServiceRecord {
    pub fn service_date(&self) -> Result<ServiceDate> {
        ServiceDate::parse(&self.date)
    }

    pub fn status(&self, today: NaiveDate) -> Result<ServiceStatus> {
        Ok(ServiceStatus::of(self.service_date()?, today))
    }

    /// Cost as a float, `0.0` when the stored text is not a number.
    pub fn cost_value(&self) -> f64 {
        match parse_cost(&self.cost) {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "Record {} has unparsable cost '{}', counting as 0",
                    self.id, self.cost
                );
                0.0
            }
        }
    }
}

/// Parses a decimal amount. Surrounding whitespace is ignored.
pub fn parse_cost(value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ServiceLogError::InvalidCost {
            value: value.to_string(),
        })
}

/// Fields supplied when creating a service record.
#[derive(Debug, Clone)]
pub struct ServiceDraft {
    pub category: Category,
    pub item_name: String,
    pub repair_type: String,
    pub date: ServiceDate,
    pub cost: String,
    pub note: Option<String>,
    pub image: Option<String>,
}

impl ServiceDraft {
    /// Checks required fields. An empty cost is allowed and counts as zero.
    pub fn validate(&self) -> Result<()> {
        if self.item_name.trim().is_empty() {
            return Err(ServiceLogError::InvalidInput {
                message: "item name is required".to_string(),
            });
        }
        if self.repair_type.trim().is_empty() {
            return Err(ServiceLogError::InvalidInput {
                message: "repair type is required".to_string(),
            });
        }
        if !self.cost.trim().is_empty() {
            parse_cost(&self.cost)?;
        }
        Ok(())
    }
}

/// Partial update of a service record. `None` keeps the stored value; for the
/// optional fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ServicePatch {
    pub category: Option<Category>,
    pub item_name: Option<String>,
    pub repair_type: Option<String>,
    pub date: Option<ServiceDate>,
    pub cost: Option<String>,
    pub note: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub reminder_id: Option<Option<String>>,
}

impl ServicePatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.item_name.is_none()
            && self.repair_type.is_none()
            && self.date.is_none()
            && self.cost.is_none()
            && self.note.is_none()
            && self.image.is_none()
            && self.reminder_id.is_none()
    }
}

impl Entity for ServiceRecord {
    type Draft = ServiceDraft;
    type Patch = ServicePatch;

    const KEY: &'static str = "service_records";
    const KIND: &'static str = "Service record";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, now: DateTime<Utc>, draft: ServiceDraft) -> Self {
        ServiceRecord {
            id,
            category: draft.category,
            item_name: draft.item_name,
            repair_type: draft.repair_type,
            date: draft.date.to_string(),
            cost: draft.cost,
            note: draft.note,
            image: draft.image,
            reminder_id: None,
            created_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ServicePatch) {
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(item_name) = patch.item_name {
            self.item_name = item_name;
        }
        if let Some(repair_type) = patch.repair_type {
            self.repair_type = repair_type;
        }
        if let Some(date) = patch.date {
            self.date = date.to_string();
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
        if let Some(note) = patch.note {
            self.note = note;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(reminder_id) = patch.reminder_id {
            self.reminder_id = reminder_id;
        }
    }
}
