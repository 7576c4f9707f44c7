//! Derived views over a snapshot of the stored records.
//!
//! Nothing in here touches storage: every function takes the records and the
//! local "today" explicitly.
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    str::FromStr,
};

use chrono::{Datelike, Days, Months, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{Category, Contact, Result, ServiceDate, ServiceLogError, ServiceRecord, ServiceStatus};

/// A record left out of date-based views, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRecord {
    pub id: String,
    pub reason: String,
}

/// Service records split into what is due and what is done.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Soonest first.
    pub upcoming: Vec<ServiceRecord>,
    /// Most recent first.
    pub history: Vec<ServiceRecord>,
    pub invalid: Vec<InvalidRecord>,
}

/// Pairs each record with its parsed date, reporting the ones that fail.
fn dated(records: &[ServiceRecord]) -> (Vec<(ServiceDate, &ServiceRecord)>, Vec<InvalidRecord>) {
    let mut valid = Vec::with_capacity(records.len());
    let mut invalid = Vec::new();
    for record in records {
        match record.service_date() {
            Ok(date) => valid.push((date, record)),
            Err(e) => {
                warn!("Excluding record {} from date views: {}", record.id, e);
                invalid.push(InvalidRecord {
                    id: record.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    (valid, invalid)
}

/// Splits records by [`ServiceStatus`] and sorts each side.
pub fn partition(records: &[ServiceRecord], today: NaiveDate) -> Partition {
    let (valid, invalid) = dated(records);

    let mut upcoming = Vec::new();
    let mut history = Vec::new();
    for (date, record) in valid {
        match ServiceStatus::of(date, today) {
            ServiceStatus::Upcoming => upcoming.push((date, record)),
            ServiceStatus::Completed => history.push((date, record)),
        }
    }

    // Stable sorts keep stored (newest created first) order for equal dates.
    upcoming.sort_by_key(|(date, _)| *date);
    history.sort_by(|(a, _), (b, _)| b.cmp(a));

    debug!(
        "Partitioned {} records: {} upcoming, {} history, {} invalid",
        records.len(),
        upcoming.len(),
        history.len(),
        invalid.len()
    );

    Partition {
        upcoming: upcoming.into_iter().map(|(_, r)| r.clone()).collect(),
        history: history.into_iter().map(|(_, r)| r.clone()).collect(),
        invalid,
    }
}

/// Whole days from `today` until `date`; negative when overdue.
pub fn days_left(date: ServiceDate, today: NaiveDate) -> i64 {
    date.naive().signed_duration_since(today).num_days()
}

/// Sum of costs of completed services dated in today's month.
pub fn monthly_total(records: &[ServiceRecord], today: NaiveDate) -> f64 {
    let (valid, _) = dated(records);
    valid
        .into_iter()
        .filter(|(date, _)| {
            ServiceStatus::of(*date, today) == ServiceStatus::Completed && date.same_month(today)
        })
        .map(|(_, record)| record.cost_value())
        .sum()
}

/// Spending summary for the current year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseReport {
    pub year: i32,
    pub month_total: f64,
    pub year_total: f64,
    /// Highest spend first.
    pub by_category: Vec<(Category, f64)>,
    /// January through December.
    pub by_month: [f64; 12],
}

/// Builds the expense report from completed services.
pub fn expense_report(records: &[ServiceRecord], today: NaiveDate) -> ExpenseReport {
    let (valid, _) = dated(records);

    let mut by_month = [0.0; 12];
    let mut by_category: HashMap<Category, f64> = HashMap::new();
    for (date, record) in valid {
        if ServiceStatus::of(date, today) != ServiceStatus::Completed
            || date.naive().year() != today.year()
        {
            continue;
        }
        let cost = record.cost_value();
        by_month[date.naive().month0() as usize] += cost;
        *by_category.entry(record.category.clone()).or_default() += cost;
    }

    let mut by_category: Vec<(Category, f64)> = by_category.into_iter().collect();
    by_category.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.as_str().cmp(b.0.as_str()))
    });

    ExpenseReport {
        year: today.year(),
        month_total: by_month[today.month0() as usize],
        year_total: by_month.iter().sum(),
        by_category,
        by_month,
    }
}

/// Base letters only: decomposed, accents dropped, lowercased.
fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Collation-style comparison: base letters first, then accents (unaccented
/// first), then case (lowercase first).
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| {
            let accented = |s: &str| s.nfd().flat_map(char::to_lowercase).collect::<String>();
            accented(a).cmp(&accented(b))
        })
        .then_with(|| b.cmp(a))
}

/// Contacts sharing the same initial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactGroup {
    pub key: String,
    pub contacts: Vec<Contact>,
}

/// Groups contacts by the uppercased first character of their name.
pub fn group_contacts(contacts: &[Contact]) -> Vec<ContactGroup> {
    let mut groups: BTreeMap<String, Vec<Contact>> = BTreeMap::new();
    for contact in contacts {
        let key = contact
            .name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect::<String>())
            .unwrap_or_else(|| "#".to_string());
        groups.entry(key).or_default().push(contact.clone());
    }

    groups
        .into_iter()
        .map(|(key, mut contacts)| {
            contacts.sort_by(|a, b| locale_cmp(&a.name, &b.name));
            ContactGroup { key, contacts }
        })
        .collect()
}

/// Named windows of time relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateRange {
    Last30,
    Last90,
    ThisMonth,
    LastMonth,
    Last6Months,
    ThisYear,
}

impl DateRange {
    pub const ALL: [DateRange; 6] = [
        DateRange::Last30,
        DateRange::Last90,
        DateRange::ThisMonth,
        DateRange::LastMonth,
        DateRange::Last6Months,
        DateRange::ThisYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Last30 => "last30",
            DateRange::Last90 => "last90",
            DateRange::ThisMonth => "thisMonth",
            DateRange::LastMonth => "lastMonth",
            DateRange::Last6Months => "last6Months",
            DateRange::ThisYear => "thisYear",
        }
    }

    /// Inclusive `[lower, upper]` bounds of the window.
    pub fn bounds(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            DateRange::Last30 => (today - Days::new(30), today),
            DateRange::Last90 => (today - Days::new(90), today),
            DateRange::ThisMonth => month_bounds(today),
            DateRange::LastMonth => {
                let first = first_of_month(today);
                month_bounds(first - Days::new(1))
            }
            DateRange::Last6Months => (
                today.checked_sub_months(Months::new(6)).unwrap_or(NaiveDate::MIN),
                today,
            ),
            DateRange::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
                NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today),
            ),
        }
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let (lower, upper) = self.bounds(today);
        lower <= date && date <= upper
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = first_of_month(day);
    let last = first
        .checked_add_months(Months::new(1))
        .map(|next| next - Days::new(1))
        .unwrap_or(NaiveDate::MAX);
    (first, last)
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = ServiceLogError;

    fn from_str(s: &str) -> Result<Self> {
        DateRange::ALL
            .into_iter()
            .find(|range| range.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ServiceLogError::InvalidInput {
                message: format!(
                    "unknown date range '{}', expected one of: {}",
                    s,
                    DateRange::ALL.map(|r| r.as_str()).join(", ")
                ),
            })
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Search, category and date-range filters for service records, combined
/// with AND. Empty parts do not filter.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub search: Option<String>,
    pub categories: HashSet<Category>,
    pub range: Option<DateRange>,
}

impl ServiceFilter {
    pub fn matches(&self, record: &ServiceRecord, today: NaiveDate) -> bool {
        if let Some(term) = self.search_term() {
            if !contains_ignore_case(&record.item_name, &term) {
                return false;
            }
        }

        if !self.categories.is_empty() && !self.categories.contains(&record.category) {
            return false;
        }

        if let Some(range) = self.range {
            match record.service_date() {
                Ok(date) => {
                    if !range.contains(date.naive(), today) {
                        return false;
                    }
                }
                Err(e) => {
                    warn!("Record {} excluded from {} filter: {}", record.id, range, e);
                    return false;
                }
            }
        }

        true
    }

    pub fn apply(&self, records: &[ServiceRecord], today: NaiveDate) -> Vec<ServiceRecord> {
        records
            .iter()
            .filter(|record| self.matches(record, today))
            .cloned()
            .collect()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Search on name and phone plus an optional specialty match.
#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    pub search: Option<String>,
    pub specialty: Option<String>,
}

impl ContactFilter {
    pub fn matches(&self, contact: &Contact) -> bool {
        if let Some(term) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let term = term.to_lowercase();
            if !contains_ignore_case(&contact.name, &term)
                && !contains_ignore_case(&contact.phone, &term)
            {
                return false;
            }
        }

        if let Some(wanted) = &self.specialty {
            match &contact.specialty {
                Some(specialty) if specialty.eq_ignore_ascii_case(wanted) => {}
                _ => return false,
            }
        }

        true
    }

    pub fn apply(&self, contacts: &[Contact]) -> Vec<Contact> {
        contacts
            .iter()
            .filter(|contact| self.matches(contact))
            .cloned()
            .collect()
    }
}
