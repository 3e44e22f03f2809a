//! The consolidated inspection record and its composite parts.
//!
//! Every string leaf is either a concrete value or the [`UNKNOWN`] sentinel;
//! composite parts decode leniently so partial model output never leaves a
//! null behind.

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sentinel meaning "could not determine". Distinct from the empty string.
pub const UNKNOWN: &str = "unknown";

/// Default look-ahead window for [`DueStatus::DueSoon`].
pub const DEFAULT_DUE_SOON_DAYS: i64 = 30;

/// Answers that carry no information: the sentinel, its common spellings,
/// and blanks.
pub fn is_unknown(answer: &str) -> bool {
    let answer = answer.trim();
    answer.is_empty()
        || ["unknown", "n/a", "error", "null"]
            .iter()
            .any(|s| answer.eq_ignore_ascii_case(s))
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Accept any JSON scalar for a string field; null and blanks become the sentinel.
fn sentinel_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => unknown(),
        Some(Value::String(s)) if s.trim().is_empty() => unknown(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    })
}

/// Accept an array (non-string items stringified, blanks dropped), a single
/// string, or null.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !is_unknown(s))
            .collect(),
        Some(Value::String(s)) if !is_unknown(&s) => vec![s.trim().to_string()],
        _ => Vec::new(),
    };
    Ok(items)
}

/// A year/month/day triple as read off (or derived from) the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub extracted_text: String,
}

impl InspectionDate {
    /// The calendar date, if all parts are known and valid.
    pub fn as_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }
}

/// Company that last serviced the extinguisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCompany {
    #[serde(default = "unknown", deserialize_with = "sentinel_string")]
    pub name: String,
    #[serde(default = "unknown", deserialize_with = "sentinel_string")]
    pub address: String,
    #[serde(default = "unknown", deserialize_with = "sentinel_string")]
    pub phone: String,
    #[serde(default = "unknown", deserialize_with = "sentinel_string")]
    pub website: String,
}

impl Default for ServiceCompany {
    fn default() -> Self {
        Self {
            name: unknown(),
            address: unknown(),
            phone: unknown(),
            website: unknown(),
        }
    }
}

/// Equipment identifiers printed or written on the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentNumbers {
    #[serde(default = "unknown", deserialize_with = "sentinel_string")]
    pub ae_number: String,
    #[serde(default = "unknown", deserialize_with = "sentinel_string")]
    pub he_number: String,
    #[serde(default = "unknown", deserialize_with = "sentinel_string")]
    pub ee_number: String,
    #[serde(default = "unknown", deserialize_with = "sentinel_string")]
    pub fe_number: String,
}

impl Default for EquipmentNumbers {
    fn default() -> Self {
        Self {
            ae_number: unknown(),
            he_number: unknown(),
            ee_number: unknown(),
            fe_number: unknown(),
        }
    }
}

/// What kind of service was performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDetails {
    #[serde(default = "unknown", deserialize_with = "sentinel_string")]
    pub service_type: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub additional_services: Vec<String>,
}

impl Default for ServiceDetails {
    fn default() -> Self {
        Self {
            service_type: unknown(),
            additional_services: Vec::new(),
        }
    }
}

/// The pipeline's sole output, handed by value to persistence and
/// notification collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    pub last_inspection_date: InspectionDate,
    pub next_due_date: Option<InspectionDate>,
    pub extinguisher_type: String,
    pub condition: String,
    pub requires_attention: bool,
    /// Always empty from the pipeline; reserved for manual edits downstream.
    #[serde(default)]
    pub maintenance_notes: String,
    pub confidence_score: f64,
    pub raw_text_analysis: String,
    pub service_company: ServiceCompany,
    pub equipment_numbers: EquipmentNumbers,
    pub service_details: ServiceDetails,
}

/// Where a record's renewal date falls relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    DueSoon,
    Current,
    Unknown,
}

impl ConsolidatedRecord {
    /// The renewal date, if one could be derived.
    pub fn next_due(&self) -> Option<NaiveDate> {
        self.next_due_date.as_ref().and_then(InspectionDate::as_naive_date)
    }

    /// Classify the renewal date against `today`; anything due within
    /// `window_days` (inclusive) is `DueSoon`. A window reaching past the
    /// calendar's end covers every future date.
    pub fn due_status(&self, today: NaiveDate, window_days: i64) -> DueStatus {
        let Some(due) = self.next_due() else {
            return DueStatus::Unknown;
        };
        if due < today {
            DueStatus::Overdue
        } else if TimeDelta::try_days(window_days)
            .and_then(|window| today.checked_add_signed(window))
            .map_or(true, |horizon| due <= horizon)
        {
            DueStatus::DueSoon
        } else {
            DueStatus::Current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_due(year: i32, month: u32, day: u32) -> ConsolidatedRecord {
        ConsolidatedRecord {
            last_inspection_date: InspectionDate {
                year: Some(year - 1),
                month: Some(month),
                day: Some(day),
                extracted_text: String::new(),
            },
            next_due_date: Some(InspectionDate {
                year: Some(year),
                month: Some(month),
                day: Some(day),
                extracted_text: String::new(),
            }),
            extinguisher_type: "ABC".into(),
            condition: "Good".into(),
            requires_attention: false,
            maintenance_notes: String::new(),
            confidence_score: 1.0,
            raw_text_analysis: String::new(),
            service_company: ServiceCompany::default(),
            equipment_numbers: EquipmentNumbers::default(),
            service_details: ServiceDetails::default(),
        }
    }

    #[test]
    fn is_unknown_covers_sentinel_spellings() {
        for answer in ["unknown", "UNKNOWN", " n/a ", "Error", "null", "", "   "] {
            assert!(is_unknown(answer), "{answer:?} should be unknown");
        }
        assert!(!is_unknown("ABC"));
        assert!(!is_unknown("0"));
    }

    #[test]
    fn partial_company_fills_missing_keys() {
        let company: ServiceCompany =
            serde_json::from_str(r#"{"name": "Acme Fire", "phone": null, "website": ""}"#).unwrap();
        assert_eq!(company.name, "Acme Fire");
        assert_eq!(company.address, UNKNOWN);
        assert_eq!(company.phone, UNKNOWN);
        assert_eq!(company.website, UNKNOWN);
    }

    #[test]
    fn numeric_equipment_numbers_are_stringified() {
        let numbers: EquipmentNumbers =
            serde_json::from_str(r#"{"ae_number": 10442, "fe_number": "FE-7"}"#).unwrap();
        assert_eq!(numbers.ae_number, "10442");
        assert_eq!(numbers.fe_number, "FE-7");
        assert_eq!(numbers.he_number, UNKNOWN);
    }

    #[test]
    fn additional_services_accepts_single_string() {
        let details: ServiceDetails = serde_json::from_str(
            r#"{"service_type": "Annual", "additional_services": "Hydrostatic test"}"#,
        )
        .unwrap();
        assert_eq!(details.service_type, "Annual");
        assert_eq!(details.additional_services, vec!["Hydrostatic test".to_string()]);

        let details: ServiceDetails =
            serde_json::from_str(r#"{"additional_services": ["Recharge", "unknown", null]}"#)
                .unwrap();
        assert_eq!(details.service_type, UNKNOWN);
        assert_eq!(details.additional_services, vec!["Recharge".to_string()]);
    }

    #[test]
    fn record_serializes_missing_due_date_as_null() {
        let mut record = record_due(2025, 6, 15);
        record.next_due_date = None;
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["next_due_date"].is_null());
        assert_eq!(json["service_company"]["name"], UNKNOWN);
    }

    #[test]
    fn due_status_classification() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(record_due(2025, 5, 31).due_status(today, 30), DueStatus::Overdue);
        assert_eq!(record_due(2025, 6, 1).due_status(today, 30), DueStatus::DueSoon);
        assert_eq!(record_due(2025, 7, 1).due_status(today, 30), DueStatus::DueSoon);
        assert_eq!(record_due(2025, 7, 2).due_status(today, 30), DueStatus::Current);

        let mut record = record_due(2025, 7, 2);
        record.next_due_date = None;
        assert_eq!(record.due_status(today, 30), DueStatus::Unknown);
    }

    #[test]
    fn huge_window_does_not_overflow() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let record = record_due(2025, 6, 1);
        assert_eq!(record.due_status(today, 1_000_000_000), DueStatus::DueSoon);
        assert_eq!(record.due_status(today, i64::MAX), DueStatus::DueSoon);
        assert_eq!(record_due(2024, 5, 1).due_status(today, i64::MAX), DueStatus::Overdue);
    }
}
