//! Folds the nine layer answers into one [`ConsolidatedRecord`].
//!
//! Pure and infallible: the same answers always produce byte-identical JSON.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use tagscan_core::{
    is_unknown, ConsolidatedRecord, EquipmentNumbers, InspectionDate, ServiceCompany,
    ServiceDetails, UNKNOWN,
};
use tagscan_markdown::CodeBlockAnalyzer;

use crate::layers::FieldKind;

/// OCR substrings that flag an extinguisher for attention.
const ATTENTION_KEYWORDS: &[&str] = &["recharge", "service", "replace", "fail"];

/// Sentinel-normalized answers, one per layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerAnswers {
    pub raw_text: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub extinguisher_type: String,
    pub condition: String,
    pub service_company: String,
    pub equipment_numbers: String,
    pub service_details: String,
}

impl Default for LayerAnswers {
    /// Every layer unanswered.
    fn default() -> Self {
        let unknown = || UNKNOWN.to_string();
        Self {
            raw_text: unknown(),
            year: unknown(),
            month: unknown(),
            day: unknown(),
            extinguisher_type: unknown(),
            condition: unknown(),
            service_company: unknown(),
            equipment_numbers: unknown(),
            service_details: unknown(),
        }
    }
}

impl LayerAnswers {
    pub fn get(&self, kind: FieldKind) -> &str {
        match kind {
            FieldKind::RawText => &self.raw_text,
            FieldKind::Year => &self.year,
            FieldKind::Month => &self.month,
            FieldKind::Day => &self.day,
            FieldKind::ExtinguisherType => &self.extinguisher_type,
            FieldKind::Condition => &self.condition,
            FieldKind::ServiceCompany => &self.service_company,
            FieldKind::EquipmentNumbers => &self.equipment_numbers,
            FieldKind::ServiceDetails => &self.service_details,
        }
    }

    pub fn set(&mut self, kind: FieldKind, answer: impl Into<String>) {
        let slot = match kind {
            FieldKind::RawText => &mut self.raw_text,
            FieldKind::Year => &mut self.year,
            FieldKind::Month => &mut self.month,
            FieldKind::Day => &mut self.day,
            FieldKind::ExtinguisherType => &mut self.extinguisher_type,
            FieldKind::Condition => &mut self.condition,
            FieldKind::ServiceCompany => &mut self.service_company,
            FieldKind::EquipmentNumbers => &mut self.equipment_numbers,
            FieldKind::ServiceDetails => &mut self.service_details,
        };
        *slot = answer.into();
    }

    /// The scalar answers that count towards the confidence score.
    fn scored(&self) -> [&str; 5] {
        [
            self.year.as_str(),
            self.month.as_str(),
            self.day.as_str(),
            self.extinguisher_type.as_str(),
            self.condition.as_str(),
        ]
    }
}

/// Parse an answer made only of ASCII digits. Anything else, including
/// overflow, is `None`.
fn parse_numeric<T: FromStr>(answer: &str) -> Option<T> {
    let answer = answer.trim();
    if answer.is_empty() || !answer.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    answer.parse().ok()
}

/// A blank scalar becomes the sentinel; anything else is kept as answered.
fn scalar(answer: &str) -> String {
    let answer = answer.trim();
    if answer.is_empty() {
        UNKNOWN.to_string()
    } else {
        answer.to_string()
    }
}

/// One year after the inspection, when both dates exist on the calendar.
/// Year 0 and years past 9998 are treated as unreadable.
fn roll_forward(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Option<NaiveDate> {
    let (year, month, day) = (year?, month?, day?);
    if !(1..=9998).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)?;
    NaiveDate::from_ymd_opt(year + 1, month, day)
}

fn confidence(answers: &LayerAnswers) -> f64 {
    let scored = answers.scored();
    let known = scored.iter().filter(|a| !is_unknown(a)).count();
    let ratio = known as f64 / scored.len() as f64;
    (ratio * 100.0).round() / 100.0
}

fn requires_attention(condition: &str, raw_text: &str) -> bool {
    let raw_text = raw_text.to_lowercase();
    condition.trim().eq_ignore_ascii_case("poor")
        || ATTENTION_KEYWORDS.iter().any(|k| raw_text.contains(k))
}

/// Build the record from the layer answers.
pub fn consolidate(answers: &LayerAnswers) -> ConsolidatedRecord {
    let (y, m, d) = (answers.year.trim(), answers.month.trim(), answers.day.trim());
    let year = parse_numeric::<i32>(y);
    let month = parse_numeric::<u32>(m);
    let day = parse_numeric::<u32>(d);

    let next_due_date = roll_forward(year, month, day).map(|due| InspectionDate {
        year: Some(due.year()),
        month: Some(due.month()),
        day: Some(due.day()),
        extracted_text: format!("Calculated as 1 year after {y}-{m}-{d}"),
    });

    ConsolidatedRecord {
        last_inspection_date: InspectionDate {
            year,
            month,
            day,
            extracted_text: format!("Year: {y}, Month: {m}, Day: {d}"),
        },
        next_due_date,
        extinguisher_type: scalar(&answers.extinguisher_type),
        condition: scalar(&answers.condition),
        requires_attention: requires_attention(&answers.condition, &answers.raw_text),
        maintenance_notes: String::new(),
        confidence_score: confidence(answers),
        raw_text_analysis: answers.raw_text.clone(),
        service_company: CodeBlockAnalyzer::parse_or_default::<ServiceCompany>(
            FieldKind::ServiceCompany.name(),
            &answers.service_company,
        ),
        equipment_numbers: CodeBlockAnalyzer::parse_or_default::<EquipmentNumbers>(
            FieldKind::EquipmentNumbers.name(),
            &answers.equipment_numbers,
        ),
        service_details: CodeBlockAnalyzer::parse_or_default::<ServiceDetails>(
            FieldKind::ServiceDetails.name(),
            &answers.service_details,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(year: &str, month: &str, day: &str, kind: &str, condition: &str, ocr: &str) -> LayerAnswers {
        LayerAnswers {
            raw_text: ocr.into(),
            year: year.into(),
            month: month.into(),
            day: day.into(),
            extinguisher_type: kind.into(),
            condition: condition.into(),
            ..Default::default()
        }
    }

    #[test]
    fn all_unknown_with_empty_ocr() {
        let record = consolidate(&LayerAnswers {
            raw_text: String::new(),
            ..Default::default()
        });
        assert_eq!(record.confidence_score, 0.0);
        assert!(record.next_due_date.is_none());
        assert!(!record.requires_attention);
        assert_eq!(record.extinguisher_type, UNKNOWN);
        assert_eq!(record.condition, UNKNOWN);
        assert_eq!(record.last_inspection_date.year, None);
        assert_eq!(record.service_company, ServiceCompany::default());
        assert_eq!(record.equipment_numbers, EquipmentNumbers::default());
        assert_eq!(record.service_details, ServiceDetails::default());
        assert_eq!(record.raw_text_analysis, "");
        assert_eq!(record.maintenance_notes, "");
    }

    #[test]
    fn scenario_record() {
        let record = consolidate(&answers(
            "2023",
            "6",
            "15",
            "ABC",
            "Good",
            "ABC dry chemical, inspected 6/15/2023",
        ));
        assert_eq!(record.confidence_score, 1.0);
        assert!(!record.requires_attention);
        let due = record.next_due_date.unwrap();
        assert_eq!((due.year, due.month, due.day), (Some(2024), Some(6), Some(15)));
        assert_eq!(due.extracted_text, "Calculated as 1 year after 2023-6-15");
        assert_eq!(
            record.last_inspection_date.extracted_text,
            "Year: 2023, Month: 6, Day: 15"
        );
    }

    #[test]
    fn leap_day_has_no_next_due_date() {
        let record = consolidate(&answers("2024", "2", "29", "ABC", "Good", ""));
        assert_eq!(record.last_inspection_date.day, Some(29));
        assert!(record.next_due_date.is_none());
    }

    #[test]
    fn impossible_date_has_no_next_due_date() {
        let record = consolidate(&answers("2023", "13", "40", "ABC", "Good", ""));
        assert_eq!(record.last_inspection_date.month, Some(13));
        assert!(record.next_due_date.is_none());
    }

    #[test]
    fn non_numeric_date_parts_stay_null() {
        let record = consolidate(&answers("2023?", "June", "-5", "ABC", "Good", ""));
        let date = &record.last_inspection_date;
        assert_eq!((date.year, date.month, date.day), (None, None, None));
        assert!(record.next_due_date.is_none());
        // Answered, even if unparseable, still counts towards confidence.
        assert_eq!(record.confidence_score, 1.0);
    }

    #[test]
    fn year_overflow_is_null() {
        let record = consolidate(&answers("99999999999", "1", "1", "ABC", "Good", ""));
        assert_eq!(record.last_inspection_date.year, None);
    }

    #[test]
    fn poor_condition_requires_attention() {
        let record = consolidate(&answers("2023", "6", "15", "ABC", " poor ", "all fine"));
        assert!(record.requires_attention);
    }

    #[test]
    fn recharge_in_ocr_requires_attention() {
        let record = consolidate(&answers("2023", "6", "15", "ABC", "Good", "RECHARGED 2023"));
        assert!(record.requires_attention);
    }

    #[test]
    fn confidence_counts_informative_answers() {
        let record = consolidate(&answers("2023", "N/A", "null", "error", "Fair", ""));
        assert_eq!(record.confidence_score, 0.4);
        let record = consolidate(&answers("2023", "6", "unknown", "CO2", "  ", ""));
        assert_eq!(record.confidence_score, 0.6);
    }

    #[test]
    fn blank_scalars_become_unknown() {
        let record = consolidate(&answers("", "", "", " ", "", ""));
        assert_eq!(record.extinguisher_type, UNKNOWN);
        assert_eq!(record.condition, UNKNOWN);
    }

    #[test]
    fn consolidation_is_deterministic() {
        let mut input = answers("2023", "6", "15", "ABC", "Good", "inspected");
        input.service_company = r#"{"name": "Acme", "phone": "555-0100"}"#.into();
        let first = serde_json::to_string(&consolidate(&input)).unwrap();
        let second = serde_json::to_string(&consolidate(&input)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fenced_company_json_is_decoded() {
        let mut input = LayerAnswers::default();
        input.set(
            FieldKind::ServiceCompany,
            "```json\n{\"name\": \"Acme\", \"address\": null, \"website\": \"\"}\n```",
        );
        let record = consolidate(&input);
        assert_eq!(record.service_company.name, "Acme");
        assert_eq!(record.service_company.address, UNKNOWN);
        assert_eq!(record.service_company.phone, UNKNOWN);
        assert_eq!(record.service_company.website, UNKNOWN);
    }

    #[test]
    fn composites_embedded_in_prose_are_decoded() {
        let mut input = LayerAnswers::default();
        input.set(
            FieldKind::ServiceDetails,
            "Sure! {\"service_type\": \"Annual Inspection\", \"additional_services\": [\"Recharge\"]} Done.",
        );
        input.set(FieldKind::EquipmentNumbers, "not json at all");
        let record = consolidate(&input);
        assert_eq!(record.service_details.service_type, "Annual Inspection");
        assert_eq!(record.service_details.additional_services, vec!["Recharge"]);
        assert_eq!(record.equipment_numbers, EquipmentNumbers::default());
    }

    #[test]
    fn answers_round_trip_through_get_and_set() {
        let mut input = LayerAnswers::default();
        for kind in FieldKind::FAN_OUT {
            input.set(kind, kind.name());
        }
        for kind in FieldKind::FAN_OUT {
            assert_eq!(input.get(kind), kind.name());
        }
        assert_eq!(input.get(FieldKind::RawText), UNKNOWN);
    }
}
