//! Human-readable summary of one analysis.

use chrono::NaiveDate;

use tagscan_core::{is_unknown, DueStatus, InspectionDate};
use tagscan_pipeline::InspectionAnalysis;

use crate::terminal_output::{paint, render_table, BOLD, CYAN, DIM, GREEN, RED, YELLOW};

fn format_date(date: &InspectionDate) -> String {
    match (date.year, date.month, date.day) {
        (Some(y), Some(m), Some(d)) => format!("{y:04}-{m:02}-{d:02}"),
        _ => paint(&date.extracted_text, DIM),
    }
}

fn value(text: &str) -> String {
    if is_unknown(text) {
        paint("unknown", DIM)
    } else {
        text.to_string()
    }
}

fn status_label(status: DueStatus) -> String {
    match status {
        DueStatus::Overdue => paint("OVERDUE", RED),
        DueStatus::DueSoon => paint("due soon", YELLOW),
        DueStatus::Current => paint("current", GREEN),
        DueStatus::Unknown => paint("unknown", DIM),
    }
}

/// Render the record as a field/value table followed by degraded layers.
pub fn render_summary(analysis: &InspectionAnalysis, today: NaiveDate, window_days: i64) -> String {
    let record = &analysis.record;
    let company = &record.service_company;
    let numbers = &record.equipment_numbers;

    let next_due = match &record.next_due_date {
        Some(date) => format!(
            "{} ({})",
            format_date(date),
            status_label(analysis.due_status(today, window_days))
        ),
        None => paint("not derivable", DIM),
    };
    let attention = if record.requires_attention {
        paint("YES", RED)
    } else {
        "no".to_string()
    };
    let mut services = record.service_details.service_type.clone();
    if !record.service_details.additional_services.is_empty() {
        services = format!(
            "{} + {}",
            services,
            record.service_details.additional_services.join(", ")
        );
    }

    let rows = vec![
        ("Last inspection".to_string(), format_date(&record.last_inspection_date)),
        ("Next due".to_string(), next_due),
        ("Type".to_string(), value(&record.extinguisher_type)),
        ("Condition".to_string(), value(&record.condition)),
        ("Needs attention".to_string(), attention),
        ("Confidence".to_string(), format!("{:.0}%", record.confidence_score * 100.0)),
        ("Service company".to_string(), value(&company.name)),
        ("  phone".to_string(), value(&company.phone)),
        ("Service".to_string(), value(&services)),
        (
            "Equipment AE/HE/EE/FE".to_string(),
            [&numbers.ae_number, &numbers.he_number, &numbers.ee_number, &numbers.fe_number]
                .iter()
                .map(|n| value(n))
                .collect::<Vec<_>>()
                .join(" / "),
        ),
    ];

    let mut out = format!(
        "{} {}\n\n",
        paint("Inspection", BOLD),
        paint(&analysis.inspection_id.to_string(), CYAN)
    );
    out.push_str(&render_table(("Field", "Value"), &rows));

    let degraded = analysis.degraded_layers();
    if !degraded.is_empty() {
        let names: Vec<&str> = degraded.iter().map(|k| k.name()).collect();
        out.push_str(&format!(
            "\n{}\n",
            paint(&format!("Unanswered layers: {}", names.join(", ")), YELLOW)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal_output::strip_ansi;
    use std::collections::BTreeMap;
    use tagscan_pipeline::{consolidate, FieldKind, LayerAnswers};

    fn analysis(answers: LayerAnswers) -> InspectionAnalysis {
        InspectionAnalysis {
            inspection_id: Default::default(),
            record: consolidate(&answers),
            outcomes: BTreeMap::new(),
        }
    }

    #[test]
    fn summary_shows_dates_and_status() {
        let mut answers = LayerAnswers::default();
        answers.set(FieldKind::Year, "2023");
        answers.set(FieldKind::Month, "6");
        answers.set(FieldKind::Day, "15");
        answers.set(FieldKind::ExtinguisherType, "ABC");

        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let text = strip_ansi(&render_summary(&analysis(answers), today, 30));

        assert!(text.contains("2023-06-15"));
        assert!(text.contains("2024-06-15 (due soon)"));
        assert!(text.contains("ABC"));
        assert!(text.contains("80%"));
    }

    #[test]
    fn summary_without_date_says_not_derivable() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let text = strip_ansi(&render_summary(&analysis(LayerAnswers::default()), today, 30));
        assert!(text.contains("not derivable"));
        assert!(!text.contains("Unanswered layers"));
    }
}
