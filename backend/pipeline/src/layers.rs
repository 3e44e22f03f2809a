//! The extraction layers: one fixed question per record field.

use serde::Serialize;
use std::fmt;

/// Placeholder in a prompt template replaced by the OCR transcription.
const RAW_TEXT_SLOT: &str = "{raw_text}";

/// Which record field a layer answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    RawText,
    Year,
    Month,
    Day,
    ExtinguisherType,
    Condition,
    ServiceCompany,
    EquipmentNumbers,
    ServiceDetails,
}

/// A named layer and its prompt template.
#[derive(Debug, Clone, Copy)]
pub struct FieldQuery {
    pub kind: FieldKind,
    pub template: &'static str,
}

impl FieldQuery {
    /// The prompt for this layer with the OCR text filled in.
    pub fn render(&self, raw_text: &str) -> String {
        self.template.replace(RAW_TEXT_SLOT, raw_text)
    }
}

impl FieldKind {
    /// Layers that run concurrently after OCR, in record order.
    pub const FAN_OUT: [FieldKind; 8] = [
        FieldKind::Year,
        FieldKind::Month,
        FieldKind::Day,
        FieldKind::ExtinguisherType,
        FieldKind::Condition,
        FieldKind::ServiceCompany,
        FieldKind::EquipmentNumbers,
        FieldKind::ServiceDetails,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::RawText => "raw_text",
            FieldKind::Year => "year",
            FieldKind::Month => "month",
            FieldKind::Day => "day",
            FieldKind::ExtinguisherType => "extinguisher_type",
            FieldKind::Condition => "condition",
            FieldKind::ServiceCompany => "service_company",
            FieldKind::EquipmentNumbers => "equipment_numbers",
            FieldKind::ServiceDetails => "service_details",
        }
    }

    pub fn query(self) -> FieldQuery {
        let template = match self {
            FieldKind::RawText => RAW_TEXT_PROMPT,
            FieldKind::Year => YEAR_PROMPT,
            FieldKind::Month => MONTH_PROMPT,
            FieldKind::Day => DAY_PROMPT,
            FieldKind::ExtinguisherType => TYPE_PROMPT,
            FieldKind::Condition => CONDITION_PROMPT,
            FieldKind::ServiceCompany => SERVICE_COMPANY_PROMPT,
            FieldKind::EquipmentNumbers => EQUIPMENT_NUMBERS_PROMPT,
            FieldKind::ServiceDetails => SERVICE_DETAILS_PROMPT,
        };
        FieldQuery { kind: self, template }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const RAW_TEXT_PROMPT: &str = "Look at this fire extinguisher inspection tag and extract ALL visible \
text exactly as it appears. Include numbers, dates, punched holes, and any written text. Return only \
the raw text with no commentary.";

const YEAR_PROMPT: &str = "This is a fire extinguisher inspection tag. Look for the most recent \
inspection year - this could be punched holes, handwritten numbers, or printed dates. From this text: \
'{raw_text}' and the image, what is the inspection YEAR? Respond with only the 4-digit year (e.g., \
2024) or 'unknown' if not found.";

const MONTH_PROMPT: &str = "This is a fire extinguisher inspection tag. Look for the most recent \
inspection month - this could be punched holes, handwritten numbers, or printed dates. From this text: \
'{raw_text}' and the image, what is the inspection MONTH? Respond with only the month number (1-12) or \
'unknown' if not found.";

const DAY_PROMPT: &str = "This is a fire extinguisher inspection tag. Look for the most recent \
inspection day - this could be punched holes, handwritten numbers, or printed dates. From this text: \
'{raw_text}' and the image, what is the inspection DAY? Respond with only the day number (1-31) or \
'unknown' if not found.";

const TYPE_PROMPT: &str = "This is a fire extinguisher inspection tag. Look for the extinguisher type \
classification (like ABC, BC, CO2, Class A, Class B, Class C, Class K, Water, Foam, etc.). From this \
text: '{raw_text}' and the image, what is the extinguisher TYPE? Respond with only the type (e.g., \
'ABC', 'CO2') or 'unknown' if not found.";

const CONDITION_PROMPT: &str = "This is a fire extinguisher inspection tag. Based on the inspection \
information, assess the overall condition. Look for any indicators of problems, maintenance needs, or \
good condition. From this text: '{raw_text}' and the image, what is the overall CONDITION? Respond with \
only 'Good', 'Fair', 'Poor', or 'unknown'.";

const SERVICE_COMPANY_PROMPT: &str = "This is a fire extinguisher inspection tag. Find the servicing \
company printed on the tag. From this text: '{raw_text}' and the image, respond with only a JSON object \
with exactly these keys: {\"name\": string, \"address\": string, \"phone\": string, \"website\": \
string}. Use \"unknown\" for any value that is not on the tag.";

const EQUIPMENT_NUMBERS_PROMPT: &str = "This is a fire extinguisher inspection tag. Find the equipment \
identification numbers labelled AE, HE, EE and FE. From this text: '{raw_text}' and the image, respond \
with only a JSON object with exactly these keys: {\"ae_number\": string, \"he_number\": string, \
\"ee_number\": string, \"fe_number\": string}. Use \"unknown\" for any number that is not on the tag.";

const SERVICE_DETAILS_PROMPT: &str = "This is a fire extinguisher inspection tag. Identify the service \
performed (for example annual inspection, recharge, hydrostatic test, 6-year maintenance) and any \
additional services marked. From this text: '{raw_text}' and the image, respond with only a JSON object \
with exactly these keys: {\"service_type\": string, \"additional_services\": [string]}. Use \"unknown\" \
for the service type and an empty list if nothing is marked.";
