use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_UNITS_PER_MONTH: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalData {
    pub industry: String,
    pub product: String,
    pub process: String,
    pub machinery: String,
    pub scale: String,
    pub location: String,
    #[serde(default = "default_units_per_month")]
    pub units_per_month: u32,
}

fn default_units_per_month() -> u32 {
    DEFAULT_UNITS_PER_MONTH
}

impl Default for OperationalData {
    fn default() -> Self {
        Self {
            industry: String::new(),
            product: String::new(),
            process: String::new(),
            machinery: String::new(),
            scale: String::new(),
            location: String::new(),
            units_per_month: DEFAULT_UNITS_PER_MONTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WasteType {
    pub waste_type: String,
    pub quantity: String,
    pub quality: String,
    pub contamination: String,
    pub hazard_level: String,
    pub composition: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WasteProfile {
    pub waste_types: Vec<WasteType>,
    pub confidence: f64,
    pub regulatory_flags: Vec<String>,
    pub location: String,
    pub industry: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalImpact {
    #[serde(default)]
    pub co2_saved: f64,
    #[serde(default)]
    pub landfill_diverted: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: u64,
    pub company: String,
    pub buyer_type: String,
    pub material_match: f64,
    pub quality_fit: f64,
    pub distance: f64,
    pub cost_saving: f64,
    pub environmental_impact: EnvironmentalImpact,
    pub compliance: String,
    pub overall_score: f64,
    pub requirements: String,
    pub pricing: String,
}

/// A match as persisted by the outreach step: everything but the buyer's
/// requirements and pricing text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: u64,
    pub company: String,
    #[serde(rename = "type")]
    pub buyer_type: String,
    pub material_match: f64,
    pub quality_fit: f64,
    pub distance: f64,
    pub cost_saving: f64,
    pub environmental_impact: EnvironmentalImpact,
    pub compliance: String,
    pub overall_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyerRecord {
    pub company_name: String,
    pub company_type: String,
    pub accepted_waste_types: String,
    pub accepted_categories: String,
    pub min_quality_grade: String,
    pub min_monthly_volume_tons: u32,
    pub max_monthly_volume_tons: u32,
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
    pub pricing_model: String,
    pub certifications: String,
    pub contact_email: String,
    pub contact_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSubmission {
    pub operational_data: OperationalData,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Submission {
    pub timestamp: String,
    pub data: OperationalData,
}
