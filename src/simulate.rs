//! Offline stand-in for the matching service.

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::api::{ApiError, BuyerAck, RawMatch, RawWasteProfile, RawWasteStream, WasteApi};
use crate::models::{
    BuyerRecord, EnvironmentalImpact, FormSubmission, MatchSummary, OperationalData, Submission,
    WasteProfile,
};
use crate::wizard::displayed_score;

#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedApi;

fn stream(
    waste_type: &str,
    range: (f64, f64),
    quality_grade: &str,
    contamination_pct: f64,
    hazard_class: &str,
) -> RawWasteStream {
    RawWasteStream {
        waste_type: waste_type.to_string(),
        quantity_min_tons: range.0,
        quantity_max_tons: range.1,
        quality_grade: quality_grade.to_string(),
        contamination_pct,
        hazard_class: hazard_class.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn candidate(
    id: u64,
    company: &str,
    buyer_type: &str,
    scores: (f64, f64, f64),
    distance: f64,
    cost_saving: f64,
    impact: (f64, f64),
    compliance: &str,
    requirements: &str,
    pricing: &str,
) -> RawMatch {
    RawMatch {
        id: Some(id),
        company: Some(company.to_string()),
        buyer_type: Some(buyer_type.to_string()),
        material_match: Some(scores.0),
        quality_fit: Some(scores.1),
        overall_score: Some(scores.2),
        distance: Some(distance),
        cost_saving: Some(cost_saving),
        environmental_impact: Some(EnvironmentalImpact {
            co2_saved: impact.0,
            landfill_diverted: impact.1,
        }),
        compliance: Some(compliance.to_string()),
        requirements: Some(requirements.to_string()),
        pricing: Some(pricing.to_string()),
    }
}

/// Orders candidates by the overall score they will be shown with, highest
/// first.
pub fn sort_by_score(matches: &mut [RawMatch]) {
    matches.sort_by(|a, b| {
        displayed_score(b)
            .partial_cmp(&displayed_score(a))
            .unwrap_or(Ordering::Equal)
    });
}

#[async_trait]
impl WasteApi for SimulatedApi {
    async fn predict_waste(&self, data: &OperationalData) -> Result<RawWasteProfile, ApiError> {
        tracing::debug!(industry = %data.industry, "simulating waste profile");
        Ok(RawWasteProfile {
            waste_streams: vec![
                stream(
                    "Metal Scrap (Steel)",
                    (15.0, 20.0),
                    "Grade A",
                    2.0,
                    "Non-hazardous",
                ),
                stream(
                    "Lubricant Oil (Used)",
                    (0.2, 0.3),
                    "Moderate degradation",
                    5.0,
                    "Hazardous",
                ),
            ],
            overall_confidence: 0.87,
        })
    }

    async fn find_matches(
        &self,
        _data: &OperationalData,
        profile: &WasteProfile,
    ) -> Result<Vec<RawMatch>, ApiError> {
        tracing::debug!(streams = profile.waste_types.len(), "simulating matches");
        let mut matches = vec![
            candidate(
                3,
                "India Circular Metals Network",
                "Metal Broker",
                (85.0, 90.0, 82.0),
                120.0,
                2200.0,
                (10.8, 18.0),
                "ISO 14001 certified",
                "Mixed metal scrap, flexible volumes",
                "₹12,000-16,000/ton",
            ),
            candidate(
                1,
                "Bharat Steel Recycling Pvt Ltd",
                "Metal Recycler",
                (98.0, 95.0, 94.0),
                45.0,
                2800.0,
                (12.5, 18.0),
                "Fully compliant",
                "Min 10 tons/month, Grade A-B steel",
                "₹15,000-18,000/ton",
            ),
            candidate(
                2,
                "Maharashtra Oil Reclamation Ltd",
                "Oil Processor",
                (92.0, 88.0, 87.0),
                78.0,
                1200.0,
                (3.2, 0.3),
                "CPCB certified",
                "Used industrial lubricants, min 150L/month",
                "₹40-65/liter collection fee",
            ),
        ];
        sort_by_score(&mut matches);
        Ok(matches)
    }

    async fn save_matches(&self, matches: &[MatchSummary]) -> Result<(), ApiError> {
        tracing::debug!(count = matches.len(), "simulated save of matches");
        Ok(())
    }

    async fn save_form(&self, submission: &FormSubmission) -> Result<(), ApiError> {
        tracing::debug!(timestamp = %submission.timestamp, "simulated save of form");
        Ok(())
    }

    async fn list_submissions(&self) -> Result<Vec<Submission>, ApiError> {
        Ok(Vec::new())
    }

    async fn add_buyer(&self, buyer: &BuyerRecord) -> Result<BuyerAck, ApiError> {
        Ok(BuyerAck {
            message: Some(format!("Buyer {} accepted (simulated)", buyer.company_name)),
            buyer_id: None,
        })
    }
}
