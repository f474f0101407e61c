use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::models::{
    BuyerRecord, EnvironmentalImpact, FormSubmission, MatchSummary, OperationalData, Submission,
    WasteProfile,
};

pub const PREDICT_WASTE: &str = "/api/predict-waste";
pub const FIND_MATCHES: &str = "/api/find-matches";
pub const SAVE_MATCHES: &str = "/api/save-matches";
pub const SAVE_FORM: &str = "/api/save-form";
pub const SUBMISSIONS: &str = "/api/submissions";
pub const ADD_BUYER: &str = "/api/add-buyer";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{endpoint} answered HTTP {status}{}", detail_suffix(.detail))]
    Status {
        endpoint: &'static str,
        status: u16,
        detail: Option<String>,
    },
    #[error("{endpoint} reported failure{}", detail_suffix(.message))]
    Rejected {
        endpoint: &'static str,
        message: Option<String>,
    },
    #[error("{endpoint} returned an unexpected response: {detail}")]
    Malformed {
        endpoint: &'static str,
        detail: String,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawWasteStream {
    #[serde(rename = "type")]
    pub waste_type: String,
    pub quantity_min_tons: f64,
    pub quantity_max_tons: f64,
    pub quality_grade: String,
    pub contamination_pct: f64,
    pub hazard_class: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawWasteProfile {
    pub waste_streams: Vec<RawWasteStream>,
    pub overall_confidence: f64,
}

/// A match candidate as the service sends it; any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMatch {
    pub id: Option<u64>,
    pub company: Option<String>,
    #[serde(rename = "type")]
    pub buyer_type: Option<String>,
    pub material_match: Option<f64>,
    pub quality_fit: Option<f64>,
    pub distance: Option<f64>,
    pub cost_saving: Option<f64>,
    pub environmental_impact: Option<EnvironmentalImpact>,
    pub compliance: Option<String>,
    pub overall_score: Option<f64>,
    pub requirements: Option<String>,
    pub pricing: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuyerAck {
    pub message: Option<String>,
    pub buyer_id: Option<String>,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    success: bool,
    waste_profile: Option<RawWasteProfile>,
}

#[derive(Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    success: bool,
    matches: Option<Vec<RawMatch>>,
}

#[derive(Deserialize)]
struct AddBuyerResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    buyer_id: Option<String>,
}

#[derive(Deserialize)]
struct SubmissionsResponse {
    #[serde(default)]
    submissions: Vec<Submission>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// The remote collaborators the wizard and buyer form talk to.
#[async_trait]
pub trait WasteApi: Send + Sync {
    async fn predict_waste(&self, data: &OperationalData) -> Result<RawWasteProfile, ApiError>;

    async fn find_matches(
        &self,
        data: &OperationalData,
        profile: &WasteProfile,
    ) -> Result<Vec<RawMatch>, ApiError>;

    async fn save_matches(&self, matches: &[MatchSummary]) -> Result<(), ApiError>;

    async fn save_form(&self, submission: &FormSubmission) -> Result<(), ApiError>;

    async fn list_submissions(&self) -> Result<Vec<Submission>, ApiError>;

    async fn add_buyer(&self, buyer: &BuyerRecord) -> Result<BuyerAck, ApiError>;
}

pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        body: &T,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(endpoint, base_url = %self.base_url, "POST");
        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    check_status(endpoint, status.as_u16(), &bytes)?;

    serde_json::from_slice(&bytes).map_err(|err| ApiError::Malformed {
        endpoint,
        detail: err.to_string(),
    })
}

async fn acknowledge(endpoint: &'static str, response: reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    check_status(endpoint, status.as_u16(), &bytes)
}

fn check_status(endpoint: &'static str, status: u16, body: &[u8]) -> Result<(), ApiError> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.detail);
    Err(ApiError::Status {
        endpoint,
        status,
        detail,
    })
}

fn predicted_profile(response: PredictResponse) -> Result<RawWasteProfile, ApiError> {
    match (response.success, response.waste_profile) {
        (true, Some(profile)) => Ok(profile),
        (true, None) => Err(ApiError::Malformed {
            endpoint: PREDICT_WASTE,
            detail: "missing waste_profile".to_string(),
        }),
        (false, _) => Err(ApiError::Rejected {
            endpoint: PREDICT_WASTE,
            message: None,
        }),
    }
}

fn matched_candidates(response: MatchesResponse) -> Result<Vec<RawMatch>, ApiError> {
    match (response.success, response.matches) {
        (true, Some(matches)) => Ok(matches),
        (true, None) => Err(ApiError::Malformed {
            endpoint: FIND_MATCHES,
            detail: "missing matches".to_string(),
        }),
        (false, _) => Err(ApiError::Rejected {
            endpoint: FIND_MATCHES,
            message: None,
        }),
    }
}

fn buyer_ack(response: AddBuyerResponse) -> Result<BuyerAck, ApiError> {
    if !response.success {
        return Err(ApiError::Rejected {
            endpoint: ADD_BUYER,
            message: response.message,
        });
    }

    Ok(BuyerAck {
        message: response.message,
        buyer_id: response.buyer_id,
    })
}

#[async_trait]
impl WasteApi for HttpApi {
    async fn predict_waste(&self, data: &OperationalData) -> Result<RawWasteProfile, ApiError> {
        let response = self.post(PREDICT_WASTE, data).await?;
        predicted_profile(decode(PREDICT_WASTE, response).await?)
    }

    // The service recomputes the profile from the operational data itself.
    async fn find_matches(
        &self,
        data: &OperationalData,
        _profile: &WasteProfile,
    ) -> Result<Vec<RawMatch>, ApiError> {
        let response = self.post(FIND_MATCHES, data).await?;
        matched_candidates(decode(FIND_MATCHES, response).await?)
    }

    async fn save_matches(&self, matches: &[MatchSummary]) -> Result<(), ApiError> {
        let response = self.post(SAVE_MATCHES, matches).await?;
        acknowledge(SAVE_MATCHES, response).await
    }

    async fn save_form(&self, submission: &FormSubmission) -> Result<(), ApiError> {
        let response = self.post(SAVE_FORM, submission).await?;
        acknowledge(SAVE_FORM, response).await
    }

    async fn list_submissions(&self) -> Result<Vec<Submission>, ApiError> {
        tracing::debug!(endpoint = SUBMISSIONS, base_url = %self.base_url, "GET");
        let response = self
            .client
            .get(format!("{}{}", self.base_url, SUBMISSIONS))
            .send()
            .await?;
        let body: SubmissionsResponse = decode(SUBMISSIONS, response).await?;
        Ok(body.submissions)
    }

    async fn add_buyer(&self, buyer: &BuyerRecord) -> Result<BuyerAck, ApiError> {
        let response = self.post(ADD_BUYER, buyer).await?;
        buyer_ack(decode(ADD_BUYER, response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn predict_response_yields_streams() {
        let response: PredictResponse = serde_json::from_value(json!({
            "success": true,
            "waste_profile": {
                "waste_streams": [{
                    "type": "metal_shavings",
                    "category": "metal",
                    "quantity_min_tons": 1.5,
                    "quantity_max_tons": 3,
                    "quality_grade": "Grade B",
                    "contamination_pct": 4.2,
                    "hazard_class": "Non-hazardous",
                    "confidence": 0.8
                }],
                "overall_confidence": 0.76,
                "num_waste_types": 1
            }
        }))
        .unwrap();

        let profile = predicted_profile(response).unwrap();
        assert_eq!(profile.waste_streams.len(), 1);
        assert_eq!(profile.waste_streams[0].waste_type, "metal_shavings");
        assert_eq!(profile.overall_confidence, 0.76);
    }

    #[test]
    fn predict_without_success_is_rejected() {
        let response: PredictResponse =
            serde_json::from_value(json!({ "success": false })).unwrap();
        assert!(matches!(
            predicted_profile(response),
            Err(ApiError::Rejected { endpoint: PREDICT_WASTE, .. })
        ));
    }

    #[test]
    fn predict_without_profile_is_malformed() {
        let response: PredictResponse =
            serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(matches!(
            predicted_profile(response),
            Err(ApiError::Malformed { .. })
        ));
    }

    #[test]
    fn raw_match_tolerates_missing_fields() {
        let response: MatchesResponse = serde_json::from_value(json!({
            "success": true,
            "matches": [
                {
                    "company": "Green Loop",
                    "overallScore": 71.5,
                    "environmentalImpact": { "co2Saved": 2.5 }
                },
                {}
            ]
        }))
        .unwrap();

        let matches = matched_candidates(response).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].company.as_deref(), Some("Green Loop"));
        assert_eq!(matches[0].overall_score, Some(71.5));
        assert_eq!(
            matches[0].environmental_impact,
            Some(EnvironmentalImpact {
                co2_saved: 2.5,
                landfill_diverted: 0.0
            })
        );
        assert_eq!(matches[1], RawMatch::default());
    }

    #[test]
    fn add_buyer_failure_keeps_message() {
        let response: AddBuyerResponse = serde_json::from_value(json!({
            "success": false,
            "message": "duplicate company"
        }))
        .unwrap();

        let err = buyer_ack(response).unwrap_err();
        assert_eq!(err.to_string(), "/api/add-buyer reported failure: duplicate company");
    }

    #[test]
    fn add_buyer_success_carries_id() {
        let response: AddBuyerResponse = serde_json::from_value(json!({
            "success": true,
            "message": "Buyer B104 added successfully",
            "buyer_id": "B104"
        }))
        .unwrap();

        assert_eq!(buyer_ack(response).unwrap().buyer_id.as_deref(), Some("B104"));
    }

    #[test]
    fn non_success_status_reads_detail() {
        let body = br#"{"detail": "unknown industry"}"#;
        let err = check_status(PREDICT_WASTE, 400, body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "/api/predict-waste answered HTTP 400: unknown industry"
        );
        assert!(check_status(SAVE_FORM, 200, b"").is_ok());
        assert!(matches!(
            check_status(SAVE_FORM, 500, b"oops"),
            Err(ApiError::Status { status: 500, detail: None, .. })
        ));
    }
}
