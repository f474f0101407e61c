use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use crate::api::{ApiError, BuyerAck, WasteApi};
use crate::models::BuyerRecord;
use crate::reference;

/// How long the success view stays up before returning to the caller.
pub const SUCCESS_RETURN_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum BuyerError {
    #[error("a submission is already in progress")]
    AlreadySubmitting,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BuyerError {
    pub fn alert(&self) -> String {
        match self {
            BuyerError::AlreadySubmitting => self.to_string(),
            BuyerError::Api(ApiError::Rejected { message, .. }) => format!(
                "Error adding buyer: {}",
                message.as_deref().unwrap_or("Unknown error")
            ),
            BuyerError::Api(_) => "Error adding buyer.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuyerForm {
    pub company_name: String,
    pub company_type: String,
    pub accepted_waste_types: String,
    pub accepted_categories: String,
    pub min_quality_grade: String,
    pub min_monthly_volume_tons: u32,
    pub max_monthly_volume_tons: u32,
    pub pricing_model: String,
    pub contact_email: String,
    pub contact_name: String,
    city: String,
    state: String,
    lat: f64,
    lng: f64,
    certifications: Vec<String>,
    submitting: bool,
}

impl Default for BuyerForm {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            company_type: String::new(),
            accepted_waste_types: String::new(),
            accepted_categories: String::new(),
            min_quality_grade: String::new(),
            min_monthly_volume_tons: 1,
            max_monthly_volume_tons: 100,
            pricing_model: String::new(),
            contact_email: String::new(),
            contact_name: String::new(),
            city: String::new(),
            state: String::new(),
            lat: 0.0,
            lng: 0.0,
            certifications: Vec::new(),
            submitting: false,
        }
    }
}

impl BuyerForm {
    /// Copies city, state and coordinates from the location table. An
    /// unknown city leaves the current location untouched and returns false.
    pub fn select_city(&mut self, city: &str) -> bool {
        let Some(location) = reference::location(city) else {
            tracing::debug!(city, "city not in location table");
            return false;
        };

        self.city = location.city.to_string();
        self.state = location.state.to_string();
        self.lat = location.lat;
        self.lng = location.lng;
        true
    }

    pub fn toggle_certification(&mut self, certification: &str) {
        if let Some(pos) = self.certifications.iter().position(|c| c == certification) {
            self.certifications.remove(pos);
        } else {
            self.certifications.push(certification.to_string());
        }
    }

    #[cfg(test)]
    pub fn certifications(&self) -> &[String] {
        &self.certifications
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn to_record(&self) -> BuyerRecord {
        BuyerRecord {
            company_name: self.company_name.clone(),
            company_type: self.company_type.clone(),
            accepted_waste_types: self.accepted_waste_types.clone(),
            accepted_categories: self.accepted_categories.clone(),
            min_quality_grade: self.min_quality_grade.clone(),
            min_monthly_volume_tons: self.min_monthly_volume_tons,
            max_monthly_volume_tons: self.max_monthly_volume_tons,
            city: self.city.clone(),
            state: self.state.clone(),
            lat: self.lat,
            lng: self.lng,
            pricing_model: self.pricing_model.clone(),
            certifications: self.certifications.join(","),
            contact_email: self.contact_email.clone(),
            contact_name: self.contact_name.clone(),
        }
    }

    /// Posts the form once. On failure every field keeps what was entered.
    pub async fn submit<A: WasteApi + ?Sized>(
        &mut self,
        api: &A,
    ) -> Result<BuyerAck, BuyerError> {
        if self.submitting {
            return Err(BuyerError::AlreadySubmitting);
        }

        let record = self.to_record();
        let _submitting = Submitting::raise(&mut self.submitting);
        tracing::info!(
            company = %record.company_name,
            city = %record.city,
            "adding buyer"
        );

        match api.add_buyer(&record).await {
            Ok(ack) => {
                tracing::info!(buyer_id = ?ack.buyer_id, "buyer added");
                Ok(ack)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    company = %record.company_name,
                    "adding buyer failed"
                );
                Err(err.into())
            }
        }
    }
}

/// Keeps the loading flag raised for as long as a submission is alive,
/// including one whose future is dropped part way.
struct Submitting<'a>(&'a mut bool);

impl<'a> Submitting<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[derive(serde::Deserialize)]
struct CsvRow {
    company_name: String,
    company_type: String,
    accepted_waste_types: String,
    accepted_categories: String,
    min_quality_grade: String,
    min_monthly_volume_tons: u32,
    max_monthly_volume_tons: u32,
    city: String,
    state: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    pricing_model: String,
    certifications: Option<String>,
    contact_name: String,
    contact_email: String,
}

impl CsvRow {
    fn into_form(self) -> BuyerForm {
        let mut form = BuyerForm {
            company_name: self.company_name,
            company_type: self.company_type,
            accepted_waste_types: self.accepted_waste_types,
            accepted_categories: self.accepted_categories,
            min_quality_grade: self.min_quality_grade,
            min_monthly_volume_tons: self.min_monthly_volume_tons,
            max_monthly_volume_tons: self.max_monthly_volume_tons,
            pricing_model: self.pricing_model,
            contact_email: self.contact_email,
            contact_name: self.contact_name,
            ..BuyerForm::default()
        };

        let state = self.state.filter(|state| !state.trim().is_empty());
        match (state, self.lat, self.lng) {
            (Some(state), Some(lat), Some(lng)) => {
                form.city = self.city;
                form.state = state;
                form.lat = lat;
                form.lng = lng;
            }
            _ => {
                if !form.select_city(&self.city) {
                    form.city = self.city;
                }
            }
        }

        for certification in self
            .certifications
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            if !form.certifications.iter().any(|c| c == certification) {
                form.certifications.push(certification.to_string());
            }
        }

        form
    }
}

pub fn read_buyers<R: Read>(mut reader: csv::Reader<R>) -> anyhow::Result<Vec<BuyerForm>> {
    let mut forms = Vec::new();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid buyer row {}", index + 1))?;
        forms.push(row.into_form());
    }
    Ok(forms)
}

pub fn read_buyers_from_path(path: &Path) -> anyhow::Result<Vec<BuyerForm>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_buyers(reader)
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub accepted: usize,
    pub failed: Vec<(String, String)>,
}

/// Submits every buyer in turn; a failed row is recorded and skipped.
pub async fn import_buyers<A: WasteApi + ?Sized>(
    api: &A,
    forms: Vec<BuyerForm>,
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for mut form in forms {
        match form.submit(api).await {
            Ok(_) => summary.accepted += 1,
            Err(err) => summary.failed.push((form.company_name.clone(), err.alert())),
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::api::{RawMatch, RawWasteProfile, ADD_BUYER};
    use crate::models::{FormSubmission, MatchSummary, OperationalData, Submission, WasteProfile};

    #[derive(Default)]
    struct RecordingApi {
        reject: Option<&'static str>,
        stall: bool,
        received: Mutex<Vec<BuyerRecord>>,
    }

    #[async_trait]
    impl WasteApi for RecordingApi {
        async fn predict_waste(
            &self,
            _data: &OperationalData,
        ) -> Result<RawWasteProfile, ApiError> {
            unreachable!("buyer flow never predicts")
        }

        async fn find_matches(
            &self,
            _data: &OperationalData,
            _profile: &WasteProfile,
        ) -> Result<Vec<RawMatch>, ApiError> {
            unreachable!("buyer flow never matches")
        }

        async fn save_matches(&self, _matches: &[MatchSummary]) -> Result<(), ApiError> {
            unreachable!("buyer flow never saves matches")
        }

        async fn save_form(&self, _submission: &FormSubmission) -> Result<(), ApiError> {
            unreachable!("buyer flow never saves forms")
        }

        async fn list_submissions(&self) -> Result<Vec<Submission>, ApiError> {
            Ok(Vec::new())
        }

        async fn add_buyer(&self, buyer: &BuyerRecord) -> Result<BuyerAck, ApiError> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            self.received.lock().unwrap().push(buyer.clone());
            if let Some(company) = self.reject {
                if buyer.company_name == company {
                    return Err(ApiError::Rejected {
                        endpoint: ADD_BUYER,
                        message: Some("duplicate company".to_string()),
                    });
                }
            }
            Ok(BuyerAck {
                message: Some("Buyer B104 added successfully".to_string()),
                buyer_id: Some("B104".to_string()),
            })
        }
    }

    const HEADER: &str = concat!(
        "company_name,company_type,accepted_waste_types,accepted_categories,",
        "min_quality_grade,min_monthly_volume_tons,max_monthly_volume_tons,",
        "city,state,lat,lng,pricing_model,certifications,contact_name,contact_email\n",
    );

    fn filled_form() -> BuyerForm {
        BuyerForm {
            company_name: "Green Recyclers Pvt Ltd".to_string(),
            company_type: "Metal Recycler".to_string(),
            accepted_waste_types: "metal_scrap,steel_shavings".to_string(),
            accepted_categories: "metal".to_string(),
            min_quality_grade: "Grade B".to_string(),
            pricing_model: "per_ton".to_string(),
            contact_email: "ops@greenrecyclers.in".to_string(),
            contact_name: "Asha Rao".to_string(),
            ..BuyerForm::default()
        }
    }

    #[test]
    fn known_city_fills_location() {
        let mut form = BuyerForm::default();
        assert!(form.select_city("Kolkata"));
        let record = form.to_record();
        assert_eq!(record.city, "Kolkata");
        assert_eq!(record.state, "West Bengal");
        assert_eq!(record.lat, 22.57);
        assert_eq!(record.lng, 88.36);
    }

    #[test]
    fn unknown_city_keeps_previous_location() {
        let mut form = BuyerForm::default();
        form.select_city("Jaipur");
        assert!(!form.select_city("Atlantis"));

        let record = form.to_record();
        assert_eq!(record.city, "Jaipur");
        assert_eq!(record.state, "Rajasthan");
        assert_eq!(record.lat, 26.91);
    }

    #[test]
    fn toggling_twice_restores_selection() {
        let mut form = BuyerForm::default();
        form.toggle_certification("MoEFCC");
        let before = form.certifications().to_vec();

        form.toggle_certification("ISO_9001");
        form.toggle_certification("ISO_9001");
        assert_eq!(form.certifications(), before.as_slice());

        form.toggle_certification("MoEFCC");
        assert!(form.certifications().is_empty());
    }

    #[tokio::test]
    async fn submit_joins_certifications_in_selection_order() {
        let api = RecordingApi::default();
        let mut form = filled_form();
        form.select_city("Pune");
        form.toggle_certification("ISO_14001");
        form.toggle_certification("CPCB_Auth");

        let ack = form.submit(&api).await.unwrap();
        assert_eq!(ack.buyer_id.as_deref(), Some("B104"));

        let received = api.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].certifications, "ISO_14001,CPCB_Auth");
        assert_eq!(received[0].state, "Maharashtra");
        assert_eq!(received[0].min_monthly_volume_tons, 1);
        assert_eq!(received[0].max_monthly_volume_tons, 100);
    }

    #[tokio::test]
    async fn rejected_submit_keeps_input() {
        let api = RecordingApi {
            reject: Some("Green Recyclers Pvt Ltd"),
            ..RecordingApi::default()
        };
        let mut form = filled_form();
        form.toggle_certification("SPCB_Auth");
        let before = form.clone();

        let err = form.submit(&api).await.unwrap_err();
        assert_eq!(err.alert(), "Error adding buyer: duplicate company");
        assert_eq!(form, before);
    }

    #[tokio::test]
    async fn refuses_second_submit_in_flight() {
        let api = RecordingApi::default();
        let mut form = filled_form();
        form.submitting = true;

        assert!(matches!(
            form.submit(&api).await,
            Err(BuyerError::AlreadySubmitting)
        ));
        assert!(api.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_submit_can_be_retried() {
        let stalled = RecordingApi {
            stall: true,
            ..RecordingApi::default()
        };
        let mut form = filled_form();
        let attempt = tokio::time::timeout(Duration::from_millis(10), form.submit(&stalled)).await;
        assert!(attempt.is_err());
        assert!(!form.submitting);

        let api = RecordingApi::default();
        let ack = form.submit(&api).await.unwrap();
        assert_eq!(ack.buyer_id.as_deref(), Some("B104"));
        assert_eq!(api.received.lock().unwrap().len(), 1);
    }

    #[test]
    fn csv_rows_fill_missing_coordinates() {
        let data = [
            HEADER,
            "Deccan Metals,Metal Recycler,metal_scrap,metal,Grade A,5,80,Hyderabad,,,,",
            "per_ton,\"CPCB_Auth, ISO_14001\",Ravi K,ravi@deccan.in\n",
            "Coastal Oils,Oil Reclamation Unit,used_oil,hazardous,Contaminated,1,20,",
            "Kochi,Kerala,9.93,76.26,per_liter,,Mary J,mary@coastal.in\n",
        ]
        .concat();
        let forms = read_buyers(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(forms.len(), 2);

        let first = forms[0].to_record();
        assert_eq!(first.state, "Telangana");
        assert_eq!(first.lat, 17.39);
        assert_eq!(first.certifications, "CPCB_Auth,ISO_14001");

        let second = forms[1].to_record();
        assert_eq!(second.city, "Kochi");
        assert_eq!(second.state, "Kerala");
        assert_eq!(second.lng, 76.26);
        assert_eq!(second.certifications, "");
    }

    #[test]
    fn csv_reports_bad_row() {
        let data = [
            HEADER,
            "Deccan Metals,Metal Recycler,metal_scrap,metal,Grade A,lots,80,Hyderabad,,,,",
            "per_ton,,Ravi K,ravi@deccan.in\n",
        ]
        .concat();
        let err = read_buyers(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(err.to_string().contains("invalid buyer row 1"));
    }

    #[tokio::test]
    async fn import_continues_past_rejections() {
        let api = RecordingApi {
            reject: Some("Second Co"),
            ..RecordingApi::default()
        };
        let mut second = filled_form();
        second.company_name = "Second Co".to_string();
        let forms = vec![filled_form(), second, filled_form()];

        let summary = import_buyers(&api, forms).await;
        assert_eq!(summary.accepted, 2);
        assert_eq!(
            summary.failed,
            vec![(
                "Second Co".to_string(),
                "Error adding buyer: duplicate company".to_string()
            )]
        );
        assert_eq!(api.received.lock().unwrap().len(), 3);
    }
}
