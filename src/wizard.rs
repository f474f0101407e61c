//! Wizard state for the four-step analysis flow and the shaping of
//! collaborator responses into display records.
//!
//! All mutation goes through [`WizardState::begin`] and
//! [`WizardState::apply`]; neither performs I/O.

use std::collections::BTreeMap;

use crate::api::{RawMatch, RawWasteProfile};
use crate::models::{
    EnvironmentalImpact, Match, MatchSummary, OperationalData, WasteProfile, WasteType,
    DEFAULT_UNITS_PER_MONTH,
};

pub const HAZARDOUS: &str = "Hazardous";

pub const DEFAULT_COMPANY: &str = "Unknown Buyer";
pub const DEFAULT_BUYER_TYPE: &str = "Waste Buyer";
pub const DEFAULT_MATERIAL_MATCH: f64 = 85.0;
pub const DEFAULT_QUALITY_FIT: f64 = 80.0;
pub const DEFAULT_DISTANCE: f64 = 0.0;
pub const DEFAULT_COST_SAVING: f64 = 1000.0;
pub const DEFAULT_IMPACT: EnvironmentalImpact = EnvironmentalImpact {
    co2_saved: 5.0,
    landfill_diverted: 10.0,
};
pub const DEFAULT_COMPLIANCE: &str = "Compliant";
pub const DEFAULT_OVERALL_SCORE: f64 = 80.0;
pub const DEFAULT_REQUIREMENTS: &str = "Standard waste acceptance";
pub const DEFAULT_PRICING: &str = "Market dependent";

/// Monthly production units implied by a scale tier.
pub fn units_per_month(scale: &str) -> u32 {
    match scale.to_ascii_lowercase().as_str() {
        "small" => 500,
        "medium" => 5_000,
        "large" => 50_000,
        "xlarge" => 100_000,
        _ => DEFAULT_UNITS_PER_MONTH,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Input = 1,
    Profile = 2,
    Matches = 3,
    Outreach = 4,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Input, Step::Profile, Step::Matches, Step::Outreach];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Input => "Input Data",
            Step::Profile => "Waste Profile",
            Step::Matches => "Match & Optimize",
            Step::Outreach => "Outreach",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Industry,
    Product,
    Process,
    Machinery,
    Scale,
    Location,
}

/// Sets one field. A new scale recomputes `units_per_month`; a new industry
/// clears the fields that depend on it.
pub fn edit(data: &mut OperationalData, field: Field, value: &str) {
    let value = value.to_string();
    match field {
        Field::Industry => {
            data.industry = value;
            data.product.clear();
            data.process.clear();
            data.machinery.clear();
        }
        Field::Product => data.product = value,
        Field::Process => data.process = value,
        Field::Machinery => data.machinery = value,
        Field::Scale => {
            data.units_per_month = units_per_month(&value);
            data.scale = value;
        }
        Field::Location => data.location = value,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GenerateProfile,
    FindMatches,
    SendOutreach,
}

impl Action {
    pub fn required_step(self) -> Step {
        match self {
            Action::GenerateProfile => Step::Input,
            Action::FindMatches => Step::Profile,
            Action::SendOutreach => Step::Matches,
        }
    }

    /// Text of the blocking notification shown when the action fails.
    pub fn alert(self) -> &'static str {
        match self {
            Action::GenerateProfile => "Error predicting waste profile.",
            Action::FindMatches => "Error finding matches.",
            Action::SendOutreach => "Error saving matches.",
        }
    }
}

/// Proof that an action was started against a given generation of the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    action: Action,
    generation: u64,
}

impl Ticket {
    pub fn action(&self) -> Action {
        self.action
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Edit(Field, String),
    SetUnits(u32),
    ResetUnits,
    ProfileReady(Ticket, WasteProfile),
    MatchesReady(Ticket, Vec<Match>),
    OutreachSaved(Ticket),
    Failed(Ticket),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Accepted,
    /// The event does not apply to the current step.
    Ignored,
    /// The completion belongs to a call the state has moved past.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("another request is still in progress")]
    Busy,
    #[error("select an industry first")]
    MissingIndustry,
    #[error("{action:?} is not available on step {step:?}")]
    WrongStep { action: Action, step: Step },
    #[error("no waste profile has been generated")]
    NoProfile,
    #[error("the form can only be saved on the input step")]
    FormLocked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    step: Step,
    data: OperationalData,
    profile: Option<WasteProfile>,
    matches: Vec<Match>,
    outreach_sent: bool,
    loading: bool,
    generation: u64,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: Step::Input,
            data: OperationalData::default(),
            profile: None,
            matches: Vec::new(),
            outreach_sent: false,
            loading: false,
            generation: 0,
        }
    }
}

impl WizardState {
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn data(&self) -> &OperationalData {
        &self.data
    }

    pub fn profile(&self) -> Option<&WasteProfile> {
        self.profile.as_ref()
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn outreach_sent(&self) -> bool {
        self.outreach_sent
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Marks `action` as outstanding and hands back the ticket its
    /// completion must present.
    pub fn begin(&mut self, action: Action) -> Result<Ticket, WizardError> {
        if self.loading {
            return Err(WizardError::Busy);
        }
        if self.step != action.required_step() {
            return Err(WizardError::WrongStep {
                action,
                step: self.step,
            });
        }
        match action {
            Action::GenerateProfile if self.data.industry.trim().is_empty() => {
                return Err(WizardError::MissingIndustry);
            }
            Action::FindMatches if self.profile.is_none() => return Err(WizardError::NoProfile),
            _ => {}
        }

        self.loading = true;
        Ok(Ticket {
            action,
            generation: self.generation,
        })
    }

    /// Like [`WizardState::begin`], but the returned guard settles the
    /// action as failed if it is dropped before [`Pending::finish`].
    pub fn start(&mut self, action: Action) -> Result<Pending<'_>, WizardError> {
        let ticket = self.begin(action)?;
        Ok(Pending {
            state: self,
            ticket,
            finished: false,
        })
    }

    pub fn apply(&mut self, event: Event) -> Applied {
        match event {
            Event::Edit(field, value) => {
                if self.step != Step::Input {
                    return Applied::Ignored;
                }
                edit(&mut self.data, field, &value);
            }
            Event::SetUnits(units) => {
                if self.step != Step::Input {
                    return Applied::Ignored;
                }
                self.data.units_per_month = if units == 0 {
                    DEFAULT_UNITS_PER_MONTH
                } else {
                    units
                };
            }
            Event::ResetUnits => {
                if self.step != Step::Input {
                    return Applied::Ignored;
                }
                self.data.units_per_month = units_per_month(&self.data.scale);
            }
            Event::ProfileReady(ticket, profile) => {
                if !self.is_current(ticket, Action::GenerateProfile) {
                    return self.discard(ticket);
                }
                self.profile = Some(profile);
                self.step = Step::Profile;
                self.settle();
            }
            Event::MatchesReady(ticket, matches) => {
                if !self.is_current(ticket, Action::FindMatches) {
                    return self.discard(ticket);
                }
                self.matches = matches;
                self.step = Step::Matches;
                self.settle();
            }
            Event::OutreachSaved(ticket) => {
                if !self.is_current(ticket, Action::SendOutreach) {
                    return self.discard(ticket);
                }
                self.outreach_sent = true;
                self.step = Step::Outreach;
                self.settle();
            }
            Event::Failed(ticket) => {
                if !self.is_current(ticket, ticket.action) {
                    return self.discard(ticket);
                }
                self.settle();
            }
            Event::Reset => {
                if self.step != Step::Outreach {
                    return Applied::Ignored;
                }
                *self = WizardState {
                    generation: self.generation + 1,
                    ..WizardState::default()
                };
            }
        }
        Applied::Accepted
    }

    fn is_current(&self, ticket: Ticket, action: Action) -> bool {
        self.loading && ticket.action == action && ticket.generation == self.generation
    }

    fn settle(&mut self) {
        self.loading = false;
        self.generation += 1;
    }

    fn discard(&self, ticket: Ticket) -> Applied {
        tracing::debug!(
            action = ?ticket.action,
            ticket_generation = ticket.generation,
            generation = self.generation,
            "discarding stale completion"
        );
        Applied::Stale
    }
}

/// An outstanding action holding the state until its completion is applied.
pub struct Pending<'a> {
    state: &'a mut WizardState,
    ticket: Ticket,
    finished: bool,
}

impl Pending<'_> {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn state(&self) -> &WizardState {
        &*self.state
    }

    pub fn finish(mut self, event: impl FnOnce(Ticket) -> Event) -> Applied {
        self.finished = true;
        self.state.apply(event(self.ticket))
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(action = ?self.ticket.action, "request dropped before completing");
            self.state.apply(Event::Failed(self.ticket));
        }
    }
}

/// Turns predicted waste streams into display records. Streams whose hazard
/// class is exactly `Hazardous` each contribute one regulatory flag.
pub fn shape_profile(raw: RawWasteProfile, data: &OperationalData) -> WasteProfile {
    let regulatory_flags = raw
        .waste_streams
        .iter()
        .filter(|stream| stream.hazard_class == HAZARDOUS)
        .map(|stream| {
            format!(
                "{}: Hazardous waste requires special handling and CPCB permits",
                stream.waste_type
            )
        })
        .collect();

    let waste_types = raw
        .waste_streams
        .into_iter()
        .map(|stream| WasteType {
            quantity: format!(
                "{}-{} tons/month",
                stream.quantity_min_tons, stream.quantity_max_tons
            ),
            contamination: format!("{}%", stream.contamination_pct),
            waste_type: stream.waste_type,
            quality: stream.quality_grade,
            hazard_level: stream.hazard_class,
            composition: BTreeMap::from([("primary".to_string(), 100.0)]),
        })
        .collect();

    WasteProfile {
        waste_types,
        confidence: raw.overall_confidence,
        regulatory_flags,
        location: data.location.clone(),
        industry: data.industry.clone(),
    }
}

fn number(value: Option<f64>) -> Option<f64> {
    value.filter(|value| *value != 0.0 && !value.is_nan())
}

fn text(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// The overall score a candidate is displayed with.
pub fn displayed_score(raw: &RawMatch) -> f64 {
    number(raw.overall_score).unwrap_or(DEFAULT_OVERALL_SCORE)
}

/// Fills every absent, zero or empty field of a candidate with its display
/// default. `index` is the candidate's position and stands in for a missing id.
pub fn fill_match_defaults(raw: RawMatch, index: usize) -> Match {
    let overall_score = displayed_score(&raw);
    Match {
        id: raw.id.filter(|id| *id != 0).unwrap_or(index as u64 + 1),
        company: text(raw.company, DEFAULT_COMPANY),
        buyer_type: text(raw.buyer_type, DEFAULT_BUYER_TYPE),
        material_match: number(raw.material_match).unwrap_or(DEFAULT_MATERIAL_MATCH),
        quality_fit: number(raw.quality_fit).unwrap_or(DEFAULT_QUALITY_FIT),
        distance: number(raw.distance).unwrap_or(DEFAULT_DISTANCE),
        cost_saving: number(raw.cost_saving).unwrap_or(DEFAULT_COST_SAVING),
        environmental_impact: raw.environmental_impact.unwrap_or(DEFAULT_IMPACT),
        compliance: text(raw.compliance, DEFAULT_COMPLIANCE),
        overall_score,
        requirements: text(raw.requirements, DEFAULT_REQUIREMENTS),
        pricing: text(raw.pricing, DEFAULT_PRICING),
    }
}

pub fn outreach_projection(matches: &[Match]) -> Vec<MatchSummary> {
    matches
        .iter()
        .map(|m| MatchSummary {
            id: m.id,
            company: m.company.clone(),
            buyer_type: m.buyer_type.clone(),
            material_match: m.material_match,
            quality_fit: m.quality_fit,
            distance: m.distance,
            cost_saving: m.cost_saving,
            environmental_impact: m.environmental_impact,
            compliance: m.compliance.clone(),
            overall_score: m.overall_score,
        })
        .collect()
}
