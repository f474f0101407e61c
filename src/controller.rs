use chrono::Utc;

use crate::api::{ApiError, WasteApi};
use crate::models::FormSubmission;
use crate::wizard::{
    fill_match_defaults, outreach_projection, shape_profile, Action, Applied, Event, Pending,
    Step, WizardError, WizardState,
};

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("{} ({source})", .action.alert())]
    Api {
        action: Action,
        #[source]
        source: ApiError,
    },
    #[error("Error saving form. ({0})")]
    SaveForm(#[source] ApiError),
}

impl FlowError {
    /// The one-line notification shown to the user.
    pub fn alert(&self) -> String {
        match self {
            FlowError::Wizard(err) => err.to_string(),
            FlowError::Api { action, .. } => action.alert().to_string(),
            FlowError::SaveForm(_) => "Error saving form".to_string(),
        }
    }
}

/// Drives a [`WizardState`] against a collaborator, one call at a time.
///
/// A call future dropped before it resolves leaves the wizard on its step,
/// no longer loading.
pub struct WizardController<A> {
    api: A,
    state: WizardState,
}

impl<A: WasteApi> WizardController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: WizardState::default(),
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn apply(&mut self, event: Event) -> Applied {
        self.state.apply(event)
    }

    pub async fn generate_profile(&mut self) -> Result<(), FlowError> {
        let data = self.state.data().clone();
        let pending = self.state.start(Action::GenerateProfile)?;
        tracing::info!(
            industry = %data.industry,
            location = %data.location,
            "predicting waste profile"
        );

        match self.api.predict_waste(&data).await {
            Ok(raw) => {
                let profile = shape_profile(raw, &data);
                tracing::info!(
                    streams = profile.waste_types.len(),
                    flags = profile.regulatory_flags.len(),
                    confidence = profile.confidence,
                    "waste profile ready"
                );
                pending.finish(|ticket| Event::ProfileReady(ticket, profile));
                Ok(())
            }
            Err(source) => Err(fail(pending, source)),
        }
    }

    pub async fn find_matches(&mut self) -> Result<(), FlowError> {
        let data = self.state.data().clone();
        let pending = self.state.start(Action::FindMatches)?;
        let Some(profile) = pending.state().profile().cloned() else {
            return Err(WizardError::NoProfile.into());
        };

        match self.api.find_matches(&data, &profile).await {
            Ok(candidates) => {
                let matches: Vec<_> = candidates
                    .into_iter()
                    .enumerate()
                    .map(|(index, raw)| fill_match_defaults(raw, index))
                    .collect();
                tracing::info!(count = matches.len(), "matches ready");
                pending.finish(|ticket| Event::MatchesReady(ticket, matches));
                Ok(())
            }
            Err(source) => Err(fail(pending, source)),
        }
    }

    /// Posts the reduced projection of the current matches, which may be
    /// empty.
    pub async fn send_outreach(&mut self) -> Result<(), FlowError> {
        let pending = self.state.start(Action::SendOutreach)?;
        let summaries = outreach_projection(pending.state().matches());

        match self.api.save_matches(&summaries).await {
            Ok(()) => {
                tracing::info!(count = summaries.len(), "matches saved for outreach");
                pending.finish(Event::OutreachSaved);
                Ok(())
            }
            Err(source) => Err(fail(pending, source)),
        }
    }

    /// Stores the current input without touching the wizard step.
    pub async fn save_form(&self) -> Result<(), FlowError> {
        if self.state.step() != Step::Input {
            return Err(WizardError::FormLocked.into());
        }

        let submission = FormSubmission {
            operational_data: self.state.data().clone(),
            timestamp: Utc::now().to_rfc3339(),
        };
        self.api.save_form(&submission).await.map_err(|err| {
            tracing::warn!(error = %err, "saving form failed");
            FlowError::SaveForm(err)
        })?;
        tracing::info!(timestamp = %submission.timestamp, "form saved");
        Ok(())
    }

    pub fn reset(&mut self) -> Applied {
        self.state.apply(Event::Reset)
    }
}

fn fail(pending: Pending<'_>, source: ApiError) -> FlowError {
    let action = pending.ticket().action();
    tracing::warn!(?action, error = %source, "request failed");
    pending.finish(Event::Failed);
    FlowError::Api { action, source }
}
