//! Driver that owns the one `AppState` and runs its effects.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::app::{AppState, Effect, Event, RunId};
use crate::classify::{AuthFailureClassifier, classify};
use crate::error::ExtractionError;
use crate::files::StagedFile;
use crate::gate::CredentialService;
use crate::transaction::Transaction;

/// Turns staged statement images into rows. One call per attempt.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, files: &[StagedFile]) -> Result<Vec<Transaction>, ExtractionError>;
}

pub struct Session {
    state: AppState,
    credentials: Arc<dyn CredentialService>,
    extractor: Arc<dyn Extractor>,
    classifier: Arc<dyn AuthFailureClassifier>,
}

impl Session {
    pub fn new(
        credentials: Arc<dyn CredentialService>,
        extractor: Arc<dyn Extractor>,
        classifier: Arc<dyn AuthFailureClassifier>,
    ) -> Self {
        Self {
            state: AppState::new(),
            credentials,
            extractor,
            classifier,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn extractor(&self) -> Arc<dyn Extractor> {
        Arc::clone(&self.extractor)
    }

    /// Apply one event and hand back the effect, if any, without running it.
    pub fn dispatch(&mut self, event: Event) -> Option<Effect> {
        let step = self.state.apply(event);
        self.state = step.state;
        step.effect
    }

    /// Apply an event and run every effect it leads to, to completion.
    pub async fn handle(&mut self, event: Event) {
        let mut next = Some(event);
        while let Some(ev) = next.take() {
            if let Some(effect) = self.dispatch(ev) {
                next = Some(self.perform(effect).await);
            }
        }
    }

    /// Run the startup credential check.
    pub async fn boot(&mut self) {
        let step = AppState::boot();
        self.state = step.state;
        if let Some(effect) = step.effect {
            let ev = self.perform(effect).await;
            self.handle(ev).await;
        }
    }

    /// Run an effect and describe its result as the event to feed back.
    pub async fn perform(&self, effect: Effect) -> Event {
        match effect {
            Effect::CheckCredential => Event::CredentialChecked(
                self.credentials
                    .has_selected_credential()
                    .await
                    .map_err(|e| e.to_string()),
            ),
            Effect::OpenSelectionDialog => match self.credentials.open_selection_dialog().await {
                Ok(()) => Event::SelectionSucceeded,
                Err(e) => Event::SelectionFailed(e.to_string()),
            },
            Effect::Extract { run, files } => {
                info!(run, files = files.len(), "extraction started");
                let outcome = self.extractor.extract(&files).await;
                self.finished(run, outcome)
            }
        }
    }

    /// Classify a raw extraction result into the event the state machine expects.
    pub fn finished(
        &self,
        run: RunId,
        outcome: Result<Vec<Transaction>, ExtractionError>,
    ) -> Event {
        match &outcome {
            Ok(rows) => info!(run, rows = rows.len(), "extraction finished"),
            Err(e) => info!(run, error = %e, "extraction failed"),
        }
        Event::ExtractionFinished {
            run,
            outcome: outcome.map_err(|e| classify(e, self.classifier.as_ref())),
        }
    }
}
