//! Screen state machine.
//!
//! `AppState` is an immutable snapshot. Every event goes through
//! [`AppState::apply`], which returns the next snapshot plus at most one side
//! effect for the driver to run. Nothing mutates a snapshot in place, so the
//! single suspension point (the extraction call) can never observe a half
//! applied transition.
//!
//! Screens:
//! - Gated: no key selected (shown regardless of phase)
//! - Idle / FilesStaged / Extracting / Succeeded / Failed

use tracing::{debug, warn};

use crate::error::AppError;
use crate::files::StagedFile;
use crate::gate::KeyGate;
use crate::transaction::Transaction;

pub type RunId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    FilesStaged,
    Extracting,
    Succeeded,
    Failed,
}

/// What the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Gated,
    Idle,
    FilesStaged,
    Extracting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Answer of the startup "has a key been chosen" check.
    CredentialChecked(Result<bool, String>),
    SelectKeyRequested,
    SelectionSucceeded,
    SelectionFailed(String),
    /// Picker and drag-and-drop both land here; replaces any prior selection.
    FilesSelected(Vec<StagedFile>),
    ExtractRequested,
    ExtractionFinished {
        run: RunId,
        outcome: Result<Vec<Transaction>, AppError>,
    },
    Cleared,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CheckCredential,
    OpenSelectionDialog,
    Extract { run: RunId, files: Vec<StagedFile> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: AppState,
    pub effect: Option<Effect>,
}

impl Step {
    fn to(state: AppState) -> Self {
        Self {
            state,
            effect: None,
        }
    }

    fn with(state: AppState, effect: Effect) -> Self {
        Self {
            state,
            effect: Some(effect),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    gate: KeyGate,
    phase: Phase,
    files: Vec<StagedFile>,
    transactions: Vec<Transaction>,
    error: Option<AppError>,
    // Outstanding call, tracked apart from `phase` so that clearing mid-call
    // still keeps the trigger inert until that call resolves.
    in_flight: Option<RunId>,
    last_run: RunId,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial snapshot plus the startup credential check.
    pub fn boot() -> Step {
        Step::with(Self::new(), Effect::CheckCredential)
    }

    pub fn gate(&self) -> KeyGate {
        self.gate
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn screen(&self) -> Screen {
        if !self.gate.is_open() {
            return Screen::Gated;
        }
        match self.phase {
            Phase::Idle => Screen::Idle,
            Phase::FilesStaged => Screen::FilesStaged,
            Phase::Extracting => Screen::Extracting,
            Phase::Succeeded => Screen::Succeeded,
            Phase::Failed => Screen::Failed,
        }
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn in_flight(&self) -> Option<RunId> {
        self.in_flight
    }

    /// Whether the extract control should accept input right now.
    pub fn can_extract(&self) -> bool {
        self.gate.is_open() && self.in_flight.is_none() && !self.files.is_empty()
    }

    /// Files are staged and nothing has been produced for them yet.
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::FilesStaged && self.error.is_none() && self.transactions.is_empty()
    }

    pub fn apply(&self, event: Event) -> Step {
        match event {
            Event::CredentialChecked(checked) => {
                if let Err(e) = &checked {
                    warn!(error = %e, "credential check failed; treating as no key");
                }
                Step::to(AppState {
                    gate: self.gate.after_check(&checked),
                    ..self.clone()
                })
            }

            Event::SelectKeyRequested => Step::with(self.clone(), Effect::OpenSelectionDialog),

            Event::SelectionSucceeded => {
                let phase = match self.phase {
                    Phase::Failed if self.files.is_empty() => Phase::Idle,
                    Phase::Failed => Phase::FilesStaged,
                    p => p,
                };
                Step::to(AppState {
                    gate: KeyGate::KeySelected,
                    phase,
                    error: None,
                    ..self.clone()
                })
            }

            Event::SelectionFailed(detail) => Step::to(AppState {
                error: Some(AppError::CredentialDialog(detail)),
                ..self.clone()
            }),

            Event::FilesSelected(files) => {
                if files.is_empty() || !self.gate.is_open() || self.phase == Phase::Extracting {
                    return Step::to(self.clone());
                }
                Step::to(AppState {
                    phase: Phase::FilesStaged,
                    files,
                    transactions: Vec::new(),
                    error: None,
                    ..self.clone()
                })
            }

            Event::ExtractRequested => self.request_extraction(),

            Event::ExtractionFinished { run, outcome } => self.finish_extraction(run, outcome),

            Event::Cleared => Step::to(AppState {
                phase: Phase::Idle,
                files: Vec::new(),
                transactions: Vec::new(),
                error: None,
                ..self.clone()
            }),
        }
    }

    fn request_extraction(&self) -> Step {
        if !self.gate.is_open() || self.in_flight.is_some() {
            debug!(in_flight = ?self.in_flight, "extract ignored");
            return Step::to(self.clone());
        }
        if self.files.is_empty() {
            return Step::to(AppState {
                error: Some(AppError::Validation),
                ..self.clone()
            });
        }

        let run = self.last_run + 1;
        let files = self.files.clone();
        Step::with(
            AppState {
                phase: Phase::Extracting,
                transactions: Vec::new(),
                error: None,
                in_flight: Some(run),
                last_run: run,
                ..self.clone()
            },
            Effect::Extract { run, files },
        )
    }

    fn finish_extraction(&self, run: RunId, outcome: Result<Vec<Transaction>, AppError>) -> Step {
        if self.in_flight != Some(run) {
            debug!(run, "result for unknown run dropped");
            return Step::to(self.clone());
        }

        let settled = AppState {
            in_flight: None,
            ..self.clone()
        };
        if self.phase != Phase::Extracting {
            debug!(run, "result for cleared run dropped");
            return Step::to(settled);
        }

        match outcome {
            Ok(transactions) => Step::to(AppState {
                phase: Phase::Succeeded,
                transactions,
                ..settled
            }),
            Err(err) => {
                let gate = if err.revokes_credential() {
                    warn!("extraction rejected the API key; returning to key selection");
                    KeyGate::NoKey
                } else {
                    settled.gate
                };
                Step::to(AppState {
                    gate,
                    phase: Phase::Failed,
                    error: Some(err),
                    ..settled
                })
            }
        }
    }
}
