//! ledgerscan-core: transaction model, credential gate, and the screen state machine

pub mod app;
pub mod classify;
pub mod error;
pub mod files;
pub mod gate;
pub mod session;
pub mod transaction;

pub use app::{AppState, Effect, Event, Phase, RunId, Screen, Step};
pub use classify::{AuthFailureClassifier, MessageMarkers, classify};
pub use error::{AppError, ExtractionError};
pub use files::StagedFile;
pub use gate::{CredentialError, CredentialService, KeyGate};
pub use session::{Extractor, Session};
pub use transaction::{BalanceDirection, Transaction, format_amount};
