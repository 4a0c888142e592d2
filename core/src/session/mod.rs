pub mod controller;
pub mod state;

pub use controller::{Completion, PendingAnalysis, SessionController};
pub use state::{FileSummary, RequestState, SessionPhase, SessionSnapshot};
