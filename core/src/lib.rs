//! Client core for the hyperspectral anomaly detection service.
//!
//! The session controller owns the selection/request/result state of one
//! application run and drives the single upload-and-analyze call. Rendering
//! layers subscribe to [`session::SessionSnapshot`] updates and never touch
//! the protocol directly.

pub mod api;
pub mod config;
pub mod input;
pub mod math;
pub mod prelude;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use prelude::{AnalyzeError, AnalyzeRequest, AnalyzeResult, AnalyzeTransport};
