pub mod response;
pub mod result;

pub use response::interpret_response;
pub use result::{AnalysisResult, Visualization};
