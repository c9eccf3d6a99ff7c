pub mod types;
pub mod classification;

pub use types::SummarizerError;
pub use classification::ErrorClassification;
