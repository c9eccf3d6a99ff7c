pub mod compliance_result;
pub mod benchmark;

pub use compliance_result::*;
pub use benchmark::*;
