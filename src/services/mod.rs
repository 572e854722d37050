pub mod inference;
pub mod metrics;

pub use inference::*;
pub use metrics::*;
