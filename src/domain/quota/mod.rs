pub mod error;
pub mod model;

pub use error::QuotaError;
pub use model::{warning_level, QuotaReport, QuotaTotals, FREE_PREMIUM_CHARS, FREE_STANDARD_CHARS};
