pub mod context;
pub mod event;
pub mod signal;
pub mod validation;

pub use context::{Context, TemporalBucket};
pub use event::{MarketInfo, RawEvent};
pub use signal::{ConfidenceLevel, Signal};
pub use validation::{ValidationResult, ValidationStatus};
