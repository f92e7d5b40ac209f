mod record;
mod state;

pub use record::Record;
pub use state::{ExportState, RateLimitInfo};
