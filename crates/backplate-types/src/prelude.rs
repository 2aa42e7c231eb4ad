pub use crate::error::{BpResult, Error};
pub use crate::types::{Patch, RecordId, Timestamp};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
