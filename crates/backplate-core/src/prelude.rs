pub use crate::app::App;
pub use backplate_types::prelude::*;

// vim: ts=4
