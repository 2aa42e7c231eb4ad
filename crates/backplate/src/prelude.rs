pub use backplate_core::prelude::*;

// vim: ts=4
