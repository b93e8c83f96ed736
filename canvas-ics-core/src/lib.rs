//! Canvas ICS Core Library
//!
//! Collects a user's Canvas assignments through the paginated REST API,
//! normalizes them, and renders them as text or as an ICS calendar.

pub mod canvas;
pub mod client;
pub mod collector;
pub mod date;
pub mod error;
pub mod format;
pub mod ics;
pub mod pager;
pub mod select;
pub mod types;

// Re-export core types and error handling
pub use error::{DateParseWarning, Error, Result};
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::{
        canvas::*, client::*, collector::*, date::*, format::*, ics::*, pager::*, select::*,
        types::*,
    };
}
