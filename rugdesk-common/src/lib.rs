//! # RugDesk Common Library
//!
//! Shared code for the RugDesk services:
//! - Error type and result alias
//! - TOML bootstrap configuration and root folder resolution
//! - Rug dimension parsing, formatting and footage calculations
//! - Edge selection and AI edge suggestion validation

pub mod config;
pub mod dimensions;
pub mod edges;
pub mod error;

pub use dimensions::{DimensionFormat, DimensionInput, FootageSummary, RugDimensions};
pub use edges::{EdgeSuggestion, EdgeTag, SuggestionRejection};
pub use error::{Error, Result};
