//! Schema module - configuration and reporting types for mix-design search.

mod config;
mod params;
mod report;
mod rules;

pub use config::*;
pub use params::*;
pub use report::*;
pub use rules::*;
