pub mod api;
pub mod error;
pub mod params;
pub mod raw;
pub mod spec;
pub mod target;
pub mod types;
mod serialization;

pub use api::{analyze, analyze_value, Analysis};
