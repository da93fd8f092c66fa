//! Parameter Services

pub mod extract;
pub mod validator;

pub use extract::{enrich_from_text, extract_location, extract_turbine_count};
pub use validator::{check_prerequisite, ParameterDefaults, ParameterError, ParameterValidator};
