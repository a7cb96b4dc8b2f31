pub mod error;
pub mod evaluator;
pub mod loader;
pub mod router;

pub use error::{PolicyError, Result};
pub use evaluator::first_matching_rule;
pub use loader::BundleLoader;
pub use router::{Router, DEFAULT_EXPLANATION_TEMPLATE_ID};
