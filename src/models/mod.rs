//! Domain models for leanwave.
//!
//! # Core Concepts
//!
//! ## Planning Entities
//!
//! - [`Feature`]: A risk-scored candidate capability extracted from a product idea.
//! - [`Wave`]: An ordered, capacity-bounded batch of features for one delivery increment.
//! - [`Instruction`]: A Role/Task/Context/Format prompt for a downstream code-generation agent.
//!
//! ## Transient Entities
//!
//! These exist only while one analysis request runs:
//!
//! - [`RetrievalResult`]: One grounded search, degraded explicitly on failure.
//! - [`AnalysisOutcome`]: Features, deduplicated sources and issued queries.
//!
//! ## Persisted Entities
//!
//! - [`Project`]: Owner of persisted features.

mod analysis;
mod feature;
mod instruction;
mod project;
mod wave;

pub use analysis::*;
pub use feature::*;
pub use instruction::*;
pub use project::*;
pub use wave::*;
