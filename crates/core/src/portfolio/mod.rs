pub mod advisor;
pub mod constraints;
pub mod insights;
pub mod metrics;
pub mod tables;

pub use advisor::{
    FallbackTable, ModelReadiness, ModelStatus, PortfolioAdvisor, ProfileOutcome, RegressorSource,
};
pub use constraints::{AllocationConstraintEngine, ConstrainedAllocation, ConstraintPolicy};
pub use metrics::PortfolioMetrics;
