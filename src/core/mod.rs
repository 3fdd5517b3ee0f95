mod engine;
mod error;
mod growth;
mod solver;
mod types;

pub use engine::{compare_housing_paths, estimate_pension};
pub use error::{ProjectionError, ProjectionResult};
pub use growth::{project, project_with_breakdown};
pub use solver::time_to_target;
pub use types::{
    Advisory, CareerSegment, CareerTimeline, ContributionRates, DEFAULT_GROWTH_RATE,
    DEFAULT_MAX_ITERATIONS, Estimate, GrowthBreakdown, GrowthParameters, HousingAssumptions,
    HousingComparison, HousingParameters, PayoutDivisor, PensionAssumptions, PensionEstimate,
    PensionParameters, STATUTORY_RETIREMENT_AGES, SegmentProjection, TargetQuery,
};
