mod engine;
mod types;
pub mod whatif;

pub use engine::{
    Analysis, CashflowModel, MIN_TIMELINE_HORIZON, NO_ALERTS, OutputBounds, RUNWAY_CAP_MONTHS,
    RiskTables, build_timeline, debt_ratio, estimate_runway, round2, run_analysis,
    timeline_horizon, timeline_stats,
};
pub use types::{JobStability, Metrics, NewsEvent, Profile, Scenario, Subscription, TimelineStats};
