//! Stats module - summaries, grouping and campaign windowing

mod calculator;
mod window;

pub use calculator::{
    CategoryMean, FieldSummary, GroupedCounts, StatsCalculator, SummaryTable, CONFIDENCE_LEVEL,
    DEFAULT_EXCLUDED,
};
pub use window::{
    Annotations, CampaignEvent, DateIndex, DateWindower, EventAnnotator, EventKind, EventMarker,
    WindowError, CAMPAIGN_EVENTS, CAMPAIGN_MONTHS,
};
