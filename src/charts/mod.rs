//! Charts module - chart planning and rendering

mod plan;
mod renderer;

pub use plan::{
    ChartBody, ChartPlanner, ChartSpec, ErrorBarPoint, PlanInputs, Rgb, SeriesPoint, PALETTE,
};
pub use renderer::{ChartRenderer, RenderError, MANIFEST_FILE};
