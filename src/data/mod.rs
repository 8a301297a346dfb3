//! Data module - poll CSV loading and row-level processing

mod loader;
mod processor;

pub use loader::{LoaderError, PollLoader};
pub use processor::{DataProcessor, ProcessorError, VOTER_POPULATIONS};

/// Column names of the poll dataset that the analysis relies on.
pub mod columns {
    pub const AFFILIATION: &str = "Affiliation";
    pub const POPULATION: &str = "Population";
    pub const MODE: &str = "Mode";
    pub const START_DATE: &str = "Start Date";
    pub const CLINTON: &str = "Clinton";
    pub const TRUMP: &str = "Trump";
    pub const NUM_OBSERVATIONS: &str = "Number of Observations";
    pub const QUESTION_ITERATION: &str = "Question Iteration";
    /// Derived: (Clinton - Trump) / 100.
    pub const DIFFERENCE: &str = "Difference";
}

/// Population labels as they appear in the dataset.
pub mod populations {
    pub const LIKELY_VOTERS: &str = "Likely Voters";
    pub const REGISTERED_VOTERS: &str = "Registered Voters";
    pub const ADULTS: &str = "Adults";
}
