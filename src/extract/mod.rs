//! Normalization of raw board records into the schedule model.

pub mod column;
pub mod pipeline;
pub mod schedule;

pub use column::{ColumnKind, ColumnValue};
pub use pipeline::{FilterPipeline, GroupBy, ItemFilter, YearFilter, available_years, group_items};
pub use schedule::{ExtractionSettings, ScheduleExtractor, StatusTable, board_groups};
