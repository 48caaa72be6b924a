pub mod row_layout;
pub mod scale;
pub mod ticks;
pub mod time_scale;
pub mod types;

pub use row_layout::{PartitionKey, RowBand, RowLayout, RowLayoutConfig};
pub use scale::LinearScale;
pub use ticks::{TickUnit, TimeTick};
pub use time_scale::{BarSpan, MIN_BAR_WIDTH_PX, TimeScale, TimeScaleConfig, ZoomLevel};
pub use types::{
    DAY_MS, Group, GroupId, ItemId, PersonId, ScheduleItem, StatusInfo, date_to_ms, ms_to_date,
    parse_iso_date, shift_days,
};
