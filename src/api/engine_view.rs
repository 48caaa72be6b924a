use chrono::Utc;
use indexmap::IndexMap;

use crate::core::{ItemId, PartitionKey, RowLayout, ScheduleItem, TimeScale, ZoomLevel};
use crate::error::TimelineResult;
use crate::extract::{FilterPipeline, ItemFilter, YearFilter, available_years, group_items};
use crate::remote::BoardApi;

use super::{TimelineEngine, ViewOptions};

impl<A: BoardApi> TimelineEngine<A> {
    #[must_use]
    pub fn time_scale(&self) -> &TimeScale {
        &self.scale
    }

    #[must_use]
    pub fn row_layout(&self) -> &RowLayout {
        &self.rows
    }

    #[must_use]
    pub fn view_options(&self) -> &ViewOptions {
        &self.view
    }

    pub fn set_view_options(&mut self, view: ViewOptions) -> TimelineResult<()> {
        self.view = view;
        self.refresh_layout()
    }

    /// Applies a year filter and fits the time scale to it.
    ///
    /// `All` spans every year that has items, or the current year when empty.
    pub fn set_year_filter(&mut self, year: YearFilter) -> TimelineResult<()> {
        let config = self.scale.config();
        self.scale = match year {
            YearFilter::Year(year) => TimeScale::for_year(year, config)?,
            YearFilter::All => {
                let years = self.available_years();
                match (years.first(), years.last()) {
                    (Some(first), Some(last)) => TimeScale::for_years(*first, *last, config)?,
                    _ => TimeScale::around_today(Utc::now().date_naive(), config)?,
                }
            }
        };
        self.view.year = year;
        self.refresh_layout()
    }

    pub fn set_time_scale(&mut self, scale: TimeScale) {
        self.scale = scale;
    }

    pub fn set_zoom(&mut self, zoom: ZoomLevel) -> TimelineResult<()> {
        self.scale = self.scale.with_zoom(zoom)?;
        Ok(())
    }

    pub fn zoom_in(&mut self) -> TimelineResult<()> {
        self.scale = self.scale.zoom_in()?;
        Ok(())
    }

    pub fn zoom_out(&mut self) -> TimelineResult<()> {
        self.scale = self.scale.zoom_out()?;
        Ok(())
    }

    pub fn toggle_collapsed(&mut self, key: PartitionKey) -> TimelineResult<()> {
        if !self.view.collapsed.remove(&key) {
            self.view.collapsed.insert(key);
        }
        self.refresh_layout()
    }

    #[must_use]
    pub fn available_years(&self) -> Vec<i32> {
        available_years(self.store.items())
    }

    fn pipeline(&self) -> FilterPipeline {
        let mut pipeline = FilterPipeline::new().then(ItemFilter::Year(self.view.year));
        if let Some(group) = &self.view.group {
            pipeline = pipeline.then(ItemFilter::Group(group.clone()));
        }
        if let Some(person) = self.view.assignee {
            pipeline = pipeline.then(ItemFilter::Assignee(person));
        }
        pipeline
    }

    /// Filtered items partitioned for display.
    #[must_use]
    pub fn schedule_view(&self) -> IndexMap<PartitionKey, Vec<&ScheduleItem>> {
        let filtered = self.pipeline().apply(self.store.items());
        group_items(&filtered, self.store.groups(), self.view.group_by)
    }

    /// Top edge of the bar for `item_id` in the current layout.
    #[must_use]
    pub fn bar_top(&self, item_id: &ItemId) -> Option<f64> {
        self.schedule_view().iter().find_map(|(key, items)| {
            let index = items.iter().position(|item| &item.id == item_id)?;
            self.rows.bar_top(key, index)
        })
    }

    pub(super) fn refresh_layout(&mut self) -> TimelineResult<()> {
        let partitions: Vec<(PartitionKey, usize, bool)> = self
            .schedule_view()
            .into_iter()
            .map(|(key, items)| {
                let expanded = !self.view.collapsed.contains(&key);
                (key, items.len(), expanded)
            })
            .collect();
        self.rows = RowLayout::build(partitions, self.config.rows)?;
        Ok(())
    }
}
