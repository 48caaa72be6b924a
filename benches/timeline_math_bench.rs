use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use timeline_sync::config::GestureConfig;
use timeline_sync::core::{
    GroupId, ItemId, PartitionKey, RowLayout, RowLayoutConfig, ScheduleItem, TimeScale,
    TimeScaleConfig,
};
use timeline_sync::extract::{FilterPipeline, GroupBy, ItemFilter, YearFilter, group_items};
use timeline_sync::interaction::{DragMode, DragSession};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn generated_items(count: usize) -> Vec<ScheduleItem> {
    (0..count)
        .map(|i| {
            let start = date(2025, 1, 1) + chrono::Days::new((i % 300) as u64);
            let end = start + chrono::Days::new((i % 14) as u64);
            ScheduleItem::new(
                ItemId::new(i.to_string()),
                format!("item {i}"),
                start,
                Some(end),
                GroupId::new(format!("g{}", i % 8)),
            )
            .expect("valid generated item")
        })
        .collect()
}

fn bench_date_to_x_round_trip(c: &mut Criterion) {
    let scale = TimeScale::for_year(2025, TimeScaleConfig::default()).expect("valid scale");

    c.bench_function("date_to_x_round_trip", |b| {
        b.iter(|| {
            let x = scale.date_to_x(black_box(date(2025, 7, 14)));
            let _ = scale.x_to_date(black_box(x));
        })
    });
}

fn bench_filter_and_group_10k(c: &mut Criterion) {
    let items = generated_items(10_000);
    let groups: Vec<_> = (0..8)
        .map(|i| timeline_sync::core::Group {
            id: GroupId::new(format!("g{i}")),
            title: format!("Group {i}"),
            color: "#579BFC".to_owned(),
            position: i,
        })
        .collect();
    let pipeline = FilterPipeline::new().then(ItemFilter::Year(YearFilter::Year(2025)));

    c.bench_function("filter_and_group_10k", |b| {
        b.iter(|| {
            let filtered = pipeline.apply(black_box(&items));
            let _ = group_items(&filtered, &groups, GroupBy::Groups);
        })
    });
}

fn bench_drag_frames_1k(c: &mut Criterion) {
    let scale = TimeScale::for_year(2025, TimeScaleConfig::default()).expect("valid scale");
    let rows = RowLayout::build(
        (0..8).map(|i| (PartitionKey::Group(GroupId::new(format!("g{i}"))), 40, true)),
        RowLayoutConfig::default(),
    )
    .expect("valid layout");
    let items = generated_items(1);
    let session = DragSession::begin(&items[0], DragMode::Move, 100.0, 60.0);
    let gesture = GestureConfig::default();

    c.bench_function("drag_frames_1k", |b| {
        b.iter(|| {
            let mut current = session.clone();
            for step in 0..1_000 {
                let x = 100.0 + f64::from(step) * 0.7;
                if let Some(next) = current.advance(black_box(x), 60.0, &scale, &rows, &gesture) {
                    current = next;
                }
            }
            black_box(current.resolve())
        })
    });
}

criterion_group!(
    timeline_math,
    bench_date_to_x_round_trip,
    bench_filter_and_group_10k,
    bench_drag_frames_1k
);
criterion_main!(timeline_math);
