use std::sync::Arc;

use chrono::{TimeZone, Utc};
use dashboard_pipeline::execution::{ExecutionEngine, ExecutionOptions};
use dashboard_pipeline::ingestion::{ingest_from_path, IngestionOptions};
use dashboard_pipeline::moderation::{TriggerWords, HAS_TRIGGER_WORDS};
use dashboard_pipeline::processing::paginate::PageSlot;
use dashboard_pipeline::processing::window::{DatePreset, TimeFrame};
use dashboard_pipeline::processing::{FilterCriteria, SortDirection, SortSpec};
use dashboard_pipeline::screens::{self, ScreenPreset, MODERATION_TEXT_FIELDS};
use dashboard_pipeline::types::{DataSet, DataType, Field, Schema, Value};
use dashboard_pipeline::ListPipeline;

fn load(preset: &ScreenPreset, fixture: &str) -> DataSet {
    ingest_from_path(
        format!("tests/fixtures/{fixture}"),
        &preset.schema,
        &IngestionOptions::default(),
    )
    .unwrap()
}

fn column(ds: &DataSet, field: &str) -> Vec<Value> {
    (0..ds.row_count())
        .map(|row| ds.value(row, field).cloned().unwrap_or(Value::Null))
        .collect()
}

fn ids(ds: &DataSet) -> Vec<i64> {
    column(ds, "id")
        .into_iter()
        .map(|v| match v {
            Value::Int64(id) => id,
            other => panic!("unexpected id {other:?}"),
        })
        .collect()
}

fn ten_genres() -> DataSet {
    let preset = screens::genres();
    let rows = (1..=10)
        .map(|i| {
            vec![
                Value::Int64(i),
                Value::Utf8(format!("Genre {i}")),
                Value::Utf8(if i % 2 == 0 { "4-6" } else { "7-9" }.to_string()),
                Value::Utf8("Fiction".to_string()),
                Value::Int64(i * 3),
                Value::Int64(i * 100),
                Value::Float64(i as f64 / 10.0),
                Value::Float64(0.5),
                Value::Float64(0.25),
                Value::Utf8("up".to_string()),
                Value::Float64(1.0),
            ]
        })
        .collect();
    DataSet::new(preset.schema, rows)
}

#[test]
fn ten_rows_page_three_by_three() {
    let preset = screens::genres();
    let mut pipeline = ListPipeline::from_config(ten_genres(), &preset.config);
    pipeline.clear_sort();

    let sizes: Vec<usize> = (1..=4)
        .map(|page| {
            pipeline.configure_page(page, 3);
            let view = pipeline.get_view();
            assert_eq!(view.total_pages, 4);
            assert_eq!(view.total_count, 10);
            view.items.row_count()
        })
        .collect();
    assert_eq!(sizes, vec![3, 3, 3, 1]);

    pipeline.configure_page(4, 3);
    assert_eq!(ids(&pipeline.get_view().items), vec![10]);

    pipeline.configure_page(1, 10);
    let view = pipeline.get_view();
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.items.row_count(), 10);
}

#[test]
fn out_of_range_pages_clamp() {
    let preset = screens::genres();
    let mut pipeline = ListPipeline::from_config(ten_genres(), &preset.config);

    pipeline.configure_page(99, 3);
    let view = pipeline.get_view();
    assert_eq!(view.page_index, 4);
    assert_eq!(view.items.row_count(), 1);

    pipeline.configure_page(0, 3);
    assert_eq!(pipeline.get_view().page_index, 1);
}

#[test]
fn empty_filter_result_still_has_one_page() {
    let preset = screens::genres();
    let mut pipeline = ListPipeline::from_config(ten_genres(), &preset.config);
    pipeline.search("no such genre");

    let view = pipeline.get_view();
    assert_eq!(view.total_count, 0);
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.page_index, 1);
    assert!(view.items.is_empty());
    assert_eq!(view.summary.get("genreCount"), Some(0.0));
    assert_eq!(view.summary.get("avgEngagement"), Some(0.0));
}

#[test]
fn genres_start_sorted_by_reads_descending() {
    let preset = screens::genres();
    let mut pipeline = ListPipeline::from_config(ten_genres(), &preset.config);

    let view = pipeline.get_view();
    assert_eq!(ids(&view.items), vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1]);
    assert_eq!(view.summary.get("totalReads"), Some(5500.0));

    // New column: first click uses the screen's fallback direction.
    assert_eq!(pipeline.toggle_sort("name"), SortSpec::descending("name"));
    assert_eq!(pipeline.toggle_sort("name"), SortSpec::ascending("name"));
    // Lexicographic: "Genre 10" sorts between "Genre 1" and "Genre 2".
    assert_eq!(ids(&pipeline.get_view().items)[..3], [1, 10, 2]);
}

#[test]
fn equality_select_filters_and_all_clears() {
    let preset = screens::genres();
    let mut pipeline = ListPipeline::from_config(ten_genres(), &preset.config);

    pipeline.update_filters(|criteria, ds| {
        criteria.equals_input(&ds.schema, "ageGroup", "4-6");
    });
    let view = pipeline.get_view();
    assert_eq!(ids(&view.items), vec![10, 8, 6, 4, 2]);
    assert_eq!(view.summary.get("totalStories"), Some(90.0));

    pipeline.update_filters(|criteria, ds| {
        criteria.equals_input(&ds.schema, "ageGroup", "all");
    });
    assert_eq!(pipeline.get_view().total_count, 10);
}

#[test]
fn range_inputs_ignore_malformed_bounds() {
    let preset = screens::genres();
    let mut pipeline = ListPipeline::from_config(ten_genres(), &preset.config);

    pipeline.update_filters(|criteria, ds| {
        criteria.range_input(&ds.schema, "totalReads", "300", "abc");
    });
    assert_eq!(pipeline.get_view().total_count, 8);

    pipeline.update_filters(|criteria, ds| {
        criteria.range_input(&ds.schema, "totalReads", "300", "500");
    });
    let view = pipeline.get_view();
    assert_eq!(ids(&view.items), vec![5, 4, 3]);
}

#[test]
fn leaderboard_keeps_top_n_by_likes() {
    let preset = screens::likes_leaderboard(10);
    let ds = load(&preset, "leaderboard.csv");
    let mut pipeline = ListPipeline::from_config(ds, &preset.config);

    let view = pipeline.get_view();
    assert_eq!(view.total_count, 10);
    assert_eq!(view.total_pages, 1);
    let likes = column(&view.items, "totalLikes");
    assert_eq!(likes.first(), Some(&Value::Int64(427)));
    assert_eq!(likes.last(), Some(&Value::Int64(215)));
    assert!(likes.windows(2).all(|w| w[0].as_f64() >= w[1].as_f64()));

    // Summary covers every user, not only the top ten.
    assert_eq!(view.summary.get("userCount"), Some(15.0));
    assert_eq!(view.summary.get("topLikes"), Some(427.0));
    assert_eq!(view.summary.get("totalLikes"), Some(3801.0));

    pipeline.search("wilson");
    let view = pipeline.get_view();
    assert_eq!(ids(&view.items), vec![1, 12]);
    assert_eq!(view.summary.get("userCount"), Some(2.0));
}

#[test]
fn leaderboard_toggle_reverses_the_ascending_order() {
    let preset = screens::likes_leaderboard(50);
    let ds = load(&preset, "leaderboard.csv");
    let mut pipeline = ListPipeline::from_config(ds, &preset.config);
    pipeline.configure_page(1, 15);

    pipeline.configure_sort("totalLikes", SortDirection::Ascending);
    let ascending = ids(&pipeline.get_view().items);

    pipeline.configure_sort("totalLikes", SortDirection::Descending);
    let descending = ids(&pipeline.get_view().items);
    assert_eq!(descending, (1..=15).collect::<Vec<i64>>());

    assert_eq!(pipeline.toggle_sort("totalLikes"), SortSpec::ascending("totalLikes"));
    let toggled = ids(&pipeline.get_view().items);
    assert_eq!(toggled, ascending);
    assert_eq!(toggled, descending.into_iter().rev().collect::<Vec<_>>());
}

#[test]
fn display_sort_reorders_the_top_n_without_changing_it() {
    let preset = screens::likes_leaderboard(3);
    let ds = load(&preset, "leaderboard.csv");
    let mut pipeline = ListPipeline::from_config(ds, &preset.config);
    assert_eq!(ids(&pipeline.get_view().items), vec![1, 2, 3]);

    pipeline.configure_sort("totalLikes", SortDirection::Ascending);
    let view = pipeline.get_view();
    assert_eq!(ids(&view.items), vec![3, 2, 1]);
    assert_eq!(
        column(&view.items, "totalLikes"),
        vec![Value::Int64(315), Value::Int64(382), Value::Int64(427)]
    );

    // Emma Wilson, Liam Jones, Robert Brown.
    assert_eq!(pipeline.toggle_sort("name"), SortSpec::ascending("name"));
    assert_eq!(ids(&pipeline.get_view().items), vec![1, 3, 2]);

    pipeline.clear_sort();
    assert_eq!(ids(&pipeline.get_view().items), vec![1, 2, 3]);
}

#[test]
fn time_frame_selects_the_ranking_column() {
    let preset = screens::likes_leaderboard(3);
    let ds = load(&preset, "leaderboard.csv");
    let mut pipeline = ListPipeline::from_config(ds, &preset.config);
    pipeline.go_to_page(2);

    assert!(pipeline.select_time_frame(TimeFrame::Last7Days));
    assert_eq!(pipeline.time_frame(), TimeFrame::Last7Days);
    assert_eq!(pipeline.ranking(), Some(&SortSpec::descending("thisWeek")));
    assert_eq!(pipeline.page().page_index, 1);
    let view = pipeline.get_view();
    assert_eq!(ids(&view.items), vec![3, 1, 8]);
    assert_eq!(
        column(&view.items, "thisWeek"),
        vec![Value::Int64(41), Value::Int64(32), Value::Int64(29)]
    );
    // Ranking does not narrow the summary.
    assert_eq!(view.summary.get("userCount"), Some(15.0));

    pipeline.configure_sort("name", SortDirection::Ascending);
    assert_eq!(ids(&pipeline.get_view().items), vec![8, 1, 3]);

    assert!(pipeline.select_time_frame(TimeFrame::Last30Days));
    assert_eq!(ids(&pipeline.get_view().items), vec![1, 3, 2]);

    assert!(pipeline.select_time_frame(TimeFrame::AllTime));
    assert_eq!(ids(&pipeline.get_view().items), vec![1, 2, 3]);
}

#[test]
fn claps_leaderboard_ranks_weekly_ties_stably() {
    let preset = screens::claps_leaderboard(5);
    let ds = load(&preset, "claps_leaderboard.csv");
    let mut pipeline = ListPipeline::from_config(ds, &preset.config);

    let view = pipeline.get_view();
    assert_eq!(ids(&view.items), vec![1, 2, 3, 4, 5]);
    assert_eq!(view.summary.get("totalClaps"), Some(7287.0));
    assert_eq!(view.summary.get("topClaps"), Some(762.0));

    // Users 5 and 11 both have 47 claps this week; file order breaks the tie.
    pipeline.select_time_frame(TimeFrame::Last7Days);
    assert_eq!(ids(&pipeline.get_view().items), vec![4, 1, 5, 11, 8]);
}

#[test]
fn stories_leaderboard_pages_through_the_ranking() {
    let preset = screens::stories_leaderboard(50);
    let ds = load(&preset, "stories_leaderboard.json");
    let mut pipeline = ListPipeline::from_config(ds, &preset.config);

    pipeline.go_to_page(2);
    let view = pipeline.get_view();
    assert_eq!(view.total_count, 15);
    assert_eq!(view.total_pages, 2);
    assert_eq!(ids(&view.items), vec![11, 12, 13, 14, 15]);
    assert_eq!(view.summary.get("totalStories"), Some(860.0));

    pipeline.select_time_frame(TimeFrame::Last30Days);
    assert_eq!(ids(&pipeline.get_view().items), vec![2, 1, 4, 8, 5, 3, 7, 10, 6, 12]);
    pipeline.go_to_page(2);
    assert_eq!(ids(&pipeline.get_view().items), vec![9, 13, 15, 11, 14]);
}

#[test]
fn moderation_trigger_word_flag() {
    let preset = screens::moderation_queue();
    let ds = load(&preset, "moderation.json");
    let words = TriggerWords::standard().unwrap();
    let mut pipeline = ListPipeline::from_config(ds, &preset.config);

    pipeline.update_filters(|criteria, _| words.apply(criteria, MODERATION_TEXT_FIELDS, true));
    assert!(pipeline.criteria().get(HAS_TRIGGER_WORDS).is_some());
    // Newest first: 3 (16:45), 2 (14:15), 5 (Aug 9).
    let view = pipeline.get_view();
    assert_eq!(ids(&view.items), vec![3, 2, 5]);
    assert_eq!(view.summary.get("itemCount"), Some(3.0));

    pipeline.update_filters(|criteria, ds| {
        criteria.equals_input(&ds.schema, "status", "Pending");
    });
    assert_eq!(ids(&pipeline.get_view().items), vec![3, 2]);

    pipeline.update_filters(|criteria, _| words.apply(criteria, MODERATION_TEXT_FIELDS, false));
    assert_eq!(ids(&pipeline.get_view().items), vec![3, 1, 2]);
}

#[test]
fn moderation_nullable_moderator_sorts_last() {
    let preset = screens::moderation_queue();
    let ds = load(&preset, "moderation.json");
    let mut pipeline = ListPipeline::from_config(ds, &preset.config);

    for direction in [SortDirection::Ascending, SortDirection::Descending] {
        pipeline.configure_sort("moderator", direction);
        let moderators = column(&pipeline.get_view().items, "moderator");
        assert!(!moderators[0].is_null());
        assert!(!moderators[1].is_null());
        assert!(moderators[2..].iter().all(Value::is_null));
    }
}

#[test]
fn generated_stories_date_presets_and_nested_fields() {
    let preset = screens::generated_stories();
    let ds = load(&preset, "generated_stories.json");
    let mut pipeline = ListPipeline::from_config(ds, &preset.config);
    let evening = Utc.with_ymd_and_hms(2025, 8, 6, 20, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 8, 9, 12, 0, 0).unwrap();

    pipeline.update_filters(|criteria, _| {
        if let Some(c) = DatePreset::Today.criterion("createdAt", evening) {
            criteria.set("date", c);
        }
    });
    assert_eq!(ids(&pipeline.get_view().items), vec![4]);

    pipeline.update_filters(|criteria, _| {
        if let Some(c) = DatePreset::Week.criterion("createdAt", now) {
            criteria.set("date", c);
        }
    });
    let view = pipeline.get_view();
    assert_eq!(ids(&view.items), vec![4, 3, 2]);
    assert_eq!(view.summary.get("totalLikes"), Some(588.0));

    pipeline.search("emma");
    assert_eq!(ids(&pipeline.get_view().items), vec![3]);

    pipeline.update_filters(|criteria, _| {
        criteria.remove("date");
    });
    pipeline.configure_sort("metrics.completionRate", SortDirection::Descending);
    assert_eq!(ids(&pipeline.get_view().items), vec![3, 1]);
}

#[test]
fn page_slots_track_the_view() {
    let schema = Schema::new(vec![Field::new("id", DataType::Int64)]);
    let rows = (1..=95).map(|i| vec![Value::Int64(i)]).collect();
    let mut pipeline = ListPipeline::new(DataSet::new(schema, rows));
    pipeline.configure_page(5, 10);

    let slots = pipeline.get_view().page_slots();
    assert_eq!(slots.first(), Some(&PageSlot::Page(1)));
    assert_eq!(slots.last(), Some(&PageSlot::Page(10)));
    assert!(slots.contains(&PageSlot::Page(5)));
    assert!(slots.contains(&PageSlot::Ellipsis));
}

#[test]
fn parallel_engine_renders_the_same_view() {
    let preset = screens::likes_leaderboard(5);
    let ds = Arc::new(load(&preset, "leaderboard.csv"));
    let engine = ExecutionEngine::new(ExecutionOptions {
        num_threads: Some(2),
        parallel_threshold: 1,
    })
    .unwrap();

    let sequential = ListPipeline::from_config(Arc::clone(&ds), &preset.config);
    let parallel = ListPipeline::from_config(ds, &preset.config).with_engine(Arc::new(engine));

    assert_eq!(sequential.get_view(), parallel.get_view());
}

#[test]
fn replacing_data_keeps_filters() {
    let preset = screens::genres();
    let mut pipeline = ListPipeline::from_config(ten_genres(), &preset.config);
    let mut criteria = FilterCriteria::new();
    criteria.equals_input(&preset.schema, "ageGroup", "7-9");
    pipeline.configure_filters(criteria);
    pipeline.configure_page(2, 2);

    pipeline.replace_dataset(ten_genres());
    let view = pipeline.get_view();
    assert_eq!(view.page_index, 1);
    assert_eq!(view.total_count, 5);
}
