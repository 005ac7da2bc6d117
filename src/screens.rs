//! Built-in screen presets: schema + pipeline configuration for each dashboard list.
//!
//! Field names follow the dashboard's record shapes; nested objects are flattened to dotted
//! paths (`metrics.likes`, `creator.name`, `models.gpt-4o`).

use crate::config::ScreenConfig;
use crate::processing::sort::{SortDirection, SortSpec};
use crate::processing::summary::MetricSpec;
use crate::processing::window::TimeFrame;
use crate::types::{DataType, Field, Schema};

/// Monthly spend budget for the language-model usage screen, in dollars.
pub const MONTHLY_BUDGET: f64 = 500.0;

/// Models broken out on the language-model usage screen.
pub const USAGE_MODELS: &[&str] = &["models.gpt-3.5-turbo", "models.gpt-4o", "models.claude-3-sonnet"];

/// Text fields checked for trigger words on the moderation queue.
pub const MODERATION_TEXT_FIELDS: &[&str] = &["prompt", "response"];

/// A screen's record schema plus its pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPreset {
    pub schema: Schema,
    pub config: ScreenConfig,
}

impl ScreenPreset {
    fn new(schema: Schema, config: ScreenConfig) -> Self {
        Self { schema, config }
    }
}

pub fn genres() -> ScreenPreset {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("name", DataType::Utf8),
        Field::new("ageGroup", DataType::Utf8),
        Field::new("category", DataType::Utf8),
        Field::new("totalStories", DataType::Int64),
        Field::new("totalReads", DataType::Int64),
        Field::new("avgEngagement", DataType::Float64),
        Field::new("completionRate", DataType::Float64),
        Field::new("aiRatio", DataType::Float64),
        Field::new("trend", DataType::Utf8),
        Field::new("trendPercentage", DataType::Float64),
    ]);
    let config = ScreenConfig::new("genres")
        .initial_sort(SortSpec::descending("totalReads"))
        .fallback_direction(SortDirection::Descending)
        .search_fields(["name", "category"])
        .metric(MetricSpec::count("genreCount"))
        .metric(MetricSpec::sum("totalStories", "totalStories"))
        .metric(MetricSpec::sum("totalReads", "totalReads"))
        .metric(MetricSpec::average("avgEngagement", "avgEngagement"));
    ScreenPreset::new(schema, config)
}

pub fn quotes() -> ScreenPreset {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("title", DataType::Utf8),
        Field::new("author", DataType::Utf8),
        Field::new("category", DataType::Utf8),
        Field::new("lastUsed", DataType::Timestamp).nullable(),
        Field::new("active", DataType::Bool),
    ]);
    let config = ScreenConfig::new("quotes")
        .page_size(5)
        .initial_sort(SortSpec::descending("lastUsed"))
        .search_fields(["title", "author", "category"])
        .metric(MetricSpec::count("quoteCount"));
    ScreenPreset::new(schema, config)
}

pub fn user_stories() -> ScreenPreset {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("title", DataType::Utf8),
        Field::new("genre", DataType::Utf8),
        Field::new("ageGroup", DataType::Utf8),
        Field::new("status", DataType::Utf8),
        Field::new("createdAt", DataType::Timestamp),
        Field::new("updatedAt", DataType::Timestamp).nullable(),
        Field::new("userId", DataType::Int64),
        Field::new("isAIGenerated", DataType::Bool),
        Field::new("metrics.views", DataType::Int64).nullable(),
        Field::new("metrics.likes", DataType::Int64).nullable(),
        Field::new("metrics.shares", DataType::Int64).nullable(),
    ]);
    let config = ScreenConfig::new("user_stories")
        .initial_sort(SortSpec::descending("createdAt"))
        .search_fields(["title"])
        .metric(MetricSpec::count("storyCount"))
        .metric(MetricSpec::sum("totalLikes", "metrics.likes"))
        .metric(MetricSpec::sum("totalViews", "metrics.views"));
    ScreenPreset::new(schema, config)
}

pub fn story_imports() -> ScreenPreset {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("title", DataType::Utf8),
        Field::new("ageGroup", DataType::Utf8),
        Field::new("genre", DataType::Utf8),
        Field::new("inspiredBy", DataType::Utf8),
        Field::new("status", DataType::Utf8),
        Field::new("createdAt", DataType::Timestamp),
        Field::new("metrics.views", DataType::Int64),
        Field::new("metrics.completionRate", DataType::Float64),
        Field::new("metrics.likes", DataType::Int64),
        Field::new("metrics.claps", DataType::Int64).nullable(),
        Field::new("metrics.bookmarks", DataType::Int64).nullable(),
    ]);
    let config = ScreenConfig::new("story_imports")
        .initial_sort(SortSpec::descending("createdAt"))
        .search_fields(["title", "inspiredBy"])
        .metric(MetricSpec::count("storyCount"))
        .metric(MetricSpec::sum("totalViews", "metrics.views"))
        .metric(MetricSpec::average("avgCompletionRate", "metrics.completionRate"));
    ScreenPreset::new(schema, config)
}

/// Top `limit` users by likes. The period selector ranks by `thisWeek` or `thisMonth`.
pub fn likes_leaderboard(limit: usize) -> ScreenPreset {
    leaderboard("likes_leaderboard", "totalLikes", limit, [Field::new("storiesCount", DataType::Int64).nullable()])
}

/// Top `limit` users by claps received.
pub fn claps_leaderboard(limit: usize) -> ScreenPreset {
    leaderboard("claps_leaderboard", "totalClaps", limit, [])
}

/// Top `limit` users by stories written, ten per page.
pub fn stories_leaderboard(limit: usize) -> ScreenPreset {
    leaderboard("stories_leaderboard", "totalStories", limit, [])
}

/// Users ranked by an all-time counter plus `thisWeek`/`thisMonth` counters. Metrics are
/// `userCount`, the counter's sum under its own name, and the best score as `top<Counter>`.
fn leaderboard<const N: usize>(name: &str, total: &str, limit: usize, extra: [Field; N]) -> ScreenPreset {
    let mut fields = vec![
        Field::new("id", DataType::Int64),
        Field::new("name", DataType::Utf8),
        Field::new("email", DataType::Utf8),
        Field::new(total, DataType::Int64),
        Field::new("thisWeek", DataType::Int64),
        Field::new("thisMonth", DataType::Int64),
    ];
    fields.extend(extra);
    let top = total.replacen("total", "top", 1);
    let config = ScreenConfig::new(name)
        .initial_sort(SortSpec::descending(total))
        .fallback_direction(SortDirection::Descending)
        .sort_default("name", SortDirection::Ascending)
        .search_fields(["name", "email"])
        .limit(limit.max(1))
        .rank_by(SortSpec::descending(total))
        .rank_field(TimeFrame::AllTime, total)
        .rank_field(TimeFrame::Last7Days, "thisWeek")
        .rank_field(TimeFrame::Last30Days, "thisMonth")
        .metric(MetricSpec::count("userCount"))
        .metric(MetricSpec::sum(total, total))
        .metric(MetricSpec::max(top, total));
    ScreenPreset::new(Schema::new(fields), config)
}

pub fn moderation_queue() -> ScreenPreset {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("userName", DataType::Utf8),
        Field::new("userEmail", DataType::Utf8),
        Field::new("type", DataType::Utf8),
        Field::new("prompt", DataType::Utf8),
        Field::new("response", DataType::Utf8),
        Field::new("priority", DataType::Utf8),
        Field::new("status", DataType::Utf8),
        Field::new("moderator", DataType::Utf8).nullable(),
        Field::new("createdAt", DataType::Timestamp),
        Field::new("childName", DataType::Utf8).nullable(),
        Field::new("childAge", DataType::Int64).nullable(),
    ]);
    let config = ScreenConfig::new("moderation_queue")
        .initial_sort(SortSpec::descending("createdAt"))
        .search_fields(["userName", "userEmail", "prompt"])
        .metric(MetricSpec::count("itemCount"));
    ScreenPreset::new(schema, config)
}

pub fn generated_stories() -> ScreenPreset {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("title", DataType::Utf8),
        Field::new("creator.id", DataType::Int64),
        Field::new("creator.name", DataType::Utf8),
        Field::new("creator.email", DataType::Utf8),
        Field::new("createdAt", DataType::Timestamp),
        Field::new("genre", DataType::Utf8),
        Field::new("ageGroup", DataType::Utf8),
        Field::new("metrics.views", DataType::Int64),
        Field::new("metrics.likes", DataType::Int64),
        Field::new("metrics.completionRate", DataType::Float64),
    ]);
    let config = ScreenConfig::new("generated_stories")
        .initial_sort(SortSpec::descending("createdAt"))
        .search_fields(["title", "creator.name"])
        .metric(MetricSpec::count("storyCount"))
        .metric(MetricSpec::sum("totalViews", "metrics.views"))
        .metric(MetricSpec::sum("totalLikes", "metrics.likes"));
    ScreenPreset::new(schema, config)
}

/// Daily language-model spend. Rows must be in chronological order.
///
/// `monthProgress` is not derivable from the rows; callers add it as a constant metric before
/// classifying with [`crate::processing::classify::budget_status_table`].
pub fn chatgpt_usage() -> ScreenPreset {
    let mut fields = vec![
        Field::new("name", DataType::Timestamp),
        Field::new("cost", DataType::Float64),
        Field::new("tokens", DataType::Int64),
        Field::new("budget", DataType::Float64).nullable(),
    ];
    fields.extend(USAGE_MODELS.iter().map(|m| Field::new(*m, DataType::Float64).nullable()));
    let config = ScreenConfig::new("chatgpt_usage")
        .page_size(31)
        .metric(MetricSpec::count("days"))
        .metric(MetricSpec::sum("totalCost", "cost"))
        .metric(MetricSpec::sum("totalTokens", "tokens"))
        .metric(MetricSpec::ratio("dailyAvgCost", "totalCost", "days", 1.0))
        .metric(MetricSpec::ratio("costPerToken", "totalCost", "totalTokens", 1.0))
        .metric(MetricSpec::ratio("tokensPerDollar", "totalTokens", "totalCost", 1.0))
        .metric(MetricSpec::constant("monthlyBudget", MONTHLY_BUDGET))
        .metric(MetricSpec::ratio("budgetPercentUsed", "totalCost", "monthlyBudget", 100.0))
        .metric(MetricSpec::growth_rate("costGrowth", "cost"));
    ScreenPreset::new(Schema::new(fields), config)
}

/// Daily image-generation credit usage. `used` is cumulative; rows are chronological.
pub fn leonardo_usage() -> ScreenPreset {
    let schema = Schema::new(vec![
        Field::new("name", DataType::Timestamp),
        Field::new("used", DataType::Int64),
        Field::new("remaining", DataType::Int64),
        Field::new("totalCredits", DataType::Int64),
        Field::new("chatGPTCost", DataType::Float64).nullable(),
    ]);
    let config = ScreenConfig::new("leonardo_usage")
        .page_size(31)
        .metric(MetricSpec::count("days"))
        .metric(MetricSpec::first("firstUsed", "used"))
        .metric(MetricSpec::last("lastUsed", "used"))
        .metric(MetricSpec::last("currentRemaining", "remaining"))
        .metric(MetricSpec::last("totalCredits", "totalCredits"))
        .metric(MetricSpec::difference("periodUsage", "lastUsed", "firstUsed"))
        .metric(MetricSpec::ratio("averageDailyUsage", "periodUsage", "days", 1.0))
        .metric(MetricSpec::ratio("percentRemaining", "currentRemaining", "totalCredits", 100.0));
    ScreenPreset::new(schema, config)
}

/// Every preset, with the leaderboards at 50 users.
pub fn all() -> Vec<ScreenPreset> {
    vec![
        genres(),
        quotes(),
        user_stories(),
        story_imports(),
        likes_leaderboard(50),
        claps_leaderboard(50),
        stories_leaderboard(50),
        moderation_queue(),
        generated_stories(),
        chatgpt_usage(),
        leonardo_usage(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_is_valid_against_its_schema() {
        for preset in all() {
            preset.config.validate().unwrap();
            preset.config.check_schema(&preset.schema).unwrap();
        }
    }

    #[test]
    fn presets_carry_screen_defaults() {
        assert_eq!(quotes().config.page_size, 5);
        assert_eq!(user_stories().config.page_size, 10);
        assert_eq!(likes_leaderboard(50).config.limit, Some(50));
        assert_eq!(claps_leaderboard(0).config.limit, Some(1));
        assert_eq!(
            stories_leaderboard(20).config.rank_fields.get(&TimeFrame::Last30Days).map(String::as_str),
            Some("thisMonth")
        );
        assert_eq!(
            claps_leaderboard(50).config.metrics.last().map(MetricSpec::name),
            Some("topClaps")
        );
        assert_eq!(
            genres().config.sort_defaults().direction_for("avgEngagement"),
            SortDirection::Descending
        );
        assert_eq!(
            quotes().config.sort_defaults().direction_for("author"),
            SortDirection::Ascending
        );
    }
}
