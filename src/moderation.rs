//! Trigger-word detection for the moderation queue.

use std::collections::HashSet;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::processing::filter::{Criterion, FilterCriteria};
use crate::types::{Schema, Value};

/// Criterion key / flag name for "has trigger words".
pub const HAS_TRIGGER_WORDS: &str = "hasTriggerWords";

/// Words that flag a prompt or response for review.
pub const DEFAULT_TRIGGER_WORDS: &[&str] = &[
    "violence",
    "weapon",
    "kill",
    "death",
    "gun",
    "suicide",
    "terrorist",
    "inappropriate",
    "explicit",
    "sexual",
    "adult",
    "nudity",
    "hate",
    "racism",
    "drugs",
    "alcohol",
    "abuse",
    "harassment",
];

/// Whole-word, case-insensitive matcher over a fixed word list.
#[derive(Debug, Clone)]
pub struct TriggerWords {
    words: Vec<String>,
    /// `None` for an empty list.
    pattern: Option<Regex>,
}

impl TriggerWords {
    pub fn new<I, S>(words: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Ok(Self {
                words,
                pattern: None,
            });
        }
        let alternation = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            words,
            pattern: Some(pattern),
        })
    }

    /// The moderation screen's list.
    pub fn standard() -> Result<Self, regex::Error> {
        Self::new(DEFAULT_TRIGGER_WORDS)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Trigger words found in `text`, once each, in list order.
    pub fn detect(&self, text: &str) -> Vec<&str> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        let found: HashSet<String> = pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        self.words
            .iter()
            .filter(|w| found.contains(w.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }

    /// Flag criterion keeping rows where any of `fields` contains a trigger word.
    pub fn flag<I, S>(&self, fields: I) -> Criterion
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let pattern = self.pattern.clone();
        Criterion::Flag {
            name: HAS_TRIGGER_WORDS.to_owned(),
            predicate: Arc::new(move |schema: &Schema, row: &[Value]| {
                fields.iter().any(|f| {
                    schema
                        .index_of(f)
                        .and_then(|i| row.get(i))
                        .and_then(Value::as_str)
                        .is_some_and(|text| pattern.as_ref().is_some_and(|p| p.is_match(text)))
                })
            }),
        }
    }

    /// Set or clear the "has trigger words" constraint; `false` imposes no constraint.
    pub fn apply<S: AsRef<str>>(&self, criteria: &mut FilterCriteria, fields: &[S], enabled: bool) {
        if enabled {
            criteria.set(
                HAS_TRIGGER_WORDS,
                self.flag(fields.iter().map(|f| f.as_ref().to_owned())),
            );
        } else {
            criteria.remove(HAS_TRIGGER_WORDS);
        }
    }
}
