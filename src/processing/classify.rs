//! Threshold classification of derived metrics.
//!
//! A [`DecisionTable`] is an ordered list of rules over a [`SummaryResult`]; the first rule whose
//! conditions all hold decides the outcome, and an explicit default covers everything else.

use std::fmt;

use serde::Serialize;

use crate::processing::summary::SummaryResult;

/// Low-credit alert threshold used by the image-generation usage screen.
pub const LOW_CREDIT_THRESHOLD: f64 = 100.0;

/// Fraction of month progress below which spending counts as under budget.
pub const UNDER_BUDGET_FACTOR: f64 = 0.8;

/// One side of a [`Condition`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    /// A named metric; missing metrics read as `0.0`.
    Metric(String),
    /// A named metric multiplied by a constant factor.
    Scaled { metric: String, factor: f64 },
    Const(f64),
}

impl Operand {
    pub fn metric(name: impl Into<String>) -> Self {
        Self::Metric(name.into())
    }

    pub fn scaled(name: impl Into<String>, factor: f64) -> Self {
        Self::Scaled {
            metric: name.into(),
            factor,
        }
    }

    fn resolve(&self, summary: &SummaryResult) -> f64 {
        match self {
            Self::Metric(name) => summary.value(name),
            Self::Scaled { metric, factor } => summary.value(metric) * factor,
            Self::Const(v) => *v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

/// `left <cmp> right`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub left: Operand,
    pub cmp: Comparison,
    pub right: Operand,
}

impl Condition {
    pub fn new(left: Operand, cmp: Comparison, right: Operand) -> Self {
        Self { left, cmp, right }
    }

    pub fn holds(&self, summary: &SummaryResult) -> bool {
        let (l, r) = (self.left.resolve(summary), self.right.resolve(summary));
        match self.cmp {
            Comparison::Gt => l > r,
            Comparison::Ge => l >= r,
            Comparison::Lt => l < r,
            Comparison::Le => l <= r,
            Comparison::Eq => l == r,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule<O> {
    pub conditions: Vec<Condition>,
    pub outcome: O,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionTable<O> {
    rules: Vec<Rule<O>>,
    default: O,
}

impl<O: Clone> DecisionTable<O> {
    pub fn new(default: O) -> Self {
        Self {
            rules: Vec::new(),
            default,
        }
    }

    /// Append a rule; rules are tried in insertion order.
    pub fn rule(mut self, conditions: Vec<Condition>, outcome: O) -> Self {
        self.rules.push(Rule {
            conditions,
            outcome,
        });
        self
    }

    pub fn rules(&self) -> &[Rule<O>] {
        &self.rules
    }

    pub fn classify(&self, summary: &SummaryResult) -> O {
        self.rules
            .iter()
            .find(|rule| rule.conditions.iter().all(|c| c.holds(summary)))
            .map(|rule| rule.outcome.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetStatus {
    OverBudget,
    UnderBudget,
    OnTrack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreditStatus {
    Low,
    Healthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthTrend {
    Up,
    Down,
    Flat,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OverBudget => "over-budget",
            Self::UnderBudget => "under-budget",
            Self::OnTrack => "on-track",
        })
    }
}

/// Spending vs. time elapsed in the month.
///
/// Over budget when `percent_used > month_progress`, under budget when
/// `percent_used < month_progress * 0.8`, on track otherwise.
pub fn budget_status_table(percent_used: &str, month_progress: &str) -> DecisionTable<BudgetStatus> {
    DecisionTable::new(BudgetStatus::OnTrack)
        .rule(
            vec![Condition::new(
                Operand::metric(percent_used),
                Comparison::Gt,
                Operand::metric(month_progress),
            )],
            BudgetStatus::OverBudget,
        )
        .rule(
            vec![Condition::new(
                Operand::metric(percent_used),
                Comparison::Lt,
                Operand::scaled(month_progress, UNDER_BUDGET_FACTOR),
            )],
            BudgetStatus::UnderBudget,
        )
}

/// Low when `remaining <= threshold`.
pub fn credit_alert_table(remaining: &str, threshold: f64) -> DecisionTable<CreditStatus> {
    DecisionTable::new(CreditStatus::Healthy).rule(
        vec![Condition::new(
            Operand::metric(remaining),
            Comparison::Le,
            Operand::Const(threshold),
        )],
        CreditStatus::Low,
    )
}

/// Sign of a growth-rate metric.
pub fn growth_trend_table(growth: &str) -> DecisionTable<GrowthTrend> {
    DecisionTable::new(GrowthTrend::Flat)
        .rule(
            vec![Condition::new(Operand::metric(growth), Comparison::Gt, Operand::Const(0.0))],
            GrowthTrend::Up,
        )
        .rule(
            vec![Condition::new(Operand::metric(growth), Comparison::Lt, Operand::Const(0.0))],
            GrowthTrend::Down,
        )
}
