//! Insight and recommendation generation
//!
//! Both generators are pure and order-sensitive: callers slice the first N
//! entries, so the order rules are emitted in is their priority.

use super::AnalyticsSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion rate above which the team earns a success insight
pub const HIGH_COMPLETION_THRESHOLD: f64 = 80.0;
/// Completion rate below which the team gets a warning
pub const LOW_COMPLETION_THRESHOLD: f64 = 50.0;
/// Productivity completion rate above which a success insight fires
pub const HIGH_PRODUCTIVITY_THRESHOLD: f64 = 75.0;
/// Productivity completion rate below which completion help is recommended
pub const IMPROVE_COMPLETION_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    Success,
    Warning,
    Error,
    Info,
}

/// Human-readable observation about a snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Insight {
    pub severity: InsightSeverity,
    pub label: String,
    pub message: String,
}

impl Insight {
    fn new(severity: InsightSeverity, label: &str, message: String) -> Self {
        Self {
            severity,
            label: label.to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

impl fmt::Display for RecommendationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecommendationPriority::High => "high",
            RecommendationPriority::Medium => "medium",
            RecommendationPriority::Low => "low",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Tasks,
    Productivity,
    Financial,
    Events,
}

/// Suggested follow-up action
///
/// `link` is a navigation hint for the UI layer; it is not interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub category: RecommendationCategory,
    pub title: String,
    pub description: String,
    pub suggested_action: String,
    pub link: String,
}

impl Recommendation {
    fn new(
        priority: RecommendationPriority,
        category: RecommendationCategory,
        title: &str,
        description: &str,
        suggested_action: &str,
        link: &str,
    ) -> Self {
        Self {
            priority,
            category,
            title: title.to_string(),
            description: description.to_string(),
            suggested_action: suggested_action.to_string(),
            link: link.to_string(),
        }
    }
}

/// Observations about a snapshot, most notable first
pub fn derive_insights(snapshot: &AnalyticsSnapshot) -> Vec<Insight> {
    let mut insights = Vec::new();
    let period = snapshot.timeframe.as_str();

    if snapshot.tasks.total > 0 {
        let rate = snapshot.tasks.completion_rate;
        if rate > HIGH_COMPLETION_THRESHOLD {
            insights.push(Insight::new(
                InsightSeverity::Success,
                "Excellent Task Completion",
                format!("Team has {:.1}% task completion rate", rate),
            ));
        } else if rate < LOW_COMPLETION_THRESHOLD {
            insights.push(Insight::new(
                InsightSeverity::Warning,
                "Low Task Completion",
                format!("Only {:.1}% of tasks completed", rate),
            ));
        }
    }

    if snapshot.tasks.overdue > 0 {
        insights.push(Insight::new(
            InsightSeverity::Error,
            "Overdue Tasks Alert",
            format!(
                "{} tasks are overdue and need attention",
                snapshot.tasks.overdue
            ),
        ));
    }

    let financial = &snapshot.financial;
    if financial.total_income > financial.total_expenses {
        insights.push(Insight::new(
            InsightSeverity::Success,
            "Positive Cash Flow",
            format!(
                "Net positive of {} this {}",
                format_amount(financial.total_income - financial.total_expenses),
                period
            ),
        ));
    }

    if snapshot.team.new_members > 0 {
        insights.push(Insight::new(
            InsightSeverity::Info,
            "Team Growth",
            format!(
                "{} new members joined this {}",
                snapshot.team.new_members, period
            ),
        ));
    }

    if snapshot.productivity.completion_rate > HIGH_PRODUCTIVITY_THRESHOLD {
        insights.push(Insight::new(
            InsightSeverity::Success,
            "High Productivity",
            format!(
                "Team productivity is at {:.1}%",
                snapshot.productivity.completion_rate
            ),
        ));
    }

    insights
}

/// Suggested actions for a snapshot, in priority order
pub fn derive_recommendations(snapshot: &AnalyticsSnapshot) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if snapshot.tasks.overdue > 0 {
        recommendations.push(Recommendation::new(
            RecommendationPriority::High,
            RecommendationCategory::Tasks,
            "Address Overdue Tasks",
            "Review and reassign overdue tasks to prevent project delays",
            "View Overdue Tasks",
            "pages/logs/task-logs.html?filter=overdue",
        ));
    }

    if snapshot.productivity.completion_rate < IMPROVE_COMPLETION_THRESHOLD {
        recommendations.push(Recommendation::new(
            RecommendationPriority::Medium,
            RecommendationCategory::Productivity,
            "Improve Task Completion",
            "Consider breaking down large tasks or providing additional support",
            "Review Task Distribution",
            "pages/logs/task-logs.html",
        ));
    }

    if snapshot.financial.total_expenses > snapshot.financial.total_income {
        recommendations.push(Recommendation::new(
            RecommendationPriority::High,
            RecommendationCategory::Financial,
            "Review Expenses",
            "Expenses exceed income. Review and optimize spending",
            "View Financial Report",
            "pages/logs/payment-logs.html",
        ));
    }

    if snapshot.events.upcoming == 0 {
        recommendations.push(Recommendation::new(
            RecommendationPriority::Low,
            RecommendationCategory::Events,
            "Plan Upcoming Events",
            "No upcoming events scheduled. Consider planning team activities",
            "Create Event",
            "pages/logs/event-logs.html",
        ));
    }

    recommendations
}

/// Money with two decimals and thousands separators, e.g. `12,500.00`
pub fn format_amount(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{:02}", sign, grouped, cents % 100)
}
