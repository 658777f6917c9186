//! Performance report generation
//!
//! A [`PerformanceReport`] condenses one timeframe's [`TeamAnalytics`] into
//! the handful of figures a team lead reviews: headline numbers, highlights,
//! concerns, the top recommendations and the financial balance.
//!
//! Reports render to JSON or Markdown. PDF layout belongs to the portal's
//! report layer and is not produced here.

use super::insights::{format_amount, Insight, InsightSeverity, Recommendation};
use super::{TeamAnalytics, TimeWindow, Timeframe};
use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Default number of recommendations carried into a report
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

/// Report export formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(AnalyticsError::configuration(format!(
                "unsupported report format '{}'",
                other
            ))),
        }
    }
}

/// Headline figures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub timeframe: Timeframe,
    pub window: TimeWindow,
    pub total_tasks: usize,
    /// Team productivity completion rate
    pub completion_rate: f64,
    pub team_size: usize,
    pub active_members: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportFinancials {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

/// Condensed team performance report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub highlights: Vec<Insight>,
    pub concerns: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    pub financial: ReportFinancials,
}

impl PerformanceReport {
    /// Build a report, keeping at most `recommendation_limit` recommendations
    pub fn from_analytics(analytics: &TeamAnalytics, recommendation_limit: usize) -> Self {
        let snapshot = &analytics.snapshot;

        let highlights = analytics
            .insights
            .iter()
            .filter(|i| i.severity == InsightSeverity::Success)
            .cloned()
            .collect();
        let concerns = analytics
            .insights
            .iter()
            .filter(|i| matches!(i.severity, InsightSeverity::Warning | InsightSeverity::Error))
            .cloned()
            .collect();

        Self {
            generated_at: snapshot.generated_at,
            summary: ReportSummary {
                timeframe: snapshot.timeframe,
                window: snapshot.window,
                total_tasks: snapshot.tasks.total,
                completion_rate: snapshot.productivity.completion_rate,
                team_size: snapshot.team.total_members,
                active_members: snapshot.team.active_members,
            },
            highlights,
            concerns,
            recommendations: analytics
                .recommendations
                .iter()
                .take(recommendation_limit)
                .cloned()
                .collect(),
            financial: ReportFinancials {
                income: snapshot.financial.total_income,
                expenses: snapshot.financial.total_expenses,
                balance: snapshot.financial.total_income - snapshot.financial.total_expenses,
            },
        }
    }

    /// Render the report in the requested format
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ReportFormat::Markdown => Ok(self.to_markdown()),
        }
    }

    /// Write the rendered report to `path`
    pub async fn export<P: AsRef<Path>>(&self, path: P, format: ReportFormat) -> Result<()> {
        let content = self.render(format)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    fn to_markdown(&self) -> String {
        let mut content = String::new();

        content.push_str("# Team Performance Report\n\n");
        content.push_str(&format!(
            "Period: {} ({} to {})\n\n",
            self.summary.timeframe,
            self.summary.window.start.format("%Y-%m-%d"),
            self.summary.window.end.format("%Y-%m-%d")
        ));
        content.push_str(&format!(
            "Generated: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        content.push_str("## Summary\n\n");
        content.push_str(&format!("- **Total Tasks**: {}\n", self.summary.total_tasks));
        content.push_str(&format!(
            "- **Completion Rate**: {:.1}%\n",
            self.summary.completion_rate
        ));
        content.push_str(&format!("- **Team Size**: {}\n", self.summary.team_size));
        content.push_str(&format!(
            "- **Active Members**: {}\n\n",
            self.summary.active_members
        ));

        content.push_str("## Financial\n\n");
        content.push_str(&format!(
            "- **Income**: {}\n",
            format_amount(self.financial.income)
        ));
        content.push_str(&format!(
            "- **Expenses**: {}\n",
            format_amount(self.financial.expenses)
        ));
        content.push_str(&format!(
            "- **Balance**: {}\n\n",
            format_amount(self.financial.balance)
        ));

        if !self.highlights.is_empty() {
            content.push_str("## Highlights\n\n");
            for insight in &self.highlights {
                content.push_str(&format!("- **{}**: {}\n", insight.label, insight.message));
            }
            content.push('\n');
        }

        if !self.concerns.is_empty() {
            content.push_str("## Concerns\n\n");
            for insight in &self.concerns {
                content.push_str(&format!("- **{}**: {}\n", insight.label, insight.message));
            }
            content.push('\n');
        }

        if !self.recommendations.is_empty() {
            content.push_str("## Recommendations\n\n");
            for rec in &self.recommendations {
                content.push_str(&format!(
                    "- [{}] **{}**: {} ({})\n",
                    rec.priority, rec.title, rec.description, rec.suggested_action
                ));
            }
        }

        content
    }
}
