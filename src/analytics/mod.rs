//! Analytics aggregation and caching
//!
//! This module turns the portal's raw task, transaction, event and member
//! records into dashboard-ready statistics, scores, insights and
//! recommendations.
//!
//! # Overview
//!
//! - **Record Store** ([`store`]): read-only access to whole collections
//! - **Metric Calculators** ([`metrics`]): pure functions over record lists
//! - **Analytics Engine** ([`AnalyticsEngine`]): windowed aggregation into an
//!   [`AnalyticsSnapshot`], plus per-member analytics
//! - **Insights** ([`insights`]): ordered observations and suggested actions
//! - **Cache** ([`cache`]): TTL memoization keyed by timeframe or member
//! - **Reports** ([`reports`]): condensed performance reports
//! - **Refresh** ([`refresh`]): optional periodic re-fetch for live views
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use teamhub_analytics::analytics::{AnalyticsEngine, JsonFileStore, Timeframe};
//! use teamhub_analytics::AnalyticsConfig;
//!
//! # async fn example() -> teamhub_analytics::Result<()> {
//! let store = Arc::new(JsonFileStore::new("portal-export.json"));
//! let engine = AnalyticsEngine::new(store, AnalyticsConfig::default());
//!
//! let analytics = engine.team_analytics(Timeframe::Month).await?;
//! println!("Completion rate: {:.1}%", analytics.snapshot.tasks.completion_rate);
//! for insight in &analytics.insights {
//!     println!("{}: {}", insight.label, insight.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Windowing
//!
//! Task, transaction and new-member figures only count records created inside
//! the resolved [`TimeWindow`]. Event status counts and member totals are
//! computed over every record, matching what the portal's dashboard shows.
//!
//! # Error Handling
//!
//! A single unreachable collection is logged and treated as empty so the
//! dashboard stays partially functional. The pass fails with
//! `StoreUnavailable` only when every collection is unreachable, and with
//! `AggregationFailed` when a calculator rejects a record. Failed passes are
//! never cached.

pub mod cache;
pub mod insights;
pub mod metrics;
pub mod records;
pub mod refresh;
pub mod reports;
pub mod store;
pub mod timeframe;

#[cfg(test)]
pub mod test_utils;


#[cfg(test)]
pub mod property_tests;

use crate::clock::{Clock, SystemClock};
use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Analytics engine over a record store
///
/// The engine is `Clone`; clones share the store, clock and caches, so one
/// engine can be handed to several async tasks.
#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    config: AnalyticsConfig,
    snapshots: Arc<TtlCache<Arc<AnalyticsSnapshot>>>,
    members: Arc<TtlCache<Arc<MemberAnalytics>>>,
}

/// Task counts for one partition of tasks
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub overdue: usize,
    pub completion_rate: f64,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        Self {
            total: tasks.len(),
            completed: count(TaskStatus::Completed),
            pending: count(TaskStatus::Pending),
            in_progress: count(TaskStatus::InProgress),
            overdue: metrics::overdue_count(tasks, now),
            completion_rate: metrics::completion_rate(tasks),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinancialSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamSummary {
    pub total_members: usize,
    pub active_members: usize,
    pub new_members: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventSummary {
    pub total: usize,
    pub upcoming: usize,
    pub active: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductivitySummary {
    /// Mean of per-member completion rates
    pub completion_rate: f64,
    pub avg_completion_time_days: i64,
    pub productivity_score: u32,
    pub reliability_score: u32,
}

/// Aggregation result for one timeframe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSnapshot {
    pub id: Uuid,
    pub timeframe: Timeframe,
    pub window: TimeWindow,
    pub generated_at: DateTime<Utc>,
    pub tasks: TaskSummary,
    pub financial: FinancialSummary,
    pub team: TeamSummary,
    pub events: EventSummary,
    pub productivity: ProductivitySummary,
}

/// Snapshot together with the insights and recommendations derived from it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamAnalytics {
    pub snapshot: AnalyticsSnapshot,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemberFinancials {
    /// Sum of the member's credits
    pub total_paid: f64,
    /// Sum of the member's debits
    pub total_owed: f64,
    pub balance: f64,
    /// Unpaid shares of active collection requests
    pub outstanding_dues: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemberPerformance {
    pub avg_completion_time_days: i64,
    pub productivity_score: u32,
    pub reliability_score: u32,
}

/// All-time analytics for one member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberAnalytics {
    pub member_id: String,
    pub generated_at: DateTime<Utc>,
    pub tasks: TaskSummary,
    pub financial: MemberFinancials,
    pub performance: MemberPerformance,
}

impl AnalyticsEngine {
    /// Create an engine reading the wall clock
    pub fn new(store: Arc<dyn RecordStore>, config: AnalyticsConfig) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), config)
    }

    /// Create an engine with an injected clock
    pub fn with_clock(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        config: AnalyticsConfig,
    ) -> Self {
        let ttl = config.cache_ttl();
        Self {
            snapshots: Arc::new(TtlCache::new(ttl, Arc::clone(&clock))),
            members: Arc::new(TtlCache::new(ttl, Arc::clone(&clock))),
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Aggregate a timeframe, reusing a cached snapshot while it is fresh
    pub async fn aggregate(&self, timeframe: Timeframe) -> Result<Arc<AnalyticsSnapshot>> {
        let key = CacheKey::team_analytics(timeframe);
        self.snapshots
            .get_or_compute_default(&key, move || async move {
                self.compute_snapshot(timeframe).await.map(Arc::new)
            })
            .await
    }

    /// Snapshot plus freshly derived insights and recommendations
    pub async fn team_analytics(&self, timeframe: Timeframe) -> Result<TeamAnalytics> {
        let snapshot = self.aggregate(timeframe).await?;
        Ok(TeamAnalytics {
            insights: derive_insights(&snapshot),
            recommendations: derive_recommendations(&snapshot),
            snapshot: snapshot.as_ref().clone(),
        })
    }

    /// Analytics for a single member, cached per member
    pub async fn member_analytics(&self, member_id: &str) -> Result<Arc<MemberAnalytics>> {
        let key = CacheKey::member_analytics(member_id);
        self.members
            .get_or_compute_default(&key, move || async move {
                self.compute_member_analytics(member_id).await.map(Arc::new)
            })
            .await
    }

    /// Condensed report for a timeframe
    pub async fn performance_report(&self, timeframe: Timeframe) -> Result<PerformanceReport> {
        let analytics = self.team_analytics(timeframe).await?;
        Ok(PerformanceReport::from_analytics(
            &analytics,
            self.config.report_recommendation_limit,
        ))
    }

    /// Drop every cached snapshot and member result
    pub fn clear_cache(&self) {
        self.snapshots.clear();
        self.members.clear();
    }

    /// Combined hit/miss counters of both caches
    pub fn cache_stats(&self) -> CacheStats {
        let team = self.snapshots.stats();
        let member = self.members.stats();
        CacheStats {
            hits: team.hits + member.hits,
            misses: team.misses + member.misses,
            entries: team.entries + member.entries,
        }
    }

    async fn compute_snapshot(&self, timeframe: Timeframe) -> Result<AnalyticsSnapshot> {
        let started = std::time::Instant::now();
        let now = self.clock.now();
        let window = timeframe.resolve(now);

        let (logs, transactions, events, users) = futures::join!(
            self.store.fetch_all(Collection::Logs),
            self.store.fetch_all(Collection::Transactions),
            self.store.fetch_all(Collection::Events),
            self.store.fetch_all(Collection::Users)
        );

        let mut sources = FetchOutcomes::default();
        let tasks = records::tasks(sources.take(Collection::Logs, logs));
        let transactions =
            records::transactions(sources.take(Collection::Transactions, transactions));
        let events = records::events(sources.take(Collection::Events, events));
        let users = records::users(sources.take(Collection::Users, users));
        sources.ensure_any_succeeded()?;

        let windowed_tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|t| window.contains(t.created_at))
            .collect();
        let windowed_transactions: Vec<_> = transactions
            .into_iter()
            .filter(|t| window.contains(t.created_at))
            .collect();

        let totals = metrics::financial_totals(&windowed_transactions)?;
        let completed: Vec<Task> = windowed_tasks
            .iter()
            .filter(|t| t.is_completed())
            .cloned()
            .collect();

        let snapshot = AnalyticsSnapshot {
            id: Uuid::new_v4(),
            timeframe,
            window,
            generated_at: now,
            tasks: TaskSummary::from_tasks(&windowed_tasks, now),
            financial: FinancialSummary {
                total_income: totals.income,
                total_expenses: totals.expenses,
                net_balance: totals.net(),
                transaction_count: windowed_transactions.len(),
            },
            team: TeamSummary {
                total_members: users.len(),
                active_members: users.iter().filter(|u| u.is_active()).count(),
                new_members: users
                    .iter()
                    .filter(|u| window.contains(u.created_at))
                    .count(),
            },
            events: EventSummary {
                total: events.len(),
                upcoming: count_events(&events, EventStatus::Upcoming),
                active: count_events(&events, EventStatus::Active),
                completed: count_events(&events, EventStatus::Completed),
            },
            productivity: ProductivitySummary {
                completion_rate: metrics::member_completion_average(&windowed_tasks),
                avg_completion_time_days: metrics::avg_completion_time_days(&completed),
                productivity_score: metrics::productivity_score(&windowed_tasks, now),
                reliability_score: metrics::reliability_score(&windowed_tasks),
            },
        };

        debug!(
            timeframe = %timeframe,
            tasks = snapshot.tasks.total,
            transactions = snapshot.financial.transaction_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregated analytics snapshot"
        );

        Ok(snapshot)
    }

    async fn compute_member_analytics(&self, member_id: &str) -> Result<MemberAnalytics> {
        let now = self.clock.now();

        let (logs, transactions, collections) = futures::join!(
            self.store.fetch_all(Collection::Logs),
            self.store.fetch_all(Collection::Transactions),
            self.store.fetch_all(Collection::MoneyCollections)
        );

        let mut sources = FetchOutcomes::default();
        let tasks: Vec<Task> = records::tasks(sources.take(Collection::Logs, logs))
            .into_iter()
            .filter(|t| t.assignee.as_deref() == Some(member_id))
            .collect();
        let transactions: Vec<_> =
            records::transactions(sources.take(Collection::Transactions, transactions))
                .into_iter()
                .filter(|t| t.member_id.as_deref() == Some(member_id))
                .collect();
        let collections =
            records::collection_requests(sources.take(Collection::MoneyCollections, collections));
        sources.ensure_any_succeeded()?;

        // Credits are what the member paid in, debits what they were charged
        let totals = metrics::financial_totals(&transactions)?;
        let outstanding_dues = metrics::outstanding_dues(&collections, member_id)?;

        let completed: Vec<Task> = tasks.iter().filter(|t| t.is_completed()).cloned().collect();

        Ok(MemberAnalytics {
            member_id: member_id.to_string(),
            generated_at: now,
            tasks: TaskSummary::from_tasks(&tasks, now),
            financial: MemberFinancials {
                total_paid: totals.income,
                total_owed: totals.expenses,
                balance: totals.net(),
                outstanding_dues,
            },
            performance: MemberPerformance {
                avg_completion_time_days: metrics::avg_completion_time_days(&completed),
                productivity_score: metrics::productivity_score(&tasks, now),
                reliability_score: metrics::reliability_score(&tasks),
            },
        })
    }
}

fn count_events(events: &[Event], status: EventStatus) -> usize {
    events.iter().filter(|e| e.status == status).count()
}

/// Tracks which collections of one pass could be fetched
#[derive(Default)]
struct FetchOutcomes {
    attempted: usize,
    failed: Vec<Collection>,
}

impl FetchOutcomes {
    /// Unwrap a fetch result, degrading an unreachable collection to empty
    fn take(&mut self, collection: Collection, fetched: Result<Vec<Record>>) -> Vec<Record> {
        self.attempted += 1;
        match fetched {
            Ok(records) => records,
            Err(e) => {
                warn!(collection = %collection, error = %e, "Collection unavailable, treating as empty");
                self.failed.push(collection);
                Vec::new()
            }
        }
    }

    fn ensure_any_succeeded(&self) -> Result<()> {
        if self.attempted > 0 && self.failed.len() == self.attempted {
            let names: Vec<&str> = self.failed.iter().map(Collection::as_str).collect();
            return Err(AnalyticsError::store_unavailable(
                names.join(", "),
                "every collection is unreachable",
            ));
        }
        Ok(())
    }
}

pub use cache::{CacheKey, CacheStats, TtlCache};
pub use insights::{
    derive_insights, derive_recommendations, Insight, InsightSeverity, Recommendation,
    RecommendationCategory, RecommendationPriority,
};
pub use metrics::FinancialTotals;
pub use records::{
    AssignmentStatus, Collection, CollectionAssignment, CollectionRequest, CollectionStatus,
    Event, EventStatus, Record, RecordKind, Task, TaskPriority, TaskStatus, Transaction,
    TransactionKind, User,
};
pub use refresh::AnalyticsRefresher;
pub use reports::{PerformanceReport, ReportFormat};
pub use store::{InMemoryStore, JsonFileStore, RecordStore};
pub use timeframe::{TimeWindow, Timeframe};
