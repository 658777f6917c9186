//! Shared test utilities for the analytics module
//!
//! Record builders take creation offsets in days relative to [`now`], so
//! `Some(-3)` means "created three days ago" and `None` means no timestamp.

use super::records::{
    AssignmentStatus, CollectionAssignment, CollectionRequest, CollectionStatus, Event,
    EventStatus, Task, TaskStatus, Transaction, TransactionKind, User,
};
use super::{
    AnalyticsEngine, AnalyticsSnapshot, EventSummary, FinancialSummary, InMemoryStore,
    ProductivitySummary, TaskSummary, TeamSummary, Timeframe,
};
use crate::clock::ManualClock;
use crate::config::AnalyticsConfig;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Fixed reference time for every fixture
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// `now()` shifted by a number of days
pub fn days(offset: i64) -> DateTime<Utc> {
    now() + Duration::days(offset)
}

/// Snapshot with every count at zero for the default timeframe
pub fn snapshot_fixture() -> AnalyticsSnapshot {
    let timeframe = Timeframe::Month;
    AnalyticsSnapshot {
        id: Uuid::new_v4(),
        timeframe,
        window: timeframe.resolve(now()),
        generated_at: now(),
        tasks: TaskSummary::default(),
        financial: FinancialSummary::default(),
        team: TeamSummary::default(),
        events: EventSummary::default(),
        productivity: ProductivitySummary::default(),
    }
}

pub fn task(id: &str, status: TaskStatus, created: Option<i64>) -> Task {
    let mut task = Task::new(id, format!("Task {}", id));
    task.status = status;
    task.created_at = created.map(days);
    task
}

pub fn assigned_task(id: &str, assignee: &str, status: TaskStatus, created: Option<i64>) -> Task {
    let mut task = task(id, status, created);
    task.assignee = Some(assignee.to_string());
    task
}

pub fn transaction(
    id: &str,
    kind: TransactionKind,
    amount: f64,
    created: Option<i64>,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        created_at: created.map(days),
        kind,
        amount: Some(amount),
        member_id: None,
        description: None,
    }
}

pub fn member_transaction(
    id: &str,
    member_id: &str,
    kind: TransactionKind,
    amount: f64,
) -> Transaction {
    let mut tx = transaction(id, kind, amount, Some(-1));
    tx.member_id = Some(member_id.to_string());
    tx
}

pub fn user(id: &str, is_active: Option<bool>, created: Option<i64>) -> User {
    User {
        id: id.to_string(),
        created_at: created.map(days),
        name: format!("Member {}", id),
        email: None,
        role: None,
        is_active,
    }
}

pub fn event(id: &str, status: EventStatus, created: Option<i64>) -> Event {
    Event {
        id: id.to_string(),
        created_at: created.map(days),
        title: format!("Event {}", id),
        status,
        date: None,
    }
}

pub fn collection_request(
    id: &str,
    status: CollectionStatus,
    assignments: &[(&str, f64, AssignmentStatus)],
) -> CollectionRequest {
    CollectionRequest {
        id: id.to_string(),
        created_at: Some(days(-5)),
        title: format!("Collection {}", id),
        amount: None,
        status,
        assigned_members: assignments
            .iter()
            .map(|(user_id, amount, status)| CollectionAssignment {
                user_id: user_id.to_string(),
                amount: Some(*amount),
                status: *status,
            })
            .collect(),
        deadline: None,
    }
}

/// Engine over an empty in-memory store with a pinned clock
pub fn engine_fixture() -> (Arc<InMemoryStore>, Arc<ManualClock>, AnalyticsEngine) {
    engine_with_config(AnalyticsConfig::default())
}

pub fn engine_with_config(
    config: AnalyticsConfig,
) -> (Arc<InMemoryStore>, Arc<ManualClock>, AnalyticsEngine) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(now()));
    let engine = AnalyticsEngine::with_clock(store.clone(), clock.clone(), config);
    (store, clock, engine)
}
