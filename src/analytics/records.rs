//! Typed records read from the portal's document store
//!
//! Documents in the store are loosely shaped; every optional field is modelled
//! as an `Option` here and the calculators in [`super::metrics`] spell out what
//! a missing value means.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalyticsError, Result};

/// Named collection in the record store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    #[serde(alias = "tasks")]
    Logs,
    Transactions,
    Events,
    Users,
    MoneyCollections,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Logs => "logs",
            Collection::Transactions => "transactions",
            Collection::Events => "events",
            Collection::Users => "users",
            Collection::MoneyCollections => "moneyCollections",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "logs" | "tasks" => Ok(Collection::Logs),
            "transactions" => Ok(Collection::Transactions),
            "events" => Ok(Collection::Events),
            "users" => Ok(Collection::Users),
            "moneyCollections" => Ok(Collection::MoneyCollections),
            other => Err(AnalyticsError::store_unavailable(
                other,
                "unknown collection",
            )),
        }
    }
}

/// Task workflow status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new<I: Into<String>, T: Into<String>>(id: I, title: T) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            title: title.into(),
            status: TaskStatus::Pending,
            priority: None,
            assignee: None,
            due_date: None,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Past due and still open. Tasks without a due date are never overdue.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed() && self.due_date.map_or(false, |due| due < now)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub kind: TransactionKind,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: String,
    pub status: EventStatus,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl User {
    /// Members are active unless explicitly deactivated
    pub fn is_active(&self) -> bool {
        self.is_active != Some(false)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Paid,
    Rejected,
}

/// One member's share of a money collection request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionAssignment {
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionRequest {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    pub status: CollectionStatus,
    #[serde(default)]
    pub assigned_members: Vec<CollectionAssignment>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Amounts arrive as numbers, numeric strings, or junk.
///
/// Junk decodes to NaN instead of failing the document, so the calculators
/// reject it with `AggregationFailed` rather than the record vanishing.
fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<RawAmount>::deserialize(deserializer)?.map(|raw| match raw {
            RawAmount::Number(value) => value,
            RawAmount::Text(text) => text.trim().parse().unwrap_or(f64::NAN),
            RawAmount::Other(_) => f64::NAN,
        }),
    )
}

/// Type tag of a [`Record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Task,
    Transaction,
    Event,
    User,
    CollectionRequest,
}

/// Any document the analytics core consumes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Task(Task),
    Transaction(Transaction),
    Event(Event),
    User(User),
    CollectionRequest(CollectionRequest),
}

impl Record {
    pub fn id(&self) -> &str {
        match self {
            Record::Task(r) => &r.id,
            Record::Transaction(r) => &r.id,
            Record::Event(r) => &r.id,
            Record::User(r) => &r.id,
            Record::CollectionRequest(r) => &r.id,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Record::Task(r) => r.created_at,
            Record::Transaction(r) => r.created_at,
            Record::Event(r) => r.created_at,
            Record::User(r) => r.created_at,
            Record::CollectionRequest(r) => r.created_at,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Task(_) => RecordKind::Task,
            Record::Transaction(_) => RecordKind::Transaction,
            Record::Event(_) => RecordKind::Event,
            Record::User(_) => RecordKind::User,
            Record::CollectionRequest(_) => RecordKind::CollectionRequest,
        }
    }
}

/// Split a fetched collection into the typed payloads the calculators use.
///
/// Records of other kinds are dropped; the `logs` collection in particular
/// mixes tasks with payment and event activity entries.
pub fn tasks(records: Vec<Record>) -> Vec<Task> {
    records
        .into_iter()
        .filter_map(|r| match r {
            Record::Task(t) => Some(t),
            _ => None,
        })
        .collect()
}

pub fn transactions(records: Vec<Record>) -> Vec<Transaction> {
    records
        .into_iter()
        .filter_map(|r| match r {
            Record::Transaction(t) => Some(t),
            _ => None,
        })
        .collect()
}

pub fn events(records: Vec<Record>) -> Vec<Event> {
    records
        .into_iter()
        .filter_map(|r| match r {
            Record::Event(e) => Some(e),
            _ => None,
        })
        .collect()
}

pub fn users(records: Vec<Record>) -> Vec<User> {
    records
        .into_iter()
        .filter_map(|r| match r {
            Record::User(u) => Some(u),
            _ => None,
        })
        .collect()
}

pub fn collection_requests(records: Vec<Record>) -> Vec<CollectionRequest> {
    records
        .into_iter()
        .filter_map(|r| match r {
            Record::CollectionRequest(c) => Some(c),
            _ => None,
        })
        .collect()
}
