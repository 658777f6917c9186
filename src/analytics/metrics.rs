//! Metric calculators
//!
//! Pure functions over already-filtered record lists. None of them keep state
//! or touch the store; the engine decides which partition each one sees.
//!
//! Missing-field rules are explicit here rather than left to coercion:
//!
//! - a transaction or assignment without an amount contributes 0
//! - a task without a due date is never overdue and always on time
//! - a task without `created_at` or `completed_at` is left out of
//!   completion-time averages

use super::records::{
    AssignmentStatus, CollectionRequest, CollectionStatus, Task, Transaction, TransactionKind,
};
use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight of the completion fraction in the productivity score
pub const PRODUCTIVITY_COMPLETION_WEIGHT: f64 = 70.0;

/// Weight of the timeliness fraction in the productivity score
pub const PRODUCTIVITY_TIMELINESS_WEIGHT: f64 = 30.0;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Income and expense totals over a set of transactions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FinancialTotals {
    pub income: f64,
    pub expenses: f64,
}

impl FinancialTotals {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

/// Percentage of tasks completed, 0 for an empty list
pub fn completion_rate(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let completed = tasks.iter().filter(|t| t.is_completed()).count();
    (completed as f64 / tasks.len() as f64) * 100.0
}

/// Open tasks whose due date has passed
pub fn overdue_count(tasks: &[Task], now: DateTime<Utc>) -> usize {
    tasks.iter().filter(|t| t.is_overdue(now)).count()
}

/// Average whole days from creation to completion.
///
/// Each task's duration is rounded up to whole days before averaging and the
/// mean is rounded to the nearest day.
pub fn avg_completion_time_days(tasks: &[Task]) -> i64 {
    let durations: Vec<f64> = tasks
        .iter()
        .filter_map(|t| match (t.created_at, t.completed_at) {
            (Some(created), Some(completed)) => {
                let millis = (completed - created).num_milliseconds() as f64;
                Some((millis / MILLIS_PER_DAY).ceil())
            }
            _ => None,
        })
        .collect();

    if durations.is_empty() {
        return 0;
    }

    let total: f64 = durations.iter().sum();
    (total / durations.len() as f64).round() as i64
}

/// Weighted blend of completion and timeliness, 0-100.
///
/// An empty list scores 0: there is no evidence of productive work.
pub fn productivity_score(tasks: &[Task], now: DateTime<Utc>) -> u32 {
    if tasks.is_empty() {
        return 0;
    }

    let total = tasks.len() as f64;
    let completed = tasks.iter().filter(|t| t.is_completed()).count() as f64;
    let overdue = overdue_count(tasks, now) as f64;

    let completion = (completed / total) * PRODUCTIVITY_COMPLETION_WEIGHT;
    let timeliness = ((total - overdue) / total).max(0.0) * PRODUCTIVITY_TIMELINESS_WEIGHT;

    (completion + timeliness).round() as u32
}

/// Share of tasks delivered on time, 0-100.
///
/// An empty list scores 100: there is no evidence of unreliability. Tasks
/// that are still open, or lack a due or completion date, get the benefit of
/// the doubt.
pub fn reliability_score(tasks: &[Task]) -> u32 {
    if tasks.is_empty() {
        return 100;
    }

    let on_time = tasks
        .iter()
        .filter(|t| {
            if !t.is_completed() {
                return true;
            }
            match (t.due_date, t.completed_at) {
                (Some(due), Some(completed)) => completed <= due,
                _ => true,
            }
        })
        .count();

    ((on_time as f64 / tasks.len() as f64) * 100.0).round() as u32
}

/// Sum credits as income and debits as expenses
pub fn financial_totals(transactions: &[Transaction]) -> Result<FinancialTotals> {
    let mut totals = FinancialTotals::default();

    for tx in transactions {
        let amount = checked_amount(tx.amount, || format!("transaction '{}'", tx.id))?;
        match tx.kind {
            TransactionKind::Credit => totals.income += amount,
            TransactionKind::Debit => totals.expenses += amount,
        }
    }

    Ok(totals)
}

/// Amount a member still owes across active collection requests.
///
/// Pending and rejected assignments count as owed; paid ones and closed
/// requests do not.
pub fn outstanding_dues(requests: &[CollectionRequest], member_id: &str) -> Result<f64> {
    let mut due = 0.0;

    for request in requests
        .iter()
        .filter(|r| r.status == CollectionStatus::Active)
    {
        for assignment in request.assigned_members.iter().filter(|a| {
            a.user_id == member_id
                && matches!(
                    a.status,
                    AssignmentStatus::Pending | AssignmentStatus::Rejected
                )
        }) {
            due += checked_amount(assignment.amount, || {
                format!("collection '{}' assignment for '{}'", request.id, member_id)
            })?;
        }
    }

    Ok(due)
}

/// Mean of per-assignee completion rates.
///
/// Every member with at least one task weighs the same regardless of task
/// count. Falls back to [`completion_rate`] when no task has an assignee.
///
/// The per-member fractions are summed as an exact ratio and divided once,
/// so the result does not depend on member order and a mean that lands on a
/// threshold compares equal to it.
pub fn member_completion_average(tasks: &[Task]) -> f64 {
    let mut per_member: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for task in tasks {
        if let Some(assignee) = task.assignee.as_deref() {
            let (total, completed) = per_member.entry(assignee).or_insert((0, 0));
            *total += 1;
            if task.is_completed() {
                *completed += 1;
            }
        }
    }

    if per_member.is_empty() {
        return completion_rate(tasks);
    }

    let members = per_member.len() as u128;
    match exact_fraction_sum(per_member.values().copied()) {
        Some((numerator, denominator)) => {
            (numerator * 100) as f64 / (denominator * members) as f64
        }
        // Denominators too large to combine exactly; BTreeMap order keeps
        // the float sum reproducible.
        None => {
            let rate_sum: f64 = per_member
                .values()
                .map(|(total, completed)| (*completed as f64 / *total as f64) * 100.0)
                .sum();
            rate_sum / members as f64
        }
    }
}

/// Sum of `completed / total` fractions as a reduced `(numerator, denominator)`,
/// or `None` on overflow
fn exact_fraction_sum(fractions: impl Iterator<Item = (u64, u64)>) -> Option<(u128, u128)> {
    let (mut numerator, mut denominator) = (0u128, 1u128);
    for (total, completed) in fractions {
        let (total, completed) = (total as u128, completed as u128);
        numerator = numerator
            .checked_mul(total)?
            .checked_add(completed.checked_mul(denominator)?)?;
        denominator = denominator.checked_mul(total)?;
        let divisor = gcd(numerator, denominator);
        numerator /= divisor;
        denominator /= divisor;
    }
    // Leave room for the final scaling by 100 and the member count
    numerator.checked_mul(100)?;
    denominator.checked_mul(u64::MAX as u128)?;
    Some((numerator, denominator))
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

fn checked_amount<F: FnOnce() -> String>(amount: Option<f64>, describe: F) -> Result<f64> {
    match amount {
        None => Ok(0.0),
        Some(value) if value.is_finite() => Ok(value),
        Some(value) => Err(AnalyticsError::aggregation_failed(format!(
            "{} has non-numeric amount {}",
            describe(),
            value
        ))),
    }
}
