//! Property-based tests for the metric calculators and insight rules

use super::insights::{derive_insights, derive_recommendations};
use super::metrics;
use super::test_utils::{days, now, snapshot_fixture};
use super::{Task, TaskStatus};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Pending),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Completed),
    ]
}

/// Tasks with optional due and completion dates within a year of `now()`
fn task_strategy() -> impl Strategy<Value = Task> {
    (
        "[a-z0-9]{1,8}",
        status_strategy(),
        proptest::option::of(-365i64..365),
        proptest::option::of(-365i64..365),
        proptest::option::of("[a-c]"),
    )
        .prop_map(|(id, status, due, completed, assignee)| {
            let mut task = Task::new(id.clone(), id);
            task.status = status;
            task.due_date = due.map(days);
            task.completed_at = completed.map(days);
            task.assignee = assignee;
            task
        })
}

fn tasks_strategy() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(task_strategy(), 0..40)
}

proptest! {
    #[test]
    fn completion_rate_is_a_percentage(tasks in tasks_strategy()) {
        let rate = metrics::completion_rate(&tasks);
        prop_assert!((0.0..=100.0).contains(&rate));

        let any_completed = tasks.iter().any(|t| t.is_completed());
        prop_assert_eq!(rate == 0.0, !any_completed);
    }

    #[test]
    fn overdue_never_counts_completed_or_undated(tasks in tasks_strategy()) {
        let overdue = metrics::overdue_count(&tasks, now());
        let eligible = tasks
            .iter()
            .filter(|t| !t.is_completed() && t.due_date.is_some())
            .count();
        prop_assert!(overdue <= eligible);
        prop_assert!(tasks
            .iter()
            .filter(|t| t.is_overdue(now()))
            .all(|t| t.status != TaskStatus::Completed && t.due_date.is_some()));
    }

    #[test]
    fn scores_stay_in_range(tasks in tasks_strategy()) {
        let productivity = metrics::productivity_score(&tasks, now());
        let reliability = metrics::reliability_score(&tasks);
        prop_assert!(productivity <= 100);
        prop_assert!(reliability <= 100);

        let member_rate = metrics::member_completion_average(&tasks);
        prop_assert!((0.0..=100.0).contains(&member_rate));
    }

    #[test]
    fn insights_are_deterministic(
        total in 0usize..500,
        rate in 0.0f64..=100.0,
        overdue in 0usize..50,
        income in 0.0f64..100_000.0,
        expenses in 0.0f64..100_000.0,
        new_members in 0usize..10,
        productivity in 0.0f64..=100.0,
        upcoming in 0usize..5,
    ) {
        let mut snapshot = snapshot_fixture();
        snapshot.tasks.total = total;
        snapshot.tasks.completion_rate = rate;
        snapshot.tasks.overdue = overdue;
        snapshot.financial.total_income = income;
        snapshot.financial.total_expenses = expenses;
        snapshot.team.new_members = new_members;
        snapshot.productivity.completion_rate = productivity;
        snapshot.events.upcoming = upcoming;

        prop_assert_eq!(derive_insights(&snapshot), derive_insights(&snapshot));
        prop_assert_eq!(derive_recommendations(&snapshot), derive_recommendations(&snapshot));

        // Cash flow insight and expense recommendation never fire together
        let positive = derive_insights(&snapshot)
            .iter()
            .any(|i| i.label == "Positive Cash Flow");
        let review = derive_recommendations(&snapshot)
            .iter()
            .any(|r| r.title == "Review Expenses");
        prop_assert!(!(positive && review));
    }
}
