//!
//! # Recurrence Engine
//!
//! Computes the successor of a recurring task when its current occurrence is
//! completed. All date arithmetic happens in a fixed UTC offset so that the
//! wall-clock time of day survives the computation; callers convert from and
//! back to UTC for storage.

use crate::models::{Recurrence, Task};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

/// Number of days in the given month, leap-aware.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month out of range: {}", month),
    }
}

/// Computes the due date of the next occurrence.
///
/// - `daily`: +1 day, preserving time of day.
/// - `weekly`: +7 days, preserving time of day.
/// - `monthly`: same day-of-month in the next calendar month, clamped to that
///   month's actual length (Jan 31 becomes Feb 28, or Feb 29 in leap years).
///   December rolls the year forward.
///
/// Returns `None` only if the shifted date is unrepresentable.
pub fn next_due_date(
    current: DateTime<FixedOffset>,
    kind: Recurrence,
) -> Option<DateTime<FixedOffset>> {
    match kind {
        Recurrence::Daily => current.checked_add_signed(Duration::days(1)),
        Recurrence::Weekly => current.checked_add_signed(Duration::days(7)),
        Recurrence::Monthly => next_month_same_day(current),
    }
}

fn next_month_same_day(current: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let (next_year, next_month) = if current.month() == 12 {
        (current.year() + 1, 1)
    } else {
        (current.year(), current.month() + 1)
    };

    // Clamp to the last valid day when the current day-of-month does not
    // exist in the target month. The clamp applies to this occurrence only;
    // the successor keeps its own day-of-month going forward.
    let next_day = current.day().min(days_in_month(next_year, next_month));

    let date = NaiveDate::from_ymd_opt(next_year, next_month, next_day)?;
    current
        .offset()
        .from_local_datetime(&date.and_time(current.time()))
        .single()
}

/// Synthesizes the successor task for a completion transition, or `None` when
/// the transition does not call for one.
///
/// Fires only on the incomplete → complete edge: `previously_completed` is the
/// stored state before the update, `task` the state after. Re-saving an
/// already-complete task or un-completing one never spawns a successor, and
/// neither does a recurring task with no recurrence kind or no due date.
pub fn successor(task: &Task, previously_completed: bool, tz: FixedOffset) -> Option<Task> {
    if previously_completed || !task.completed || !task.is_recurring {
        return None;
    }
    let kind = task.recurrence_type?;
    let due = task.due_date?;

    let next_due = next_due_date(due.with_timezone(&tz), kind)?;

    Some(Task {
        id: Uuid::new_v4(),
        title: task.title.clone(),
        description: task.description.clone(),
        due_date: Some(next_due.with_timezone(&Utc)),
        completed: false,
        created_at: Utc::now(),
        user_id: task.user_id,
        is_recurring: task.is_recurring,
        recurrence_type: task.recurrence_type,
        parent_task_id: Some(task.id),
    })
}
