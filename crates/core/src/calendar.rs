//! Date-indexed lookups over tasks

use chrono::{NaiveDate, TimeZone};
use std::collections::BTreeSet;

use crate::task::Task;

/// Tasks due on `day` as seen in `tz`, completed ones included
pub fn tasks_on_day<'a, Tz: TimeZone>(
    tasks: impl IntoIterator<Item = &'a Task>,
    day: NaiveDate,
    tz: &Tz,
) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|t| {
            t.due_date
                .is_some_and(|due| due.with_timezone(tz).date_naive() == day)
        })
        .cloned()
        .collect()
}

/// Distinct calendar days in `tz` that carry at least one due task
pub fn due_days<'a, Tz: TimeZone>(
    tasks: impl IntoIterator<Item = &'a Task>,
    tz: &Tz,
) -> BTreeSet<NaiveDate> {
    tasks
        .into_iter()
        .filter_map(|t| t.due_date)
        .map(|due| due.with_timezone(tz).date_naive())
        .collect()
}
