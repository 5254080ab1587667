//! Filtering and sorting of task lists

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Ordering;

use crate::task::{Priority, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
    Overdue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Newest first
    #[default]
    CreatedAt,
    /// Earliest deadline first, undated tasks last
    DueDate,
    /// Heaviest priority first
    Priority,
}

/// `priority: None` means every priority
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskFilter {
    pub search: String,
    pub status: StatusFilter,
    #[serde(deserialize_with = "priority_or_all")]
    pub priority: Option<Priority>,
    pub sort: SortKey,
}

fn priority_or_all<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Priority(Priority),
        Other(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Priority(p)) => Ok(Some(p)),
        Some(Raw::Other(s)) if s.eq_ignore_ascii_case("all") || s.is_empty() => Ok(None),
        Some(Raw::Other(s)) => Err(serde::de::Error::custom(format!(
            "unknown priority `{}`",
            s
        ))),
        None => Ok(None),
    }
}

impl TaskFilter {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            if !task.title.to_lowercase().contains(&needle)
                && !task.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Pending => !task.completed,
            StatusFilter::Completed => task.completed,
            StatusFilter::Overdue => task.is_overdue(now),
        };
        if !status_ok {
            return false;
        }

        self.priority.map_or(true, |p| task.priority == p)
    }

    /// Filter then sort. The sort is stable, so ties keep input order.
    pub fn apply<'a>(
        &self,
        tasks: impl IntoIterator<Item = &'a Task>,
        now: DateTime<Utc>,
    ) -> Vec<Task> {
        let mut out: Vec<Task> = tasks
            .into_iter()
            .filter(|t| self.matches(t, now))
            .cloned()
            .collect();
        out.sort_by(|a, b| compare(self.sort, a, b));
        out
    }
}

fn compare(sort: SortKey, a: &Task, b: &Task) -> Ordering {
    match sort {
        SortKey::DueDate => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::Priority => b.priority.weight().cmp(&a.priority.weight()),
        SortKey::CreatedAt => b.created_at.cmp(&a.created_at),
    }
}
