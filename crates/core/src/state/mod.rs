//! Client-side todo state
//!
//! [`TodoState`] owns the working set of tasks for a session. Every mutation
//! goes through it: writes are applied locally first, sent through the
//! [`TodoTransport`], then reconciled with what the server returned.
//! Overdue tasks trigger one notification each per session.

mod watcher;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::calendar;
use crate::filter::TaskFilter;
use crate::notify::{Notification, Notifier};
use crate::stats::TodoStats;
use crate::task::{NewTask, Task, TaskPatch};
use crate::transport::TodoTransport;
use crate::{Error, Result};

pub use watcher::OverdueWatcher;

#[derive(Debug, Clone)]
pub struct StateConfig {
    /// How often the watcher rescans for overdue tasks
    pub overdue_scan_interval: Duration,
    /// Restore the pre-mutation task when the server rejects a write.
    /// Off by default: the optimistic edit stays until the next load.
    pub rollback_on_failure: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            overdue_scan_interval: Duration::from_secs(60),
            rollback_on_failure: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

struct WorkingSet {
    todos: Vec<Task>,
    /// Ids already announced as overdue. Only grows.
    notified: HashSet<String>,
    phase: Phase,
}

struct StateInner {
    transport: Arc<dyn TodoTransport>,
    notifier: Arc<dyn Notifier>,
    config: StateConfig,
    data: RwLock<WorkingSet>,
}

/// Shared handle to the session's todo state
#[derive(Clone)]
pub struct TodoState {
    inner: Arc<StateInner>,
}

impl TodoState {
    pub fn new(transport: Arc<dyn TodoTransport>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_config(transport, notifier, StateConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn TodoTransport>,
        notifier: Arc<dyn Notifier>,
        config: StateConfig,
    ) -> Self {
        Self {
            inner: Arc::new(StateInner {
                transport,
                notifier,
                config,
                data: RwLock::new(WorkingSet {
                    todos: Vec::new(),
                    notified: HashSet::new(),
                    phase: Phase::Loading,
                }),
            }),
        }
    }

    pub fn config(&self) -> &StateConfig {
        &self.inner.config
    }

    fn notify(&self, notification: Notification) {
        self.inner.notifier.notify(notification);
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Replace the working set with the server's task list.
    ///
    /// On failure the working set is left empty. The phase becomes `Ready`
    /// either way and nothing is retried.
    pub async fn load(&self) -> Result<()> {
        let fetched = self.inner.transport.list().await;

        let outcome = {
            let mut data = self.inner.data.write().await;
            data.phase = Phase::Ready;
            match fetched {
                Ok(tasks) => {
                    info!("Loaded {} todos", tasks.len());
                    data.todos = tasks;
                    Ok(())
                }
                Err(e) => {
                    data.todos.clear();
                    Err(e)
                }
            }
        };

        if let Err(e) = &outcome {
            error!("Failed to fetch todos: {}", e);
            self.notify(Notification::error("Failed to load tasks from server."));
        }

        self.scan_overdue().await;
        outcome
    }

    /// Create a task and put it at the front of the working set.
    ///
    /// A title that trims to nothing is rejected without calling the server.
    pub async fn add(&self, new: NewTask) -> Result<Task> {
        if new.title.trim().is_empty() {
            debug!("Ignoring todo with empty title");
            return Err(Error::InvalidInput("Title cannot be empty".to_string()));
        }

        let title = new.title.clone();
        match self.inner.transport.create(new).await {
            Ok(task) => {
                self.inner.data.write().await.todos.insert(0, task.clone());
                info!("Added todo {}", task.id);
                self.notify(Notification::info(
                    "Task Created",
                    format!("\"{}\" has been added to your list.", title),
                ));
                self.scan_overdue().await;
                Ok(task)
            }
            Err(e) => {
                error!("Error adding todo: {}", e);
                self.notify(Notification::error("Failed to create task."));
                Err(e)
            }
        }
    }

    /// Apply `patch` locally right away, then confirm with the server.
    ///
    /// On success the local record is replaced by the server's version. On
    /// failure the optimistic edit stays in place unless
    /// [`StateConfig::rollback_on_failure`] is set.
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        if patch.has_blank_title() {
            debug!("Rejecting empty title edit for todo {}", id);
            return Err(Error::InvalidInput("Title cannot be empty".to_string()));
        }

        let previous = {
            let mut data = self.inner.data.write().await;
            data.todos.iter_mut().find(|t| t.id == id).map(|task| {
                let before = task.clone();
                task.apply(&patch);
                task.updated_at = Utc::now().max(task.created_at);
                before
            })
        };
        self.scan_overdue().await;

        match self.inner.transport.update(id, patch).await {
            Ok(server) => {
                {
                    let mut data = self.inner.data.write().await;
                    if let Some(slot) = data.todos.iter_mut().find(|t| t.id == id) {
                        *slot = server.clone();
                    }
                }
                debug!("Reconciled todo {}", id);
                self.scan_overdue().await;
                Ok(server)
            }
            Err(e) => {
                error!("Error updating todo {}: {}", id, e);
                if self.inner.config.rollback_on_failure {
                    if let Some(before) = previous {
                        let mut data = self.inner.data.write().await;
                        if let Some(slot) = data.todos.iter_mut().find(|t| t.id == id) {
                            warn!("Rolling back todo {}", id);
                            *slot = before;
                        }
                    }
                }
                self.notify(Notification::error("Failed to update task."));
                Err(e)
            }
        }
    }

    /// Remove a task locally, then delete it on the server
    pub async fn delete(&self, id: &str) -> Result<()> {
        let removed = {
            let mut data = self.inner.data.write().await;
            let index = data.todos.iter().position(|t| t.id == id);
            index.map(|index| (index, data.todos.remove(index)))
        };

        match self.inner.transport.delete(id).await {
            Ok(()) => {
                info!("Deleted todo {}", id);
                self.notify(Notification::info(
                    "Task Deleted",
                    "The task has been removed.",
                ));
                Ok(())
            }
            Err(e) => {
                error!("Error deleting todo {}: {}", id, e);
                if self.inner.config.rollback_on_failure {
                    if let Some((index, task)) = removed {
                        let mut data = self.inner.data.write().await;
                        if !data.todos.iter().any(|t| t.id == task.id) {
                            warn!("Restoring todo {}", id);
                            let index = index.min(data.todos.len());
                            data.todos.insert(index, task);
                        }
                    }
                }
                self.notify(Notification::error("Failed to delete task."));
                Err(e)
            }
        }
    }

    /// Flip `completed`. Returns `Ok(None)` when the id is unknown.
    pub async fn toggle_complete(&self, id: &str) -> Result<Option<Task>> {
        let completed = {
            let data = self.inner.data.read().await;
            data.todos.iter().find(|t| t.id == id).map(|t| t.completed)
        };

        match completed {
            Some(completed) => self
                .update(id, TaskPatch::completed(!completed))
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    /// Announce every overdue task that has not been announced yet.
    ///
    /// Returns the ids notified by this call.
    pub async fn scan_overdue(&self) -> Vec<String> {
        let now = Utc::now();
        let fresh: Vec<(String, String)> = {
            let mut guard = self.inner.data.write().await;
            let data = &mut *guard;
            let mut fresh = Vec::new();
            for task in &data.todos {
                if task.is_overdue(now) && data.notified.insert(task.id.clone()) {
                    fresh.push((task.id.clone(), task.title.clone()));
                }
            }
            fresh
        };

        if !fresh.is_empty() {
            debug!("{} todos newly overdue", fresh.len());
        }

        fresh
            .into_iter()
            .map(|(id, title)| {
                self.notify(Notification::warning(
                    "Task Overdue!",
                    format!("\"{}\" is past its due date.", title),
                ));
                id
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn phase(&self) -> Phase {
        self.inner.data.read().await.phase
    }

    pub async fn is_loading(&self) -> bool {
        self.phase().await == Phase::Loading
    }

    /// Snapshot of the working set, in display order
    pub async fn todos(&self) -> Vec<Task> {
        self.inner.data.read().await.todos.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        let data = self.inner.data.read().await;
        data.todos.iter().find(|t| t.id == id).cloned()
    }

    pub async fn stats(&self) -> TodoStats {
        self.stats_at(Utc::now()).await
    }

    pub async fn stats_at(&self, now: DateTime<Utc>) -> TodoStats {
        let data = self.inner.data.read().await;
        TodoStats::compute(&data.todos, now)
    }

    /// Tasks due on the same local calendar day as `date`
    pub async fn todos_by_date(&self, date: DateTime<Local>) -> Vec<Task> {
        self.todos_on_day(date.date_naive(), &Local).await
    }

    pub async fn todos_on_day<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> Vec<Task> {
        let data = self.inner.data.read().await;
        calendar::tasks_on_day(&data.todos, day, tz)
    }

    /// Local calendar days that have something due
    pub async fn due_dates(&self) -> BTreeSet<NaiveDate> {
        let data = self.inner.data.read().await;
        calendar::due_days(&data.todos, &Local)
    }

    pub async fn filtered(&self, filter: &TaskFilter) -> Vec<Task> {
        let data = self.inner.data.read().await;
        filter.apply(&data.todos, Utc::now())
    }

    pub async fn notified_ids(&self) -> HashSet<String> {
        self.inner.data.read().await.notified.clone()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{MockTransport, RecordingNotifier};
    use super::*;
    use crate::notify::Severity;
    use crate::task::Priority;
    use chrono::Duration as ChronoDuration;

    fn setup(transport: MockTransport) -> (TodoState, Arc<MockTransport>, Arc<RecordingNotifier>) {
        setup_with(transport, StateConfig::default())
    }

    fn setup_with(
        transport: MockTransport,
        config: StateConfig,
    ) -> (TodoState, Arc<MockTransport>, Arc<RecordingNotifier>) {
        let transport = Arc::new(transport);
        let notifier = Arc::new(RecordingNotifier::default());
        let state = TodoState::with_config(transport.clone(), notifier.clone(), config);
        (state, transport, notifier)
    }

    fn overdue_task(title: &str) -> Task {
        Task::create(NewTask::new(title).with_due_date(Utc::now() - ChronoDuration::days(1)))
    }

    #[tokio::test]
    async fn test_load_replaces_working_set_and_becomes_ready() {
        let seeded = vec![
            Task::create(NewTask::new("one")),
            Task::create(NewTask::new("two")),
        ];
        let (state, _transport, _notifier) = setup(MockTransport::with_tasks(seeded));

        assert!(state.is_loading().await);
        state.load().await.unwrap();
        assert_eq!(state.phase().await, Phase::Ready);
        assert_eq!(state.todos().await.len(), 2);
    }

    #[tokio::test]
    async fn test_load_failure_leaves_empty_set_and_notifies() {
        let transport = MockTransport::with_tasks(vec![Task::create(NewTask::new("one"))]);
        transport.set_failing(true);
        let (state, _transport, notifier) = setup(transport);

        assert!(state.load().await.is_err());
        assert_eq!(state.phase().await, Phase::Ready);
        assert!(state.todos().await.is_empty());
        assert_eq!(notifier.count(Severity::Error), 1);
    }

    #[tokio::test]
    async fn test_add_prepends_newest_task() {
        let (state, _transport, notifier) =
            setup(MockTransport::with_tasks(vec![Task::create(NewTask::new("older"))]));
        state.load().await.unwrap();

        let created = state
            .add(NewTask::new("Buy milk").with_priority(Priority::Low))
            .await
            .unwrap();

        let todos = state.todos().await;
        assert_eq!(todos[0].id, created.id);
        assert_eq!(todos[0].title, "Buy milk");
        assert_eq!(state.stats().await.by_priority.low, 1);
        assert!(notifier.titles().contains(&"Task Created".to_string()));
    }

    #[tokio::test]
    async fn test_add_blank_title_is_noop() {
        let (state, transport, notifier) = setup(MockTransport::default());
        state.load().await.unwrap();

        assert!(state.add(NewTask::new("")).await.is_err());
        assert!(state.add(NewTask::new("   \t")).await.is_err());

        assert!(state.todos().await.is_empty());
        assert!(transport.tasks.lock().unwrap().is_empty());
        assert!(notifier.titles().is_empty());
    }

    #[tokio::test]
    async fn test_add_failure_keeps_working_set() {
        let (state, transport, notifier) = setup(MockTransport::default());
        state.load().await.unwrap();
        transport.set_failing(true);

        assert!(state.add(NewTask::new("nope")).await.is_err());
        assert!(state.todos().await.is_empty());
        assert_eq!(notifier.count(Severity::Error), 1);
    }

    #[tokio::test]
    async fn test_completing_moves_one_task_from_pending_to_completed() {
        let seeded = vec![
            Task::create(NewTask::new("a")),
            Task::create(NewTask::new("b")),
        ];
        let id = seeded[0].id.clone();
        let (state, _transport, _notifier) = setup(MockTransport::with_tasks(seeded));
        state.load().await.unwrap();

        let before = state.stats().await;
        state.update(&id, TaskPatch::completed(true)).await.unwrap();
        let after = state.stats().await;

        assert_eq!(after.total, before.total);
        assert_eq!(after.completed, before.completed + 1);
        assert_eq!(after.pending, before.pending - 1);
    }

    #[tokio::test]
    async fn test_update_is_visible_before_server_answers() {
        let task = Task::create(NewTask::new("Draft"));
        let id = task.id.clone();
        let (state, transport, _notifier) = setup(MockTransport::gated(vec![task]));
        state.load().await.unwrap();

        let pending = {
            let state = state.clone();
            let id = id.clone();
            tokio::spawn(async move { state.update(&id, TaskPatch::title("Final")).await })
        };

        // Wait until the optimistic edit lands
        let mut seen = false;
        for _ in 0..100 {
            if state.get(&id).await.map(|t| t.title) == Some("Final".to_string()) {
                seen = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(seen, "optimistic edit never became visible");
        assert_eq!(transport.tasks.lock().unwrap()[0].title, "Draft");

        transport.update_gate.as_ref().unwrap().notify_one();
        let confirmed = pending.await.unwrap().unwrap();
        assert_eq!(confirmed.title, "Final");
        assert_eq!(state.get(&id).await.unwrap(), confirmed);
    }

    #[tokio::test]
    async fn test_update_failure_keeps_optimistic_edit_by_default() {
        let task = Task::create(NewTask::new("Original"));
        let id = task.id.clone();
        let (state, transport, notifier) = setup(MockTransport::with_tasks(vec![task]));
        state.load().await.unwrap();
        transport.set_failing(true);

        assert!(state.update(&id, TaskPatch::title("Edited")).await.is_err());
        assert_eq!(state.get(&id).await.unwrap().title, "Edited");
        assert_eq!(notifier.count(Severity::Error), 1);
    }

    #[tokio::test]
    async fn test_update_failure_rolls_back_when_configured() {
        let task = Task::create(NewTask::new("Original"));
        let id = task.id.clone();
        let config = StateConfig {
            rollback_on_failure: true,
            ..StateConfig::default()
        };
        let (state, transport, _notifier) =
            setup_with(MockTransport::with_tasks(vec![task.clone()]), config);
        state.load().await.unwrap();
        transport.set_failing(true);

        assert!(state.update(&id, TaskPatch::title("Edited")).await.is_err());
        assert_eq!(state.get(&id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title_without_touching_state() {
        let task = Task::create(NewTask::new("Keep"));
        let id = task.id.clone();
        let (state, _transport, _notifier) = setup(MockTransport::with_tasks(vec![task.clone()]));
        state.load().await.unwrap();

        let err = state.update(&id, TaskPatch::title("  ")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(state.get(&id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_update_unknown_id_reports_failure() {
        let (state, _transport, notifier) = setup(MockTransport::default());
        state.load().await.unwrap();

        let err = state
            .update("ghost", TaskPatch::completed(true))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
        assert_eq!(notifier.count(Severity::Error), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_locally_and_remotely() {
        let task = Task::create(NewTask::new("bye"));
        let id = task.id.clone();
        let (state, transport, notifier) = setup(MockTransport::with_tasks(vec![task]));
        state.load().await.unwrap();

        state.delete(&id).await.unwrap();
        assert!(state.todos().await.is_empty());
        assert!(transport.tasks.lock().unwrap().is_empty());
        assert!(notifier.titles().contains(&"Task Deleted".to_string()));
    }

    #[tokio::test]
    async fn test_delete_failure_behaviour_depends_on_rollback() {
        let tasks = vec![
            Task::create(NewTask::new("first")),
            Task::create(NewTask::new("second")),
        ];
        let id = tasks[1].id.clone();

        let (state, transport, _n) = setup(MockTransport::with_tasks(tasks.clone()));
        state.load().await.unwrap();
        transport.set_failing(true);
        assert!(state.delete(&id).await.is_err());
        assert_eq!(state.todos().await.len(), 1);

        let config = StateConfig {
            rollback_on_failure: true,
            ..StateConfig::default()
        };
        let (state, transport, _n) = setup_with(MockTransport::with_tasks(tasks.clone()), config);
        state.load().await.unwrap();
        transport.set_failing(true);
        assert!(state.delete(&id).await.is_err());
        assert_eq!(state.todos().await, tasks);
    }

    #[tokio::test]
    async fn test_toggle_complete() {
        let task = Task::create(NewTask::new("flip"));
        let id = task.id.clone();
        let (state, _transport, _notifier) = setup(MockTransport::with_tasks(vec![task]));
        state.load().await.unwrap();

        let toggled = state.toggle_complete(&id).await.unwrap().unwrap();
        assert!(toggled.completed);
        let toggled = state.toggle_complete(&id).await.unwrap().unwrap();
        assert!(!toggled.completed);

        assert!(state.toggle_complete("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overdue_counts_only_pending() {
        let task = overdue_task("late");
        let id = task.id.clone();
        let (state, _transport, _notifier) = setup(MockTransport::with_tasks(vec![task]));
        state.load().await.unwrap();

        assert_eq!(state.stats().await.overdue, 1);
        state.update(&id, TaskPatch::completed(true)).await.unwrap();
        assert_eq!(state.stats().await.overdue, 0);
    }

    #[tokio::test]
    async fn test_scan_notifies_each_overdue_task_once() {
        let first = overdue_task("first");
        let first_id = first.id.clone();
        let (state, _transport, notifier) = setup(MockTransport::with_tasks(vec![first]));

        state.load().await.unwrap();
        assert_eq!(notifier.count(Severity::Warning), 1);
        assert!(state.notified_ids().await.contains(&first_id));

        // A second overdue task shows up; only it gets announced
        let second = state
            .add(NewTask::new("second").with_due_date(Utc::now() - ChronoDuration::hours(3)))
            .await
            .unwrap();
        assert_eq!(notifier.count(Severity::Warning), 2);

        assert!(state.scan_overdue().await.is_empty());
        assert_eq!(notifier.count(Severity::Warning), 2);

        let notified = state.notified_ids().await;
        assert!(notified.contains(&first_id));
        assert!(notified.contains(&second.id));
    }

    #[tokio::test]
    async fn test_toggling_does_not_renotify() {
        let task = overdue_task("late");
        let id = task.id.clone();
        let (state, _transport, notifier) = setup(MockTransport::with_tasks(vec![task]));
        state.load().await.unwrap();

        state.toggle_complete(&id).await.unwrap();
        state.toggle_complete(&id).await.unwrap();
        state.scan_overdue().await;
        assert_eq!(notifier.count(Severity::Warning), 1);
    }

    #[tokio::test]
    async fn test_todos_on_day_and_due_dates() {
        let at = |s: &str| {
            chrono::DateTime::parse_from_rfc3339(s)
                .unwrap()
                .with_timezone(&Utc)
        };
        let tasks = vec![
            Task::create(NewTask::new("early").with_due_date(at("2026-06-01T01:00:00Z"))),
            Task::create(NewTask::new("late").with_due_date(at("2026-06-01T23:00:00Z"))),
            Task::create(NewTask::new("other").with_due_date(at("2026-06-02T12:00:00Z"))),
        ];
        let (state, _transport, _notifier) = setup(MockTransport::with_tasks(tasks));
        state.load().await.unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut utc_titles: Vec<String> = state
            .todos_on_day(day, &Utc)
            .await
            .into_iter()
            .map(|t| t.title)
            .collect();
        utc_titles.sort();
        assert_eq!(utc_titles, vec!["early", "late"]);

        // Local days depend on the machine's zone, so derive them from the due dates
        let local_day = |t: &Task| t.due_date.unwrap().with_timezone(&Local).date_naive();
        let all = state.todos().await;

        let expected_days: BTreeSet<NaiveDate> = all.iter().map(local_day).collect();
        assert_eq!(state.due_dates().await, expected_days);

        let local = at("2026-06-02T12:00:00Z").with_timezone(&Local);
        let mut expected: Vec<String> = all
            .iter()
            .filter(|t| local_day(*t) == local.date_naive())
            .map(|t| t.title.clone())
            .collect();
        expected.sort();
        assert!(expected.contains(&"other".to_string()));

        let mut same_day: Vec<String> = state
            .todos_by_date(local)
            .await
            .into_iter()
            .map(|t| t.title)
            .collect();
        same_day.sort();
        assert_eq!(same_day, expected);
    }

    #[tokio::test]
    async fn test_filtered_view() {
        let tasks = vec![
            Task::create(NewTask::new("low").with_priority(Priority::Low)),
            Task::create(NewTask::new("urgent").with_priority(Priority::Urgent)),
        ];
        let (state, _transport, _notifier) = setup(MockTransport::with_tasks(tasks));
        state.load().await.unwrap();

        let filter = TaskFilter::default().sorted_by(crate::filter::SortKey::Priority);
        let sorted = state.filtered(&filter).await;
        assert_eq!(sorted[0].title, "urgent");
    }
}
