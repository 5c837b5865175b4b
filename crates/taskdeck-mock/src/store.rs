use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskdeck_shared::{api::SortOrder, api::TaskUpdate, Task, User};
use tokio::sync::RwLock;

/// Column a task listing can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderField {
    #[default]
    CreatedAt,
    Title,
    Id,
}

impl OrderField {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(OrderField::CreatedAt),
            "title" => Some(OrderField::Title),
            "id" => Some(OrderField::Id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub done: Option<bool>,
    pub order_by: OrderField,
    pub order: SortOrder,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl TaskFilter {
    fn is_filtered(&self) -> bool {
        self.user_id.is_some() || self.title.is_some() || self.done.is_some()
    }

    fn matches(&self, task: &Task) -> bool {
        if let Some(user_id) = &self.user_id {
            if &task.user_id != user_id {
                return false;
            }
        }
        if let Some(title) = &self.title {
            if !task.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if let Some(done) = self.done {
            if task.done != done {
                return false;
            }
        }
        true
    }
}

/// Filter, order and page a task collection. `None` means the filters
/// matched nothing, which the API reports as 404.
pub fn select_tasks(tasks: &[Task], filter: &TaskFilter) -> Option<Vec<Task>> {
    let mut matched: Vec<Task> = tasks.iter().filter(|t| filter.matches(t)).cloned().collect();

    if matched.is_empty() && filter.is_filtered() {
        return None;
    }

    matched.sort_by(|a, b| {
        let primary = match filter.order_by {
            OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderField::Title => a.title.cmp(&b.title),
            OrderField::Id => a.id.cmp(&b.id),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match filter.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let Some(limit) = filter.limit else {
        return Some(matched);
    };
    let page = filter.page.unwrap_or(1).max(1);
    let offset = (page - 1).saturating_mul(limit);

    Some(matched.into_iter().skip(offset).take(limit).collect())
}

#[derive(Default)]
struct Inner {
    users: RwLock<Vec<User>>,
    tasks: RwLock<Vec<Task>>,
    failures: AtomicUsize,
}

/// Shared in-memory collections behind the router.
#[derive(Clone, Default)]
pub struct MockState {
    inner: Arc<Inner>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handful of users with enough tasks to page through.
    pub async fn seeded() -> Self {
        let state = Self::new();
        let names = [
            ("1", "Ada Lovelace", "ada@example.com", "London"),
            ("2", "Alan Turing", "alan@example.com", "Manchester"),
            ("3", "Grace Hopper", "grace@example.com", "Arlington"),
        ];

        for (i, (id, name, email, city)) in names.into_iter().enumerate() {
            state
                .insert_user(User {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    created_at: seed_time(i as i64),
                    avatar: None,
                    city: city.to_string(),
                })
                .await;
        }

        for i in 0..42_i64 {
            let user_id = (i % 3 + 1).to_string();
            state
                .insert_task(Task {
                    id: (i + 1).to_string(),
                    title: format!("Task {} for user {}", i + 1, user_id),
                    done: i % 4 == 0,
                    user_id,
                    created_at: seed_time(10 + i),
                    user_name: None,
                })
                .await;
        }

        state
    }

    /// Make the next `count` write requests fail with 500.
    pub fn fail_next(&self, count: usize) {
        self.inner.failures.store(count, Ordering::SeqCst);
    }

    pub(crate) fn take_failure(&self) -> bool {
        self.inner
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    pub async fn insert_user(&self, user: User) {
        self.inner.users.write().await.push(user);
    }

    pub async fn insert_task(&self, task: Task) {
        self.inner.tasks.write().await.push(task);
    }

    pub async fn users(&self) -> Vec<User> {
        self.inner.users.read().await.clone()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.tasks.read().await.clone()
    }

    pub async fn find_user(&self, id: &str) -> Option<User> {
        self.inner.users.read().await.iter().find(|u| u.id == id).cloned()
    }

    pub async fn remove_user(&self, id: &str) -> Option<User> {
        let mut users = self.inner.users.write().await;
        let idx = users.iter().position(|u| u.id == id)?;
        Some(users.remove(idx))
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> Option<Vec<Task>> {
        select_tasks(&self.inner.tasks.read().await, filter)
    }

    pub async fn find_task(&self, id: &str) -> Option<Task> {
        self.inner.tasks.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn update_task(&self, id: &str, update: TaskUpdate) -> Option<Task> {
        let mut tasks = self.inner.tasks.write().await;
        let task = tasks.iter_mut().find(|t| t.id == id)?;

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(done) = update.done {
            task.done = done;
        }
        if let Some(user_id) = update.user_id {
            task.user_id = user_id;
        }
        if update.user_name.is_some() {
            task.user_name = update.user_name;
        }

        Some(task.clone())
    }

    pub async fn remove_task(&self, id: &str) -> Option<Task> {
        let mut tasks = self.inner.tasks.write().await;
        let idx = tasks.iter().position(|t| t.id == id)?;
        Some(tasks.remove(idx))
    }
}

fn seed_time(offset_minutes: i64) -> DateTime<Utc> {
    // 2025-01-01T09:00:00Z
    DateTime::from_timestamp(1_735_722_000 + offset_minutes * 60, 0).unwrap_or_default()
}
