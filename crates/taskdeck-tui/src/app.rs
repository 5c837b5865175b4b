use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use taskdeck_shared::{api::TaskUpdate, Task, User};
use tokio::sync::mpsc;

use crate::api::{ApiError, TaskDeckApi};
use crate::route::Route;
use crate::state::{
    Fetch, FormState, Generation, Refresh, TaskForm, TaskListSettings, TaskListState, UserField,
    UserForm, UserListState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    UserForm(UserField),
    TaskForm,
    Search,
}

/// Everything the loop reacts to. API results carry the generation they
/// were issued with; task results also carry the tasks-view session so a
/// late answer for a view the user already left is dropped.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    UsersLoaded {
        generation: Generation,
        result: Result<Vec<User>, ApiError>,
    },
    TasksLoaded {
        session: u64,
        generation: Generation,
        result: Result<Vec<Task>, ApiError>,
    },
    TaskCountLoaded {
        session: u64,
        generation: Generation,
        result: Result<Vec<Task>, ApiError>,
    },
    UserCreated {
        form: UserForm,
        result: Result<User, ApiError>,
    },
    UserDeleted {
        id: String,
        result: Result<(), ApiError>,
    },
    TaskCreated {
        session: u64,
        form: TaskForm,
        result: Result<Task, ApiError>,
    },
    TaskUpdated {
        session: u64,
        id: String,
        result: Result<Task, ApiError>,
    },
    TaskDeleted {
        session: u64,
        id: String,
        result: Result<(), ApiError>,
    },
}

pub struct App {
    api: Arc<dyn TaskDeckApi>,
    tx: mpsc::Sender<AppEvent>,
    settings: TaskListSettings,

    pub route: Route,
    pub mode: Mode,

    // Lists
    pub users: UserListState,
    pub tasks: Option<TaskListState>,
    task_session: u64,
    pub selected_user: usize,
    pub selected_task: usize,

    // Forms
    pub user_form: FormState<UserForm>,
    pub task_form: FormState<TaskForm>,
    pub submitting: bool,

    // Digits typed for a page jump, applied on Enter
    pub page_input: String,

    // Errors from row actions (delete, toggle)
    pub notice: Option<String>,
}

impl App {
    pub fn new(
        api: Arc<dyn TaskDeckApi>,
        tx: mpsc::Sender<AppEvent>,
        settings: TaskListSettings,
        route: Route,
    ) -> Self {
        Self {
            api,
            tx,
            settings,
            route,
            mode: Mode::Browse,
            users: UserListState::new(),
            tasks: None,
            task_session: 0,
            selected_user: 0,
            selected_task: 0,
            user_form: FormState::cleared(),
            task_form: FormState::cleared(),
            submitting: false,
            page_input: String::new(),
            notice: None,
        }
    }

    /// Initial fetches for the starting route. Users are always loaded; the
    /// scoped tasks view shows the user's name from that list.
    pub fn start(&mut self) {
        self.fetch_users();
        if let Route::Tasks { user_id } = self.route.clone() {
            self.enter_tasks(user_id);
        }
    }

    /// Returns true if the app should quit
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Key(key) => return self.handle_key(key),
            AppEvent::Tick => self.tick(Instant::now()),
            AppEvent::UsersLoaded { generation, result } => self.on_users_loaded(generation, result),
            AppEvent::TasksLoaded {
                session,
                generation,
                result,
            } => self.on_tasks_loaded(session, generation, result),
            AppEvent::TaskCountLoaded {
                session,
                generation,
                result,
            } => self.on_task_count_loaded(session, generation, result),
            AppEvent::UserCreated { form, result } => self.on_user_created(form, result),
            AppEvent::UserDeleted { id, result } => self.on_user_deleted(id, result),
            AppEvent::TaskCreated {
                session,
                form,
                result,
            } => self.on_task_created(session, form, result),
            AppEvent::TaskUpdated { session, id, result } => self.on_task_updated(session, id, result),
            AppEvent::TaskDeleted { session, id, result } => self.on_task_deleted(session, id, result),
        }
        false
    }

    /// Fire a settled search.
    pub fn tick(&mut self, now: Instant) {
        let refresh = self.tasks.as_mut().and_then(|tasks| tasks.poll_search(now));
        if let Some(refresh) = refresh {
            self.selected_task = 0;
            self.run_refresh(refresh);
        }
    }

    // ============ Navigation ============

    pub fn navigate(&mut self, route: Route) {
        tracing::info!(path = %route.path(), "navigate");
        self.mode = Mode::Browse;
        self.notice = None;
        self.page_input.clear();
        self.route = route.clone();

        match route {
            Route::Users => {
                self.tasks = None;
                self.clamp_selection();
            }
            Route::Tasks { user_id } => self.enter_tasks(user_id),
        }
    }

    fn enter_tasks(&mut self, scope: Option<String>) {
        self.task_session += 1;
        self.selected_task = 0;
        self.task_form = FormState::cleared();

        let mut tasks = TaskListState::new(scope, self.settings);
        let refresh = tasks.refresh();
        self.tasks = Some(tasks);
        self.run_refresh(refresh);
    }

    pub fn scope(&self) -> Option<&str> {
        self.tasks.as_ref().and_then(|tasks| tasks.scope())
    }

    /// The user whose tasks are shown, if the view is scoped and the user
    /// is known.
    pub fn scoped_user(&self) -> Option<User> {
        self.scope().and_then(|id| self.users.find(id))
    }

    pub fn visible_users(&self) -> Vec<User> {
        self.users.view()
    }

    pub fn visible_tasks(&self) -> Vec<Task> {
        self.tasks.as_ref().map(|tasks| tasks.list.view()).unwrap_or_default()
    }

    fn selected_user_id(&self) -> Option<String> {
        self.visible_users().get(self.selected_user).map(|u| u.id.clone())
    }

    fn selected_task_id(&self) -> Option<String> {
        self.visible_tasks().get(self.selected_task).map(|t| t.id.clone())
    }

    fn clamp_selection(&mut self) {
        self.selected_user = self
            .selected_user
            .min(self.visible_users().len().saturating_sub(1));
        self.selected_task = self
            .selected_task
            .min(self.visible_tasks().len().saturating_sub(1));
    }

    // ============ Fetching ============

    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = work.await;
            let _ = tx.send(event).await;
        });
    }

    pub fn fetch_users(&mut self) {
        let generation = self.users.begin();
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            AppEvent::UsersLoaded {
                generation,
                result: api.list_users().await,
            }
        });
    }

    fn fetch_task_page(&self, fetch: Fetch) {
        let session = self.task_session;
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            AppEvent::TasksLoaded {
                session,
                generation: fetch.generation,
                result: api.list_tasks(&fetch.query).await,
            }
        });
    }

    fn fetch_task_count(&self, fetch: Fetch) {
        let session = self.task_session;
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            AppEvent::TaskCountLoaded {
                session,
                generation: fetch.generation,
                result: api.list_tasks(&fetch.query).await,
            }
        });
    }

    fn run_refresh(&self, refresh: Refresh) {
        self.fetch_task_page(refresh.page);
        self.fetch_task_count(refresh.count);
    }

    fn refresh_tasks(&mut self) {
        if let Some(refresh) = self.tasks.as_mut().map(|tasks| tasks.refresh()) {
            self.run_refresh(refresh);
        }
    }

    fn refetch_tasks(&mut self) {
        if let Some(fetch) = self.tasks.as_mut().map(|tasks| tasks.refetch()) {
            self.fetch_task_page(fetch);
        }
    }

    /// Manual recovery after a failed fetch.
    pub fn retry(&mut self) {
        match self.route {
            Route::Users => self.fetch_users(),
            Route::Tasks { .. } => self.refresh_tasks(),
        }
    }

    fn change_page(&mut self, step: impl FnOnce(&mut TaskListState) -> Option<Fetch>) {
        if let Some(fetch) = self.tasks.as_mut().and_then(step) {
            self.selected_task = 0;
            self.fetch_task_page(fetch);
        }
    }

    fn cycle_filter(&mut self) {
        if let Some(refresh) = self.tasks.as_mut().map(|tasks| tasks.cycle_filter()) {
            self.selected_task = 0;
            self.run_refresh(refresh);
        }
    }

    fn toggle_order(&mut self) {
        if let Some(fetch) = self.tasks.as_mut().map(|tasks| tasks.toggle_order()) {
            self.selected_task = 0;
            self.fetch_task_page(fetch);
        }
    }

    fn edit_search(&mut self, edit: impl FnOnce(&mut String)) {
        if let Some(tasks) = self.tasks.as_mut() {
            let mut input = tasks.search_input().to_string();
            edit(&mut input);
            tasks.edit_search(input, Instant::now());
        }
    }

    // ============ Results ============

    fn on_users_loaded(&mut self, generation: Generation, result: Result<Vec<User>, ApiError>) {
        if self.users.commit(generation, result) {
            self.clamp_selection();
        }
    }

    fn on_tasks_loaded(&mut self, session: u64, generation: Generation, result: Result<Vec<Task>, ApiError>) {
        if session != self.task_session {
            tracing::debug!(session, "dropping tasks for a closed view");
            return;
        }
        if let Some(tasks) = self.tasks.as_mut() {
            if tasks.commit_page(generation, result) {
                self.clamp_selection();
            }
        }
    }

    fn on_task_count_loaded(&mut self, session: u64, generation: Generation, result: Result<Vec<Task>, ApiError>) {
        if session != self.task_session {
            return;
        }
        let clamped = self
            .tasks
            .as_mut()
            .and_then(|tasks| tasks.commit_count(generation, result));
        if let Some(fetch) = clamped {
            self.selected_task = 0;
            self.fetch_task_page(fetch);
        }
    }

    // ============ User actions ============

    pub fn submit_user_form(&mut self) {
        if self.submitting {
            return;
        }

        let user = match self.user_form.form.prepare(Utc::now()) {
            Ok(user) => user,
            Err(state) => {
                self.user_form = state;
                return;
            }
        };

        tracing::info!(id = %user.id, "creating user");
        self.users.create(user.clone());
        self.user_form.error = None;
        self.submitting = true;

        let form = self.user_form.form.clone();
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            AppEvent::UserCreated {
                form,
                result: api.create_user(&user).await,
            }
        });
    }

    fn on_user_created(&mut self, form: UserForm, result: Result<User, ApiError>) {
        self.submitting = false;

        match result {
            Ok(user) => {
                tracing::info!(id = %user.id, "user created");
                self.user_form = FormState::cleared();
                if matches!(self.mode, Mode::UserForm(_)) {
                    self.mode = Mode::Browse;
                }
                self.fetch_users();
            }
            Err(e) => {
                // The optimistic row stays until the next refetch.
                let message = format!("Failed to add user {}", e);
                self.user_form = FormState::failed(message.clone(), form);

                let here = self.route == Route::Users
                    && matches!(self.mode, Mode::Browse | Mode::UserForm(_));
                if here {
                    if self.mode == Mode::Browse {
                        self.mode = Mode::UserForm(UserField::Name);
                    }
                } else {
                    self.notice = Some(message);
                }
            }
        }
    }

    pub fn delete_user(&mut self, id: &str) {
        tracing::info!(%id, "deleting user");
        self.users.delete(id);
        self.clamp_selection();

        let id = id.to_string();
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.delete_user(&id).await;
            AppEvent::UserDeleted { id, result }
        });
    }

    fn on_user_deleted(&mut self, id: String, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                tracing::info!(%id, "user deleted");
                self.fetch_users();
            }
            Err(e) => self.notice = Some(format!("Failed to delete user {}", e)),
        }
    }

    // ============ Task actions ============

    pub fn submit_task_form(&mut self) {
        if self.submitting {
            return;
        }

        let task = match self.task_form.form.prepare(self.scope(), Utc::now()) {
            Ok(task) => task,
            Err(state) => {
                self.task_form = state;
                return;
            }
        };

        tracing::info!(id = %task.id, user_id = %task.user_id, "creating task");
        if let Some(tasks) = self.tasks.as_mut() {
            tasks.list.create(task.clone());
        }
        self.task_form.error = None;
        self.submitting = true;

        let session = self.task_session;
        let form = self.task_form.form.clone();
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            AppEvent::TaskCreated {
                session,
                form,
                result: api.create_task(&task).await,
            }
        });
    }

    fn on_task_created(&mut self, session: u64, form: TaskForm, result: Result<Task, ApiError>) {
        self.submitting = false;
        if session != self.task_session {
            return;
        }

        match result {
            Ok(_) => {
                self.task_form = FormState::cleared();
                if self.mode == Mode::TaskForm {
                    self.mode = Mode::Browse;
                }
                self.refresh_tasks();
            }
            Err(e) => {
                let message = format!("Failed to create task {}", e);
                self.task_form = FormState::failed(message.clone(), form);

                match self.mode {
                    Mode::Browse => self.mode = Mode::TaskForm,
                    Mode::TaskForm => {}
                    Mode::Search | Mode::UserForm(_) => self.notice = Some(message),
                }
            }
        }
    }

    pub fn toggle_task(&mut self, id: &str) {
        let Some(task) = self.tasks.as_mut().and_then(|tasks| tasks.toggle(id)) else {
            return;
        };

        let session = self.task_session;
        let id = id.to_string();
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.update_task(&id, &TaskUpdate::done(task.done)).await;
            AppEvent::TaskUpdated { session, id, result }
        });
    }

    fn on_task_updated(&mut self, session: u64, id: String, result: Result<Task, ApiError>) {
        if session != self.task_session {
            return;
        }
        match result {
            Ok(_) => self.refetch_tasks(),
            Err(e) => {
                tracing::warn!(%id, error = %e, "toggle failed");
                self.notice = Some(format!("Failed to update task {}", e));
            }
        }
    }

    pub fn delete_task(&mut self, id: &str) {
        let Some(tasks) = self.tasks.as_mut() else {
            return;
        };
        tasks.list.delete(id);
        self.clamp_selection();

        let session = self.task_session;
        let id = id.to_string();
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.delete_task(&id).await;
            AppEvent::TaskDeleted { session, id, result }
        });
    }

    fn on_task_deleted(&mut self, session: u64, id: String, result: Result<(), ApiError>) {
        if session != self.task_session {
            return;
        }
        match result {
            Ok(()) => {
                tracing::info!(%id, "task deleted");
                self.refresh_tasks();
            }
            Err(e) => self.notice = Some(format!("Failed to delete task {}", e)),
        }
    }

    // ============ Keys ============

    /// Handle key events, returns true if app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Clear notice on any key press
        self.notice = None;

        // Global quit with Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match self.mode {
            Mode::UserForm(field) => {
                self.handle_user_form_key(key, field);
                false
            }
            Mode::TaskForm => {
                self.handle_task_form_key(key);
                false
            }
            Mode::Search => {
                self.handle_search_key(key);
                false
            }
            Mode::Browse => match self.route {
                Route::Users => self.handle_users_key(key),
                Route::Tasks { .. } => self.handle_tasks_key(key),
            },
        }
    }

    fn handle_users_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_user + 1 < self.visible_users().len() {
                    self.selected_user += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_user = self.selected_user.saturating_sub(1);
            }
            KeyCode::Char('n') => self.mode = Mode::UserForm(UserField::Name),
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_user_id() {
                    self.delete_user(&id);
                }
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_user_id() {
                    self.navigate(Route::Tasks { user_id: Some(id) });
                }
            }
            KeyCode::Char('t') => self.navigate(Route::Tasks { user_id: None }),
            KeyCode::Char('r') => self.retry(),
            _ => {}
        }
        false
    }

    fn handle_tasks_key(&mut self, key: KeyEvent) -> bool {
        let scoped = self.scope().is_some();

        // Page jump: digits accumulate, Enter goes, anything else cancels
        if let KeyCode::Char(c @ '0'..='9') = key.code {
            if self.page_input.len() < 6 {
                self.page_input.push(c);
            }
            return false;
        }
        if key.code == KeyCode::Enter && !self.page_input.is_empty() {
            let input = std::mem::take(&mut self.page_input);
            if let Ok(page) = input.parse::<u32>() {
                self.change_page(|tasks| tasks.go_to_page(page));
            }
            return false;
        }
        self.page_input.clear();

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Backspace | KeyCode::Char('u') => self.navigate(Route::Users),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_task + 1 < self.visible_tasks().len() {
                    self.selected_task += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_task = self.selected_task.saturating_sub(1);
            }
            KeyCode::Char('l') | KeyCode::Right => self.change_page(TaskListState::next_page),
            KeyCode::Char('h') | KeyCode::Left => self.change_page(TaskListState::prev_page),
            KeyCode::Char('g') => self.change_page(TaskListState::first_page),
            KeyCode::Char('G') => self.change_page(TaskListState::last_page),
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('f') => self.cycle_filter(),
            KeyCode::Char('o') => self.toggle_order(),
            KeyCode::Char('r') => self.retry(),
            KeyCode::Char('n') if scoped => self.mode = Mode::TaskForm,
            KeyCode::Char(' ') if scoped => {
                if let Some(id) = self.selected_task_id() {
                    self.toggle_task(&id);
                }
            }
            KeyCode::Char('d') if scoped => {
                if let Some(id) = self.selected_task_id() {
                    self.delete_task(&id);
                }
            }
            KeyCode::Char('n') | KeyCode::Char(' ') | KeyCode::Char('d') => {
                self.notice = Some("Open a user's tasks to change them".to_string());
            }
            _ => {}
        }
        false
    }

    fn handle_user_form_key(&mut self, key: KeyEvent, field: UserField) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Tab | KeyCode::BackTab => self.mode = Mode::UserForm(field.next()),
            KeyCode::Enter => self.submit_user_form(),
            KeyCode::Char(c) if !self.submitting => self.user_form.form.field_mut(field).push(c),
            KeyCode::Backspace if !self.submitting => {
                self.user_form.form.field_mut(field).pop();
            }
            _ => {}
        }
    }

    fn handle_task_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => self.submit_task_form(),
            KeyCode::Char(c) if !self.submitting => self.task_form.form.title.push(c),
            KeyCode::Backspace if !self.submitting => {
                self.task_form.form.title.pop();
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.mode = Mode::Browse,
            KeyCode::Char(c) => self.edit_search(|input| input.push(c)),
            KeyCode::Backspace => self.edit_search(|input| {
                input.pop();
            }),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::fake::FakeApi;
    use crate::api::Operation;

    fn settings() -> TaskListSettings {
        TaskListSettings {
            page_size: 10,
            count_limit: 1000,
            search_delay: Duration::from_millis(1000),
        }
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.into(),
            name: name.into(),
            email: format!("{}@example.com", id),
            created_at: Utc::now(),
            avatar: None,
            city: "London".into(),
        }
    }

    fn tasks_for(user_id: &str, count: usize) -> Vec<Task> {
        let base = Utc::now();
        (0..count)
            .map(|i| Task {
                id: format!("{}-{}", user_id, i),
                title: format!("Task {}", i),
                done: false,
                user_id: user_id.into(),
                created_at: base - chrono::Duration::minutes(i as i64),
                user_name: None,
            })
            .collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup(api: FakeApi, route: Route) -> (App, mpsc::Receiver<AppEvent>, Arc<FakeApi>) {
        let api = Arc::new(api);
        let (tx, rx) = mpsc::channel(100);
        let app = App::new(api.clone(), tx, settings(), route);
        (app, rx, api)
    }

    /// Feed results back until the spawned work goes quiet.
    async fn pump(app: &mut App, rx: &mut mpsc::Receiver<AppEvent>) {
        while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
            app.handle_event(event);
        }
    }

    fn names(app: &App) -> Vec<String> {
        app.visible_users().into_iter().map(|u| u.name).collect()
    }

    fn fill_user_form(app: &mut App, name: &str, email: &str) {
        app.user_form.form = UserForm {
            name: name.into(),
            email: email.into(),
            city: String::new(),
        };
        app.mode = Mode::UserForm(UserField::Name);
    }

    #[tokio::test]
    async fn created_user_shows_immediately_and_after_refetch() {
        let (mut app, mut rx, api) = setup(FakeApi::with_users(vec![user("u1", "Ada")]), Route::Users);
        app.start();
        pump(&mut app, &mut rx).await;

        fill_user_form(&mut app, "Grace", "grace@example.com");
        app.submit_user_form();
        assert_eq!(names(&app), vec!["Ada", "Grace"]);
        assert!(app.submitting);

        pump(&mut app, &mut rx).await;
        assert_eq!(names(&app), vec!["Ada", "Grace"]);
        assert_eq!(app.users.items().len(), 2);
        assert_eq!(app.users.pending_len(), 0);
        assert_eq!(app.user_form, FormState::cleared());
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(api.count(Operation::FetchUsers), 2);
        assert_eq!(app.visible_users()[1].city, "Not Provided");
    }

    #[tokio::test]
    async fn empty_email_never_reaches_the_remote() {
        let (mut app, mut rx, api) = setup(FakeApi::default(), Route::Users);
        app.start();
        pump(&mut app, &mut rx).await;

        fill_user_form(&mut app, "Grace", "");
        app.submit_user_form();
        pump(&mut app, &mut rx).await;

        assert_eq!(api.count(Operation::CreateUser), 0);
        assert_eq!(app.user_form.error.as_deref(), Some("Name and email are required"));
        assert_eq!(app.user_form.form.name, "Grace");
        assert!(app.visible_users().is_empty());
    }

    #[tokio::test]
    async fn failed_create_leaves_ghost_until_next_refetch() {
        let (mut app, mut rx, api) = setup(FakeApi::with_users(vec![user("u1", "Ada")]), Route::Users);
        app.start();
        pump(&mut app, &mut rx).await;

        api.fail(Operation::CreateUser);
        fill_user_form(&mut app, "Ghost", "ghost@example.com");
        app.submit_user_form();
        pump(&mut app, &mut rx).await;

        assert_eq!(names(&app), vec!["Ada", "Ghost"]);
        let error = app.user_form.error.clone().unwrap();
        assert!(error.starts_with("Failed to add user"), "{}", error);
        assert_eq!(app.user_form.form.name, "Ghost");
        assert_eq!(app.user_form.form.email, "ghost@example.com");
        assert!(matches!(app.mode, Mode::UserForm(_)));

        app.retry();
        pump(&mut app, &mut rx).await;
        assert_eq!(names(&app), vec!["Ada"]);
    }

    #[tokio::test]
    async fn deleted_user_is_hidden_immediately_and_after_refetch() {
        let (mut app, mut rx, api) = setup(
            FakeApi::with_users(vec![user("u1", "Ada"), user("u2", "Alan")]),
            Route::Users,
        );
        app.start();
        pump(&mut app, &mut rx).await;

        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(names(&app), vec!["Alan"]);

        pump(&mut app, &mut rx).await;
        assert_eq!(names(&app), vec!["Alan"]);
        assert_eq!(api.count(Operation::DeleteUser), 1);
        assert!(app.notice.is_none());
    }

    #[tokio::test]
    async fn failed_user_fetch_keeps_rows_and_retry_recovers() {
        let (mut app, mut rx, api) = setup(FakeApi::with_users(vec![user("u1", "Ada")]), Route::Users);
        app.start();
        pump(&mut app, &mut rx).await;

        api.fail(Operation::FetchUsers);
        app.handle_key(key(KeyCode::Char('r')));
        pump(&mut app, &mut rx).await;
        assert!(app.users.error().is_some());
        assert_eq!(names(&app), vec!["Ada"]);

        api.recover(Operation::FetchUsers);
        app.handle_key(key(KeyCode::Char('r')));
        pump(&mut app, &mut rx).await;
        assert!(app.users.error().is_none());
    }

    #[tokio::test]
    async fn pages_do_not_overlap() {
        let (mut app, mut rx, _api) = setup(
            FakeApi::with_tasks(tasks_for("u1", 25)),
            Route::Tasks {
                user_id: Some("u1".into()),
            },
        );
        app.start();
        pump(&mut app, &mut rx).await;

        let first: Vec<String> = app.visible_tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(first.len(), 10);
        assert_eq!(app.tasks.as_ref().unwrap().total_pages(), 3);

        app.handle_key(key(KeyCode::Char('l')));
        pump(&mut app, &mut rx).await;

        let second: Vec<String> = app.visible_tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(second.len(), 10);
        assert!(second.iter().all(|id| !first.contains(id)));
        assert_eq!(app.tasks.as_ref().unwrap().pagination.page, 2);
    }

    #[tokio::test]
    async fn search_without_matches_is_empty_not_an_error() {
        let (mut app, mut rx, _api) = setup(
            FakeApi::with_tasks(tasks_for("u1", 5)),
            Route::Tasks { user_id: None },
        );
        app.start();
        pump(&mut app, &mut rx).await;

        app.handle_key(key(KeyCode::Char('/')));
        for c in "zzz".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));

        app.tick(Instant::now() + Duration::from_secs(2));
        pump(&mut app, &mut rx).await;

        let tasks = app.tasks.as_ref().unwrap();
        assert_eq!(tasks.search_title(), "zzz");
        assert!(tasks.list.view().is_empty());
        assert!(tasks.list.error().is_none());
        assert_eq!(tasks.total_pages(), 0);
    }

    #[tokio::test]
    async fn toggle_and_delete_are_optimistic_when_scoped() {
        let (mut app, mut rx, api) = setup(
            FakeApi::with_tasks(tasks_for("u1", 3)),
            Route::Tasks {
                user_id: Some("u1".into()),
            },
        );
        app.start();
        pump(&mut app, &mut rx).await;

        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.visible_tasks()[0].done);
        pump(&mut app, &mut rx).await;
        assert!(app.tasks.as_ref().unwrap().list.items()[0].done);
        assert!(api.tasks.lock().unwrap()[0].done);

        let doomed = app.visible_tasks()[0].id.clone();
        app.handle_key(key(KeyCode::Char('d')));
        assert!(app.visible_tasks().iter().all(|t| t.id != doomed));
        pump(&mut app, &mut rx).await;
        assert_eq!(app.visible_tasks().len(), 2);
        assert_eq!(app.tasks.as_ref().unwrap().total_pages(), 1);
    }

    #[tokio::test]
    async fn unscoped_task_view_is_read_only() {
        let (mut app, mut rx, api) = setup(
            FakeApi::with_tasks(tasks_for("u1", 3)),
            Route::Tasks { user_id: None },
        );
        app.start();
        pump(&mut app, &mut rx).await;

        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.mode, Mode::Browse);
        assert!(app.notice.is_some());

        app.handle_key(key(KeyCode::Char('d')));
        pump(&mut app, &mut rx).await;
        assert_eq!(api.count(Operation::DeleteTask), 0);
    }

    #[tokio::test]
    async fn create_task_refreshes_list_and_count() {
        let (mut app, mut rx, api) = setup(
            FakeApi::with_tasks(tasks_for("u1", 10)),
            Route::Tasks {
                user_id: Some("u1".into()),
            },
        );
        app.start();
        pump(&mut app, &mut rx).await;
        assert_eq!(app.tasks.as_ref().unwrap().total_pages(), 1);

        app.handle_key(key(KeyCode::Char('n')));
        for c in "Buy milk".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert!(app.visible_tasks().iter().any(|t| t.title == "Buy milk"));

        pump(&mut app, &mut rx).await;
        assert_eq!(api.count(Operation::CreateTask), 1);
        assert_eq!(app.tasks.as_ref().unwrap().total_pages(), 2);
        assert_eq!(app.task_form, FormState::cleared());
        assert_eq!(app.mode, Mode::Browse);
    }

    #[tokio::test]
    async fn results_for_a_left_view_are_dropped() {
        let mut tasks = tasks_for("u1", 3);
        tasks.extend(tasks_for("u2", 2));
        let (mut app, mut rx, _api) = setup(FakeApi::with_tasks(tasks), Route::Users);
        app.start();

        app.navigate(Route::Tasks {
            user_id: Some("u1".into()),
        });
        app.navigate(Route::Tasks {
            user_id: Some("u2".into()),
        });
        pump(&mut app, &mut rx).await;

        let visible = app.visible_tasks();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|t| t.user_id == "u2"));
    }

    #[tokio::test]
    async fn scoped_view_names_the_user() {
        let (mut app, mut rx, _api) = setup(
            FakeApi::with_users(vec![user("u1", "Ada")]),
            Route::Users,
        );
        app.start();
        pump(&mut app, &mut rx).await;

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.route.path(), "/u1/tasks");
        assert_eq!(app.scoped_user().map(|u| u.name), Some("Ada".to_string()));

        app.handle_key(key(KeyCode::Char('u')));
        assert_eq!(app.route, Route::Users);
        assert!(app.tasks.is_none());
    }

    #[tokio::test]
    async fn deleting_the_only_row_on_the_last_page_steps_back() {
        let (mut app, mut rx, _api) = setup(
            FakeApi::with_tasks(tasks_for("u1", 21)),
            Route::Tasks {
                user_id: Some("u1".into()),
            },
        );
        app.start();
        pump(&mut app, &mut rx).await;

        app.handle_key(key(KeyCode::Char('G')));
        pump(&mut app, &mut rx).await;
        assert_eq!(app.tasks.as_ref().unwrap().pagination.page, 3);
        assert_eq!(app.visible_tasks().len(), 1);

        app.handle_key(key(KeyCode::Char('d')));
        pump(&mut app, &mut rx).await;

        let tasks = app.tasks.as_ref().unwrap();
        assert_eq!(tasks.total_pages(), 2);
        assert_eq!(tasks.pagination.page, 2);
        assert_eq!(app.visible_tasks().len(), 10);
    }

    #[tokio::test]
    async fn late_user_create_failure_leaves_other_views_alone() {
        let (mut app, mut rx, api) = setup(FakeApi::with_users(vec![user("u1", "Ada")]), Route::Users);
        app.start();
        pump(&mut app, &mut rx).await;

        api.fail(Operation::CreateUser);
        fill_user_form(&mut app, "Az", "az@example.com");
        app.submit_user_form();
        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Char('t')));
        app.handle_key(key(KeyCode::Char('/')));
        pump(&mut app, &mut rx).await;

        assert_eq!(app.mode, Mode::Search);
        assert_eq!(app.route, Route::Tasks { user_id: None });
        let notice = app.notice.clone().unwrap();
        assert!(notice.starts_with("Failed to add user"), "{}", notice);
        assert_eq!(app.user_form.form.name, "Az");
        assert!(app.user_form.error.is_some());

        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.tasks.as_ref().unwrap().search_input(), "x");
        assert_eq!(app.user_form.form.name, "Az");
    }

    #[tokio::test]
    async fn user_create_failure_reopens_closed_form_on_users_view() {
        let (mut app, mut rx, api) = setup(FakeApi::default(), Route::Users);
        app.start();
        pump(&mut app, &mut rx).await;

        api.fail(Operation::CreateUser);
        fill_user_form(&mut app, "Az", "az@example.com");
        app.submit_user_form();
        app.handle_key(key(KeyCode::Esc));
        pump(&mut app, &mut rx).await;

        assert_eq!(app.mode, Mode::UserForm(UserField::Name));
        assert!(app.notice.is_none());
    }

    #[tokio::test]
    async fn late_task_create_failure_keeps_search_focus() {
        let (mut app, mut rx, api) = setup(
            FakeApi::with_tasks(tasks_for("u1", 3)),
            Route::Tasks {
                user_id: Some("u1".into()),
            },
        );
        app.start();
        pump(&mut app, &mut rx).await;

        api.fail(Operation::CreateTask);
        app.handle_key(key(KeyCode::Char('n')));
        for c in "Milk".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Char('/')));
        pump(&mut app, &mut rx).await;

        assert_eq!(app.mode, Mode::Search);
        assert!(app.notice.as_deref().unwrap().starts_with("Failed to create task"));
        assert_eq!(app.task_form.form.title, "Milk");
    }

    #[tokio::test]
    async fn typed_page_number_jumps_past_nine() {
        let (mut app, mut rx, _api) = setup(
            FakeApi::with_tasks(tasks_for("u1", 105)),
            Route::Tasks {
                user_id: Some("u1".into()),
            },
        );
        app.start();
        pump(&mut app, &mut rx).await;
        assert_eq!(app.tasks.as_ref().unwrap().total_pages(), 11);

        app.handle_key(key(KeyCode::Char('1')));
        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(app.page_input, "11");
        app.handle_key(key(KeyCode::Enter));
        pump(&mut app, &mut rx).await;

        assert_eq!(app.tasks.as_ref().unwrap().pagination.page, 11);
        assert_eq!(app.visible_tasks().len(), 5);
        assert!(app.page_input.is_empty());

        app.handle_key(key(KeyCode::Char('4')));
        app.handle_key(key(KeyCode::Char('x')));
        assert!(app.page_input.is_empty());
        app.handle_key(key(KeyCode::Enter));
        pump(&mut app, &mut rx).await;
        assert_eq!(app.tasks.as_ref().unwrap().pagination.page, 11);
    }
}
