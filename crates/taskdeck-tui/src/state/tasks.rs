use std::time::{Duration, Instant};

use taskdeck_shared::{
    api::{DoneFilter, SortOrder, TaskQuery, DEFAULT_ORDER_BY},
    Task,
};

use super::debounce::Debouncer;
use super::generation::{Generation, RequestSeq};
use super::list::ListController;
use super::pagination::Pagination;
use crate::api::ApiError;

/// A request the caller should run and hand back with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetch {
    pub generation: Generation,
    pub query: TaskQuery,
}

/// Page fetch plus the count query that sizes the pager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refresh {
    pub page: Fetch,
    pub count: Fetch,
}

#[derive(Debug, Clone, Copy)]
pub struct TaskListSettings {
    pub page_size: u32,
    pub count_limit: u32,
    pub search_delay: Duration,
}

/// Task list state for one visit to the tasks view. It only produces
/// queries; the owner runs them.
#[derive(Debug)]
pub struct TaskListState {
    pub list: ListController<Task>,
    pub pagination: Pagination,
    scope: Option<String>,
    filter: DoneFilter,
    order: SortOrder,
    search_input: String,
    search_typed: String,
    search_title: String,
    debouncer: Debouncer,
    count_limit: u32,
    count_seq: RequestSeq,
}

impl TaskListState {
    pub fn new(scope: Option<String>, settings: TaskListSettings) -> Self {
        Self {
            list: ListController::new(),
            pagination: Pagination::new(settings.page_size),
            scope,
            filter: DoneFilter::All,
            order: SortOrder::Desc,
            search_input: String::new(),
            search_typed: String::new(),
            search_title: String::new(),
            debouncer: Debouncer::new(settings.search_delay),
            count_limit: settings.count_limit,
            count_seq: RequestSeq::new(),
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn filter(&self) -> DoneFilter {
        self.filter
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// What the search box shows.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// The term the server-side filter currently uses.
    pub fn search_title(&self) -> &str {
        &self.search_title
    }

    pub fn total_pages(&self) -> u32 {
        self.pagination.total_pages()
    }

    pub fn page_query(&self) -> TaskQuery {
        TaskQuery {
            page: self.pagination.page,
            limit: self.pagination.limit,
            title: self.search_title.clone(),
            user_id: self.scope.clone(),
            done: self.filter.as_done(),
            order_by: DEFAULT_ORDER_BY.to_string(),
            order: self.order,
        }
    }

    pub fn count_query(&self) -> TaskQuery {
        TaskQuery {
            page: 1,
            limit: self.count_limit,
            ..self.page_query()
        }
    }

    /// Refetch the current page.
    pub fn refetch(&mut self) -> Fetch {
        Fetch {
            generation: self.list.begin(),
            query: self.page_query(),
        }
    }

    /// Refetch the page and recount.
    pub fn refresh(&mut self) -> Refresh {
        let count = Fetch {
            generation: self.count_seq.issue(),
            query: self.count_query(),
        };
        Refresh {
            page: self.refetch(),
            count,
        }
    }

    pub fn commit_page(&mut self, generation: Generation, result: Result<Vec<Task>, ApiError>) -> bool {
        self.list.commit(generation, result)
    }

    /// Size the pager from a finished count query. If the total shrank
    /// below the current page, the page is clamped and the returned fetch
    /// must be run.
    pub fn commit_count(&mut self, generation: Generation, result: Result<Vec<Task>, ApiError>) -> Option<Fetch> {
        if !self.count_seq.is_latest(generation) {
            tracing::debug!(?generation, "dropping stale task count");
            return None;
        }

        match result {
            Ok(tasks) => {
                self.pagination.set_total(tasks.len());
                let clamped = self.pagination.clamp();
                self.moved(clamped)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching total tasks");
                self.pagination.set_total(0);
                None
            }
        }
    }

    fn moved(&mut self, changed: bool) -> Option<Fetch> {
        changed.then(|| self.refetch())
    }

    pub fn next_page(&mut self) -> Option<Fetch> {
        let changed = self.pagination.next();
        self.moved(changed)
    }

    pub fn prev_page(&mut self) -> Option<Fetch> {
        let changed = self.pagination.prev();
        self.moved(changed)
    }

    pub fn first_page(&mut self) -> Option<Fetch> {
        let changed = self.pagination.first();
        self.moved(changed)
    }

    pub fn last_page(&mut self) -> Option<Fetch> {
        let changed = self.pagination.last();
        self.moved(changed)
    }

    pub fn go_to_page(&mut self, page: u32) -> Option<Fetch> {
        let changed = self.pagination.go_to(page);
        self.moved(changed)
    }

    /// Record a search-box edit. The fetch happens in `poll_search` once
    /// typing pauses; unchanged input is ignored.
    pub fn edit_search(&mut self, input: String, now: Instant) {
        let trimmed = input.trim().to_string();
        self.search_input = input;

        if trimmed == self.search_typed {
            return;
        }
        self.search_typed = trimmed.clone();
        self.debouncer.push(trimmed, now);
    }

    pub fn search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Fire a settled search: apply the term, back to page 1, refetch and
    /// recount.
    pub fn poll_search(&mut self, now: Instant) -> Option<Refresh> {
        let title = self.debouncer.poll(now)?;
        tracing::debug!(%title, "search settled");

        self.search_title = title;
        self.pagination.reset();
        Some(self.refresh())
    }

    pub fn set_filter(&mut self, filter: DoneFilter) -> Option<Refresh> {
        if filter == self.filter {
            return None;
        }
        self.filter = filter;
        self.pagination.reset();
        Some(self.refresh())
    }

    pub fn cycle_filter(&mut self) -> Refresh {
        self.filter = self.filter.cycle();
        self.pagination.reset();
        self.refresh()
    }

    /// Flip newest/oldest first. The count is unaffected, so only the page
    /// is refetched.
    pub fn toggle_order(&mut self) -> Fetch {
        self.order = match self.order {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        };
        self.pagination.reset();
        self.refetch()
    }

    /// Optimistically flip `done`; returns the flipped task.
    pub fn toggle(&mut self, id: &str) -> Option<Task> {
        let mut task = self.list.find(id)?;
        task.done = !task.done;
        self.list.update(task.clone());
        Some(task)
    }
}
