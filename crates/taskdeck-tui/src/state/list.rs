use taskdeck_shared::Identified;

use super::generation::{Generation, RequestSeq};
use super::optimistic::{Optimistic, PendingOp};
use crate::api::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Idle,
    Loading,
    Failed(String),
}

/// One entity list: the last committed rows, the request in flight, and
/// the optimistic operations layered on top.
#[derive(Debug)]
pub struct ListController<T> {
    items: Vec<T>,
    loaded: bool,
    status: ListStatus,
    seq: RequestSeq,
    pending: Optimistic<T>,
}

impl<T: Identified + Clone> Default for ListController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identified + Clone> ListController<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            loaded: false,
            status: ListStatus::Idle,
            seq: RequestSeq::new(),
            pending: Optimistic::default(),
        }
    }

    /// Start a fetch. The rows on screen stay until it commits.
    pub fn begin(&mut self) -> Generation {
        self.status = ListStatus::Loading;
        self.seq.issue()
    }

    /// Apply a finished fetch. Returns false when a newer request has been
    /// issued since, in which case the result is dropped.
    pub fn commit(&mut self, generation: Generation, result: Result<Vec<T>, ApiError>) -> bool {
        if !self.seq.is_latest(generation) {
            tracing::debug!(?generation, latest = ?self.seq.current(), "dropping stale list result");
            return false;
        }

        match result {
            Ok(items) => {
                self.items = items;
                self.loaded = true;
                self.status = ListStatus::Idle;
                self.pending.settle(generation);
            }
            Err(e) => {
                tracing::warn!(error = %e, "list fetch failed");
                self.status = ListStatus::Failed(e.to_string());
            }
        }

        true
    }

    pub fn create(&mut self, item: T) {
        self.pending.record(self.seq.current(), PendingOp::Create(item));
    }

    pub fn update(&mut self, item: T) {
        self.pending.record(self.seq.current(), PendingOp::Update(item));
    }

    pub fn delete(&mut self, id: &str) {
        self.pending
            .record(self.seq.current(), PendingOp::Delete(id.to_string()));
    }

    /// Rows to render.
    pub fn view(&self) -> Vec<T> {
        self.pending.view(&self.items)
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.view().into_iter().find(|item| item.id() == id)
    }

    /// Last committed rows, without pending operations.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ListStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// False until the first successful fetch.
    pub fn has_loaded(&self) -> bool {
        self.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Operation;
    use reqwest::StatusCode;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(String);

    impl Identified for Row {
        fn id(&self) -> &str {
            &self.0
        }
    }

    fn rows(ids: &[&str]) -> Vec<Row> {
        ids.iter().map(|id| Row(id.to_string())).collect()
    }

    fn failure() -> ApiError {
        ApiError::Status {
            op: Operation::FetchUsers,
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        }
    }

    #[test]
    fn commit_replaces_rows_in_one_step() {
        let mut list = ListController::new();
        let first = list.begin();
        assert!(list.commit(first, Ok(rows(&["a", "b"]))));

        let second = list.begin();
        assert!(list.is_loading());
        assert_eq!(list.view(), rows(&["a", "b"]));

        assert!(list.commit(second, Ok(rows(&["c"]))));
        assert_eq!(list.view(), rows(&["c"]));
        assert_eq!(list.status(), &ListStatus::Idle);
    }

    #[test]
    fn slow_older_request_cannot_overwrite_newer_one() {
        let mut list = ListController::new();
        let slow = list.begin();
        let fast = list.begin();

        assert!(list.commit(fast, Ok(rows(&["fresh"]))));
        assert!(!list.commit(slow, Ok(rows(&["stale"]))));
        assert_eq!(list.view(), rows(&["fresh"]));
    }

    #[test]
    fn failure_keeps_previous_rows() {
        let mut list = ListController::new();
        let first = list.begin();
        list.commit(first, Ok(rows(&["a"])));

        let second = list.begin();
        list.commit(second, Err(failure()));

        assert_eq!(list.view(), rows(&["a"]));
        assert!(list.error().unwrap().starts_with("Failed to fetch users"));
        assert!(list.has_loaded());
    }

    #[test]
    fn ghost_create_survives_until_next_successful_refetch() {
        let mut list = ListController::new();
        let first = list.begin();
        list.commit(first, Ok(rows(&["a"])));

        // remote create failed; nothing rolls the entry back
        list.create(Row("ghost".into()));
        assert_eq!(list.view(), rows(&["a", "ghost"]));

        let failed = list.begin();
        list.commit(failed, Err(failure()));
        assert_eq!(list.view(), rows(&["a", "ghost"]));

        let refetch = list.begin();
        list.commit(refetch, Ok(rows(&["a"])));
        assert_eq!(list.view(), rows(&["a"]));
        assert_eq!(list.pending_len(), 0);
    }

    #[test]
    fn delete_hides_row_before_and_after_refetch() {
        let mut list = ListController::new();
        let first = list.begin();
        list.commit(first, Ok(rows(&["a", "b"])));

        list.delete("a");
        assert_eq!(list.view(), rows(&["b"]));

        let refetch = list.begin();
        list.commit(refetch, Ok(rows(&["b"])));
        assert_eq!(list.view(), rows(&["b"]));
    }
}
