mod debounce;
mod forms;
mod generation;
mod list;
mod optimistic;
mod pagination;
mod tasks;

pub use debounce::Debouncer;
pub use forms::{FormState, TaskForm, UserField, UserForm, CITY_FALLBACK};
pub use generation::{Generation, RequestSeq};
pub use list::{ListController, ListStatus};
pub use optimistic::{reconcile, Optimistic, PendingOp};
pub use pagination::{total_pages, Pagination};
pub use tasks::{Fetch, Refresh, TaskListSettings, TaskListState};

pub type UserListState = ListController<taskdeck_shared::User>;
