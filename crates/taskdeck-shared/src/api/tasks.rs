use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_ORDER_BY: &str = "createdAt";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tasks the list shows by completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoneFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl DoneFilter {
    pub fn as_done(&self) -> Option<bool> {
        match self {
            DoneFilter::All => None,
            DoneFilter::Completed => Some(true),
            DoneFilter::Incomplete => Some(false),
        }
    }

    /// Next filter in the cycle All -> Completed -> Incomplete -> All.
    pub fn cycle(self) -> Self {
        match self {
            DoneFilter::All => DoneFilter::Completed,
            DoneFilter::Completed => DoneFilter::Incomplete,
            DoneFilter::Incomplete => DoneFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DoneFilter::All => "Show all",
            DoneFilter::Completed => "Show all completed",
            DoneFilter::Incomplete => "Show all incompleted",
        }
    }
}

/// Query for `GET /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    pub order_by: String,
    pub order: SortOrder,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            title: String::new(),
            user_id: None,
            done: None,
            order_by: DEFAULT_ORDER_BY.to_string(),
            order: SortOrder::Desc,
        }
    }
}

impl TaskQuery {
    /// Query-string pairs, unencoded. Paging and ordering are always sent,
    /// filters only when set.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("orderBy", self.order_by.clone()),
            ("order", self.order.to_string()),
        ];

        if let Some(user_id) = self.user_id.as_deref().filter(|id| !id.is_empty()) {
            pairs.push(("userId", user_id.to_string()));
        }
        if !self.title.is_empty() {
            pairs.push(("title", self.title.clone()));
        }
        if let Some(done) = self.done {
            pairs.push(("done", done.to_string()));
        }

        pairs
    }
}

/// Partial body for `PUT /tasks/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl TaskUpdate {
    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Self::default()
        }
    }
}
