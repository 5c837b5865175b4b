mod client;
mod remote;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{classify, ApiClient, ApiError, Operation, StatusClass};
pub use remote::TaskDeckApi;
