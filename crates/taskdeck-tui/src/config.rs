use std::env;
use std::time::Duration;

use anyhow::Context;

use crate::state::TaskListSettings;

pub const DEFAULT_API_URL: &str = "https://6786b3a1f80b78923aa7e6d5.mockapi.io/api-v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub page_size: u32,
    pub count_limit: u32,
    pub search_debounce: Duration,
    pub request_timeout: Duration,
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, value)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            api_url: env::var("TASKDECK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            page_size: parse_var("TASKDECK_PAGE_SIZE", 10)?,
            count_limit: parse_var("TASKDECK_COUNT_LIMIT", 1000)?,
            search_debounce: Duration::from_millis(parse_var("TASKDECK_SEARCH_DEBOUNCE_MS", 1000)?),
            request_timeout: Duration::from_secs(parse_var("TASKDECK_REQUEST_TIMEOUT_SECS", 10)?),
        };

        anyhow::ensure!(config.page_size > 0, "TASKDECK_PAGE_SIZE must be positive");
        Ok(config)
    }

    pub fn task_list(&self) -> TaskListSettings {
        TaskListSettings {
            page_size: self.page_size,
            count_limit: self.count_limit,
            search_delay: self.search_debounce,
        }
    }
}
