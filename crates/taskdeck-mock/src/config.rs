use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub seed: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()?,
            seed: env::var("TASKDECK_MOCK_SEED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,
        })
    }
}
