use crate::pagination::DEFAULT_PER_PAGE;
use crate::{Result, Top5Error};
use std::env;

/// Base URL used when `TOP5_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Page size of the administrator's song listing.
pub const DEFAULT_ADMIN_PER_PAGE: u32 = 50;

/// Connection and paging settings for [`SongBoard`](crate::SongBoard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the song service API, without a trailing slash
    pub base_url: String,
    /// Page size of the public listing
    pub per_page: u32,
    /// Page size of the admin listing
    pub admin_per_page: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            admin_per_page: DEFAULT_ADMIN_PER_PAGE,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `TOP5_API_URL`, `TOP5_PER_PAGE` and `TOP5_ADMIN_PER_PAGE`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = env::var("TOP5_API_URL") {
            config = config.with_base_url(&url);
        }
        if let Some(per_page) = read_page_size("TOP5_PER_PAGE")? {
            config.per_page = per_page;
        }
        if let Some(per_page) = read_page_size("TOP5_ADMIN_PER_PAGE")? {
            config.admin_per_page = per_page;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

fn read_page_size(var: &str) -> Result<Option<u32>> {
    match env::var(var) {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(size) if size > 0 => Ok(Some(size)),
            _ => Err(Top5Error::Validation(format!(
                "{var} must be a positive integer, got {value:?}"
            ))),
        },
        Err(_) => Ok(None),
    }
}
