//! Local input validation.
//!
//! Every value that reaches the mutation executor or the login flow goes
//! through one of these constructors first, so malformed input is rejected
//! with [`Top5Error::Validation`] before any request is made.

use crate::{Result, Top5Error};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_REGISTER_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;

fn youtube_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]+)")
            .unwrap()
    })
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

/// A YouTube video link that passed validation.
///
/// Accepts `youtube.com/watch?v=`, `youtu.be/` and `youtube.com/embed/`
/// links over http or https, with or without `www.`.
///
/// # Examples
///
/// ```rust
/// use top5_client::YoutubeUrl;
///
/// let url = YoutubeUrl::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
/// assert_eq!(url.video_id(), "dQw4w9WgXcQ");
///
/// assert!(YoutubeUrl::parse("https://vimeo.com/123456").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YoutubeUrl {
    url: String,
    video_id: String,
}

impl YoutubeUrl {
    pub fn parse(input: &str) -> Result<Self> {
        let url = input.trim();
        if url.is_empty() {
            return Err(Top5Error::Validation("YouTube URL is required".to_string()));
        }

        let captures = youtube_pattern()
            .captures(url)
            .ok_or_else(|| Top5Error::Validation(format!("Not a YouTube URL: {url}")))?;

        Ok(Self {
            url: url.to_string(),
            video_id: captures[1].to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

impl fmt::Display for YoutubeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl TryFrom<String> for YoutubeUrl {
    type Error = Top5Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<YoutubeUrl> for String {
    fn from(value: YoutubeUrl) -> Self {
        value.url
    }
}

/// Trim a song title and reject it if nothing is left.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Top5Error::Validation("Title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_email(email: &str) -> Result<String> {
    let trimmed = email.trim();
    if !email_pattern().is_match(trimmed) {
        return Err(Top5Error::Validation(format!("Invalid email: {trimmed}")));
    }
    Ok(trimmed.to_string())
}

/// Validated login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub(crate) email: String,
    pub(crate) password: String,
}

impl LoginForm {
    pub fn new(email: &str, password: &str) -> Result<Self> {
        let email = validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Top5Error::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(Self {
            email,
            password: password.to_string(),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated registration form.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterForm {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl RegisterForm {
    pub fn new(name: &str, email: &str, password: &str, confirmation: &str) -> Result<Self> {
        let name = name.trim();
        if name.chars().count() < MIN_NAME_LEN {
            return Err(Top5Error::Validation(format!(
                "Name must be at least {MIN_NAME_LEN} characters"
            )));
        }
        let email = validate_email(email)?;
        if password.chars().count() < MIN_REGISTER_PASSWORD_LEN {
            return Err(Top5Error::Validation(format!(
                "Password must be at least {MIN_REGISTER_PASSWORD_LEN} characters"
            )));
        }
        if password != confirmation {
            return Err(Top5Error::Validation("Passwords do not match".to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            email,
            password: password.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
