//! Data types for songs, users and sessions.
//!
//! This module contains the core data structures exchanged with the song
//! service: songs and their review status, paginated song listings, user
//! accounts and the authenticated session.

use crate::validation::YoutubeUrl;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ================================================================================================
// SONGS
// ================================================================================================

/// Review status of a suggested song.
///
/// Songs start as [`SongStatus::Pending`] when suggested. Administrators move
/// them to [`SongStatus::Approved`] or [`SongStatus::Rejected`]; nothing moves
/// a song back out of those states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongStatus {
    Pending,
    Approved,
    Rejected,
}

impl SongStatus {
    /// Whether the review flow allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: SongStatus) -> bool {
        matches!(
            (self, next),
            (SongStatus::Pending, SongStatus::Approved) | (SongStatus::Pending, SongStatus::Rejected)
        )
    }

    /// Display label used when the service did not send one.
    pub fn label(self) -> &'static str {
        match self {
            SongStatus::Pending => "Pendente",
            SongStatus::Approved => "Aprovada",
            SongStatus::Rejected => "Rejeitada",
        }
    }
}

impl fmt::Display for SongStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SongStatus::Pending => "pending",
            SongStatus::Approved => "approved",
            SongStatus::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// A user account, attached to songs as the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A suggested YouTube song.
///
/// # Examples
///
/// ```rust
/// use top5_client::{Song, SongStatus};
///
/// let json = r#"{
///     "id": "42",
///     "title": "Rio de Lágrimas",
///     "views": 1234567,
///     "formatted_views": "",
///     "youtube_id": "abc123",
///     "youtube_url": "https://www.youtube.com/watch?v=abc123",
///     "thumbnail": "https://img.youtube.com/vi/abc123/hqdefault.jpg",
///     "status": "approved",
///     "status_label": "",
///     "created_at": "2024-05-01T12:00:00Z",
///     "updated_at": "2024-05-01T12:00:00Z"
/// }"#;
///
/// let song: Song = serde_json::from_str(json).unwrap();
/// assert_eq!(song.status, SongStatus::Approved);
/// assert_eq!(song.display_views(), "1.234.567");
/// assert_eq!(song.display_status(), "Aprovada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Opaque, stable identifier assigned by the service
    pub id: String,
    pub title: String,
    /// View count reported by YouTube
    pub views: u64,
    /// Locale-formatted view count, as rendered by the service
    #[serde(default)]
    pub formatted_views: String,
    pub youtube_id: String,
    pub youtube_url: String,
    /// Thumbnail image URL
    pub thumbnail: String,
    pub status: SongStatus,
    #[serde(default)]
    pub status_label: String,
    /// The user who suggested the song, when known
    #[serde(default)]
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Song {
    /// View count for display, falling back to a dotted thousands format.
    pub fn display_views(&self) -> String {
        if !self.formatted_views.is_empty() {
            return self.formatted_views.clone();
        }
        group_thousands(self.views)
    }

    /// Status label for display, falling back to [`SongStatus::label`].
    pub fn display_status(&self) -> &str {
        if self.status_label.is_empty() {
            self.status.label()
        } else {
            &self.status_label
        }
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.title, self.status)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// Pagination metadata returned with every song listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub current_page: u32,
    /// Last available page number
    pub last_page: u32,
    pub per_page: u32,
    /// Total number of songs across all pages
    pub total: u64,
}

/// One page of the full song listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPage {
    pub songs: Vec<Song>,
    pub pagination: Pagination,
}

impl SongPage {
    pub fn contains(&self, song_id: &str) -> bool {
        self.songs.iter().any(|song| song.id == song_id)
    }

    pub fn find(&self, song_id: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == song_id)
    }
}

/// Fields an administrator may change on an existing song.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SongUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<YoutubeUrl>,
}

impl SongUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.youtube_url.is_none()
    }
}

// ================================================================================================
// SESSION STATE
// ================================================================================================

/// Authenticated session returned by login or registration.
///
/// This is everything needed to resume an authenticated session without
/// logging in again, and is what gets persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// The authenticated user
    pub user: User,
    /// Bearer token for authenticated requests
    pub token: String,
}

impl AuthSession {
    pub fn new(user: User, token: String) -> Self {
        Self { user, token }
    }

    /// Serialize session to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize session from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Snapshot of the credential attached to an outgoing request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.token.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials").field("token", &token).finish()
    }
}

// ================================================================================================
// TESTS
// ================================================================================================
