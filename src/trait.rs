use crate::types::{AuthSession, Credentials, Song, SongPage, SongUpdate};
use crate::validation::{LoginForm, RegisterForm, YoutubeUrl};
use crate::Result;
use async_trait::async_trait;

/// Trait for song service operations that can be mocked for testing.
///
/// This trait abstracts the remote song service so the cache and mutation
/// layers can run against the HTTP client, an in-memory fake, or a mock.
/// Every method receives the credentials to attach to the request.
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockSongApi`
/// that implements this trait using the `mockall` library.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait SongApi {
    /// Fetch the public top list, already ranked by the service.
    async fn top_songs(&self, credentials: &Credentials) -> Result<Vec<Song>>;

    /// Fetch one page of the full song listing.
    async fn songs_page(
        &self,
        credentials: &Credentials,
        page: u32,
        per_page: u32,
    ) -> Result<SongPage>;

    /// Fetch the songs waiting for review.
    async fn pending_songs(&self, credentials: &Credentials) -> Result<Vec<Song>>;

    /// Suggest a new song. The created song starts as pending.
    async fn suggest_song(&self, credentials: &Credentials, url: &YoutubeUrl) -> Result<Song>;

    async fn approve_song(&self, credentials: &Credentials, song_id: &str) -> Result<()>;

    async fn reject_song(&self, credentials: &Credentials, song_id: &str) -> Result<()>;

    /// Change the title and/or link of an existing song.
    async fn update_song(
        &self,
        credentials: &Credentials,
        song_id: &str,
        changes: &SongUpdate,
    ) -> Result<()>;

    async fn delete_song(&self, credentials: &Credentials, song_id: &str) -> Result<()>;

    /// Exchange email and password for an authenticated session.
    async fn login(&self, form: &LoginForm) -> Result<AuthSession>;

    /// Create an account and return its authenticated session.
    async fn register(&self, form: &RegisterForm) -> Result<AuthSession>;

    /// Revoke the token on the service side.
    async fn logout(&self, credentials: &Credentials) -> Result<()>;
}
