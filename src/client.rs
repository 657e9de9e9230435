use crate::config::ClientConfig;
use crate::events::{ClientEvent, ClientEventReceiver, RequestInfo, SharedEventBroadcaster};
use crate::headers::{add_auth_header, add_json_headers};
use crate::r#trait::SongApi;
use crate::types::{AuthSession, Credentials, Pagination, Song, SongPage, SongUpdate, User};
use crate::validation::{LoginForm, RegisterForm, YoutubeUrl};
use crate::{Result, Top5Error};
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// HTTP implementation of [`SongApi`] for the song service's JSON API.
///
/// # Examples
///
/// ```rust,no_run
/// use top5_client::{ClientConfig, Credentials, SongApi, SongApiClient};
///
/// # tokio_test::block_on(async {
/// let http_client = http_client::native::NativeClient::new();
/// let client = SongApiClient::new(Box::new(http_client), &ClientConfig::default());
///
/// let top = client.top_songs(&Credentials::anonymous()).await?;
/// for (rank, song) in top.iter().enumerate() {
///     println!("{}. {} ({} views)", rank + 1, song.title, song.display_views());
/// }
/// # Ok::<(), top5_client::Top5Error>(())
/// # });
/// ```
#[derive(Clone)]
pub struct SongApiClient {
    client: Arc<dyn HttpClient + Send + Sync>,
    base_url: String,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl SongApiClient {
    pub fn new(client: Box<dyn HttpClient + Send + Sync>, config: &ClientConfig) -> Self {
        Self::with_broadcaster(client, config, Arc::new(SharedEventBroadcaster::new()))
    }

    /// Create a client that reports requests on an existing broadcaster.
    pub fn with_broadcaster(
        client: Box<dyn HttpClient + Send + Sync>,
        config: &ClientConfig,
        broadcaster: Arc<SharedEventBroadcaster>,
    ) -> Self {
        Self {
            client: Arc::from(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            broadcaster,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn subscribe(&self) -> ClientEventReceiver {
        self.broadcaster.subscribe()
    }

    /// Send one request and return the body of a successful response.
    async fn send(
        &self,
        method: Method,
        path: &str,
        credentials: &Credentials,
        body: Option<serde_json::Value>,
    ) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let request_info = RequestInfo::from_url_and_method(&url, &method.to_string());
        let parsed_url =
            Url::parse(&url).map_err(|e| Top5Error::Http(format!("Invalid URL {url}: {e}")))?;

        let mut request = Request::new(method, parsed_url);
        add_json_headers(&mut request);
        add_auth_header(&mut request, credentials);
        if let Some(body) = body {
            request.set_body(body.to_string());
        }

        log::debug!("{}", request_info.short_description());
        self.broadcaster
            .broadcast_event(ClientEvent::RequestStarted {
                request: request_info.clone(),
            });
        let request_start = std::time::Instant::now();

        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| Top5Error::Http(e.to_string()))?;

        let status_code: u16 = response.status().into();
        self.broadcaster
            .broadcast_event(ClientEvent::RequestCompleted {
                request: request_info,
                status_code,
                duration_ms: request_start.elapsed().as_millis() as u64,
            });

        let body = response
            .body_string()
            .await
            .map_err(|e| Top5Error::Http(e.to_string()))?;

        if !(200..300).contains(&status_code) {
            log::debug!("Request to {path} failed with status {status_code}");
            return Err(error_for_status(status_code, &body));
        }
        Ok(body)
    }
}

#[async_trait(?Send)]
impl SongApi for SongApiClient {
    async fn top_songs(&self, credentials: &Credentials) -> Result<Vec<Song>> {
        let body = self
            .send(Method::Get, "/songs/top", credentials, None)
            .await?;
        parse_data(&body)
    }

    async fn songs_page(
        &self,
        credentials: &Credentials,
        page: u32,
        per_page: u32,
    ) -> Result<SongPage> {
        let path = format!("/songs?page={page}&per_page={per_page}");
        let body = self.send(Method::Get, &path, credentials, None).await?;
        parse_song_page(&body)
    }

    async fn pending_songs(&self, credentials: &Credentials) -> Result<Vec<Song>> {
        let body = self
            .send(Method::Get, "/admin/songs/pending", credentials, None)
            .await?;
        parse_data(&body)
    }

    async fn suggest_song(&self, credentials: &Credentials, url: &YoutubeUrl) -> Result<Song> {
        let payload = json!({ "youtube_url": url.as_str() });
        let body = self
            .send(Method::Post, "/songs/suggest", credentials, Some(payload))
            .await?;
        parse_data(&body)
    }

    async fn approve_song(&self, credentials: &Credentials, song_id: &str) -> Result<()> {
        let path = format!("/admin/songs/{}/approve", urlencoding::encode(song_id));
        self.send(Method::Post, &path, credentials, None).await?;
        Ok(())
    }

    async fn reject_song(&self, credentials: &Credentials, song_id: &str) -> Result<()> {
        let path = format!("/admin/songs/{}/reject", urlencoding::encode(song_id));
        self.send(Method::Post, &path, credentials, None).await?;
        Ok(())
    }

    async fn update_song(
        &self,
        credentials: &Credentials,
        song_id: &str,
        changes: &SongUpdate,
    ) -> Result<()> {
        let path = format!("/admin/songs/{}", urlencoding::encode(song_id));
        let payload =
            serde_json::to_value(changes).map_err(|e| Top5Error::Parse(e.to_string()))?;
        self.send(Method::Put, &path, credentials, Some(payload))
            .await?;
        Ok(())
    }

    async fn delete_song(&self, credentials: &Credentials, song_id: &str) -> Result<()> {
        let path = format!("/admin/songs/{}", urlencoding::encode(song_id));
        self.send(Method::Delete, &path, credentials, None).await?;
        Ok(())
    }

    async fn login(&self, form: &LoginForm) -> Result<AuthSession> {
        let payload = json!({ "email": form.email, "password": form.password });
        let body = self
            .send(
                Method::Post,
                "/auth/login",
                &Credentials::anonymous(),
                Some(payload),
            )
            .await?;
        parse_auth_response(&body)
    }

    async fn register(&self, form: &RegisterForm) -> Result<AuthSession> {
        let payload = json!({
            "name": form.name,
            "email": form.email,
            "password": form.password,
            "password_confirmation": form.password,
        });
        let body = self
            .send(
                Method::Post,
                "/auth/register",
                &Credentials::anonymous(),
                Some(payload),
            )
            .await?;
        parse_auth_response(&body)
    }

    async fn logout(&self, credentials: &Credentials) -> Result<()> {
        self.send(Method::Post, "/auth/logout", credentials, None)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Response parsing
// =============================================================================

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct PageEnvelope {
    data: Vec<Song>,
    pagination: Pagination,
}

#[derive(Deserialize)]
struct AuthEnvelope {
    user: User,
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Parse a `{"data": ...}` response.
pub fn parse_data<T: DeserializeOwned>(json: &str) -> Result<T> {
    let envelope: DataEnvelope<T> =
        serde_json::from_str(json).map_err(|e| Top5Error::Parse(e.to_string()))?;
    Ok(envelope.data)
}

/// Parse a paginated `{"data": [...], "pagination": {...}}` response.
pub fn parse_song_page(json: &str) -> Result<SongPage> {
    let envelope: PageEnvelope =
        serde_json::from_str(json).map_err(|e| Top5Error::Parse(e.to_string()))?;
    Ok(SongPage {
        songs: envelope.data,
        pagination: envelope.pagination,
    })
}

/// Parse a login or registration response.
pub fn parse_auth_response(json: &str) -> Result<AuthSession> {
    let envelope: AuthEnvelope =
        serde_json::from_str(json).map_err(|e| Top5Error::Parse(e.to_string()))?;
    Ok(AuthSession::new(envelope.user, envelope.token))
}

/// Map a non-success status and its body to an error.
pub fn error_for_status(status: u16, body: &str) -> Top5Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        401 | 403 => Top5Error::Unauthorized(message),
        404 => Top5Error::NotFound(message),
        409 => Top5Error::Conflict(message),
        _ => Top5Error::Api { status, message },
    }
}
