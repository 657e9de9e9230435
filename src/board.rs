use crate::cache::{Fetcher, QueryCache, QueryKey, QueryState, QuerySubscription};
use crate::config::ClientConfig;
use crate::events::{ClientEventReceiver, SharedEventBroadcaster};
use crate::mutation::{Mutation, MutationExecutor, MutationOutcome};
use crate::pagination::PaginationController;
use crate::projection::{self, DashboardStats, QueryData, View};
use crate::r#trait::SongApi;
use crate::session::SessionContext;
use crate::types::{Song, SongPage, User};
use crate::validation::{LoginForm, RegisterForm};
use crate::{Result, Top5Error};
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Entry point for screens: cached song queries, mutations and the session.
///
/// Reads go through a [`QueryCache`] keyed by [`QueryKey`]; writes go through
/// a [`MutationExecutor`] that invalidates the affected keys once the service
/// confirms them. Everything runs on one thread, so the board must be driven
/// from inside a [`tokio::task::LocalSet`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::rc::Rc;
/// use top5_client::{ClientConfig, SongApiClient, SongBoard};
///
/// # async fn run() -> top5_client::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let http_client = http_client::native::NativeClient::new();
/// let api = SongApiClient::new(Box::new(http_client), &config);
/// let board = SongBoard::new(Rc::new(api), config);
///
/// board.login("admin@example.com", "secret123").await?;
/// for song in board.pending().await? {
///     board.approve(&song.id).await?;
/// }
/// board.settle().await;
/// # Ok(())
/// # }
/// ```
pub struct SongBoard {
    api: Rc<dyn SongApi>,
    cache: QueryCache<QueryData>,
    session: SessionContext,
    executor: MutationExecutor,
    pages: RefCell<PaginationController>,
    config: ClientConfig,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl SongBoard {
    /// A board with an in-memory, unauthenticated session.
    pub fn new(api: Rc<dyn SongApi>, config: ClientConfig) -> Self {
        let broadcaster = Arc::new(SharedEventBroadcaster::new());
        let session = SessionContext::new(broadcaster.clone());
        Self::with_session(api, config, session, broadcaster)
    }

    pub fn with_session(
        api: Rc<dyn SongApi>,
        config: ClientConfig,
        session: SessionContext,
        broadcaster: Arc<SharedEventBroadcaster>,
    ) -> Self {
        let cache = QueryCache::with_broadcaster(broadcaster.clone());
        let executor = MutationExecutor::new(
            Rc::clone(&api),
            cache.clone(),
            session.clone(),
            broadcaster.clone(),
        );
        Self {
            api,
            cache,
            session,
            executor,
            pages: RefCell::new(PaginationController::new(config.per_page)),
            config,
            broadcaster,
        }
    }

    pub fn cache(&self) -> &QueryCache<QueryData> {
        &self.cache
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn subscribe(&self) -> ClientEventReceiver {
        self.broadcaster.subscribe()
    }

    /// Observe `key`; it is refetched in the background whenever it goes stale.
    pub fn observe(&self, key: QueryKey) -> QuerySubscription<QueryData> {
        self.cache.observe(key, self.fetcher_for(key))
    }

    /// Force a refetch of `key`, superseding any fetch already running.
    pub async fn refresh(&self, key: QueryKey) -> Result<()> {
        self.cache.refetch(key, self.fetcher_for(key)).await?;
        Ok(())
    }

    /// Wait for every in-flight fetch, including background refetches.
    pub async fn settle(&self) {
        self.cache.settle().await;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The public top list, at most five songs.
    pub async fn top_five(&self) -> Result<Vec<Song>> {
        self.load(QueryKey::TopSongs).await?;
        Ok(self.top_five_view().data.unwrap_or_default())
    }

    pub fn top_five_view(&self) -> View<Vec<Song>> {
        projection::top_five(&self.snapshot(QueryKey::TopSongs))
    }

    /// Songs awaiting review. Requires an authenticated session.
    pub async fn pending(&self) -> Result<Vec<Song>> {
        self.load(QueryKey::PendingSongs).await?;
        Ok(self.pending_view().data.unwrap_or_default())
    }

    pub fn pending_view(&self) -> View<Vec<Song>> {
        projection::pending(&self.snapshot(QueryKey::PendingSongs))
    }

    /// The administrator's listing of every song.
    pub async fn admin_songs(&self) -> Result<SongPage> {
        self.load(QueryKey::AdminSongs).await?;
        self.admin_songs_view()
            .data
            .ok_or_else(|| Top5Error::Parse("admin listing missing from cache".to_string()))
    }

    pub fn admin_songs_view(&self) -> View<SongPage> {
        projection::paginated_all(&self.snapshot(QueryKey::AdminSongs))
    }

    /// The current page of the public listing.
    ///
    /// A page that is already cached and fresh is served without a request.
    pub async fn songs_page(&self) -> Result<SongPage> {
        let key = self.pages.borrow().key();
        self.load(key).await?;
        let page = projection::paginated_all(&self.snapshot(key))
            .data
            .ok_or_else(|| Top5Error::Parse(format!("{key} missing from cache")))?;
        self.pages.borrow_mut().apply(&page.pagination);
        Ok(page)
    }

    /// Move the public listing to `page` (clamped to the known range) and load it.
    pub async fn go_to_page(&self, page: u32) -> Result<SongPage> {
        let target = self.pages.borrow_mut().go_to(page);
        log::debug!("Moving to page {target}");
        let loaded = self.songs_page().await?;

        // The first load of a listing is the first time its last page is known.
        let clamped = self.pages.borrow_mut().go_to(page);
        if clamped != target {
            return self.songs_page().await;
        }
        Ok(loaded)
    }

    /// Snapshot of the public listing's paging state.
    pub fn pagination(&self) -> PaginationController {
        self.pages.borrow().clone()
    }

    /// Counts for the administrator's dashboard.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        futures::try_join!(
            self.load(QueryKey::PendingSongs),
            self.load(QueryKey::AdminSongs)
        )?;
        Ok(DashboardStats::from_views(
            &self.pending_view(),
            &self.admin_songs_view(),
        ))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Suggest a song by its YouTube link. The new song starts out pending.
    pub async fn suggest(&self, youtube_url: &str) -> Result<Song> {
        match self.executor.execute(Mutation::suggest(youtube_url)?).await? {
            MutationOutcome::Suggested(song) => Ok(song),
            MutationOutcome::Completed => Err(Top5Error::Parse(
                "suggestion did not return the created song".to_string(),
            )),
        }
    }

    pub async fn approve(&self, song_id: &str) -> Result<()> {
        self.executor.execute(Mutation::approve(song_id)?).await?;
        Ok(())
    }

    pub async fn reject(&self, song_id: &str) -> Result<()> {
        self.executor.execute(Mutation::reject(song_id)?).await?;
        Ok(())
    }

    /// Change a song's title and/or YouTube link.
    pub async fn update(
        &self,
        song_id: &str,
        title: Option<&str>,
        youtube_url: Option<&str>,
    ) -> Result<()> {
        self.executor
            .execute(Mutation::update(song_id, title, youtube_url)?)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, song_id: &str) -> Result<()> {
        self.executor.execute(Mutation::delete(song_id)?).await?;
        Ok(())
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let form = LoginForm::new(email, password)?;
        let session = self.api.login(&form).await?;
        let user = session.user.clone();
        self.session.establish(session)?;
        log::info!("Logged in as {}", user.email);
        Ok(user)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<User> {
        let form = RegisterForm::new(name, email, password, confirmation)?;
        let session = self.api.register(&form).await?;
        let user = session.user.clone();
        self.session.establish(session)?;
        log::info!("Registered {}", user.email);
        Ok(user)
    }

    /// Revoke the token and clear the session.
    ///
    /// The local session is cleared even when the service call fails; a
    /// rejected credential counts as already logged out.
    pub async fn logout(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            return Ok(());
        }
        let result = self.api.logout(&self.session.credentials()).await;
        self.session.clear();
        match result {
            Err(e) if !e.requires_reauthentication() => Err(e),
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn load(&self, key: QueryKey) -> Result<()> {
        self.cache.get_or_fetch(key, self.fetcher_for(key)).await?;
        Ok(())
    }

    fn snapshot(&self, key: QueryKey) -> QueryState<QueryData> {
        self.cache.state(key).unwrap_or_else(QueryState::empty)
    }

    /// Build the fetcher for `key`. Credentials are read when the fetch starts.
    fn fetcher_for(&self, key: QueryKey) -> Fetcher<QueryData> {
        let api = Rc::clone(&self.api);
        let session = self.session.clone();
        let admin_per_page = self.config.admin_per_page;

        Rc::new(move || {
            let api = Rc::clone(&api);
            let session = session.clone();
            async move {
                let credentials = session.credentials();
                let result = match key {
                    QueryKey::TopSongs => api.top_songs(&credentials).await.map(QueryData::Songs),
                    QueryKey::Songs { page, per_page } => api
                        .songs_page(&credentials, page, per_page)
                        .await
                        .map(QueryData::Page),
                    QueryKey::PendingSongs => {
                        api.pending_songs(&credentials).await.map(QueryData::Songs)
                    }
                    QueryKey::AdminSongs => api
                        .songs_page(&credentials, 1, admin_per_page)
                        .await
                        .map(QueryData::Page),
                };
                if let Err(e) = &result {
                    if e.requires_reauthentication() {
                        log::warn!("{key}: credential rejected, clearing session");
                        session.clear();
                    }
                }
                result
            }
            .boxed_local()
        })
    }
}
