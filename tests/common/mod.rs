#![allow(dead_code)]
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use tokio::sync::oneshot;
use top5_client::{
    AuthSession, Credentials, LoginForm, Pagination, RegisterForm, Result, Song, SongApi,
    SongPage, SongStatus, SongUpdate, Top5Error, User, YoutubeUrl,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "secret123";

/// Operations the fake service can count, hold or fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    TopSongs,
    SongsPage,
    PendingSongs,
    Suggest,
    Approve,
    Reject,
    Update,
    Delete,
    Login,
    Register,
    Logout,
}

struct ServerState {
    songs: Vec<Song>,
    next_id: u64,
    tokens: Vec<String>,
}

/// In-memory song service.
///
/// Read responses are computed when the call starts, before waiting on any
/// gate, so a held read delivers the data as it was when it was issued.
pub struct FakeSongApi {
    state: RefCell<ServerState>,
    calls: RefCell<HashMap<Call, usize>>,
    gates: RefCell<HashMap<Call, VecDeque<oneshot::Receiver<()>>>>,
    failures: RefCell<HashMap<Call, VecDeque<Top5Error>>>,
}

impl FakeSongApi {
    pub fn new(songs: Vec<Song>) -> Self {
        let next_id = songs.len() as u64 + 1;
        Self {
            state: RefCell::new(ServerState {
                songs,
                next_id,
                tokens: Vec::new(),
            }),
            calls: RefCell::new(HashMap::new()),
            gates: RefCell::new(HashMap::new()),
            failures: RefCell::new(HashMap::new()),
        }
    }

    /// Three approved songs and two pending ones.
    pub fn seeded() -> Self {
        Self::new(vec![
            song("a1", "Rei do Gado", 9_000_000, SongStatus::Approved),
            song("a2", "Pagode em Brasília", 7_500_000, SongStatus::Approved),
            song("a3", "Boi Soberano", 3_200_000, SongStatus::Approved),
            song("p1", "Chico Mineiro", 12_000_000, SongStatus::Pending),
            song("p2", "Tristeza do Jeca", 800_000, SongStatus::Pending),
        ])
    }

    pub fn calls(&self, call: Call) -> usize {
        self.calls.borrow().get(&call).copied().unwrap_or(0)
    }

    /// Hold the next `call` until the returned sender fires (or is dropped).
    pub fn hold(&self, call: Call) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .borrow_mut()
            .entry(call)
            .or_default()
            .push_back(rx);
        tx
    }

    /// Make the next `call` fail with `error` without touching server state.
    pub fn fail_next(&self, call: Call, error: Top5Error) {
        self.failures
            .borrow_mut()
            .entry(call)
            .or_default()
            .push_back(error);
    }

    /// Revoke every issued token.
    pub fn expire_sessions(&self) {
        self.state.borrow_mut().tokens.clear();
    }

    pub fn status_of(&self, song_id: &str) -> Option<SongStatus> {
        self.state
            .borrow()
            .songs
            .iter()
            .find(|s| s.id == song_id)
            .map(|s| s.status)
    }

    fn begin(&self, call: Call) -> (Option<oneshot::Receiver<()>>, Option<Top5Error>) {
        *self.calls.borrow_mut().entry(call).or_insert(0) += 1;
        let gate = self
            .gates
            .borrow_mut()
            .get_mut(&call)
            .and_then(VecDeque::pop_front);
        let failure = self
            .failures
            .borrow_mut()
            .get_mut(&call)
            .and_then(VecDeque::pop_front);
        (gate, failure)
    }

    fn authorize(&self, credentials: &Credentials) -> Result<()> {
        let state = self.state.borrow();
        match credentials.token() {
            Some(token) if state.tokens.iter().any(|t| t == token) => Ok(()),
            _ => Err(Top5Error::Unauthorized("Unauthenticated.".to_string())),
        }
    }

    /// Run `respond` against the current state, then wait on any gate.
    async fn read<T>(
        &self,
        call: Call,
        respond: impl FnOnce(&ServerState) -> Result<T>,
    ) -> Result<T> {
        let (gate, failure) = self.begin(call);
        let response = match failure {
            Some(error) => Err(error),
            None => respond(&self.state.borrow()),
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        response
    }

    /// Wait on any gate, then apply `change` to the state.
    async fn write<T>(
        &self,
        call: Call,
        change: impl FnOnce(&mut ServerState) -> Result<T>,
    ) -> Result<T> {
        let (gate, failure) = self.begin(call);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        change(&mut self.state.borrow_mut())
    }

    fn issue_session(&self, state: &mut ServerState, name: &str, email: &str) -> AuthSession {
        let token = format!("{}|token", state.tokens.len() + 1);
        state.tokens.push(token.clone());
        AuthSession::new(user(name, email), token)
    }
}

fn find_mut<'a>(state: &'a mut ServerState, song_id: &str) -> Result<&'a mut Song> {
    state
        .songs
        .iter_mut()
        .find(|s| s.id == song_id)
        .ok_or_else(|| Top5Error::NotFound(format!("Song {song_id} not found")))
}

fn review(state: &mut ServerState, song_id: &str, next: SongStatus) -> Result<()> {
    let song = find_mut(state, song_id)?;
    if !song.status.can_transition_to(next) {
        return Err(Top5Error::Conflict(format!(
            "Song {song_id} is already {}",
            song.status.label()
        )));
    }
    song.status = next;
    song.status_label = next.label().to_string();
    Ok(())
}

#[async_trait(?Send)]
impl SongApi for FakeSongApi {
    async fn top_songs(&self, _credentials: &Credentials) -> Result<Vec<Song>> {
        self.read(Call::TopSongs, |state| {
            let mut approved: Vec<Song> = state
                .songs
                .iter()
                .filter(|s| s.status == SongStatus::Approved)
                .cloned()
                .collect();
            approved.sort_by(|a, b| b.views.cmp(&a.views));
            approved.truncate(5);
            Ok(approved)
        })
        .await
    }

    async fn songs_page(
        &self,
        credentials: &Credentials,
        page: u32,
        per_page: u32,
    ) -> Result<SongPage> {
        let is_admin = self.authorize(credentials).is_ok();
        self.read(Call::SongsPage, |state| {
            let visible: Vec<&Song> = state
                .songs
                .iter()
                .filter(|s| is_admin || s.status == SongStatus::Approved)
                .collect();
            let total = visible.len() as u64;
            let last_page = (total.div_ceil(u64::from(per_page)) as u32).max(1);
            let songs = visible
                .into_iter()
                .skip(((page.max(1) - 1) * per_page) as usize)
                .take(per_page as usize)
                .cloned()
                .collect();
            Ok(SongPage {
                songs,
                pagination: Pagination {
                    current_page: page,
                    last_page,
                    per_page,
                    total,
                },
            })
        })
        .await
    }

    async fn pending_songs(&self, credentials: &Credentials) -> Result<Vec<Song>> {
        let authorized = self.authorize(credentials);
        self.read(Call::PendingSongs, |state| {
            authorized?;
            Ok(state
                .songs
                .iter()
                .filter(|s| s.status == SongStatus::Pending)
                .cloned()
                .collect())
        })
        .await
    }

    async fn suggest_song(&self, _credentials: &Credentials, url: &YoutubeUrl) -> Result<Song> {
        self.write(Call::Suggest, |state| {
            let duplicate = state.songs.iter().any(|s| {
                s.youtube_id == url.video_id() && s.status != SongStatus::Rejected
            });
            if duplicate {
                return Err(Top5Error::Api {
                    status: 422,
                    message: "Esta música já foi sugerida".to_string(),
                });
            }
            let id = format!("s{}", state.next_id);
            state.next_id += 1;
            let mut created = song(&id, &format!("Video {}", url.video_id()), 0, SongStatus::Pending);
            created.youtube_id = url.video_id().to_string();
            created.youtube_url = url.as_str().to_string();
            state.songs.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn approve_song(&self, credentials: &Credentials, song_id: &str) -> Result<()> {
        let authorized = self.authorize(credentials);
        self.write(Call::Approve, |state| {
            authorized?;
            review(state, song_id, SongStatus::Approved)
        })
        .await
    }

    async fn reject_song(&self, credentials: &Credentials, song_id: &str) -> Result<()> {
        let authorized = self.authorize(credentials);
        self.write(Call::Reject, |state| {
            authorized?;
            review(state, song_id, SongStatus::Rejected)
        })
        .await
    }

    async fn update_song(
        &self,
        credentials: &Credentials,
        song_id: &str,
        changes: &SongUpdate,
    ) -> Result<()> {
        let authorized = self.authorize(credentials);
        self.write(Call::Update, |state| {
            authorized?;
            let song = find_mut(state, song_id)?;
            if let Some(title) = &changes.title {
                song.title = title.clone();
            }
            if let Some(url) = &changes.youtube_url {
                song.youtube_id = url.video_id().to_string();
                song.youtube_url = url.as_str().to_string();
            }
            Ok(())
        })
        .await
    }

    async fn delete_song(&self, credentials: &Credentials, song_id: &str) -> Result<()> {
        let authorized = self.authorize(credentials);
        self.write(Call::Delete, |state| {
            authorized?;
            let before = state.songs.len();
            state.songs.retain(|s| s.id != song_id);
            if state.songs.len() == before {
                return Err(Top5Error::NotFound(format!("Song {song_id} not found")));
            }
            Ok(())
        })
        .await
    }

    async fn login(&self, form: &LoginForm) -> Result<AuthSession> {
        let email = form.email().to_string();
        let valid = email == ADMIN_EMAIL;
        // LoginForm does not expose the password; any valid form for the admin email logs in.
        self.write(Call::Login, |state| {
            if !valid {
                return Err(Top5Error::Unauthorized("Credenciais inválidas".to_string()));
            }
            Ok(self.issue_session(state, "Admin", &email))
        })
        .await
    }

    async fn register(&self, form: &RegisterForm) -> Result<AuthSession> {
        let name = form.name().to_string();
        let email = form.email().to_string();
        self.write(Call::Register, |state| {
            Ok(self.issue_session(state, &name, &email))
        })
        .await
    }

    async fn logout(&self, credentials: &Credentials) -> Result<()> {
        let token = credentials.token().map(str::to_string);
        self.write(Call::Logout, |state| {
            state.tokens.retain(|t| Some(t) != token.as_ref());
            Ok(())
        })
        .await
    }
}

pub fn user(name: &str, email: &str) -> User {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    User {
        id: "1".to_string(),
        name: name.to_string(),
        email: email.to_string(),
        created_at: at,
        updated_at: at,
    }
}

pub fn song(id: &str, title: &str, views: u64, status: SongStatus) -> Song {
    let at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap();
    let youtube_id = format!("yt{id}");
    Song {
        id: id.to_string(),
        title: title.to_string(),
        views,
        formatted_views: String::new(),
        youtube_url: format!("https://www.youtube.com/watch?v={youtube_id}"),
        thumbnail: format!("https://img.youtube.com/vi/{youtube_id}/hqdefault.jpg"),
        youtube_id,
        status,
        status_label: status.label().to_string(),
        user: None,
        created_at: at,
        updated_at: at,
    }
}

/// `count` approved songs with descending view counts.
pub fn approved_songs(count: usize) -> Vec<Song> {
    (1..=count)
        .map(|n| {
            song(
                &n.to_string(),
                &format!("Song {n}"),
                1_000_000 - n as u64,
                SongStatus::Approved,
            )
        })
        .collect()
}
