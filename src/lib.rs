pub mod board;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod mutation;
pub mod pagination;
pub mod projection;
pub mod session;
pub mod session_persistence;
pub mod r#trait;
pub mod types;
pub mod validation;

pub use board::SongBoard;
pub use cache::{Freshness, QueryCache, QueryKey, QueryState, QuerySubscription};
pub use client::SongApiClient;
pub use config::ClientConfig;
pub use error::Top5Error;
pub use events::{ClientEvent, ClientEventReceiver, RequestInfo, SharedEventBroadcaster};
pub use mutation::{Mutation, MutationKind, MutationOutcome};
pub use pagination::{PageItem, PaginationController, Viewport};
pub use projection::{DashboardStats, QueryData, View};
pub use r#trait::SongApi;
pub use session::SessionContext;
pub use session_persistence::SessionPersistence;
pub use types::{AuthSession, Credentials, Pagination, Song, SongPage, SongStatus, SongUpdate, User};
pub use validation::{LoginForm, RegisterForm, YoutubeUrl};

#[cfg(feature = "mock")]
pub use r#trait::MockSongApi;

pub type Result<T> = std::result::Result<T, Top5Error>;
