//! Read-only views over cached song queries.
//!
//! Every projection is a pure function of one [`QueryState`]; none of them
//! touch the cache. Two views of the same song (say, pending and admin) may
//! disagree while their refetches are in flight and converge once both land.

use crate::cache::{Freshness, QueryState};
use crate::error::Top5Error;
use crate::types::{Song, SongPage, SongStatus};

/// Number of entries shown in the top list.
pub const TOP_SONGS_LIMIT: usize = 5;

/// Values stored in the song query cache.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    /// Unpaginated lists (top songs, pending songs)
    Songs(Vec<Song>),
    /// Paginated listings (public pages, admin listing)
    Page(SongPage),
}

impl QueryData {
    pub fn as_songs(&self) -> Option<&[Song]> {
        match self {
            QueryData::Songs(songs) => Some(songs),
            QueryData::Page(_) => None,
        }
    }

    pub fn as_page(&self) -> Option<&SongPage> {
        match self {
            QueryData::Page(page) => Some(page),
            QueryData::Songs(_) => None,
        }
    }
}

/// What a screen renders for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct View<T> {
    pub data: Option<T>,
    pub freshness: Freshness,
    pub error: Option<Top5Error>,
}

impl<T> View<T> {
    fn from_state(state: &QueryState<QueryData>, data: Option<T>) -> Self {
        Self {
            data,
            freshness: state.freshness,
            error: state.error.clone(),
        }
    }

    /// Nothing to show yet and a fetch is running.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.freshness == Freshness::Fetching
    }

    /// A refetch is running behind data that is already displayed.
    pub fn is_refreshing(&self) -> bool {
        self.data.is_some() && self.freshness == Freshness::Fetching
    }
}

/// Songs awaiting review, in the order the service returned them.
pub fn pending(state: &QueryState<QueryData>) -> View<Vec<Song>> {
    let data = state
        .data
        .as_ref()
        .and_then(QueryData::as_songs)
        .map(<[Song]>::to_vec);
    View::from_state(state, data)
}

/// The public top list. The service ranks it; this only caps its length.
pub fn top_five(state: &QueryState<QueryData>) -> View<Vec<Song>> {
    let data = state
        .data
        .as_ref()
        .and_then(QueryData::as_songs)
        .map(|songs| songs.iter().take(TOP_SONGS_LIMIT).cloned().collect());
    View::from_state(state, data)
}

/// One page of the full listing with its pagination metadata.
pub fn paginated_all(state: &QueryState<QueryData>) -> View<SongPage> {
    let data = state.data.as_ref().and_then(QueryData::as_page).cloned();
    View::from_state(state, data)
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub pending: usize,
    /// Total songs known to the service
    pub total: u64,
    /// Approved songs within the admin listing
    pub approved: usize,
}

impl DashboardStats {
    pub fn from_views(pending: &View<Vec<Song>>, admin: &View<SongPage>) -> Self {
        let (total, approved) = admin
            .data
            .as_ref()
            .map(|page| {
                let approved = page
                    .songs
                    .iter()
                    .filter(|song| song.status == SongStatus::Approved)
                    .count();
                (page.pagination.total, approved)
            })
            .unwrap_or_default();

        Self {
            pending: pending.data.as_ref().map_or(0, Vec::len),
            total,
            approved,
        }
    }
}
