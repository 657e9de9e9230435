//! Mutations and the invalidation each one triggers. The executor applies
//! [`Mutation::invalidates`] after a successful call and never otherwise.

use crate::cache::{QueryCache, QueryKey};
use crate::events::{ClientEvent, SharedEventBroadcaster};
use crate::projection::QueryData;
use crate::r#trait::SongApi;
use crate::session::SessionContext;
use crate::types::{Song, SongUpdate};
use crate::validation::{validate_title, YoutubeUrl};
use crate::{Result, Top5Error};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

const SUGGEST_INVALIDATES: &[QueryKey] = &[QueryKey::PendingSongs, QueryKey::AdminSongs];
const APPROVE_INVALIDATES: &[QueryKey] = &[
    QueryKey::PendingSongs,
    QueryKey::AdminSongs,
    QueryKey::TopSongs,
];
const REJECT_INVALIDATES: &[QueryKey] = &[QueryKey::PendingSongs, QueryKey::AdminSongs];
const UPDATE_INVALIDATES: &[QueryKey] = &[QueryKey::AdminSongs, QueryKey::TopSongs];
// A deleted song may still be pending, so the pending list is refreshed too.
const DELETE_INVALIDATES: &[QueryKey] = &[
    QueryKey::PendingSongs,
    QueryKey::AdminSongs,
    QueryKey::TopSongs,
];

/// The kind of a mutation, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Suggest,
    Approve,
    Reject,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::Suggest => "suggest",
            MutationKind::Approve => "approve",
            MutationKind::Reject => "reject",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A validated side-effecting operation against the song service.
///
/// Construct through [`Mutation::suggest`], [`Mutation::update`] and friends;
/// they reject malformed input, so an invalid mutation cannot be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Suggest { url: YoutubeUrl },
    Approve { song_id: String },
    Reject { song_id: String },
    Update { song_id: String, changes: SongUpdate },
    Delete { song_id: String },
}

impl Mutation {
    pub fn suggest(youtube_url: &str) -> Result<Self> {
        Ok(Mutation::Suggest {
            url: YoutubeUrl::parse(youtube_url)?,
        })
    }

    pub fn approve(song_id: &str) -> Result<Self> {
        Ok(Mutation::Approve {
            song_id: validate_song_id(song_id)?,
        })
    }

    pub fn reject(song_id: &str) -> Result<Self> {
        Ok(Mutation::Reject {
            song_id: validate_song_id(song_id)?,
        })
    }

    /// Edit a song's title and/or link. At least one must be given.
    pub fn update(song_id: &str, title: Option<&str>, youtube_url: Option<&str>) -> Result<Self> {
        let changes = SongUpdate {
            title: title.map(validate_title).transpose()?,
            youtube_url: youtube_url.map(YoutubeUrl::parse).transpose()?,
        };
        if changes.is_empty() {
            return Err(Top5Error::Validation(
                "Nothing to update: provide a title or a YouTube URL".to_string(),
            ));
        }
        Ok(Mutation::Update {
            song_id: validate_song_id(song_id)?,
            changes,
        })
    }

    pub fn delete(song_id: &str) -> Result<Self> {
        Ok(Mutation::Delete {
            song_id: validate_song_id(song_id)?,
        })
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Suggest { .. } => MutationKind::Suggest,
            Mutation::Approve { .. } => MutationKind::Approve,
            Mutation::Reject { .. } => MutationKind::Reject,
            Mutation::Update { .. } => MutationKind::Update,
            Mutation::Delete { .. } => MutationKind::Delete,
        }
    }

    /// Queries made stale when this mutation succeeds.
    pub fn invalidates(&self) -> &'static [QueryKey] {
        self.kind().invalidates()
    }
}

impl MutationKind {
    pub fn invalidates(self) -> &'static [QueryKey] {
        match self {
            MutationKind::Suggest => SUGGEST_INVALIDATES,
            MutationKind::Approve => APPROVE_INVALIDATES,
            MutationKind::Reject => REJECT_INVALIDATES,
            MutationKind::Update => UPDATE_INVALIDATES,
            MutationKind::Delete => DELETE_INVALIDATES,
        }
    }
}

fn validate_song_id(song_id: &str) -> Result<String> {
    let trimmed = song_id.trim();
    if trimmed.is_empty() {
        return Err(Top5Error::Validation("Song id is required".to_string()));
    }
    Ok(trimmed.to_string())
}

/// What a successful mutation returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The song created by a suggestion, still pending review
    Suggested(Song),
    Completed,
}

/// Runs mutations against the service and applies their invalidations.
///
/// There are no retries: a repeated suggestion would create a duplicate, so
/// every failure goes straight back to the caller.
pub struct MutationExecutor {
    api: Rc<dyn SongApi>,
    cache: QueryCache<QueryData>,
    session: SessionContext,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl MutationExecutor {
    pub fn new(
        api: Rc<dyn SongApi>,
        cache: QueryCache<QueryData>,
        session: SessionContext,
        broadcaster: Arc<SharedEventBroadcaster>,
    ) -> Self {
        Self {
            api,
            cache,
            session,
            broadcaster,
        }
    }

    /// Execute `mutation` once with the current session's credentials.
    ///
    /// On success the mutation's invalidation set is applied to the cache.
    /// On failure the cache is left exactly as it was; an authorization
    /// failure additionally clears the session.
    pub async fn execute(&self, mutation: Mutation) -> Result<MutationOutcome> {
        let kind = mutation.kind();
        let credentials = self.session.credentials();
        log::debug!("Executing {kind} mutation");

        let result = match &mutation {
            Mutation::Suggest { url } => self
                .api
                .suggest_song(&credentials, url)
                .await
                .map(MutationOutcome::Suggested),
            Mutation::Approve { song_id } => self
                .api
                .approve_song(&credentials, song_id)
                .await
                .map(|()| MutationOutcome::Completed),
            Mutation::Reject { song_id } => self
                .api
                .reject_song(&credentials, song_id)
                .await
                .map(|()| MutationOutcome::Completed),
            Mutation::Update { song_id, changes } => self
                .api
                .update_song(&credentials, song_id, changes)
                .await
                .map(|()| MutationOutcome::Completed),
            Mutation::Delete { song_id } => self
                .api
                .delete_song(&credentials, song_id)
                .await
                .map(|()| MutationOutcome::Completed),
        };

        match result {
            Ok(outcome) => {
                let keys = mutation.invalidates();
                self.cache.invalidate_all(keys);
                log::debug!("{kind} succeeded, invalidated {} queries", keys.len());
                self.broadcaster
                    .broadcast_event(ClientEvent::MutationSucceeded {
                        kind,
                        invalidated: keys.to_vec(),
                    });
                Ok(outcome)
            }
            Err(error) => {
                if error.requires_reauthentication() {
                    log::warn!("{kind} rejected the credential, clearing session");
                    self.session.clear();
                } else {
                    log::warn!("{kind} failed: {error}");
                }
                self.broadcaster.broadcast_event(ClientEvent::MutationFailed {
                    kind,
                    error: error.to_string(),
                });
                Err(error)
            }
        }
    }
}
