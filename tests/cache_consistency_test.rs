mod common;

use common::{Call, FakeSongApi, ADMIN_EMAIL, ADMIN_PASSWORD};
use std::rc::Rc;
use tokio::task::{yield_now, LocalSet};
use top5_client::{ClientConfig, ClientEvent, Freshness, QueryKey, SongBoard, SongStatus};

fn board_with(api: &Rc<FakeSongApi>) -> SongBoard {
    SongBoard::new(api.clone(), ClientConfig::default())
}

fn ids(songs: &[top5_client::Song]) -> Vec<&str> {
    songs.iter().map(|s| s.id.as_str()).collect()
}

#[test_log::test(tokio::test)]
async fn test_approve_moves_song_from_pending_to_top_five() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let _pending = board.observe(QueryKey::PendingSongs);
            let _top = board.observe(QueryKey::TopSongs);
            assert_eq!(ids(&board.pending().await.unwrap()), vec!["p1", "p2"]);
            assert_eq!(ids(&board.top_five().await.unwrap()), vec!["a1", "a2", "a3"]);

            board.approve("p1").await.unwrap();
            board.settle().await;

            let pending = board.pending_view();
            assert_eq!(pending.freshness, Freshness::Fresh);
            assert_eq!(ids(pending.data.as_deref().unwrap()), vec!["p2"]);

            let top = board.top_five_view();
            assert_eq!(ids(top.data.as_deref().unwrap()), vec!["p1", "a1", "a2", "a3"]);
            assert_eq!(api.status_of("p1"), Some(SongStatus::Approved));
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_reject_removes_from_pending_without_touching_top() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let _pending = board.observe(QueryKey::PendingSongs);
            let _top = board.observe(QueryKey::TopSongs);
            board.settle().await;
            let top_fetches = api.calls(Call::TopSongs);

            board.reject("p2").await.unwrap();
            board.settle().await;

            assert_eq!(ids(board.pending_view().data.as_deref().unwrap()), vec!["p1"]);
            assert_eq!(api.calls(Call::TopSongs), top_fetches);
            assert_eq!(board.top_five_view().freshness, Freshness::Fresh);
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_suggestion_shows_up_in_pending_but_never_in_top() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let _pending = board.observe(QueryKey::PendingSongs);
            let _top = board.observe(QueryKey::TopSongs);
            board.settle().await;
            let top_fetches = api.calls(Call::TopSongs);

            let created = board
                .suggest("https://youtu.be/s9kVG2ZaTS4")
                .await
                .unwrap();
            assert_eq!(created.status, SongStatus::Pending);
            board.settle().await;

            let pending = board.pending_view().data.unwrap();
            assert!(pending.iter().any(|s| s.id == created.id));
            let top = board.top_five_view().data.unwrap();
            assert!(top.iter().all(|s| s.id != created.id));
            assert_eq!(api.calls(Call::TopSongs), top_fetches);
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_unobserved_query_refetches_on_next_read() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            board.pending().await.unwrap();
            assert_eq!(api.calls(Call::PendingSongs), 1);

            // Fresh: served from the cache.
            board.pending().await.unwrap();
            assert_eq!(api.calls(Call::PendingSongs), 1);

            board.approve("p1").await.unwrap();
            board.settle().await;
            assert_eq!(api.calls(Call::PendingSongs), 1);
            assert_eq!(board.pending_view().freshness, Freshness::Stale);

            assert_eq!(ids(&board.pending().await.unwrap()), vec!["p2"]);
            assert_eq!(api.calls(Call::PendingSongs), 2);
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_response_from_superseded_fetch_is_discarded() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
            let mut events = board.subscribe();

            // The first fetch snapshots the listing (still containing p1) and is held.
            let release = api.hold(Call::PendingSongs);
            let _pending = board.observe(QueryKey::PendingSongs);
            while api.calls(Call::PendingSongs) < 1 {
                yield_now().await;
            }

            board.approve("p1").await.unwrap();
            board.settle().await;
            assert_eq!(ids(board.pending_view().data.as_deref().unwrap()), vec!["p2"]);

            release.send(()).unwrap();
            loop {
                match events.recv().await.unwrap() {
                    ClientEvent::StaleResponseDiscarded { key, .. }
                        if key == QueryKey::PendingSongs =>
                    {
                        break
                    }
                    _ => {}
                }
            }

            let pending = board.pending_view();
            assert_eq!(pending.freshness, Freshness::Fresh);
            assert_eq!(ids(pending.data.as_deref().unwrap()), vec!["p2"]);
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_delete_of_approved_song_converges_admin_and_top() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let _admin = board.observe(QueryKey::AdminSongs);
            let _top = board.observe(QueryKey::TopSongs);
            board.settle().await;
            assert!(board.admin_songs_view().data.unwrap().contains("a1"));

            let release_top = api.hold(Call::TopSongs);
            board.delete("a1").await.unwrap();

            while board.admin_songs_view().freshness != Freshness::Fresh {
                yield_now().await;
            }
            // The admin listing has caught up while the top list is still refetching.
            assert!(!board.admin_songs_view().data.unwrap().contains("a1"));
            let top = board.top_five_view();
            assert!(top.is_refreshing());
            assert!(top.data.unwrap().iter().any(|s| s.id == "a1"));

            release_top.send(()).unwrap();
            board.settle().await;
            let top = board.top_five_view();
            assert_eq!(top.freshness, Freshness::Fresh);
            assert_eq!(ids(top.data.as_deref().unwrap()), vec!["a2", "a3"]);
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_delete_of_pending_song_leaves_pending_list() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let _admin = board.observe(QueryKey::AdminSongs);
            let _pending = board.observe(QueryKey::PendingSongs);
            board.settle().await;

            board.delete("p1").await.unwrap();
            board.settle().await;

            let pending = board.pending_view();
            assert_eq!(pending.freshness, Freshness::Fresh);
            assert_eq!(ids(pending.data.as_deref().unwrap()), vec!["p2"]);
            assert!(!board.admin_songs_view().data.unwrap().contains("p1"));
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_delete_views_converge_when_admin_resolves_first() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let _admin = board.observe(QueryKey::AdminSongs);
            let _pending = board.observe(QueryKey::PendingSongs);
            board.settle().await;
            assert!(board.admin_songs_view().data.unwrap().contains("p1"));

            let release_pending = api.hold(Call::PendingSongs);
            board.delete("p1").await.unwrap();

            while board.admin_songs_view().freshness != Freshness::Fresh {
                yield_now().await;
            }
            assert!(!board.admin_songs_view().data.unwrap().contains("p1"));
            let pending = board.pending_view();
            assert!(pending.is_refreshing());
            assert_eq!(ids(pending.data.as_deref().unwrap()), vec!["p1", "p2"]);

            release_pending.send(()).unwrap();
            board.settle().await;
            let pending = board.pending_view();
            assert_eq!(pending.freshness, Freshness::Fresh);
            assert_eq!(ids(pending.data.as_deref().unwrap()), vec!["p2"]);
            assert!(!board.admin_songs_view().data.unwrap().contains("p1"));
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_update_refreshes_admin_and_top() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let _admin = board.observe(QueryKey::AdminSongs);
            let _top = board.observe(QueryKey::TopSongs);
            let _pending = board.observe(QueryKey::PendingSongs);
            board.settle().await;
            let pending_fetches = api.calls(Call::PendingSongs);

            board
                .update("a2", Some("Pagode em Brasília (ao vivo)"), None)
                .await
                .unwrap();
            board.settle().await;

            let top = board.top_five_view().data.unwrap();
            assert_eq!(top[1].title, "Pagode em Brasília (ao vivo)");
            let admin = board.admin_songs_view().data.unwrap();
            assert_eq!(admin.find("a2").unwrap().title, "Pagode em Brasília (ao vivo)");
            assert_eq!(api.calls(Call::PendingSongs), pending_fetches);
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_failed_mutation_leaves_cache_untouched() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let _pending = board.observe(QueryKey::PendingSongs);
            board.settle().await;
            let before = board.cache().state(QueryKey::PendingSongs);

            let err = board.approve("missing").await.unwrap_err();
            assert!(matches!(err, top5_client::Top5Error::NotFound(_)));
            let err = board.approve("a1").await.unwrap_err();
            assert!(matches!(err, top5_client::Top5Error::Conflict(_)));

            assert_eq!(board.cache().state(QueryKey::PendingSongs), before);
            assert!(!board.cache().is_fetching(QueryKey::PendingSongs));
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_invalid_input_never_reaches_the_service() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);

            let err = board.suggest("https://vimeo.com/12345").await.unwrap_err();
            assert!(matches!(err, top5_client::Top5Error::Validation(_)));
            let err = board.update("a1", None, None).await.unwrap_err();
            assert!(matches!(err, top5_client::Top5Error::Validation(_)));

            assert_eq!(api.calls(Call::Suggest), 0);
            assert_eq!(api.calls(Call::Update), 0);
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_rejected_url_can_be_suggested_again() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let url = "https://www.youtube.com/watch?v=ytp2";
            let err = board.suggest(url).await.unwrap_err();
            assert!(matches!(err, top5_client::Top5Error::Api { status: 422, .. }));

            board.reject("p2").await.unwrap();
            let again = board.suggest(url).await.unwrap();
            assert_ne!(again.id, "p2");
            assert_eq!(again.status, SongStatus::Pending);
        })
        .await;
}

#[test_log::test(tokio::test)]
async fn test_dashboard_stats() {
    LocalSet::new()
        .run_until(async {
            let api = Rc::new(FakeSongApi::seeded());
            let board = board_with(&api);
            board.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

            let stats = board.dashboard_stats().await.unwrap();
            assert_eq!(stats.pending, 2);
            assert_eq!(stats.approved, 3);
            assert_eq!(stats.total, 5);
        })
        .await;
}
