use std::time::SystemTime;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameDetails, GameEntity, SessionEntity, StoreSnapshot},
        remote::RemoteSessionFull,
    },
    error::ServiceError,
    services::{
        outcome::{RemoteSync, SyncOutcome},
        scoring,
    },
    state::{SharedState, StoreEvent},
};

/// Game to append to a session.
#[derive(Debug, Clone, Default)]
pub struct NewGame {
    /// Points per participant name.
    pub scores: IndexMap<String, i32>,
    /// Free-form comment.
    pub note: Option<String>,
    /// Deal description kept with the game.
    pub details: Option<GameDetails>,
}

/// Local copy of a remote session, as returned by [`list_remote_into_local`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedSession {
    /// Local session id.
    pub local_id: String,
    /// Backend session id.
    pub remote_id: String,
    /// Participant names as listed remotely.
    pub participants: Vec<String>,
    /// Remote creation time.
    pub created_at: SystemTime,
}

/// Counters reported by [`sync_unsynced`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local-only sessions that received a remote id.
    pub sessions_linked: usize,
    /// Games acknowledged by the backend during the run.
    pub games_pushed: usize,
    /// Sessions left with unsynced data after the run.
    pub sessions_failed: usize,
}

fn new_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}

fn new_game_id() -> String {
    format!("g_{}", Uuid::new_v4().simple())
}

/// Trim names, drop blank ones and keep the first occurrence of duplicates.
pub fn normalize_participants<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn local_id_for_remote(snapshot: &StoreSnapshot, remote_id: &str) -> Option<String> {
    snapshot
        .sessions
        .values()
        .find(|session| session.remote_id.as_deref() == Some(remote_id))
        .map(|session| session.id.clone())
}

/// Create a session for the given players.
///
/// Free-tier users are capped at the configured number of sessions. The remote
/// row is created first so the local record can be linked immediately, but the
/// local record is committed whether or not that succeeds.
pub async fn create_session<I, S>(
    state: &SharedState,
    names: I,
) -> Result<SyncOutcome<SessionEntity>, ServiceError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let limit = state.options().session_limit;
    let within_limit = |count: usize| state.entitlement().is_premium() || count < limit;
    if !within_limit(state.read_sessions(|snapshot| snapshot.sessions.len()).await) {
        return Err(ServiceError::SessionLimitReached { limit });
    }

    let participants = normalize_participants(names);
    let mut session = SessionEntity {
        id: new_session_id(),
        remote_id: None,
        participants: participants.clone(),
        games: Vec::new(),
        created_at: SystemTime::now(),
    };

    let gateway = state.remote().await;
    let remote = match &gateway {
        Some(gateway) => match gateway.create_session(participants).await {
            Some(created) => {
                session.remote_id = Some(created.session_id);
                RemoteSync::Applied
            }
            None => RemoteSync::Failed,
        },
        None => RemoteSync::NotAttempted,
    };

    let admitted = {
        let mut sessions = state.write_sessions().await;
        // Concurrent creations may have filled the quota during the remote call.
        let admitted = within_limit(sessions.sessions.len());
        if admitted {
            sessions
                .sessions
                .insert(session.id.clone(), session.clone());
            sessions.commit().await;
        }
        admitted
    };
    if !admitted {
        if let (Some(gateway), Some(remote_id)) = (gateway, session.remote_id) {
            gateway.delete_session(remote_id).await;
        }
        return Err(ServiceError::SessionLimitReached { limit });
    }
    info!(session_id = %session.id, remote = ?remote, "session created");
    state.events().publish(StoreEvent::SessionCreated {
        session_id: session.id.clone(),
    });

    Ok(SyncOutcome::new(session, true, remote))
}

/// Local session by id.
pub async fn get_session(state: &SharedState, session_id: &str) -> Option<SessionEntity> {
    state
        .read_sessions(|snapshot| snapshot.sessions.get(session_id).cloned())
        .await
}

/// Local id of the session linked to `remote_id`.
pub async fn local_id_by_remote_id(state: &SharedState, remote_id: &str) -> Option<String> {
    state
        .read_sessions(|snapshot| local_id_for_remote(snapshot, remote_id))
        .await
}

/// Every session, in creation order.
pub async fn all_sessions(state: &SharedState) -> Vec<SessionEntity> {
    state
        .read_sessions(|snapshot| snapshot.sessions.values().cloned().collect())
        .await
}

/// Append a game to a session. `None` when the session does not exist.
///
/// The game stays marked as pending until the backend acknowledges it, which
/// only happens for linked sessions.
pub async fn add_game(
    state: &SharedState,
    session_id: &str,
    game: NewGame,
) -> Option<SyncOutcome<GameEntity>> {
    let (mut entity, remote_id, _claim) = {
        let mut sessions = state.write_sessions().await;
        let session = sessions.sessions.get_mut(session_id)?;
        let entity = GameEntity {
            id: new_game_id(),
            timestamp: SystemTime::now(),
            scores: game.scores,
            note: game.note,
            details: game.details,
            pending_remote: true,
        };
        session.games.push(entity.clone());
        let remote_id = session.remote_id.clone();
        // Claimed before the lock is released so a concurrent sync never sees it unclaimed.
        let claim = state.claim_game_push(&entity.id);
        sessions.commit().await;
        (entity, remote_id, claim)
    };
    state.events().publish(StoreEvent::SessionUpdated {
        session_id: session_id.to_string(),
    });

    let (Some(remote_id), Some(gateway)) = (remote_id, state.remote().await) else {
        return Some(SyncOutcome::new(entity, true, RemoteSync::NotAttempted));
    };

    let created = gateway
        .add_game(remote_id, entity.details.clone(), entity.scores.clone())
        .await;
    if created.is_none() {
        warn!(session_id, game_id = %entity.id, "game kept pending after remote failure");
        return Some(SyncOutcome::new(entity, true, RemoteSync::Failed));
    }

    mark_game_synced(state, session_id, &entity.id).await;
    entity.pending_remote = false;
    Some(SyncOutcome::new(entity, true, RemoteSync::Applied))
}

/// Append a game, scoring it from its details when no scores are given.
///
/// Unlike [`add_game`] an unknown session is an error, as are details that
/// cannot be scored for this session's participants.
pub async fn record_game(
    state: &SharedState,
    session_id: &str,
    scores: Option<IndexMap<String, i32>>,
    note: Option<String>,
    details: Option<GameDetails>,
) -> Result<SyncOutcome<GameEntity>, ServiceError> {
    let not_found = || ServiceError::NotFound(format!("session `{session_id}` not found"));

    let scores = match (scores, details.as_ref()) {
        (Some(scores), _) => scores,
        (None, Some(details)) => {
            let participants = get_session(state, session_id)
                .await
                .ok_or_else(not_found)?
                .participants;
            let settings = state.settings();
            scoring::score_deal(
                details,
                &participants,
                &settings.read_score_config(),
                settings.read_misery_settings(),
            )?
        }
        (None, None) => {
            return Err(ServiceError::InvalidInput(
                "either scores or details must be provided".into(),
            ));
        }
    };

    add_game(
        state,
        session_id,
        NewGame {
            scores,
            note,
            details,
        },
    )
    .await
    .ok_or_else(not_found)
}

async fn mark_game_synced(state: &SharedState, session_id: &str, game_id: &str) {
    let mut sessions = state.write_sessions().await;
    let Some(game) = sessions
        .sessions
        .get_mut(session_id)
        .and_then(|session| session.games.iter_mut().find(|game| game.id == game_id))
    else {
        return;
    };
    game.pending_remote = false;
    sessions.commit().await;
}

/// Replace a game's scores, and its details when given. Local only.
pub async fn update_game(
    state: &SharedState,
    session_id: &str,
    game_id: &str,
    scores: IndexMap<String, i32>,
    details: Option<GameDetails>,
) -> Option<GameEntity> {
    let updated = {
        let mut sessions = state.write_sessions().await;
        let game = sessions
            .sessions
            .get_mut(session_id)?
            .games
            .iter_mut()
            .find(|game| game.id == game_id)?;
        game.scores = scores;
        if details.is_some() {
            game.details = details;
        }
        let updated = game.clone();
        sessions.commit().await;
        updated
    };
    state.events().publish(StoreEvent::SessionUpdated {
        session_id: session_id.to_string(),
    });
    Some(updated)
}

/// Remove a game from a session. Local only; returns whether a game was removed.
pub async fn remove_game(state: &SharedState, session_id: &str, game_id: &str) -> bool {
    {
        let mut sessions = state.write_sessions().await;
        let Some(session) = sessions.sessions.get_mut(session_id) else {
            return false;
        };
        let before = session.games.len();
        session.games.retain(|game| game.id != game_id);
        if session.games.len() == before {
            return false;
        }
        sessions.commit().await;
    }
    state.events().publish(StoreEvent::SessionUpdated {
        session_id: session_id.to_string(),
    });
    true
}

/// Remove a session locally, then delete its remote row when linked.
///
/// A failed remote delete is not retried and leaves the remote row behind.
pub async fn delete_session(state: &SharedState, session_id: &str) -> SyncOutcome<bool> {
    let removed = {
        let mut sessions = state.write_sessions().await;
        let removed = sessions.sessions.shift_remove(session_id);
        if removed.is_some() {
            sessions.commit().await;
        }
        removed
    };
    let Some(removed) = removed else {
        return SyncOutcome::unchanged(false);
    };
    state.events().publish(StoreEvent::SessionDeleted {
        session_id: session_id.to_string(),
    });

    let remote = match (removed.remote_id, state.remote().await) {
        (Some(remote_id), Some(gateway)) => {
            let deleted = gateway.delete_session(remote_id.clone()).await;
            if !deleted {
                warn!(session_id, remote_id = %remote_id, "remote session left behind");
            }
            RemoteSync::from_applied(deleted)
        }
        _ => RemoteSync::NotAttempted,
    };
    SyncOutcome::new(true, true, remote)
}

fn materialize(remote: RemoteSessionFull) -> SessionEntity {
    let names = remote
        .participants
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect::<IndexMap<_, _>>();

    let games = remote
        .games
        .into_iter()
        .map(|game| GameEntity {
            id: new_game_id(),
            timestamp: game.created_at,
            scores: game
                .scores
                .into_iter()
                .filter_map(|score| {
                    names
                        .get(score.participant_id.as_str())
                        .map(|name| (name.to_string(), score.score))
                })
                .collect(),
            note: None,
            details: game.details,
            pending_remote: false,
        })
        .collect();

    SessionEntity {
        id: new_session_id(),
        remote_id: Some(remote.id),
        participants: normalize_participants(names.values()),
        games,
        created_at: remote.created_at,
    }
}

/// Local id of the session mirroring `remote_id`, importing it when missing.
///
/// `None` when there is no gateway or the remote session cannot be fetched.
pub async fn ensure_local_from_remote(state: &SharedState, remote_id: &str) -> Option<String> {
    if let Some(local_id) = local_id_by_remote_id(state, remote_id).await {
        return Some(local_id);
    }

    let gateway = state.remote().await?;
    let remote = gateway.session_full(remote_id.to_string()).await?;
    let session = materialize(remote);

    {
        let mut sessions = state.write_sessions().await;
        // Another caller may have imported it while we were fetching.
        if let Some(existing) = local_id_for_remote(&sessions, remote_id) {
            return Some(existing);
        }
        sessions
            .sessions
            .insert(session.id.clone(), session.clone());
        sessions.commit().await;
    }
    debug!(session_id = %session.id, remote_id, games = session.games.len(), "imported remote session");
    state.events().publish(StoreEvent::SessionCreated {
        session_id: session.id.clone(),
    });

    Some(session.id)
}

/// Mirror every remote session locally, newest first.
pub async fn list_remote_into_local(state: &SharedState) -> Vec<LinkedSession> {
    let Some(gateway) = state.remote().await else {
        return Vec::new();
    };

    let mut linked = Vec::new();
    for summary in gateway.list_sessions().await {
        let Some(local_id) = ensure_local_from_remote(state, &summary.id).await else {
            continue;
        };
        linked.push(LinkedSession {
            local_id,
            remote_id: summary.id,
            participants: summary.participants.into_iter().map(|p| p.name).collect(),
            created_at: summary.created_at,
        });
    }

    linked.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    linked
}

/// Push local data the backend has not seen yet.
///
/// Local-only sessions are created remotely and linked, then all their games
/// are pushed in order. Linked sessions only push games still marked pending.
/// Each session stops at its first failure and is retried on the next run.
pub async fn sync_unsynced(state: &SharedState) -> SyncReport {
    let mut report = SyncReport::default();
    let Some(gateway) = state.remote().await else {
        return report;
    };
    let _gate = state.sync_gate().lock().await;

    let candidates = state
        .read_sessions(|snapshot| {
            snapshot
                .sessions
                .values()
                .filter(|session| {
                    !session.is_linked() || session.games.iter().any(|game| game.pending_remote)
                })
                .map(|session| session.id.clone())
                .collect::<Vec<_>>()
        })
        .await;

    for session_id in candidates {
        let Some(session) = get_session(state, &session_id).await else {
            continue;
        };

        let (remote_id, games) = match session.remote_id {
            Some(remote_id) => {
                let pending = session
                    .games
                    .into_iter()
                    .filter(|game| game.pending_remote)
                    .collect::<Vec<_>>();
                (remote_id, pending)
            }
            None => {
                let Some(created) = gateway.create_session(session.participants.clone()).await
                else {
                    report.sessions_failed += 1;
                    continue;
                };
                if !link_session(state, &session_id, &created.session_id).await {
                    // Deleted while the remote row was being created.
                    gateway.delete_session(created.session_id).await;
                    continue;
                }
                report.sessions_linked += 1;
                (created.session_id, session.games)
            }
        };

        let mut failed = false;
        for game in games {
            // Pushed by its own add_game call, or acknowledged since the candidates were read.
            let Some(_claim) = state.claim_game_push(&game.id) else {
                continue;
            };
            if !is_pending(state, &session_id, &game.id).await {
                continue;
            }
            let pushed = gateway
                .add_game(remote_id.clone(), game.details.clone(), game.scores.clone())
                .await;
            if pushed.is_none() {
                warn!(session_id = %session_id, game_id = %game.id, "stopping sync after remote failure");
                failed = true;
                break;
            }
            mark_game_synced(state, &session_id, &game.id).await;
            report.games_pushed += 1;
        }
        if failed {
            report.sessions_failed += 1;
        }
        state.events().publish(StoreEvent::SessionUpdated {
            session_id: session_id.clone(),
        });
    }

    info!(
        linked = report.sessions_linked,
        games = report.games_pushed,
        failed = report.sessions_failed,
        "sync of unsynced sessions finished"
    );
    report
}

async fn is_pending(state: &SharedState, session_id: &str, game_id: &str) -> bool {
    state
        .read_sessions(|snapshot| {
            snapshot
                .sessions
                .get(session_id)
                .and_then(|session| session.games.iter().find(|game| game.id == game_id))
                .is_some_and(|game| game.pending_remote)
        })
        .await
}

async fn link_session(state: &SharedState, session_id: &str, remote_id: &str) -> bool {
    let mut sessions = state.write_sessions().await;
    let Some(session) = sessions.sessions.get_mut(session_id) else {
        return false;
    };
    session.remote_id = Some(remote_id.to_string());
    sessions.commit().await;
    true
}

/// Participant names of a remote session, in creation order. Empty when the
/// backend is absent or the call fails.
pub async fn remote_participants(state: &SharedState, remote_id: &str) -> Vec<String> {
    let Some(gateway) = state.remote().await else {
        return Vec::new();
    };
    gateway
        .participants(remote_id.to_string())
        .await
        .into_iter()
        .map(|participant| participant.name)
        .collect()
}

/// Points per player over all games: participants first, in order, then any
/// other name found in the score maps.
pub fn compute_totals(session: &SessionEntity) -> IndexMap<String, i64> {
    let mut totals = session
        .participants
        .iter()
        .map(|name| (name.clone(), 0_i64))
        .collect::<IndexMap<_, _>>();
    for game in &session.games {
        for (name, points) in &game.scores {
            *totals.entry(name.clone()).or_insert(0) += i64::from(*points);
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        dao::local_store::LocalStore,
        services::test_support::{local_state, remote_state, scores},
        state::{AppState, StoreOptions},
    };

    #[tokio::test]
    async fn create_session_trims_and_dedups_participants() {
        let (state, _) = local_state();
        let outcome = create_session(&state, ["Alice", "Bob", "Bob ", "  "])
            .await
            .unwrap();

        assert_eq!(outcome.value.participants, vec!["Alice", "Bob"]);
        assert!(outcome.value.id.starts_with("sess_"));
        assert_eq!(outcome.remote, RemoteSync::NotAttempted);
    }

    #[tokio::test]
    async fn free_tier_is_capped() {
        let (state, _) = local_state();
        for _ in 0..5 {
            create_session(&state, ["A", "B", "C"]).await.unwrap();
        }

        let err = create_session(&state, ["A", "B", "C"]).await.unwrap_err();
        assert!(matches!(err, ServiceError::SessionLimitReached { limit: 5 }));
        assert_eq!(all_sessions(&state).await.len(), 5);
    }

    #[tokio::test]
    async fn remote_participants_follow_the_backend() {
        let (state, gateway) = remote_state().await;
        let remote_id = create_session(&state, ["Alice", "Bob"])
            .await
            .unwrap()
            .value
            .remote_id
            .unwrap();

        assert_eq!(remote_participants(&state, &remote_id).await, vec!["Alice", "Bob"]);
        gateway.set_failing(true);
        assert!(remote_participants(&state, &remote_id).await.is_empty());
    }

    #[tokio::test]
    async fn premium_users_are_not_capped() {
        let (state, _) = local_state();
        state.entitlement().set(true);
        for _ in 0..6 {
            create_session(&state, ["A", "B"]).await.unwrap();
        }
        assert_eq!(all_sessions(&state).await.len(), 6);
    }

    #[tokio::test]
    async fn create_session_links_when_remote_succeeds() {
        let (state, gateway) = remote_state().await;
        let outcome = create_session(&state, ["Alice", "Bob"]).await.unwrap();

        assert_eq!(outcome.remote, RemoteSync::Applied);
        let remote_id = outcome.value.remote_id.clone().unwrap();
        assert_eq!(gateway.session(&remote_id).unwrap().participants.len(), 2);
    }

    #[tokio::test]
    async fn create_session_commits_locally_when_remote_fails() {
        let (state, gateway) = remote_state().await;
        gateway.set_failing(true);

        let outcome = create_session(&state, ["Alice"]).await.unwrap();
        assert_eq!(outcome.remote, RemoteSync::Failed);
        assert!(outcome.applied_locally);
        assert!(get_session(&state, &outcome.value.id).await.unwrap().remote_id.is_none());
    }

    #[tokio::test]
    async fn add_game_on_local_only_session_makes_no_remote_call() {
        let (state, gateway) = remote_state().await;
        gateway.set_failing(true);
        let session = create_session(&state, ["A", "B"]).await.unwrap().value;
        gateway.set_failing(false);

        let outcome = add_game(
            &state,
            &session.id,
            NewGame {
                scores: scores(&[("A", 10), ("B", -10)]),
                ..NewGame::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.remote, RemoteSync::NotAttempted);
        assert_eq!(gateway.calls("add_game"), 0);
        let reloaded = state.local_store().load_sessions();
        assert_eq!(reloaded.sessions[&session.id].games.len(), 1);
        assert!(reloaded.sessions[&session.id].games[0].pending_remote);
    }

    #[tokio::test]
    async fn record_game_scores_from_details() {
        let (state, _) = local_state();
        let session = create_session(&state, ["Alice", "Bob", "Chloé", "David"])
            .await
            .unwrap()
            .value;
        let details: GameDetails = serde_json::from_str(
            r#"{"taker": "Alice", "contract": "garde", "bouts": 2, "takerPoints": 45}"#,
        )
        .unwrap();

        let game = record_game(&state, &session.id, None, None, Some(details))
            .await
            .unwrap()
            .value;
        assert_eq!(game.scores["Alice"], 174);
        assert_eq!(game.scores["David"], -58);

        let err = record_game(&state, "missing", Some(IndexMap::new()), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn add_game_on_linked_session_pushes_remotely() {
        let (state, gateway) = remote_state().await;
        let session = create_session(&state, ["A", "B"]).await.unwrap().value;

        let outcome = add_game(
            &state,
            &session.id,
            NewGame {
                scores: scores(&[("A", 10), ("B", -10), ("Ghost", 3)]),
                note: Some("first".into()),
                details: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.remote, RemoteSync::Applied);
        assert!(!outcome.value.pending_remote);
        let remote = gateway.session(session.remote_id.as_deref().unwrap()).unwrap();
        assert_eq!(remote.games[0].scores.len(), 2);
        let stored = get_session(&state, &session.id).await.unwrap();
        assert!(!stored.games[0].pending_remote);
    }

    #[tokio::test]
    async fn concurrent_creations_respect_the_session_limit() {
        let (state, gateway) = remote_state().await;
        for _ in 0..4 {
            create_session(&state, ["A", "B"]).await.unwrap();
        }
        gateway.set_latency(Duration::from_millis(50));

        let (first, second) = tokio::join!(
            create_session(&state, ["A"]),
            create_session(&state, ["B"])
        );

        let rejected = [&first, &second]
            .into_iter()
            .filter(|result| matches!(result, Err(ServiceError::SessionLimitReached { .. })))
            .count();
        assert_eq!(rejected, 1);
        assert_eq!(all_sessions(&state).await.len(), 5);
        assert_eq!(gateway.session_count(), 5);
    }

    #[tokio::test]
    async fn sync_during_add_game_does_not_push_twice() {
        let (state, gateway) = remote_state().await;
        let session = create_session(&state, ["A", "B"]).await.unwrap().value;
        gateway.set_latency(Duration::from_millis(50));

        let (added, report) = tokio::join!(
            add_game(
                &state,
                &session.id,
                NewGame {
                    scores: scores(&[("A", 4), ("B", -4)]),
                    ..NewGame::default()
                },
            ),
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                sync_unsynced(&state).await
            }
        );

        assert_eq!(added.unwrap().remote, RemoteSync::Applied);
        assert_eq!(report.games_pushed, 0);
        let remote = gateway.session(session.remote_id.as_deref().unwrap()).unwrap();
        assert_eq!(remote.games.len(), 1);
        let stored = get_session(&state, &session.id).await.unwrap();
        assert!(!stored.games[0].pending_remote);
    }

    #[tokio::test]
    async fn add_game_to_unknown_session_is_none() {
        let (state, _) = local_state();
        assert!(add_game(&state, "missing", NewGame::default()).await.is_none());
    }

    #[tokio::test]
    async fn update_and_remove_game_stay_local() {
        let (state, gateway) = remote_state().await;
        let session = create_session(&state, ["A", "B"]).await.unwrap().value;
        let game = add_game(
            &state,
            &session.id,
            NewGame {
                scores: scores(&[("A", 10), ("B", -10)]),
                ..NewGame::default()
            },
        )
        .await
        .unwrap()
        .value;

        let updated = update_game(&state, &session.id, &game.id, scores(&[("A", 20)]), None)
            .await
            .unwrap();
        assert_eq!(updated.scores, scores(&[("A", 20)]));
        assert!(update_game(&state, &session.id, "nope", IndexMap::new(), None).await.is_none());

        assert!(remove_game(&state, &session.id, &game.id).await);
        assert!(!remove_game(&state, &session.id, &game.id).await);
        assert!(get_session(&state, &session.id).await.unwrap().games.is_empty());
        assert_eq!(gateway.calls("add_game"), 1);
    }

    #[tokio::test]
    async fn delete_session_removes_locally_then_remotely() {
        let (state, gateway) = remote_state().await;
        let session = create_session(&state, ["A"]).await.unwrap().value;

        let outcome = delete_session(&state, &session.id).await;
        assert!(outcome.value);
        assert_eq!(outcome.remote, RemoteSync::Applied);
        assert!(get_session(&state, &session.id).await.is_none());
        assert_eq!(gateway.session_count(), 0);
    }

    #[tokio::test]
    async fn failed_remote_delete_keeps_local_removal() {
        let (state, gateway) = remote_state().await;
        let session = create_session(&state, ["A"]).await.unwrap().value;
        gateway.set_failing(true);

        let outcome = delete_session(&state, &session.id).await;
        assert_eq!(outcome.remote, RemoteSync::Failed);
        assert!(state.local_store().load_sessions().sessions.is_empty());
        assert!(!delete_session(&state, &session.id).await.applied_locally);
    }

    #[tokio::test]
    async fn ensure_local_from_remote_is_idempotent() {
        let (state, gateway) = remote_state().await;
        let remote_id = gateway.seed_session(
            &["Alice", "Bob"],
            vec![(None, vec![("Alice", 30), ("Bob", -30), ("Carol", 5)])],
        );

        let first = ensure_local_from_remote(&state, &remote_id).await.unwrap();
        let second = ensure_local_from_remote(&state, &remote_id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(all_sessions(&state).await.len(), 1);
        assert_eq!(gateway.calls("session_full"), 1);

        let session = get_session(&state, &first).await.unwrap();
        assert_eq!(session.participants, vec!["Alice", "Bob"]);
        assert_eq!(session.games[0].scores, scores(&[("Alice", 30), ("Bob", -30)]));
    }

    #[tokio::test]
    async fn concurrent_imports_do_not_duplicate() {
        let (state, gateway) = remote_state().await;
        let remote_id = gateway.seed_session(&["Alice"], Vec::new());

        let (a, b) = tokio::join!(
            ensure_local_from_remote(&state, &remote_id),
            ensure_local_from_remote(&state, &remote_id)
        );
        assert_eq!(a, b);
        assert_eq!(all_sessions(&state).await.len(), 1);
    }

    #[tokio::test]
    async fn list_remote_into_local_reuses_existing_links() {
        let (state, gateway) = remote_state().await;
        let existing = create_session(&state, ["A", "B"]).await.unwrap().value;
        gateway.seed_session(&["C", "D"], Vec::new());

        let linked = list_remote_into_local(&state).await;

        assert_eq!(linked.len(), 2);
        assert!(linked[0].created_at >= linked[1].created_at);
        assert!(linked.iter().any(|l| l.local_id == existing.id));
        assert_eq!(all_sessions(&state).await.len(), 2);
    }

    #[tokio::test]
    async fn sync_unsynced_links_and_pushes_in_order() {
        let (state, gateway) = remote_state().await;
        let session = create_session(&state, ["A", "B"]).await.unwrap().value;
        for points in [10, 20] {
            add_game(
                &state,
                &session.id,
                NewGame {
                    scores: scores(&[("A", points), ("B", -points)]),
                    ..NewGame::default()
                },
            )
            .await
            .unwrap();
        }
        let local_only = {
            gateway.set_failing(true);
            let id = create_session(&state, ["C", "D"]).await.unwrap().value.id;
            gateway.set_failing(false);
            id
        };
        add_game(
            &state,
            &local_only,
            NewGame {
                scores: scores(&[("C", 5), ("D", -5)]),
                ..NewGame::default()
            },
        )
        .await
        .unwrap();

        let report = sync_unsynced(&state).await;
        assert_eq!(report.sessions_linked, 1);
        assert_eq!(report.games_pushed, 1);
        assert_eq!(report.sessions_failed, 0);

        let linked = get_session(&state, &local_only).await.unwrap();
        let remote = gateway.session(linked.remote_id.as_deref().unwrap()).unwrap();
        assert_eq!(remote.games.len(), 1);
        assert!(linked.games.iter().all(|game| !game.pending_remote));

        // A second run finds nothing left to push.
        let again = sync_unsynced(&state).await;
        assert_eq!(again, SyncReport::default());
    }

    #[tokio::test]
    async fn sync_resumes_pending_games_of_linked_sessions() {
        let (state, gateway) = remote_state().await;
        let session = create_session(&state, ["A", "B"]).await.unwrap().value;
        gateway.set_failing(true);
        add_game(
            &state,
            &session.id,
            NewGame {
                scores: scores(&[("A", 1), ("B", -1)]),
                ..NewGame::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(sync_unsynced(&state).await.sessions_failed, 1);
        gateway.set_failing(false);
        let report = sync_unsynced(&state).await;
        assert_eq!(report.games_pushed, 1);
        let remote = gateway.session(session.remote_id.as_deref().unwrap()).unwrap();
        assert_eq!(remote.games.len(), 1);
    }

    #[test]
    fn totals_start_at_zero_and_append_unknown_names() {
        let mut session = SessionEntity {
            id: "s".into(),
            remote_id: None,
            participants: vec!["A".into(), "B".into()],
            games: Vec::new(),
            created_at: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(
            compute_totals(&session).into_iter().collect::<Vec<_>>(),
            vec![("A".to_string(), 0), ("B".to_string(), 0)]
        );

        for game_scores in [scores(&[("A", 10), ("B", -10)]), scores(&[("A", 5), ("Z", 2)])] {
            session.games.push(GameEntity {
                id: new_game_id(),
                timestamp: SystemTime::UNIX_EPOCH,
                scores: game_scores,
                note: None,
                details: None,
                pending_remote: false,
            });
        }
        let totals = compute_totals(&session);
        assert_eq!(totals["A"], 15);
        assert_eq!(totals["B"], -10);
        assert_eq!(totals.get_index(2), Some((&"Z".to_string(), &2)));
    }

    #[tokio::test]
    async fn sessions_survive_a_restart() {
        let (state, _) = local_state();
        let session = create_session(&state, ["A"]).await.unwrap().value;

        let reopened = AppState::new(
            LocalStore::clone(state.local_store()),
            StoreOptions::default(),
        );
        let restored = get_session(&reopened, &session.id).await.unwrap();
        assert_eq!(restored.participants, session.participants);
    }
}
