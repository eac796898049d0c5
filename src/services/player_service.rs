use indexmap::IndexSet;
use tracing::info;

use crate::{
    dao::{models::GameDetails, remote::RenameScope},
    services::outcome::{RemoteSync, SyncOutcome},
    state::{RenamePolicy, SharedState, StoreEvent},
};

/// Label given remotely to the rows of a deleted player.
pub fn tombstone(name: &str) -> String {
    format!("[deleted] {name}")
}

/// Every participant name across sessions, sorted case-insensitively.
pub async fn known_players(state: &SharedState) -> Vec<String> {
    let mut players = state
        .read_sessions(|snapshot| {
            snapshot
                .sessions
                .values()
                .flat_map(|session| session.participants.iter().cloned())
                .collect::<IndexSet<_>>()
        })
        .await
        .into_iter()
        .collect::<Vec<_>>();
    players.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    players
}

fn dedup(names: impl IntoIterator<Item = String>) -> Vec<String> {
    names.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}

fn rename_in_details(details: &mut GameDetails, old: &str, new: &str) {
    if details.taker == old {
        details.taker = new.to_string();
    }
    if details.called.as_deref() == Some(old) {
        details.called = Some(new.to_string());
    }
    if details.called.as_deref() == Some(details.taker.as_str()) {
        details.called = None;
    }
    let rename = |name: String| if name == old { new.to_string() } else { name };
    details.miseres = dedup(details.miseres.drain(..).map(rename));
    details.miseres_tete = dedup(details.miseres_tete.drain(..).map(rename));
}

fn remove_from_details(details: &mut GameDetails, name: &str) {
    if details.taker == name {
        details.taker.clear();
    }
    if details.called.as_deref() == Some(name) {
        details.called = None;
    }
    details.miseres.retain(|n| n != name);
    details.miseres_tete.retain(|n| n != name);
}

/// Rename a player in every session they take part in, merging their scores
/// into an existing player of the same name.
///
/// The value is the number of local sessions touched. The remote rename runs
/// even when no local session matched, since remote rows may exist without a
/// local copy.
pub async fn rename_player(state: &SharedState, old: &str, new: &str) -> SyncOutcome<usize> {
    let (old, new) = (old.trim(), new.trim());
    if old.is_empty() || new.is_empty() || old == new {
        return SyncOutcome::unchanged(0);
    }

    let (touched, remote_ids) = {
        let mut sessions = state.write_sessions().await;
        let mut touched = Vec::new();
        let mut remote_ids = Vec::new();
        for session in sessions.sessions.values_mut() {
            if !session.participants.iter().any(|p| p == old) {
                continue;
            }
            let participants = std::mem::take(&mut session.participants);
            session.participants = dedup(
                participants
                    .into_iter()
                    .map(|p| if p == old { new.to_string() } else { p }),
            );
            for game in &mut session.games {
                if let Some(points) = game.scores.shift_remove(old) {
                    *game.scores.entry(new.to_string()).or_insert(0) += points;
                }
                if let Some(details) = game.details.as_mut() {
                    rename_in_details(details, old, new);
                }
            }
            touched.push(session.id.clone());
            remote_ids.extend(session.remote_id.clone());
        }
        if !touched.is_empty() {
            sessions.commit().await;
        }
        (touched, remote_ids)
    };

    let applied_locally = !touched.is_empty();
    if applied_locally {
        info!(old, new, sessions = touched.len(), "player renamed");
        state.events().publish(StoreEvent::PlayersChanged {
            sessions: touched.clone(),
        });
    }

    let remote = rename_remote(state, old, new, remote_ids).await;
    SyncOutcome::new(touched.len(), applied_locally, remote)
}

/// Remove a player from every session and game they appear in.
///
/// Remote rows are not deleted but renamed to [`tombstone`] so past games keep
/// their score rows.
pub async fn delete_player(state: &SharedState, name: &str) -> SyncOutcome<usize> {
    let name = name.trim();
    if name.is_empty() {
        return SyncOutcome::unchanged(0);
    }

    let (touched, remote_ids) = {
        let mut sessions = state.write_sessions().await;
        let mut touched = Vec::new();
        let mut remote_ids = Vec::new();
        for session in sessions.sessions.values_mut() {
            if !session.participants.iter().any(|p| p == name) {
                continue;
            }
            session.participants.retain(|p| p != name);
            for game in &mut session.games {
                game.scores.shift_remove(name);
                if let Some(details) = game.details.as_mut() {
                    remove_from_details(details, name);
                }
            }
            touched.push(session.id.clone());
            remote_ids.extend(session.remote_id.clone());
        }
        if !touched.is_empty() {
            sessions.commit().await;
        }
        (touched, remote_ids)
    };

    let applied_locally = !touched.is_empty();
    if applied_locally {
        info!(name, sessions = touched.len(), "player deleted");
        state.events().publish(StoreEvent::PlayersChanged {
            sessions: touched.clone(),
        });
    }

    let remote = rename_remote(state, name, &tombstone(name), remote_ids).await;
    SyncOutcome::new(touched.len(), applied_locally, remote)
}

async fn rename_remote(
    state: &SharedState,
    old: &str,
    new: &str,
    remote_ids: Vec<String>,
) -> RemoteSync {
    let Some(gateway) = state.remote().await else {
        return RemoteSync::NotAttempted;
    };
    let scope = match state.options().rename_policy {
        RenamePolicy::Everywhere => RenameScope::Everywhere,
        RenamePolicy::LinkedSessions if remote_ids.is_empty() => return RemoteSync::NotAttempted,
        RenamePolicy::LinkedSessions => RenameScope::Sessions(remote_ids),
    };
    // Zero rows is the failure sentinel and cannot be told apart from "nothing matched".
    let updated = gateway
        .rename_participants(old.to_string(), new.to_string(), scope)
        .await;
    RemoteSync::from_applied(updated > 0)
}
