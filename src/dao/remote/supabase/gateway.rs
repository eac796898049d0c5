use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use reqwest::{
    Client, Method, RequestBuilder,
    header::{AUTHORIZATION, HeaderName},
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::dao::{
    models::GameDetails,
    remote::{
        CreatedGame, CreatedSession, Identity, RemoteGateway, RemoteParticipant,
        RemoteSessionFull, RemoteSessionSummary, RenameScope,
    },
    storage::StorageResult,
};

use super::{
    config::SupabaseConfig,
    error::{SupabaseError, SupabaseResult},
    models::{
        GAMES_TABLE, GameRow, IdRow, NewGameRow, NewParticipantRow, NewScoreRow, NewSessionRow,
        PARTICIPANTS_TABLE, PROFILES_TABLE, ParticipantRow, ProfileRow, RenameRow, SCORES_TABLE,
        SESSIONS_TABLE, SessionListRow, SessionRow, full_session, in_filter,
    },
};

const API_KEY_HEADER: HeaderName = HeaderName::from_static("apikey");
const PREFER_HEADER: HeaderName = HeaderName::from_static("prefer");
const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

/// PostgREST client for the Supabase project backing the remote mirror.
#[derive(Clone)]
pub struct SupabaseGateway {
    inner: Arc<SupabaseInner>,
}

struct SupabaseInner {
    client: Client,
    rest_url: Arc<str>,
    anon_key: Arc<str>,
    identity: RwLock<Option<Identity>>,
}

impl SupabaseGateway {
    /// Build the HTTP client for the configured project.
    pub fn connect(config: SupabaseConfig) -> SupabaseResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| SupabaseError::ClientBuilder { source })?;

        let rest_url = Arc::<str>::from(format!(
            "{}/rest/v1",
            config.base_url.trim_end_matches('/')
        ));

        Ok(Self {
            inner: Arc::new(SupabaseInner {
                client,
                rest_url,
                anon_key: Arc::<str>::from(config.anon_key),
                identity: RwLock::new(config.identity),
            }),
        })
    }

    fn current_identity(&self) -> Option<Identity> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_identity(&self) -> SupabaseResult<Identity> {
        self.current_identity().ok_or(SupabaseError::NotAuthenticated)
    }

    fn request(&self, method: Method, table: &str, identity: &Identity) -> RequestBuilder {
        let url = format!("{}/{}", self.inner.rest_url, table);
        self.inner
            .client
            .request(method, url)
            .header(API_KEY_HEADER, self.inner.anon_key.as_ref())
            .header(AUTHORIZATION, format!("Bearer {}", identity.access_token))
    }

    async fn send_rows<T>(builder: RequestBuilder, table: &'static str) -> SupabaseResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .send()
            .await
            .map_err(|source| SupabaseError::RequestSend { table, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::RequestStatus {
                table,
                status,
                body,
            });
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|source| SupabaseError::DecodeResponse { table, source })
    }

    async fn send_empty(builder: RequestBuilder, table: &'static str) -> SupabaseResult<()> {
        let response = builder
            .send()
            .await
            .map_err(|source| SupabaseError::RequestSend { table, source })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SupabaseError::RequestStatus {
                table,
                status,
                body,
            })
        }
    }

    async fn try_create_session(&self, names: Vec<String>) -> SupabaseResult<CreatedSession> {
        let identity = self.require_identity()?;

        let inserted = Self::send_rows::<IdRow>(
            self.request(Method::POST, SESSIONS_TABLE, &identity)
                .query(&[("select", "id")])
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&[NewSessionRow {
                    owner_id: &identity.user_id,
                }]),
            SESSIONS_TABLE,
        )
        .await?;
        let session_id = inserted
            .into_iter()
            .next()
            .ok_or(SupabaseError::MissingRow {
                table: SESSIONS_TABLE,
            })?
            .id;

        if names.is_empty() {
            return Ok(CreatedSession {
                session_id,
                participants: Vec::new(),
            });
        }

        let rows = names
            .iter()
            .map(|name| NewParticipantRow {
                session_id: &session_id,
                name,
            })
            .collect::<Vec<_>>();
        let participants = match Self::send_rows::<ParticipantRow>(
            self.request(Method::POST, PARTICIPANTS_TABLE, &identity)
                .query(&[("select", "id,name")])
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&rows),
            PARTICIPANTS_TABLE,
        )
        .await
        {
            Ok(rows) => rows.into_iter().map(Into::into).collect(),
            Err(err) => {
                // The session row exists; report it so the local copy still links.
                warn!(session_id = %session_id, error = %err, "inserting remote participants failed");
                Vec::new()
            }
        };

        Ok(CreatedSession {
            session_id,
            participants,
        })
    }

    async fn try_participants(
        &self,
        identity: &Identity,
        session_id: &str,
    ) -> SupabaseResult<Vec<ParticipantRow>> {
        Self::send_rows(
            self.request(Method::GET, PARTICIPANTS_TABLE, identity)
                .query(&[
                    ("select", "id,name".to_string()),
                    ("session_id", format!("eq.{session_id}")),
                    ("order", "created_at.asc".to_string()),
                ]),
            PARTICIPANTS_TABLE,
        )
        .await
    }

    async fn try_add_game(
        &self,
        session_id: String,
        details: Option<GameDetails>,
        scores: IndexMap<String, i32>,
    ) -> SupabaseResult<CreatedGame> {
        let identity = self.require_identity()?;

        let inserted = Self::send_rows::<IdRow>(
            self.request(Method::POST, GAMES_TABLE, &identity)
                .query(&[("select", "id")])
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&[NewGameRow {
                    session_id: &session_id,
                    details: details.as_ref(),
                }]),
            GAMES_TABLE,
        )
        .await?;
        let game_id = inserted
            .into_iter()
            .next()
            .ok_or(SupabaseError::MissingRow { table: GAMES_TABLE })?
            .id;

        let participants = self
            .try_participants(&identity, &session_id)
            .await
            .unwrap_or_else(|err| {
                warn!(session_id = %session_id, error = %err, "loading remote participants failed");
                Vec::new()
            });
        let name_to_id = participants
            .iter()
            .map(|p| (p.name.as_str(), p.id.as_str()))
            .collect::<IndexMap<_, _>>();

        // Names without a participant row are dropped.
        let score_rows = scores
            .iter()
            .filter_map(|(name, score)| {
                name_to_id.get(name.as_str()).map(|participant_id| NewScoreRow {
                    game_id: &game_id,
                    participant_id,
                    score: *score,
                })
            })
            .collect::<Vec<_>>();

        if !score_rows.is_empty() {
            if let Err(err) = Self::send_empty(
                self.request(Method::POST, SCORES_TABLE, &identity)
                    .json(&score_rows),
                SCORES_TABLE,
            )
            .await
            {
                warn!(game_id = %game_id, error = %err, "inserting remote scores failed");
            }
        }

        Ok(CreatedGame { game_id })
    }

    async fn try_list_sessions(&self) -> SupabaseResult<Vec<RemoteSessionSummary>> {
        let identity = self.require_identity()?;
        let rows = Self::send_rows::<SessionListRow>(
            self.request(Method::GET, SESSIONS_TABLE, &identity)
                .query(&[
                    ("select", "id,created_at,session_participants(id,name)"),
                    ("order", "created_at.desc"),
                ]),
            SESSIONS_TABLE,
        )
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn try_session_full(&self, session_id: String) -> SupabaseResult<RemoteSessionFull> {
        let identity = self.require_identity()?;

        let participants = self.try_participants(&identity, &session_id);
        let games = Self::send_rows::<GameRow>(
            self.request(Method::GET, GAMES_TABLE, &identity)
                .query(&[
                    (
                        "select",
                        "id,created_at,details,game_scores(participant_id,score)".to_string(),
                    ),
                    ("session_id", format!("eq.{session_id}")),
                    ("order", "created_at.asc".to_string()),
                ]),
            GAMES_TABLE,
        );
        let session = Self::send_rows::<SessionRow>(
            self.request(Method::GET, SESSIONS_TABLE, &identity)
                .query(&[
                    ("select", "id,created_at".to_string()),
                    ("id", format!("eq.{session_id}")),
                ]),
            SESSIONS_TABLE,
        );

        let (participants, games, sessions) = futures::try_join!(participants, games, session)?;
        let session = sessions.into_iter().next().ok_or(SupabaseError::MissingRow {
            table: SESSIONS_TABLE,
        })?;

        Ok(full_session(session, participants, games))
    }

    async fn try_rename_participants(
        &self,
        old_name: String,
        new_name: String,
        scope: RenameScope,
    ) -> SupabaseResult<usize> {
        let identity = self.require_identity()?;

        let mut query = vec![
            ("select", "id".to_string()),
            ("name", format!("eq.{old_name}")),
        ];
        match &scope {
            RenameScope::Everywhere => {}
            RenameScope::Sessions(ids) if ids.is_empty() => return Ok(0),
            RenameScope::Sessions(ids) => {
                query.push(("session_id", in_filter(ids.iter().map(String::as_str))));
            }
        }

        let updated = Self::send_rows::<IdRow>(
            self.request(Method::PATCH, PARTICIPANTS_TABLE, &identity)
                .query(&query)
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&RenameRow { name: &new_name }),
            PARTICIPANTS_TABLE,
        )
        .await?;
        Ok(updated.len())
    }

    async fn try_delete_session(&self, session_id: String) -> SupabaseResult<()> {
        let identity = self.require_identity()?;
        // Participants, games and scores go with it through ON DELETE CASCADE.
        Self::send_empty(
            self.request(Method::DELETE, SESSIONS_TABLE, &identity)
                .query(&[("id", format!("eq.{session_id}"))]),
            SESSIONS_TABLE,
        )
        .await
    }

    async fn try_upsert_profile(&self, identity: &Identity, premium: bool) -> SupabaseResult<()> {
        Self::send_empty(
            self.request(Method::POST, PROFILES_TABLE, identity)
                .query(&[("on_conflict", "id")])
                .header(PREFER_HEADER, MERGE_DUPLICATES)
                .json(&[ProfileRow {
                    id: Some(identity.user_id.clone()),
                    is_premium: Some(premium),
                }]),
            PROFILES_TABLE,
        )
        .await
    }

    async fn try_load_premium(&self) -> SupabaseResult<bool> {
        let identity = self.require_identity()?;
        let rows = Self::send_rows::<ProfileRow>(
            self.request(Method::GET, PROFILES_TABLE, &identity)
                .query(&[
                    ("select", "is_premium".to_string()),
                    ("id", format!("eq.{}", identity.user_id)),
                ]),
            PROFILES_TABLE,
        )
        .await?;

        match rows.into_iter().next() {
            Some(profile) => Ok(profile.is_premium.unwrap_or(false)),
            None => {
                if let Err(err) = self.try_upsert_profile(&identity, false).await {
                    warn!(error = %err, "auto-creating remote profile failed");
                }
                Ok(false)
            }
        }
    }

    async fn try_store_premium(&self, enabled: bool) -> SupabaseResult<()> {
        let identity = self.require_identity()?;
        self.try_upsert_profile(&identity, enabled).await
    }

    async fn try_health_check(&self) -> SupabaseResult<()> {
        let url = format!("{}/", self.inner.rest_url);
        let response = self
            .inner
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.inner.anon_key.as_ref())
            .send()
            .await
            .map_err(|source| SupabaseError::RequestSend {
                table: "health",
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SupabaseError::RequestStatus {
                table: "health",
                status,
                body: String::new(),
            })
        }
    }
}

/// Collapse a failed call into its sentinel value, logging why.
fn sentinel<T>(operation: &'static str, result: SupabaseResult<T>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(SupabaseError::NotAuthenticated) => {
            debug!(operation, "skipping remote call without an authenticated user");
            fallback
        }
        Err(err) => {
            warn!(operation, error = %err, "supabase call failed");
            fallback
        }
    }
}

impl RemoteGateway for SupabaseGateway {
    fn set_identity(&self, identity: Option<Identity>) {
        let mut guard = self
            .inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = identity;
    }

    fn identity(&self) -> Option<Identity> {
        self.current_identity()
    }

    fn create_session(&self, names: Vec<String>) -> BoxFuture<'static, Option<CreatedSession>> {
        let gateway = self.clone();
        Box::pin(async move {
            let result = gateway.try_create_session(names).await.map(Some);
            sentinel("create_session", result, None)
        })
    }

    fn participants(&self, session_id: String) -> BoxFuture<'static, Vec<RemoteParticipant>> {
        let gateway = self.clone();
        Box::pin(async move {
            let result = match gateway.require_identity() {
                Ok(identity) => gateway
                    .try_participants(&identity, &session_id)
                    .await
                    .map(|rows| rows.into_iter().map(Into::into).collect()),
                Err(err) => Err(err),
            };
            sentinel("participants", result, Vec::new())
        })
    }

    fn add_game(
        &self,
        session_id: String,
        details: Option<GameDetails>,
        scores: IndexMap<String, i32>,
    ) -> BoxFuture<'static, Option<CreatedGame>> {
        let gateway = self.clone();
        Box::pin(async move {
            let result = gateway
                .try_add_game(session_id, details, scores)
                .await
                .map(Some);
            sentinel("add_game", result, None)
        })
    }

    fn list_sessions(&self) -> BoxFuture<'static, Vec<RemoteSessionSummary>> {
        let gateway = self.clone();
        Box::pin(async move {
            let result = gateway.try_list_sessions().await;
            sentinel("list_sessions", result, Vec::new())
        })
    }

    fn session_full(&self, session_id: String) -> BoxFuture<'static, Option<RemoteSessionFull>> {
        let gateway = self.clone();
        Box::pin(async move {
            let result = gateway.try_session_full(session_id).await.map(Some);
            sentinel("session_full", result, None)
        })
    }

    fn rename_participants(
        &self,
        old_name: String,
        new_name: String,
        scope: RenameScope,
    ) -> BoxFuture<'static, usize> {
        let gateway = self.clone();
        Box::pin(async move {
            let result = gateway
                .try_rename_participants(old_name, new_name, scope)
                .await;
            sentinel("rename_participants", result, 0)
        })
    }

    fn delete_session(&self, session_id: String) -> BoxFuture<'static, bool> {
        let gateway = self.clone();
        Box::pin(async move {
            let result = gateway.try_delete_session(session_id).await.map(|()| true);
            sentinel("delete_session", result, false)
        })
    }

    fn load_premium(&self) -> BoxFuture<'static, bool> {
        let gateway = self.clone();
        Box::pin(async move {
            let result = gateway.try_load_premium().await;
            sentinel("load_premium", result, false)
        })
    }

    fn store_premium(&self, enabled: bool) -> BoxFuture<'static, bool> {
        let gateway = self.clone();
        Box::pin(async move {
            let result = gateway.try_store_premium(enabled).await.map(|()| true);
            sentinel("store_premium", result, false)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let gateway = self.clone();
        Box::pin(async move { gateway.try_health_check().await.map_err(Into::into) })
    }
}
