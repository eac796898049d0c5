use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{TimestampMilliSeconds, serde_as};
use utoipa::ToSchema;

/// Bid tier announced by the taker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Contract {
    /// Lowest bid.
    Prise,
    /// Second bid tier.
    Garde,
    /// Dog set aside unseen, counted for the taker.
    GardeSans,
    /// Dog goes to the defence.
    GardeContre,
}

/// One of the three oudlers counted in the taker's tricks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub enum Bout {
    /// The 1 of trumps.
    #[serde(rename = "petit")]
    Petit,
    /// The 21 of trumps.
    #[serde(rename = "21")]
    TwentyOne,
    /// The fool.
    #[serde(rename = "excuse")]
    Excuse,
}

/// Side that took the last trick with the petit, if any.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PetitAuBout {
    /// Petit not played in the last trick.
    #[default]
    None,
    /// Taken by the taker side.
    Preneur,
    /// Taken by the defence.
    Defense,
}

/// Handful declared during the deal, by side and size.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Poignee {
    /// No handful declared.
    #[default]
    None,
    /// Simple handful shown by the taker side.
    TakerSimple,
    /// Double handful shown by the taker side.
    TakerDouble,
    /// Triple handful shown by the taker side.
    TakerTriple,
    /// Simple handful shown by the defence.
    DefenseSimple,
    /// Double handful shown by the defence.
    DefenseDouble,
    /// Triple handful shown by the defence.
    DefenseTriple,
}

/// Size of a declared handful, independent of the side that showed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoigneeSize {
    /// Ten trumps at four players.
    Simple,
    /// Thirteen trumps at four players.
    Double,
    /// Fifteen trumps at four players.
    Triple,
}

impl Poignee {
    /// Size of the handful, `None` when nothing was declared.
    pub fn size(self) -> Option<PoigneeSize> {
        match self {
            Poignee::None => None,
            Poignee::TakerSimple | Poignee::DefenseSimple => Some(PoigneeSize::Simple),
            Poignee::TakerDouble | Poignee::DefenseDouble => Some(PoigneeSize::Double),
            Poignee::TakerTriple | Poignee::DefenseTriple => Some(PoigneeSize::Triple),
        }
    }
}

/// Slam outcome for the deal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Chelem {
    /// No slam.
    #[default]
    None,
    /// Every trick taken without an announcement.
    NonAnnonceReussi,
    /// Announced and made.
    AnnonceReussi,
    /// Announced and missed.
    AnnonceRate,
}

/// Structured outcome of one deal.
///
/// Field names follow the JSON layout written by the web client so documents
/// stored remotely stay readable by both.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameDetails {
    /// Name of the player who took the contract. Empty once that player was deleted.
    pub taker: String,
    /// Partner called by the taker (five-player games).
    #[serde(default)]
    pub called: Option<String>,
    /// Bid the taker committed to.
    pub contract: Contract,
    /// Number of oudlers held by the taker (0 to 3).
    pub bouts: u8,
    /// Which oudlers the taker held, when recorded.
    #[serde(rename = "bouts_detail", default, skip_serializing_if = "Vec::is_empty")]
    pub bouts_detail: Vec<Bout>,
    /// Card points counted by the taker, halves allowed.
    pub taker_points: f64,
    /// Who won the petit in the last trick.
    #[serde(default)]
    pub petit_au_bout: PetitAuBout,
    /// Handful declared during the deal.
    #[serde(default)]
    pub poignee: Poignee,
    /// Players declaring a trump misère.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub miseres: Vec<String>,
    /// Players declaring a head misère.
    #[serde(rename = "miseres_tete", default, skip_serializing_if = "Vec::is_empty")]
    pub miseres_tete: Vec<String>,
    /// Slam outcome.
    #[serde(default)]
    pub chelem: Chelem,
}

/// One recorded deal inside a session.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameEntity {
    /// Local identifier of the game.
    pub id: String,
    /// When the game was recorded.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub timestamp: SystemTime,
    /// Points per participant name for this deal.
    pub scores: IndexMap<String, i32>,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Deal description the scores were computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<GameDetails>,
    /// Set while the backend has not acknowledged this game.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending_remote: bool,
}

/// A tracked set of games played by a fixed group of participants.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntity {
    /// Local identifier, immutable once assigned.
    pub id: String,
    /// Backend identifier, present once the session is linked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    /// Unique, trimmed, non-empty participant names in seating order.
    pub participants: Vec<String>,
    /// Games in the order they were played.
    #[serde(default)]
    pub games: Vec<GameEntity>,
    /// Creation time, the remote one for imported sessions.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub created_at: SystemTime,
}

impl SessionEntity {
    /// Whether the session has been linked to a backend row.
    pub fn is_linked(&self) -> bool {
        self.remote_id.is_some()
    }
}

/// Whole session store as persisted under a single key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreSnapshot {
    /// Sessions keyed by local id, in creation order.
    #[serde(default)]
    pub sessions: IndexMap<String, SessionEntity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_documents_written_by_the_web_client() {
        let raw = r#"{
            "sessions": {
                "sess_lx2_abc": {
                    "id": "sess_lx2_abc",
                    "remoteId": "0d6f",
                    "participants": ["Alice", "Bob", "Chloé", "Denis"],
                    "createdAt": 1714560000000,
                    "games": [{
                        "id": "g_lx3_def",
                        "timestamp": 1714560100000,
                        "scores": {"Alice": 174, "Bob": -58, "Chloé": -58, "Denis": -58},
                        "details": {
                            "taker": "Alice",
                            "called": null,
                            "contract": "garde",
                            "bouts": 2,
                            "bouts_detail": ["petit", "21"],
                            "takerPoints": 45,
                            "petitAuBout": "none",
                            "poignee": "none",
                            "miseres_tete": ["Bob"],
                            "chelem": "none"
                        }
                    }]
                }
            }
        }"#;

        let snapshot: StoreSnapshot = serde_json::from_str(raw).unwrap();
        let session = &snapshot.sessions["sess_lx2_abc"];
        assert_eq!(session.remote_id.as_deref(), Some("0d6f"));
        let game = &session.games[0];
        assert!(!game.pending_remote);
        assert_eq!(game.scores["Alice"], 174);
        let details = game.details.as_ref().unwrap();
        assert_eq!(details.contract, Contract::Garde);
        assert_eq!(details.bouts_detail, vec![Bout::Petit, Bout::TwentyOne]);
        assert_eq!(details.called, None);
        assert_eq!(details.miseres_tete, vec!["Bob".to_string()]);
        assert!(details.miseres.is_empty());
    }

    #[test]
    fn pending_flag_is_omitted_when_clear() {
        let game = GameEntity {
            id: "g_1".into(),
            timestamp: SystemTime::UNIX_EPOCH,
            scores: IndexMap::new(),
            note: None,
            details: None,
            pending_remote: false,
        };
        let json = serde_json::to_value(&game).unwrap();
        assert!(json.get("pendingRemote").is_none());
        assert_eq!(json["timestamp"], 0);
    }
}
