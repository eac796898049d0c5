//! Typed user settings stored next to the session store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::dao::{local_store::LocalStore, models::Contract};

/// Legacy single toggle covering both misère kinds.
pub const MISERY_KEY: &str = "settings:misery";
/// Trump misère toggle.
pub const MISERY_ATOUT_KEY: &str = "settings:misery_atout";
/// Head misère toggle.
pub const MISERY_TETE_KEY: &str = "settings:misery_tete";
/// Scoring constants as a JSON object.
pub const SCORE_CONFIG_KEY: &str = "settings:score_config";
/// UI theme, stored as a bare word.
pub const THEME_KEY: &str = "settings:theme";

/// Multiplier applied to deal points for each contract tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ContractMultipliers {
    /// Applied to a prise.
    pub prise: i32,
    /// Applied to a garde.
    pub garde: i32,
    /// Applied to a garde sans.
    pub garde_sans: i32,
    /// Applied to a garde contre.
    pub garde_contre: i32,
}

impl ContractMultipliers {
    /// Multiplier of `contract`.
    pub fn for_contract(&self, contract: Contract) -> i32 {
        match contract {
            Contract::Prise => self.prise,
            Contract::Garde => self.garde,
            Contract::GardeSans => self.garde_sans,
            Contract::GardeContre => self.garde_contre,
        }
    }
}

/// Flat bonus per handful size, paid to the winning side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PoigneeBonuses {
    /// Simple handful.
    pub simple: i32,
    /// Double handful.
    pub double: i32,
    /// Triple handful.
    pub triple: i32,
}

/// Slam bonuses credited to the taker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ChelemBonuses {
    /// Slam made without an announcement.
    pub non_annonce_reussi: i32,
    /// Announced slam made.
    pub annonce_reussi: i32,
    /// Usually negative: applied to the taker when an announced slam fails.
    pub annonce_rate: i32,
}

/// Tunable scoring constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ScoreConfig {
    /// Points of a contract made with no margin.
    pub base: i32,
    /// Per-contract multipliers.
    pub multipliers: ContractMultipliers,
    /// Bonus for the petit in the last trick, before the multiplier.
    pub petit_au_bout: i32,
    /// Handful bonuses.
    pub poignee: PoigneeBonuses,
    /// Slam bonuses.
    pub chelem: ChelemBonuses,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            base: 25,
            multipliers: ContractMultipliers {
                prise: 1,
                garde: 2,
                garde_sans: 4,
                garde_contre: 6,
            },
            petit_au_bout: 10,
            poignee: PoigneeBonuses {
                simple: 20,
                double: 30,
                triple: 40,
            },
            chelem: ChelemBonuses {
                non_annonce_reussi: 200,
                annonce_reussi: 400,
                annonce_rate: -200,
            },
        }
    }
}

impl ScoreConfig {
    /// Build a configuration from loosely-typed JSON, falling back to the
    /// default independently for every missing or invalid field.
    pub fn from_value(value: &Value) -> Self {
        let d = Self::default();
        let field = |pointer: &str, default: i32| coerce_int(value.pointer(pointer), default);
        Self {
            base: field("/base", d.base),
            multipliers: ContractMultipliers {
                prise: field("/multipliers/prise", d.multipliers.prise),
                garde: field("/multipliers/garde", d.multipliers.garde),
                garde_sans: field("/multipliers/garde_sans", d.multipliers.garde_sans),
                garde_contre: field("/multipliers/garde_contre", d.multipliers.garde_contre),
            },
            petit_au_bout: field("/petit_au_bout", d.petit_au_bout),
            poignee: PoigneeBonuses {
                simple: field("/poignee/simple", d.poignee.simple),
                double: field("/poignee/double", d.poignee.double),
                triple: field("/poignee/triple", d.poignee.triple),
            },
            chelem: ChelemBonuses {
                non_annonce_reussi: field("/chelem/non_annonce_reussi", d.chelem.non_annonce_reussi),
                annonce_reussi: field("/chelem/annonce_reussi", d.chelem.annonce_reussi),
                annonce_rate: field("/chelem/annonce_rate", d.chelem.annonce_rate),
            },
        }
    }
}

/// Coerce a JSON value to an integer the way a lenient number cast would:
/// numbers, numeric strings and booleans are accepted, everything else
/// (including non-finite and out-of-range values) yields `default`.
fn coerce_int(value: Option<&Value>, default: i32) -> i32 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n >= i32::MIN as f64 && n <= i32::MAX as f64 => n.round() as i32,
        _ => default,
    }
}

/// Visual theme persisted for the UI.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Default theme.
    #[default]
    Dark,
    /// Light theme.
    Light,
}

impl ThemeMode {
    fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }
}

/// Per-kind misère toggles resolved from the current and legacy keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MiserySettings {
    /// Trump misère enabled.
    pub atout: bool,
    /// Head misère enabled.
    pub tete: bool,
}

/// Read/write access to the user settings documents.
#[derive(Clone)]
pub struct SettingsRepository {
    store: LocalStore,
}

impl SettingsRepository {
    /// Settings stored through `store`.
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Stored scoring constants. Missing or malformed fields take their default.
    pub fn read_score_config(&self) -> ScoreConfig {
        self.store
            .read_json::<Value>(SCORE_CONFIG_KEY)
            .map(|value| ScoreConfig::from_value(&value))
            .unwrap_or_default()
    }

    /// Replace the scoring constants.
    pub fn write_score_config(&self, config: &ScoreConfig) {
        self.store.write_json(SCORE_CONFIG_KEY, config);
    }

    /// Legacy global misère flag. Only an explicit `"1"` enables it, except
    /// when storage cannot be read at all.
    pub fn read_misery(&self) -> bool {
        match self.store.read_raw(MISERY_KEY) {
            Ok(value) => value.as_deref() == Some("1"),
            Err(_) => true,
        }
    }

    /// Set the legacy global flag.
    pub fn write_misery(&self, enabled: bool) {
        self.write_flag(MISERY_KEY, enabled);
    }

    /// Trump misère flag, falling back to the legacy flag when unset.
    pub fn read_misery_atout(&self) -> bool {
        self.read_successor_flag(MISERY_ATOUT_KEY)
    }

    /// Set the trump misère flag.
    pub fn write_misery_atout(&self, enabled: bool) {
        self.write_flag(MISERY_ATOUT_KEY, enabled);
    }

    /// Head misère flag, falling back to the legacy flag when unset.
    pub fn read_misery_tete(&self) -> bool {
        self.read_successor_flag(MISERY_TETE_KEY)
    }

    /// Set the head misère flag.
    pub fn write_misery_tete(&self, enabled: bool) {
        self.write_flag(MISERY_TETE_KEY, enabled);
    }

    /// Both misère flags.
    pub fn read_misery_settings(&self) -> MiserySettings {
        MiserySettings {
            atout: self.read_misery_atout(),
            tete: self.read_misery_tete(),
        }
    }

    /// Stored theme, dark unless `light` was saved.
    pub fn read_theme(&self) -> ThemeMode {
        match self.store.read_raw(THEME_KEY) {
            Ok(Some(value)) if value == "light" => ThemeMode::Light,
            _ => ThemeMode::Dark,
        }
    }

    /// Persist the theme.
    pub fn write_theme(&self, theme: ThemeMode) {
        self.store.write_raw(THEME_KEY, theme.as_str());
    }

    fn read_successor_flag(&self, key: &str) -> bool {
        match self.store.read_raw(key) {
            Ok(Some(value)) if value == "1" => true,
            Ok(Some(value)) if value == "0" => false,
            Ok(_) => self.read_misery(),
            Err(_) => true,
        }
    }

    fn write_flag(&self, key: &str, enabled: bool) {
        self.store.write_raw(key, if enabled { "1" } else { "0" });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::dao::kv::{KeyValueBackend, MemoryKvBackend};

    fn repository() -> (Arc<MemoryKvBackend>, SettingsRepository) {
        let backend = Arc::new(MemoryKvBackend::new());
        let repo = SettingsRepository::new(LocalStore::new(backend.clone()));
        (backend, repo)
    }

    #[test]
    fn score_config_defaults_without_prior_write() {
        let (_, repo) = repository();
        assert_eq!(repo.read_score_config(), ScoreConfig::default());
    }

    #[test]
    fn score_config_round_trips() {
        let (_, repo) = repository();
        let mut config = ScoreConfig::default();
        config.base = 30;
        config.multipliers.garde_contre = 8;
        config.chelem.annonce_rate = -150;
        repo.write_score_config(&config);
        assert_eq!(repo.read_score_config(), config);
    }

    #[test]
    fn malformed_fields_fall_back_individually() {
        let value = json!({
            "base": "40",
            "multipliers": { "prise": true, "garde": "lots", "garde_sans": null },
            "petit_au_bout": 12.6,
            "poignee": "not an object",
            "chelem": { "annonce_rate": -250 }
        });
        let config = ScoreConfig::from_value(&value);
        let defaults = ScoreConfig::default();

        assert_eq!(config.base, 40);
        assert_eq!(config.multipliers.prise, 1);
        assert_eq!(config.multipliers.garde, defaults.multipliers.garde);
        assert_eq!(config.multipliers.garde_sans, defaults.multipliers.garde_sans);
        assert_eq!(config.multipliers.garde_contre, defaults.multipliers.garde_contre);
        assert_eq!(config.petit_au_bout, 13);
        assert_eq!(config.poignee, defaults.poignee);
        assert_eq!(config.chelem.annonce_rate, -250);
        assert_eq!(config.chelem.annonce_reussi, defaults.chelem.annonce_reussi);
    }

    #[test]
    fn unparsable_score_config_reads_defaults() {
        let (backend, repo) = repository();
        backend.set(SCORE_CONFIG_KEY, "{{{").unwrap();
        assert_eq!(repo.read_score_config(), ScoreConfig::default());
    }

    #[test]
    fn successor_flags_fall_back_to_legacy_value() {
        let (_, repo) = repository();
        assert!(!repo.read_misery_atout());
        assert!(!repo.read_misery_tete());

        repo.write_misery(true);
        assert!(repo.read_misery_atout());
        assert!(repo.read_misery_tete());

        repo.write_misery_tete(false);
        assert!(repo.read_misery_atout());
        assert!(!repo.read_misery_tete());
    }

    #[test]
    fn flags_default_to_enabled_when_storage_is_unavailable() {
        let (backend, repo) = repository();
        backend.set_disabled(true);
        assert!(repo.read_misery());
        assert!(repo.read_misery_atout());
        assert!(repo.read_misery_tete());
        assert_eq!(repo.read_theme(), ThemeMode::Dark);
        assert_eq!(repo.read_score_config(), ScoreConfig::default());
    }

    #[test]
    fn theme_accepts_only_known_values() {
        let (backend, repo) = repository();
        assert_eq!(repo.read_theme(), ThemeMode::Dark);
        repo.write_theme(ThemeMode::Light);
        assert_eq!(repo.read_theme(), ThemeMode::Light);
        backend.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(repo.read_theme(), ThemeMode::Dark);
    }
}
