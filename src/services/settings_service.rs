use crate::{
    dao::settings::{
        MISERY_KEY, MiserySettings, SCORE_CONFIG_KEY, ScoreConfig, THEME_KEY, ThemeMode,
    },
    state::{SharedState, StoreEvent},
};

fn changed(state: &SharedState, key: &str) {
    state.events().publish(StoreEvent::SettingsChanged {
        key: key.to_string(),
    });
}

/// Current scoring constants.
pub fn score_config(state: &SharedState) -> ScoreConfig {
    state.settings().read_score_config()
}

/// Replace the scoring constants.
pub fn set_score_config(state: &SharedState, config: ScoreConfig) -> ScoreConfig {
    state.settings().write_score_config(&config);
    changed(state, SCORE_CONFIG_KEY);
    config
}

/// Current misère flags.
pub fn misery(state: &SharedState) -> MiserySettings {
    state.settings().read_misery_settings()
}

/// Store both misère flags. The legacy flag follows trump misère.
pub fn set_misery(state: &SharedState, misery: MiserySettings) -> MiserySettings {
    let settings = state.settings();
    settings.write_misery_atout(misery.atout);
    settings.write_misery_tete(misery.tete);
    settings.write_misery(misery.atout);
    changed(state, MISERY_KEY);
    settings.read_misery_settings()
}

/// Current theme.
pub fn theme(state: &SharedState) -> ThemeMode {
    state.settings().read_theme()
}

/// Persist the theme.
pub fn set_theme(state: &SharedState, theme: ThemeMode) -> ThemeMode {
    state.settings().write_theme(theme);
    changed(state, THEME_KEY);
    theme
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::local_state;

    #[test]
    fn misery_round_trips_and_keeps_legacy_flag_in_step() {
        let (state, _) = local_state();
        let stored = set_misery(
            &state,
            MiserySettings {
                atout: true,
                tete: false,
            },
        );
        assert!(stored.atout);
        assert!(!stored.tete);
        assert!(state.settings().read_misery());
    }

    #[test]
    fn theme_defaults_to_dark() {
        let (state, _) = local_state();
        assert_eq!(theme(&state), ThemeMode::Dark);
        set_theme(&state, ThemeMode::Light);
        assert_eq!(theme(&state), ThemeMode::Light);
    }
}
