use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::settings::ThemeMode;

/// Display theme preference.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThemeBody {
    pub theme: ThemeMode,
}
