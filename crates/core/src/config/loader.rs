use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides, e.g. `WINDMAP_STORAGE__BUCKET`.
pub const ENV_PREFIX: &str = "WINDMAP_";

/// Legacy deployment variables and the keys they set.
const LEGACY_ENV: [(&str, &str); 5] = [
    ("AWS_S3_WIND_BUCKET", "storage.bucket"),
    ("AWS_S3_ACCESS_KEY_ID", "storage.access_key_id"),
    ("AWS_S3_SECRET_ACCESS_KEY", "storage.secret_access_key"),
    ("AWS_REGION", "storage.region"),
    ("ECMWF_GENERATE_TILES", "pipeline.generate_tiles"),
];

/// Load configuration: defaults, then the optional file, then environment.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(
        // WINDMAP_CONFIG and WINDMAP_LOG_JSON belong to the binary.
        Env::prefixed(ENV_PREFIX)
            .split("__")
            .ignore(&["config", "log_json"]),
    );

    for (var, key) in LEGACY_ENV {
        figment = figment.merge(Env::raw().only(&[var]).map(move |_| key.into()));
    }

    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
