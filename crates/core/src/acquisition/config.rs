//! Configuration for the acquisition module.

use serde::{Deserialize, Serialize};

use crate::schedule::{ForecastOffset, OffsetRange, ReleaseWindow};

/// Where and how forecast files are fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL template with `{YEAR}`, `{MONTH}`, `{DAY}`, `{RELEASE}` and
    /// `{FORECAST}` placeholders.
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Forecast offsets fetched per release.
    #[serde(default)]
    pub offsets: OffsetRange,

    /// Timeout for a whole download in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for establishing a connection in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_url_template() -> String {
    "https://data.ecmwf.int/forecasts/{YEAR}{MONTH}{DAY}/{RELEASE}z/0p4-beta/oper/\
     {YEAR}{MONTH}{DAY}{RELEASE}0000-{FORECAST}h-oper-fc.grib2"
        .to_string()
}

fn default_request_timeout() -> u64 {
    600 // 10 minutes
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            offsets: OffsetRange::default(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl SourceConfig {
    /// Sets the URL template.
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    /// Sets the offset range.
    pub fn with_offsets(mut self, offsets: OffsetRange) -> Self {
        self.offsets = offsets;
        self
    }

    /// Resolves the template for one release and offset.
    pub fn resolve_url(&self, window: &ReleaseWindow, offset: ForecastOffset) -> String {
        self.url_template
            .replace("{YEAR}", &window.date.format("%Y").to_string())
            .replace("{MONTH}", &window.date.format("%m").to_string())
            .replace("{DAY}", &window.date.format("%d").to_string())
            .replace("{RELEASE}", window.hour.code())
            .replace("{FORECAST}", &offset.hours().to_string())
    }
}
