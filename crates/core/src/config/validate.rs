use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Storage bucket is set
/// - URL template is set and contains `{FORECAST}`
/// - Offset range expands to valid offsets
/// - Replication window, raster size and tool timeout are non-zero
/// - Zoom range is not inverted
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.storage.bucket.trim().is_empty() {
        return Err(invalid(
            "storage.bucket is required (set WINDMAP_STORAGE__BUCKET or AWS_S3_WIND_BUCKET)",
        ));
    }

    let template = config.source.url_template.trim();
    if template.is_empty() {
        return Err(invalid("source.url_template cannot be empty"));
    }
    if !template.contains("{FORECAST}") {
        return Err(invalid(
            "source.url_template must contain the {FORECAST} placeholder",
        ));
    }

    let offsets = config
        .source
        .offsets
        .offsets()
        .map_err(|e| invalid(format!("source.offsets: {}", e)))?;
    if offsets.is_empty() {
        return Err(invalid("source.offsets selects no forecast offsets"));
    }

    let pipeline = &config.pipeline;
    if pipeline.replicate_hours == 0 {
        return Err(invalid("pipeline.replicate_hours cannot be 0"));
    }
    if pipeline.preview_name.trim().is_empty() || pipeline.preview_name.contains('/') {
        return Err(invalid(
            "pipeline.preview_name must be a plain, non-empty file name",
        ));
    }
    if pipeline.components.is_empty() {
        return Err(invalid("pipeline.components cannot be empty"));
    }
    if pipeline.raster.width == 0 || pipeline.raster.height == 0 {
        return Err(invalid("pipeline.raster width and height cannot be 0"));
    }
    if pipeline.raster.scale_min >= pipeline.raster.scale_max {
        return Err(invalid("pipeline.raster.scale_min must be below scale_max"));
    }
    if !pipeline.zoom.is_valid() {
        return Err(invalid(format!(
            "pipeline.zoom min {} is above max {}",
            pipeline.zoom.min, pipeline.zoom.max
        )));
    }

    if config.tools.timeout_secs == 0 {
        return Err(invalid("tools.timeout_secs cannot be 0"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::StorageConfig;
    use crate::schedule::OffsetRange;
    use crate::tools::ZoomRange;

    fn valid_config() -> Config {
        Config {
            storage: StorageConfig::for_bucket("wind-tiles"),
            ..Config::default()
        }
    }

    fn assert_invalid(config: &Config, needle: &str) {
        match validate_config(config) {
            Err(ConfigError::ValidationError(message)) => {
                assert!(message.contains(needle), "{} missing from {}", needle, message)
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_missing_bucket_fails() {
        assert_invalid(&Config::default(), "storage.bucket");
    }

    #[test]
    fn test_validate_url_template() {
        let mut config = valid_config();
        config.source.url_template = "  ".to_string();
        assert_invalid(&config, "cannot be empty");

        config.source.url_template = "http://mirror/{RELEASE}.grib2".to_string();
        assert_invalid(&config, "{FORECAST}");
    }

    #[test]
    fn test_validate_offsets() {
        let mut config = valid_config();
        config.source.offsets = OffsetRange::new(9, 18, 0);
        assert_invalid(&config, "source.offsets");

        config.source.offsets = OffsetRange::new(18, 9, 3);
        assert_invalid(&config, "source.offsets");

        config.source.offsets = OffsetRange::new(10, 12, 2);
        assert_invalid(&config, "source.offsets");
    }

    #[test]
    fn test_validate_pipeline() {
        let mut config = valid_config();
        config.pipeline.replicate_hours = 0;
        assert_invalid(&config, "replicate_hours");

        let mut config = valid_config();
        config.pipeline.raster.height = 0;
        assert_invalid(&config, "raster");

        let mut config = valid_config();
        config.pipeline.zoom = ZoomRange::new(5, 2);
        assert_invalid(&config, "pipeline.zoom");

        let mut config = valid_config();
        config.pipeline.preview_name = "a/b.png".to_string();
        assert_invalid(&config, "preview_name");
    }

    #[test]
    fn test_validate_tool_timeout() {
        let mut config = valid_config();
        config.tools.timeout_secs = 0;
        assert_invalid(&config, "tools.timeout_secs");
    }
}
