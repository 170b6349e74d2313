/// TOML configuration (`scribe.toml`) and environment overrides.
pub mod toml_config;
