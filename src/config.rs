// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine configuration system

use crate::engine::{self, BooleanEngine};
use crate::error::{EngineError, EngineResult};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default distance below which vertices and edges are considered coincident
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// File looked up by [`EngineConfig::load`] in the working directory
pub const CONFIG_FILE_NAME: &str = "meshbool.toml";

/// Cleanup pipeline tolerances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Vertices closer than this are merged
    pub vertex_merge_tolerance: f64,
    /// Edges shorter than this are collapsed
    pub short_edge_tolerance: f64,
    /// Upper bound on collapse sweeps; `None` uses the input's edge count
    pub max_collapse_passes: Option<usize>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            vertex_merge_tolerance: DEFAULT_TOLERANCE,
            short_edge_tolerance: DEFAULT_TOLERANCE,
            max_collapse_passes: None,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Kernel used when the caller does not name one
    pub default_engine: Option<String>,
    pub cleanup: CleanupConfig,
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        Self::read_file(path.as_ref()).map_err(config_error)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        Self::parse(content).map_err(config_error)
    }

    /// Load `meshbool.toml` if present, then apply environment variable overrides
    pub fn load() -> EngineResult<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE_NAME).exists() {
            Self::from_file(CONFIG_FILE_NAME)?
        } else {
            Self::default()
        };

        config.apply_env().map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        self.write_file(path.as_ref()).map_err(config_error)
    }

    /// Kernel named by `default_engine`, else the first built-in one
    pub fn engine_name(&self) -> EngineResult<String> {
        if let Some(name) = &self.default_engine {
            return Ok(name.clone());
        }
        engine::available_engines()
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Config("no boolean engine is compiled in".to_string()))
    }

    /// Construct the configured engine with these settings applied
    pub fn create_engine(&self) -> EngineResult<BooleanEngine> {
        let name = self.engine_name()?;
        Ok(engine::create(&name)?.with_config(self.clone()))
    }

    /// Reject tolerances that are negative or not finite
    pub fn validate(&self) -> EngineResult<()> {
        self.check().map_err(config_error)
    }

    fn check(&self) -> Result<()> {
        check_tolerance("vertex_merge_tolerance", self.cleanup.vertex_merge_tolerance)?;
        check_tolerance("short_edge_tolerance", self.cleanup.short_edge_tolerance)?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content).context("Invalid TOML")?;
        config.check()?;
        Ok(config)
    }

    fn write_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(engine) = std::env::var("MESHBOOL_ENGINE") {
            self.default_engine = Some(engine);
        }

        if let Ok(tolerance) = std::env::var("MESHBOOL_MERGE_TOLERANCE") {
            self.cleanup.vertex_merge_tolerance = tolerance
                .parse()
                .with_context(|| format!("MESHBOOL_MERGE_TOLERANCE is not a number: {tolerance}"))?;
        }

        if let Ok(tolerance) = std::env::var("MESHBOOL_EDGE_TOLERANCE") {
            self.cleanup.short_edge_tolerance = tolerance
                .parse()
                .with_context(|| format!("MESHBOOL_EDGE_TOLERANCE is not a number: {tolerance}"))?;
        }

        Ok(())
    }
}

fn check_tolerance(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        bail!("{name} must be a finite, non-negative number (got {value})");
    }
    Ok(())
}

fn config_error(err: anyhow::Error) -> EngineError {
    EngineError::Config(format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_engine, None);
        assert_eq!(config.cleanup.vertex_merge_tolerance, 1e-6);
        assert_eq!(config.cleanup.short_edge_tolerance, 1e-6);
        assert_eq!(config.cleanup.max_collapse_passes, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            default_engine = "bsp"

            [cleanup]
            short_edge_tolerance = 0.001
            "#,
        )
        .unwrap();

        assert_eq!(config.default_engine.as_deref(), Some("bsp"));
        assert_eq!(config.cleanup.short_edge_tolerance, 0.001);
        assert_eq!(config.cleanup.vertex_merge_tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let err = EngineConfig::from_toml_str("[cleanup]\nvertex_merge_tolerance = -1.0\n")
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(ref msg) if msg.contains("vertex_merge_tolerance")));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = EngineConfig::from_toml_str("default_engine = [").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meshbool.toml");

        let config = EngineConfig {
            default_engine: Some("raycast".to_string()),
            cleanup: CleanupConfig {
                vertex_merge_tolerance: 1e-4,
                short_edge_tolerance: 1e-3,
                max_collapse_passes: Some(4),
            },
        };
        config.save(&path).unwrap();

        let reloaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = EngineConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, EngineError::Config(ref msg) if msg.contains("Failed to read")));
    }

    #[cfg(all(feature = "bsp", feature = "raycast"))]
    #[test]
    fn test_create_engine_uses_default_engine() {
        let config = EngineConfig::from_toml_str(
            r#"
            default_engine = "raycast"

            [cleanup]
            vertex_merge_tolerance = 0.01
            "#,
        )
        .unwrap();

        let engine = config.create_engine().unwrap();
        assert_eq!(engine.kernel_name(), "raycast");
        assert_eq!(engine.config(), &config);

        let fallback = EngineConfig::default().create_engine().unwrap();
        assert_eq!(fallback.kernel_name(), "bsp");
    }

    #[test]
    fn test_create_engine_unknown_name() {
        let config = EngineConfig {
            default_engine: Some("cork".to_string()),
            ..EngineConfig::default()
        };
        let err = config.create_engine().unwrap_err();
        assert_eq!(err, EngineError::NotImplemented("cork".to_string()));
    }
}
