//! TOML-based federate configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Top-level federate configuration parsed from TOML.
///
/// All sections have defaults matching the baseline scenario, except the
/// node list, which every scenario must supply (presets included). Load from
/// TOML with [`FederateConfig::from_toml_file`] or use
/// [`FederateConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FederateConfig {
    /// Federate identity and timing.
    #[serde(default)]
    pub federate: FederationConfig,
    /// Heat-rate curve coefficients shared by nodes without an override.
    #[serde(default)]
    pub heat_rate: HeatRateConfig,
    /// Unit conversion constants and flow limits.
    #[serde(default)]
    pub conversion: ConversionConfig,
    /// Registered network nodes and their replay schedules.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

/// Federate identity and timing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FederationConfig {
    /// Federate name used in logs.
    pub name: String,
    /// Total simulated interval to cover (must be > 0).
    pub total_interval: f64,
    /// Update interval granted per tick by the replay runtime (must be > 0).
    pub update_interval: f64,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            name: "ng2".to_string(),
            total_interval: 1.0,
            update_interval: 1.0,
        }
    }
}

/// Heat-rate curve coefficients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatRateConfig {
    /// Constant coefficient (MJ/kWh).
    pub hr0: f64,
    /// Linear coefficient ((MJ/kWh)/MW).
    pub hr1: f64,
    /// Quadratic coefficient ((MJ/kWh)/MW²).
    pub hr2: f64,
}

impl Default for HeatRateConfig {
    fn default() -> Self {
        Self {
            hr0: 20.0,
            hr1: -0.075,
            hr2: 0.001,
        }
    }
}

/// Unit conversion constants and flow limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    /// MJ/kWh to MJ/MWh conversion factor (must be > 0).
    pub unit_factor: f64,
    /// Gross calorific value of the fuel (MJ/m³, must be > 0).
    pub gcv_mj_m3: f64,
    /// Minimum deliverable volumetric flow (m³/s).
    pub flow_min_m3s: f64,
    /// Maximum deliverable volumetric flow (m³/s).
    pub flow_max_m3s: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            unit_factor: 3.6,
            gcv_mj_m3: 39.0,
            flow_min_m3s: 0.0,
            flow_max_m3s: 1000.0,
        }
    }
}

/// One registered network node.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Node identity (channel name suffix, e.g. `"2"`).
    pub id: String,
    /// Replay schedule of requested powers (MW), one per tick, wrapping.
    pub requested_mw: Vec<f64>,
    /// Per-node heat-rate override; the global curve applies when absent.
    #[serde(default)]
    pub heat_rate: Option<HeatRateConfig>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"conversion.gcv_mj_m3"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl FederateConfig {
    /// Returns the baseline scenario: the two-node gas federate with the
    /// default curve, GCV 39 MJ/m³, flow limits [0, 1000] m³/s, and a
    /// one-tick interval.
    pub fn baseline() -> Self {
        Self {
            federate: FederationConfig::default(),
            heat_rate: HeatRateConfig::default(),
            conversion: ConversionConfig::default(),
            nodes: vec![
                NodeConfig {
                    id: "2".to_string(),
                    requested_mw: vec![500.0],
                    heat_rate: None,
                },
                NodeConfig {
                    id: "3".to_string(),
                    requested_mw: vec![300.0],
                    heat_rate: None,
                },
            ],
        }
    }

    /// Returns the stressed preset: a six-tick run whose request schedules
    /// push the required flow through both limits.
    pub fn stressed() -> Self {
        Self {
            federate: FederationConfig {
                total_interval: 6.0,
                ..FederationConfig::default()
            },
            heat_rate: HeatRateConfig::default(),
            conversion: ConversionConfig::default(),
            nodes: vec![
                NodeConfig {
                    id: "2".to_string(),
                    requested_mw: vec![500.0, 1500.0, 2500.0, -100.0, 800.0, 40.0],
                    heat_rate: None,
                },
                NodeConfig {
                    id: "3".to_string(),
                    requested_mw: vec![300.0, 3000.0, -50.0, 650.0, 1200.0, 0.0],
                    heat_rate: None,
                },
            ],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "stressed"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "stressed" => Ok(Self::stressed()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let f = &self.federate;

        if f.total_interval <= 0.0 {
            errors.push(ConfigError {
                field: "federate.total_interval".into(),
                message: "must be > 0".into(),
            });
        }
        if f.update_interval <= 0.0 {
            errors.push(ConfigError {
                field: "federate.update_interval".into(),
                message: "must be > 0".into(),
            });
        }

        let c = &self.conversion;
        if c.unit_factor <= 0.0 {
            errors.push(ConfigError {
                field: "conversion.unit_factor".into(),
                message: "must be > 0".into(),
            });
        }
        if c.gcv_mj_m3 <= 0.0 {
            errors.push(ConfigError {
                field: "conversion.gcv_mj_m3".into(),
                message: "must be > 0".into(),
            });
        }
        if c.flow_min_m3s > c.flow_max_m3s {
            errors.push(ConfigError {
                field: "conversion.flow_min_m3s".into(),
                message: "must be <= conversion.flow_max_m3s".into(),
            });
        }

        if self.nodes.is_empty() {
            errors.push(ConfigError {
                field: "nodes".into(),
                message: "at least one node must be configured".into(),
            });
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if node.id.is_empty() {
                errors.push(ConfigError {
                    field: format!("nodes[{i}].id"),
                    message: "must not be empty".into(),
                });
            }
            if self.nodes[..i].iter().any(|n| n.id == node.id) {
                errors.push(ConfigError {
                    field: format!("nodes[{i}].id"),
                    message: format!("duplicate node id \"{}\"", node.id),
                });
            }
            if node.requested_mw.is_empty() {
                errors.push(ConfigError {
                    field: format!("nodes[{i}].requested_mw"),
                    message: "schedule must not be empty".into(),
                });
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_is_valid() {
        assert!(FederateConfig::baseline().validate().is_empty());
        assert!(FederateConfig::stressed().validate().is_empty());
    }

    #[test]
    fn defaults_match_the_baseline_constants() {
        let cfg = FederateConfig::baseline();
        assert_eq!(cfg.heat_rate.hr0, 20.0);
        assert_eq!(cfg.heat_rate.hr1, -0.075);
        assert_eq!(cfg.heat_rate.hr2, 0.001);
        assert_eq!(cfg.conversion.gcv_mj_m3, 39.0);
        assert_eq!(cfg.conversion.flow_min_m3s, 0.0);
        assert_eq!(cfg.conversion.flow_max_m3s, 1000.0);
        assert_eq!(cfg.federate.total_interval, 1.0);
        assert_eq!(cfg.nodes.len(), 2);
    }

    #[test]
    fn parses_a_minimal_toml_scenario() {
        let cfg = FederateConfig::from_toml_str(
            r#"
            [[nodes]]
            id = "2"
            requested_mw = [500.0]
            "#,
        )
        .unwrap();
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.nodes.len(), 1);
        assert_eq!(cfg.conversion.unit_factor, 3.6);
    }

    #[test]
    fn per_node_heat_rate_override_parses() {
        let cfg = FederateConfig::from_toml_str(
            r#"
            [[nodes]]
            id = "2"
            requested_mw = [500.0]

            [nodes.heat_rate]
            hr0 = 18.0
            hr1 = -0.05
            hr2 = 0.002

            [[nodes]]
            id = "3"
            requested_mw = [300.0]
            "#,
        )
        .unwrap();
        let hr = cfg.nodes[0].heat_rate.as_ref().unwrap();
        assert_eq!(hr.hr0, 18.0);
        assert!(cfg.nodes[1].heat_rate.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = FederateConfig::from_toml_str("[federate]\nbogus = 1\n").unwrap_err();
        assert_eq!(err.field, "toml");
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let err = FederateConfig::from_preset("nope").unwrap_err();
        assert!(err.message.contains("baseline"));
    }

    #[test]
    fn validation_catches_bad_fields() {
        let mut cfg = FederateConfig::baseline();
        cfg.federate.total_interval = 0.0;
        cfg.conversion.gcv_mj_m3 = -1.0;
        cfg.conversion.flow_min_m3s = 2000.0;
        cfg.nodes[1].id = "2".to_string();
        cfg.nodes[0].requested_mw.clear();
        let errors = cfg.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"federate.total_interval"));
        assert!(fields.contains(&"conversion.gcv_mj_m3"));
        assert!(fields.contains(&"conversion.flow_min_m3s"));
        assert!(fields.contains(&"nodes[1].id"));
        assert!(fields.contains(&"nodes[0].requested_mw"));
    }
}
