//! Scenario reconciliation
//!
//! A scenario file declares the capabilities a site registers, each with a
//! scripted detection outcome, and the user's preferences:
//!
//! ```toml
//! [[capabilities]]
//! name = "pay/card"
//! supported = true
//! details = { network = "visa" }
//! delay_ms = 20
//!
//! [[capabilities]]
//! name = "wallet/*"
//! fail = true
//!
//! [preferences]
//! allow = ["pay/card"]
//! deny = ["wallet/*"]
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use monet_capability::{plugin, Plugin};
use monet_core::{DetectOptions, DetectionResult, Error};
use monet_runtime::Monetization;

use super::open_runtime;

/// A registered capability and its scripted detection
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCapability {
    /// Capability name
    pub name: String,

    /// Reported support
    #[serde(default)]
    pub supported: bool,

    /// Reported details
    #[serde(default)]
    pub details: Option<Value>,

    /// How long the detection takes
    #[serde(default)]
    pub delay_ms: u64,

    /// Whether the detection fails instead of reporting
    #[serde(default)]
    pub fail: bool,

    /// Report unsupported when the detection takes longer than this
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ScenarioCapability {
    fn plugin(&self) -> Result<Plugin> {
        let outcome = if self.fail {
            Err(Error::Detection(format!("{} detection failed", self.name)))
        } else {
            Ok(DetectionResult {
                is_supported: self.supported,
                details: self.details.clone(),
            })
        };
        let delay = Duration::from_millis(self.delay_ms);

        let scripted = plugin::from_fn(&self.name, move || {
            let outcome = outcome.clone();
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                outcome
            }
        })?;

        Ok(match self.timeout_ms {
            Some(ms) => plugin::with_timeout(scripted, Duration::from_millis(ms)),
            None => scripted,
        })
    }
}

/// The user's preferences in a scenario
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioPreferences {
    #[serde(default)]
    pub allow: Vec<String>,

    #[serde(default)]
    pub deny: Vec<String>,
}

/// A reconciliation scenario
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub capabilities: Vec<ScenarioCapability>,

    #[serde(default)]
    pub preferences: ScenarioPreferences,
}

impl Scenario {
    /// Read a scenario, as TOML if the file ends in `.toml` and JSON otherwise
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);
        let scenario = if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse scenario file: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse scenario file: {}", path.display()))?
        };
        Ok(scenario)
    }

    /// Register the capabilities and apply the preferences
    pub fn apply(&self, monetization: &Monetization) -> Result<()> {
        {
            let session = monetization.capabilities().acquire()?;
            for capability in &self.capabilities {
                session.use_plugin(capability.plugin()?)?;
            }
        }

        let preferences = monetization.preferences();
        for pattern in &self.preferences.allow {
            preferences.allow(pattern)?;
        }
        for pattern in &self.preferences.deny {
            preferences.deny(pattern)?;
        }

        debug!(
            "Scenario registered {} capabilities",
            monetization.capabilities().len()
        );
        Ok(())
    }
}

/// Implementation of the match command
pub async fn execute_match(
    scenario: &Path,
    bypass_cache: bool,
    config: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::load(scenario).await?;
    let monetization = open_runtime(config).await?;
    scenario.apply(&monetization)?;

    let options = DetectOptions { bypass_cache };
    let matches = monetization.match_capabilities(options).await;

    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_scenario() {
        let scenario: Scenario = toml::from_str(
            r#"
[[capabilities]]
name = "pay/card"
supported = true
details = { network = "visa" }

[[capabilities]]
name = "wallet/*"
fail = true
delay_ms = 5

[preferences]
deny = ["wallet/*"]
"#,
        )
        .unwrap();

        assert_eq!(scenario.capabilities.len(), 2);
        assert!(scenario.capabilities[0].supported);
        assert_eq!(
            scenario.capabilities[0].details,
            Some(serde_json::json!({"network": "visa"}))
        );
        assert!(scenario.capabilities[1].fail);
        assert_eq!(scenario.capabilities[1].delay_ms, 5);
        assert!(scenario.preferences.allow.is_empty());
        assert_eq!(scenario.preferences.deny, vec!["wallet/*"]);
    }

    #[tokio::test]
    async fn test_apply_rejects_invalid_names() {
        let scenario: Scenario =
            serde_json::from_str(r#"{ "capabilities": [ { "name": "pay" } ] }"#).unwrap();
        let monetization = Monetization::new();

        assert!(scenario.apply(&monetization).is_err());
        assert!(!monetization.capabilities().is_locked());
    }

    #[tokio::test]
    async fn test_scripted_outcomes() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "capabilities": [
                    { "name": "a/1", "supported": true },
                    { "name": "a/2", "fail": true },
                    { "name": "a/3", "supported": true, "delay_ms": 200, "timeout_ms": 10 }
                ]
            }"#,
        )
        .unwrap();
        let monetization = Monetization::new();
        scenario.apply(&monetization).unwrap();

        let options = DetectOptions::default();
        assert!(monetization.detect("a/1", options).await.unwrap().is_supported);
        assert!(monetization.detect("a/2", options).await.is_err());
        assert!(!monetization.detect("a/3", options).await.unwrap().is_supported);
    }
}
