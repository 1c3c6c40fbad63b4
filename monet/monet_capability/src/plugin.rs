//! Plugins bundle a capability name with its detection test.
//!
//! Third parties ship a capability as a factory function returning a
//! [`Plugin`]; sites register it with `CapabilityRegistry::use_plugin`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use monet_core::{Capability, DetectionResult, Result};

use crate::test::{DetectionTest, SharedTest};

/// A `(name, test)` pair produced by a plugin factory.
#[derive(Clone)]
pub struct Plugin {
    /// The capability the plugin provides
    pub name: Capability,

    /// The capability's detection test
    pub test: SharedTest,
}

impl Plugin {
    /// Create a plugin from a name and a test.
    pub fn new(name: Capability, test: impl DetectionTest) -> Self {
        Self {
            name,
            test: Arc::new(test),
        }
    }

    /// Split the plugin into its name and test.
    pub fn into_parts(self) -> (Capability, SharedTest) {
        (self.name, self.test)
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name).finish()
    }
}

/// Build a plugin from a name and an async closure.
///
/// # Returns
///
/// * `Ok(Plugin)` - If `name` is a valid capability name.
/// * `Err` - `CapabilityError::InvalidFormat` otherwise.
pub fn from_fn<F, Fut>(name: &str, test: F) -> Result<Plugin>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DetectionResult>> + Send + 'static,
{
    Ok(Plugin::new(Capability::new(name)?, test))
}

/// Build a plugin whose test always reports `result`.
pub fn fixed(name: &str, result: DetectionResult) -> Result<Plugin> {
    from_fn(name, move || {
        let result = result.clone();
        async move { Ok(result) }
    })
}

/// Wrap a plugin so its test reports the capability as unsupported when the
/// inner test does not settle within `timeout`.
pub fn with_timeout(plugin: Plugin, timeout: Duration) -> Plugin {
    let (name, inner) = plugin.into_parts();
    let label = name.clone();
    let test = move || {
        let inner = inner.clone();
        let label = label.clone();
        async move {
            match tokio::time::timeout(timeout, inner.run()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    debug!("Detection for {} timed out after {:?}", label, timeout);
                    Ok(DetectionResult::unsupported())
                }
            }
        }
    };
    Plugin::new(name, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use monet_core::{CapabilityError, Error};

    #[tokio::test]
    async fn test_fixed_plugin() {
        let plugin = fixed("pay/card", DetectionResult::supported()).unwrap();
        assert_eq!(plugin.name, "pay/card");
        assert_eq!(plugin.test.run().await.unwrap(), DetectionResult::supported());
        // Runs again with the same answer
        assert_eq!(plugin.test.run().await.unwrap(), DetectionResult::supported());
    }

    #[test]
    fn test_invalid_plugin_name() {
        let err = fixed("pay", DetectionResult::supported()).unwrap_err();
        assert_eq!(
            err,
            Error::Capability(CapabilityError::InvalidFormat("pay".to_string()))
        );
    }

    #[tokio::test]
    async fn test_timeout_reports_unsupported() {
        let slow = from_fn("webmonetization/*", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(DetectionResult::supported())
        })
        .unwrap();

        let plugin = with_timeout(slow, Duration::from_millis(10));
        assert_eq!(plugin.name, "webmonetization/*");
        assert_eq!(
            plugin.test.run().await.unwrap(),
            DetectionResult::unsupported()
        );
    }

    #[tokio::test]
    async fn test_timeout_passes_through_fast_results() {
        let fast = fixed("webmonetization/*", DetectionResult::supported()).unwrap();
        let plugin = with_timeout(fast, Duration::from_secs(5));
        assert_eq!(
            plugin.test.run().await.unwrap(),
            DetectionResult::supported()
        );

        let failing = from_fn("webmonetization/*", || async {
            Err(Error::Detection("probe crashed".to_string()))
        })
        .unwrap();
        let plugin = with_timeout(failing, Duration::from_secs(5));
        assert!(matches!(plugin.test.run().await, Err(Error::Detection(_))));
    }
}
