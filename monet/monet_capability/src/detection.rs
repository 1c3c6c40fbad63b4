//! Detection Coordinator
//!
//! Runs a single capability's detection: cache lookup, test invocation and
//! cache write-back.
//!
//! At most one test invocation per capability name is in flight at any time.
//! A caller arriving while a detection of the same name is running awaits the
//! outcome of that detection instead of starting another one.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use monet_cache::ResultCache;
use monet_core::{Capability, CapabilityError, DetectOptions, DetectionResult, Result};

use crate::registry::CapabilityRegistry;
use crate::test::SharedTest;

type InFlight = Shared<BoxFuture<'static, Result<DetectionResult>>>;

/// Coordinates cache-checked detections over a [`CapabilityRegistry`]
pub struct DetectionCoordinator {
    registry: Arc<CapabilityRegistry>,
    cache: Arc<ResultCache>,
    in_flight: Arc<DashMap<Capability, InFlight>>,
}

impl DetectionCoordinator {
    /// Create a coordinator over a registry and a result cache
    pub fn new(registry: Arc<CapabilityRegistry>, cache: Arc<ResultCache>) -> Self {
        Self {
            registry,
            cache,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// The registry detections are resolved against
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// The result cache
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Detect whether `name` is supported.
    ///
    /// Any cached result, supported or not, is returned without running the
    /// test unless `options.bypass_cache` is set. A fresh result is written
    /// back to the cache; a failed write is logged and does not affect the
    /// returned result. A failed cache read is returned as an error.
    ///
    /// # Arguments
    ///
    /// * `name` - The capability to detect.
    /// * `options` - Detection options.
    ///
    /// # Returns
    ///
    /// * `Ok(DetectionResult)` - The cached or freshly computed result.
    /// * `Err` - `CapabilityError::Unrecognized` if `name` is not registered,
    ///   a cache read error, or the test's own error.
    pub async fn detect(&self, name: &str, options: DetectOptions) -> Result<DetectionResult> {
        let test = self
            .registry
            .get(name)
            .ok_or_else(|| CapabilityError::Unrecognized(name.to_string()))?;
        let capability = Capability::new(name)?;

        if !options.bypass_cache {
            if let Some(cached) = self.cache.get(name).await? {
                debug!("Cache hit for {}", name);
                return Ok(cached);
            }
            debug!("Cache miss for {}", name);
        }

        self.join_or_start(capability, test).await
    }

    /// Number of detections currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Delete every cached result
    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear().await
    }

    fn join_or_start(&self, capability: Capability, test: SharedTest) -> InFlight {
        match self.in_flight.entry(capability.clone()) {
            Entry::Occupied(entry) => {
                debug!("Joining in-flight detection for {}", capability);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let detection = run_detection(
                    capability,
                    test,
                    self.cache.clone(),
                    self.in_flight.clone(),
                )
                .boxed()
                .shared();
                entry.insert(detection.clone());
                detection
            }
        }
    }
}

async fn run_detection(
    capability: Capability,
    test: SharedTest,
    cache: Arc<ResultCache>,
    in_flight: Arc<DashMap<Capability, InFlight>>,
) -> Result<DetectionResult> {
    let outcome = test.run().await;

    if let Ok(result) = &outcome {
        if let Err(e) = cache.set(capability.as_str(), result).await {
            warn!("Failed to cache result for {}: {}", capability, e);
        }
    }

    in_flight.remove(&capability);
    outcome
}
