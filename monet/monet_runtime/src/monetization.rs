//! The reconciliation facade.
//!
//! [`Monetization`] ties the capability registry, the detection coordinator
//! and the user's preferences together and answers the one question a site
//! asks: which monetization methods can be used right now.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use monet_cache::{FileStorage, MemoryStorage, ResultCache, StorageBackend};
use monet_capability::{CapabilityRegistry, DetectionCoordinator};
use monet_core::{
    Capability, CapabilityMatch, DetectOptions, DetectionResult, Error, Result,
};
use monet_preferences::UserPreferences;

use crate::config::{CacheSettings, StorageKind};

/// Reconciles the capabilities a site declares with the user's preferences
/// and the environment's actual support.
pub struct Monetization {
    registry: Arc<CapabilityRegistry>,
    coordinator: DetectionCoordinator,
    preferences: Arc<UserPreferences>,
}

impl Default for Monetization {
    fn default() -> Self {
        Self::with_cache(ResultCache::in_memory())
    }
}

impl Monetization {
    /// A runtime caching results in process memory.
    ///
    /// Use [`with_cache`](Self::with_cache) with [`ResultCache::disabled`] to
    /// opt out of caching.
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime over the given result cache
    pub fn with_cache(cache: ResultCache) -> Self {
        let registry = Arc::new(CapabilityRegistry::new());
        let coordinator = DetectionCoordinator::new(registry.clone(), Arc::new(cache));
        Self {
            registry,
            coordinator,
            preferences: Arc::new(UserPreferences::new()),
        }
    }

    /// A runtime whose cache is built from configuration.
    ///
    /// # Arguments
    ///
    /// * `settings` - Cache settings; `validate` should already have passed.
    ///
    /// # Returns
    ///
    /// * `Ok(Monetization)` - The runtime.
    /// * `Err` - `Error::Config` if the file backend has no directory, or a
    ///   cache error if the persisted manifest cannot be read.
    pub async fn from_settings(settings: &CacheSettings) -> Result<Self> {
        let backend: Option<Arc<dyn StorageBackend>> = match settings.backend {
            StorageKind::Memory => Some(Arc::new(MemoryStorage::new())),
            StorageKind::File => {
                let directory = settings.directory.clone().ok_or_else(|| {
                    Error::Config("The file cache backend requires cache.directory".to_string())
                })?;
                Some(Arc::new(FileStorage::new(directory)))
            }
            StorageKind::None => None,
        };

        info!(
            "Opening result cache (backend: {:?}, enabled: {})",
            settings.backend, settings.enabled
        );
        let cache = ResultCache::open(settings.cache_config(), backend).await?;
        Ok(Self::with_cache(cache))
    }

    /// The capability registry
    pub fn capabilities(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// The user's preference store
    pub fn preferences(&self) -> &Arc<UserPreferences> {
        &self.preferences
    }

    /// Registered capabilities the user does not deny, in registration order
    pub fn user_acceptable_capabilities(&self) -> Vec<Capability> {
        self.registry
            .list()
            .into_iter()
            .filter(|capability| !self.preferences.denies(capability.as_str()))
            .collect()
    }

    /// Detect every acceptable capability concurrently and keep the supported
    /// ones.
    ///
    /// A capability whose detection fails is logged and left out; one failure
    /// never fails the whole pass. The result is in registration order
    /// regardless of which detection finished first.
    pub async fn match_capabilities(&self, options: DetectOptions) -> Vec<CapabilityMatch> {
        let acceptable = self.user_acceptable_capabilities();
        debug!("Matching {} acceptable capabilities", acceptable.len());

        let outcomes = join_all(
            acceptable
                .iter()
                .map(|capability| self.coordinator.detect(capability.as_str(), options)),
        )
        .await;

        acceptable
            .into_iter()
            .zip(outcomes)
            .filter_map(|(capability, outcome)| match outcome {
                Ok(DetectionResult {
                    is_supported: true,
                    details,
                }) => Some(CapabilityMatch {
                    capability,
                    details,
                }),
                Ok(_) => None,
                Err(e) => {
                    warn!("Detection of {} failed: {}", capability, e);
                    None
                }
            })
            .collect()
    }

    /// Detect a single registered capability.
    ///
    /// # Returns
    ///
    /// * `Ok(DetectionResult)` - The cached or freshly computed result.
    /// * `Err` - `Error::MissingArgument` if `name` is empty,
    ///   `CapabilityError::Unrecognized` if it is not registered, or the
    ///   detection's own error.
    pub async fn detect(&self, name: &str, options: DetectOptions) -> Result<DetectionResult> {
        if name.is_empty() {
            return Err(Error::MissingArgument("capability".to_string()));
        }
        self.coordinator.detect(name, options).await
    }

    /// Delete every cached detection result
    pub async fn clear_cache(&self) -> Result<()> {
        self.coordinator.clear_cache().await
    }

    /// The user's preferences as an `Accept-Monetization` header value
    pub fn accept_header(&self) -> String {
        self.preferences.get().to_accept_header()
    }

    /// The result cache
    pub fn cache(&self) -> &Arc<ResultCache> {
        self.coordinator.cache()
    }
}
