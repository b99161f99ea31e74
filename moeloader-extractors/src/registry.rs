//! Lookup of site adapters by configured name.
use std::{path::Path, sync::Arc};

use ahash::HashMap;
use moeloader_common::{log::debug, SiteKind};

use crate::{
    error::ExtractorError,
    extractor_config::SiteConfig,
    settings::SiteSettings,
    sites::SiteAdapter,
    transport::{HttpTransport, Transport},
};

#[cfg(feature = "moebooru")]
use crate::sites::konachan::MoebooruAdapter;
#[cfg(feature = "sankaku")]
use crate::sites::sankaku::SankakuAdapter;

#[derive(Default)]
pub struct SiteRegistry {
    adapters: HashMap<String, Arc<dyn SiteAdapter>>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one adapter per config, each with its own HTTP client and cookie jar.
    ///
    /// With a `settings_dir`, every site loads its persisted settings from it; otherwise settings
    /// only live in memory.
    pub async fn from_configs<'a>(
        configs: impl IntoIterator<Item = &'a SiteConfig>,
        settings_dir: Option<&Path>,
    ) -> Result<Self, ExtractorError> {
        let mut registry = Self::new();

        for config in configs {
            let transport = Arc::new(HttpTransport::new(&config.user_agent)?);
            let settings = match settings_dir {
                Some(dir) => SiteSettings::open(&config.name, dir).await?,
                None => SiteSettings::in_memory(&config.name),
            };
            registry.register(build_adapter(
                config.clone(),
                transport,
                Arc::new(settings),
            )?);
        }

        Ok(registry)
    }

    /// Adds an adapter, replacing any previous one with the same site name.
    pub fn register(&mut self, adapter: Arc<dyn SiteAdapter>) {
        debug!("Registering site {}", adapter.site());
        self.adapters.insert(adapter.site().to_string(), adapter);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn SiteAdapter>, ExtractorError> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| ExtractorError::UnknownSite {
                name: name.to_string(),
            })
    }

    /// Registered site names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Picks the adapter implementation matching the config's API family.
pub fn build_adapter(
    config: SiteConfig,
    transport: Arc<dyn Transport>,
    settings: Arc<SiteSettings>,
) -> Result<Arc<dyn SiteAdapter>, ExtractorError> {
    match config.kind {
        #[cfg(feature = "moebooru")]
        SiteKind::Moebooru => {
            drop(settings);
            Ok(Arc::new(MoebooruAdapter::new(config, transport)))
        }
        #[cfg(feature = "sankaku")]
        SiteKind::Sankaku => Ok(Arc::new(SankakuAdapter::new(config, transport, settings))),
        #[allow(unreachable_patterns)]
        _ => Err(ExtractorError::UnsupportedOperation),
    }
}
