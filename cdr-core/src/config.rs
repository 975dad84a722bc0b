//! Engine configuration

use crate::criteria::DEFAULT_DATE_FORMATS;

/// Configuration for contexts created by a container
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// `chrono` format strings tried, after RFC 3339, when inferring whether
    /// a literal is a date
    pub date_formats: Vec<String>,
    /// Whether explicit typing (`set_circumstance_as`, `set_value`) is permitted
    pub allow_explicit_types: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            allow_explicit_types: true,
        }
    }
}

impl ContextConfig {
    /// Add a date format tried after the existing ones
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_formats.push(format.into());
        self
    }

    /// Replace the date formats
    pub fn with_date_formats(mut self, formats: Vec<String>) -> Self {
        self.date_formats = formats;
        self
    }

    /// Forbid explicit typing; every circumstance type is inferred
    pub fn strict_inference(mut self) -> Self {
        self.allow_explicit_types = false;
        self
    }
}

/// Configuration for the instance cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false, `share` instantiates on every call like `create`
    pub share_instances: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            share_instances: true,
        }
    }
}

impl CacheConfig {
    pub fn with_sharing(mut self, share_instances: bool) -> Self {
        self.share_instances = share_instances;
        self
    }
}

/// Combined configuration for a [`crate::Container`]
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub context: ContextConfig,
    pub cache: CacheConfig,
}

impl EngineConfig {
    pub fn with_context(mut self, context: ContextConfig) -> Self {
        self.context = context;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}
