//! Location provider registry collaborator

/// OS registry of named location providers (gps, network, ...)
pub trait ProviderRegistry: Send {
    /// All provider ids, or only those currently enabled
    fn providers(&self, enabled_only: bool) -> Vec<String>;

    fn is_provider_enabled(&self, provider: &str) -> bool;
}
