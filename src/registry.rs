//! Plugin registry with last-registered-wins resolution.
//!
//! The [`Registry`] keeps plugins in registration order and resolves a
//! connection by asking them from the most recently registered to the
//! least recently registered. The first plugin that claims the connection
//! wins; earlier plugins that would also claim it are shadowed and never
//! asked to act. Registering a plugin is therefore the way to override the
//! built-in handling of any connection.
//!
//! The list is append-only. Once populated, a registry can be shared
//! (`Arc<Registry>` or `&Registry`) and resolved from concurrently.

use std::fmt;
use std::sync::Arc;

use crate::config::ConnectionOptions;
use crate::default_plugin::DefaultPlugin;
use crate::error::{Error, Result};
use crate::plugin::Plugin;

/// Ordered collection of plugins.
///
/// # Example
///
/// ```rust,ignore
/// use feature_stream::{ConnectionOptions, Registry};
///
/// let mut registry = Registry::with_defaults();
/// registry.register(Arc::new(MyPlugin::new()), &ConnectionOptions::new())?;
///
/// let plugin = registry.resolve("my://resource", &ConnectionOptions::new())?;
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl Registry {
    /// Creates an empty registry. Nothing resolves until plugins are registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding only the [`DefaultPlugin`], at the lowest
    /// priority so that any plugin registered later can shadow it.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            plugins: vec![Arc::new(DefaultPlugin::new())],
        }
    }

    /// Runs the plugin's one-time setup with `options`, then appends it.
    ///
    /// # Errors
    ///
    /// Returns the setup error; the plugin is not registered in that case.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>, options: &ConnectionOptions) -> Result<()> {
        plugin.init(options)?;
        tracing::debug!(
            "Registered plugin '{}' at priority {}",
            plugin.name(),
            self.plugins.len()
        );
        self.plugins.push(plugin);
        Ok(())
    }

    /// Finds the most recently registered plugin that handles `id`.
    ///
    /// No result is cached: `handles` is asked again on every call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPluginFound`] if no plugin claims the connection.
    pub fn resolve(&self, id: &str, options: &ConnectionOptions) -> Result<Arc<dyn Plugin>> {
        let plugin = self
            .plugins
            .iter()
            .rev()
            .find(|plugin| plugin.handles(id, options))
            .cloned()
            .ok_or_else(|| Error::NoPluginFound(id.to_string()))?;
        tracing::debug!("Resolved {id} to plugin '{}'", plugin.name());
        Ok(plugin)
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name()))
            .finish()
    }
}
