//! Turning a fetched engine bundle into a typed constructor.
//!
//! The remote script resource is a JSON manifest naming the engine and the
//! toolbar it ships. Resolution is explicit: no global lookup happens after
//! the fetch, the resolver hands back an [`EngineConstructor`] directly.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::EngineConstructor;
use super::rope::{ENGINE_NAME, RopeEngineConstructor};
use crate::editor::ToolbarAction;

const SUPPORTED_MAJOR: &str = "1";

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("engine manifest is not valid JSON: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("unsupported engine `{0}`")]
    UnsupportedEngine(String),

    #[error("unsupported engine version `{0}` (expected 1.x)")]
    UnsupportedVersion(String),

    #[error("unknown toolbar action `{0}`")]
    UnknownToolbarAction(String),
}

/// Resolves a fetched script resource into an engine constructor.
pub trait ModuleResolver: Send + Sync {
    /// # Errors
    /// Returns [`ModuleError`] when the resource does not describe a usable
    /// engine.
    fn resolve(&self, bytes: &[u8]) -> Result<Arc<dyn EngineConstructor>, ModuleError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineManifest {
    pub engine: String,
    pub version: String,
    #[serde(default = "default_toolbar")]
    pub toolbar: Vec<String>,
}

fn default_toolbar() -> Vec<String> {
    ToolbarAction::ALL
        .iter()
        .map(|action| action.name().to_string())
        .collect()
}

impl EngineManifest {
    /// # Errors
    /// Returns [`ModuleError::Manifest`] for malformed JSON.
    pub fn parse(bytes: &[u8]) -> Result<Self, ModuleError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn toolbar_actions(&self) -> Result<Vec<ToolbarAction>, ModuleError> {
        self.toolbar
            .iter()
            .map(|name| {
                ToolbarAction::from_name(name)
                    .ok_or_else(|| ModuleError::UnknownToolbarAction(name.clone()))
            })
            .collect()
    }
}

/// Resolver for manifests describing the built-in `rope-md` engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestResolver;

impl ModuleResolver for ManifestResolver {
    fn resolve(&self, bytes: &[u8]) -> Result<Arc<dyn EngineConstructor>, ModuleError> {
        let manifest = EngineManifest::parse(bytes)?;
        if manifest.engine != ENGINE_NAME {
            return Err(ModuleError::UnsupportedEngine(manifest.engine));
        }
        let major = manifest.version.split('.').next().unwrap_or_default();
        if major != SUPPORTED_MAJOR {
            return Err(ModuleError::UnsupportedVersion(manifest.version));
        }
        let toolbar = manifest.toolbar_actions()?;
        Ok(Arc::new(RopeEngineConstructor::new(manifest.version, toolbar)))
    }
}
