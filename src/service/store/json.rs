//! JSON-file implementation of the state store.
//!
//! The whole document lives in one file. Saves go through a sibling temp file
//! followed by a rename so a crash mid-write cannot corrupt the document.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::base::{
    config::Config,
    types::{Res, Void},
};

use super::{Document, GenericStateStore, StateStore};

// Extra methods on `StateStore` applied by the JSON file implementation.

impl StateStore {
    /// Creates a state store backed by the JSON file configured in `state_path`.
    pub fn json(config: &Config) -> Self {
        Self {
            inner: Arc::new(JsonStateStore::new(&config.state_path)),
        }
    }
}

// Structs.

/// State store backed by a single JSON document on disk.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl GenericStateStore for JsonStateStore {
    #[instrument(skip(self))]
    async fn load(&self) -> Res<Document> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let document = serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse state document at {}", self.path.display()))?;
                info!("State document loaded from {}.", self.path.display());
                Ok(document)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No state document at {}, starting fresh.", self.path.display());
                Ok(Document::default())
            }
            Err(err) => Err(err).with_context(|| format!("Failed to read state document at {}", self.path.display())),
        }
    }

    #[instrument(skip_all)]
    async fn save(&self, document: &Document) -> Void {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| format!("Failed to create state directory {}", parent.display()))?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;

        // Write-then-rename keeps the previous document intact until the new
        // one is fully on disk.
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, &bytes).await.with_context(|| format!("Failed to write state document to {}", temp.display()))?;
        tokio::fs::rename(&temp, &self.path).await.with_context(|| format!("Failed to replace state document at {}", self.path.display()))?;

        debug!("State document saved to {}.", self.path.display());

        Ok(())
    }
}

// Tests.
