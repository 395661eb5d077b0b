//! Load orchestration
//!
//! Two protocols hand an asset to the engine:
//!
//! - [`DelegatedLoader`]: one engine call; the engine fetches and decodes
//! - [`StagedLoader`]: the loader fetches bytes, the engine decodes them,
//!   then adopts the decoded buffer. Any stage may fail independently.
//!
//! Loaders only report success or failure. The facade owns the state
//! transition and makes sure a failed load leaves nothing resident.

mod source;

pub use source::{is_http_url, AutoSource, ByteSource, FileSource, HttpSource};

use crate::engine::{AudioEngine, StagedEngine};
use driftwave_common::Result;
use tracing::debug;

/// Puts an asset into an engine
#[allow(async_fn_in_trait)]
pub trait AssetLoader<E: AudioEngine> {
    /// Protocol name for logs
    fn protocol(&self) -> &'static str;

    async fn load(&self, engine: &mut E, url: &str) -> Result<()>;
}

/// Passes the location straight to the engine
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegatedLoader;

impl<E: AudioEngine> AssetLoader<E> for DelegatedLoader {
    fn protocol(&self) -> &'static str {
        "delegated"
    }

    async fn load(&self, engine: &mut E, url: &str) -> Result<()> {
        engine.load(url).await
    }
}

/// Fetch, decode, adopt
///
/// This is the pipeline of the reduced (legacy) capability profile, kept
/// available to either profile.
#[derive(Debug, Clone, Default)]
pub struct StagedLoader<S = AutoSource> {
    source: S,
}

impl<S: ByteSource> StagedLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<E, S> AssetLoader<E> for StagedLoader<S>
where
    E: StagedEngine,
    S: ByteSource,
{
    fn protocol(&self) -> &'static str {
        "staged"
    }

    async fn load(&self, engine: &mut E, url: &str) -> Result<()> {
        let bytes = self.source.fetch(url).await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);

        let decoded = engine.decode(bytes).await?;
        debug!("Decoded {}, adopting", url);

        engine.adopt(decoded).await
    }
}
