//! The service object every channel dispatches into.

use std::fmt;
use std::sync::Arc;

use atlas_loader::{AssetLoader, GltfCodec, MaterialTemplate};
use atlas_pipeline::{AcquisitionPipeline, DefaultFetcher, Fetcher, LoadQueue, ProgressBus};
use atlas_protocol::{CameraRig, Dispatcher, LightingRig, PresetCamera, Services, StoredLights};
use atlas_registry::{InMemorySceneRegistry, SceneRegistry};

use crate::config::HostConfig;

/// One viewer: its registry, load queue, pipeline, and collaborators.
pub struct ViewerSession {
    config: HostConfig,
    dispatcher: Dispatcher,
}

impl ViewerSession {
    /// Session fetching over HTTP and from the local filesystem.
    pub fn new(config: HostConfig) -> Arc<Self> {
        Self::with_fetcher(config, Arc::new(DefaultFetcher::new()))
    }

    pub fn with_fetcher(config: HostConfig, fetcher: Arc<dyn Fetcher>) -> Arc<Self> {
        Self::with_parts(
            config,
            fetcher,
            Arc::new(PresetCamera::new()),
            Arc::new(StoredLights::new()),
        )
    }

    pub fn with_parts(
        config: HostConfig,
        fetcher: Arc<dyn Fetcher>,
        camera: Arc<dyn CameraRig>,
        lighting: Arc<dyn LightingRig>,
    ) -> Arc<Self> {
        let template = MaterialTemplate {
            default_color: config.pipeline.default_color,
            ..MaterialTemplate::default()
        };
        let registry: Arc<dyn SceneRegistry> = Arc::new(InMemorySceneRegistry::new());
        let pipeline = AcquisitionPipeline::new(
            config.pipeline.clone(),
            fetcher,
            AssetLoader::new(Arc::new(GltfCodec), template),
            registry,
            Arc::new(LoadQueue::new()),
        );
        let services = Services {
            pipeline: Arc::new(pipeline),
            camera,
            lighting,
        };
        let dispatcher = Dispatcher::new(config.namespace.clone(), services);
        Arc::new(Self { config, dispatcher })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn pipeline(&self) -> &Arc<AcquisitionPipeline> {
        &self.dispatcher.services().pipeline
    }

    pub fn registry(&self) -> &Arc<dyn SceneRegistry> {
        self.pipeline().registry()
    }

    pub fn queue(&self) -> &Arc<LoadQueue> {
        self.pipeline().queue()
    }

    pub fn progress(&self) -> &ProgressBus {
        self.pipeline().progress()
    }
}

impl fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerSession")
            .field("namespace", &self.config.namespace)
            .field("bind_addr", &self.config.bind_addr)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_starts_empty() {
        let session = ViewerSession::new(HostConfig::default());
        assert!(session.registry().is_empty().unwrap());
        assert!(session.queue().is_empty().unwrap());
        assert_eq!(session.dispatcher().namespace(), "threejs");
    }

    #[test]
    fn sessions_are_independent() {
        let a = ViewerSession::new(HostConfig::default());
        let b = ViewerSession::new(HostConfig::default());
        assert!(!Arc::ptr_eq(a.queue(), b.queue()));
    }
}
