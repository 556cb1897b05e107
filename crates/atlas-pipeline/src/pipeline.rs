//! Acquisition of single assets and model bundles.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use atlas_archive::{ArchiveEntry, ArchiveResult, AssetArchive, ColorTable, Manifest, ManifestError};
use atlas_loader::{AssetLoader, LoadRequest, LoadedAsset};
use atlas_registry::SceneRegistry;
use atlas_types::{LoadQueueItem, LoadStatus, ModelId, ModelSummary, PackedColor, Placement};

use crate::config::PipelineConfig;
use crate::error::{AcquireError, AcquireResult};
use crate::fetch::Fetcher;
use crate::inflight::{Claim, InFlight};
use crate::progress::{ProgressBus, ProgressUpdate};
use crate::queue::{LoadQueue, QueueTicket};

/// Result of one bundle entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchOutcome {
    Loaded { summary: ModelSummary },
    Failed { error: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Path of the entry inside the bundle.
    pub path: String,
    /// Derived identifier. Empty when derivation itself failed.
    pub id: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Loaded { .. })
    }
}

/// Per-entry outcomes of a bundle acquisition, in manifest scope order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub archive_url: String,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn summaries(&self) -> Vec<&ModelSummary> {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                BatchOutcome::Loaded { summary } => Some(summary),
                BatchOutcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn loaded(&self) -> usize {
        self.entries.iter().filter(|e| e.is_loaded()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.loaded()
    }
}

/// Bundle contents extracted up front, before any entry is loaded.
struct Unpacked {
    colors: ColorTable,
    assets: Vec<(ArchiveEntry, ArchiveResult<Vec<u8>>)>,
}

/// Moves assets from URLs into the scene registry.
pub struct AcquisitionPipeline {
    config: PipelineConfig,
    fetcher: Arc<dyn Fetcher>,
    loader: AssetLoader,
    registry: Arc<dyn SceneRegistry>,
    queue: Arc<LoadQueue>,
    progress: ProgressBus,
    inflight: InFlight,
}

impl AcquisitionPipeline {
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn Fetcher>,
        loader: AssetLoader,
        registry: Arc<dyn SceneRegistry>,
        queue: Arc<LoadQueue>,
    ) -> Self {
        let progress = ProgressBus::new(config.progress_capacity);
        Self {
            config,
            fetcher,
            loader,
            registry,
            queue,
            progress,
            inflight: InFlight::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<dyn SceneRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &Arc<LoadQueue> {
        &self.queue
    }

    pub fn progress(&self) -> &ProgressBus {
        &self.progress
    }

    /// Fetch one asset, decode it, and register it under `id`.
    ///
    /// A call for an id that is already being acquired waits for that job
    /// and shares its outcome instead of starting another.
    pub async fn acquire(
        &self,
        url: &str,
        id: ModelId,
        placement: Placement,
    ) -> AcquireResult<ModelSummary> {
        match self.inflight.claim(&id) {
            Claim::Follower(rx) => {
                debug!(model = %id, url, "attaching to in-flight acquisition");
                InFlight::wait(rx).await
            }
            Claim::Leader(guard) => {
                let outcome = self.acquire_one(url, &id, placement).await;
                guard.finish(outcome.clone());
                outcome
            }
        }
    }

    /// [`acquire`](Self::acquire) on its own task. Dropping the handle does
    /// not cancel the job; it still settles its queue item.
    pub fn spawn_acquire(
        self: &Arc<Self>,
        url: impl Into<String>,
        id: ModelId,
        placement: Placement,
    ) -> JoinHandle<AcquireResult<ModelSummary>> {
        let pipeline = Arc::clone(self);
        let url = url.into();
        tokio::spawn(async move { pipeline.acquire(&url, id, placement).await })
    }

    /// [`acquire_batch`](Self::acquire_batch) on its own task.
    pub fn spawn_acquire_batch(
        self: &Arc<Self>,
        url: impl Into<String>,
        placement: Placement,
    ) -> JoinHandle<AcquireResult<BatchReport>> {
        let pipeline = Arc::clone(self);
        let url = url.into();
        tokio::spawn(async move { pipeline.acquire_batch(&url, placement).await })
    }

    async fn acquire_one(
        &self,
        url: &str,
        id: &ModelId,
        placement: Placement,
    ) -> AcquireResult<ModelSummary> {
        let ticket = self
            .queue
            .push(LoadQueueItem::downloading(url, id.clone()))?;
        info!(model = %id, url, "acquiring asset");

        let on_progress = |received: u64, total: Option<u64>| {
            if let Some(total) = total {
                self.progress
                    .publish(ProgressUpdate::from_bytes(id.clone(), received, total));
            }
        };
        let bytes = match self.fetcher.fetch(url, &on_progress).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(ticket, id, e.into())),
        };

        let request = LoadRequest::new(id.clone()).with_placement(placement);
        self.commit(ticket, bytes, request).await
    }

    /// Fetch a model bundle and register every in-scope asset.
    ///
    /// Fetch, container, manifest, and color table failures reject the whole
    /// call. Once entries are being loaded, each one succeeds or fails on its
    /// own and the report records which.
    pub async fn acquire_batch(&self, url: &str, placement: Placement) -> AcquireResult<BatchReport> {
        info!(url, "acquiring bundle");
        let data = self.fetcher.fetch(url, &|_, _| {}).await?;

        let config = self.config.clone();
        let unpacked = tokio::task::spawn_blocking(move || unpack(data, &config))
            .await
            .map_err(|e| AcquireError::Internal(e.to_string()))??;

        let mut report = BatchReport {
            archive_url: url.to_string(),
            entries: Vec::new(),
        };
        let Some(unpacked) = unpacked else {
            info!(url, "bundle manifest scopes no assets");
            return Ok(report);
        };

        let rules = self.config.naming_rules();
        for (entry, data) in unpacked.assets {
            let name = rules.derive(&entry.path);
            let color = unpacked.colors.color_or(&name.color_key, self.config.default_color);
            let outcome = self
                .acquire_entry(url, &entry, &name.id, data, color, placement)
                .await;
            let outcome = match outcome {
                Ok(summary) => BatchOutcome::Loaded { summary },
                Err(e) => {
                    warn!(entry = %entry.path, error = %e, "bundle entry failed");
                    BatchOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.entries.push(BatchEntry {
                path: entry.path,
                id: name.id,
                outcome,
            });
        }

        info!(
            url,
            loaded = report.loaded(),
            failed = report.failed(),
            "bundle acquired"
        );
        Ok(report)
    }

    async fn acquire_entry(
        &self,
        archive_url: &str,
        entry: &ArchiveEntry,
        id: &str,
        data: ArchiveResult<Vec<u8>>,
        color: PackedColor,
        placement: Placement,
    ) -> AcquireResult<ModelSummary> {
        let id = ModelId::parse(id)?;
        let ticket = self.queue.push(LoadQueueItem::downloading(
            format!("{archive_url}#{}", entry.path),
            id.clone(),
        ))?;
        let data = match data {
            Ok(data) => data,
            Err(e) => return Err(self.fail(ticket, &id, e.into())),
        };
        let request = LoadRequest::new(id.clone())
            .with_color(color)
            .with_placement(placement);
        self.commit(ticket, Bytes::from(data), request).await
    }

    /// Decode on the blocking pool, then register and complete the ticket
    /// together.
    async fn commit(
        &self,
        ticket: QueueTicket,
        bytes: Bytes,
        request: LoadRequest,
    ) -> AcquireResult<ModelSummary> {
        let id = request.id.clone();
        if let Err(e) = self.queue.advance(ticket, LoadStatus::Loading) {
            return Err(self.fail(ticket, &id, e.into()));
        }

        let loader = self.loader.clone();
        let decoded = tokio::task::spawn_blocking(move || loader.load(&bytes, &request)).await;
        let loaded: LoadedAsset = match decoded {
            Ok(Ok(loaded)) => loaded,
            Ok(Err(e)) => return Err(self.fail(ticket, &id, e.into())),
            Err(e) => return Err(self.fail(ticket, &id, AcquireError::Internal(e.to_string()))),
        };

        let registry = &self.registry;
        let summary = self
            .queue
            .settle_with(ticket, || registry.insert(loaded))?
            .map_err(AcquireError::from);
        match summary {
            Ok(summary) => {
                self.progress.publish(ProgressUpdate::new(id.clone(), 100.0));
                self.progress.finish(id.clone(), true);
                info!(model = %id, "asset registered");
                Ok(summary)
            }
            Err(e) => {
                self.progress.finish(id.clone(), false);
                warn!(model = %id, error = %e, "registration failed");
                Err(e)
            }
        }
    }

    /// Mark the ticket failed and announce the end of the job.
    fn fail(&self, ticket: QueueTicket, id: &ModelId, error: AcquireError) -> AcquireError {
        if let Err(e) = self.queue.advance(ticket, LoadStatus::Error) {
            debug!(model = %id, error = %e, "queue item already settled");
        }
        self.progress.finish(id.clone(), false);
        warn!(model = %id, error = %error, "acquisition failed");
        error
    }
}

impl fmt::Debug for AcquisitionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquisitionPipeline")
            .field("config", &self.config)
            .field("loader", &self.loader)
            .field("in_flight", &self.inflight.len())
            .finish_non_exhaustive()
    }
}

/// Open the container, scope it with the manifest, and read the color table
/// and every in-scope asset. `None` when the manifest scopes nothing.
fn unpack(data: Bytes, config: &PipelineConfig) -> AcquireResult<Option<Unpacked>> {
    let mut archive = AssetArchive::from_bytes(data.to_vec())?;

    let manifest_entry = archive
        .find_by_suffix(&config.manifest_suffix)
        .ok_or(ManifestError::NotFound)?;
    let manifest = Manifest::parse(&archive.read(&manifest_entry)?)?;
    let scoped = manifest.resolve(archive.entries(), &config.asset_extension);
    debug!(
        folders = manifest.folders().len(),
        scoped = scoped.len(),
        "manifest resolved"
    );
    if scoped.is_empty() {
        return Ok(None);
    }

    let table_entry = archive.require_by_suffix("color table", &config.color_table_suffix)?;
    let colors = ColorTable::parse(&archive.read_to_string(&table_entry)?);
    debug!(colors = colors.len(), "color table parsed");

    let assets = scoped
        .into_iter()
        .map(|entry| {
            let data = archive.read(&entry);
            (entry, data)
        })
        .collect();
    Ok(Some(Unpacked { colors, assets }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use atlas_archive::ArchiveWriter;
    use atlas_loader::fixtures;
    use atlas_registry::InMemorySceneRegistry;
    use atlas_types::Vec3;

    use crate::error::{FetchError, FetchResult};
    use crate::fetch::ProgressFn;

    /// Serves canned bodies; unknown URLs answer 404.
    #[derive(Default)]
    struct StaticFetcher {
        bodies: HashMap<String, Vec<u8>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn with(mut self, url: &str, body: Vec<u8>) -> Self {
            self.bodies.insert(url.to_string(), body);
            self
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str, progress: ProgressFn<'_>) -> FetchResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let body = self.bodies.get(url).ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })?;
            let total = body.len() as u64;
            progress(total / 2, Some(total));
            progress(total, Some(total));
            Ok(Bytes::from(body.clone()))
        }
    }

    fn pipeline(fetcher: StaticFetcher) -> (AcquisitionPipeline, Arc<StaticFetcher>) {
        let fetcher = Arc::new(fetcher);
        let p = AcquisitionPipeline::new(
            PipelineConfig::default(),
            fetcher.clone(),
            AssetLoader::gltf(),
            Arc::new(InMemorySceneRegistry::new()),
            Arc::new(LoadQueue::new()),
        );
        (p, fetcher)
    }

    fn bundle(with_colors: bool) -> Vec<u8> {
        let mut w = ArchiveWriter::new();
        w.add_file("bundle/config.json", br#"{"folders": ["left/", "right/"]}"#)
            .unwrap();
        if with_colors {
            w.add_file("bundle/colors.txt", b"GPe1: 0.5 0.2 1.0\n").unwrap();
        }
        w.add_file("left/Atlas_GPe1_L.glb", &fixtures::triangle_glb()).unwrap();
        w.add_file("right/Atlas_Other_R.glb", &fixtures::triangle_glb()).unwrap();
        w.add_file("extra/Atlas_Skip.glb", &fixtures::triangle_glb()).unwrap();
        w.finish().unwrap()
    }

    const URL: &str = "http://cdn/GPe.glb";
    const BUNDLE: &str = "http://cdn/atlas.zip";

    #[tokio::test]
    async fn acquire_registers_and_completes() {
        let (p, _) = pipeline(StaticFetcher::default().with(URL, fixtures::triangle_glb()));
        let mut sub = p.progress().subscribe_model(ModelId::from("GPe"));

        let placement = Placement::at(Vec3::new(1.0, 0.0, 0.0));
        let summary = p.acquire(URL, ModelId::from("GPe"), placement).await.unwrap();
        assert_eq!(summary.id.as_str(), "GPe");
        assert_eq!(summary.position, Vec3::new(1.0, 0.0, 0.0));
        assert!(p.registry().contains("GPe").unwrap());

        let queue = p.queue().snapshot().unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].status, LoadStatus::Completed);
        assert_eq!(queue[0].url, URL);

        let mut seen = Vec::new();
        while let Some(u) = sub.next().await {
            seen.push(u.progress);
        }
        assert_eq!(seen.last(), Some(&100.0));
        assert!(seen.contains(&50.0));
    }

    #[tokio::test]
    async fn acquire_404_registers_nothing() {
        let (p, _) = pipeline(StaticFetcher::default());
        let err = p
            .acquire("http://cdn/missing.glb", ModelId::from("x"), Placement::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::Network(ref m) if m.contains("404")));
        assert!(p.registry().is_empty().unwrap());
        assert_eq!(p.queue().snapshot().unwrap()[0].status, LoadStatus::Error);
    }

    #[tokio::test]
    async fn acquire_decode_failure_marks_error() {
        let (p, _) = pipeline(StaticFetcher::default().with(URL, b"not a model".to_vec()));
        let err = p
            .acquire(URL, ModelId::from("GPe"), Placement::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::Decode(_)));
        assert_eq!(p.queue().snapshot().unwrap()[0].status, LoadStatus::Error);
        assert!(p.registry().is_empty().unwrap());
    }

    #[tokio::test]
    async fn concurrent_acquire_of_same_id_shares_one_job() {
        let fetcher = StaticFetcher {
            delay: Some(Duration::from_millis(30)),
            ..StaticFetcher::default()
        }
        .with(URL, fixtures::triangle_glb());
        let (p, fetcher) = pipeline(fetcher);

        let (a, b) = tokio::join!(
            p.acquire(URL, ModelId::from("GPe"), Placement::default()),
            p.acquire(URL, ModelId::from("GPe"), Placement::default()),
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(p.queue().len().unwrap(), 1);
        assert_eq!(p.registry().len().unwrap(), 1);
    }

    #[tokio::test]
    async fn spawned_acquire_settles_after_caller_gives_up() {
        let fetcher = StaticFetcher {
            delay: Some(Duration::from_millis(100)),
            ..StaticFetcher::default()
        }
        .with(URL, fixtures::triangle_glb());
        let (p, _) = pipeline(fetcher);
        let p = Arc::new(p);

        let job = p.spawn_acquire(URL, ModelId::from("GPe"), Placement::default());
        let waited = tokio::time::timeout(Duration::from_millis(10), job).await;
        assert!(waited.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(p.queue().snapshot().unwrap()[0].status, LoadStatus::Completed);
        assert!(p.registry().contains("GPe").unwrap());
        assert!(p.queue().clear().unwrap());
    }

    /// Records attach/detach order.
    #[derive(Default)]
    struct Recorder(std::sync::Mutex<Vec<String>>);

    impl atlas_registry::SceneObserver for Recorder {
        fn attached(&self, object: &atlas_loader::SceneObject) {
            self.0.lock().unwrap().push(format!("+{}", object.model_id));
        }

        fn detached(&self, id: &ModelId) {
            self.0.lock().unwrap().push(format!("-{id}"));
        }
    }

    #[tokio::test]
    async fn observer_sees_attach_once_per_acquire() {
        let recorder = Arc::new(Recorder::default());
        let p = AcquisitionPipeline::new(
            PipelineConfig::default(),
            Arc::new(StaticFetcher::default().with(URL, fixtures::triangle_glb())),
            AssetLoader::gltf(),
            Arc::new(InMemorySceneRegistry::with_observer(recorder.clone())),
            Arc::new(LoadQueue::new()),
        );
        p.acquire(URL, ModelId::from("GPe"), Placement::default()).await.unwrap();
        p.acquire(URL, ModelId::from("GPe"), Placement::default()).await.unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), ["+GPe", "-GPe", "+GPe"]);
        assert!(p
            .queue()
            .snapshot()
            .unwrap()
            .iter()
            .all(|i| i.status == LoadStatus::Completed));
    }

    #[tokio::test]
    async fn sequential_acquire_replaces() {
        let (p, fetcher) = pipeline(StaticFetcher::default().with(URL, fixtures::triangle_glb()));
        p.acquire(URL, ModelId::from("GPe"), Placement::default()).await.unwrap();
        p.acquire(URL, ModelId::from("GPe"), Placement::default()).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(p.registry().len().unwrap(), 1);
        assert_eq!(p.queue().len().unwrap(), 2);
    }

    #[tokio::test]
    async fn batch_loads_scoped_entries_with_colors() {
        let (p, _) = pipeline(StaticFetcher::default().with(BUNDLE, bundle(true)));
        let report = p.acquire_batch(BUNDLE, Placement::default()).await.unwrap();

        let ids: Vec<_> = report.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["GPe1", "Other"]);
        assert_eq!(report.loaded(), 2);

        let gpe = p.registry().get("GPe1").unwrap().unwrap();
        let expected = PackedColor::from_unit_channels(0.5, 0.2, 1.0);
        assert!(gpe.materials().iter().all(|m| m.snapshot().color == expected));
        let other = p.registry().get("Other").unwrap().unwrap();
        assert!(other
            .materials()
            .iter()
            .all(|m| m.snapshot().color == PackedColor::WHITE));

        let urls: Vec<_> = p
            .queue()
            .snapshot()
            .unwrap()
            .into_iter()
            .map(|i| i.url)
            .collect();
        assert_eq!(urls[0], format!("{BUNDLE}#left/Atlas_GPe1_L.glb"));
    }

    #[tokio::test]
    async fn batch_without_color_table_rejects() {
        let (p, _) = pipeline(StaticFetcher::default().with(BUNDLE, bundle(false)));
        let err = p.acquire_batch(BUNDLE, Placement::default()).await.unwrap_err();
        assert!(matches!(err, AcquireError::Archive(_)));
        assert!(p.registry().is_empty().unwrap());
        assert!(p.queue().is_empty().unwrap());
    }

    #[tokio::test]
    async fn batch_without_manifest_rejects() {
        let mut w = ArchiveWriter::new();
        w.add_file("a/Atlas_X.glb", &fixtures::triangle_glb()).unwrap();
        let (p, _) = pipeline(StaticFetcher::default().with(BUNDLE, w.finish().unwrap()));
        let err = p.acquire_batch(BUNDLE, Placement::default()).await.unwrap_err();
        assert_eq!(err, AcquireError::Manifest("manifest not found".into()));
    }

    #[tokio::test]
    async fn batch_with_empty_scope_reports_nothing() {
        let mut w = ArchiveWriter::new();
        w.add_file("config.json", br#"{"folders": ["nowhere/"]}"#).unwrap();
        w.add_file("a/Atlas_X.glb", &fixtures::triangle_glb()).unwrap();
        let (p, _) = pipeline(StaticFetcher::default().with(BUNDLE, w.finish().unwrap()));
        let report = p.acquire_batch(BUNDLE, Placement::default()).await.unwrap();
        assert!(report.entries.is_empty());
    }

    #[tokio::test]
    async fn batch_continues_past_bad_entry() {
        let mut w = ArchiveWriter::new();
        w.add_file("config.json", br#"{"folders": ["m/"]}"#).unwrap();
        w.add_file("colors.txt", b"").unwrap();
        w.add_file("m/Atlas_Broken.glb", b"garbage").unwrap();
        w.add_file("m/Atlas_Fine.glb", &fixtures::triangle_glb()).unwrap();
        let (p, _) = pipeline(StaticFetcher::default().with(BUNDLE, w.finish().unwrap()));

        let report = p.acquire_batch(BUNDLE, Placement::default()).await.unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.loaded(), 1);
        assert!(!report.entries[0].is_loaded());
        assert_eq!(report.summaries()[0].id.as_str(), "Fine");

        let statuses: Vec<_> = p
            .queue()
            .snapshot()
            .unwrap()
            .into_iter()
            .map(|i| i.status)
            .collect();
        assert_eq!(statuses, [LoadStatus::Error, LoadStatus::Completed]);
    }

    #[tokio::test]
    async fn batch_network_failure_rejects() {
        let (p, _) = pipeline(StaticFetcher::default());
        let err = p.acquire_batch(BUNDLE, Placement::default()).await.unwrap_err();
        assert!(matches!(err, AcquireError::Network(_)));
    }

    #[test]
    fn report_serializes_tagged_outcomes() {
        let report = BatchReport {
            archive_url: BUNDLE.into(),
            entries: vec![BatchEntry {
                path: "m/Atlas_X.glb".into(),
                id: "X".into(),
                outcome: BatchOutcome::Failed {
                    error: "decode error: bad".into(),
                },
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["status"], "failed");
        assert_eq!(json["entries"][0]["error"], "decode error: bad");
    }
}
