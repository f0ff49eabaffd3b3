use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::{Result, StarflightError};

/// Stable identifier of an image registered with an [`AssetStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub usize);

/// Decoded image dimensions reported by a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
}

/// Ready-to-draw raster reference handed to the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub id: ImageId,
    pub source: String,
    pub width: u32,
    pub height: u32,
}

impl ImageHandle {
    /// Height over width.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 {
            return 1.0;
        }
        self.height as f32 / self.width as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Pending,
    Ready(ImageMeta),
    Failed(String),
    TimedOut,
}

/// What the simulation needs from whoever owns the images.
///
/// An empty ready list is not an error: the scene degrades to text-only
/// emblems.
pub trait AssetProvider {
    /// Snapshot of every image that can be drawn right now.
    fn ready_images(&self) -> Vec<ImageHandle>;

    fn is_ready(&self, id: ImageId) -> bool;
}

#[derive(Debug, Clone)]
struct AssetEntry {
    source: String,
    state: LoadState,
}

/// Registry of every image the scene may reference, with its load state.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    entries: Vec<AssetEntry>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds a store whose images are all ready. Mostly useful for hosts that
    /// decode up front, and for tests.
    pub fn from_ready<S: Into<String>>(images: impl IntoIterator<Item = (S, ImageMeta)>) -> Self {
        let mut store = Self::new();
        for (source, meta) in images {
            let id = store.register(source);
            // Zero-sized images are recorded as failed and simply not offered.
            let _ = store.mark_ready(id, meta);
        }
        store
    }

    pub fn register(&mut self, source: impl Into<String>) -> ImageId {
        self.entries.push(AssetEntry {
            source: source.into(),
            state: LoadState::Pending,
        });
        ImageId(self.entries.len() - 1)
    }

    pub fn mark_ready(&mut self, id: ImageId, meta: ImageMeta) -> Result<()> {
        let entry = self.entry_mut(id)?;
        if meta.width == 0 || meta.height == 0 {
            entry.state = LoadState::Failed("image has zero size".to_string());
            return Err(StarflightError::asset(
                entry.source.clone(),
                "image has zero size",
            ));
        }
        entry.state = LoadState::Ready(meta);
        Ok(())
    }

    pub fn mark_failed(&mut self, id: ImageId, reason: impl Into<String>) -> Result<()> {
        self.entry_mut(id)?.state = LoadState::Failed(reason.into());
        Ok(())
    }

    pub fn mark_timed_out(&mut self, id: ImageId) -> Result<()> {
        self.entry_mut(id)?.state = LoadState::TimedOut;
        Ok(())
    }

    pub fn state(&self, id: ImageId) -> Option<&LoadState> {
        self.entries.get(id.0).map(|entry| &entry.state)
    }

    pub fn source(&self, id: ImageId) -> Option<&str> {
        self.entries.get(id.0).map(|entry| entry.source.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ready_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.state, LoadState::Ready(_)))
            .count()
    }

    pub fn pending_ids(&self) -> Vec<ImageId> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.state == LoadState::Pending)
            .map(|(index, _)| ImageId(index))
            .collect()
    }

    fn entry_mut(&mut self, id: ImageId) -> Result<&mut AssetEntry> {
        self.entries
            .get_mut(id.0)
            .ok_or_else(|| StarflightError::msg(format!("unknown image id {}", id.0)))
    }
}

impl AssetProvider for AssetStore {
    fn ready_images(&self) -> Vec<ImageHandle> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry.state {
                LoadState::Ready(meta) => Some(ImageHandle {
                    id: ImageId(index),
                    source: entry.source.clone(),
                    width: meta.width,
                    height: meta.height,
                }),
                _ => None,
            })
            .collect()
    }

    fn is_ready(&self, id: ImageId) -> bool {
        matches!(self.state(id), Some(LoadState::Ready(_)))
    }
}

type Decoder = dyn Fn(&Path) -> Result<ImageMeta> + Send + Sync;

/// Handle to one in-flight image load.
#[derive(Debug, Clone)]
pub struct LoadTask {
    id: ImageId,
    cancelled: Arc<AtomicBool>,
}

impl LoadTask {
    pub fn id(&self) -> ImageId {
        self.id
    }

    /// The task's result, if it ever arrives, is discarded.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Loads a batch of images in parallel, one background task per image,
/// giving up on stragglers once the timeout elapses.
pub struct AssetLoader {
    decoder: Arc<Decoder>,
    timeout: Duration,
}

impl AssetLoader {
    pub fn new<F>(decoder: F) -> Self
    where
        F: Fn(&Path) -> Result<ImageMeta> + Send + Sync + 'static,
    {
        Self {
            decoder: Arc::new(decoder),
            timeout: Duration::from_millis(5_000),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Loads every path and returns the aggregated store. Individual failures
    /// never fail the batch.
    pub fn load_all<P: AsRef<Path>>(&self, paths: &[P]) -> AssetStore {
        let mut store = AssetStore::new();
        let total = paths.len();
        if total == 0 {
            tracing::info!("no images to load");
            return store;
        }

        tracing::info!(total, "loading images");
        let (tx, rx) = mpsc::channel::<(ImageId, Result<ImageMeta>)>();
        let mut tasks = Vec::with_capacity(total);

        for path in paths {
            let path: PathBuf = path.as_ref().to_path_buf();
            let id = store.register(path.display().to_string());
            let task = LoadTask {
                id,
                cancelled: Arc::new(AtomicBool::new(false)),
            };
            let worker = task.clone();
            let decoder = Arc::clone(&self.decoder);
            let tx = tx.clone();
            thread::spawn(move || {
                if worker.is_cancelled() {
                    return;
                }
                let result = decoder(&path);
                if !worker.is_cancelled() {
                    let _ = tx.send((worker.id(), result));
                }
            });
            tasks.push(task);
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let mut completed = 0;
        while completed < total {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let (id, result) = match rx.recv_timeout(remaining) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            };
            completed += 1;
            let source = store.source(id).unwrap_or_default().to_string();
            let outcome = match result {
                Ok(meta) => store.mark_ready(id, meta),
                Err(err) => store.mark_failed(id, err.to_string()).and(Err(err)),
            };
            match outcome {
                Ok(()) => tracing::info!(%source, completed, total, "image loaded"),
                Err(err) => tracing::warn!(
                    %source,
                    completed,
                    total,
                    error = %err,
                    "image failed to load"
                ),
            }
        }

        // Ids were handed out in path order, so they index `tasks`.
        for id in store.pending_ids() {
            if let Some(task) = tasks.get(id.0) {
                task.cancel();
            }
            let _ = store.mark_timed_out(id);
            tracing::warn!(
                source = store.source(id).unwrap_or_default(),
                "image load timed out"
            );
        }

        let ready = store.ready_count();
        if ready == 0 {
            tracing::warn!("no image could be loaded; only text phrases will be shown");
        } else {
            tracing::info!(ready, total, "images ready");
        }
        store
    }
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(width: u32, height: u32) -> ImageMeta {
        ImageMeta { width, height }
    }

    #[test]
    fn only_ready_images_are_offered() {
        let mut store = AssetStore::new();
        let a = store.register("a.jpg");
        let b = store.register("b.jpg");
        let c = store.register("c.jpg");
        store.mark_ready(a, meta(200, 100)).unwrap();
        store.mark_failed(b, "404").unwrap();

        let ready = store.ready_images();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].source, "a.jpg");
        assert_eq!(ready[0].aspect_ratio(), 0.5);
        assert!(store.is_ready(a));
        assert!(!store.is_ready(b));
        assert!(!store.is_ready(c));
        assert_eq!(store.pending_ids(), vec![c]);
    }

    #[test]
    fn zero_sized_images_count_as_failures() {
        let mut store = AssetStore::new();
        let id = store.register("empty.jpg");
        let err = store.mark_ready(id, meta(0, 10)).unwrap_err();
        assert!(format!("{err}").contains("empty.jpg"));
        assert!(matches!(store.state(id), Some(LoadState::Failed(_))));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut store = AssetStore::new();
        assert!(store.mark_timed_out(ImageId(3)).is_err());
    }

    #[test]
    fn loader_aggregates_partial_failures() {
        let loader = AssetLoader::new(|path: &Path| {
            let name = path.to_string_lossy();
            if name.contains("broken") {
                Err(StarflightError::asset(name.to_string(), "corrupt"))
            } else if name.contains("blank") {
                Ok(ImageMeta {
                    width: 0,
                    height: 0,
                })
            } else {
                Ok(ImageMeta {
                    width: 64,
                    height: 48,
                })
            }
        })
        .with_timeout(Duration::from_secs(5));

        let store = loader.load_all(&["img/one.jpg", "img/broken.jpg", "img/blank.jpg"]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.ready_count(), 1);
        assert_eq!(store.ready_images()[0].source, "img/one.jpg");
    }

    #[test]
    fn loader_times_out_slow_images() {
        let loader = AssetLoader::new(|path: &Path| {
            if path.to_string_lossy().contains("slow") {
                thread::sleep(Duration::from_millis(500));
            }
            Ok(ImageMeta {
                width: 10,
                height: 10,
            })
        })
        .with_timeout(Duration::from_millis(100));

        let store = loader.load_all(&["fast.jpg", "slow.jpg"]);
        assert!(store.is_ready(ImageId(0)));
        assert_eq!(store.state(ImageId(1)), Some(&LoadState::TimedOut));
    }

    #[test]
    fn empty_batch_yields_empty_store() {
        let loader = AssetLoader::new(|_: &Path| Ok(ImageMeta { width: 1, height: 1 }));
        let paths: [&str; 0] = [];
        let store = loader.load_all(&paths);
        assert!(store.is_empty());
        assert!(store.ready_images().is_empty());
    }
}
