use super::{AssetError, AssetLoader, ManifestEntry};
use crate::scene::SceneObject;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{mpsc, Arc};
use std::thread;

struct LoadJob {
    generation: u64,
    index: usize,
    entry: ManifestEntry,
}

/// Outcome of one background decode, tagged with the load generation it
/// was submitted under.
#[derive(Debug)]
pub struct LoadCompletion {
    pub generation: u64,
    pub index: usize,
    pub name: String,
    pub result: Result<SceneObject, AssetError>,
}

/// Worker pool that decodes assets off the event-loop thread. Placement and
/// registry insertion stay on the caller's thread; workers only decode.
pub struct LoadQueue {
    senders: Vec<mpsc::Sender<LoadJob>>,
    next_sender: AtomicUsize,
    rx: mpsc::Receiver<LoadCompletion>,
}

impl LoadQueue {
    pub fn new(loader: Arc<dyn AssetLoader>) -> Result<Self, AssetError> {
        let worker_count = thread::available_parallelism()
            .map(|n| n.get().clamp(2, 4))
            .unwrap_or(2);
        let (result_tx, result_rx) = mpsc::channel();
        let mut senders = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let (tx, rx) = mpsc::channel::<LoadJob>();
            let thread_result_tx = result_tx.clone();
            let thread_loader = Arc::clone(&loader);
            thread::Builder::new()
                .name(format!("model-load-{index}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        let result = thread_loader.load(&job.entry);
                        let completion = LoadCompletion {
                            generation: job.generation,
                            index: job.index,
                            name: job.entry.name,
                            result,
                        };
                        if thread_result_tx.send(completion).is_err() {
                            break;
                        }
                    }
                })
                .map_err(AssetError::Spawn)?;
            senders.push(tx);
        }
        log::debug!("Started {} model load workers", worker_count);
        Ok(Self {
            senders,
            next_sender: AtomicUsize::new(0),
            rx: result_rx,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    /// Hands a job to the next worker in round-robin order, skipping workers
    /// whose thread has exited.
    pub fn submit(
        &self,
        generation: u64,
        index: usize,
        entry: ManifestEntry,
    ) -> Result<(), AssetError> {
        let len = self.senders.len();
        if len == 0 {
            return Err(AssetError::QueueClosed);
        }
        let mut job = LoadJob {
            generation,
            index,
            entry,
        };
        let start = self.next_sender.fetch_add(1, AtomicOrdering::Relaxed) % len;
        for offset in 0..len {
            match self.senders[(start + offset) % len].send(job) {
                Ok(()) => return Ok(()),
                Err(mpsc::SendError(returned)) => job = returned,
            }
        }
        Err(AssetError::QueueClosed)
    }

    /// Completions received so far. Never blocks.
    pub fn drain(&self) -> Vec<LoadCompletion> {
        let mut results = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_support::unit_cube;
    use std::time::{Duration, Instant};

    struct CubeLoader;

    impl AssetLoader for CubeLoader {
        fn load(&self, entry: &ManifestEntry) -> Result<SceneObject, AssetError> {
            if entry.url.ends_with(".broken") {
                return Err(AssetError::NoGeometry {
                    path: entry.url.clone(),
                });
            }
            Ok(unit_cube(&entry.name))
        }
    }

    fn entry(name: &str, url: &str) -> ManifestEntry {
        ManifestEntry {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    fn wait_for(queue: &LoadQueue, count: usize) -> Vec<LoadCompletion> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut all = Vec::new();
        while all.len() < count && Instant::now() < deadline {
            all.extend(queue.drain());
            thread::sleep(Duration::from_millis(5));
        }
        all
    }

    #[test]
    fn every_job_comes_back_tagged() {
        let queue = LoadQueue::new(Arc::new(CubeLoader)).unwrap();
        assert!((2..=4).contains(&queue.worker_count()));
        for index in 0..6 {
            queue
                .submit(7, index, entry(&format!("m{index}"), "m.gltf"))
                .unwrap();
        }
        let mut done = wait_for(&queue, 6);
        assert_eq!(done.len(), 6);
        done.sort_by_key(|completion| completion.index);
        for (index, completion) in done.iter().enumerate() {
            assert_eq!(completion.generation, 7);
            assert_eq!(completion.index, index);
            assert_eq!(completion.name, format!("m{index}"));
            assert!(completion.result.is_ok());
        }
    }

    #[test]
    fn failures_are_reported_not_dropped() {
        let queue = LoadQueue::new(Arc::new(CubeLoader)).unwrap();
        queue.submit(1, 0, entry("bad", "bad.broken")).unwrap();
        let done = wait_for(&queue, 1);
        assert_eq!(done.len(), 1);
        assert!(matches!(done[0].result, Err(AssetError::NoGeometry { .. })));
    }
}
