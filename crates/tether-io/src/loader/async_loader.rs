// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background scene loading on a fixed pool of worker threads.
//!
//! Workers only turn paths into [`SceneDefinition`]s. Instantiation into the
//! scene and every callback happen in [`AsyncSceneLoader::process`], on the
//! thread that owns the scene.

use super::{LoaderConfig, SceneSource};
use crossbeam_channel::Sender;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tether_core::{EntityId, ExternalLoader, LoadCallback, SceneDefinition, SceneGraph, SceneId};

type Parsed = Result<Arc<SceneDefinition>, String>;

/// Work sent to the pool.
struct LoadJob {
    epoch: u64,
    ticket: u64,
    path: PathBuf,
}

/// What a worker sends back.
struct JobOutcome {
    epoch: u64,
    ticket: u64,
    path: PathBuf,
    parsed: Parsed,
}

/// A load waiting for its result to be instantiated.
struct PendingLoad {
    container: EntityId,
    path: PathBuf,
    on_complete: LoadCallback,
}

/// Loads item scenes on worker threads.
///
/// Each [`load`](ExternalLoader::load) gets a ticket. Results come back on a
/// `flume` channel tagged with the ticket and the loader epoch; bumping the
/// epoch (see [`set_scene`](ExternalLoader::set_scene)) makes every
/// in-flight result unrecognizable, so it is dropped without firing.
///
/// Parsed definitions are kept per path; loading the same scene again skips
/// the worker round trip but is still delivered from `process`.
pub struct AsyncSceneLoader {
    config: LoaderConfig,
    source: SceneSource,
    job_tx: Option<Sender<LoadJob>>,
    outcome_rx: flume::Receiver<JobOutcome>,
    workers: Vec<thread::JoinHandle<()>>,
    pending: HashMap<u64, PendingLoad>,
    ready: VecDeque<(u64, Parsed)>,
    parsed: HashMap<PathBuf, Arc<SceneDefinition>>,
    scene: Option<SceneId>,
    epoch: u64,
    next_ticket: u64,
}

impl AsyncSceneLoader {
    /// Starts the worker pool.
    pub fn new(config: LoaderConfig, source: SceneSource) -> std::io::Result<Self> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<LoadJob>();
        let (outcome_tx, outcome_rx) = flume::unbounded::<JobOutcome>();

        let worker_count = config.worker_threads.max(1);
        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let job_rx = job_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let source = source.clone();
            let handle = thread::Builder::new()
                .name(format!("tether-loader-{index}"))
                .spawn(move || {
                    log::trace!("Scene loader worker {} started.", index);
                    while let Ok(job) = job_rx.recv() {
                        let parsed = source.resolve(&job.path).map_err(|e| e.to_string());
                        let outcome = JobOutcome {
                            epoch: job.epoch,
                            ticket: job.ticket,
                            path: job.path,
                            parsed,
                        };
                        if outcome_tx.send(outcome).is_err() {
                            break;
                        }
                    }
                    log::trace!("Scene loader worker {} stopped.", index);
                })?;
            workers.push(handle);
        }
        log::info!("Async scene loader started with {} worker(s).", worker_count);

        Ok(Self {
            config,
            source,
            job_tx: Some(job_tx),
            outcome_rx,
            workers,
            pending: HashMap::new(),
            ready: VecDeque::new(),
            parsed: HashMap::new(),
            scene: None,
            epoch: 0,
            next_ticket: 0,
        })
    }

    /// The definitions this loader resolves from.
    pub fn source(&self) -> &SceneSource {
        &self.source
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads started and not yet delivered.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Waits until every in-flight load has a result ready for `process`,
    /// or `timeout` elapses. Returns `true` when nothing is left waiting.
    pub fn wait_for_results(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.awaiting_results() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.outcome_rx.recv_timeout(remaining) {
                Ok(outcome) => self.accept(outcome),
                Err(_) => break,
            }
        }
        self.awaiting_results() == 0
    }

    fn awaiting_results(&self) -> usize {
        self.pending.len().saturating_sub(self.ready.len())
    }

    fn accept(&mut self, outcome: JobOutcome) {
        if outcome.epoch != self.epoch {
            log::trace!("Discarding stale load of {}", outcome.path.display());
            return;
        }
        if let Ok(definition) = &outcome.parsed {
            self.parsed
                .entry(outcome.path)
                .or_insert_with(|| Arc::clone(definition));
        }
        self.ready.push_back((outcome.ticket, outcome.parsed));
    }

    fn deliver(&mut self, scene: &mut dyn SceneGraph, ticket: u64, parsed: Parsed) {
        let Some(load) = self.pending.remove(&ticket) else {
            return;
        };
        if !scene.is_alive(load.container) {
            (load.on_complete)(Err(format!(
                "container {} was destroyed before {} finished loading",
                load.container,
                load.path.display()
            )));
            return;
        }
        match parsed {
            Ok(definition) => {
                definition.instantiate(scene, load.container);
                log::debug!("Instantiated {} under {}", load.path.display(), load.container);
                (load.on_complete)(Ok(()));
            }
            Err(message) => (load.on_complete)(Err(message)),
        }
    }
}

impl ExternalLoader for AsyncSceneLoader {
    fn set_scene(&mut self, scene: Option<SceneId>) {
        if self.scene == scene {
            return;
        }
        if !self.pending.is_empty() {
            log::info!(
                "Scene rebind discards {} in-flight load(s).",
                self.pending.len()
            );
        }
        self.epoch += 1;
        self.pending.clear();
        self.ready.clear();
        self.scene = scene;
    }

    fn load(
        &mut self,
        scene: &mut dyn SceneGraph,
        container: EntityId,
        scene_path: &Path,
        on_complete: LoadCallback,
    ) {
        match self.scene {
            None => self.set_scene(Some(scene.scene_id())),
            Some(bound) if bound != scene.scene_id() => {
                on_complete(Err(format!(
                    "loader is bound to {}, not {}",
                    bound,
                    scene.scene_id()
                )));
                return;
            }
            Some(_) => {}
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending.insert(
            ticket,
            PendingLoad {
                container,
                path: scene_path.to_path_buf(),
                on_complete,
            },
        );

        if let Some(definition) = self.parsed.get(scene_path) {
            self.ready.push_back((ticket, Ok(Arc::clone(definition))));
            return;
        }

        let job = LoadJob {
            epoch: self.epoch,
            ticket,
            path: scene_path.to_path_buf(),
        };
        let sent = self
            .job_tx
            .as_ref()
            .is_some_and(|tx| tx.send(job).is_ok());
        if !sent {
            self.ready
                .push_back((ticket, Err("scene loader workers are not running".to_string())));
        }
    }

    fn process(&mut self, scene: &mut dyn SceneGraph, _dt: f32) {
        if self.scene.is_some_and(|bound| bound != scene.scene_id()) {
            log::trace!("Loader processed with a scene it is not bound to; skipping.");
            return;
        }

        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.accept(outcome);
        }

        let budget = match self.config.max_completions_per_frame {
            0 => usize::MAX,
            n => n,
        };
        let mut delivered = 0;
        while delivered < budget {
            let Some((ticket, parsed)) = self.ready.pop_front() else {
                break;
            };
            self.deliver(scene, ticket, parsed);
            delivered += 1;
        }
        if !self.ready.is_empty() {
            log::trace!("{} load(s) deferred to next frame.", self.ready.len());
        }
    }
}

impl Drop for AsyncSceneLoader {
    fn drop(&mut self) {
        // Closing the queue ends the worker loops.
        self.job_tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("A scene loader worker panicked.");
            }
        }
    }
}
