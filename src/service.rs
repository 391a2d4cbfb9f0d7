//! Manifest generation service
//!
//! Owns the hash cache and the currently published manifest. Transport code
//! calls [`ManifestService::refresh`] to regenerate and
//! [`ManifestService::current`] to serve. Overlapping refreshes share one
//! scan, and readers keep getting the previous manifest until the new one
//! is complete.

use crate::archive::ArchiveBuilder;
use crate::config::{Config, ConfigProvider};
use crate::delete_list::read_delete_list;
use crate::hasher::HashAlgorithm;
use crate::manifest::{self, ManifestMetadata, UpdateManifest};
use crate::scan_cache::{HashCache, ScanSession};
use crate::scanner::{ScanReport, Scanner};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};

/// One finished manifest generation.
#[derive(Debug)]
pub struct Generation {
    pub manifest: Arc<UpdateManifest>,
    pub report: ScanReport,
    pub session: ScanSession,
}

enum FlightState {
    Running,
    Done(Arc<Generation>),
    /// The leader unwound without producing a result.
    Abandoned,
}

struct Flight {
    state: Mutex<FlightState>,
    finished: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Running),
            finished: Condvar::new(),
        }
    }

    fn wait(&self) -> Option<Arc<Generation>> {
        let mut state = lock(&self.state);
        loop {
            match &*state {
                FlightState::Running => {}
                FlightState::Done(generation) => return Some(Arc::clone(generation)),
                FlightState::Abandoned => return None,
            }
            state = self
                .finished
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn settle(&self, outcome: FlightState) {
        let mut state = lock(&self.state);
        if matches!(*state, FlightState::Running) {
            *state = outcome;
        }
        self.finished.notify_all();
    }
}

/// Clears the in-flight slot when the leader is done, even on unwind.
struct FlightGuard<'a> {
    slot: &'a Mutex<Option<Arc<Flight>>>,
    flight: Arc<Flight>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.settle(FlightState::Abandoned);
        *lock(self.slot) = None;
    }
}

pub struct ManifestService<P: ConfigProvider> {
    provider: P,
    public_dir: PathBuf,
    delete_list_dir: PathBuf,
    builder: ArchiveBuilder,
    cache: Mutex<HashCache>,
    current: RwLock<Option<Arc<Generation>>>,
    in_flight: Mutex<Option<Arc<Flight>>>,
}

impl ManifestService<Config> {
    /// Build a service from a loaded config and the server root it is
    /// relative to. Loads the hash cache unless caching is disabled.
    pub fn from_config(config: Config, root: &Path) -> Self {
        let layout = config.layout(root);
        let cache = if config.cache.enabled {
            HashCache::load(layout.hash_cache_file)
        } else {
            tracing::info!("hash cache disabled, every archive will be rebuilt");
            HashCache::in_memory()
        };
        let builder = config.archive.builder();
        Self::new(config, layout.public_dir, layout.delete_list_dir, cache, builder)
    }
}

impl<P: ConfigProvider> ManifestService<P> {
    pub fn new(
        provider: P,
        public_dir: impl Into<PathBuf>,
        delete_list_dir: impl Into<PathBuf>,
        cache: HashCache,
        builder: ArchiveBuilder,
    ) -> Self {
        Self {
            provider,
            public_dir: public_dir.into(),
            delete_list_dir: delete_list_dir.into(),
            builder,
            cache: Mutex::new(cache),
            current: RwLock::new(None),
            in_flight: Mutex::new(None),
        }
    }

    /// The last published generation, if any.
    pub fn current(&self) -> Option<Arc<Generation>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The last published manifest, if any.
    pub fn manifest(&self) -> Option<Arc<UpdateManifest>> {
        self.current().map(|g| Arc::clone(&g.manifest))
    }

    /// Regenerate the manifest and publish it.
    ///
    /// If a refresh is already running, this waits for it and returns its
    /// result instead of starting a second scan.
    pub fn refresh(&self) -> Arc<Generation> {
        loop {
            let (flight, leader) = {
                let mut slot = lock(&self.in_flight);
                match slot.as_ref() {
                    Some(flight) => (Arc::clone(flight), false),
                    None => {
                        let flight = Arc::new(Flight::new());
                        *slot = Some(Arc::clone(&flight));
                        (flight, true)
                    }
                }
            };

            if !leader {
                tracing::debug!("refresh already running, waiting for its result");
                match flight.wait() {
                    Some(generation) => return generation,
                    None => continue,
                }
            }

            let guard = FlightGuard {
                slot: &self.in_flight,
                flight,
            };
            let generation = Arc::new(self.generate());
            *self.current.write().unwrap_or_else(PoisonError::into_inner) =
                Some(Arc::clone(&generation));
            guard.flight.settle(FlightState::Done(Arc::clone(&generation)));
            drop(guard);
            return generation;
        }
    }

    fn generate(&self) -> Generation {
        let session = ScanSession::start();
        let algorithm = HashAlgorithm::resolve(&self.provider.hash_algorithm());
        let base_url = self.provider.file_base_url();

        let (mut outcome, saved) = {
            let mut cache = lock(&self.cache);
            let outcome =
                Scanner::new(&self.public_dir, base_url, algorithm, &self.builder).scan(&mut cache);
            (outcome, cache.save())
        };
        if let Err(e) = saved {
            tracing::warn!(error = %e, "failed to persist hash cache, continuing with in-memory state");
            outcome.report.issues.push(e);
        }

        let delete_list = read_delete_list(&self.delete_list_dir);
        let metadata = ManifestMetadata::from_provider(&self.provider);
        let manifest = manifest::assemble(metadata, outcome.output, delete_list);

        tracing::info!(
            version = %manifest.version,
            files = manifest.files.len(),
            directories = manifest.directories.len(),
            delete_list = manifest.delete_list.len(),
            "manifest generated"
        );

        Generation {
            manifest: Arc::new(manifest),
            session: session.finish(outcome.report.stats.clone()),
            report: outcome.report,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
