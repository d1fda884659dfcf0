//! Stub registry and interception lifecycle.

use crate::config::{Settings, StubsConfig};
use crate::error::{Result, StubError};
use crate::request::HttpRequest;
use crate::response::StubResponse;
use crate::stub::Stub;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A collaborator that routes intercepted network calls into a registry.
///
/// The registry only drives the hook's lifecycle; interception itself lives
/// in the hook. `load` and `unload` run while the registry is locked, so they
/// must not call back into it. `unload` may be called on a hook that is not
/// loaded and must tolerate that.
pub trait Hook: Send + Sync {
    /// Identity used for idempotent registration.
    fn name(&self) -> &str;

    /// Begin routing intercepted calls to the registry.
    fn load(&self);

    /// Stop routing intercepted calls.
    fn unload(&self);
}

/// Registry lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Started,
    Paused,
    /// Like `Idle`, reached through `stop()` with all stubs discarded.
    Stopped,
}

/// Resolution counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Lookups answered by a stub
    pub resolved: u64,
    /// Lookups that matched nothing
    pub unmatched: u64,
}

struct Inner {
    stubs: Vec<Stub>,
    hooks: Vec<Arc<dyn Hook>>,
    lifecycle: Lifecycle,
    settings: Settings,
    stats: RegistryStats,
}

/// Ordered stub collection with a start/stop/pause/resume lifecycle.
///
/// The registry is an explicit context object: the test harness owns it,
/// shares it with hooks (usually behind an [`Arc`]) and calls
/// [`reset`](Self::reset) between tests so no stub leaks into the next one.
///
/// Lookups go through [`resolve`](Self::resolve) regardless of the lifecycle
/// state; the lifecycle only drives the hooks.
pub struct StubRegistry {
    inner: Mutex<Inner>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            inner: Mutex::new(Inner {
                stubs: Vec::new(),
                hooks: Vec::new(),
                lifecycle: Lifecycle::Idle,
                settings,
                stats: RegistryStats::default(),
            }),
        }
    }

    /// Add a stub.
    ///
    /// A stub equal to an existing one (same method and URL criterion)
    /// replaces it in place, keeping its position. Otherwise the stub is
    /// appended.
    pub fn add(&self, stub: Stub) {
        let mut inner = self.inner.lock();
        Self::add_locked(&mut inner, stub);
    }

    fn add_locked(inner: &mut Inner, stub: Stub) {
        if let Some(idx) = inner.stubs.iter().position(|s| *s == stub) {
            debug!(method = %stub.method(), url = %stub.url(), position = idx, "Replacing stub");
            inner.stubs[idx] = stub;
        } else {
            debug!(method = %stub.method(), url = %stub.url(), "Adding stub");
            inner.stubs.push(stub);
        }
    }

    /// Add every stub from a config document, in order, and adopt its
    /// settings. Nothing is added if any stub is invalid.
    pub fn load_config(&self, config: &StubsConfig) -> Result<usize> {
        let stubs = config.to_stubs()?;
        let count = stubs.len();

        let mut inner = self.inner.lock();
        inner.settings = config.settings;
        for stub in stubs {
            Self::add_locked(&mut inner, stub);
        }

        info!(stubs = count, "Loaded stubs from config");
        Ok(count)
    }

    /// Discard all stubs.
    pub fn clear_stubs(&self) {
        self.inner.lock().stubs.clear();
    }

    /// Find the response for `request`.
    ///
    /// Stubs are scanned in insertion order and the first match wins, with
    /// the registry locked; `request` must not re-enter the registry. The
    /// response's delivery callback, if any, runs once after the registry
    /// lock has been released, so it may call back into the registry.
    pub fn resolve<R: HttpRequest + ?Sized>(&self, request: &R) -> Result<StubResponse> {
        let (found, settings) = {
            let mut inner = self.inner.lock();
            let found = inner
                .stubs
                .iter()
                .position(|stub| stub.matches(request))
                .map(|idx| (idx, inner.stubs[idx].response().clone()));
            match found {
                Some(_) => inner.stats.resolved += 1,
                None => inner.stats.unmatched += 1,
            }
            (found, inner.settings)
        };

        let Some((idx, response)) = found else {
            if settings.log_unmatched {
                warn!(
                    method = %request.method(),
                    url = %request.url(),
                    "No matching stub found"
                );
            }
            return Err(StubError::UnmatchedRequest {
                method: request.method(),
                url: request.url().to_string(),
            });
        };

        if settings.log_matches {
            debug!(
                method = %request.method(),
                url = %request.url(),
                position = idx,
                status = response.status_code(),
                simulated_failure = response.should_fail(),
                "Request matched stub"
            );
        }

        if let Some(callback) = response.delivery_callback() {
            callback();
        }

        Ok(response)
    }

    /// Register a hook unless one with the same name is already present.
    ///
    /// A hook registered while the registry is started is loaded right away.
    /// Returns `false` if the hook was already registered.
    pub fn register_hook(&self, hook: Arc<dyn Hook>) -> bool {
        let mut inner = self.inner.lock();
        if inner.hooks.iter().any(|h| h.name() == hook.name()) {
            return false;
        }

        if inner.lifecycle == Lifecycle::Started {
            hook.load();
        }
        debug!(hook = hook.name(), "Registered hook");
        inner.hooks.push(hook);
        true
    }

    /// Load all hooks. No-op when already started.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        if inner.lifecycle == Lifecycle::Started {
            return;
        }

        inner.hooks.iter().for_each(|h| h.load());
        inner.lifecycle = Lifecycle::Started;
        info!(
            hooks = inner.hooks.len(),
            stubs = inner.stubs.len(),
            "Stub registry started"
        );
    }

    /// Unload all hooks and discard all stubs.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        Self::stop_locked(&mut inner);
    }

    fn stop_locked(inner: &mut Inner) {
        inner.hooks.iter().for_each(|h| h.unload());
        inner.stubs.clear();
        inner.lifecycle = Lifecycle::Stopped;
        info!(hooks = inner.hooks.len(), "Stub registry stopped");
    }

    /// Unload all hooks but keep the stubs. Only applies when started.
    pub fn pause(&self) {
        let mut inner = self.inner.lock();
        if inner.lifecycle != Lifecycle::Started {
            return;
        }

        inner.hooks.iter().for_each(|h| h.unload());
        inner.lifecycle = Lifecycle::Paused;
        info!(stubs = inner.stubs.len(), "Stub registry paused");
    }

    /// Reload all hooks after a pause. No-op unless paused.
    pub fn resume(&self) {
        let mut inner = self.inner.lock();
        if inner.lifecycle != Lifecycle::Paused {
            return;
        }

        inner.hooks.iter().for_each(|h| h.load());
        inner.lifecycle = Lifecycle::Started;
        info!(stubs = inner.stubs.len(), "Stub registry resumed");
    }

    /// Stop and zero the counters in one step. Call between tests.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        Self::stop_locked(&mut inner);
        inner.stats = RegistryStats::default();
    }

    /// Snapshot of the registered stubs, in order.
    pub fn stubs(&self) -> Vec<Stub> {
        self.inner.lock().stubs.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().stubs.is_empty()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lock().lifecycle
    }

    pub fn is_started(&self) -> bool {
        self.lifecycle() == Lifecycle::Started
    }

    pub fn hook_count(&self) -> usize {
        self.inner.lock().hooks.len()
    }

    pub fn settings(&self) -> Settings {
        self.inner.lock().settings
    }

    pub fn set_settings(&self, settings: Settings) {
        self.inner.lock().settings = settings;
    }

    pub fn stats(&self) -> RegistryStats {
        self.inner.lock().stats
    }
}

impl Default for StubRegistry {
    fn default() -> Self {
        Self::new()
    }
}
