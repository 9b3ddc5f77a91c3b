//! The runtime host lifecycle state machine.
//!
//! [`RuntimeHostManager`] is the single owner of everything that crosses the
//! native/managed boundary: the loaded host library, the selected
//! [`HostingStrategy`], the interop function table and the validated managed
//! callback table. It drives the full boot sequence
//! (locate → load → initialize → entry resolution → handshake), the
//! project-assembly hot-reload protocol, and ordered teardown.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──initialize()──▶ Initializing ──handshake ok──▶ Ready
//!       ▲                              │                          │ ▲
//!       └──────── any boot error ──────┘            reload req.   │ │ reload done
//!                                                                 ▼ │ (ok or err)
//!                                                          ReloadInProgress
//!
//! Ready | ReloadInProgress ──shutdown()──▶ ShuttingDown ──▶ Shutdown
//! ```
//!
//! There is no path out of `Shutdown`: the manager is single-use per process,
//! because the managed runtime itself cannot be brought up twice in one
//! process. A failed `initialize()` returns to `Uninitialized` and the host
//! application simply continues without managed-runtime support.
//!
//! # Concurrency
//!
//! One manager per process, owned and driven by the host application's main
//! thread. `initialize()`, `reload_project_assemblies()` and `shutdown()` are
//! not reentrant and perform no internal locking; serializing them is the
//! caller's responsibility (typically free, since they map onto the
//! embedder's single-threaded lifecycle hooks). Every call into the hosting
//! library or managed code is blocking and synchronous, with no cancellation.

use tracing::{debug, error, warn};

use crate::{
    config::{BuildMode, HostConfig},
    hostfxr::{
        self, HostFxrLibrary, HostLibrary, HostingStrategy, Nethost, PrecompiledNativeLibrary,
        RuntimeDiscovery,
    },
    interop::{
        self, ApiCache, EntryPoint, InteropFunctionTable, PluginCallbacks,
    },
    loader::{self, EntryContract, ProjectAssemblyRecord},
    Error, Result,
};

/// Where the runtime host is in its life.
///
/// Exactly one instance exists, owned by the manager; every transition is
/// made on the single control thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum RuntimeLifecycleState {
    /// No host library is loaded. Either `initialize()` has not run, or it
    /// failed and the process continues without managed-runtime support.
    Uninitialized,
    /// The boot sequence is executing.
    Initializing,
    /// The runtime is up and the callback table is live.
    Ready,
    /// A project-assembly reload is executing.
    ReloadInProgress,
    /// Teardown is executing.
    ShuttingDown,
    /// The host library has been released. Terminal.
    Shutdown,
}

/// Process-wide owner and orchestrator of the managed runtime boundary.
///
/// Construct exactly one, keep it alive for the life of the process, and pass
/// it by reference to whatever needs the boundary; its absence
/// ([`RuntimeLifecycleState::Uninitialized`]) is cleanly observable. Dropping
/// it runs [`RuntimeHostManager::shutdown`].
pub struct RuntimeHostManager {
    config: HostConfig,
    interop: InteropFunctionTable,
    state: RuntimeLifecycleState,
    strategy: Option<HostingStrategy>,
    host_library: Option<HostLibrary>,
    api_cache: ApiCache,
    plugin_callbacks: Option<PluginCallbacks>,
    project_assembly: Option<ProjectAssemblyRecord>,
    finalizing_scripts_domain: bool,
    domain_unload_notifier: Option<Box<dyn FnMut()>>,
}

impl RuntimeHostManager {
    /// Create an uninitialized manager.
    ///
    /// `interop` is the frozen table of native functions that will be handed
    /// to managed code during the handshake.
    pub fn new(config: HostConfig, interop: InteropFunctionTable) -> RuntimeHostManager {
        RuntimeHostManager {
            config,
            interop,
            state: RuntimeLifecycleState::Uninitialized,
            strategy: None,
            host_library: None,
            api_cache: ApiCache::default(),
            plugin_callbacks: None,
            project_assembly: None,
            finalizing_scripts_domain: false,
            domain_unload_notifier: None,
        }
    }

    /// Register the hook fired when managed script domains are about to
    /// unload (start of every reload). The rest of the host application uses
    /// it to drop references into managed code before the unload proceeds.
    pub fn set_domain_unload_notifier(&mut self, notifier: impl FnMut() + 'static) {
        self.domain_unload_notifier = Some(Box::new(notifier));
    }

    /// Bring the managed runtime up.
    ///
    /// Runs the full boot sequence for the configured build mode. On success
    /// the state becomes [`RuntimeLifecycleState::Ready`] and, in tooling
    /// builds, one tolerated attempt is made to load the project assembly
    /// (the project may not use the managed layer, or may not be built yet;
    /// that is not an error). The attempt is skipped entirely under a
    /// project-manager hint, when no project is open.
    ///
    /// # Errors
    /// Any failure in the sequence aborts the whole call and returns the
    /// state machine to `Uninitialized` with all partial resources released;
    /// the error says which step failed (see [`crate::Error`]). Calling this
    /// again without an intervening process restart is rejected with
    /// [`Error::InvalidState`]: at most one live host library may exist per
    /// process.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state != RuntimeLifecycleState::Uninitialized {
            return Err(Error::InvalidState {
                expected: "Uninitialized",
                actual: self.state.into(),
            });
        }

        self.state = RuntimeLifecycleState::Initializing;
        debug!(".NET: initializing module");

        if let Err(err) = self.boot() {
            self.host_library = None;
            self.strategy = None;
            self.plugin_callbacks = None;
            self.api_cache.clear();
            self.state = RuntimeLifecycleState::Uninitialized;
            return Err(err);
        }

        self.state = RuntimeLifecycleState::Ready;

        if self.config.build_mode() == BuildMode::Tooling {
            self.load_assemblies_at_startup();
        }

        Ok(())
    }

    /// The one tolerated startup attempt at loading the project assembly.
    /// Skipped under a project-manager hint, when no project is open and
    /// there is nothing to load.
    fn load_assemblies_at_startup(&mut self) {
        if self.config.project_manager_hint() {
            return;
        }
        match self.load_project_assembly() {
            Ok(true) => {}
            Ok(false) => debug!(".NET: project assembly not loaded at startup"),
            Err(err) => warn!("{err}"),
        }
    }

    /// The boot sequence proper; any error unwinds to `initialize()`, which
    /// owns the cleanup.
    fn boot(&mut self) -> Result<()> {
        let discovery = match self.config.build_mode() {
            BuildMode::Tooling => {
                match Nethost::load_from(self.config.api_assemblies_dir()) {
                    Ok(nethost) => Some(nethost),
                    Err(err) => {
                        warn!(".NET: nethost unavailable, runtime discovery skipped: {err}");
                        None
                    }
                }
            }
            BuildMode::Deployed => None,
        };

        let hostfxr_path = hostfxr::find_hostfxr(
            &self.config,
            discovery.as_ref().map(|d| d as &dyn RuntimeDiscovery),
        );

        let precompiled_path = EntryContract::precompiled_native_path(&self.config);
        let precompiled_present =
            self.config.build_mode() == BuildMode::Deployed && precompiled_path.exists();

        let strategy = HostingStrategy::select(
            self.config.build_mode(),
            hostfxr_path.is_some(),
            precompiled_present,
        )
        .ok_or(Error::Discovery)?;

        let (host_library, entry, strategy) = match strategy {
            HostingStrategy::RuntimeConfig => {
                let path = hostfxr_path.as_deref().ok_or(Error::Discovery)?;
                let hostfxr = HostFxrLibrary::load(path)?;
                let delegate = hostfxr
                    .initialize_for_config(&EntryContract::runtime_config_path(&self.config))?;
                debug!(".NET: hostfxr initialized");

                let contract = EntryContract::for_mode(&self.config);
                let entry = loader::load_and_get_entry(&delegate, &contract, BuildMode::Tooling)?;
                (HostLibrary::HostFxr(hostfxr), entry, strategy)
            }
            HostingStrategy::CommandLine => {
                let path = hostfxr_path.as_deref().ok_or(Error::Discovery)?;
                match self.boot_self_contained(path) {
                    Ok((library, entry)) => (library, entry, HostingStrategy::CommandLine),
                    // A bundled hostfxr that cannot be loaded, or loads but
                    // lacks a required export, is treated like an absent one:
                    // the precompiled-native library can still bring the
                    // runtime up.
                    Err(err @ (Error::LibraryLoad { .. } | Error::SymbolResolution { .. }))
                        if precompiled_present =>
                    {
                        warn!(".NET: bundled hostfxr is unusable, falling back to the precompiled native library: {err}");
                        let (library, entry) = self.boot_precompiled(&precompiled_path)?;
                        (library, entry, HostingStrategy::PrecompiledNative)
                    }
                    Err(err) => return Err(err),
                }
            }
            HostingStrategy::PrecompiledNative => {
                let (library, entry) = self.boot_precompiled(&precompiled_path)?;
                (library, entry, strategy)
            }
        };

        let handshake =
            interop::perform_handshake(&entry, &self.interop, self.config.editor_hint())?;

        // The library must outlive every pointer received through the
        // handshake; install it before publishing the callbacks.
        self.host_library = Some(host_library);
        self.strategy = Some(strategy);
        self.api_cache.update(handshake.callbacks)?;
        self.plugin_callbacks = handshake.plugin_callbacks;

        self.notify_core_api_assembly_loaded();
        Ok(())
    }

    /// Command-line strategy: load the bundled hostfxr, initialize it
    /// self-contained on the project's main assembly, resolve the entry.
    fn boot_self_contained(&self, hostfxr_path: &std::path::Path) -> Result<(HostLibrary, EntryPoint)> {
        let hostfxr = HostFxrLibrary::load(hostfxr_path)?;

        let contract = EntryContract::for_mode(&self.config);
        let delegate = hostfxr
            .initialize_self_contained(&contract.assembly_path, self.config.command_line_args())?;
        debug!(".NET: hostfxr initialized");

        let entry = loader::load_and_get_entry(&delegate, &contract, BuildMode::Deployed)?;
        Ok((HostLibrary::HostFxr(hostfxr), entry))
    }

    fn boot_precompiled(&self, path: &std::path::Path) -> Result<(HostLibrary, EntryPoint)> {
        let native = PrecompiledNativeLibrary::load(path)?;
        // The fixed export carries the deployed entry signature.
        let entry = unsafe { EntryPoint::from_raw(BuildMode::Deployed, native.entry()) };
        Ok((HostLibrary::Precompiled(native), entry))
    }

    /// One-shot post-handshake notification, gated on the API cache being
    /// updated; after it fires the rest of the system may use the boundary.
    fn notify_core_api_assembly_loaded(&self) {
        let Some(callbacks) = self.api_cache.callbacks() else {
            return;
        };
        if let Some(on_loaded) = callbacks.on_core_api_assembly_loaded {
            unsafe { on_loaded(self.config.debug_enabled()) };
        }
    }

    /// Ask the managed side to (re)load the project's compiled assembly from
    /// the temp build-output directory.
    ///
    /// Returns `Ok(false)` when there is nothing to load: the assembly does
    /// not exist (expected, not an error) or the callback table is not live.
    /// A managed-side failure to load an assembly that does exist is
    /// [`Error::ProjectAssemblyLoadFailed`]. A successful load returns
    /// `Ok(true)` and updates the project-assembly record.
    pub fn load_project_assembly(&mut self) -> Result<bool> {
        let Some(callbacks) = self.api_cache.callbacks() else {
            return Ok(false);
        };
        loader::load_project_assembly(&self.config, callbacks, &mut self.project_assembly)
    }

    /// Hot-reload the project's managed assemblies.
    ///
    /// Requires [`RuntimeLifecycleState::Ready`]; anything else (including a
    /// reentrant call while a reload is in progress) is rejected as a
    /// programming error without touching the state. The sequence is: notify
    /// the domain-unload hook, unload the project plugin through the callback
    /// table, reload the project assembly.
    ///
    /// # Errors
    /// [`Error::ReloadUnloadFailed`] when the managed side cannot unload, and
    /// [`Error::ReloadLoadFailed`] when the rebuilt assembly cannot be
    /// loaded; in both cases the state returns to `Ready` and the runtime
    /// host remains usable. Only this reload attempt failed.
    #[cfg(feature = "hot-reload")]
    pub fn reload_project_assemblies(&mut self) -> Result<()> {
        if self.state != RuntimeLifecycleState::Ready {
            return Err(Error::InvalidState {
                expected: "Ready",
                actual: self.state.into(),
            });
        }

        let unload = self
            .api_cache
            .callbacks()
            .and_then(|callbacks| callbacks.unload_project_plugin);

        self.state = RuntimeLifecycleState::ReloadInProgress;
        self.finalizing_scripts_domain = true;

        if let Some(notify) = self.domain_unload_notifier.as_mut() {
            notify();
        }

        let unload_ok = match unload {
            Some(unload) => unsafe { unload() },
            None => false,
        };
        if !unload_ok {
            error!(".NET: failed to unload assemblies");
            self.finalizing_scripts_domain = false;
            self.state = RuntimeLifecycleState::Ready;
            return Err(Error::ReloadUnloadFailed);
        }

        self.finalizing_scripts_domain = false;

        // During hot-reload, failing to load the project assembly is an
        // error, unlike at startup.
        if !matches!(self.load_project_assembly(), Ok(true)) {
            error!(".NET: failed to load project assembly");
            self.state = RuntimeLifecycleState::Ready;
            return Err(Error::ReloadLoadFailed);
        }

        self.state = RuntimeLifecycleState::Ready;
        Ok(())
    }

    /// Tear the boundary down.
    ///
    /// If the runtime ever came up and the callback table is live, the
    /// managed shutdown notification runs first, while the boundary is still
    /// valid; then the host library handle is released and the state becomes
    /// [`RuntimeLifecycleState::Shutdown`], terminally. Safe to call in any
    /// state, any number of times; when `initialize()` never succeeded this
    /// performs no managed-side calls.
    pub fn shutdown(&mut self) {
        if matches!(
            self.state,
            RuntimeLifecycleState::ShuttingDown | RuntimeLifecycleState::Shutdown
        ) {
            return;
        }

        self.state = RuntimeLifecycleState::ShuttingDown;
        self.finalizing_scripts_domain = true;

        if let Some(callbacks) = self.api_cache.callbacks() {
            if let Some(on_shutdown) = callbacks.on_runtime_shutdown {
                // Managed cleanup runs while the boundary is still valid.
                unsafe { on_shutdown() };
            }
        }

        self.api_cache.clear();
        self.plugin_callbacks = None;
        // Dropping the wrapper releases the dynamic-library handle exactly
        // once; a library refusing to close cannot be observed here and must
        // not block process exit.
        self.host_library = None;

        self.finalizing_scripts_domain = false;
        self.state = RuntimeLifecycleState::Shutdown;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RuntimeLifecycleState {
        self.state
    }

    /// Whether the runtime is up with a live, validated callback table.
    ///
    /// Never `true` before the API-cache-updated signal has been set.
    pub fn is_runtime_initialized(&self) -> bool {
        matches!(
            self.state,
            RuntimeLifecycleState::Ready | RuntimeLifecycleState::ReloadInProgress
        ) && self.api_cache.is_updated()
    }

    /// Whether managed script domains are currently being finalized (set for
    /// the unload window of a reload and during teardown).
    pub fn is_finalizing_scripts_domain(&self) -> bool {
        self.finalizing_scripts_domain
    }

    /// The strategy that brought the runtime up, once initialized.
    pub fn strategy(&self) -> Option<HostingStrategy> {
        self.strategy
    }

    /// Whether the runtime came up as a precompiled-native library. Sticky
    /// for the life of the process; the hosting-library path is never
    /// re-attempted.
    pub fn is_precompiled_native(&self) -> bool {
        self.strategy == Some(HostingStrategy::PrecompiledNative)
    }

    /// Editor plugin callbacks received in the tooling handshake; `None` in
    /// deployed builds or before initialization.
    pub fn plugin_callbacks(&self) -> Option<&PluginCallbacks> {
        self.plugin_callbacks.as_ref()
    }

    /// Record of the most recently loaded project assembly.
    pub fn project_assembly(&self) -> Option<&ProjectAssemblyRecord> {
        self.project_assembly.as_ref()
    }

    /// The configuration this manager was constructed with.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}

impl Drop for RuntimeHostManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::HostChar;
    use crate::interop::ManagedCallbackTable;
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    unsafe extern "system" fn load_ok(_: *const HostChar, _: *mut *const HostChar) -> bool {
        true
    }
    unsafe extern "system" fn unload_ok() -> bool {
        true
    }
    unsafe extern "system" fn unload_fail() -> bool {
        false
    }
    unsafe extern "system" fn loaded_stub(_: bool) {}

    unsafe extern "system" fn shutdown_stub() {}

    fn live_table(unload: unsafe extern "system" fn() -> bool) -> ManagedCallbackTable {
        ManagedCallbackTable {
            load_project_assembly: Some(load_ok),
            unload_project_plugin: Some(unload),
            on_core_api_assembly_loaded: Some(loaded_stub),
            on_runtime_shutdown: Some(shutdown_stub),
        }
    }

    fn empty_interop() -> InteropFunctionTable {
        InteropFunctionTable::builder().build()
    }

    /// A manager forced into Ready with a live fake callback table, without a
    /// real runtime behind it.
    fn ready_manager(config: HostConfig, table: ManagedCallbackTable) -> RuntimeHostManager {
        let mut manager = RuntimeHostManager::new(config, empty_interop());
        manager.api_cache.update(table).unwrap();
        manager.state = RuntimeLifecycleState::Ready;
        manager
    }

    fn tooling_config_with_project(dir: &std::path::Path) -> HostConfig {
        HostConfig::new(BuildMode::Tooling, "/unused")
            .with_temp_assemblies_dir(dir)
            .with_assembly_name("ReloadMe")
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let mut manager = ready_manager(
            HostConfig::new(BuildMode::Tooling, "/unused"),
            live_table(unload_ok),
        );

        let err = manager.initialize().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                expected: "Uninitialized",
                actual: "Ready"
            }
        ));
        assert_eq!(manager.state(), RuntimeLifecycleState::Ready);
    }

    #[test]
    fn deployed_initialize_without_any_library_fails_and_stays_uninitialized() {
        let dir = std::env::temp_dir().join("clrhost_manager_empty_api_dir");
        std::fs::create_dir_all(&dir).unwrap();

        let config = HostConfig::new(BuildMode::Deployed, &dir).with_assembly_name("NoSuchGame");
        let mut manager = RuntimeHostManager::new(config, empty_interop());

        let err = manager.initialize().unwrap_err();
        assert!(matches!(err, Error::Discovery));
        assert_eq!(manager.state(), RuntimeLifecycleState::Uninitialized);
        assert!(!manager.is_runtime_initialized());
        assert!(manager.strategy().is_none());

        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn runtime_not_initialized_before_cache_update() {
        let mut manager = RuntimeHostManager::new(
            HostConfig::new(BuildMode::Tooling, "/unused"),
            empty_interop(),
        );
        // Even if the state were forced to Ready, a cold cache keeps the
        // boundary unusable.
        manager.state = RuntimeLifecycleState::Ready;
        assert!(!manager.is_runtime_initialized());
        assert!(matches!(manager.load_project_assembly(), Ok(false)));
    }

    #[test]
    fn project_manager_hint_skips_startup_assembly_load() {
        let dir = std::env::temp_dir().join("clrhost_manager_pm_hint");
        std::fs::create_dir_all(&dir).unwrap();
        let assembly = dir.join("ReloadMe.dll");
        std::fs::write(&assembly, b"built").unwrap();

        let config = tooling_config_with_project(&dir).with_project_manager_hint(true);
        let mut manager = ready_manager(config, live_table(unload_ok));

        manager.load_assemblies_at_startup();
        assert!(manager.project_assembly().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn startup_assembly_load_runs_without_project_manager_hint() {
        let dir = std::env::temp_dir().join("clrhost_manager_no_pm_hint");
        std::fs::create_dir_all(&dir).unwrap();
        let assembly = dir.join("ReloadMe.dll");
        std::fs::write(&assembly, b"built").unwrap();

        let mut manager = ready_manager(tooling_config_with_project(&dir), live_table(unload_ok));

        manager.load_assemblies_at_startup();
        let record = manager.project_assembly().expect("startup load records assembly");
        assert_eq!(record.path, assembly);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[cfg(feature = "hot-reload")]
    #[test]
    fn reload_requires_ready_state() {
        let mut manager = RuntimeHostManager::new(
            HostConfig::new(BuildMode::Tooling, "/unused"),
            empty_interop(),
        );

        let err = manager.reload_project_assemblies().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                expected: "Ready",
                actual: "Uninitialized"
            }
        ));
        assert_eq!(manager.state(), RuntimeLifecycleState::Uninitialized);
    }

    #[cfg(feature = "hot-reload")]
    #[test]
    fn reentrant_reload_is_rejected() {
        let mut manager = ready_manager(
            HostConfig::new(BuildMode::Tooling, "/unused"),
            live_table(unload_ok),
        );
        manager.state = RuntimeLifecycleState::ReloadInProgress;

        let err = manager.reload_project_assemblies().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                expected: "Ready",
                actual: "ReloadInProgress"
            }
        ));
        assert_eq!(manager.state(), RuntimeLifecycleState::ReloadInProgress);
    }

    #[cfg(feature = "hot-reload")]
    #[test]
    fn reload_unload_failure_returns_ready_with_error() {
        let dir = std::env::temp_dir().join("clrhost_manager_unload_fail");
        std::fs::create_dir_all(&dir).unwrap();

        let notified = std::sync::Arc::new(AtomicBool::new(false));
        let seen = notified.clone();

        let mut manager = ready_manager(tooling_config_with_project(&dir), live_table(unload_fail));
        manager.set_domain_unload_notifier(move || {
            seen.store(true, Ordering::SeqCst);
        });

        let err = manager.reload_project_assemblies().unwrap_err();
        assert!(matches!(err, Error::ReloadUnloadFailed));
        assert_eq!(manager.state(), RuntimeLifecycleState::Ready);
        assert!(!manager.is_finalizing_scripts_domain());
        assert!(notified.load(Ordering::SeqCst), "unload hook must fire first");
        // The runtime itself stays usable.
        assert!(manager.is_runtime_initialized());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[cfg(feature = "hot-reload")]
    #[test]
    fn reload_load_failure_returns_ready_with_error() {
        let dir = std::env::temp_dir().join("clrhost_manager_load_fail");
        std::fs::create_dir_all(&dir).unwrap();
        // No ReloadMe.dll in the temp dir: the unload succeeds but the load
        // step cannot.

        let mut manager = ready_manager(tooling_config_with_project(&dir), live_table(unload_ok));

        let err = manager.reload_project_assemblies().unwrap_err();
        assert!(matches!(err, Error::ReloadLoadFailed));
        assert_eq!(manager.state(), RuntimeLifecycleState::Ready);
        assert!(manager.project_assembly().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[cfg(feature = "hot-reload")]
    #[test]
    fn successful_reload_updates_record_to_disk_mtime() {
        let dir = std::env::temp_dir().join("clrhost_manager_reload_ok");
        std::fs::create_dir_all(&dir).unwrap();
        let assembly = dir.join("ReloadMe.dll");
        std::fs::write(&assembly, b"rebuilt").unwrap();
        let on_disk_mtime = std::fs::metadata(&assembly).unwrap().modified().unwrap();

        let mut manager = ready_manager(tooling_config_with_project(&dir), live_table(unload_ok));

        manager.reload_project_assemblies().unwrap();
        assert_eq!(manager.state(), RuntimeLifecycleState::Ready);
        assert!(!manager.is_finalizing_scripts_domain());

        let record = manager.project_assembly().expect("reload records assembly");
        assert_eq!(record.path, assembly);
        assert_eq!(record.modified, on_disk_mtime);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn shutdown_without_initialization_is_silent() {
        let mut manager = RuntimeHostManager::new(
            HostConfig::new(BuildMode::Deployed, "/unused"),
            empty_interop(),
        );

        // No callback table was ever live, so no managed-side notification
        // can happen; the call must still transition cleanly.
        manager.shutdown();
        assert_eq!(manager.state(), RuntimeLifecycleState::Shutdown);

        // Idempotent.
        manager.shutdown();
        assert_eq!(manager.state(), RuntimeLifecycleState::Shutdown);
    }

    static READY_SHUTDOWN_CALLS: AtomicUsize = AtomicUsize::new(0);
    unsafe extern "system" fn ready_shutdown_counter() {
        READY_SHUTDOWN_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn shutdown_from_ready_notifies_managed_side_once() {
        let mut table = live_table(unload_ok);
        table.on_runtime_shutdown = Some(ready_shutdown_counter);
        let mut manager = ready_manager(HostConfig::new(BuildMode::Tooling, "/unused"), table);

        manager.shutdown();
        assert_eq!(manager.state(), RuntimeLifecycleState::Shutdown);
        assert_eq!(READY_SHUTDOWN_CALLS.load(Ordering::SeqCst), 1);
        assert!(!manager.is_runtime_initialized());

        manager.shutdown();
        assert_eq!(READY_SHUTDOWN_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_is_terminal() {
        let mut manager = RuntimeHostManager::new(
            HostConfig::new(BuildMode::Deployed, "/unused"),
            empty_interop(),
        );
        manager.shutdown();

        let err = manager.initialize().unwrap_err();
        assert!(matches!(err, Error::InvalidState { actual: "Shutdown", .. }));
    }

    static DROP_SHUTDOWN_CALLS: AtomicUsize = AtomicUsize::new(0);
    unsafe extern "system" fn drop_shutdown_counter() {
        DROP_SHUTDOWN_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn drop_runs_shutdown() {
        {
            let mut table = live_table(unload_ok);
            table.on_runtime_shutdown = Some(drop_shutdown_counter);
            let _manager = ready_manager(HostConfig::new(BuildMode::Tooling, "/unused"), table);
        }
        assert_eq!(DROP_SHUTDOWN_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn entry_point_reinterpretation_is_mode_shaped() {
        unsafe extern "system" fn deployed_entry(
            _: *mut c_void,
            _: *mut ManagedCallbackTable,
            _: *const *const c_void,
            _: i32,
        ) -> bool {
            true
        }

        let raw = deployed_entry as *mut c_void;
        let entry = unsafe { EntryPoint::from_raw(BuildMode::Deployed, raw) };
        assert!(matches!(entry, EntryPoint::Deployed(_)));
    }
}
