//! Managed function pointers received back during the handshake.
//!
//! Two independent signals govern their use: a populated
//! [`ManagedCallbackTable`] out-parameter, and the API-cache-updated flag set
//! when validation accepts the table. Until the second signal, no native
//! caller may invoke any member; [`ApiCache`] enforces that by refusing to
//! hand the table out before it has been validated.

use crate::{
    ffi::HostChar,
    Error, Result,
};

/// Loads the project's managed assembly. Writes the canonical loaded path
/// through `r_loaded_path` (callee-owned, valid until the next call).
pub type LoadProjectAssemblyFn =
    unsafe extern "system" fn(assembly_path: *const HostChar, r_loaded_path: *mut *const HostChar) -> bool;

/// Unloads the project plugin during hot-reload. `false` means the managed
/// side could not collect the load context.
pub type UnloadProjectPluginFn = unsafe extern "system" fn() -> bool;

/// One-time notification that the core API assembly is usable; `debug`
/// reflects the native build configuration.
pub type OnCoreApiAssemblyLoadedFn = unsafe extern "system" fn(debug: bool);

/// Shutdown notification, delivered while the boundary is still valid so the
/// managed side can run cleanup.
pub type OnRuntimeShutdownFn = unsafe extern "system" fn();

/// The callback table the managed entry point fills during the handshake.
///
/// `#[repr(C)]` with nullable function-pointer members: a null slot means the
/// managed side never filled it, and the table as a whole is rejected. Valid
/// only between a successful handshake and the next teardown; after a
/// successful reload the table is to be treated as logically replaced.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct ManagedCallbackTable {
    /// Load the project assembly at a path.
    pub load_project_assembly: Option<LoadProjectAssemblyFn>,
    /// Unload the project plugin (hot-reload).
    pub unload_project_plugin: Option<UnloadProjectPluginFn>,
    /// Core API assembly became usable.
    pub on_core_api_assembly_loaded: Option<OnCoreApiAssemblyLoadedFn>,
    /// Runtime is shutting down.
    pub on_runtime_shutdown: Option<OnRuntimeShutdownFn>,
}

impl ManagedCallbackTable {
    /// Check that every member was filled in. Returns the name of the first
    /// missing one otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.load_project_assembly.is_none() {
            return Err(Error::CallbackTableIncomplete {
                missing: "load_project_assembly",
            });
        }
        if self.unload_project_plugin.is_none() {
            return Err(Error::CallbackTableIncomplete {
                missing: "unload_project_plugin",
            });
        }
        if self.on_core_api_assembly_loaded.is_none() {
            return Err(Error::CallbackTableIncomplete {
                missing: "on_core_api_assembly_loaded",
            });
        }
        if self.on_runtime_shutdown.is_none() {
            return Err(Error::CallbackTableIncomplete {
                missing: "on_runtime_shutdown",
            });
        }
        Ok(())
    }
}

/// Editor-side plugin hooks, received as a separate out-parameter in tooling
/// handshakes and exposed unchanged to the embedder.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct PluginCallbacks {
    /// Whether any loaded project assembly is stale and a reload would pick
    /// up new code.
    pub is_assembly_reloading_needed: Option<unsafe extern "system" fn() -> bool>,
    /// Editor request to reload assemblies; `soft` preserves script state
    /// across the reload.
    pub reload_assemblies: Option<unsafe extern "system" fn(soft: bool)>,
}

/// Holder for the validated callback table and the API-cache-updated flag.
#[derive(Default)]
pub struct ApiCache {
    callbacks: ManagedCallbackTable,
    updated: bool,
}

impl ApiCache {
    /// Validate and store a callback table received from a handshake, then
    /// set the updated flag. A partially filled table is rejected whole and
    /// the flag stays clear.
    pub fn update(&mut self, callbacks: ManagedCallbackTable) -> Result<()> {
        callbacks.validate()?;
        self.callbacks = callbacks;
        self.updated = true;
        Ok(())
    }

    /// Whether a validated table is live.
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// The live callback table, or `None` before validation / after
    /// [`ApiCache::clear`]. Callers must treat a `None` as "do not call into
    /// managed code".
    pub fn callbacks(&self) -> Option<&ManagedCallbackTable> {
        self.updated.then_some(&self.callbacks)
    }

    /// Drop the table and clear the flag (teardown).
    pub fn clear(&mut self) {
        self.callbacks = ManagedCallbackTable::default();
        self.updated = false;
    }
}
