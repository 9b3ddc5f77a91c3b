//! The bidirectional handshake with the managed entry point.
//!
//! The resolved entry function is called exactly once with the native module
//! handle, the interop function table and out-parameters for the callback
//! tables. Tooling and deployed builds share the contract but differ in two
//! arguments (editor hint, plugin-callbacks out-parameter), so the entry is a
//! tagged variant over the two signatures rather than two unrelated paths.

use std::ffi::c_void;

use tracing::debug;

use crate::{
    config::BuildMode,
    interop::{InteropFunctionTable, ManagedCallbackTable, PluginCallbacks},
    Error, Result,
};

/// Tooling entry signature: editor hint and plugin callbacks included.
pub type ToolingEntryFn = unsafe extern "system" fn(
    native_handle: *mut c_void,
    editor_hint: bool,
    r_plugin_callbacks: *mut PluginCallbacks,
    r_managed_callbacks: *mut ManagedCallbackTable,
    interop_functions: *const *const c_void,
    interop_function_count: i32,
) -> bool;

/// Deployed entry signature.
pub type DeployedEntryFn = unsafe extern "system" fn(
    native_handle: *mut c_void,
    r_managed_callbacks: *mut ManagedCallbackTable,
    interop_functions: *const *const c_void,
    interop_function_count: i32,
) -> bool;

/// The managed initialization entry point, in whichever shape the build mode
/// requires.
pub enum EntryPoint {
    /// Entry used inside the editor/tooling host.
    Tooling(ToolingEntryFn),
    /// Entry used in shipped builds (including precompiled-native ones).
    Deployed(DeployedEntryFn),
}

impl EntryPoint {
    /// Reinterpret a raw resolved function pointer as the entry signature for
    /// `build_mode`.
    ///
    /// # Safety
    /// `raw` must be a non-null pointer to a function with exactly the
    /// corresponding signature, as resolved by the hosting delegate or the
    /// precompiled-native export.
    pub unsafe fn from_raw(build_mode: BuildMode, raw: *mut c_void) -> EntryPoint {
        match build_mode {
            BuildMode::Tooling => {
                EntryPoint::Tooling(std::mem::transmute::<*mut c_void, ToolingEntryFn>(raw))
            }
            BuildMode::Deployed => {
                EntryPoint::Deployed(std::mem::transmute::<*mut c_void, DeployedEntryFn>(raw))
            }
        }
    }
}

/// What a successful handshake produced. The callback table has not yet been
/// validated; that is [`crate::interop::ApiCache::update`]'s job.
pub struct HandshakeResult {
    /// Callback table as filled by the managed side.
    pub callbacks: ManagedCallbackTable,
    /// Plugin callbacks; present for tooling entries only.
    pub plugin_callbacks: Option<PluginCallbacks>,
}

/// Invoke the managed entry point, exchanging the interop table for the
/// callback tables.
///
/// A `false` return from the entry is fatal ([`Error::HandshakeFailed`]); the
/// usual cause is the managed side rejecting the interop slot count as an ABI
/// mismatch.
pub fn perform_handshake(
    entry: &EntryPoint,
    interop: &InteropFunctionTable,
    editor_hint: bool,
) -> Result<HandshakeResult> {
    let native_handle = native_self_handle();
    let mut callbacks = ManagedCallbackTable::default();

    match entry {
        EntryPoint::Tooling(initialize) => {
            let mut plugin_callbacks = PluginCallbacks::default();

            let ok = unsafe {
                initialize(
                    native_handle,
                    editor_hint,
                    &mut plugin_callbacks,
                    &mut callbacks,
                    interop.as_ptr(),
                    interop.count(),
                )
            };
            if !ok {
                return Err(Error::HandshakeFailed);
            }

            debug!(".NET: plugins initialized (tooling)");
            Ok(HandshakeResult {
                callbacks,
                plugin_callbacks: Some(plugin_callbacks),
            })
        }
        EntryPoint::Deployed(initialize) => {
            let ok = unsafe {
                initialize(
                    native_handle,
                    &mut callbacks,
                    interop.as_ptr(),
                    interop.count(),
                )
            };
            if !ok {
                return Err(Error::HandshakeFailed);
            }

            debug!(".NET: plugins initialized");
            Ok(HandshakeResult {
                callbacks,
                plugin_callbacks: None,
            })
        }
    }
}

/// Handle to the currently running process image, where the managed side
/// needs one to resolve natively exported symbols.
#[cfg(all(unix, not(target_os = "macos"), not(target_os = "ios")))]
fn native_self_handle() -> *mut c_void {
    libloading::os::unix::Library::this().into_raw().cast()
}

/// Managed code resolves the process image on its own on these platforms.
#[cfg(not(all(unix, not(target_os = "macos"), not(target_os = "ios"))))]
fn native_self_handle() -> *mut c_void {
    std::ptr::null_mut()
}
