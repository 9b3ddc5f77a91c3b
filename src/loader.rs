//! Managed assembly loading: entry contracts and the project assembly.
//!
//! Two well-known crossing points exist into managed code. The plugin
//! assembly ([`PLUGIN_ASSEMBLY_NAME`]) carries the engine-facing entry used
//! by tooling builds; deployed builds enter through the project's own main
//! assembly instead. [`EntryContract`] captures the (assembly, qualified
//! type, method) triple for either case, and [`load_and_get_entry`] turns it
//! into a callable [`crate::interop::EntryPoint`] via the hosting delegate.
//!
//! Separately, [`load_project_assembly`] asks the live managed side to load
//! the project's compiled assembly out of the temporary build-output
//! directory. Absence of that file is expected (the project may not use the
//! managed layer, or may not have been built yet) and is never an error.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::{
    config::{BuildMode, HostConfig},
    ffi::{decode_host_ptr, HostChar, HostString},
    hostfxr::LoadAssemblyAndGetFunctionPointer,
    interop::{EntryPoint, ManagedCallbackTable},
    Error, Result,
};

/// Name of the well-known plugin assembly bundled with the host.
pub const PLUGIN_ASSEMBLY_NAME: &str = "HostPlugins";

/// Platform suffix for precompiled-native project libraries.
fn native_library_suffix() -> &'static str {
    if cfg!(windows) {
        ".dll"
    } else if cfg!(target_os = "macos") {
        ".dylib"
    } else {
        ".so"
    }
}

/// The (assembly, fully qualified type, method) triple naming a managed entry
/// point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryContract {
    /// Path of the assembly to load.
    pub assembly_path: PathBuf,
    /// Assembly-qualified name of the type carrying the entry method.
    pub type_name: String,
    /// Name of the static entry method.
    pub method_name: String,
}

impl EntryContract {
    /// Entry contract for the build mode: the plugin assembly's
    /// `InitializeFromEngine` in tooling builds, the project main assembly's
    /// `InitializeFromGameProject` in deployed builds.
    pub fn for_mode(config: &HostConfig) -> EntryContract {
        match config.build_mode() {
            BuildMode::Tooling => EntryContract {
                assembly_path: config
                    .api_assemblies_dir()
                    .join(format!("{PLUGIN_ASSEMBLY_NAME}.dll")),
                type_name: format!("{PLUGIN_ASSEMBLY_NAME}.Main, {PLUGIN_ASSEMBLY_NAME}"),
                method_name: "InitializeFromEngine".to_string(),
            },
            BuildMode::Deployed => {
                let assembly_name = config.assembly_name();
                EntryContract {
                    assembly_path: config
                        .api_assemblies_dir()
                        .join(format!("{assembly_name}.dll")),
                    type_name: format!("{PLUGIN_ASSEMBLY_NAME}.Game.Main, {assembly_name}"),
                    method_name: "InitializeFromGameProject".to_string(),
                }
            }
        }
    }

    /// The runtimeconfig descriptor co-located with the plugin assembly,
    /// consumed by the runtime-config initialization protocol.
    pub fn runtime_config_path(config: &HostConfig) -> PathBuf {
        config
            .api_assemblies_dir()
            .join(format!("{PLUGIN_ASSEMBLY_NAME}.runtimeconfig.json"))
    }

    /// Probe path of the precompiled-native project library.
    pub fn precompiled_native_path(config: &HostConfig) -> PathBuf {
        config.api_assemblies_dir().join(format!(
            "{}{}",
            config.assembly_name(),
            native_library_suffix()
        ))
    }
}

/// Load the contract's assembly through the hosting delegate and reinterpret
/// the resolved method as the entry signature for the build mode.
pub fn load_and_get_entry(
    delegate: &LoadAssemblyAndGetFunctionPointer,
    contract: &EntryContract,
    build_mode: BuildMode,
) -> Result<EntryPoint> {
    let raw = delegate.load(
        &contract.assembly_path,
        &contract.type_name,
        &contract.method_name,
    )?;

    // The contract for this mode names a method with exactly the matching
    // entry signature; the delegate resolved it unmanaged-callers-only.
    Ok(unsafe { EntryPoint::from_raw(build_mode, raw) })
}

/// Path and staleness marker of the most recently loaded project assembly.
///
/// Mutated only on successful loads; the reload path compares the recorded
/// modification time against the on-disk one to decide whether a reload is
/// worthwhile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectAssemblyRecord {
    /// Canonical path reported back by the managed loader.
    pub path: PathBuf,
    /// On-disk modification time at the moment of the successful load.
    pub modified: SystemTime,
}

/// Ask the managed side to load the project's compiled assembly.
///
/// Returns `Ok(false)` without touching `record` when there is nothing to
/// load: the assembly file does not exist, no temp build-output directory is
/// configured, or the callback table carries no loader. A managed-side load
/// failure for an assembly that does exist is
/// [`Error::ProjectAssemblyLoadFailed`], also leaving `record` untouched. On
/// success the record is replaced with the canonical loaded path and its
/// on-disk modification time.
pub(crate) fn load_project_assembly(
    config: &HostConfig,
    callbacks: &ManagedCallbackTable,
    record: &mut Option<ProjectAssemblyRecord>,
) -> Result<bool> {
    let Some(temp_dir) = config.temp_assemblies_dir() else {
        return Ok(false);
    };

    let assembly_path = temp_dir.join(format!("{}.dll", config.assembly_name()));
    if !assembly_path.exists() {
        return Ok(false);
    }

    let Some(load) = callbacks.load_project_assembly else {
        return Ok(false);
    };

    let path_arg = HostString::from_path(&assembly_path);
    let mut loaded_ptr: *const HostChar = std::ptr::null();
    let success = unsafe { load(path_arg.as_ptr(), &mut loaded_ptr) };
    if !success {
        return Err(Error::ProjectAssemblyLoadFailed);
    }

    let loaded_path = if loaded_ptr.is_null() {
        assembly_path.clone()
    } else {
        PathBuf::from(unsafe { decode_host_ptr(loaded_ptr) })
    };

    let modified = modified_time(&loaded_path).unwrap_or_else(|| {
        warn!(path = %loaded_path.display(), "could not query assembly modification time");
        SystemTime::UNIX_EPOCH
    });

    debug!(path = %loaded_path.display(), "project assembly loaded");
    *record = Some(ProjectAssemblyRecord {
        path: loaded_path,
        modified,
    });

    Ok(true)
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
