//! Owning wrappers around the loaded hosting libraries.
//!
//! [`HostFxrLibrary`] holds the dlopened hostfxr together with its resolved
//! entry points and drives the two context-based initialization protocols.
//! [`PrecompiledNativeLibrary`] is the protocol-free fallback for
//! ahead-of-time compiled project code. Both release their underlying handle
//! exactly once, on drop; neither can be cloned, so at most one live handle
//! exists per loaded library.

use std::ffi::c_void;
use std::path::Path;

use tracing::debug;

use crate::{
    ffi::{
        HostChar, HostString, HostfxrCloseFn, HostfxrGetRuntimeDelegateFn, HostfxrHandle,
        HostfxrInitializeForDotnetCommandLineFn, HostfxrInitializeForRuntimeConfigFn,
        LoadAssemblyAndGetFunctionPointerFn, HDT_LOAD_ASSEMBLY_AND_GET_FUNCTION_POINTER,
        UNMANAGED_CALLERS_ONLY_METHOD,
    },
    Error, Result,
};

/// The loaded hostfxr library and its resolved exports.
///
/// `hostfxr_initialize_for_dotnet_command_line` is optional: only the
/// command-line strategy needs it, and tooling-oriented hostfxr builds may
/// omit it. The other three exports are required and their absence fails the
/// load.
pub struct HostFxrLibrary {
    initialize_for_dotnet_command_line: Option<HostfxrInitializeForDotnetCommandLineFn>,
    initialize_for_runtime_config: HostfxrInitializeForRuntimeConfigFn,
    get_runtime_delegate: HostfxrGetRuntimeDelegateFn,
    close: HostfxrCloseFn,
    // Dropped last; every resolved pointer above is only valid while this is
    // alive.
    _library: libloading::Library,
}

impl HostFxrLibrary {
    /// Load hostfxr from `path` and resolve its entry points.
    pub fn load(path: &Path) -> Result<HostFxrLibrary> {
        let library = unsafe { libloading::Library::new(path) }.map_err(|source| {
            Error::LibraryLoad {
                path: path.display().to_string(),
                source,
            }
        })?;

        debug!(path = %path.display(), "loaded hostfxr");

        let initialize_for_dotnet_command_line = unsafe {
            library
                .get::<HostfxrInitializeForDotnetCommandLineFn>(
                    b"hostfxr_initialize_for_dotnet_command_line\0",
                )
                .map(|symbol| *symbol)
                .ok()
        };

        let initialize_for_runtime_config = unsafe {
            library
                .get::<HostfxrInitializeForRuntimeConfigFn>(
                    b"hostfxr_initialize_for_runtime_config\0",
                )
                .map(|symbol| *symbol)
                .map_err(|source| Error::SymbolResolution {
                    symbol: "hostfxr_initialize_for_runtime_config",
                    source: Some(source),
                })?
        };

        let get_runtime_delegate = unsafe {
            library
                .get::<HostfxrGetRuntimeDelegateFn>(b"hostfxr_get_runtime_delegate\0")
                .map(|symbol| *symbol)
                .map_err(|source| Error::SymbolResolution {
                    symbol: "hostfxr_get_runtime_delegate",
                    source: Some(source),
                })?
        };

        let close = unsafe {
            library
                .get::<HostfxrCloseFn>(b"hostfxr_close\0")
                .map(|symbol| *symbol)
                .map_err(|source| Error::SymbolResolution {
                    symbol: "hostfxr_close",
                    source: Some(source),
                })?
        };

        Ok(HostFxrLibrary {
            initialize_for_dotnet_command_line,
            initialize_for_runtime_config,
            get_runtime_delegate,
            close,
            _library: library,
        })
    }

    /// Initialize a hosting context from a `*.runtimeconfig.json` descriptor
    /// and obtain the load-assembly delegate from it.
    ///
    /// The context handle is closed before returning; the delegate stays
    /// valid independently of it (but not of this library).
    pub fn initialize_for_config(
        &self,
        runtime_config_path: &Path,
    ) -> Result<LoadAssemblyAndGetFunctionPointer> {
        let config_path = HostString::from_path(runtime_config_path);

        let mut context: HostfxrHandle = std::ptr::null_mut();
        let rc = unsafe {
            (self.initialize_for_runtime_config)(
                config_path.as_ptr(),
                std::ptr::null(),
                &mut context,
            )
        };
        if rc != 0 || context.is_null() {
            unsafe { (self.close)(context) };
            return Err(Error::HostInitialization { code: rc });
        }

        let delegate = self.load_assembly_delegate(context);
        unsafe { (self.close)(context) };
        delegate
    }

    /// Initialize a hosting context in self-contained command-line mode and
    /// obtain the load-assembly delegate from it.
    ///
    /// The synthesized argument vector starts with the path to the project's
    /// main assembly, followed by the process's original command-line
    /// arguments in order.
    pub fn initialize_self_contained(
        &self,
        main_assembly_path: &Path,
        command_line_args: &[String],
    ) -> Result<LoadAssemblyAndGetFunctionPointer> {
        let initialize = self.initialize_for_dotnet_command_line.ok_or(
            Error::SymbolResolution {
                symbol: "hostfxr_initialize_for_dotnet_command_line",
                source: None,
            },
        )?;

        let assembly_path = HostString::from_path(main_assembly_path);
        let stored_args: Vec<HostString> =
            command_line_args.iter().map(HostString::new).collect();

        let mut argv: Vec<*const HostChar> = Vec::with_capacity(stored_args.len() + 1);
        argv.push(assembly_path.as_ptr());
        argv.extend(stored_args.iter().map(HostString::as_ptr));

        let mut context: HostfxrHandle = std::ptr::null_mut();
        let rc = unsafe {
            initialize(
                argv.len() as i32,
                argv.as_ptr(),
                std::ptr::null(),
                &mut context,
            )
        };
        if rc != 0 || context.is_null() {
            unsafe { (self.close)(context) };
            return Err(Error::HostInitialization { code: rc });
        }

        let delegate = self.load_assembly_delegate(context);
        unsafe { (self.close)(context) };
        delegate
    }

    fn load_assembly_delegate(
        &self,
        context: HostfxrHandle,
    ) -> Result<LoadAssemblyAndGetFunctionPointer> {
        let mut raw: *mut c_void = std::ptr::null_mut();
        let rc = unsafe {
            (self.get_runtime_delegate)(
                context,
                HDT_LOAD_ASSEMBLY_AND_GET_FUNCTION_POINTER,
                &mut raw,
            )
        };
        if rc != 0 || raw.is_null() {
            return Err(Error::DelegateResolution { code: rc });
        }

        Ok(LoadAssemblyAndGetFunctionPointer {
            raw: unsafe {
                std::mem::transmute::<*mut c_void, LoadAssemblyAndGetFunctionPointerFn>(raw)
            },
        })
    }
}

/// The delegate obtained from a hosting context: loads a managed assembly and
/// resolves a named unmanaged-callers-only static method from it.
///
/// Only valid while the [`HostFxrLibrary`] it came from is alive; the manager
/// upholds this by never letting a delegate outlive the library handle it
/// owns.
#[derive(Clone, Copy)]
pub struct LoadAssemblyAndGetFunctionPointer {
    raw: LoadAssemblyAndGetFunctionPointerFn,
}

impl LoadAssemblyAndGetFunctionPointer {
    /// Load `assembly_path` and resolve `method_name` on the fully qualified
    /// `type_name`, requesting an unmanaged-callers-only resolution (no
    /// marshaling shim).
    pub fn load(
        &self,
        assembly_path: &Path,
        type_name: &str,
        method_name: &str,
    ) -> Result<*mut c_void> {
        let assembly = HostString::from_path(assembly_path);
        let type_name = HostString::new(type_name);
        let method_name = HostString::new(method_name);

        let mut entry: *mut c_void = std::ptr::null_mut();
        let rc = unsafe {
            (self.raw)(
                assembly.as_ptr(),
                type_name.as_ptr(),
                method_name.as_ptr(),
                UNMANAGED_CALLERS_ONLY_METHOD,
                std::ptr::null_mut(),
                &mut entry,
            )
        };
        if rc != 0 || entry.is_null() {
            return Err(Error::EntryPointResolution { code: rc });
        }

        Ok(entry)
    }
}

/// A self-contained, ahead-of-time compiled project library.
///
/// No hosting protocol applies: the managed entry point was compiled to a
/// plain native export and is resolved directly at load time.
pub struct PrecompiledNativeLibrary {
    entry: *mut c_void,
    _library: libloading::Library,
}

/// Export name of the managed entry point in precompiled-native libraries.
pub const PRECOMPILED_ENTRY_SYMBOL: &str = "clrhost_game_main_init";

impl PrecompiledNativeLibrary {
    /// Load the precompiled library at `path` and resolve its fixed entry
    /// symbol.
    pub fn load(path: &Path) -> Result<PrecompiledNativeLibrary> {
        let library = unsafe { libloading::Library::new(path) }.map_err(|source| {
            Error::LibraryLoad {
                path: path.display().to_string(),
                source,
            }
        })?;

        let entry = unsafe {
            library
                .get::<*mut c_void>(b"clrhost_game_main_init\0")
                .map(|symbol| symbol.try_as_raw_ptr().unwrap_or(std::ptr::null_mut()))
                .map_err(|source| Error::SymbolResolution {
                    symbol: PRECOMPILED_ENTRY_SYMBOL,
                    source: Some(source),
                })?
        };
        if entry.is_null() {
            return Err(Error::SymbolResolution {
                symbol: PRECOMPILED_ENTRY_SYMBOL,
                source: None,
            });
        }

        debug!(path = %path.display(), "loaded precompiled-native project library");

        Ok(PrecompiledNativeLibrary {
            entry,
            _library: library,
        })
    }

    /// Raw pointer to the exported entry method.
    pub fn entry(&self) -> *mut c_void {
        self.entry
    }
}

/// The one host library handle this process owns, whichever kind the selected
/// strategy produced.
pub enum HostLibrary {
    /// hostfxr, for the runtime-config and command-line strategies.
    HostFxr(HostFxrLibrary),
    /// Direct precompiled-native project library.
    Precompiled(PrecompiledNativeLibrary),
}
