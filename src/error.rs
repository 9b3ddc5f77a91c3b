use thiserror::Error;

/// The generic Error type covering every failure this library can surface.
///
/// The variants fall into three groups with different propagation rules:
///
/// ## Boot failures (fatal to `initialize()`)
/// - [`Error::Discovery`] - No usable hostfxr could be located
/// - [`Error::LibraryLoad`] - A shared library failed to load
/// - [`Error::SymbolResolution`] - A required exported symbol is missing
/// - [`Error::HostInitialization`] - hostfxr rejected the hosting context
/// - [`Error::DelegateResolution`] - The load-assembly delegate was not returned
/// - [`Error::EntryPointResolution`] - The managed entry method was not resolved
/// - [`Error::HandshakeFailed`] - The managed entry point reported failure
/// - [`Error::CallbackTableIncomplete`] - The managed side left a callback slot null
///
/// A boot failure means the host application continues without .NET support; no
/// retry is attempted within the same process.
///
/// ## Reload failures (recoverable, runtime stays usable)
/// - [`Error::ReloadUnloadFailed`] - Managed assemblies refused to unload
/// - [`Error::ReloadLoadFailed`] - The rebuilt project assembly failed to load
///
/// ## Programming errors
/// - [`Error::InvalidState`] - A lifecycle operation was called in the wrong state
///
/// Numeric status codes come straight from the hostfxr protocol and are printed
/// in hex, matching the convention of the .NET hosting error codes
/// (e.g. `0x80008083` for a missing core host library).
#[derive(Error, Debug)]
pub enum Error {
    /// No hostfxr library could be discovered for the active build mode.
    ///
    /// In tooling builds this means the installed-runtime discovery mechanism
    /// failed even after retrying with a `dotnet_root` hint; in deployed builds
    /// it means neither the bundled hostfxr nor a precompiled-native library
    /// exists at the probed paths.
    #[error(".NET: failed to locate hostfxr")]
    Discovery,

    /// A shared library exists but could not be loaded by the platform loader.
    #[error(".NET: failed to load library '{path}': {source}")]
    LibraryLoad {
        /// Path that was handed to the dynamic loader
        path: String,
        /// Underlying loader error
        source: libloading::Error,
    },

    /// A required exported symbol was not present in the loaded library.
    ///
    /// The source is absent when the symbol was never resolved in the first
    /// place (the optional command-line export being required by the chosen
    /// strategy after the fact).
    #[error(".NET: failed to resolve symbol '{symbol}'")]
    SymbolResolution {
        /// Name of the missing export
        symbol: &'static str,
        /// Underlying loader error, when resolution was attempted
        #[source]
        source: Option<libloading::Error>,
    },

    /// `hostfxr_initialize_for_runtime_config` or
    /// `hostfxr_initialize_for_dotnet_command_line` returned a nonzero status
    /// or a null context handle.
    #[error(".NET: hostfxr initialization failed with code: {code:#010x}")]
    HostInitialization {
        /// Status code returned by hostfxr
        code: i32,
    },

    /// `hostfxr_get_runtime_delegate` returned a nonzero status or a null
    /// delegate for `hdt_load_assembly_and_get_function_pointer`.
    #[error(".NET: hostfxr_get_runtime_delegate failed with code: {code:#010x}")]
    DelegateResolution {
        /// Status code returned by hostfxr
        code: i32,
    },

    /// The load-assembly delegate could not resolve the managed entry method.
    #[error(".NET: failed to get plugin initialization function pointer (code: {code:#010x})")]
    EntryPointResolution {
        /// Status code returned by the delegate
        code: i32,
    },

    /// The managed entry point ran but returned `false`.
    ///
    /// The usual cause is an interop slot-count mismatch between the native
    /// function table and the version the managed side was built against; the
    /// managed side must reject the whole handshake rather than index into a
    /// table with a different layout.
    #[error(".NET: plugin initialization failed")]
    HandshakeFailed,

    /// The handshake returned success but left a callback slot unfilled.
    ///
    /// A partially populated callback table must never be published; invoking a
    /// null member would be undefined behavior, so the table is rejected as a
    /// whole at validation time.
    #[error(".NET: managed callback table is missing '{missing}'")]
    CallbackTableIncomplete {
        /// Name of the first unfilled member
        missing: &'static str,
    },

    /// The managed side reported failure loading the project assembly.
    ///
    /// Note that a missing project assembly file is not an error at all; this
    /// variant covers the case where the file exists but loading it failed.
    #[error(".NET: failed to load project assembly")]
    ProjectAssemblyLoadFailed,

    /// During hot-reload, the managed side failed to unload the project plugin.
    ///
    /// Recoverable: the runtime host stays usable, only this reload attempt is
    /// abandoned.
    #[error(".NET: failed to unload assemblies")]
    ReloadUnloadFailed,

    /// During hot-reload, the rebuilt project assembly failed to load.
    #[error(".NET: failed to reload project assembly")]
    ReloadLoadFailed,

    /// A lifecycle operation was invoked in a state that does not permit it,
    /// e.g. `reload_project_assemblies()` while a reload is already in
    /// progress, or a second `initialize()` without an intervening shutdown.
    #[error(".NET: operation requires state {expected}, current state is {actual}")]
    InvalidState {
        /// State the operation requires
        expected: &'static str,
        /// State the manager was actually in
        actual: &'static str,
    },

    /// Filesystem I/O error from a probe or metadata query.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
