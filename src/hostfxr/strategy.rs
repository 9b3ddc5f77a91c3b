//! Hosting-strategy selection.
//!
//! Which initialization protocol the bootstrap drives is decided exactly once,
//! before anything is loaded, as a pure function of the build mode and two
//! filesystem probe results. Keeping the decision in one place (instead of
//! spreading conditionals through the boot sequence) makes it deterministic
//! and directly testable.

use crate::config::BuildMode;

/// The initialization protocol used to bring up the managed runtime.
///
/// Chosen once per process via [`HostingStrategy::select`] and immutable
/// afterwards; in particular, a process that booted in
/// [`HostingStrategy::PrecompiledNative`] mode never re-attempts the
/// hosting-library path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostingStrategy {
    /// Tooling builds: initialize a hosting context from the plugin assembly's
    /// `*.runtimeconfig.json` descriptor.
    RuntimeConfig,
    /// Deployed builds: initialize a hosting context from a synthesized
    /// command line whose first argument is the project's main assembly.
    CommandLine,
    /// Deployed fallback: the project's managed code was ahead-of-time
    /// compiled into a self-contained native library; no hosting protocol is
    /// involved and the entry symbol is resolved directly.
    PrecompiledNative,
}

impl HostingStrategy {
    /// Select the strategy for this process.
    ///
    /// `hostfxr_found` is the result of runtime discovery
    /// ([`crate::hostfxr::find_hostfxr`]); `precompiled_present` reports
    /// whether the precompiled-native library exists at its probed path (only
    /// consulted in deployed builds). Returns `None` when no strategy can
    /// bring the runtime up, which callers treat as a discovery failure.
    ///
    /// Tooling builds never fall back to precompiled-native: the editor needs
    /// the full hosting protocol for assembly reloading.
    pub fn select(
        build_mode: BuildMode,
        hostfxr_found: bool,
        precompiled_present: bool,
    ) -> Option<HostingStrategy> {
        match (build_mode, hostfxr_found) {
            (BuildMode::Tooling, true) => Some(HostingStrategy::RuntimeConfig),
            (BuildMode::Tooling, false) => None,
            (BuildMode::Deployed, true) => Some(HostingStrategy::CommandLine),
            (BuildMode::Deployed, false) => {
                if precompiled_present {
                    Some(HostingStrategy::PrecompiledNative)
                } else {
                    None
                }
            }
        }
    }
}
