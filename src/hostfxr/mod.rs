//! Discovery, loading and initialization of the hostfxr hosting library.
//!
//! This module owns the native side of bringing the .NET runtime up:
//!
//! - [`locator`] finds hostfxr on disk, via installed-runtime discovery
//!   (tooling builds) or a bundled-library probe (deployed builds)
//! - [`HostingStrategy`] picks one of the three mutually exclusive
//!   initialization protocols, once, from build mode and probe results
//! - [`HostFxrLibrary`] loads the library, resolves its exports and drives
//!   the chosen protocol to produce a [`LoadAssemblyAndGetFunctionPointer`]
//!   delegate
//! - [`PrecompiledNativeLibrary`] is the protocol-free fallback for
//!   ahead-of-time compiled project code
//!
//! Orchestration and lifecycle live in [`crate::manager`].

pub mod locator;

mod library;
mod strategy;

pub use library::{
    HostFxrLibrary, HostLibrary, LoadAssemblyAndGetFunctionPointer, PrecompiledNativeLibrary,
    PRECOMPILED_ENTRY_SYMBOL,
};
pub use locator::{find_hostfxr, Nethost, RuntimeDiscovery};
pub use strategy::HostingStrategy;
