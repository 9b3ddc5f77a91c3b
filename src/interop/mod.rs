//! The function-pointer interop boundary between native and managed code.
//!
//! Two tables cross the boundary during the handshake, in opposite
//! directions:
//!
//! - [`InteropFunctionTable`]: native function pointers handed to managed
//!   code as an opaque, versioned array
//! - [`ManagedCallbackTable`]: named managed function pointers received back,
//!   validated and published through [`ApiCache`]
//!
//! [`perform_handshake`] is the single crossing point that exchanges them.

mod callbacks;
mod handshake;
mod table;

pub use callbacks::{
    ApiCache, LoadProjectAssemblyFn, ManagedCallbackTable, OnCoreApiAssemblyLoadedFn,
    OnRuntimeShutdownFn, PluginCallbacks, UnloadProjectPluginFn,
};
pub use handshake::{
    perform_handshake, DeployedEntryFn, EntryPoint, HandshakeResult, ToolingEntryFn,
};
pub use table::{InteropFunctionTable, InteropFunctionTableBuilder, INTEROP_ABI_VERSION};
