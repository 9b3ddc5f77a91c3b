//! # clrhost Prelude
//!
//! Convenient re-exports of the types most embedders touch: build the
//! [`HostConfig`] and the [`InteropFunctionTable`], hand both to a
//! [`RuntimeHostManager`], and drive its lifecycle.
//!
//! ```rust,no_run
//! use clrhost::prelude::*;
//!
//! let config = HostConfig::new(BuildMode::Deployed, "data/api_assemblies")
//!     .with_assembly_name("SpaceGame");
//! let interop = InteropFunctionTable::builder().build();
//!
//! let mut host = RuntimeHostManager::new(config, interop);
//! host.initialize()?;
//! # Ok::<(), clrhost::Error>(())
//! ```

pub use crate::{
    bindings::ScriptBindings,
    config::{BuildMode, HostConfig},
    hostfxr::HostingStrategy,
    interop::{InteropFunctionTable, ManagedCallbackTable, PluginCallbacks},
    loader::ProjectAssemblyRecord,
    manager::{RuntimeHostManager, RuntimeLifecycleState},
    Error, Result,
};
