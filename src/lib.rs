#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::missing_safety_doc)]
// unsafe is inherent to this crate's job: it dlopens hosting libraries,
// transmutes resolved addresses into typed function pointers, and calls
// through pointers received from managed code.

//! # clrhost
//!
//! A cross-platform bootstrap for embedding the .NET runtime in native
//! applications. `clrhost` discovers and loads the `hostfxr` hosting library,
//! drives one of its initialization protocols to bring the runtime up,
//! exchanges function-pointer tables with a well-known managed plugin
//! assembly, and manages the lifecycle of that interop boundary, including
//! project-assembly hot-reload and ordered teardown.
//!
//! ## How the runtime comes up
//!
//! One of three mutually exclusive hosting strategies is selected at startup,
//! as a pure function of build mode and filesystem probing
//! ([`hostfxr::HostingStrategy`]):
//!
//! - **Runtime-config** (tooling builds): hostfxr is discovered through the
//!   installed SDK's nethost resolver and initialized from the plugin
//!   assembly's `*.runtimeconfig.json`
//! - **Command-line** (deployed builds): the bundled hostfxr is initialized
//!   self-contained, with the project's main assembly as `argv[0]`
//! - **Precompiled-native** (deployed fallback): the project's managed code
//!   was ahead-of-time compiled into a plain shared library and its entry
//!   symbol is resolved directly, with no hosting protocol at all
//!
//! In all three cases the result is a managed entry function, which is called
//! exactly once: native hands over its interop function table, managed hands
//! back its callback table, and after validation the boundary is live.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clrhost::prelude::*;
//!
//! let config = HostConfig::new(BuildMode::Tooling, "data/api_assemblies")
//!     .with_temp_assemblies_dir(".build/temp")
//!     .with_project_name("Space Game")
//!     .with_editor_hint(true);
//!
//! let interop = InteropFunctionTable::builder().build();
//!
//! let mut host = RuntimeHostManager::new(config, interop);
//! if host.initialize().is_err() {
//!     // The application keeps running without managed-code support.
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`hostfxr`] - discovery, loading and initialization of the hosting
//!   library
//! - [`interop`] - the function-pointer tables crossing the boundary and the
//!   handshake that exchanges them
//! - [`loader`] - managed entry contracts and project-assembly loading
//! - [`manager`] - the lifecycle state machine owning all of the above
//! - [`bindings`] - the minimal pass-through surface for a scripting layer
//! - [`Error`] and [`Result`] - error handling
//!
//! ## Lifecycle and failure model
//!
//! Boot failures are fatal to `initialize()` but not to the process: the
//! subsystem reports why it could not come up and the host application
//! proceeds without it. Hot-reload failures are recoverable and leave the
//! runtime usable. Teardown notifies the managed side first, while the
//! boundary is still valid, and only then releases the host library; it is
//! safe to run even when initialization never succeeded.
//!
//! The manager is a process-wide singleton by contract (the runtime cannot be
//! instantiated twice in one process) and all lifecycle calls must come from
//! one control thread; see [`manager`] for the exact rules.

pub mod bindings;
pub mod config;
pub mod ffi;
pub mod hostfxr;
pub mod interop;
pub mod loader;
pub mod manager;
pub mod path_util;
pub mod prelude;

mod error;

pub use config::{BuildMode, HostConfig};
pub use error::Error;
pub use manager::{RuntimeHostManager, RuntimeLifecycleState};

/// Result type alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
