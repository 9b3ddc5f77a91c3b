//! Locating the hostfxr library on disk.
//!
//! Tooling builds ask the machine's installed .NET SDK where hostfxr lives,
//! through the nethost `get_hostfxr_path` API (dlopened from the bundled
//! nethost library). Deployed builds skip discovery entirely and probe for the
//! hostfxr shared library bundled in the API assemblies directory.
//!
//! Discovery is expressed through the [`RuntimeDiscovery`] trait so the
//! status-code protocol (buffer-too-small retry, missing-core-host fallback)
//! can be exercised without a .NET installation present.

use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::{
    config::{BuildMode, HostConfig},
    ffi::{
        decode_host_buffer, GetHostfxrParameters, GetHostfxrPathFn, HostChar, HostString,
        CORE_HOST_LIB_MISSING_FAILURE, HOST_API_BUFFER_TOO_SMALL,
    },
    path_util, Error, Result,
};

/// Platform filename of the hostfxr shared library.
pub fn hostfxr_library_name() -> &'static str {
    if cfg!(windows) {
        "hostfxr.dll"
    } else if cfg!(target_os = "macos") {
        "libhostfxr.dylib"
    } else {
        "libhostfxr.so"
    }
}

/// Platform filename of the nethost shared library.
fn nethost_library_name() -> &'static str {
    if cfg!(windows) {
        "nethost.dll"
    } else if cfg!(target_os = "macos") {
        "libnethost.dylib"
    } else {
        "libnethost.so"
    }
}

/// The installed-runtime discovery mechanism, shaped like nethost's
/// `get_hostfxr_path`.
///
/// Writes the hostfxr path into `buffer` (when one is provided) and the
/// required length into `size`; returns a hosting status code. The two codes
/// this crate reacts to are [`HOST_API_BUFFER_TOO_SMALL`] and
/// [`CORE_HOST_LIB_MISSING_FAILURE`].
pub trait RuntimeDiscovery {
    /// Query the path to hostfxr, optionally constrained to an explicit
    /// dotnet installation root.
    fn hostfxr_path(
        &self,
        buffer: Option<&mut [HostChar]>,
        size: &mut usize,
        dotnet_root: Option<&HostString>,
    ) -> i32;
}

/// Production [`RuntimeDiscovery`]: the real nethost library, dlopened from
/// the API assemblies directory.
pub struct Nethost {
    // Field order matters: the resolved pointer must drop before the library.
    get_hostfxr_path: GetHostfxrPathFn,
    _library: libloading::Library,
}

impl Nethost {
    /// Load the nethost library bundled in `dir` and resolve
    /// `get_hostfxr_path` from it.
    pub fn load_from(dir: &Path) -> Result<Nethost> {
        let path = dir.join(nethost_library_name());

        let library = unsafe { libloading::Library::new(&path) }.map_err(|source| {
            Error::LibraryLoad {
                path: path.display().to_string(),
                source,
            }
        })?;

        let get_hostfxr_path = unsafe {
            library
                .get::<GetHostfxrPathFn>(b"get_hostfxr_path\0")
                .map(|symbol| *symbol)
                .map_err(|source| Error::SymbolResolution {
                    symbol: "get_hostfxr_path",
                    source: Some(source),
                })?
        };

        Ok(Nethost {
            get_hostfxr_path,
            _library: library,
        })
    }
}

impl RuntimeDiscovery for Nethost {
    fn hostfxr_path(
        &self,
        buffer: Option<&mut [HostChar]>,
        size: &mut usize,
        dotnet_root: Option<&HostString>,
    ) -> i32 {
        let parameters;
        let parameters_ptr = match dotnet_root {
            Some(root) => {
                parameters = GetHostfxrParameters {
                    size: std::mem::size_of::<GetHostfxrParameters>(),
                    assembly_path: std::ptr::null(),
                    dotnet_root: root.as_ptr(),
                };
                &parameters as *const GetHostfxrParameters
            }
            None => std::ptr::null(),
        };

        let buffer_ptr = buffer.map_or(std::ptr::null_mut(), <[HostChar]>::as_mut_ptr);

        unsafe { (self.get_hostfxr_path)(buffer_ptr, size, parameters_ptr) }
    }
}

/// Find the hostfxr library for the active build mode.
///
/// Returns `None` when no hostfxr could be located. That is not by itself
/// fatal to the process: in deployed builds a precompiled-native library may
/// still bring the runtime up (see
/// [`crate::hostfxr::HostingStrategy::select`]).
pub fn find_hostfxr(
    config: &HostConfig,
    discovery: Option<&dyn RuntimeDiscovery>,
) -> Option<PathBuf> {
    match config.build_mode() {
        BuildMode::Tooling => discover_installed(discovery?),
        BuildMode::Deployed => probe_bundled(config.api_assemblies_dir()),
    }
}

/// Tooling path: ask the installed SDK, with a `dotnet`-on-PATH fallback.
fn discover_installed(discovery: &dyn RuntimeDiscovery) -> Option<PathBuf> {
    let mut buffer_size = 0_usize;
    let mut rc = discovery.hostfxr_path(None, &mut buffer_size, None);

    if rc == HOST_API_BUFFER_TOO_SMALL {
        return discover_sized(discovery, buffer_size, None);
    }

    if rc == CORE_HOST_LIB_MISSING_FAILURE {
        // `get_hostfxr_path` doesn't consult `PATH` (it wants `DOTNET_ROOT`).
        // Find the dotnet executable ourselves and pass its installation root
        // as an explicit hint.
        if let Some(dotnet_exe) = path_util::find_executable("dotnet") {
            // The file found in PATH may be a symlink into the real install.
            let dotnet_exe = path_util::realpath(&dotnet_exe);

            if let Some(root) = path_util::base_dir(&dotnet_exe) {
                let root = HostString::from_path(root);

                buffer_size = 0;
                rc = discovery.hostfxr_path(None, &mut buffer_size, Some(&root));
                if rc == HOST_API_BUFFER_TOO_SMALL {
                    return discover_sized(discovery, buffer_size, Some(&root));
                }
            }
        }
    }

    if rc == CORE_HOST_LIB_MISSING_FAILURE {
        error!(
            ".NET: one of the dependent libraries is missing. Typically when the \
             hostfxr, hostpolicy or coreclr dynamic libraries are not present in \
             the expected locations."
        );
    }

    None
}

/// Sized retry once discovery has told us how big the path buffer must be.
fn discover_sized(
    discovery: &dyn RuntimeDiscovery,
    known_size: usize,
    dotnet_root: Option<&HostString>,
) -> Option<PathBuf> {
    let mut buffer = vec![0 as HostChar; known_size];
    let mut size = known_size;

    let rc = discovery.hostfxr_path(Some(&mut buffer), &mut size, dotnet_root);
    if rc != 0 {
        error!("get_hostfxr_path failed with code: {rc:#010x}");
        return None;
    }

    Some(PathBuf::from(decode_host_buffer(&buffer)))
}

/// Deployed path: probe the bundled hostfxr, existence check only.
fn probe_bundled(api_assemblies_dir: &Path) -> Option<PathBuf> {
    let probe_path = api_assemblies_dir.join(hostfxr_library_name());

    if probe_path.exists() {
        debug!(path = %probe_path.display(), "found bundled hostfxr");
        return Some(probe_path);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn encode(s: &str) -> Vec<HostChar> {
        let mut v: Vec<HostChar> = s.bytes().map(|b| b as HostChar).collect();
        v.push(0);
        v
    }

    /// Scripted discovery: each call pops the next step.
    struct MockDiscovery {
        steps: RefCell<Vec<Step>>,
        calls_with_root: RefCell<usize>,
    }

    enum Step {
        /// Return BufferTooSmall and report this required size.
        TooSmall(usize),
        /// Fill the buffer with this path and return 0.
        Path(&'static str),
        /// Return this raw status code.
        Code(i32),
    }

    impl MockDiscovery {
        fn new(steps: Vec<Step>) -> Self {
            MockDiscovery {
                steps: RefCell::new(steps),
                calls_with_root: RefCell::new(0),
            }
        }
    }

    impl RuntimeDiscovery for MockDiscovery {
        fn hostfxr_path(
            &self,
            buffer: Option<&mut [HostChar]>,
            size: &mut usize,
            dotnet_root: Option<&HostString>,
        ) -> i32 {
            if dotnet_root.is_some() {
                *self.calls_with_root.borrow_mut() += 1;
            }

            let mut steps = self.steps.borrow_mut();
            assert!(!steps.is_empty(), "discovery called more often than scripted");
            match steps.remove(0) {
                Step::TooSmall(required) => {
                    *size = required;
                    HOST_API_BUFFER_TOO_SMALL
                }
                Step::Path(path) => {
                    let encoded = encode(path);
                    let buffer = buffer.expect("sized call must pass a buffer");
                    assert!(buffer.len() >= encoded.len());
                    buffer[..encoded.len()].copy_from_slice(&encoded);
                    0
                }
                Step::Code(code) => code,
            }
        }
    }

    #[test]
    fn buffer_too_small_retries_with_sized_buffer() {
        let discovery = MockDiscovery::new(vec![
            Step::TooSmall(64),
            Step::Path("/usr/share/dotnet/host/fxr/8.0.0/libhostfxr.so"),
        ]);

        let found = discover_installed(&discovery);
        assert_eq!(
            found,
            Some(PathBuf::from("/usr/share/dotnet/host/fxr/8.0.0/libhostfxr.so"))
        );
    }

    #[test]
    fn sized_retry_failure_yields_none() {
        let discovery = MockDiscovery::new(vec![Step::TooSmall(64), Step::Code(-1)]);
        assert_eq!(discover_installed(&discovery), None);
    }

    #[test]
    fn missing_core_host_without_dotnet_on_path_yields_none() {
        // No `dotnet` hint retry happens when the executable is absent, so a
        // single scripted step suffices.
        let discovery = MockDiscovery::new(vec![Step::Code(CORE_HOST_LIB_MISSING_FAILURE)]);

        // The PATH may genuinely carry a dotnet install on the test machine;
        // in that case discovery gets a second, hinted call. Script a failure
        // for it as well.
        discovery
            .steps
            .borrow_mut()
            .push(Step::Code(CORE_HOST_LIB_MISSING_FAILURE));

        assert_eq!(discover_installed(&discovery), None);
    }

    #[test]
    fn unknown_failure_code_yields_none() {
        let discovery = MockDiscovery::new(vec![Step::Code(-42)]);
        assert_eq!(discover_installed(&discovery), None);
    }

    #[test]
    fn deployed_probe_finds_bundled_hostfxr() {
        let dir = std::env::temp_dir().join("clrhost_locator_probe_test");
        std::fs::create_dir_all(&dir).unwrap();
        let bundled = dir.join(hostfxr_library_name());
        std::fs::write(&bundled, b"not really a library").unwrap();

        assert_eq!(probe_bundled(&dir), Some(bundled.clone()));

        std::fs::remove_file(&bundled).unwrap();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn deployed_probe_missing_file_yields_none() {
        let dir = std::env::temp_dir().join("clrhost_locator_missing_test");
        std::fs::create_dir_all(&dir).unwrap();
        assert_eq!(probe_bundled(&dir), None);
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn tooling_mode_without_discovery_yields_none() {
        let config = HostConfig::new(BuildMode::Tooling, "/nonexistent");
        assert_eq!(find_hostfxr(&config, None), None);
    }

    #[test]
    fn nethost_load_from_missing_dir_is_library_load_error() {
        let result = Nethost::load_from(Path::new("/nonexistent/api_assemblies"));
        assert!(matches!(result, Err(Error::LibraryLoad { .. })));
    }
}
