//! Hostfxr discovery through the public locator API, driven by a scripted
//! discovery implementation standing in for nethost.

use std::cell::RefCell;
use std::path::PathBuf;

use clrhost::ffi::{HostChar, HostString, HOST_API_BUFFER_TOO_SMALL};
use clrhost::hostfxr::{find_hostfxr, HostingStrategy, RuntimeDiscovery};
use clrhost::{BuildMode, HostConfig};

/// Always reports a fixed path via the two-step buffer-sizing protocol.
struct FixedPathDiscovery {
    path: &'static str,
    sized_calls: RefCell<u32>,
}

impl FixedPathDiscovery {
    fn new(path: &'static str) -> Self {
        FixedPathDiscovery {
            path,
            sized_calls: RefCell::new(0),
        }
    }

    fn encoded(&self) -> Vec<HostChar> {
        let mut v: Vec<HostChar> = self.path.bytes().map(|b| b as HostChar).collect();
        v.push(0);
        v
    }
}

impl RuntimeDiscovery for FixedPathDiscovery {
    fn hostfxr_path(
        &self,
        buffer: Option<&mut [HostChar]>,
        size: &mut usize,
        _dotnet_root: Option<&HostString>,
    ) -> i32 {
        let encoded = self.encoded();
        match buffer {
            None => {
                *size = encoded.len();
                HOST_API_BUFFER_TOO_SMALL
            }
            Some(buffer) => {
                *self.sized_calls.borrow_mut() += 1;
                assert!(buffer.len() >= encoded.len(), "buffer not sized as reported");
                buffer[..encoded.len()].copy_from_slice(&encoded);
                0
            }
        }
    }
}

#[test]
fn tooling_discovery_retries_with_reported_buffer_size() {
    let discovery = FixedPathDiscovery::new("/dotnet/host/fxr/8.0.4/libhostfxr.so");
    let config = HostConfig::new(BuildMode::Tooling, "/unused");

    let found = find_hostfxr(&config, Some(&discovery));
    assert_eq!(
        found,
        Some(PathBuf::from("/dotnet/host/fxr/8.0.4/libhostfxr.so"))
    );
    assert_eq!(*discovery.sized_calls.borrow(), 1);
}

#[test]
fn deployed_mode_ignores_discovery_and_probes_the_bundle() {
    let dir = std::env::temp_dir().join("clrhost_it_deployed_probe");
    std::fs::create_dir_all(&dir).unwrap();

    let discovery = FixedPathDiscovery::new("/should/never/be/used");
    let config = HostConfig::new(BuildMode::Deployed, &dir);

    // Nothing bundled: no hostfxr, regardless of what discovery would say.
    assert_eq!(find_hostfxr(&config, Some(&discovery)), None);
    assert_eq!(*discovery.sized_calls.borrow(), 0);

    std::fs::remove_dir(&dir).ok();
}

#[test]
fn strategy_selection_is_deterministic_per_mode_and_probe() {
    let cases = [
        (BuildMode::Tooling, true, false, Some(HostingStrategy::RuntimeConfig)),
        (BuildMode::Tooling, false, true, None),
        (BuildMode::Deployed, true, false, Some(HostingStrategy::CommandLine)),
        (BuildMode::Deployed, false, true, Some(HostingStrategy::PrecompiledNative)),
        (BuildMode::Deployed, false, false, None),
    ];

    for (mode, found, precompiled, expected) in cases {
        // Exactly one strategy per combination, stable across repetition.
        for _ in 0..3 {
            assert_eq!(HostingStrategy::select(mode, found, precompiled), expected);
        }
    }
}
