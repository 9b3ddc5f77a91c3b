//! Small path helpers used by runtime discovery.
//!
//! The interesting one is [`find_executable`], which walks the process search
//! path the way a shell would; discovery uses it to locate the `dotnet`
//! executable when the standard resolver cannot find an installation on its
//! own.

use std::env;
use std::path::{Path, PathBuf};

/// Locate an executable by name on the process search path (`PATH`).
///
/// On Windows the `PATHEXT` extensions are tried for names given without an
/// extension. Returns the first match; `None` when the name is not on the
/// path.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    find_executable_in(name, &env::var_os("PATH")?)
}

/// [`find_executable`] against an explicit search-path value.
fn find_executable_in(name: &str, search_path: &std::ffi::OsStr) -> Option<PathBuf> {
    for dir in env::split_paths(search_path) {
        if dir.as_os_str().is_empty() {
            continue;
        }

        for candidate in executable_candidates(&dir, name) {
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(windows)]
fn executable_candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    if Path::new(name).extension().is_some() {
        return vec![dir.join(name)];
    }

    let pathext = env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.BAT;.CMD".to_string());
    pathext
        .split(';')
        .filter(|ext| !ext.is_empty())
        .map(|ext| dir.join(format!("{name}{ext}")))
        .collect()
}

#[cfg(not(windows))]
fn executable_candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

/// Resolve a path past symlinks to an absolute real path.
///
/// The executable found on `PATH` is often a symlink into the actual
/// installation (snap and homebrew layouts do this), so the link target is
/// what the installation root must be derived from. Returns the input
/// unchanged when resolution fails.
pub fn realpath(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The directory containing `path`, or `None` for a bare root.
pub fn base_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
