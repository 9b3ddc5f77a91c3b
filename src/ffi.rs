//! Raw ABI surface of the .NET hosting libraries.
//!
//! Mirrors the contracts of `hostfxr.h`, `coreclr_delegates.h` and `nethost.h`:
//! function-pointer typedefs for the exports resolved from the hosting library,
//! the status codes the discovery API reports, and the `char_t` string
//! convention (UTF-16 on Windows, UTF-8 everywhere else).
//!
//! Everything in this module is a plain data contract; ownership and error
//! handling live in [`crate::hostfxr`].

use std::ffi::c_void;

/// The hosting libraries' `char_t`: UTF-16 code units on Windows.
#[cfg(windows)]
pub type HostChar = u16;

/// The hosting libraries' `char_t`: plain C chars (UTF-8) on non-Windows.
#[cfg(not(windows))]
pub type HostChar = std::os::raw::c_char;

/// Opaque hostfxr context handle.
pub type HostfxrHandle = *mut c_void;

/// `hostfxr_initialize_for_dotnet_command_line` - self-contained command-line
/// initialization. Optional export; only the command-line strategy needs it.
pub type HostfxrInitializeForDotnetCommandLineFn = unsafe extern "C" fn(
    argc: i32,
    argv: *const *const HostChar,
    parameters: *const c_void,
    host_context_handle: *mut HostfxrHandle,
) -> i32;

/// `hostfxr_initialize_for_runtime_config` - initialization from a
/// `*.runtimeconfig.json` descriptor.
pub type HostfxrInitializeForRuntimeConfigFn = unsafe extern "C" fn(
    runtime_config_path: *const HostChar,
    parameters: *const c_void,
    host_context_handle: *mut HostfxrHandle,
) -> i32;

/// `hostfxr_get_runtime_delegate` - requests a runtime delegate from an
/// initialized hosting context.
pub type HostfxrGetRuntimeDelegateFn = unsafe extern "C" fn(
    host_context_handle: HostfxrHandle,
    delegate_type: i32,
    delegate: *mut *mut c_void,
) -> i32;

/// `hostfxr_close` - releases a hosting context handle.
pub type HostfxrCloseFn = unsafe extern "C" fn(host_context_handle: HostfxrHandle) -> i32;

/// `load_assembly_and_get_function_pointer` - the delegate obtained from the
/// hosting context; loads an assembly and resolves a named static method.
pub type LoadAssemblyAndGetFunctionPointerFn = unsafe extern "system" fn(
    assembly_path: *const HostChar,
    type_name: *const HostChar,
    method_name: *const HostChar,
    delegate_type_name: *const HostChar,
    reserved: *mut c_void,
    delegate: *mut *mut c_void,
) -> i32;

/// `get_hostfxr_path` from nethost.
pub type GetHostfxrPathFn = unsafe extern "C" fn(
    buffer: *mut HostChar,
    buffer_size: *mut usize,
    parameters: *const GetHostfxrParameters,
) -> i32;

/// `get_hostfxr_parameters` from nethost. `dotnet_root`, when non-null,
/// overrides the installation root the discovery walks.
#[repr(C)]
pub struct GetHostfxrParameters {
    /// `sizeof(get_hostfxr_parameters)`, for ABI versioning on the C side.
    pub size: usize,
    /// Optional path to the application assembly; null for framework lookup.
    pub assembly_path: *const HostChar,
    /// Optional explicit dotnet installation root.
    pub dotnet_root: *const HostChar,
}

/// `hdt_load_assembly_and_get_function_pointer` from
/// `hostfxr_delegate_type`.
pub const HDT_LOAD_ASSEMBLY_AND_GET_FUNCTION_POINTER: i32 = 5;

/// `UNMANAGEDCALLERSONLY_METHOD`: passing `(char_t*)-1` as the delegate type
/// name requests an unmanaged-callers-only resolution with no marshaling shim.
pub const UNMANAGED_CALLERS_ONLY_METHOD: *const HostChar = usize::MAX as *const HostChar;

/// `CoreHostLibMissingFailure`: one of the dependent hosting libraries (fxr,
/// policy, coreclr) is not present in the expected locations.
pub const CORE_HOST_LIB_MISSING_FAILURE: i32 = 0x8000_8083_u32 as i32;

/// `HostApiBufferTooSmall`: the caller's buffer cannot hold the result; the
/// required size has been written back through the size pointer.
pub const HOST_API_BUFFER_TOO_SMALL: i32 = 0x8000_8098_u32 as i32;

/// An owned, nul-terminated string in the hosting libraries' `char_t`
/// encoding.
///
/// Interior nul bytes cannot cross the boundary; the string is truncated at
/// the first one, matching what the C side would see anyway.
#[derive(Debug)]
pub struct HostString {
    #[cfg(windows)]
    inner: widestring::U16CString,
    #[cfg(not(windows))]
    inner: std::ffi::CString,
}

impl HostString {
    /// Convert a Rust string for handing to hostfxr.
    #[cfg(windows)]
    pub fn new(s: impl AsRef<str>) -> HostString {
        HostString {
            inner: widestring::U16CString::from_str_truncate(s.as_ref()),
        }
    }

    /// Convert a Rust string for handing to hostfxr.
    #[cfg(not(windows))]
    pub fn new(s: impl AsRef<str>) -> HostString {
        let bytes = s.as_ref().as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        // No interior nul left after truncation, construction cannot fail.
        let inner = std::ffi::CString::new(&bytes[..end])
            .unwrap_or_else(|_| std::ffi::CString::default());
        HostString { inner }
    }

    /// Convert a path, going through lossy UTF-8 on non-Windows platforms.
    pub fn from_path(path: &std::path::Path) -> HostString {
        HostString::new(path.to_string_lossy())
    }

    /// Pointer suitable for a `const char_t *` parameter. Valid as long as
    /// `self` is alive.
    pub fn as_ptr(&self) -> *const HostChar {
        self.inner.as_ptr()
    }
}

/// Decode a nul-terminated `char_t` string returned through an out-pointer.
///
/// # Safety
/// `ptr` must be non-null and point to a valid, nul-terminated `char_t`
/// string that stays alive for the duration of the call.
pub unsafe fn decode_host_ptr(ptr: *const HostChar) -> String {
    let mut len = 0_usize;
    while *ptr.add(len) != 0 {
        len += 1;
    }
    let mut buffer = Vec::with_capacity(len + 1);
    buffer.extend_from_slice(std::slice::from_raw_parts(ptr, len));
    buffer.push(0);
    decode_host_buffer(&buffer)
}

/// Decode a `char_t` buffer written by a hosting API, stopping at the first
/// nul terminator.
pub fn decode_host_buffer(buffer: &[HostChar]) -> String {
    let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());

    #[cfg(windows)]
    {
        String::from_utf16_lossy(&buffer[..end])
    }

    #[cfg(not(windows))]
    {
        let bytes: Vec<u8> = buffer[..end].iter().map(|&c| c as u8).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_string_round_trip() {
        let s = HostString::new("HostPlugins.Main, HostPlugins");
        assert!(!s.as_ptr().is_null());

        let mut buffer = Vec::new();
        let mut p = s.as_ptr();
        unsafe {
            while *p != 0 {
                buffer.push(*p);
                p = p.add(1);
            }
        }
        buffer.push(0);
        assert_eq!(decode_host_buffer(&buffer), "HostPlugins.Main, HostPlugins");
    }

    #[test]
    fn host_string_truncates_at_interior_nul() {
        let s = HostString::new("abc\0def");
        assert_eq!(unsafe { *s.as_ptr().add(3) }, 0);
    }

    #[test]
    fn decode_stops_at_nul() {
        let buffer: Vec<HostChar> = "path\0garbage"
            .bytes()
            .map(|b| b as HostChar)
            .collect();
        assert_eq!(decode_host_buffer(&buffer), "path");
    }

    #[test]
    fn unmanaged_callers_only_marker_is_minus_one() {
        assert_eq!(UNMANAGED_CALLERS_ONLY_METHOD as isize, -1);
    }
}
