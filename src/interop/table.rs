//! The native function table exposed to managed code.
//!
//! The table is an opaque, ordered array of function pointers; the managed
//! side indexes into it by the pre-agreed ordering tied to
//! [`INTEROP_ABI_VERSION`]. It is built once at process start and never
//! mutated afterwards. A count mismatch between the two sides is an ABI
//! fault, which the managed entry point reports by failing the whole
//! handshake; it must never index into a table with a different layout.

use std::ffi::c_void;

/// Version of the interop table ordering. Bumped whenever a slot is added,
/// removed or reordered; the managed side is compiled against a specific
/// version and rejects any other.
pub const INTEROP_ABI_VERSION: u32 = 3;

/// Ordered, immutable array of native function pointers plus its count.
///
/// Corruption or mis-sizing of this table is a fatal ABI violation detected
/// during the handshake, not a recoverable error.
pub struct InteropFunctionTable {
    functions: Vec<*const c_void>,
}

impl InteropFunctionTable {
    /// Start building a table. Registration order is the ABI ordering.
    #[must_use]
    pub fn builder() -> InteropFunctionTableBuilder {
        InteropFunctionTableBuilder {
            functions: Vec::new(),
        }
    }

    /// Pointer to the first slot, for the handshake call.
    pub fn as_ptr(&self) -> *const *const c_void {
        self.functions.as_ptr()
    }

    /// Number of slots, in the `i32` shape the ABI uses.
    pub fn count(&self) -> i32 {
        self.functions.len() as i32
    }

    /// Whether any functions were registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Builder for [`InteropFunctionTable`]; slots are appended in registration
/// order.
pub struct InteropFunctionTableBuilder {
    functions: Vec<*const c_void>,
}

impl InteropFunctionTableBuilder {
    /// Append a function pointer as the next slot.
    #[must_use]
    pub fn with_function(mut self, function: *const c_void) -> Self {
        self.functions.push(function);
        self
    }

    /// Finish the table. After this point the ordering is frozen.
    #[must_use]
    pub fn build(self) -> InteropFunctionTable {
        InteropFunctionTable {
            functions: self.functions,
        }
    }
}
