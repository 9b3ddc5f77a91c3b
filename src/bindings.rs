//! Minimal surface exposed to a scripting/object binding layer.
//!
//! The embedder's script system needs exactly two things from this subsystem:
//! a way to ask whether the runtime is up, and a deferred entry point to
//! request an assembly reload. [`ScriptBindings`] is that pass-through; it
//! holds no runtime state of its own.

use crate::RuntimeHostManager;

/// Pass-through wrapper registered with the embedder's scripting layer.
pub struct ScriptBindings {
    #[cfg(feature = "hot-reload")]
    reload_hook: Option<Box<dyn FnMut(bool)>>,
}

impl ScriptBindings {
    /// Create the wrapper with no reload hook installed.
    pub fn new() -> ScriptBindings {
        ScriptBindings {
            #[cfg(feature = "hot-reload")]
            reload_hook: None,
        }
    }

    /// Install the hook that performs the actual reload.
    ///
    /// `reload_assemblies` may be delivered more than once for one edit (it
    /// is typically dispatched deferred), so the hook should re-check whether
    /// a reload is still needed before doing work.
    #[cfg(feature = "hot-reload")]
    pub fn set_reload_hook(&mut self, hook: impl FnMut(bool) + 'static) {
        self.reload_hook = Some(Box::new(hook));
    }

    /// Whether the managed runtime is initialized and usable. `None` for the
    /// manager means the subsystem was never constructed.
    pub fn is_runtime_initialized(&self, manager: Option<&RuntimeHostManager>) -> bool {
        manager.is_some_and(RuntimeHostManager::is_runtime_initialized)
    }

    /// Deferred reload request from the scripting layer. `soft` asks for
    /// script state to be preserved across the reload. A no-op when no hook
    /// is installed or the reload mechanism is compiled out.
    pub fn reload_assemblies(&mut self, soft: bool) {
        #[cfg(feature = "hot-reload")]
        if let Some(hook) = self.reload_hook.as_mut() {
            hook(soft);
        }
        #[cfg(not(feature = "hot-reload"))]
        let _ = soft;
    }
}

impl Default for ScriptBindings {
    fn default() -> Self {
        ScriptBindings::new()
    }
}
