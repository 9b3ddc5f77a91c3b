//! Host configuration supplied by the embedding application.
//!
//! The embedder owns its own settings system; this module is the narrow,
//! string-and-path shaped view of it that the bootstrap consumes. A
//! [`HostConfig`] is built once, before [`crate::RuntimeHostManager::new`], and
//! is immutable afterwards. Nothing here touches the filesystem; probing
//! happens in [`crate::hostfxr::locator`] and [`crate::loader`].

use std::path::{Path, PathBuf};

/// Whether this process is the development tooling (editor) or a shipped build.
///
/// The build mode is one of the two inputs to hosting-strategy selection (the
/// other being filesystem probe results, see
/// [`crate::hostfxr::HostingStrategy::select`]). It is a runtime value rather
/// than a compile-time switch so that a single binary of the embedder can be
/// exercised in both configurations under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Editor / development tooling: the runtime is discovered from the
    /// machine's installed .NET SDK and initialized from a runtimeconfig
    /// descriptor.
    Tooling,
    /// Shipped build: the runtime is bundled alongside the application and
    /// initialized in self-contained command-line mode.
    Deployed,
}

/// Configuration for the runtime host, filled in from the embedder's settings.
///
/// # Examples
///
/// ```rust
/// use clrhost::{BuildMode, HostConfig};
///
/// let config = HostConfig::new(BuildMode::Tooling, "/opt/app/data/api_assemblies")
///     .with_temp_assemblies_dir("/opt/app/.build/temp")
///     .with_project_name("My Game!");
/// assert_eq!(config.assembly_name(), "My_Game_");
/// ```
#[derive(Debug, Clone)]
pub struct HostConfig {
    build_mode: BuildMode,
    api_assemblies_dir: PathBuf,
    temp_assemblies_dir: Option<PathBuf>,
    assembly_name: Option<String>,
    project_name: String,
    editor_hint: bool,
    project_manager_hint: bool,
    command_line_args: Vec<String>,
}

impl HostConfig {
    /// Create a configuration for the given build mode and API assemblies
    /// directory (the bundled directory holding the plugin assembly, and in
    /// deployed builds the hosting library itself).
    pub fn new(build_mode: BuildMode, api_assemblies_dir: impl AsRef<Path>) -> Self {
        HostConfig {
            build_mode,
            api_assemblies_dir: api_assemblies_dir.as_ref().to_path_buf(),
            temp_assemblies_dir: None,
            assembly_name: None,
            project_name: String::new(),
            editor_hint: false,
            project_manager_hint: false,
            command_line_args: Vec::new(),
        }
    }

    /// Set the temporary build-output directory where the project's compiled
    /// assembly is expected (tooling builds only).
    #[must_use]
    pub fn with_temp_assemblies_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.temp_assemblies_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the configured assembly name of the project's managed code.
    ///
    /// When unset, [`HostConfig::assembly_name`] falls back to a sanitized
    /// project name.
    #[must_use]
    pub fn with_assembly_name(mut self, name: impl Into<String>) -> Self {
        self.assembly_name = Some(name.into());
        self
    }

    /// Set the human-readable project name, used as the assembly-name fallback.
    #[must_use]
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    /// Mark this process as running with an editor context. Forwarded to the
    /// managed entry point during the handshake in tooling builds.
    #[must_use]
    pub fn with_editor_hint(mut self, editor_hint: bool) -> Self {
        self.editor_hint = editor_hint;
        self
    }

    /// Mark this process as running the project manager (the project picker
    /// that runs before any project is open). No project assembly exists to
    /// load in that window, so the startup load attempt is skipped.
    #[must_use]
    pub fn with_project_manager_hint(mut self, project_manager_hint: bool) -> Self {
        self.project_manager_hint = project_manager_hint;
        self
    }

    /// Provide the process's original command-line arguments (program name
    /// excluded, order preserved). Deployed builds forward these to the
    /// hosting context after the main assembly path.
    #[must_use]
    pub fn with_command_line_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_line_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The build mode this process runs in.
    pub fn build_mode(&self) -> BuildMode {
        self.build_mode
    }

    /// Directory holding the plugin assembly and bundled native assemblies.
    pub fn api_assemblies_dir(&self) -> &Path {
        &self.api_assemblies_dir
    }

    /// Temporary build-output directory, if the embedder configured one.
    pub fn temp_assemblies_dir(&self) -> Option<&Path> {
        self.temp_assemblies_dir.as_deref()
    }

    /// Whether the process runs with an editor context.
    pub fn editor_hint(&self) -> bool {
        self.editor_hint
    }

    /// Whether the process is the project manager, with no project open.
    pub fn project_manager_hint(&self) -> bool {
        self.project_manager_hint
    }

    /// Original command-line arguments, program name excluded.
    pub fn command_line_args(&self) -> &[String] {
        &self.command_line_args
    }

    /// The name of the project's managed assembly.
    ///
    /// Uses the configured assembly name when present, otherwise derives a
    /// safe name from the project name: characters that are not ASCII
    /// alphanumerics, `_` or `.` are replaced with `_`, and an empty result
    /// falls back to `"UnnamedProject"`.
    pub fn assembly_name(&self) -> String {
        if let Some(name) = &self.assembly_name {
            if !name.is_empty() {
                return name.clone();
            }
        }

        safe_assembly_name(&self.project_name)
    }

    /// Whether the managed side should run with debug support. Derived from
    /// the build configuration, not from the build mode.
    pub fn debug_enabled(&self) -> bool {
        cfg!(debug_assertions)
    }
}

/// Sanitize a project name into something usable as an assembly name.
fn safe_assembly_name(project_name: &str) -> String {
    let safe: String = project_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if safe.is_empty() {
        "UnnamedProject".to_string()
    } else {
        safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_name_prefers_configured_value() {
        let config = HostConfig::new(BuildMode::Deployed, "/tmp")
            .with_assembly_name("MyGame")
            .with_project_name("Something Else");
        assert_eq!(config.assembly_name(), "MyGame");
    }

    #[test]
    fn assembly_name_empty_setting_falls_back_to_project_name() {
        let config = HostConfig::new(BuildMode::Deployed, "/tmp")
            .with_assembly_name("")
            .with_project_name("My Game");
        assert_eq!(config.assembly_name(), "My_Game");
    }

    #[test]
    fn safe_name_replaces_invalid_characters() {
        assert_eq!(safe_assembly_name("My Game!"), "My_Game_");
        assert_eq!(safe_assembly_name("space invaders 2"), "space_invaders_2");
        assert_eq!(safe_assembly_name("dots.are.fine_1"), "dots.are.fine_1");
    }

    #[test]
    fn safe_name_empty_falls_back() {
        assert_eq!(safe_assembly_name(""), "UnnamedProject");
    }

    #[test]
    fn hints_default_to_off() {
        let config = HostConfig::new(BuildMode::Tooling, "/tmp");
        assert!(!config.editor_hint());
        assert!(!config.project_manager_hint());

        let config = config.with_editor_hint(true).with_project_manager_hint(true);
        assert!(config.editor_hint());
        assert!(config.project_manager_hint());
    }

    #[test]
    fn command_line_args_preserve_order() {
        let config = HostConfig::new(BuildMode::Deployed, "/tmp")
            .with_command_line_args(["--fullscreen", "--level", "3"]);
        assert_eq!(
            config.command_line_args(),
            &["--fullscreen", "--level", "3"]
        );
    }
}
