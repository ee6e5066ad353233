//! Configuration for a packing run.

use crate::Error;
use crate::Result;
use crate::backup::ReplacePolicy;
use crate::build::assemble_task;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Build variant used when none is configured.
pub const DEFAULT_VARIANT: &str = "debug";

/// Nested archive filtered by the exclusion list.
pub const DEFAULT_NESTED_ARCHIVE: &str = "classes.jar";

/// Name of the rendered manifest in every target.
pub const MANIFEST_FILE_NAME: &str = "AndroidManifest.xml";

/// Name of the library marker written into the plugin directory.
pub const PROPERTIES_FILE_NAME: &str = "project.properties";

/// Plugin directory of a Unity project, relative to its root.
pub const UNITY_PLUGIN_DIR: &str = "Assets/Plugins/Android";

/// Everything a packing run needs, built once and passed by reference.
///
/// Nothing is checked on construction; [`validate`](Self::validate) runs
/// before the pipeline touches the filesystem.
///
/// # Examples
///
/// ```
/// use upack_core::PackConfig;
///
/// let config = PackConfig::new("/work/android", "mymodule", "com.example.MainActivity")
///     .with_target("/work/unity/Assets/Plugins/Android")
///     .with_permissions(vec!["android.permission.INTERNET".into()])
///     .with_exclusions(vec!["com/example".into()])
///     .with_backup_extension(Some(".bak".into()));
///
/// assert_eq!(config.gradle_task(), "assembleDebug");
/// assert_eq!(
///     config.artifact_path(),
///     std::path::Path::new("/work/android/mymodule/build/outputs/aar/mymodule-debug.aar")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackConfig {
    project_root: PathBuf,
    module_name: String,
    targets: Vec<PathBuf>,
    unity_projects: Vec<PathBuf>,
    entry_activity: String,
    permissions: Vec<String>,
    exclusions: Vec<String>,
    manifest_template: Option<PathBuf>,
    backup_extension: Option<String>,
    variant: String,
    nested_archive: String,
}

impl PackConfig {
    /// Creates a configuration with no targets and default options.
    #[must_use]
    pub fn new(
        project_root: impl Into<PathBuf>,
        module_name: impl Into<String>,
        entry_activity: impl Into<String>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            module_name: module_name.into(),
            targets: Vec::new(),
            unity_projects: Vec::new(),
            entry_activity: entry_activity.into(),
            permissions: Vec::new(),
            exclusions: Vec::new(),
            manifest_template: None,
            backup_extension: None,
            variant: DEFAULT_VARIANT.to_string(),
            nested_archive: DEFAULT_NESTED_ARCHIVE.to_string(),
        }
    }

    /// Replaces the target directories.
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<PathBuf>) -> Self {
        self.targets = targets;
        self
    }

    /// Appends one target directory.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Appends `<root>/Assets/Plugins/Android` as a target.
    ///
    /// Unlike a plain target, the Unity project root itself must already
    /// exist when the configuration is validated.
    #[must_use]
    pub fn with_unity_project(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.targets.push(root.join(UNITY_PLUGIN_DIR));
        self.unity_projects.push(root);
        self
    }

    /// Sets the permissions, rendered in this order.
    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Sets the exclusion substrings for the nested archive.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Sets a manifest template file instead of the built-in one.
    #[must_use]
    pub fn with_manifest_template(mut self, template: Option<PathBuf>) -> Self {
        self.manifest_template = template;
        self
    }

    /// Sets the backup extension. `None` or `""` deletes displaced content.
    #[must_use]
    pub fn with_backup_extension(mut self, extension: Option<String>) -> Self {
        self.backup_extension = extension.filter(|ext| !ext.is_empty());
        self
    }

    /// Sets the build variant.
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    /// Sets the name of the nested archive inside the module archive.
    #[must_use]
    pub fn with_nested_archive(mut self, name: impl Into<String>) -> Self {
        self.nested_archive = name.into();
        self
    }

    /// Android project root.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Module name.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Target directories in processing order.
    #[must_use]
    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    /// Unity project roots whose plugin directories are targets.
    #[must_use]
    pub fn unity_projects(&self) -> &[PathBuf] {
        &self.unity_projects
    }

    /// Launcher activity written into the manifest.
    #[must_use]
    pub fn entry_activity(&self) -> &str {
        &self.entry_activity
    }

    /// Permissions in rendering order.
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Exclusion substrings.
    #[must_use]
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// Returns `true` if the nested archive should be filtered.
    #[must_use]
    pub fn has_exclusions(&self) -> bool {
        self.exclusions.iter().any(|exclusion| !exclusion.is_empty())
    }

    /// Manifest template file, if one is configured.
    #[must_use]
    pub fn manifest_template(&self) -> Option<&Path> {
        self.manifest_template.as_deref()
    }

    /// Backup extension, if one is configured.
    #[must_use]
    pub fn backup_extension(&self) -> Option<&str> {
        self.backup_extension.as_deref()
    }

    /// Build variant.
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Nested archive name.
    #[must_use]
    pub fn nested_archive(&self) -> &str {
        &self.nested_archive
    }

    /// `<project>/<module>`.
    #[must_use]
    pub fn module_dir(&self) -> PathBuf {
        self.project_root.join(&self.module_name)
    }

    /// `<project>/<module>/build/outputs/aar/<module>-<variant>.aar`.
    #[must_use]
    pub fn artifact_path(&self) -> PathBuf {
        self.module_dir()
            .join("build")
            .join("outputs")
            .join("aar")
            .join(format!("{}-{}.aar", self.module_name, self.variant))
    }

    /// `<target>/<module>`.
    #[must_use]
    pub fn plugin_dir(&self, target: &Path) -> PathBuf {
        target.join(&self.module_name)
    }

    /// `<target>/AndroidManifest.xml`.
    #[must_use]
    pub fn manifest_path(&self, target: &Path) -> PathBuf {
        target.join(MANIFEST_FILE_NAME)
    }

    /// `<target>/<module>/project.properties`.
    #[must_use]
    pub fn properties_path(&self, target: &Path) -> PathBuf {
        self.plugin_dir(target).join(PROPERTIES_FILE_NAME)
    }

    /// Gradle task that produces the artifact.
    #[must_use]
    pub fn gradle_task(&self) -> String {
        assemble_task(&self.variant)
    }

    /// Policy applied to every destination path.
    #[must_use]
    pub fn replace_policy(&self) -> ReplacePolicy {
        ReplacePolicy::new(self.backup_extension.clone())
    }

    /// Checks the configuration before anything is built or written.
    ///
    /// # Errors
    ///
    /// - [`Error::NoTargets`] if no target is configured
    /// - [`Error::InvalidModuleName`] unless the module name is a single
    ///   normal path component
    /// - [`Error::InvalidNestedArchiveName`] likewise for the nested archive
    /// - [`Error::RelativePath`] for any relative path field
    /// - [`Error::PathNotFound`] / [`Error::NotADirectory`] if the project,
    ///   module or a Unity project directory is missing, or a target exists
    ///   but is not a directory
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(Error::NoTargets);
        }

        if !is_single_component(&self.module_name) {
            return Err(Error::InvalidModuleName {
                name: self.module_name.clone(),
            });
        }
        if !is_single_component(&self.nested_archive) {
            return Err(Error::InvalidNestedArchiveName {
                name: self.nested_archive.clone(),
            });
        }

        require_absolute(&self.project_root)?;
        for path in self.targets.iter().chain(&self.unity_projects) {
            require_absolute(path)?;
        }
        if let Some(template) = &self.manifest_template {
            require_absolute(template)?;
        }

        require_dir("android project", &self.project_root)?;
        require_dir("android module", &self.module_dir())?;
        for root in &self.unity_projects {
            require_dir("unity project", root)?;
        }

        for target in &self.targets {
            if target.exists() && !target.is_dir() {
                return Err(Error::NotADirectory {
                    what: "output directory",
                    path: target.clone(),
                });
            }
        }

        Ok(())
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

fn require_absolute(path: &Path) -> Result<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(Error::RelativePath {
            path: path.to_path_buf(),
        })
    }
}

fn require_dir(what: &'static str, path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|source| Error::PathNotFound {
        what,
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(Error::NotADirectory {
            what,
            path: path.to_path_buf(),
        })
    }
}
