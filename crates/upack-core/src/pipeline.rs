//! The packing pipeline.
//!
//! One run validates the configuration, renders the manifest, runs the build
//! step and then installs the resulting module archive into every target:
//!
//! ```text
//! <target>/
//! ├── AndroidManifest.xml
//! └── <module>/
//!     ├── project.properties      android.library=true
//!     ├── classes.jar             filtered when exclusions are set
//!     └── ...                     rest of the module archive
//! ```
//!
//! Targets are processed in order. The first error stops the run; targets
//! already processed keep their new content and nothing is rolled back.

use crate::Error;
use crate::PackConfig;
use crate::Result;
use crate::RunReport;
use crate::TargetReport;
use crate::backup::ReplacePolicy;
use crate::build::BuildStep;
use crate::extraction::extract_archive;
use crate::filter::filter_nested_archive;
use crate::manifest::ManifestModel;
use crate::manifest::ManifestRenderer;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing::warn;

/// Contents of the library marker file.
pub const PROPERTIES_CONTENTS: &[u8] = b"android.library=true\n";

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Checking configuration and rendering the manifest.
    Validating,
    /// Running the build step.
    Building,
    /// Installing into one target.
    Packing {
        /// The target being written.
        target: PathBuf,
    },
    /// Every target was written.
    Done,
    /// The run stopped on an error.
    Failed(String),
}

/// Drives one packing run.
///
/// # Examples
///
/// ```no_run
/// use upack_core::GradleBuild;
/// use upack_core::PackConfig;
/// use upack_core::Pipeline;
///
/// let config = PackConfig::new("/work/android", "mymodule", "com.example.MainActivity")
///     .with_target("/work/unity/Assets/Plugins/Android");
///
/// let mut pipeline = Pipeline::new(&config, GradleBuild::new());
/// let report = pipeline.run()?;
/// println!("packed {} into {} targets", report.module, report.targets.len());
/// # Ok::<(), upack_core::Error>(())
/// ```
#[derive(Debug)]
pub struct Pipeline<'a, B> {
    config: &'a PackConfig,
    build: B,
    stage: Stage,
}

impl<'a, B: BuildStep> Pipeline<'a, B> {
    /// Creates a pipeline in the [`Stage::Validating`] stage.
    #[must_use]
    pub const fn new(config: &'a PackConfig, build: B) -> Self {
        Self {
            config,
            build,
            stage: Stage::Validating,
        }
    }

    /// Returns the current stage.
    #[must_use]
    pub const fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Runs every stage to completion.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered. The stage is left at
    /// [`Stage::Failed`] with the error message.
    pub fn run(&mut self) -> Result<RunReport> {
        let result = self.run_stages();
        match &result {
            Ok(_) => self.stage = Stage::Done,
            Err(e) => self.stage = Stage::Failed(e.to_string()),
        }
        result
    }

    fn run_stages(&mut self) -> Result<RunReport> {
        let started = Instant::now();
        let config = self.config;

        self.stage = Stage::Validating;
        config.validate()?;
        let manifest = ManifestRenderer::load(config.manifest_template())?.render(&ManifestModel {
            entry_activity: config.entry_activity(),
            permissions: config.permissions(),
        })?;

        self.stage = Stage::Building;
        let task = config.gradle_task();
        info!(project = %config.project_root().display(), task = %task, "building module");
        self.build.build(config.project_root(), &task)?;

        let artifact = config.artifact_path();
        if !artifact.is_file() {
            return Err(Error::BuildArtifactMissing { path: artifact });
        }

        let policy = config.replace_policy();
        let mut targets = Vec::with_capacity(config.targets().len());
        for target in config.targets() {
            self.stage = Stage::Packing {
                target: target.clone(),
            };
            targets.push(pack_target(config, &policy, &artifact, target, &manifest)?);
        }

        Ok(RunReport {
            module: config.module_name().to_string(),
            artifact,
            targets,
            duration: started.elapsed(),
        })
    }
}

fn pack_target(
    config: &PackConfig,
    policy: &ReplacePolicy,
    artifact: &Path,
    target: &Path,
    manifest: &[u8],
) -> Result<TargetReport> {
    info!(target = %target.display(), "packing");
    std::fs::create_dir_all(target).map_err(|source| Error::CreateDirFailed {
        path: target.to_path_buf(),
        source,
    })?;

    let mut backups = Vec::new();
    let plugin_dir = config.plugin_dir(target);
    backups.extend(policy.replace_dir(&plugin_dir)?);

    let extract = extract_archive(artifact, &plugin_dir)?;

    let filter = if config.has_exclusions() {
        let jar = plugin_dir.join(config.nested_archive());
        if jar.is_file() {
            Some(filter_nested_archive(&jar, config.exclusions(), target)?)
        } else {
            warn!(jar = %jar.display(), "exclusions configured but no nested archive to filter");
            None
        }
    } else {
        None
    };

    backups.extend(policy.replace_file(&config.properties_path(target), PROPERTIES_CONTENTS)?);
    backups.extend(policy.replace_file(&config.manifest_path(target), manifest)?);

    Ok(TargetReport {
        target: target.to_path_buf(),
        plugin_dir,
        extract,
        filter,
        backups,
    })
}
