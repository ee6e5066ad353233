//! CLI argument parsing using clap.

use clap::ArgAction;
use clap::Parser;
use std::path::Path;
use std::path::PathBuf;
use upack_core::PackConfig;

#[derive(Parser, Debug)]
#[command(name = "upack")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Every option can also be set through its UPACK_* environment variable.")]
pub struct Cli {
    /// Android library module to build and pack
    #[arg(short = 'm', long, env = "UPACK_ANDROID_MODULE_NAME", value_name = "NAME")]
    pub android_module_name: String,

    /// Root of the Android project
    #[arg(short = 'a', long, env = "UPACK_ANDROID_PROJECT_PATH", value_name = "DIR")]
    pub android_path: PathBuf,

    /// Fully qualified launcher activity for the manifest
    #[arg(short = 'e', long, env = "UPACK_ENTRY_ACTIVITY", value_name = "CLASS")]
    pub entry_activity: String,

    /// Permission to declare in the manifest (repeatable or comma separated)
    #[arg(
        short = 'p',
        long = "android-permissions",
        env = "UPACK_ANDROID_PERMISSIONS",
        value_name = "PERMISSION",
        value_delimiter = ','
    )]
    pub permissions: Vec<String>,

    /// Drop nested classes whose path contains SUBSTRING (repeatable or comma separated)
    #[arg(
        short = 'x',
        long = "exclude",
        env = "UPACK_EXCLUDE",
        value_name = "SUBSTRING",
        value_delimiter = ','
    )]
    pub exclude: Vec<String>,

    /// Handlebars manifest template instead of the built-in one
    #[arg(short = 'T', long, env = "UPACK_MANIFEST_TEMPLATE", value_name = "FILE")]
    pub manifest_template: Option<PathBuf>,

    /// Rename replaced content to <path><EXT> instead of deleting it
    #[arg(short = 'B', long, env = "UPACK_BACKUP_EXTENSION", value_name = "EXT")]
    pub backup_extension: Option<String>,

    /// Existing Unity project to install into (repeatable)
    #[arg(short = 'u', long = "unity-path", env = "UPACK_UNITY_PROJECT_PATH", value_name = "DIR")]
    pub unity_paths: Vec<PathBuf>,

    /// Output directories (default: current directory when no Unity project is given)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dirs: Vec<PathBuf>,

    /// Build variant to assemble
    #[arg(long, env = "UPACK_VARIANT", default_value = upack_core::config::DEFAULT_VARIANT)]
    pub variant: String,

    /// Build program to run instead of the project's gradlew
    #[arg(long, env = "UPACK_GRADLE", value_name = "PROGRAM", conflicts_with = "skip_build")]
    pub gradle: Option<PathBuf>,

    /// Use the existing build output without running the build
    #[arg(long)]
    pub skip_build: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Builds the pack configuration, resolving relative paths against `cwd`.
    pub fn to_config(&self, cwd: &Path) -> PackConfig {
        let mut targets: Vec<PathBuf> = self.output_dirs.iter().map(|dir| cwd.join(dir)).collect();
        if targets.is_empty() && self.unity_paths.is_empty() {
            targets.push(cwd.to_path_buf());
        }

        let config = PackConfig::new(
            cwd.join(&self.android_path),
            &self.android_module_name,
            &self.entry_activity,
        )
        .with_targets(targets);
        self.unity_paths
            .iter()
            .fold(config, |config, unity| config.with_unity_project(cwd.join(unity)))
            .with_permissions(self.permissions.clone())
            .with_exclusions(self.exclude.clone())
            .with_manifest_template(self.manifest_template.as_ref().map(|t| cwd.join(t)))
            .with_backup_extension(self.backup_extension.clone())
            .with_variant(&self.variant)
    }
}
