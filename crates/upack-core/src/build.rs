//! External build step.
//!
//! The pipeline only needs the build to leave an archive at the configured
//! artifact path; how that happens is behind [`BuildStep`].

use crate::Error;
use crate::Result;
use std::ffi::OsString;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::process::Command;
use std::process::Stdio;
use tracing::debug;
use tracing::warn;

/// Produces the module archive for a project.
pub trait BuildStep {
    /// Runs `task` in `project_root`, blocking until it finishes.
    ///
    /// # Errors
    ///
    /// Returns a build error if the step cannot run or fails.
    fn build(&self, project_root: &Path, task: &str) -> Result<()>;
}

impl<T: BuildStep + ?Sized> BuildStep for &T {
    fn build(&self, project_root: &Path, task: &str) -> Result<()> {
        (**self).build(project_root, task)
    }
}

impl<T: BuildStep + ?Sized> BuildStep for Box<T> {
    fn build(&self, project_root: &Path, task: &str) -> Result<()> {
        (**self).build(project_root, task)
    }
}

/// Runs the Gradle wrapper.
///
/// Output is forwarded line by line as it is produced: stdout at `debug`
/// level, stderr at `warn` level. Only the exit status is interpreted.
#[derive(Debug, Clone, Default)]
pub struct GradleBuild {
    program: Option<OsString>,
}

impl GradleBuild {
    /// Uses `<project>/gradlew` when present, otherwise `gradlew` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `program` instead of the wrapper.
    #[must_use]
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    /// Resolves the program to run for `project_root`.
    #[must_use]
    pub fn program_for(&self, project_root: &Path) -> OsString {
        if let Some(program) = &self.program {
            return program.clone();
        }

        let wrapper = project_root.join(WRAPPER_NAME);
        if wrapper.is_file() {
            wrapper.into_os_string()
        } else {
            OsString::from(WRAPPER_NAME)
        }
    }
}

#[cfg(windows)]
const WRAPPER_NAME: &str = "gradlew.bat";
#[cfg(not(windows))]
const WRAPPER_NAME: &str = "gradlew";

impl BuildStep for GradleBuild {
    fn build(&self, project_root: &Path, task: &str) -> Result<()> {
        let program = self.program_for(project_root);
        let command_line = format!("{} {task}", Path::new(&program).display());
        debug!(command = %command_line, cwd = %project_root.display(), "starting build");

        let mut child = Command::new(&program)
            .arg(task)
            .current_dir(project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::BuildSpawnFailed {
                command: command_line.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        std::thread::scope(|scope| {
            if let Some(stderr) = stderr {
                scope.spawn(move || forward_lines(stderr, |line| warn!(target: "upack::build", "{line}")));
            }
            if let Some(stdout) = stdout {
                forward_lines(stdout, |line| debug!(target: "upack::build", "{line}"));
            }
        });

        let status = child.wait().map_err(|source| Error::BuildSpawnFailed {
            command: command_line.clone(),
            source,
        })?;

        if status.success() {
            debug!(command = %command_line, "build finished");
            Ok(())
        } else {
            Err(Error::BuildFailed {
                command: command_line,
                code: status.code(),
            })
        }
    }
}

/// Reads `reader` to the end, handing each line to `sink`.
///
/// Invalid UTF-8 is replaced rather than aborting the stream; a read error
/// ends forwarding, and the exit status decides the outcome.
fn forward_lines<R: Read>(reader: R, mut sink: impl FnMut(&str)) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                sink(line.trim_end_matches(['\r', '\n']));
            }
        }
    }
}

/// Skips the build and uses whatever archive is already on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrebuiltArtifact;

impl BuildStep for PrebuiltArtifact {
    fn build(&self, project_root: &Path, task: &str) -> Result<()> {
        debug!(project = %project_root.display(), task, "build skipped, using existing artifact");
        Ok(())
    }
}

/// Returns the Gradle task that assembles `variant` (`debug` → `assembleDebug`).
#[must_use]
pub fn assemble_task(variant: &str) -> String {
    let mut chars = variant.chars();
    chars.next().map_or_else(
        || "assemble".to_string(),
        |first| format!("assemble{}{}", first.to_uppercase(), chars.as_str()),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_assemble_task() {
        assert_eq!(assemble_task("debug"), "assembleDebug");
        assert_eq!(assemble_task("release"), "assembleRelease");
        assert_eq!(assemble_task("stagingDebug"), "assembleStagingDebug");
        assert_eq!(assemble_task(""), "assemble");
    }

    #[test]
    fn test_forward_lines_splits_and_trims() {
        let mut lines = Vec::new();
        forward_lines(Cursor::new(b"one\r\ntwo\nthree".to_vec()), |line| {
            lines.push(line.to_string());
        });
        assert_eq!(lines, ["one", "two", "three"]);
    }

    #[test]
    fn test_forward_lines_tolerates_invalid_utf8() {
        let mut lines = Vec::new();
        forward_lines(Cursor::new(b"ok\n\xff\xfe\n".to_vec()), |line| {
            lines.push(line.to_string());
        });
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "ok");
    }

    #[test]
    fn test_program_prefers_project_wrapper() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            GradleBuild::new().program_for(temp.path()),
            OsString::from(WRAPPER_NAME)
        );

        std::fs::write(temp.path().join(WRAPPER_NAME), "").unwrap();
        assert_eq!(
            GradleBuild::new().program_for(temp.path()),
            temp.path().join(WRAPPER_NAME).into_os_string()
        );

        assert_eq!(
            GradleBuild::with_program("/opt/gradle/bin/gradle").program_for(temp.path()),
            OsString::from("/opt/gradle/bin/gradle")
        );
    }

    #[test]
    fn test_spawn_failure() {
        let temp = TempDir::new().unwrap();
        let err = GradleBuild::with_program(temp.path().join("does-not-exist"))
            .build(temp.path(), "assembleDebug")
            .unwrap_err();
        assert!(matches!(err, Error::BuildSpawnFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_is_checked() {
        let temp = TempDir::new().unwrap();

        GradleBuild::with_program("true")
            .build(temp.path(), "assembleDebug")
            .unwrap();

        let err = GradleBuild::with_program("false")
            .build(temp.path(), "assembleDebug")
            .unwrap_err();
        assert!(matches!(err, Error::BuildFailed { code: Some(1), .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_project_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join(WRAPPER_NAME);
        std::fs::write(
            &script,
            "#!/bin/sh\necho building \"$1\"\necho warning >&2\ntouch \"built-$1\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        GradleBuild::new().build(temp.path(), "assembleDebug").unwrap();

        assert!(temp.path().join("built-assembleDebug").exists());
    }

    #[test]
    fn test_prebuilt_does_nothing() {
        let temp = TempDir::new().unwrap();
        PrebuiltArtifact.build(temp.path(), "assembleDebug").unwrap();
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
