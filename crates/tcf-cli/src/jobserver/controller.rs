//! The three-way jobserver decision for `run`.
//!
//! * [`HandoffToken::Unset`]: write a handoff makefile and replace this
//!   process with make, which re-runs the command line under its jobserver.
//! * [`HandoffToken::Disabled`]: run directly.
//! * [`HandoffToken::Handoff`]: we are the re-executed process; run and
//!   remove the handoff file afterwards.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tcf_config::Config;
use tracing::{debug, info, warn};

use super::JOBSERVER_TARGET_LOG;
use super::error::HandoffError;
use super::handoff::{JOBSERVER_TARGET, Relaunch, remove_handoff_file, write_handoff_file};
use super::replace::ProcessReplacer;
use super::token::HandoffToken;

/// How the command should proceed once coordination is settled.
#[derive(Debug)]
pub enum Coordination {
    /// Run with whatever jobserver the environment already provides.
    Direct,
    /// Running under the make jobserver; dropping the lease removes the
    /// handoff file.
    Delegated(HandoffLease),
}

/// Owns an in-flight handoff file and removes it when dropped.
#[derive(Debug)]
pub struct HandoffLease {
    path: PathBuf,
}

impl HandoffLease {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the handoff file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for HandoffLease {
    fn drop(&mut self) {
        match remove_handoff_file(&self.path) {
            Ok(()) => debug!(
                target: JOBSERVER_TARGET_LOG,
                file = %self.path.display(),
                "handoff file removed"
            ),
            Err(error) => warn!(
                target: JOBSERVER_TARGET_LOG,
                file = %self.path.display(),
                %error,
                "failed to remove handoff file"
            ),
        }
    }
}

/// Decides and carries out jobserver delegation.
#[derive(Debug)]
pub struct JobserverController<R> {
    make_program: String,
    make_jobs: u32,
    handoff_dir: PathBuf,
    replacer: R,
}

impl<R: ProcessReplacer> JobserverController<R> {
    /// Builds a controller using the make settings from `config`, writing
    /// handoff files into `handoff_dir`.
    pub fn new(config: &Config, handoff_dir: PathBuf, replacer: R) -> Self {
        Self {
            make_program: config.make_program().to_owned(),
            make_jobs: config.make_jobs(),
            handoff_dir,
            replacer,
        }
    }

    /// Settles coordination for a `run` invocation.
    ///
    /// With an unset token this does not return on success: the process
    /// image is replaced by make. Any error is fatal to the invocation.
    pub fn coordinate(
        &mut self,
        token: &HandoffToken,
        relaunch: &Relaunch,
    ) -> Result<Coordination, HandoffError> {
        match token {
            HandoffToken::Unset => Err(self.delegate(relaunch)),
            HandoffToken::Disabled => {
                debug!(
                    target: JOBSERVER_TARGET_LOG,
                    inherited = inherited_jobserver(),
                    "jobserver delegation disabled"
                );
                Ok(Coordination::Direct)
            }
            HandoffToken::Handoff(path) => {
                debug!(
                    target: JOBSERVER_TARGET_LOG,
                    file = %path.display(),
                    inherited = inherited_jobserver(),
                    "running under make jobserver"
                );
                Ok(Coordination::Delegated(HandoffLease::new(path.clone())))
            }
        }
    }

    /// Arguments handed to make for `handoff`.
    #[must_use]
    pub fn make_arguments(&self, handoff: &Path) -> Vec<OsString> {
        vec![
            OsString::from("-s"),
            OsString::from("-f"),
            handoff.as_os_str().to_owned(),
            OsString::from(format!("-j{}", self.make_jobs)),
            OsString::from(JOBSERVER_TARGET),
        ]
    }

    fn delegate(&mut self, relaunch: &Relaunch) -> HandoffError {
        let path = match write_handoff_file(&self.handoff_dir, relaunch) {
            Ok(path) => path,
            Err(error) => return error,
        };
        let args = self.make_arguments(&path);
        info!(
            target: JOBSERVER_TARGET_LOG,
            program = %self.make_program,
            jobs = self.make_jobs,
            file = %path.display(),
            "re-executing under make jobserver"
        );

        let source = self
            .replacer
            .replace(OsStr::new(&self.make_program), &args);

        // Replacement failed, so no process will ever consume the file.
        if let Err(error) = remove_handoff_file(&path) {
            warn!(
                target: JOBSERVER_TARGET_LOG,
                file = %path.display(),
                %error,
                "failed to remove unused handoff file"
            );
        }
        HandoffError::Replace {
            program: self.make_program.clone(),
            source,
        }
    }
}

/// Whether make already advertises a jobserver in `MAKEFLAGS`.
fn inherited_jobserver() -> bool {
    env::var("MAKEFLAGS").is_ok_and(|flags| {
        flags.contains("--jobserver-auth=") || flags.contains("--jobserver-fds=")
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;

    use super::*;

    /// Records the replacement request and the handoff text at that moment.
    #[derive(Default)]
    struct RecordingReplacer {
        calls: Vec<(OsString, Vec<OsString>, String)>,
    }

    impl ProcessReplacer for RecordingReplacer {
        fn replace(&mut self, program: &OsStr, args: &[OsString]) -> io::Error {
            let contents = fs::read_to_string(&args[2]).unwrap_or_default();
            self.calls
                .push((program.to_owned(), args.to_vec(), contents));
            io::Error::new(io::ErrorKind::NotFound, "recorded")
        }
    }

    fn controller(dir: &Path) -> JobserverController<RecordingReplacer> {
        let config = Config {
            make_program: String::from("gmake"),
            make_jobs: 3,
            ..Config::default()
        };
        JobserverController::new(&config, dir.to_path_buf(), RecordingReplacer::default())
    }

    fn relaunch() -> Relaunch {
        Relaunch::new(
            OsString::from("tcf"),
            Vec::new(),
            vec![OsString::from("run"), OsString::from("true")],
        )
    }

    #[test]
    fn unset_token_replaces_process_with_make() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut controller = controller(temp.path());

        let error = controller
            .coordinate(&HandoffToken::Unset, &relaunch())
            .expect_err("replacement failure is reported");
        assert!(matches!(error, HandoffError::Replace { ref program, .. } if program == "gmake"));

        let (program, args, contents) = &controller.replacer.calls[0];
        assert_eq!(program, "gmake");
        assert_eq!(args[0], "-s");
        assert_eq!(args[1], "-f");
        assert_eq!(args[3], "-j3");
        assert_eq!(args[4], JOBSERVER_TARGET);
        let handoff = PathBuf::from(&args[2]);
        assert!(contents.contains(&format!(
            "'tcf' '--make-jobserver={}' 'run' 'true'",
            handoff.display()
        )));
        assert!(!handoff.exists(), "unused handoff file must be removed");
    }

    #[test]
    fn disabled_token_never_writes_or_replaces() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut controller = controller(temp.path());

        let coordination = controller
            .coordinate(&HandoffToken::Disabled, &relaunch())
            .expect("disabled proceeds directly");
        assert!(matches!(coordination, Coordination::Direct));
        assert!(controller.replacer.calls.is_empty());
        let entries = fs::read_dir(temp.path()).expect("read dir").count();
        assert_eq!(entries, 0, "no handoff file may be created");
    }

    #[test]
    fn handoff_lease_removes_file_when_dropped() {
        let temp = tempfile::tempdir().expect("temp dir");
        let handoff = temp.path().join("tcf-jobserver-test.mk");
        fs::write(&handoff, "tcf-jobserver-run:\n").expect("write handoff");
        let mut controller = controller(temp.path());

        let coordination = controller
            .coordinate(&HandoffToken::Handoff(handoff.clone()), &relaunch())
            .expect("handoff proceeds");
        let Coordination::Delegated(lease) = coordination else {
            panic!("expected a delegated lease");
        };
        assert_eq!(lease.path(), handoff.as_path());
        assert!(handoff.exists());
        drop(lease);
        assert!(!handoff.exists());
        assert!(controller.replacer.calls.is_empty());
    }

    #[test]
    fn dropping_a_lease_for_a_missing_file_is_harmless() {
        let temp = tempfile::tempdir().expect("temp dir");
        drop(HandoffLease::new(temp.path().join("already-gone.mk")));
    }

    #[test]
    fn unwritable_directory_fails_before_replacing() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut controller = controller(&temp.path().join("missing"));

        let error = controller
            .coordinate(&HandoffToken::Unset, &relaunch())
            .expect_err("missing directory is fatal");
        assert!(matches!(error, HandoffError::CreateHandoff { .. }));
        assert!(controller.replacer.calls.is_empty());
    }
}
