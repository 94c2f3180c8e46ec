//! Test support utilities for `tcf` behavioural coverage.
//!
//! Supplies a world that owns a throwaway state directory, seeds broker
//! cookies and cached target inventories, records process replacement
//! instead of performing it and captures CLI output.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use serde_json::{Map, Value};
use tcf_config::{Config, ServerSpec};
use tempfile::TempDir;

use crate::jobserver::ProcessReplacer;
use crate::{AppError, ConfigLoader, IoStreams, run_with_replacer};

pub(crate) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(crate) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// One recorded request to replace the process.
#[derive(Debug, Clone)]
pub(crate) struct Replacement {
    pub program: OsString,
    pub args: Vec<OsString>,
    /// Handoff file contents at the moment of replacement.
    pub handoff: String,
}

impl Replacement {
    pub(crate) fn handoff_path(&self) -> PathBuf {
        PathBuf::from(&self.args[2])
    }
}

/// Records replacement requests and fails them, as a missing make would.
#[derive(Debug, Default)]
pub(crate) struct RecordingReplacer {
    pub calls: Vec<Replacement>,
}

impl ProcessReplacer for RecordingReplacer {
    fn replace(&mut self, program: &OsStr, args: &[OsString]) -> io::Error {
        let handoff = args
            .get(2)
            .and_then(|path| fs::read_to_string(path).ok())
            .unwrap_or_default();
        self.calls.push(Replacement {
            program: program.to_owned(),
            args: args.to_vec(),
            handoff,
        });
        io::Error::new(io::ErrorKind::NotFound, "replacement recorded")
    }
}

pub(crate) struct TestWorld {
    pub temp: TempDir,
    pub config: Config,
    pub replacer: RecordingReplacer,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
    pub handoff: Option<PathBuf>,
}

impl Default for TestWorld {
    fn default() -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let state_dir = Utf8PathBuf::from_path_buf(temp.path().join("state"))
            .expect("utf8 state dir");
        fs::create_dir_all(&state_dir).expect("create state dir");
        let config = Config {
            state_dir,
            make_program: String::from("make"),
            make_jobs: 2,
            ..Config::default()
        };
        Self {
            temp,
            config,
            replacer: RecordingReplacer::default(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
            handoff: None,
        }
    }
}

impl TestWorld {
    pub fn add_server(&mut self, declaration: &str) {
        let spec: ServerSpec = declaration.parse().expect("server declaration");
        self.config.servers.push(spec);
    }

    fn server(&self, aka: &str) -> &ServerSpec {
        self.config
            .servers
            .iter()
            .find(|server| server.aka() == aka)
            .unwrap_or_else(|| panic!("no server named {aka}"))
    }

    /// Adds `id` to the cached inventory of the server named `aka`.
    pub fn add_target(&self, aka: &str, id: &str) {
        let path = self.config.state_paths().inventory_path(self.server(aka));
        let mut inventory: Map<String, Value> = fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default();
        inventory.insert(id.to_owned(), Value::Object(Map::new()));
        fs::write(&path, serde_json::to_vec(&inventory).expect("serialise inventory"))
            .expect("write inventory");
    }

    pub fn store_cookie(&self, aka: &str, name: &str, value: &str) {
        let path = self.cookies_path(aka);
        let mut cookies: Map<String, Value> = fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default();
        cookies.insert(name.to_owned(), Value::String(value.to_owned()));
        fs::write(&path, serde_json::to_vec(&cookies).expect("serialise cookies"))
            .expect("write cookies");
    }

    pub fn cookies_path(&self, aka: &str) -> PathBuf {
        self.config.state_paths().cookies_path(self.server(aka))
    }

    /// Writes a handoff file as a parent process would have.
    pub fn create_handoff(&mut self) -> PathBuf {
        let path = self.temp.path().join("tcf-jobserver-test.mk");
        fs::write(&path, "tcf-jobserver-run:\n").expect("write handoff");
        self.handoff = Some(path.clone());
        path
    }

    pub fn handoff_path(&self) -> &Path {
        self.handoff.as_deref().expect("handoff file created")
    }

    pub fn run(&mut self, command: &str) {
        let args = Self::build_args(command);
        self.run_args(args);
    }

    pub fn run_args(&mut self, args: Vec<OsString>) {
        self.stdout.clear();
        self.stderr.clear();
        let loader = StaticConfigLoader::new(self.config.clone());
        let mut io = IoStreams::new(&mut self.stdout, &mut self.stderr);
        let exit = run_with_replacer(args, &mut io, &loader, &mut self.replacer);
        self.exit_code = Some(exit);
    }

    fn build_args(command: &str) -> Vec<OsString> {
        let mut args = vec![OsString::from("tcf")];
        args.extend(command.split_whitespace().map(OsString::from));
        args
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8(self.stdout.clone()).expect("stdout utf8")
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8(self.stderr.clone()).expect("stderr utf8")
    }

    pub fn assert_exit_code(&self, expected: u8) {
        let exit = self.exit_code.expect("exit code recorded");
        assert_eq!(exit, ExitCode::from(expected), "stderr: {}", self.stderr_text());
    }
}
