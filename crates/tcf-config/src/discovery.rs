//! Reports which configuration files a load would consider.
//!
//! The loader itself lives in `ortho_config`; this module mirrors its search
//! order so diagnostic commands can tell operators which files were in play.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "TCF_CONFIG_PATH";
/// CLI flag naming an explicit configuration file.
pub const CONFIG_PATH_FLAG: &str = "--config-path";
/// File name searched for under the XDG configuration directory.
pub const CONFIG_FILE_NAME: &str = "tcf.toml";
/// Dotfile searched for in the home and project directories.
pub const DOTFILE_NAME: &str = ".tcf.toml";

/// Lists existing configuration files, lowest precedence first.
///
/// `args` are the configuration arguments handed to the loader, including
/// the program name.
#[must_use]
pub fn discover_config_files(args: &[OsString]) -> Vec<PathBuf> {
    candidate_files(args)
        .into_iter()
        .filter(|path| path.is_file())
        .collect()
}

fn candidate_files(args: &[OsString]) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("tcf").join(CONFIG_FILE_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(DOTFILE_NAME));
    }
    if let Ok(cwd) = env::current_dir() {
        candidates.push(cwd.join(DOTFILE_NAME));
    }
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|value| !value.is_empty()) {
        candidates.push(PathBuf::from(path));
    }
    candidates.extend(explicit_config_paths(args));
    candidates.dedup();
    candidates
}

/// Extracts `--config-path` values (both `--config-path P` and
/// `--config-path=P` forms).
fn explicit_config_paths(args: &[OsString]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(argument) = iter.next() {
        let text = argument.to_string_lossy();
        if text == CONFIG_PATH_FLAG {
            if let Some(value) = iter.next() {
                paths.push(PathBuf::from(value));
            }
        } else if let Some(value) = text
            .strip_prefix(CONFIG_PATH_FLAG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            paths.push(PathBuf::from(value));
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn explicit_paths_accept_both_flag_forms() {
        let paths = explicit_config_paths(&args(&[
            "tcf",
            "--config-path",
            "/etc/a.toml",
            "--config-path=/etc/b.toml",
        ]));
        assert_eq!(
            paths,
            vec![PathBuf::from("/etc/a.toml"), PathBuf::from("/etc/b.toml")]
        );
    }

    #[test]
    fn program_name_is_never_a_flag() {
        assert!(explicit_config_paths(&args(&["--config-path"])).is_empty());
    }

    #[test]
    fn only_existing_files_are_reported() {
        let temp = tempfile::tempdir().expect("temp dir");
        let present = temp.path().join("present.toml");
        fs::write(&present, "log_filter = \"info\"\n").expect("write config");
        let missing = temp.path().join("missing.toml");

        let found = discover_config_files(&[
            OsString::from("tcf"),
            OsString::from(CONFIG_PATH_FLAG),
            present.clone().into_os_string(),
            OsString::from(CONFIG_PATH_FLAG),
            missing.into_os_string(),
        ]);
        assert_eq!(found.last(), Some(&present));
        assert!(found.iter().all(|path| path.is_file()));
    }
}
