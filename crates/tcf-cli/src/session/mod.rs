//! Broker session context.
//!
//! A [`Session`] is opened once configuration is known. It holds one
//! [`BrokerConnection`] per configured server, with its stored cookies, and
//! the inventory of targets those brokers serve. Closing it flushes changed
//! cookies back to the state directory.

mod cookies;
mod error;
mod inventory;

use std::path::PathBuf;

use tcf_config::{Config, ServerSpec, StatePaths};
use tracing::{debug, warn};

pub use cookies::Cookies;
pub use error::SessionError;
pub use inventory::{CachedInventory, TargetInventory, TargetRecord};

use crate::dispatch::ResolveError;
use cookies::{atomic_write, load_cookies, remove_cookies};

/// Tracing target for session state.
pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Client-side state for one broker.
#[derive(Debug, Clone)]
pub struct BrokerConnection {
    spec: ServerSpec,
    cookies: Cookies,
    cookies_path: PathBuf,
    dirty: bool,
}

impl BrokerConnection {
    fn open(spec: ServerSpec, paths: &StatePaths) -> Self {
        let cookies_path = paths.cookies_path(&spec);
        let cookies = load_cookies(&cookies_path);
        Self {
            spec,
            cookies,
            cookies_path,
            dirty: false,
        }
    }

    #[must_use]
    pub fn spec(&self) -> &ServerSpec {
        &self.spec
    }

    #[must_use]
    pub fn aka(&self) -> String {
        self.spec.aka()
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        self.spec.hostname()
    }

    #[must_use]
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Whether `id` names this broker by URL or short name.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        let url = self.spec.url.as_str().trim_end_matches('/');
        url == id.trim_end_matches('/') || self.aka() == id
    }

    /// Drops every stored cookie; returns whether anything was dropped.
    pub fn clear_cookies(&mut self) -> bool {
        if self.cookies.is_empty() {
            return false;
        }
        self.cookies.clear();
        self.dirty = true;
        true
    }

    fn flush(&self, paths: &StatePaths) -> Result<(), SessionError> {
        if self.cookies.is_empty() {
            return remove_cookies(&self.cookies_path).map_err(|source| {
                SessionError::RemoveCookies {
                    path: self.cookies_path.clone(),
                    source,
                }
            });
        }
        paths.ensure_state_dir()?;
        let contents = serde_json::to_vec_pretty(&self.cookies).map_err(|source| {
            SessionError::SerialiseCookies {
                server: self.spec.to_string(),
                source,
            }
        })?;
        atomic_write(&self.cookies_path, &contents).map_err(|source| {
            SessionError::WriteCookies {
                path: self.cookies_path.clone(),
                source,
            }
        })
    }
}

/// Broker connections and known targets for one invocation.
#[derive(Debug)]
pub struct Session {
    paths: StatePaths,
    brokers: Vec<BrokerConnection>,
    targets: Vec<TargetRecord>,
}

impl Session {
    /// Opens a connection record per configured server and loads the
    /// targets `inventory` knows for each.
    ///
    /// An inventory that cannot be read is logged and treated as empty.
    pub fn open(config: &Config, inventory: &dyn TargetInventory) -> Self {
        let paths = config.state_paths();
        let mut brokers = Vec::with_capacity(config.servers().len());
        let mut targets = Vec::new();
        for (index, spec) in config.servers().iter().enumerate() {
            match inventory.targets(spec, index) {
                Ok(records) => targets.extend(records),
                Err(error) => warn!(
                    target: SESSION_TARGET,
                    server = %spec,
                    %error,
                    "ignoring unusable target inventory"
                ),
            }
            brokers.push(BrokerConnection::open(spec.clone(), &paths));
        }
        debug!(
            target: SESSION_TARGET,
            brokers = brokers.len(),
            targets = targets.len(),
            "session opened"
        );
        Self {
            paths,
            brokers,
            targets,
        }
    }

    #[must_use]
    pub fn brokers(&self) -> &[BrokerConnection] {
        &self.brokers
    }

    /// Finds the broker for `id`, which names either a broker (URL or short
    /// name) or a target it serves.
    pub fn resolve_broker(&self, id: &str) -> Result<&BrokerConnection, ResolveError> {
        if let Some(broker) = self.brokers.iter().find(|broker| broker.matches(id)) {
            return Ok(broker);
        }
        let target = self.resolve_target(id)?;
        debug!(
            target: SESSION_TARGET,
            fullid = %target.fullid,
            disabled = target.disabled,
            "resolved target"
        );
        self.brokers
            .get(target.broker)
            .ok_or_else(|| ResolveError::UnknownTarget {
                target: id.to_owned(),
            })
    }

    /// Finds a target by full id (`aka/id`), or by bare id when exactly one
    /// broker serves a target of that name.
    pub fn resolve_target(&self, id: &str) -> Result<&TargetRecord, ResolveError> {
        if let Some(target) = self.targets.iter().find(|target| target.fullid == id) {
            return Ok(target);
        }
        let unknown = || ResolveError::UnknownTarget {
            target: id.to_owned(),
        };
        if id.contains('/') {
            return Err(unknown());
        }
        let matches: Vec<&TargetRecord> =
            self.targets.iter().filter(|target| target.id == id).collect();
        match matches.as_slice() {
            [] => Err(unknown()),
            [target] => Ok(target),
            many => Err(ResolveError::AmbiguousTarget {
                target: id.to_owned(),
                candidates: many.iter().map(|target| target.fullid.clone()).collect(),
            }),
        }
    }

    /// Drops stored cookies for the named brokers, or for all of them when
    /// `servers` is empty. Returns how many brokers had cookies to drop.
    pub fn logout(&mut self, servers: &[String]) -> Result<usize, ResolveError> {
        let selected: Vec<usize> = if servers.is_empty() {
            (0..self.brokers.len()).collect()
        } else {
            servers
                .iter()
                .map(|server| {
                    self.brokers
                        .iter()
                        .position(|broker| broker.matches(server))
                        .ok_or_else(|| ResolveError::UnknownServer {
                            server: server.clone(),
                        })
                })
                .collect::<Result<_, _>>()?
        };
        let mut cleared = 0;
        for index in selected {
            if let Some(broker) = self.brokers.get_mut(index)
                && broker.clear_cookies()
            {
                debug!(target: SESSION_TARGET, server = %broker.spec, "cookies dropped");
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    /// Persists changed cookies.
    ///
    /// Every broker is flushed even if one fails; the first failure is
    /// returned and the rest are logged.
    pub fn close(self) -> Result<(), SessionError> {
        let mut first_error = None;
        for broker in self.brokers.iter().filter(|broker| broker.dirty) {
            if let Err(error) = broker.flush(&self.paths) {
                if first_error.is_none() {
                    first_error = Some(error);
                } else {
                    warn!(target: SESSION_TARGET, %error, "failed to persist cookies");
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    /// Serves a fixed list of `(broker index, id)` targets.
    struct StaticInventory(Vec<(usize, &'static str)>);

    impl TargetInventory for StaticInventory {
        fn targets(
            &self,
            server: &ServerSpec,
            broker: usize,
        ) -> Result<Vec<TargetRecord>, SessionError> {
            Ok(self
                .0
                .iter()
                .filter(|(index, _)| *index == broker)
                .map(|(_, id)| TargetRecord::new(*id, &server.aka(), broker, false))
                .collect())
        }
    }

    struct Fixture {
        _temp: TempDir,
        config: Config,
    }

    #[fixture]
    fn two_brokers() -> Fixture {
        let temp = tempfile::tempdir().expect("temp dir");
        let state_dir =
            camino::Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir");
        let config = Config {
            state_dir,
            servers: vec![
                "org1=https://one.example.org".parse().expect("server"),
                "org2=https://two.example.org:5001".parse().expect("server"),
            ],
            ..Config::default()
        };
        Fixture {
            _temp: temp,
            config,
        }
    }

    fn inventory() -> StaticInventory {
        StaticInventory(vec![(0, "qemu1"), (1, "qemu1"), (1, "nuc7")])
    }

    #[rstest]
    fn bare_name_served_twice_is_ambiguous(two_brokers: Fixture) {
        let session = Session::open(&two_brokers.config, &inventory());
        let error = session.resolve_target("qemu1").expect_err("ambiguous");
        assert_eq!(
            error,
            ResolveError::AmbiguousTarget {
                target: String::from("qemu1"),
                candidates: vec![String::from("org1/qemu1"), String::from("org2/qemu1")],
            }
        );
    }

    #[rstest]
    fn full_ids_and_unique_names_resolve(two_brokers: Fixture) {
        let session = Session::open(&two_brokers.config, &inventory());
        let broker = session.resolve_broker("org1/qemu1").expect("full id");
        assert_eq!(broker.aka(), "org1");
        let broker = session.resolve_broker("nuc7").expect("unique name");
        assert_eq!(broker.aka(), "org2");
    }

    #[rstest]
    fn disabled_targets_still_resolve_to_their_broker(two_brokers: Fixture) {
        let paths = two_brokers.config.state_paths();
        fs::write(
            paths.inventory_path(&two_brokers.config.servers[1]),
            r#"{"qemu9": {"disabled": "maintenance"}}"#,
        )
        .expect("seed inventory");

        let session = Session::open(&two_brokers.config, &CachedInventory::new(paths));
        let target = session.resolve_target("qemu9").expect("disabled target");
        assert!(target.disabled);
        assert_eq!(session.resolve_broker("qemu9").expect("broker").aka(), "org2");
    }

    #[rstest]
    #[case("org2")]
    #[case("https://two.example.org:5001")]
    #[case("https://two.example.org:5001/")]
    fn brokers_resolve_by_url_or_short_name(two_brokers: Fixture, #[case] id: &str) {
        let session = Session::open(&two_brokers.config, &inventory());
        assert_eq!(session.resolve_broker(id).expect("broker").aka(), "org2");
    }

    #[rstest]
    #[case("missing")]
    #[case("org3/qemu1")]
    fn unknown_names_are_lookup_errors(two_brokers: Fixture, #[case] id: &str) {
        let session = Session::open(&two_brokers.config, &inventory());
        assert!(matches!(
            session.resolve_broker(id),
            Err(ResolveError::UnknownTarget { .. })
        ));
    }

    #[rstest]
    fn logout_removes_the_cookie_file_on_close(two_brokers: Fixture) {
        let paths = two_brokers.config.state_paths();
        let cookie_file = paths.cookies_path(&two_brokers.config.servers[0]);
        fs::write(&cookie_file, r#"{"sid": "abc"}"#).expect("seed cookies");

        let mut session = Session::open(&two_brokers.config, &inventory());
        assert_eq!(session.brokers()[0].cookies().len(), 1);
        assert_eq!(session.logout(&[String::from("org1")]).expect("logout"), 1);
        session.close().expect("close");

        assert!(!cookie_file.exists());
    }

    #[rstest]
    fn logout_rejects_unknown_servers(two_brokers: Fixture) {
        let mut session = Session::open(&two_brokers.config, &inventory());
        let error = session
            .logout(&[String::from("org9")])
            .expect_err("unknown server");
        assert!(matches!(error, ResolveError::UnknownServer { .. }));
    }

    #[rstest]
    fn untouched_sessions_leave_state_alone(two_brokers: Fixture) {
        let session = Session::open(&two_brokers.config, &inventory());
        session.close().expect("close");
        let entries = fs::read_dir(two_brokers.config.state_dir())
            .expect("read state dir")
            .count();
        assert_eq!(entries, 0);
    }
}
