//! Known targets per broker.
//!
//! Listing targets is the job of the broker client; this side only reads the
//! inventory it caches in `targets-<url-safe>.json`. The cache is either an
//! object keyed by target id or an array of objects carrying an `id`.

use std::fs;
use std::io;

use serde_json::{Map, Value};
use tcf_config::{ServerSpec, StatePaths};

use super::error::SessionError;

/// One target known to a broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub id: String,
    /// `<broker aka>/<id>`.
    pub fullid: String,
    /// Index of the owning broker in the session.
    pub broker: usize,
    pub disabled: bool,
}

impl TargetRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, aka: &str, broker: usize, disabled: bool) -> Self {
        let id = id.into();
        Self {
            fullid: format!("{aka}/{id}"),
            id,
            broker,
            disabled,
        }
    }
}

/// Source of target records for a broker.
pub trait TargetInventory {
    /// Targets served by `server`, the `broker`-th broker of the session.
    fn targets(&self, server: &ServerSpec, broker: usize)
    -> Result<Vec<TargetRecord>, SessionError>;
}

/// Reads the inventory cached in the state directory.
#[derive(Debug, Clone)]
pub struct CachedInventory {
    paths: StatePaths,
}

impl CachedInventory {
    #[must_use]
    pub fn new(paths: StatePaths) -> Self {
        Self { paths }
    }
}

impl TargetInventory for CachedInventory {
    fn targets(
        &self,
        server: &ServerSpec,
        broker: usize,
    ) -> Result<Vec<TargetRecord>, SessionError> {
        let path = self.paths.inventory_path(server);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(SessionError::ReadInventory { path, source }),
        };
        let document: Value = serde_json::from_slice(&bytes)
            .map_err(|source| SessionError::ParseInventory { path, source })?;
        Ok(records_from(&document, &server.aka(), broker))
    }
}

fn records_from(document: &Value, aka: &str, broker: usize) -> Vec<TargetRecord> {
    let entries: Vec<(String, Option<&Map<String, Value>>)> = match document {
        Value::Object(map) => map
            .iter()
            .map(|(id, entry)| (id.clone(), entry.as_object()))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|entry| {
                entry
                    .get("id")
                    .and_then(Value::as_str)
                    .map(|id| (id.to_owned(), Some(entry)))
            })
            .collect(),
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .map(|(id, entry)| {
            let disabled = entry
                .and_then(|fields| fields.get("disabled"))
                .is_some_and(|value| !value.is_null());
            TargetRecord::new(id, aka, broker, disabled)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn server() -> ServerSpec {
        "org1=https://tb.example.org".parse().expect("server spec")
    }

    #[test]
    fn object_inventories_are_keyed_by_id() {
        let records = records_from(
            &json!({"qemu1": {}, "nuc2": {"disabled": "broken"}}),
            "org1",
            0,
        );
        assert_eq!(
            records,
            vec![
                TargetRecord::new("nuc2", "org1", 0, true),
                TargetRecord::new("qemu1", "org1", 0, false),
            ]
        );
    }

    #[test]
    fn array_inventories_need_an_id() {
        let records = records_from(
            &json!([{"id": "qemu1", "disabled": null}, {"name": "stray"}]),
            "org1",
            2,
        );
        assert_eq!(records, vec![TargetRecord::new("qemu1", "org1", 2, false)]);
        assert_eq!(records[0].fullid, "org1/qemu1");
    }

    #[test]
    fn missing_cache_means_no_targets() {
        let temp = tempfile::tempdir().expect("temp dir");
        let inventory = CachedInventory::new(StatePaths::new(temp.path()));
        let records = inventory.targets(&server(), 0).expect("no cache is fine");
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_cache_is_reported() {
        let temp = tempfile::tempdir().expect("temp dir");
        let paths = StatePaths::new(temp.path());
        fs::write(paths.inventory_path(&server()), "[").expect("write cache");

        let error = CachedInventory::new(paths)
            .targets(&server(), 0)
            .expect_err("malformed cache");
        assert!(matches!(error, SessionError::ParseInventory { .. }));
    }
}
