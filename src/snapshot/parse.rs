use anyhow::{Context, Result, anyhow};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::graph::ReconcileIssue;

/// A node as it arrives. Only `id` is required; an optional field of the
/// wrong type reads as absent and is reported, never dropping the record.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeRecord {
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    /// Any JSON number, truncated toward zero.
    #[serde(default, deserialize_with = "group_number")]
    pub group: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub charge: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub ix: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub iy: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub inherit: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub darken: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub opacity: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub class: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LinkRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "identifier")]
    pub source: String,
    #[serde(deserialize_with = "identifier")]
    pub target: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub distance: Option<f32>,
}

/// Strings as-is, numbers by their JSON text.
fn identifier<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(D::Error::custom(format!(
            "identifier must be a string or a number, found {other}"
        ))),
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

fn group_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| value.as_f64().map(|number| number.trunc() as i64))
        .unwrap_or(0))
}

/// Names of the fields present in `raw` with a non-null value that `read`
/// marks as not taken.
fn rejected(raw: &Map<String, Value>, fields: &[(&'static str, bool)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(name, read)| !read && raw.get(*name).is_some_and(|value| !value.is_null()))
        .map(|(name, _)| *name)
        .collect()
}

trait SnapshotRecord: DeserializeOwned {
    /// Fields of `raw` that were ignored because of their type.
    fn rejected_fields(&self, raw: &Map<String, Value>) -> Vec<&'static str>;
}

impl SnapshotRecord for NodeRecord {
    fn rejected_fields(&self, raw: &Map<String, Value>) -> Vec<&'static str> {
        rejected(
            raw,
            &[
                ("group", raw.get("group").is_some_and(Value::is_number)),
                ("status", self.status.is_some()),
                ("charge", self.charge.is_some()),
                ("ix", self.ix.is_some()),
                ("iy", self.iy.is_some()),
                ("inherit", self.inherit.is_some()),
                ("darken", self.darken.is_some()),
                ("opacity", self.opacity.is_some()),
                ("class", self.class.is_some()),
                ("label", self.label.is_some()),
            ],
        )
    }
}

impl SnapshotRecord for LinkRecord {
    fn rejected_fields(&self, raw: &Map<String, Value>) -> Vec<&'static str> {
        rejected(
            raw,
            &[
                ("id", self.id.is_some()),
                ("distance", self.distance.is_some()),
            ],
        )
    }
}

/// One full point-in-time graph as received from the source.
#[derive(Clone, Debug, Default)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
    /// Problems found while reading the document. Carried into the
    /// reconcile report.
    pub issues: Vec<ReconcileIssue>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<NodeRecord>, links: Vec<LinkRecord>) -> Self {
        Self {
            nodes,
            links,
            issues: Vec::new(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let parsed: Value = serde_json::from_str(raw).context("snapshot is not valid JSON")?;
        Self::from_value(parsed)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(anyhow!("snapshot root must be a JSON object"));
        };

        let mut issues = Vec::new();
        let nodes = read_collection::<NodeRecord>(object.remove("nodes"), "nodes", &mut issues);
        let links = read_collection::<LinkRecord>(object.remove("links"), "links", &mut issues);

        Ok(Self {
            nodes,
            links,
            issues,
        })
    }
}

fn read_collection<T>(value: Option<Value>, name: &str, issues: &mut Vec<ReconcileIssue>) -> Vec<T>
where
    T: SnapshotRecord,
{
    let entries = match value {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            issues.push(ReconcileIssue::MalformedSnapshot {
                detail: format!("`{name}` is not an array; treated as empty"),
            });
            return Vec::new();
        }
        None => {
            issues.push(ReconcileIssue::MalformedSnapshot {
                detail: format!("`{name}` is missing; treated as empty"),
            });
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let Value::Object(raw) = &entry else {
            issues.push(ReconcileIssue::MalformedSnapshot {
                detail: format!("{name}[{index}] skipped: not an object"),
            });
            continue;
        };

        match T::deserialize(&entry) {
            Ok(record) => {
                for field in record.rejected_fields(raw) {
                    issues.push(ReconcileIssue::MalformedSnapshot {
                        detail: format!("{name}[{index}].{field} has an unexpected type; ignored"),
                    });
                }
                records.push(record);
            }
            Err(error) => issues.push(ReconcileIssue::MalformedSnapshot {
                detail: format!("{name}[{index}] skipped: {error}"),
            }),
        }
    }
    records
}
