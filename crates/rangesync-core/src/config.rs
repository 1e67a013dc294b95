//! Registration configuration: the JSON document supplied alongside a sync
//! id, naming the table, its key columns, and one SELECT template per
//! operation.
//!
//! Templates carry `?` placeholders in `row_filter`; range queries bind
//! `begin` then `end`, row lookups bind the index key. Substitution is
//! textual, matching the query shapes the collaborating store executes.

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;

/// Decoders this build understands. `decoder_type` labels are mapped here
/// and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderType {
    /// Range frames with a JSON body (`begin`/`end`/`id`).
    JsonRange,
}

impl DecoderType {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "JSON_RANGE" => Some(Self::JsonRange),
            _ => None,
        }
    }
}

/// One SELECT template from the registration configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryTemplate {
    #[serde(default)]
    pub row_filter: String,
    /// Accepted as a single string or an array of strings.
    #[serde(default, deserialize_with = "string_or_seq")]
    pub column_list: Vec<String>,
    /// Accepted as a boolean or a string; empty means not distinct.
    #[serde(default, deserialize_with = "truthy")]
    pub distinct_opt: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_by_opt: String,
}

/// The count template additionally names the column the scalar comes back
/// under.
#[derive(Debug, Clone, Deserialize)]
pub struct CountQueryTemplate {
    #[serde(flatten)]
    pub template: QueryTemplate,
    pub count_field_name: String,
}

/// Parsed registration configuration.
///
/// All keys are required; `column_list`, `distinct_opt`, and `order_by_opt`
/// accept the lenient spellings older producers emit.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    decoder_type: String,
    pub table: String,
    /// Echoed as `component` in every outbound envelope.
    pub component: String,
    /// Name of the ordering/index column.
    pub index: String,
    /// Name of the column echoed as `timestamp` in `state` envelopes.
    pub last_event: String,
    /// Name of the column fed into SHA-256.
    pub checksum_field: String,
    pub no_data_query_json: QueryTemplate,
    pub count_range_query_json: CountQueryTemplate,
    pub row_data_query_json: QueryTemplate,
    pub range_checksum_query_json: QueryTemplate,
}

impl SyncConfig {
    /// Parse and validate a raw configuration document.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(raw)?;
        if DecoderType::from_label(&config.decoder_type).is_none() {
            return Err(ConfigError::UnknownDecoder(config.decoder_type));
        }
        Ok(config)
    }

    /// The decoder named by the configuration.
    pub fn decoder(&self) -> DecoderType {
        // parse() rejects unrecognized labels.
        DecoderType::from_label(&self.decoder_type).unwrap_or(DecoderType::JsonRange)
    }

    /// Full-table dump query (`no_data`).
    pub fn no_data_query(&self) -> SelectQuery {
        self.no_data_query_json.over(&self.table)
    }

    /// Row count over an inclusive key range.
    pub fn count_range_query(&self) -> SelectQuery {
        self.count_range_query_json.template.over(&self.table)
    }

    /// Single-row lookup by index key.
    pub fn row_data_query(&self) -> SelectQuery {
        self.row_data_query_json.over(&self.table)
    }

    /// Ordered row stream over an inclusive key range.
    pub fn range_checksum_query(&self) -> SelectQuery {
        self.range_checksum_query_json.over(&self.table)
    }
}

impl QueryTemplate {
    fn over(&self, table: &str) -> SelectQuery {
        SelectQuery {
            table: table.to_string(),
            columns: self.column_list.clone(),
            filter: self.row_filter.clone(),
            distinct: self.distinct_opt,
            order_by: self.order_by_opt.clone(),
        }
    }
}

/// A SELECT template paired with its table, ready for a dataset adapter to
/// bind and execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub table: String,
    pub columns: Vec<String>,
    /// Filter clause, possibly holding `?` placeholders.
    pub filter: String,
    pub distinct: bool,
    pub order_by: String,
}

impl SelectQuery {
    /// Render as SQL, substituting `args` for the filter's placeholders in
    /// order. Extra placeholders are left untouched; extra args are ignored.
    pub fn to_sql(&self, args: &[&str]) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        let filter = substitute(&self.filter, args);
        let filter = filter.trim();
        if !filter.is_empty() {
            sql.push(' ');
            sql.push_str(filter);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by);
        }
        sql
    }
}

fn substitute(filter: &str, args: &[&str]) -> String {
    let mut out = filter.to_string();
    let mut from = 0;
    for arg in args {
        match out[from..].find('?') {
            Some(offset) => {
                let at = from + offset;
                out.replace_range(at..at + 1, arg);
                from = at + arg.len();
            }
            None => break,
        }
    }
    out
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(D::Error::custom(format!(
                    "column_list entries must be strings, got {other}"
                ))),
            })
            .collect(),
        other => Err(D::Error::custom(format!(
            "column_list must be a string or an array, got {other}"
        ))),
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(flag),
        Value::String(s) => Ok(s == "true"),
        Value::Null => Ok(false),
        other => Err(D::Error::custom(format!(
            "expected a boolean or string, got {other}"
        ))),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null | Value::Bool(false) => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a string, got {other}"
        ))),
    }
}
