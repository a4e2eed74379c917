//! Text command surface over an [`Engine`].
//!
//! A command line is a keyword followed by whitespace-separated
//! arguments. Single- or double-quoted strings and balanced JSON objects or
//! arrays each count as one argument, so JSON and query strings with
//! spaces need no further escaping.
//!
//! # Examples
//!
//! ```
//! use quarry::command::{Reply, execute};
//! use quarry::engine::Engine;
//!
//! let engine = Engine::default();
//! assert_eq!(execute(&engine, "INDEX.CREATE products"), Reply::Ok);
//! execute(&engine, r#"ADD products 1 {"title": "Wireless Bluetooth Headphones"}"#);
//!
//! let reply = execute(&engine, "QUERY products title:wireless");
//! assert_eq!(reply.to_json()["hits"][0]["id"], "1");
//!
//! let reply = execute(&engine, "QUERY products title:(");
//! assert_eq!(reply.error_code(), Some("ERR_QUERY_SYNTAX"));
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::IndexConfig;
use crate::document::Document;
use crate::engine::Engine;
use crate::error::{QuarryError, Result};
use crate::facet::FacetSpec;
use crate::highlight::HighlightConfig;
use crate::schema::FieldEntry;
use crate::search::options::{SearchResults, SortBy, SortOrder};
use crate::spelling::{DidYouMeanConfig, SuggestConfig};

/// The reply to one command. Errors are a variant of their own so that
/// they can never be mistaken for an empty result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Ok,
    Integer { value: i64 },
    Json { value: Value },
    Error { code: String, message: String },
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Reply::Json { value }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error { .. })
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            Reply::Error { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The reply as it goes on the wire: `"OK"`, a number, the JSON value,
    /// or `{"error": {"code": .., "message": ..}}`.
    pub fn to_json(&self) -> Value {
        match self {
            Reply::Ok => Value::String("OK".to_string()),
            Reply::Integer { value } => Value::from(*value),
            Reply::Json { value } => value.clone(),
            Reply::Error { code, message } => json!({
                "error": {"code": code, "message": message}
            }),
        }
    }
}

impl From<QuarryError> for Reply {
    fn from(err: QuarryError) -> Self {
        Reply::Error {
            code: err.kind().code().to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Options of a `QUERY` command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryCommand {
    pub index: String,
    pub query: String,
    pub limit: Option<usize>,
    pub offset: usize,
    pub highlight: bool,
    pub with_scores: bool,
    pub sort: Vec<SortBy>,
    pub facets: Option<FacetSpec>,
    pub timeout: Option<Duration>,
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    IndexCreate {
        name: String,
        analyzer: Option<String>,
        config: IndexConfig,
    },
    IndexDrop { name: String },
    IndexList,
    IndexInfo { name: String },
    Add {
        index: String,
        id: String,
        fields: Value,
        boost: Option<f32>,
    },
    AddBulk { index: String, documents: Value },
    Delete { index: String, id: String },
    Query(QueryCommand),
    Suggest {
        index: String,
        prefix: String,
        config: SuggestConfig,
    },
    Spellcheck {
        index: String,
        phrase: String,
        config: DidYouMeanConfig,
    },
    Metrics,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command> {
        let args = tokenize(line)?;
        let mut args = Args::new(args);
        let keyword = args.required("command")?.to_ascii_uppercase();

        let command = match keyword.as_str() {
            "INDEX.CREATE" => {
                let name = args.required("index name")?;
                let mut analyzer = None;
                let mut config = IndexConfig::new();
                while let Some(option) = args.next_option() {
                    match option.as_str() {
                        "ANALYZER" => analyzer = Some(args.required("analyzer name")?),
                        "SCHEMA" => config = parse_schema(&args.required("schema")?)?,
                        other => return Err(unexpected(other)),
                    }
                }
                Command::IndexCreate {
                    name,
                    analyzer,
                    config,
                }
            }
            "INDEX.DROP" => Command::IndexDrop {
                name: args.required("index name")?,
            },
            "INDEX.LIST" => Command::IndexList,
            "INDEX.INFO" => Command::IndexInfo {
                name: args.required("index name")?,
            },
            "ADD" => {
                let index = args.required("index name")?;
                let id = args.required("document id")?;
                let fields = serde_json::from_str(&args.required("document fields")?)?;
                let mut boost = None;
                while let Some(option) = args.next_option() {
                    match option.as_str() {
                        "BOOST" => boost = Some(args.number("boost")?),
                        other => return Err(unexpected(other)),
                    }
                }
                Command::Add {
                    index,
                    id,
                    fields,
                    boost,
                }
            }
            "ADDBULK" => Command::AddBulk {
                index: args.required("index name")?,
                documents: serde_json::from_str(&args.required("documents")?)?,
            },
            "DEL" => Command::Delete {
                index: args.required("index name")?,
                id: args.required("document id")?,
            },
            "QUERY" => {
                let mut query = QueryCommand {
                    index: args.required("index name")?,
                    query: args.required("query string")?,
                    ..QueryCommand::default()
                };
                while let Some(option) = args.next_option() {
                    match option.as_str() {
                        "LIMIT" => query.limit = Some(args.number("limit")?),
                        "OFFSET" => query.offset = args.number("offset")?,
                        "HIGHLIGHT" => query.highlight = true,
                        "WITHSCORES" => query.with_scores = true,
                        "SORTBY" => {
                            let field = args.required("sort field")?;
                            let order = match args.peek_upper().as_deref() {
                                Some("DESC") => {
                                    args.skip();
                                    SortOrder::Desc
                                }
                                Some("ASC") => {
                                    args.skip();
                                    SortOrder::Asc
                                }
                                _ => SortOrder::Asc,
                            };
                            query.sort.push(if field.eq_ignore_ascii_case("_score") {
                                SortBy::Score
                            } else {
                                SortBy::field(field, order)
                            });
                        }
                        "FACETS" => {
                            query.facets = Some(FacetSpec::from_json_str(&args.required("facets")?)?)
                        }
                        "TIMEOUT" => {
                            query.timeout = Some(Duration::from_millis(args.number("timeout")?))
                        }
                        other => return Err(unexpected(other)),
                    }
                }
                Command::Query(query)
            }
            "SUGGEST" => {
                let index = args.required("index name")?;
                let prefix = args.required("prefix")?;
                let mut config = SuggestConfig::default();
                while let Some(option) = args.next_option() {
                    match option.as_str() {
                        "FIELD" => config.field = Some(args.required("field")?),
                        "FUZZY" => config.max_edits = args.number("fuzzy distance")?,
                        "MAX" => config.limit = args.number("max")?,
                        other => return Err(unexpected(other)),
                    }
                }
                Command::Suggest {
                    index,
                    prefix,
                    config,
                }
            }
            "SPELLCHECK" => {
                let index = args.required("index name")?;
                let phrase = args.required("phrase")?;
                let mut config = DidYouMeanConfig::default();
                while let Some(option) = args.next_option() {
                    match option.as_str() {
                        "FIELD" => config.field = Some(args.required("field")?),
                        "DISTANCE" => config.max_edits = args.number("distance")?,
                        other => return Err(unexpected(other)),
                    }
                }
                Command::Spellcheck {
                    index,
                    phrase,
                    config,
                }
            }
            "METRICS" => Command::Metrics,
            other => {
                return Err(QuarryError::invalid_argument(format!(
                    "unknown command '{other}'"
                )));
            }
        };

        if let Some(extra) = args.next_option() {
            return Err(unexpected(&extra));
        }
        Ok(command)
    }
}

/// Parse and run one command line.
pub fn execute(engine: &Engine, line: &str) -> Reply {
    match Command::parse(line).and_then(|command| run(engine, command)) {
        Ok(reply) => reply,
        Err(err) => {
            log::debug!("command failed: {err}");
            err.into()
        }
    }
}

/// Run a parsed command.
pub fn run(engine: &Engine, command: Command) -> Result<Reply> {
    match command {
        Command::IndexCreate {
            name,
            analyzer,
            mut config,
        } => {
            if analyzer.is_some() {
                config.default_analyzer = analyzer;
            }
            engine.create_index(name, config)?;
            Ok(Reply::Ok)
        }
        Command::IndexDrop { name } => {
            engine.drop_index(&name)?;
            Ok(Reply::Ok)
        }
        Command::IndexList => Ok(Reply::json(json!(engine.list_indexes()))),
        Command::IndexInfo { name } => {
            let stats = engine.index(&name)?.stats();
            Ok(Reply::json(serde_json::to_value(stats)?))
        }
        Command::Add {
            index,
            id,
            fields,
            boost,
        } => {
            engine.add(&index, Document::from_json(id, &fields, boost)?)?;
            Ok(Reply::Ok)
        }
        Command::AddBulk { index, documents } => {
            let documents = bulk_documents(&documents)?;
            let count = engine.add_bulk(&index, documents)?;
            Ok(Reply::Integer {
                value: count as i64,
            })
        }
        Command::Delete { index, id } => {
            let deleted = engine.delete(&index, &id)?;
            Ok(Reply::Integer {
                value: i64::from(deleted),
            })
        }
        Command::Query(query) => {
            let mut options = engine
                .search_options()
                .with_offset(query.offset)
                .include_scores(query.with_scores)
                .include_stored(true);
            if let Some(limit) = query.limit {
                options = options.with_limit(limit);
            }
            if query.highlight {
                options = options.with_highlight(HighlightConfig::default());
            }
            if let Some(facets) = query.facets {
                options = options.with_facets(facets);
            }
            if let Some(timeout) = query.timeout {
                options = options.with_timeout(timeout);
            }
            for key in query.sort {
                options = options.sort_by(key);
            }
            let results = engine.search_str(&query.index, &query.query, &options)?;
            Ok(Reply::json(results_to_json(&results)?))
        }
        Command::Suggest {
            index,
            prefix,
            config,
        } => {
            let suggestions = engine.suggest(&index, &prefix, &config)?;
            Ok(Reply::json(serde_json::to_value(suggestions)?))
        }
        Command::Spellcheck {
            index,
            phrase,
            config,
        } => {
            let corrected = engine.did_you_mean(&index, &phrase, &config)?;
            Ok(Reply::json(json!({
                "original": phrase,
                "corrected": corrected,
                "changed": corrected != phrase,
            })))
        }
        Command::Metrics => Ok(Reply::json(serde_json::to_value(engine.metrics())?)),
    }
}

fn results_to_json(results: &SearchResults) -> Result<Value> {
    let mut value = Map::new();
    value.insert("total".to_string(), Value::from(results.total_hits));
    value.insert("hits".to_string(), serde_json::to_value(&results.hits)?);
    if !results.facets.is_empty() {
        value.insert("facets".to_string(), serde_json::to_value(&results.facets)?);
    }
    value.insert(
        "took_ms".to_string(),
        Value::from(results.took.as_secs_f64() * 1000.0),
    );
    Ok(Value::Object(value))
}

/// `SCHEMA` takes either a full index configuration object or an array of
/// field entries.
fn parse_schema(json: &str) -> Result<IndexConfig> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(fields) => {
            let fields = fields
                .into_iter()
                .map(serde_json::from_value::<FieldEntry>)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(IndexConfig::new().with_fields(fields))
        }
        object @ Value::Object(_) => Ok(serde_json::from_value(object)?),
        _ => Err(QuarryError::invalid_argument(
            "SCHEMA must be a JSON object or array",
        )),
    }
}

/// Documents of an `ADDBULK` array. Each element is
/// `{"id": .., "fields": {..}, "boost": ..}`; without a `fields` object the
/// remaining keys of the element are the fields.
fn bulk_documents(value: &Value) -> Result<Vec<Document>> {
    let items = value
        .as_array()
        .ok_or_else(|| QuarryError::invalid_argument("ADDBULK expects a JSON array"))?;

    let mut documents = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            QuarryError::invalid_argument(format!("ADDBULK element {i} is not an object"))
        })?;
        let id = match object.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(QuarryError::invalid_argument(format!(
                    "ADDBULK element {i} has no string id"
                )));
            }
        };
        let boost = match object.get("boost") {
            None => None,
            Some(b) => Some(b.as_f64().ok_or_else(|| {
                QuarryError::invalid_argument(format!("ADDBULK element {i} has a non-numeric boost"))
            })? as f32),
        };
        let fields = match object.get("fields") {
            Some(fields @ Value::Object(_)) => fields.clone(),
            _ => Value::Object(
                object
                    .iter()
                    .filter(|(key, _)| !matches!(key.as_str(), "id" | "boost"))
                    .map(|(key, v)| (key.clone(), v.clone()))
                    .collect(),
            ),
        };
        documents.push(Document::from_json(id, &fields, boost)?);
    }
    Ok(documents)
}

fn unexpected(token: &str) -> QuarryError {
    QuarryError::invalid_argument(format!("unexpected argument '{token}'"))
}

/// Cursor over the arguments of a command line.
struct Args {
    args: std::vec::IntoIter<String>,
    peeked: Option<String>,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Args {
            args: args.into_iter(),
            peeked: None,
        }
    }

    fn next(&mut self) -> Option<String> {
        self.peeked.take().or_else(|| self.args.next())
    }

    fn required(&mut self, what: &str) -> Result<String> {
        self.next()
            .ok_or_else(|| QuarryError::invalid_argument(format!("missing {what}")))
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let raw = self.required(what)?;
        raw.parse()
            .map_err(|_| QuarryError::invalid_argument(format!("invalid {what} '{raw}'")))
    }

    /// The next argument, uppercased, as an option keyword.
    fn next_option(&mut self) -> Option<String> {
        self.next().map(|s| s.to_ascii_uppercase())
    }

    fn peek_upper(&mut self) -> Option<String> {
        if self.peeked.is_none() {
            self.peeked = self.args.next();
        }
        self.peeked.as_ref().map(|s| s.to_ascii_uppercase())
    }

    fn skip(&mut self) {
        self.next();
    }
}

/// Split a command line into arguments.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = line.chars().collect();
    let mut args = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '"' | '\'' => {
                let mut arg = String::new();
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => {
                            return Err(QuarryError::invalid_argument(format!(
                                "unterminated quote starting at {i}"
                            )));
                        }
                        Some('\\') if matches!(chars.get(j + 1), Some(&n) if n == c || n == '\\') => {
                            arg.push(chars[j + 1]);
                            j += 2;
                        }
                        Some(&q) if q == c => break,
                        Some(&other) => {
                            arg.push(other);
                            j += 1;
                        }
                    }
                }
                args.push(arg);
                i = j + 1;
            }
            '{' | '[' => {
                let end = json_end(&chars, i)?;
                args.push(chars[i..end].iter().collect());
                i = end;
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                args.push(chars[start..i].iter().collect());
            }
        }
    }
    Ok(args)
}

/// End (exclusive) of the balanced JSON value starting at `start`.
fn json_end(chars: &[char], start: usize) -> Result<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &c) in chars.iter().enumerate().skip(start) {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            _ => {}
        }
    }
    Err(QuarryError::invalid_argument(format!(
        "unbalanced JSON starting at {start}"
    )))
}
