//! Configured MCP server specification and its JSON field mapping.

use super::{HttpKind, HttpTransport, ServerConfigDomainError, ServerId, ServerTransport, StdioTransport};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field names owned by the `stdio` transport variant.
pub(crate) const STDIO_FIELDS: [&str; 3] = ["command", "args", "env"];

/// Field names owned by the remote transport variant.
pub(crate) const HTTP_FIELDS: [&str; 2] = ["url", "headers"];

/// One configured MCP backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    id: ServerId,
    display_name: String,
    transport: ServerTransport,
}

impl ServerSpec {
    /// Creates a specification whose display name defaults to its id.
    #[must_use]
    pub fn new(id: ServerId, transport: ServerTransport) -> Self {
        Self {
            display_name: id.as_str().to_owned(),
            id,
            transport,
        }
    }

    /// Sets the display name; blank names fall back to the id.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let normalized = name.into().trim().to_owned();
        if !normalized.is_empty() {
            self.display_name = normalized;
        }
        self
    }

    /// Builds a specification from the transport fields of a stored entry.
    ///
    /// An explicit `type` of `stdio`, `http`, or `sse` selects the variant.
    /// Without a type, a `command` selects `stdio` and a `url` alone selects
    /// a remote transport of kind [`HttpKind::Auto`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigDomainError`] when the entry declares neither a
    /// command nor a url, names an unsupported type, carries a malformed url,
    /// or has fields of the wrong JSON type.
    pub fn from_fields(
        id: ServerId,
        display_name: Option<&str>,
        fields: &Map<String, Value>,
    ) -> Result<Self, ServerConfigDomainError> {
        let declared_type = optional_string(fields, "type")?
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty());
        let command = optional_string(fields, "command")?;
        let url = optional_string(fields, "url")?.filter(|value| !value.trim().is_empty());

        let transport = match declared_type.as_deref() {
            Some("stdio") => {
                let stdio_command = command.ok_or(ServerConfigDomainError::MissingCommand)?;
                ServerTransport::Stdio(stdio_from_fields(stdio_command, fields)?)
            }
            Some("http") => http_from_fields(url, HttpKind::Http, fields)?,
            Some("sse") => http_from_fields(url, HttpKind::Sse, fields)?,
            Some(other) => {
                return Err(ServerConfigDomainError::UnsupportedTransportType(
                    other.to_owned(),
                ));
            }
            None => match (command, url) {
                (Some(stdio_command), _) => {
                    ServerTransport::Stdio(stdio_from_fields(stdio_command, fields)?)
                }
                (None, remote_url @ Some(_)) => http_from_fields(remote_url, HttpKind::Auto, fields)?,
                (None, None) => return Err(ServerConfigDomainError::MissingEndpoint),
            },
        };

        let spec = Self::new(id, transport);
        Ok(match display_name {
            Some(name) => spec.with_display_name(name),
            None => spec,
        })
    }

    /// Renders the transport as configuration fields.
    ///
    /// Every field owned by the active variant is emitted, so merging the
    /// result onto an older entry fully replaces the transport while leaving
    /// unrelated keys alone.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match &self.transport {
            ServerTransport::Stdio(stdio) => {
                fields.insert("type".to_owned(), Value::from("stdio"));
                fields.insert("command".to_owned(), Value::from(stdio.command()));
                fields.insert(
                    "args".to_owned(),
                    Value::Array(stdio.args().iter().map(|arg| Value::from(arg.as_str())).collect()),
                );
                fields.insert("env".to_owned(), string_map_value(stdio.env()));
            }
            ServerTransport::Http(http) => {
                if let Some(kind) = http.kind().as_type_field() {
                    fields.insert("type".to_owned(), Value::from(kind));
                }
                fields.insert("url".to_owned(), Value::from(http.url().as_str()));
                fields.insert("headers".to_owned(), string_map_value(http.headers()));
            }
        }
        fields
    }

    /// Returns field names that belong to the inactive transport variant.
    pub(crate) const fn foreign_fields(&self) -> &'static [&'static str] {
        match self.transport {
            ServerTransport::Stdio(_) => &HTTP_FIELDS,
            ServerTransport::Http(_) => &STDIO_FIELDS,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> &ServerId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns whether the display name differs from the id.
    #[must_use]
    pub fn has_custom_display_name(&self) -> bool {
        self.display_name != self.id.as_str()
    }

    /// Returns the transport configuration.
    #[must_use]
    pub const fn transport(&self) -> &ServerTransport {
        &self.transport
    }
}

fn stdio_from_fields(
    command: String,
    fields: &Map<String, Value>,
) -> Result<StdioTransport, ServerConfigDomainError> {
    Ok(StdioTransport::new(command)
        .with_args(string_list(fields, "args")?)
        .with_env(string_map(fields, "env")?))
}

fn http_from_fields(
    declared_url: Option<String>,
    kind: HttpKind,
    fields: &Map<String, Value>,
) -> Result<ServerTransport, ServerConfigDomainError> {
    let url = declared_url.ok_or(ServerConfigDomainError::MissingUrl)?;
    let transport = HttpTransport::new(&url, kind)?.with_headers(string_map(fields, "headers")?);
    Ok(ServerTransport::Http(transport))
}

fn optional_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ServerConfigDomainError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ServerConfigDomainError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

fn string_list(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, ServerConfigDomainError> {
    let invalid = ServerConfigDomainError::InvalidField {
        field,
        expected: "an array of strings",
    };
    match fields.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_owned).ok_or_else(|| invalid.clone()))
            .collect(),
        Some(_) => Err(invalid),
    }
}

/// Reads a string-to-string object; numeric and boolean values are
/// stringified because hand-edited configs commonly contain them.
fn string_map(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<BTreeMap<String, String>, ServerConfigDomainError> {
    let invalid = ServerConfigDomainError::InvalidField {
        field,
        expected: "an object of string values",
    };
    match fields.get(field) {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(key, value)| match value {
                Value::String(text) => Ok((key.clone(), text.clone())),
                Value::Number(number) => Ok((key.clone(), number.to_string())),
                Value::Bool(flag) => Ok((key.clone(), flag.to_string())),
                _ => Err(invalid.clone()),
            })
            .collect(),
        Some(_) => Err(invalid),
    }
}

fn string_map_value(values: &BTreeMap<String, String>) -> Value {
    Value::Object(
        values
            .iter()
            .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
            .collect(),
    )
}
