//! The tool table.
//!
//! [`TOOLS`] is the one authoritative list of tools, in the order they are
//! advertised. Each family module contributes its [`ToolDefinition`]s along
//! with their command builders and renderers.

mod hashes;
mod lists;
mod pubsub;
mod sets;
mod sorted_sets;
mod strings;

use kvbridge_core::{Error, Result};
use kvbridge_store::Reply;

use crate::schema::{FieldSpec, FieldType, ToolDefinition};

/// Every tool, in registration order.
pub static TOOLS: &[ToolDefinition] = &[
    strings::SET,
    strings::GET,
    strings::DELETE,
    strings::LIST,
    strings::INCR,
    strings::EXPIRE,
    hashes::HSET,
    hashes::HGET,
    hashes::HGETALL,
    lists::LPUSH,
    lists::RPUSH,
    lists::LPOP,
    lists::RPOP,
    lists::LRANGE,
    sets::SADD,
    sets::SREM,
    sets::SMEMBERS,
    sorted_sets::ZADD,
    sorted_sets::ZRANGE,
    sorted_sets::ZREM,
    sorted_sets::ZSCORE,
    sorted_sets::ZRANK,
    pubsub::PUBLISH,
    pubsub::PUBSUB_CHANNELS,
];

/// Look up a tool by name.
pub fn find(name: &str) -> Option<&'static ToolDefinition> {
    TOOLS.iter().find(|tool| tool.name == name)
}

// ---------------------------------------------------------------------------
// Shared fields
// ---------------------------------------------------------------------------

const KEY: FieldSpec = FieldSpec::required("key", FieldType::String, "Key name");

// ---------------------------------------------------------------------------
// Reply helpers
// ---------------------------------------------------------------------------

fn int_reply(tool: &str, reply: Reply) -> Result<i64> {
    reply
        .into_int()
        .map_err(|other| Error::unexpected_reply(tool, other))
}

fn text_reply(tool: &str, reply: Reply) -> Result<Option<String>> {
    reply
        .into_text()
        .map_err(|other| Error::unexpected_reply(tool, other))
}

fn strings_reply(tool: &str, reply: Reply) -> Result<Vec<String>> {
    reply
        .into_strings()
        .map_err(|other| Error::unexpected_reply(tool, other))
}

fn pairs_reply(tool: &str, reply: Reply) -> Result<Vec<(String, String)>> {
    reply
        .into_pairs()
        .map_err(|other| Error::unexpected_reply(tool, other))
}

fn status_reply(tool: &str, reply: Reply) -> Result<()> {
    match reply {
        Reply::Status(_) => Ok(()),
        other => Err(Error::unexpected_reply(tool, other)),
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::args::ValidatedArguments;
    use kvbridge_store::Command;
    use serde_json::{Map, Value};
    use std::collections::HashSet;

    /// Validate `args` for `tool` and build its command.
    pub(crate) fn command_for(tool: &str, args: Value) -> Command {
        let (definition, validated) = validated(tool, args);
        (definition.command)(&validated).unwrap()
    }

    /// Validate `args` for `tool` and render `reply`.
    pub(crate) fn render_for(tool: &str, args: Value, reply: Reply) -> Result<String> {
        let (definition, validated) = validated(tool, args);
        (definition.render)(&validated, reply)
    }

    fn validated(tool: &str, args: Value) -> (&'static ToolDefinition, ValidatedArguments) {
        let definition = find(tool).unwrap();
        let map: Map<String, Value> = match args {
            Value::Object(map) => map,
            _ => unreachable!("arguments must be an object"),
        };
        let validated = definition.validate(Some(&map)).unwrap();
        (definition, validated)
    }

    #[test]
    fn test_table_names_are_unique() {
        let names: HashSet<_> = TOOLS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOOLS.len());
        assert_eq!(TOOLS.len(), 24);
    }

    #[test]
    fn test_find() {
        assert_eq!(find("get").unwrap().name, "get");
        assert!(find("flushall").is_none());
        assert!(find("GET").is_none());
    }

    #[test]
    fn test_every_tool_has_object_schema() {
        for tool in TOOLS {
            let schema = tool.input_schema();
            assert_eq!(schema["type"], "object", "{}", tool.name);
            assert!(!tool.description.is_empty(), "{}", tool.name);
        }
    }

    #[test]
    fn test_dual_shape_fields() {
        let dual: Vec<(&str, &str)> = TOOLS
            .iter()
            .flat_map(|t| {
                t.fields
                    .iter()
                    .filter(|f| f.ty == FieldType::StringOrArray)
                    .map(move |f| (t.name, f.name))
            })
            .collect();
        assert_eq!(
            dual,
            vec![
                ("delete", "key"),
                ("lpush", "value"),
                ("rpush", "value"),
                ("sadd", "member"),
                ("srem", "member"),
                ("zrem", "member"),
            ]
        );
    }

    #[test]
    fn test_reply_helpers_report_tool() {
        let err = int_reply("incr", Reply::Bulk("x".into())).unwrap_err();
        let Error::UnexpectedReply { tool, .. } = err else {
            unreachable!();
        };
        assert_eq!(tool, "incr");
        assert!(status_reply("set", Reply::Int(1)).is_err());
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "key"), "1 key");
        assert_eq!(plural(0, "key"), "0 keys");
        assert_eq!(plural(3, "subscriber"), "3 subscribers");
    }
}
