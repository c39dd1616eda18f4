//! Hash tools: hset, hget, hgetall.

use kvbridge_core::Result;
use kvbridge_store::{Command, Reply};

use super::{int_reply, pairs_reply, text_reply, KEY};
use crate::args::ValidatedArguments;
use crate::schema::{FieldSpec, FieldType, ToolDefinition};

const FIELD: FieldSpec = FieldSpec::required("field", FieldType::String, "Hash field name");

pub(super) const HSET: ToolDefinition = ToolDefinition {
    name: "hset",
    description: "Set a field in a hash",
    fields: &[
        KEY,
        FIELD,
        FieldSpec::required("value", FieldType::String, "Value to store"),
    ],
    command: hset_command,
    render: hset_render,
};

pub(super) const HGET: ToolDefinition = ToolDefinition {
    name: "hget",
    description: "Get the value of a field in a hash",
    fields: &[KEY, FIELD],
    command: hget_command,
    render: hget_render,
};

pub(super) const HGETALL: ToolDefinition = ToolDefinition {
    name: "hgetall",
    description: "Get all fields and values in a hash",
    fields: &[KEY],
    command: hgetall_command,
    render: hgetall_render,
};

fn hset_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("HSET")
        .arg(args.str("key")?)
        .arg(args.str("field")?)
        .arg(args.str("value")?))
}

fn hset_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    int_reply("hset", reply)?;
    Ok(format!(
        "Successfully set field {} in hash {}",
        args.str("field")?,
        args.str("key")?
    ))
}

fn hget_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("HGET")
        .arg(args.str("key")?)
        .arg(args.str("field")?))
}

fn hget_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    match text_reply("hget", reply)? {
        Some(value) => Ok(value),
        None => Ok(format!(
            "Field {} not found in hash {}",
            args.str("field")?,
            args.str("key")?
        )),
    }
}

fn hgetall_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("HGETALL").arg(args.str("key")?))
}

fn hgetall_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let pairs = pairs_reply("hgetall", reply)?;
    if pairs.is_empty() {
        return Ok(format!("Hash {} not found or empty", args.str("key")?));
    }
    Ok(pairs
        .iter()
        .map(|(field, value)| format!("{field}: {value}"))
        .collect::<Vec<_>>()
        .join("\n"))
}
