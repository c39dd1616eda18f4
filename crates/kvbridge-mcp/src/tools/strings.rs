//! Plain key tools: set, get, delete, list, incr, expire.

use kvbridge_core::Result;
use kvbridge_store::{Command, Reply};

use super::{int_reply, plural, status_reply, strings_reply, text_reply, KEY};
use crate::args::{format_number, ValidatedArguments};
use crate::schema::{DefaultValue, FieldSpec, FieldType, ToolDefinition};

pub(super) const SET: ToolDefinition = ToolDefinition {
    name: "set",
    description: "Set a string value, optionally with an expiration in seconds",
    fields: &[
        KEY,
        FieldSpec::required("value", FieldType::String, "Value to store"),
        FieldSpec::optional(
            "expireSeconds",
            FieldType::Number,
            "Expiration time in seconds",
        ),
    ],
    command: set_command,
    render: set_render,
};

pub(super) const GET: ToolDefinition = ToolDefinition {
    name: "get",
    description: "Get the string value of a key",
    fields: &[KEY],
    command: get_command,
    render: get_render,
};

pub(super) const DELETE: ToolDefinition = ToolDefinition {
    name: "delete",
    description: "Delete one key or several keys",
    fields: &[FieldSpec::required(
        "key",
        FieldType::StringOrArray,
        "Key or array of keys to delete",
    )],
    command: delete_command,
    render: delete_render,
};

pub(super) const LIST: ToolDefinition = ToolDefinition {
    name: "list",
    description: "List keys matching a glob pattern",
    fields: &[FieldSpec::optional(
        "pattern",
        FieldType::String,
        "Glob pattern to match keys against",
    )
    .with_default(DefaultValue::Str("*"))],
    command: list_command,
    render: list_render,
};

pub(super) const INCR: ToolDefinition = ToolDefinition {
    name: "incr",
    description: "Increment the integer value of a key by one",
    fields: &[KEY],
    command: incr_command,
    render: incr_render,
};

pub(super) const EXPIRE: ToolDefinition = ToolDefinition {
    name: "expire",
    description: "Set a key's time to live in seconds",
    fields: &[
        KEY,
        FieldSpec::required("seconds", FieldType::Number, "Time to live in seconds"),
    ],
    command: expire_command,
    render: expire_render,
};

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

fn set_command(args: &ValidatedArguments) -> Result<Command> {
    let mut cmd = Command::new("SET")
        .arg(args.str("key")?)
        .arg(args.str("value")?);
    if let Some(seconds) = args.opt_number("expireSeconds") {
        cmd = cmd.arg("EX").arg(format_number(seconds));
    }
    Ok(cmd)
}

fn set_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    status_reply("set", reply)?;
    let key = args.str("key")?;
    Ok(match args.opt_number("expireSeconds") {
        Some(seconds) => format!(
            "Successfully set key: {key} (expires in {} seconds)",
            format_number(seconds)
        ),
        None => format!("Successfully set key: {key}"),
    })
}

// ---------------------------------------------------------------------------
// get
// ---------------------------------------------------------------------------

fn get_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("GET").arg(args.str("key")?))
}

fn get_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    match text_reply("get", reply)? {
        Some(value) => Ok(value),
        None => Ok(format!("Key not found: {}", args.str("key")?)),
    }
}

// ---------------------------------------------------------------------------
// delete
// ---------------------------------------------------------------------------

fn delete_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("DEL").args(args.items("key")?.values()))
}

fn delete_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    int_reply("delete", reply)?;
    let keys = args.items("key")?;
    Ok(match keys.as_scalar() {
        Some(key) => format!("Successfully deleted key: {key}"),
        None => format!(
            "Successfully deleted {}: {}",
            plural(keys.len(), "key"),
            keys.values().join(", ")
        ),
    })
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("KEYS").arg(args.str("pattern")?))
}

fn list_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let keys = strings_reply("list", reply)?;
    if keys.is_empty() {
        return Ok(format!(
            "No keys found matching pattern: {}",
            args.str("pattern")?
        ));
    }
    Ok(format!("Found keys:\n{}", keys.join("\n")))
}

// ---------------------------------------------------------------------------
// incr
// ---------------------------------------------------------------------------

fn incr_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("INCR").arg(args.str("key")?))
}

fn incr_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let value = int_reply("incr", reply)?;
    Ok(format!("Incremented key {} to {value}", args.str("key")?))
}

// ---------------------------------------------------------------------------
// expire
// ---------------------------------------------------------------------------

fn expire_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("EXPIRE")
        .arg(args.str("key")?)
        .arg(format_number(args.number("seconds")?)))
}

fn expire_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let key = args.str("key")?;
    if int_reply("expire", reply)? == 1 {
        Ok(format!(
            "Successfully set expiration of {} seconds for key: {key}",
            format_number(args.number("seconds")?)
        ))
    } else {
        Ok(format!(
            "Failed to set expiration: key {key} does not exist"
        ))
    }
}
