//! List tools: lpush, rpush, lpop, rpop, lrange.

use kvbridge_core::Result;
use kvbridge_store::{Command, Reply};

use super::{int_reply, plural, strings_reply, text_reply, KEY};
use crate::args::{format_number, ValidatedArguments};
use crate::schema::{FieldSpec, FieldType, ToolDefinition};

const VALUES: FieldSpec = FieldSpec::required(
    "value",
    FieldType::StringOrArray,
    "Value or array of values to push",
);

pub(super) const LPUSH: ToolDefinition = ToolDefinition {
    name: "lpush",
    description: "Push one or more values onto the head of a list",
    fields: &[KEY, VALUES],
    command: lpush_command,
    render: lpush_render,
};

pub(super) const RPUSH: ToolDefinition = ToolDefinition {
    name: "rpush",
    description: "Push one or more values onto the tail of a list",
    fields: &[KEY, VALUES],
    command: rpush_command,
    render: rpush_render,
};

pub(super) const LPOP: ToolDefinition = ToolDefinition {
    name: "lpop",
    description: "Remove and return the first element of a list",
    fields: &[KEY],
    command: lpop_command,
    render: lpop_render,
};

pub(super) const RPOP: ToolDefinition = ToolDefinition {
    name: "rpop",
    description: "Remove and return the last element of a list",
    fields: &[KEY],
    command: rpop_command,
    render: rpop_render,
};

pub(super) const LRANGE: ToolDefinition = ToolDefinition {
    name: "lrange",
    description: "Get a range of elements from a list (negative indices count from the end)",
    fields: &[
        KEY,
        FieldSpec::required("start", FieldType::Number, "Start index"),
        FieldSpec::required("stop", FieldType::Number, "Stop index (inclusive)"),
    ],
    command: lrange_command,
    render: lrange_render,
};

// ---------------------------------------------------------------------------
// push
// ---------------------------------------------------------------------------

fn push_command(verb: &'static str, args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new(verb)
        .arg(args.str("key")?)
        .args(args.items("value")?.values()))
}

fn push_render(
    tool: &str,
    end: &str,
    args: &ValidatedArguments,
    reply: Reply,
) -> Result<String> {
    let length = int_reply(tool, reply)?;
    let key = args.str("key")?;
    let values = args.items("value")?;
    let pushed = if values.as_scalar().is_some() {
        "value".to_string()
    } else {
        plural(values.len(), "value")
    };
    Ok(format!(
        "Successfully pushed {pushed} to {end} of list {key}. New length: {length}"
    ))
}

fn lpush_command(args: &ValidatedArguments) -> Result<Command> {
    push_command("LPUSH", args)
}

fn lpush_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    push_render("lpush", "head", args, reply)
}

fn rpush_command(args: &ValidatedArguments) -> Result<Command> {
    push_command("RPUSH", args)
}

fn rpush_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    push_render("rpush", "tail", args, reply)
}

// ---------------------------------------------------------------------------
// pop
// ---------------------------------------------------------------------------

fn pop_render(tool: &str, args: &ValidatedArguments, reply: Reply) -> Result<String> {
    match text_reply(tool, reply)? {
        Some(value) => Ok(value),
        None => Ok(format!(
            "List {} is empty or does not exist",
            args.str("key")?
        )),
    }
}

fn lpop_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("LPOP").arg(args.str("key")?))
}

fn lpop_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    pop_render("lpop", args, reply)
}

fn rpop_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("RPOP").arg(args.str("key")?))
}

fn rpop_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    pop_render("rpop", args, reply)
}

// ---------------------------------------------------------------------------
// lrange
// ---------------------------------------------------------------------------

fn lrange_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("LRANGE")
        .arg(args.str("key")?)
        .arg(format_number(args.number("start")?))
        .arg(format_number(args.number("stop")?)))
}

fn lrange_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let items = strings_reply("lrange", reply)?;
    if items.is_empty() {
        return Ok(format!(
            "No elements found in list {} for range [{}, {}]",
            args.str("key")?,
            format_number(args.number("start")?),
            format_number(args.number("stop")?)
        ));
    }
    Ok(items.join("\n"))
}
