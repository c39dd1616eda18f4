//! Set tools: sadd, srem, smembers.

use kvbridge_core::Result;
use kvbridge_store::{Command, Reply};

use super::{int_reply, plural, strings_reply, KEY};
use crate::args::ValidatedArguments;
use crate::schema::{FieldSpec, FieldType, ToolDefinition};

const MEMBERS: FieldSpec = FieldSpec::required(
    "member",
    FieldType::StringOrArray,
    "Member or array of members",
);

pub(super) const SADD: ToolDefinition = ToolDefinition {
    name: "sadd",
    description: "Add one or more members to a set",
    fields: &[KEY, MEMBERS],
    command: sadd_command,
    render: sadd_render,
};

pub(super) const SREM: ToolDefinition = ToolDefinition {
    name: "srem",
    description: "Remove one or more members from a set",
    fields: &[KEY, MEMBERS],
    command: srem_command,
    render: srem_render,
};

pub(super) const SMEMBERS: ToolDefinition = ToolDefinition {
    name: "smembers",
    description: "Get all members of a set",
    fields: &[KEY],
    command: smembers_command,
    render: smembers_render,
};

fn sadd_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("SADD")
        .arg(args.str("key")?)
        .args(args.items("member")?.values()))
}

fn sadd_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let added = int_reply("sadd", reply)?;
    let key = args.str("key")?;
    let members = args.items("member")?;
    Ok(match members.as_scalar() {
        Some(member) if added > 0 => format!("Added member {member} to set {key}"),
        Some(member) => format!("Member {member} already exists in set {key}"),
        None => format!(
            "Added {added} of {} to set {key}",
            plural(members.len(), "member")
        ),
    })
}

fn srem_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("SREM")
        .arg(args.str("key")?)
        .args(args.items("member")?.values()))
}

fn srem_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let removed = int_reply("srem", reply)?;
    let key = args.str("key")?;
    let members = args.items("member")?;
    Ok(match members.as_scalar() {
        Some(member) if removed > 0 => format!("Removed member {member} from set {key}"),
        Some(member) => format!("Member {member} not found in set {key}"),
        None => format!(
            "Removed {removed} of {} from set {key}",
            plural(members.len(), "member")
        ),
    })
}

fn smembers_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("SMEMBERS").arg(args.str("key")?))
}

fn smembers_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let members = strings_reply("smembers", reply)?;
    if members.is_empty() {
        return Ok(format!(
            "Set {} is empty or does not exist",
            args.str("key")?
        ));
    }
    Ok(members.join("\n"))
}
