//! Publish/subscribe tools: publish, pubsub_channels.
//!
//! Subscribing is not offered: a subscribed connection stops answering
//! ordinary commands, and every tool shares one connection.

use kvbridge_core::Result;
use kvbridge_store::{Command, Reply};

use super::{int_reply, plural, strings_reply};
use crate::args::ValidatedArguments;
use crate::schema::{FieldSpec, FieldType, ToolDefinition};

pub(super) const PUBLISH: ToolDefinition = ToolDefinition {
    name: "publish",
    description: "Publish a message to a channel",
    fields: &[
        FieldSpec::required("channel", FieldType::String, "Channel name"),
        FieldSpec::required("message", FieldType::String, "Message to publish"),
    ],
    command: publish_command,
    render: publish_render,
};

pub(super) const PUBSUB_CHANNELS: ToolDefinition = ToolDefinition {
    name: "pubsub_channels",
    description: "List active channels, optionally filtered by a glob pattern",
    fields: &[FieldSpec::optional(
        "pattern",
        FieldType::String,
        "Glob pattern to match channels against",
    )],
    command: channels_command,
    render: channels_render,
};

fn publish_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("PUBLISH")
        .arg(args.str("channel")?)
        .arg(args.str("message")?))
}

fn publish_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let receivers = int_reply("publish", reply)?;
    Ok(format!(
        "Message published to channel {}, received by {}",
        args.str("channel")?,
        plural(usize::try_from(receivers).unwrap_or(0), "subscriber")
    ))
}

fn channels_command(args: &ValidatedArguments) -> Result<Command> {
    let mut cmd = Command::new("PUBSUB").arg("CHANNELS");
    if let Some(pattern) = args.opt_str("pattern") {
        cmd = cmd.arg(pattern);
    }
    Ok(cmd)
}

fn channels_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let channels = strings_reply("pubsub_channels", reply)?;
    if channels.is_empty() {
        return Ok(match args.opt_str("pattern") {
            Some(pattern) => format!("No active channels matching pattern: {pattern}"),
            None => "No active channels".to_string(),
        });
    }
    Ok(format!("Active channels:\n{}", channels.join("\n")))
}
