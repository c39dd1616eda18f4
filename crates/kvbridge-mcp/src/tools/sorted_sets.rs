//! Sorted set tools: zadd, zrange, zrem, zscore, zrank.

use kvbridge_core::Result;
use kvbridge_store::{Command, Reply};

use super::{int_reply, pairs_reply, plural, strings_reply, text_reply, KEY};
use crate::args::{format_number, ValidatedArguments};
use crate::schema::{DefaultValue, FieldSpec, FieldType, ToolDefinition};

const MEMBER: FieldSpec = FieldSpec::required("member", FieldType::String, "Member name");

pub(super) const ZADD: ToolDefinition = ToolDefinition {
    name: "zadd",
    description: "Add a member to a sorted set, or update its score",
    fields: &[
        KEY,
        FieldSpec::required("score", FieldType::Number, "Score for the member"),
        MEMBER,
    ],
    command: zadd_command,
    render: zadd_render,
};

pub(super) const ZRANGE: ToolDefinition = ToolDefinition {
    name: "zrange",
    description: "Get members of a sorted set by rank range, lowest score first",
    fields: &[
        KEY,
        FieldSpec::required("min", FieldType::Number, "Start rank"),
        FieldSpec::required("max", FieldType::Number, "Stop rank (inclusive)"),
        FieldSpec::optional("withScores", FieldType::Boolean, "Include scores")
            .with_default(DefaultValue::Bool(false)),
    ],
    command: zrange_command,
    render: zrange_render,
};

pub(super) const ZREM: ToolDefinition = ToolDefinition {
    name: "zrem",
    description: "Remove one or more members from a sorted set",
    fields: &[
        KEY,
        FieldSpec::required(
            "member",
            FieldType::StringOrArray,
            "Member or array of members",
        ),
    ],
    command: zrem_command,
    render: zrem_render,
};

pub(super) const ZSCORE: ToolDefinition = ToolDefinition {
    name: "zscore",
    description: "Get the score of a member in a sorted set",
    fields: &[KEY, MEMBER],
    command: zscore_command,
    render: zscore_render,
};

pub(super) const ZRANK: ToolDefinition = ToolDefinition {
    name: "zrank",
    description: "Get the rank of a member in a sorted set, lowest score first",
    fields: &[KEY, MEMBER],
    command: zrank_command,
    render: zrank_render,
};

fn not_found(args: &ValidatedArguments) -> Result<String> {
    Ok(format!(
        "Member {} not found in sorted set {}",
        args.str("member")?,
        args.str("key")?
    ))
}

// ---------------------------------------------------------------------------
// zadd
// ---------------------------------------------------------------------------

fn zadd_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("ZADD")
        .arg(args.str("key")?)
        .arg(format_number(args.number("score")?))
        .arg(args.str("member")?))
}

fn zadd_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let added = int_reply("zadd", reply)?;
    let key = args.str("key")?;
    let member = args.str("member")?;
    let score = format_number(args.number("score")?);
    if added > 0 {
        Ok(format!(
            "Added member {member} with score {score} to sorted set {key}"
        ))
    } else {
        Ok(format!(
            "Updated score of member {member} in sorted set {key} to {score}"
        ))
    }
}

// ---------------------------------------------------------------------------
// zrange
// ---------------------------------------------------------------------------

fn zrange_command(args: &ValidatedArguments) -> Result<Command> {
    let mut cmd = Command::new("ZRANGE")
        .arg(args.str("key")?)
        .arg(format_number(args.number("min")?))
        .arg(format_number(args.number("max")?));
    if args.bool("withScores")? {
        cmd = cmd.arg("WITHSCORES");
    }
    Ok(cmd)
}

fn zrange_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let lines: Vec<String> = if args.bool("withScores")? {
        pairs_reply("zrange", flatten_pairs(reply))?
            .into_iter()
            .map(|(member, score)| format!("{member}: {score}"))
            .collect()
    } else {
        strings_reply("zrange", reply)?
    };

    if lines.is_empty() {
        return Ok(format!(
            "No members found in sorted set {} for range [{}, {}]",
            args.str("key")?,
            format_number(args.number("min")?),
            format_number(args.number("max")?)
        ));
    }
    Ok(lines.join("\n"))
}

/// RESP3 answers `WITHSCORES` with `[[member, score], ...]`; flatten it to
/// the RESP2 `[member, score, ...]` layout.
fn flatten_pairs(reply: Reply) -> Reply {
    match reply {
        Reply::Array(items)
            if !items.is_empty()
                && items
                    .iter()
                    .all(|item| matches!(item, Reply::Array(pair) if pair.len() == 2)) =>
        {
            Reply::Array(
                items
                    .into_iter()
                    .flat_map(|item| match item {
                        Reply::Array(pair) => pair,
                        other => vec![other],
                    })
                    .collect(),
            )
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// zrem
// ---------------------------------------------------------------------------

fn zrem_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("ZREM")
        .arg(args.str("key")?)
        .args(args.items("member")?.values()))
}

fn zrem_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    let removed = int_reply("zrem", reply)?;
    let key = args.str("key")?;
    let members = args.items("member")?;
    Ok(match members.as_scalar() {
        Some(member) if removed > 0 => {
            format!("Removed member {member} from sorted set {key}")
        }
        Some(member) => format!("Member {member} not found in sorted set {key}"),
        None => format!(
            "Removed {removed} of {} from sorted set {key}",
            plural(members.len(), "member")
        ),
    })
}

// ---------------------------------------------------------------------------
// zscore / zrank
// ---------------------------------------------------------------------------

fn zscore_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("ZSCORE")
        .arg(args.str("key")?)
        .arg(args.str("member")?))
}

fn zscore_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    match text_reply("zscore", reply)? {
        Some(score) => Ok(score),
        None => not_found(args),
    }
}

fn zrank_command(args: &ValidatedArguments) -> Result<Command> {
    Ok(Command::new("ZRANK")
        .arg(args.str("key")?)
        .arg(args.str("member")?))
}

fn zrank_render(args: &ValidatedArguments, reply: Reply) -> Result<String> {
    match text_reply("zrank", reply)? {
        Some(rank) => Ok(rank),
        None => not_found(args),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::{command_for, render_for};
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zadd() {
        let args = json!({"key": "Z", "score": 5, "member": "m"});
        assert_eq!(command_for("zadd", args.clone()).to_string(), "ZADD Z 5 m");
        assert_eq!(
            render_for("zadd", args.clone(), Reply::Int(1)).unwrap(),
            "Added member m with score 5 to sorted set Z"
        );
        assert_eq!(
            render_for("zadd", args, Reply::Int(0)).unwrap(),
            "Updated score of member m in sorted set Z to 5"
        );
    }

    #[test]
    fn test_zadd_zero_and_fractional_scores() {
        let args = json!({"key": "Z", "score": 0, "member": "m"});
        assert_eq!(command_for("zadd", args).to_string(), "ZADD Z 0 m");
        let args = json!({"key": "Z", "score": 2.5, "member": "m"});
        assert_eq!(command_for("zadd", args).to_string(), "ZADD Z 2.5 m");
    }

    #[test]
    fn test_zrange_members() {
        let args = json!({"key": "Z", "min": 0, "max": -1});
        assert_eq!(command_for("zrange", args.clone()).to_string(), "ZRANGE Z 0 -1");
        let reply = Reply::Array(vec![Reply::Bulk("a".into()), Reply::Bulk("b".into())]);
        assert_eq!(render_for("zrange", args.clone(), reply).unwrap(), "a\nb");
        assert_eq!(
            render_for("zrange", args, Reply::Array(vec![])).unwrap(),
            "No members found in sorted set Z for range [0, -1]"
        );
    }

    #[test]
    fn test_zrange_with_scores() {
        let args = json!({"key": "Z", "min": 0, "max": -1, "withScores": true});
        assert_eq!(
            command_for("zrange", args.clone()).to_string(),
            "ZRANGE Z 0 -1 WITHSCORES"
        );

        let flat = Reply::Array(vec![
            Reply::Bulk("a".into()),
            Reply::Bulk("1".into()),
            Reply::Bulk("b".into()),
            Reply::Bulk("2.5".into()),
        ]);
        assert_eq!(
            render_for("zrange", args.clone(), flat).unwrap(),
            "a: 1\nb: 2.5"
        );

        let nested = Reply::Array(vec![
            Reply::Array(vec![Reply::Bulk("a".into()), Reply::Double(1.0)]),
            Reply::Array(vec![Reply::Bulk("b".into()), Reply::Double(2.5)]),
        ]);
        assert_eq!(render_for("zrange", args, nested).unwrap(), "a: 1\nb: 2.5");
    }

    #[test]
    fn test_zrem() {
        let args = json!({"key": "Z", "member": ["a", "b"]});
        assert_eq!(command_for("zrem", args.clone()).to_string(), "ZREM Z a b");
        assert_eq!(
            render_for("zrem", args, Reply::Int(2)).unwrap(),
            "Removed 2 of 2 members from sorted set Z"
        );
        assert_eq!(
            render_for("zrem", json!({"key": "Z", "member": "a"}), Reply::Int(1)).unwrap(),
            "Removed member a from sorted set Z"
        );
    }

    #[test]
    fn test_zscore() {
        let args = json!({"key": "Z", "member": "m"});
        assert_eq!(command_for("zscore", args.clone()).to_string(), "ZSCORE Z m");
        assert_eq!(
            render_for("zscore", args.clone(), Reply::Bulk("5".into())).unwrap(),
            "5"
        );
        assert_eq!(
            render_for("zscore", args.clone(), Reply::Double(5.0)).unwrap(),
            "5"
        );
        assert_eq!(
            render_for("zscore", args, Reply::Nil).unwrap(),
            "Member m not found in sorted set Z"
        );
    }

    #[test]
    fn test_zrank() {
        let args = json!({"key": "Z", "member": "m"});
        assert_eq!(command_for("zrank", args.clone()).to_string(), "ZRANK Z m");
        assert_eq!(render_for("zrank", args.clone(), Reply::Int(0)).unwrap(), "0");
        assert_eq!(
            render_for("zrank", args, Reply::Nil).unwrap(),
            "Member m not found in sorted set Z"
        );
    }
}
