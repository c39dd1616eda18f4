//! Mapping from kvbridge errors to MCP protocol errors.

use kvbridge_core::Error;
use rmcp::model::ErrorData;
use serde_json::json;

/// Converts a kvbridge error into an MCP `ErrorData`.
///
/// Lookup and validation failures are the caller's fault and become
/// `invalid_params`; everything else is reported as `internal_error`.
pub trait McpErrorExt {
    /// Convert into an MCP error.
    fn to_mcp_error(&self) -> ErrorData;
}

impl McpErrorExt for Error {
    fn to_mcp_error(&self) -> ErrorData {
        match self {
            Error::UnknownTool { name } => {
                ErrorData::invalid_params(self.to_string(), Some(json!({ "tool": name })))
            }
            Error::InvalidArguments { field, reason } => ErrorData::invalid_params(
                self.to_string(),
                Some(json!({ "field": field, "reason": reason })),
            ),
            Error::NotConnected { state } => ErrorData::internal_error(
                self.to_string(),
                Some(json!({ "state": state.to_string() })),
            ),
            _ => ErrorData::internal_error(self.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvbridge_core::ConnectionState;
    use rmcp::model::ErrorCode;

    #[test]
    fn test_unknown_tool_is_invalid_params() {
        let err = Error::unknown_tool("flushall").to_mcp_error();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "Unknown tool: flushall");
    }

    #[test]
    fn test_invalid_arguments_carry_field_and_reason() {
        let err = Error::invalid_argument("key", "missing required field").to_mcp_error();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(
            err.data,
            Some(json!({"field": "key", "reason": "missing required field"}))
        );
    }

    #[test]
    fn test_store_errors_are_internal() {
        let err = Error::upstream("WRONGTYPE Operation against a key holding the wrong kind of value")
            .to_mcp_error();
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
        assert!(err.message.contains("WRONGTYPE"));

        let err = Error::NotConnected {
            state: ConnectionState::Connecting,
        }
        .to_mcp_error();
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
        assert_eq!(err.data, Some(json!({"state": "connecting"})));

        let err = Error::unexpected_reply("get", "x").to_mcp_error();
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    }
}
