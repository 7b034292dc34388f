//! Error types for the tools module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::Tool;

/// Errors that can occur while running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Program binary not found.
    #[error("{tool} program not found at path: {program}")]
    NotFound { tool: Tool, program: PathBuf },

    /// Process exited with a non-zero status.
    #[error("{tool} exited with code {code:?}")]
    Failed {
        tool: Tool,
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// Process succeeded but its declared output is missing.
    #[error("{tool} did not produce {path}")]
    MissingOutput { tool: Tool, path: PathBuf },

    /// Process exceeded its deadline and was killed.
    #[error("{tool} timed out after {timeout_secs} seconds")]
    Timeout { tool: Tool, timeout_secs: u64 },

    /// Invalid invocation arguments.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: Tool, reason: String },

    /// I/O error while spawning or waiting.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Creates a failed error, keeping stderr only when non-empty.
    pub fn failed(tool: Tool, code: Option<i32>, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        Self::Failed {
            tool,
            code,
            stderr: if stderr.trim().is_empty() {
                None
            } else {
                Some(stderr)
            },
        }
    }

    /// The tool that failed, when known.
    pub fn tool(&self) -> Option<Tool> {
        match self {
            Self::NotFound { tool, .. }
            | Self::Failed { tool, .. }
            | Self::MissingOutput { tool, .. }
            | Self::Timeout { tool, .. }
            | Self::InvalidArguments { tool, .. } => Some(*tool),
            Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_drops_blank_stderr() {
        let err = ToolError::failed(Tool::Composite, Some(1), "  \n");
        assert!(matches!(err, ToolError::Failed { stderr: None, .. }));

        let err = ToolError::failed(Tool::Composite, Some(1), "ERROR 4: no such file");
        assert!(matches!(err, ToolError::Failed { stderr: Some(_), .. }));
    }

    #[test]
    fn test_display_names_tool() {
        let err = ToolError::Timeout {
            tool: Tool::Tile,
            timeout_secs: 30,
        };
        assert_eq!(err.to_string(), "gdal2tiles timed out after 30 seconds");
        assert_eq!(err.tool(), Some(Tool::Tile));
    }
}
