//! Error types for kuber
//!
//! Errors carry enough context to tell the caller which resource was at fault
//! (for compile-time problems) or what the cluster tool reported (for apply
//! problems). Nothing is retried: every error goes straight back to the caller.

use thiserror::Error;

/// Main error type for kuber operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A resource invariant was violated when compiling it
    #[error("configuration error for {kind} '{name}': {constraint}")]
    Configuration {
        /// Kind of the offending resource (e.g. "HorizontalPodAutoscaler")
        kind: String,
        /// Name of the offending resource
        name: String,
        /// The violated constraint (e.g. "minReplicas (5) must not exceed maxReplicas (2)")
        constraint: String,
    },

    /// A compiled document could not be serialized
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The document kind being serialized (if known)
        kind: Option<String>,
    },

    /// The external cluster tool is not on the execution path
    #[error("tool not found: {tool} (install it or pass its path explicitly)")]
    ToolNotFound {
        /// Program that could not be spawned
        tool: String,
    },

    /// The external apply exited nonzero
    ///
    /// The stream is applied as a whole, so this cannot say which document was
    /// rejected, and objects earlier in the stream may already exist.
    #[error("apply failed (exit code {}): {}", exit_code_label(.exit_code), .stderr.trim())]
    Apply {
        /// Process exit code, `None` if terminated by a signal
        exit_code: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// Filesystem or process I/O failure
    #[error("io error [{context}]: {source}")]
    Io {
        /// What was being done (e.g. "write manifest stream")
        context: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// A stack file could not be loaded
    #[error("invalid stack file {path}: {message}")]
    InvalidStack {
        /// Path of the stack file
        path: String,
        /// Description of what's invalid
        message: String,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl Error {
    /// Create a configuration error for a resource
    pub fn configuration(
        kind: impl Into<String>,
        name: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            kind: kind.into(),
            name: name.into(),
            constraint: constraint.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with document kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a tool-not-found error
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create an apply error from captured process output
    pub fn apply(
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Apply {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a stack file error
    pub fn invalid_stack(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidStack {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Kind and name of the resource this error is about, if any
    pub fn resource(&self) -> Option<(&str, &str)> {
        match self {
            Error::Configuration { kind, name, .. } => Some((kind, name)),
            _ => None,
        }
    }

    /// Whether the caller can fix this by changing its input
    ///
    /// Configuration, serialization and stack errors are input problems.
    /// Missing tools, I/O failures and rejected applies depend on the
    /// environment or the cluster.
    pub fn is_user_fixable(&self) -> bool {
        match self {
            Error::Configuration { .. } => true,
            Error::Serialization { .. } => true,
            Error::InvalidStack { .. } => true,
            Error::ToolNotFound { .. } => false,
            Error::Apply { .. } => false,
            Error::Io { .. } => false,
        }
    }
}
