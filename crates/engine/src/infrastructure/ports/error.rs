//! Error types for port operations.

/// Key-value store errors with context for debugging.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Store unreachable or the operation failed - includes operation name for tracing.
    #[error("Store error in {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    /// Stored value could not be encoded or decoded.
    #[error("Serialization error for {key}: {message}")]
    Serialization { key: String, message: String },
}

impl StoreError {
    /// Create a Backend error with operation context.
    pub fn backend(operation: &'static str, message: impl ToString) -> Self {
        Self::Backend {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error for a key.
    pub fn serialization(key: impl Into<String>, message: impl ToString) -> Self {
        Self::Serialization {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

/// Cluster controller failures. Always non-fatal to the coordinator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ControllerError {
    #[error("Failed to create {resource} for {worker}: {message}")]
    Create {
        worker: String,
        resource: &'static str,
        message: String,
    },
    #[error("Failed to delete {worker}: {message}")]
    Delete { worker: String, message: String },
    #[error("Controller unavailable: {0}")]
    Unavailable(String),
}

/// Region description RPC failures. Always turned into a fallback description.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    #[error("Failed to reach {endpoint}: {message}")]
    Connect { endpoint: String, message: String },
    #[error("Worker {endpoint} answered {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
    #[error("Worker {endpoint} did not answer within {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::backend("get", "connection refused");
        assert_eq!(err.to_string(), "Store error in get: connection refused");

        let err = StoreError::serialization("navigator:default", "expected value");
        assert!(err.to_string().contains("navigator:default"));
    }

    #[test]
    fn test_rpc_timeout_message() {
        let err = RpcError::Timeout {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_ms: 5000,
        };
        assert_eq!(
            err.to_string(),
            "Worker http://127.0.0.1:9 did not answer within 5000ms"
        );
    }
}
