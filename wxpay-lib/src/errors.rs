//! Error types for gateway operations.
//!
//! Every failure in the core is returned to the immediate caller as a
//! [`WxPayError`]. Nothing is retried or swallowed internally; callers can use
//! [`WxPayError::category`] and [`WxPayError::is_retryable`] to decide what
//! to do next.

/// Numeric error codes, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum WxPayErrorCode {
    /// Feature not compiled in
    Unimplemented = 1000,
    /// Transport/network layer error
    Transport = 2000,
    /// Connection failed
    ConnectionFailed = 2001,
    /// Connection timeout
    ConnectionTimeout = 2002,
    /// Non-2xx HTTP status
    HttpStatus = 2003,
    /// Client configuration invalid
    InvalidConfig = 3000,
    /// Gateway and client identity disagree
    IdentityMismatch = 3001,
    /// Required one-of parameter missing
    MissingOneOf = 4000,
    /// Mutually exclusive parameters both present
    ConflictingParams = 4001,
    /// Required parameter missing
    MissingParam = 4002,
    /// Parameter outside the allow-list
    UnexpectedParam = 4003,
    /// Unknown `sign_type` value
    UnsupportedSignType = 4004,
    /// Typed read of an absent field
    MissingField = 4005,
    /// Typed read of a field holding another type
    TypeMismatch = 4006,
    /// Carried signature absent
    MissingSignature = 5000,
    /// Carried signature differs from the recomputed one
    SignatureMismatch = 5001,
    /// Status field absent from a response
    MissingStatus = 6000,
    /// `return_code` was not SUCCESS
    ReturnFailed = 6001,
    /// `result_code` was not SUCCESS
    ResultFailed = 6002,
    /// Malformed XML in either direction
    Xml = 7000,
    /// Notification without `req_info`
    MissingReqInfo = 8000,
    /// `req_info` was not valid base64
    Base64 = 8001,
    /// Cipher-text length not a whole number of blocks
    CipherLength = 8002,
    /// PKCS#7 padding invalid after decryption
    Padding = 8003,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Coarse grouping of errors, mirroring how callers react to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller supplied a bad parameter set. Never retried.
    Validation,
    /// Integrity failure. Always fatal.
    Signature,
    /// Propagated from the transport collaborator.
    Transport,
    /// The gateway reported a non-success status.
    Protocol,
    /// Malformed XML.
    Codec,
    /// Failure in the notification decryption pipeline.
    Crypto,
    /// Client configuration problem.
    Config,
    /// Internal/unexpected error.
    Internal,
}

/// Comprehensive error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum WxPayError {
    /// Feature not compiled in.
    #[error("{0} is not available in this build")]
    Unimplemented(&'static str),

    /// Transport/network layer error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Connection failed.
    #[error("connection to {target} failed: {reason}")]
    ConnectionFailed {
        /// Target URL
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Connection timeout.
    #[error("{operation} timed out after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// The gateway answered with a non-success HTTP status.
    #[error("gateway responded with HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Client configuration is incomplete or invalid.
    #[error("invalid config {field}: {reason}")]
    InvalidConfig {
        /// Offending field
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A field in a gateway message names another merchant or app.
    #[error("{field} mismatch: expected {expected}, got {actual}")]
    IdentityMismatch {
        /// Field compared (`appid` or `mch_id`)
        field: &'static str,
        /// Value configured on the client
        expected: String,
        /// Value carried by the message
        actual: String,
    },

    /// None of a one-of parameter group is present.
    #[error("need one of {}", .0.join("/"))]
    MissingOneOf(Vec<String>),

    /// More than one of a one-of parameter group is present.
    #[error("more than one of {}", .0.join("/"))]
    ConflictingParams(Vec<String>),

    /// A required parameter is missing.
    #[error("missing required parameter `{0}`")]
    MissingParam(String),

    /// A parameter is not accepted by the operation.
    #[error("unexpected parameter `{0}`")]
    UnexpectedParam(String),

    /// `sign_type` names an algorithm the gateway does not define.
    #[error("unsupported sign_type `{0}`")]
    UnsupportedSignType(String),

    /// A typed read found no value for the key.
    #[error("field `{0}` not present")]
    MissingField(String),

    /// A typed read found a value of another type.
    #[error("field `{field}` is not {expected}")]
    TypeMismatch {
        /// Field read
        field: String,
        /// Type the caller asked for
        expected: &'static str,
    },

    /// A message that must be signed carries no `sign` field.
    #[error("message carries no signature")]
    MissingSignature,

    /// The carried signature differs from the recomputed one.
    #[error("signature verification failed")]
    SignatureMismatch,

    /// A response lacks one of its status fields.
    #[error("response without {0}")]
    MissingStatus(&'static str),

    /// `return_code` was not SUCCESS; carries the gateway's `return_msg`.
    #[error("{message}")]
    ReturnFailed {
        /// Gateway-supplied message
        message: String,
    },

    /// `result_code` was not SUCCESS; carries `err_code` and `err_code_des`.
    #[error("{message}")]
    ResultFailed {
        /// Gateway error code, if supplied
        code: Option<String>,
        /// Gateway error description
        message: String,
    },

    /// Malformed or unterminated XML, or a field that does not fit its schema type.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// A refund notification without the encrypted `req_info` field.
    #[error("notification without req_info")]
    MissingReqInfo,

    /// `req_info` is not valid base64.
    #[error("req_info is not valid base64: {0}")]
    Base64(String),

    /// Cipher-text length is zero or not a multiple of the block size.
    #[error("cipher-text length {0} is not a positive multiple of the block size")]
    CipherLength(usize),

    /// Padding bytes were invalid after decryption (usually a wrong key).
    #[error("invalid padding after decryption")]
    Padding,

    /// Internal/unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WxPayError {
    /// Get the numeric error code.
    pub fn code(&self) -> WxPayErrorCode {
        match self {
            Self::Unimplemented(_) => WxPayErrorCode::Unimplemented,
            Self::Transport(_) => WxPayErrorCode::Transport,
            Self::ConnectionFailed { .. } => WxPayErrorCode::ConnectionFailed,
            Self::ConnectionTimeout { .. } => WxPayErrorCode::ConnectionTimeout,
            Self::HttpStatus { .. } => WxPayErrorCode::HttpStatus,
            Self::InvalidConfig { .. } => WxPayErrorCode::InvalidConfig,
            Self::IdentityMismatch { .. } => WxPayErrorCode::IdentityMismatch,
            Self::MissingOneOf(_) => WxPayErrorCode::MissingOneOf,
            Self::ConflictingParams(_) => WxPayErrorCode::ConflictingParams,
            Self::MissingParam(_) => WxPayErrorCode::MissingParam,
            Self::UnexpectedParam(_) => WxPayErrorCode::UnexpectedParam,
            Self::UnsupportedSignType(_) => WxPayErrorCode::UnsupportedSignType,
            Self::MissingField(_) => WxPayErrorCode::MissingField,
            Self::TypeMismatch { .. } => WxPayErrorCode::TypeMismatch,
            Self::MissingSignature => WxPayErrorCode::MissingSignature,
            Self::SignatureMismatch => WxPayErrorCode::SignatureMismatch,
            Self::MissingStatus(_) => WxPayErrorCode::MissingStatus,
            Self::ReturnFailed { .. } => WxPayErrorCode::ReturnFailed,
            Self::ResultFailed { .. } => WxPayErrorCode::ResultFailed,
            Self::Xml(_) => WxPayErrorCode::Xml,
            Self::MissingReqInfo => WxPayErrorCode::MissingReqInfo,
            Self::Base64(_) => WxPayErrorCode::Base64,
            Self::CipherLength(_) => WxPayErrorCode::CipherLength,
            Self::Padding => WxPayErrorCode::Padding,
            Self::Internal(_) => WxPayErrorCode::Internal,
        }
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingOneOf(_)
            | Self::ConflictingParams(_)
            | Self::MissingParam(_)
            | Self::UnexpectedParam(_)
            | Self::UnsupportedSignType(_)
            | Self::MissingField(_)
            | Self::TypeMismatch { .. } => ErrorCategory::Validation,
            Self::MissingSignature | Self::SignatureMismatch => ErrorCategory::Signature,
            Self::Transport(_)
            | Self::ConnectionFailed { .. }
            | Self::ConnectionTimeout { .. }
            | Self::HttpStatus { .. } => ErrorCategory::Transport,
            Self::MissingStatus(_)
            | Self::ReturnFailed { .. }
            | Self::ResultFailed { .. }
            | Self::IdentityMismatch { .. } => ErrorCategory::Protocol,
            Self::Xml(_) => ErrorCategory::Codec,
            Self::MissingReqInfo | Self::Base64(_) | Self::CipherLength(_) | Self::Padding => {
                ErrorCategory::Crypto
            }
            Self::InvalidConfig { .. } => ErrorCategory::Config,
            Self::Unimplemented(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Get the error message as an owned String.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns true if a surrounding layer may reasonably retry the call.
    ///
    /// Only transport failures qualify; the core never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::ConnectionFailed { .. } | Self::ConnectionTimeout { .. } => {
                true
            }
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Create a transport error from any error type.
    pub fn transport<E: std::error::Error>(err: E) -> Self {
        Self::Transport(err.to_string())
    }

    /// Create an invalid config error.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a lock-poisoned internal error.
    pub(crate) fn lock_poisoned(context: &str) -> Self {
        Self::Internal(format!("lock poisoned during {}", context))
    }
}

impl From<serde_json::Error> for WxPayError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_config("json", err.to_string())
    }
}

impl From<quick_xml::Error> for WxPayError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<std::io::Error> for WxPayError {
    fn from(err: std::io::Error) -> Self {
        Self::Xml(err.to_string())
    }
}
