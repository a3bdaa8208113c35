use inventory_core_types::RequestId;
use thiserror::Error;

use crate::model::ResourceKind;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and reporting to the caller that delivered the
/// reconcile trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    InvalidResourceType,
    NotFound,
    AlreadyExists,

    // Payload
    /// The snapshot's rawData could not be decoded into device descriptors
    PayloadDecode,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Control
    /// The caller cancelled the invocation
    Cancelled,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidResourceType => "ERR_INVALID_RESOURCE_TYPE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::PayloadDecode => "ERR_PAYLOAD_DECODE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind plus optional context describing which
/// operation, resource, and device the failure relates to.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    resource_kind: Option<ResourceKind>,
    entity_id: Option<String>,
    serial_number: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            resource_kind: None,
            entity_id: None,
            serial_number: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add resource kind context
    pub fn with_resource_kind(mut self, kind: ResourceKind) -> Self {
        self.resource_kind = Some(kind);
        self
    }

    /// Add entity (uid) context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add device serial number context
    pub fn with_serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// True when the invocation was aborted by its cancellation token
    pub fn is_cancelled(&self) -> bool {
        self.kind == ExErrorKind::Cancelled
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn resource_kind(&self) -> Option<ResourceKind> {
        self.resource_kind
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(kind) = self.resource_kind {
            write!(f, " (kind: {})", kind)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (uid: {})", entity_id)?;
        }
        if let Some(serial) = &self.serial_number {
            write!(f, " (serial_number: {})", serial)?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for inventory operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InventoryError {
    /// A resource of the given kind does not exist in the store
    #[error("{kind} not found: {uid}")]
    ResourceNotFound { kind: ResourceKind, uid: String },

    /// A resource with the same kind and uid is already stored
    #[error("{kind} already exists: {uid}")]
    ResourceAlreadyExists { kind: ResourceKind, uid: String },

    /// The trigger payload is not the resource shape the reconciler handles
    #[error("invalid resource type: expected {expected}, got {found}")]
    InvalidResourceType { expected: ResourceKind, found: String },

    /// The snapshot rawData is not an array of device descriptors
    #[error("failed to parse rawData: {message}")]
    PayloadDecode { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// The invocation was cancelled before the operation could run
    #[error("operation cancelled: {op}")]
    Cancelled { op: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from InventoryError to ExError
impl From<InventoryError> for ExError {
    fn from(err: InventoryError) -> Self {
        let message = err.to_string();
        match err {
            InventoryError::ResourceNotFound { kind, uid } => ExError::new(ExErrorKind::NotFound)
                .with_resource_kind(kind)
                .with_entity_id(uid)
                .with_message(message),

            InventoryError::ResourceAlreadyExists { kind, uid } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_resource_kind(kind)
                    .with_entity_id(uid)
                    .with_message(message)
            }

            InventoryError::InvalidResourceType { expected, .. } => {
                ExError::new(ExErrorKind::InvalidResourceType)
                    .with_resource_kind(expected)
                    .with_message(message)
            }

            InventoryError::PayloadDecode { .. } => {
                ExError::new(ExErrorKind::PayloadDecode).with_message(message)
            }

            InventoryError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            InventoryError::Cancelled { op } => ExError::new(ExErrorKind::Cancelled)
                .with_op(op)
                .with_message("cancelled by caller"),

            InventoryError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to InventoryError
impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Serialization {
            message: err.to_string(),
        }
    }
}
