//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across every log line the
//! reconciler emits, so downstream log processing can filter on them.

// Canonical field keys read back by log capture
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_SNAPSHOT: &str = "snapshot";
pub const FIELD_SERIAL_NUMBER: &str = "serial_number";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_PHASE: &str = "phase";
pub const EVENT_CREATE: &str = "create";
pub const EVENT_UPDATE: &str = "update";
pub const EVENT_LINK: &str = "link";
pub const EVENT_SKIP: &str = "skip";
pub const EVENT_FAILED: &str = "failed";
