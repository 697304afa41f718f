//! Structured logging schema and field name constants for noteshare.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log tooling can query by standardized names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request's remote calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "app", "auth", "storage", "data", "catalog", "upload"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "rest_auth", "rest_data", "orchestrator", "probes"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "sign_in", "list_notes", "upload_object", "insert_note"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Authenticated user UUID.
pub const USER_ID: &str = "user_id";

/// Storage object key.
pub const OBJECT_PATH: &str = "object_path";

/// Catalog search query text.
pub const QUERY: &str = "query";

/// Category filter value.
pub const CATEGORY: &str = "category";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a catalog query.
pub const RESULT_COUNT: &str = "result_count";

/// Upload payload size in bytes.
pub const FILE_SIZE: &str = "file_size";

/// Refresh-counter epoch a catalog read was served under.
pub const REFRESH_EPOCH: &str = "refresh_epoch";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Set when the catalog served the locally-filtered fallback page.
pub const FALLBACK: &str = "fallback";

/// Upload orchestrator phase at the time of the event.
pub const PHASE: &str = "phase";
