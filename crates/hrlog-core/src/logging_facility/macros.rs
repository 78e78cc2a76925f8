//! Canonical logging macros
//!
//! Every macro stamps `component`, `op` and `event` so that captured events
//! can be matched on the same keys regardless of which module emitted them.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use hrlog_core::log_op_start;
/// log_op_start!("commit_edits");
/// log_op_start!("commit_edits", entity_id = "emp-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::log_schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::log_schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use hrlog_core::log_op_end;
/// log_op_end!("commit_edits", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::log_schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::log_schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// The error is converted into [`ExError`](crate::errors::ExError) so the
/// stable code is always present.
///
/// # Example
///
/// ```
/// # use hrlog_core::log_op_error;
/// # use hrlog_core::errors::PersistError;
/// let err = PersistError::Backend { message: "gone".to_string() };
/// log_op_error!("audit_append", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::log_schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::log_schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            $($field)*
        );
    }};
}

/// Log a degradation step (eviction tier, memory-only fallback)
///
/// # Example
///
/// ```
/// # use hrlog_core::log_op_degraded;
/// log_op_degraded!("audit_append", tier = "tier1", entity_id = "emp-1");
/// ```
#[macro_export]
macro_rules! log_op_degraded {
    ($op:expr, $($field:tt)*) => {
        tracing::warn!(
            component = module_path!(),
            op = $op,
            event = $crate::log_schema::EVENT_DEGRADED,
            $($field)*
        );
    };
}
