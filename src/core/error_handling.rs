//! Error reporting helpers shared by the CLI and the library's error types
//!
//! Library code never terminates the process. Errors bubble up to the binary, which
//! decides how much detail to show based on whether the user can act on the error.

/// Distinguishes errors the user can fix (bad descriptor, missing file) from
/// system failures (library load errors, runtime problems).
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True if the error carries a message the user can act on directly
    fn is_user_actionable(&self) -> bool;

    /// The actionable message, if any
    fn user_message(&self) -> Option<String>;
}

/// Log an error with a level of detail suited to its kind.
///
/// User-actionable errors are logged with their specific message. System errors are
/// logged with the operation context only, the full error going to debug level.
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log::error!("{}: {}", operation_context, user_msg);
        }
        _ => {
            log::error!("{} failed", operation_context);
        }
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Process exit code for an error that reached the top of the CLI.
///
/// User errors exit with 2 (usage/input problem), system errors with 1.
pub fn exit_code_for<E: ContextualError>(error: &E) -> i32 {
    if error.is_user_actionable() {
        2
    } else {
        1
    }
}
