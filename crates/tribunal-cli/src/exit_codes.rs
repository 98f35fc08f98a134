//! Process exit codes. Part of the public contract for CI wrappers.

use tribunal_core::EvalError;

pub const SUCCESS: i32 = 0;
/// The run finished, but at least one item has no judgment.
pub const ITEMS_FAILED: i32 = 1;
/// Configuration, corpus or alignment error. No report was written.
pub const FATAL: i32 = 2;

pub fn for_error(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<EvalError>() {
        Some(inner) if !inner.is_fatal() => ITEMS_FAILED,
        _ => FATAL,
    }
}
