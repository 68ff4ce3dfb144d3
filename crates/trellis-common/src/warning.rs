//! Deduplicated layout warnings.
//!
//! Layout never fails, but it does meet input it can only approximate
//! (orthogonal writing modes, block boxes inside inlines, stale ids).
//! Those cases are reported through `log::warn!`, once per unique message,
//! so a document that repeats the same construct does not flood the log.

use std::collections::HashSet;
use std::sync::Mutex;

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about degraded or unsupported input (logs once per unique message)
///
/// # Example
/// ```ignore
/// warn_once("Layout", "orthogonal writing mode treated as parallel flow");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    // A poisoned set only loses deduplication; the warning still goes out.
    let should_log = WARNED.lock().map_or(true, |mut guard| {
        guard.get_or_insert_with(HashSet::new).insert(key)
    });

    if should_log {
        log::warn!(target: "trellis", "[{component}] {message}");
    }
}

/// Returns true if `message` has already been reported for `component`.
#[must_use]
pub fn was_warned(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    WARNED
        .lock()
        .is_ok_and(|guard| guard.as_ref().is_some_and(|set| set.contains(&key)))
}

/// Clear all recorded warnings (call before laying out a new document)
pub fn clear_warnings() {
    if let Ok(mut guard) = WARNED.lock()
        && let Some(set) = guard.as_mut()
    {
        set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_records_message() {
        warn_once("Test", "first sighting of a unique construct");
        assert!(was_warned("Test", "first sighting of a unique construct"));
        assert!(!was_warned("Other", "first sighting of a unique construct"));
    }

    #[test]
    fn test_repeated_warning_is_recorded_once() {
        warn_once("Test", "repeated construct");
        warn_once("Test", "repeated construct");
        let count = WARNED
            .lock()
            .ok()
            .and_then(|guard| {
                guard
                    .as_ref()
                    .map(|set| set.iter().filter(|k| k.contains("repeated construct")).count())
            })
            .unwrap_or_default();
        assert_eq!(count, 1);
    }
}
