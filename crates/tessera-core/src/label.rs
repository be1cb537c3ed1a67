//! Synthetic output labels.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LABEL: AtomicU64 = AtomicU64::new(1);

/// Mints a process-unique label such as `value_17` or `select_3`.
pub(crate) fn next_label(prefix: &str) -> String {
    let n = NEXT_LABEL.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_unique() {
        let a = next_label("value");
        let b = next_label("value");
        assert_ne!(a, b);
        assert!(a.starts_with("value_"));
        assert!(next_label("upper").starts_with("upper_"));
    }
}
