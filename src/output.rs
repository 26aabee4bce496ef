//! Console output helpers.

use std::io::{self, Write};

use serde::Serialize;

use crate::error::Result;

/// Pretty-prints `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Truncates `s` to `max` characters, appending `...` when cut.
#[must_use]
pub fn limit(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit() {
        assert_eq!(limit("short", 80), "short");
        assert_eq!(limit("abcdef", 3), "abc...");
        assert_eq!(limit("abc", 3), "abc");
        assert_eq!(limit("ééé", 2), "éé...");
    }
}
