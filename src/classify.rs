//! Reduce captured output to the validator's status marker
//!
//! The validated program always ends its run by printing a single status line,
//! possibly followed by blank lines and preceded by arbitrary diagnostics.

/// Split captured bytes into lines, decoding lossily as UTF-8.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes).lines().map(str::to_string).collect()
}

/// Return the last line that is not blank after trimming, trimmed.
pub fn last_nonblank_line<I, S>(lines: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut last = None;
    for line in lines {
        let trimmed = line.as_ref().trim();
        if !trimmed.is_empty() {
            last = Some(trimmed.to_string());
        }
    }
    if let Some(line) = &last {
        tracing::debug!("Last Line:{}", line);
    }
    last
}
