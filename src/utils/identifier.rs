/// Prefix shared by every generated employee identifier.
pub const PREFIX: &str = "EMP";

/// Digits the sequence is zero-padded to.
const WIDTH: usize = 6;

/// Format a sequence number as a public employee identifier.
pub fn format_identifier(sequence: u64) -> String {
    format!("{}{:0width$}", PREFIX, sequence, width = WIDTH)
}

/// Extract the sequence number from an identifier such as `EMP000042`.
///
/// Anything without the prefix or with a non-numeric tail yields `None`.
pub fn parse_sequence(identifier: &str) -> Option<u64> {
    let digits = identifier.strip_prefix(PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next identifier after the highest sequence currently stored.
pub fn next_identifier(current_max: Option<u64>) -> String {
    format_identifier(current_max.unwrap_or(0) + 1)
}

/// Highest sequence among a set of stored identifiers.
pub fn max_sequence<'a, I>(identifiers: I) -> Option<u64>
where
    I: IntoIterator<Item = &'a str>,
{
    identifiers.into_iter().filter_map(parse_sequence).max()
}
