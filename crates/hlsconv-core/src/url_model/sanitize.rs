//! Linux-safe names for output files and batch folders.

/// Linux NAME_MAX in bytes.
const NAME_MAX: usize = 255;

/// Makes `name` safe as a single path component on Linux.
///
/// Separators, NUL, control characters and whitespace become `_` (runs
/// collapse to one); leading/trailing dots and underscores are trimmed so the
/// result can never be `.`, `..` or hidden. Truncated to 255 bytes on a char
/// boundary. May return an empty string.
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let unsafe_char = c == '/' || c == '\\' || c.is_control() || c.is_whitespace();
        if !unsafe_char {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
