/// Characters that never need quoting in a POSIX shell word
fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '_' | '.' | '/' | ':' | '@' | '=' | '+' | ',' | '%')
}

/// Quote a single argument so a POSIX shell reads it back as one word.
///
/// Plain tokens are returned untouched; anything else is wrapped in single
/// quotes with embedded single quotes spelled `'\''`.
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if arg.chars().all(is_plain) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', "'\\''"))
}

/// Join an argument vector into one command line a shell splits back into
/// the same vector.
pub fn quote_args<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|a| quote_arg(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
