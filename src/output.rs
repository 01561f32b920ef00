use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `LANGDEX_QUIET=1` suppresses human-oriented terminal output.
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("LANGDEX_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
