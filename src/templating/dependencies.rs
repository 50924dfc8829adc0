//! Include-directive extraction.
//!
//! Dependencies are found by matching the raw template text, not by asking the
//! template engine: an engine's compiled namespace knows which templates refer
//! to each other but not in which direction, while the text of a template
//! names exactly the templates it includes.
//!
//! The directive has the shape `{{ template "<registry path>" <args> }}` in
//! every format. The same pattern drives [`rewrite_includes`], which turns each
//! directive into the equivalent tera include before a source is handed to its
//! namespace.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static INCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{-?\s*template\s*"([^"\s]+)".*?\}\}"#).expect("include pattern is valid")
});

/// Return the registry paths named by include directives in `source`, in
/// order of appearance.
///
/// Repeated includes of the same path are returned once per occurrence.
///
/// # Examples
///
/// ```rust
/// use viewscan::templating::extract_includes;
///
/// let source = r#"{{ template "app/views/header.html.tera" . }}<main>{{ template "app/views/nav.html.tera" }}</main>"#;
/// assert_eq!(
///     extract_includes(source),
///     vec!["app/views/header.html.tera", "app/views/nav.html.tera"]
/// );
/// ```
pub fn extract_includes(source: &str) -> Vec<String> {
    INCLUDE_PATTERN
        .captures_iter(source)
        .filter_map(|captures| captures.get(1))
        .map(|path| path.as_str().to_string())
        .collect()
}

/// Replace every include directive with a tera include of the same path.
///
/// An include of a path the namespace does not hold fails when the including
/// template is executed. Arguments after the path are dropped: tera includes
/// share the including template's context.
pub fn rewrite_includes(source: &str) -> Cow<'_, str> {
    INCLUDE_PATTERN.replace_all(source, r#"{% include "${1}" %}"#)
}
