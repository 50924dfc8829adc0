//! Allow-list filtering of untrusted markup.
//!
//! The sanitizer runs the `html5ever` tokenizer over the input and filters the
//! token stream in a single pass. Allowed tags are re-emitted with their
//! attribute list reduced to allowed names, text is re-escaped, and everything
//! else is dropped. Tags on the deny-list (`script`, `style`, `iframe`, ...)
//! put the filter into an ignore state in which the whole subtree, text
//! included, is discarded until the matching close tag.
//!
//! Sanitizing never fails. When the input is malformed in a way the
//! tokenizer cannot complete (it ends inside a tag or comment) or is larger
//! than [`MAX_MARKUP_SIZE`], the output is cut off at the last token emitted
//! and the result reports [`Sanitized::is_truncated`].
//!
//! # Examples
//!
//! ```rust
//! use viewscan::sanitize::{sanitize_with, strip};
//!
//! let clean = sanitize_with("<script>alert(1)</script><p>hi</p>", ["p"], [] as [&str; 0]);
//! assert_eq!(clean.as_str(), "<p>hi</p>");
//!
//! assert_eq!(strip("<b>bold</b> and <i>text</i>").as_str(), "bold and text");
//! ```

pub mod policy;

pub use policy::{
    DEFAULT_ALLOWED_ATTRIBUTES, DEFAULT_ALLOWED_TAGS, DEFAULT_IGNORED_TAGS, SanitizePolicy,
    SanitizerConfig,
};

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::fmt;

/// Largest input filtered in full; longer input is cut at this many bytes.
pub const MAX_MARKUP_SIZE: usize = 5_000_000;

/// Output of a sanitizer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    html: String,
    truncated: Option<String>,
}

impl Sanitized {
    /// The filtered markup.
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    /// Whether the output stops early because the input could not be
    /// tokenized to the end.
    pub fn is_truncated(&self) -> bool {
        self.truncated.is_some()
    }

    /// Why the output was truncated, if it was.
    pub fn truncation_reason(&self) -> Option<&str> {
        self.truncated.as_deref()
    }
}

impl fmt::Display for Sanitized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

/// A reusable filter bound to one [`SanitizePolicy`].
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    policy: SanitizePolicy,
}

impl Sanitizer {
    #[must_use]
    pub const fn new(policy: SanitizePolicy) -> Self {
        Self {
            policy,
        }
    }

    /// A sanitizer that keeps text only.
    #[must_use]
    pub fn stripping() -> Self {
        Self::new(SanitizePolicy::strip())
    }

    pub fn policy(&self) -> &SanitizePolicy {
        &self.policy
    }

    /// Filter `input` with this sanitizer's policy.
    pub fn sanitize(&self, input: &str) -> Sanitized {
        let (input, oversized) = limit_size(input);

        let mut tokenizer = Tokenizer::new(FilterSink::new(&self.policy), TokenizerOpts::default());
        let mut queue = BufferQueue::default();
        queue.push_back(StrTendril::from_slice(input));
        let _ = tokenizer.feed(&mut queue);
        tokenizer.end();

        let sink = tokenizer.sink;
        let truncated = if oversized {
            Some(format!("input exceeds {MAX_MARKUP_SIZE} bytes"))
        } else {
            sink.truncated
        };

        if let Some(reason) = &truncated {
            tracing::warn!("Sanitized markup truncated: {}", reason);
        }

        Sanitized {
            html: sink.output,
            truncated,
        }
    }
}

/// Sanitize with the default allow-lists and deny-list.
pub fn sanitize(input: &str) -> Sanitized {
    Sanitizer::default().sanitize(input)
}

/// Sanitize with explicit tag and attribute allow-lists and the default
/// deny-list.
pub fn sanitize_with<T, A, S1, S2>(input: &str, allowed_tags: T, allowed_attributes: A) -> Sanitized
where
    T: IntoIterator<Item = S1>,
    A: IntoIterator<Item = S2>,
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    let policy = SanitizePolicy::default()
        .with_allowed_tags(allowed_tags)
        .with_allowed_attributes(allowed_attributes);
    Sanitizer::new(policy).sanitize(input)
}

/// Remove every tag, keeping only text outside deny-listed elements.
pub fn strip(input: &str) -> Sanitized {
    Sanitizer::stripping().sanitize(input)
}

fn limit_size(input: &str) -> (&str, bool) {
    if input.len() <= MAX_MARKUP_SIZE {
        return (input, false);
    }
    let mut end = MAX_MARKUP_SIZE;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Name of the deny-listed element being suppressed and how many open
/// elements of that name are pending.
#[derive(Debug)]
struct Ignored {
    name: String,
    depth: usize,
}

struct FilterSink<'a> {
    policy: &'a SanitizePolicy,
    output: String,
    ignoring: Option<Ignored>,
    last_error: Option<String>,
    truncated: Option<String>,
}

impl<'a> FilterSink<'a> {
    fn new(policy: &'a SanitizePolicy) -> Self {
        Self {
            policy,
            output: String::new(),
            ignoring: None,
            last_error: None,
            truncated: None,
        }
    }

    fn process_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        let content_model = match tag.kind {
            TagKind::StartTag => content_model(&tag.name),
            TagKind::EndTag => None,
        };

        match tag.kind {
            // Raw-text elements ignore the self-closing flag, as browsers do.
            TagKind::StartTag if tag.self_closing && content_model.is_none() => {
                self.self_closing_tag(&tag);
            }
            TagKind::StartTag => self.start_tag(&tag),
            TagKind::EndTag => self.end_tag(&tag),
        }

        content_model.unwrap_or(TokenSinkResult::Continue)
    }

    fn start_tag(&mut self, tag: &Tag) {
        let name: &str = &tag.name;

        if let Some(ignored) = &mut self.ignoring {
            if ignored.name == name {
                ignored.depth += 1;
            }
            return;
        }

        if self.policy.ignores_tag(name) {
            self.ignoring = Some(Ignored {
                name: name.to_string(),
                depth: 1,
            });
        } else if self.policy.allows_tag(name) {
            self.write_tag(tag, false);
        }
    }

    fn self_closing_tag(&mut self, tag: &Tag) {
        if self.ignoring.is_some() {
            self.leave_ignored(&tag.name);
            return;
        }

        // A self-closed deny-listed element has no subtree to suppress.
        if !self.policy.ignores_tag(&tag.name) && self.policy.allows_tag(&tag.name) {
            self.write_tag(tag, true);
        }
    }

    fn end_tag(&mut self, tag: &Tag) {
        if self.ignoring.is_some() {
            self.leave_ignored(&tag.name);
            return;
        }

        if !self.policy.ignores_tag(&tag.name) && self.policy.allows_tag(&tag.name) {
            self.output.push_str("</");
            self.output.push_str(&tag.name);
            self.output.push('>');
        }
    }

    fn leave_ignored(&mut self, name: &str) {
        if let Some(ignored) = &mut self.ignoring
            && ignored.name == name
        {
            ignored.depth -= 1;
            if ignored.depth == 0 {
                self.ignoring = None;
            }
        }
    }

    fn write_tag(&mut self, tag: &Tag, self_closing: bool) {
        self.output.push('<');
        self.output.push_str(&tag.name);

        let policy = self.policy;
        let mut attributes = tag
            .attrs
            .iter()
            .filter(|attribute| policy.allows_attribute(&attribute.name.local))
            .peekable();

        if attributes.peek().is_some() {
            self.output.push(' ');
            for attribute in attributes {
                self.output.push_str(&attribute.name.local);
                self.output.push_str("=\"");
                escape_attribute(&attribute.value, &mut self.output);
                self.output.push_str("\" ");
            }
        }

        if self_closing {
            self.output.push_str("/>");
        } else {
            self.output.push('>');
        }
    }
}

impl TokenSink for FilterSink<'_> {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::ParseError(message) => {
                self.last_error = Some(message.into_owned());
            }
            Token::EOFToken => {
                // An error reported right before end-of-input means the input
                // ended inside an unfinished construct that was dropped.
                if let Some(message) = self.last_error.take() {
                    self.truncated = Some(message);
                }
            }
            Token::TagToken(tag) => {
                self.last_error = None;
                return self.process_tag(tag);
            }
            Token::CharacterTokens(text) => {
                self.last_error = None;
                if self.ignoring.is_none() {
                    escape_text(&text, &mut self.output);
                }
            }
            // Comments and doctypes are emitted after the EOF error for an
            // unterminated comment or doctype, so they keep `last_error`.
            Token::CommentToken(_) | Token::DoctypeToken(_) => {}
            Token::NullCharacterToken => {
                self.last_error = None;
            }
        }
        TokenSinkResult::Continue
    }
}

/// Tokenizer state the content of an element must be read in.
fn content_model(name: &str) -> Option<TokenSinkResult<()>> {
    match name {
        "script" => Some(TokenSinkResult::RawData(RawKind::ScriptData)),
        "style" | "iframe" | "noembed" | "noframes" | "xmp" => {
            Some(TokenSinkResult::RawData(RawKind::Rawtext))
        }
        "title" | "textarea" => Some(TokenSinkResult::RawData(RawKind::Rcdata)),
        "plaintext" => Some(TokenSinkResult::Plaintext),
        _ => None,
    }
}

fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

fn escape_attribute(value: &str, output: &mut String) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }
}
