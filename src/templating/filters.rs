//! Helpers registered on every template namespace.
//!
//! # Filters
//!
//! - `sanitize`: filter untrusted markup through the allow-list sanitizer.
//!   Optional `tags` and `attrs` arguments replace the configured allow-lists
//!   for one call. The output is marked safe so the markup namespace does not
//!   escape it a second time.
//! - `strip`: drop every tag, keep the text.
//!
//! # Functions
//!
//! - `dev()`: `true` outside production mode.
//!
//! ```text
//! <article>{{ post.body | sanitize }}</article>
//! <p>{{ comment | sanitize(tags=["a", "em"], attrs=["href"]) }}</p>
//! <meta name="description" content="{{ post.body | strip }}">
//! {% if dev() %}<script src="/live-reload.js"></script>{% endif %}
//! ```

use std::collections::HashMap;
use tera::{Tera, Value};

use crate::sanitize::{SanitizePolicy, Sanitizer};

/// Settings the template helpers close over.
#[derive(Debug, Clone, Default)]
pub struct TemplateHelpers {
    sanitizer: Sanitizer,
    production: bool,
}

impl TemplateHelpers {
    pub fn new(policy: SanitizePolicy, production: bool) -> Self {
        Self {
            sanitizer: Sanitizer::new(policy),
            production,
        }
    }

    pub const fn is_production(&self) -> bool {
        self.production
    }

    /// Register the filters and functions on `tera`.
    pub fn register(&self, tera: &mut Tera) {
        tera.register_filter(
            "sanitize",
            SanitizeFilter {
                sanitizer: self.sanitizer.clone(),
            },
        );
        tera.register_filter("strip", StripFilter);

        let production = self.production;
        tera.register_function("dev", move |_args: &HashMap<String, Value>| {
            Ok(Value::Bool(!production))
        });
    }
}

struct SanitizeFilter {
    sanitizer: Sanitizer,
}

impl tera::Filter for SanitizeFilter {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let input = value
            .as_str()
            .ok_or_else(|| tera::Error::msg("sanitize filter requires a string"))?;

        let tags = string_list(args, "tags")?;
        let attributes = string_list(args, "attrs")?;

        let sanitized = if tags.is_none() && attributes.is_none() {
            self.sanitizer.sanitize(input)
        } else {
            let mut policy = self.sanitizer.policy().clone();
            if let Some(tags) = tags {
                policy = policy.with_allowed_tags(tags);
            }
            if let Some(attributes) = attributes {
                policy = policy.with_allowed_attributes(attributes);
            }
            Sanitizer::new(policy).sanitize(input)
        };

        Ok(Value::String(sanitized.into_string()))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

struct StripFilter;

impl tera::Filter for StripFilter {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let input =
            value.as_str().ok_or_else(|| tera::Error::msg("strip filter requires a string"))?;
        Ok(Value::String(Sanitizer::stripping().sanitize(input).into_string()))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

fn string_list(args: &HashMap<String, Value>, name: &str) -> tera::Result<Option<Vec<String>>> {
    let Some(value) = args.get(name) else {
        return Ok(None);
    };
    let items = value
        .as_array()
        .ok_or_else(|| tera::Error::msg(format!("sanitize argument '{name}' must be an array")))?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                tera::Error::msg(format!("sanitize argument '{name}' must contain strings"))
            })
        })
        .collect::<tera::Result<Vec<_>>>()
        .map(Some)
}
