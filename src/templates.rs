//! Pre-authored fallback documents, embedded at build time. Selection is a
//! pure function of the prompt and requested category: deterministic and
//! total, so generation always has a renderable document to hand back.

use include_dir::{include_dir, Dir};

static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

const DEFAULT_TEMPLATE: &str = "portfolio";

/// Picks a fallback document. Keywords in the prompt win over the
/// caller-supplied category; anything unrecognized lands on the portfolio
/// template.
pub fn select_fallback(prompt: &str, website_type: Option<&str>) -> &'static str {
    let lower = prompt.to_lowercase();
    let inferred = if lower.contains("portfolio") || lower.contains("photographer") {
        Some("portfolio")
    } else if lower.contains("ecommerce") || lower.contains("shop") || lower.contains("store") {
        Some("ecommerce")
    } else {
        None
    };
    if let Some(doc) = inferred.and_then(template) {
        return doc;
    }
    if let Some(doc) = website_type.and_then(|t| template(&t.to_lowercase())) {
        return doc;
    }
    template(DEFAULT_TEMPLATE).unwrap_or_default()
}

fn template(name: &str) -> Option<&'static str> {
    TEMPLATES
        .get_file(format!("{name}.html"))
        .and_then(|f| f.contents_utf8())
}
