//! Shared extraction helpers used by every feed parser.
//!
//! Feeds disagree on field names, localization, and numeric formats; these
//! helpers guarantee that nothing past the parser boundary ever sees an
//! ambiguous shape. All of them are total: bad input degrades to an empty
//! string, zero, or false.

use roxmltree::Node;

/// Preferred locales when a field is a block of per-language child elements.
const LOCALE_PREFERENCE: [&str; 2] = ["en", "es"];

/// Turn free text into a filesystem/URL-safe slug.
///
/// Lowercases, folds the Spanish diacritics the mapping table contains,
/// collapses every non-alphanumeric run into a single hyphen, and trims
/// leading/trailing hyphens. Deterministic: slugs are used as on-disk
/// identifiers and join keys.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_hyphen = true; // suppress a leading hyphen
    for c in text.to_lowercase().chars() {
        let folded = fold_diacritic(c);
        if folded.is_ascii_alphanumeric() {
            slug.push(folded);
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Text of the first child element with the given tag, or empty string.
pub fn element_text(node: Node, tag: &str) -> String {
    child_element(node, tag)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Text of the first matching tag among several candidates, for feeds that
/// rename the same field (`beds` vs `bedrooms`, `built` vs `surface_area`).
pub fn element_text_any(node: Node, tags: &[&str]) -> String {
    for tag in tags {
        let text = element_text(node, tag);
        if !text.is_empty() {
            return text;
        }
    }
    String::new()
}

/// Safe string extraction for a field that may be plain text or a localized
/// block of per-language child elements. Prefers the canonical locales,
/// then falls back to the first language present, then to the element's
/// own text, and finally to the empty string.
pub fn localized_text(node: Node, tag: &str) -> String {
    let Some(field) = child_element(node, tag) else {
        return String::new();
    };
    let languages: Vec<Node> = field.children().filter(|n| n.is_element()).collect();
    if languages.is_empty() {
        return field.text().map(|t| t.trim().to_string()).unwrap_or_default();
    }
    for locale in LOCALE_PREFERENCE {
        if let Some(hit) = languages.iter().find(|n| n.has_tag_name(locale)) {
            if let Some(text) = hit.text() {
                let text = text.trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    languages
        .iter()
        .find_map(|n| n.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Coerce a small count field (bedrooms, bathrooms). Absent, malformed, or
/// negative input becomes 0.
pub fn parse_count(text: &str) -> u32 {
    parse_amount(text).min(u32::MAX as u64) as u32
}

/// Coerce a price or surface amount. Feeds emit integers, decimals, and
/// occasionally thousand separators; everything non-numeric degrades to 0.
pub fn parse_amount(text: &str) -> u64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return 0;
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value > 0.0 => value.round() as u64,
        _ => 0,
    }
}

/// Boolean coercion for feed flags: "1", "yes" and "true" (any case) are
/// true, everything else is false.
pub fn parse_flag(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "1" | "yes" | "true")
}

fn child_element<'a>(node: Node<'a, 'a>, tag: &str) -> Option<Node<'a, 'a>> {
    node.children().find(|n| n.has_tag_name(tag))
}

/// All descendant elements with the given tag, in document order. Handles
/// both the singleton and repeated element shapes: one child yields one
/// item.
pub fn descendant_elements<'a>(node: Node<'a, 'a>, tag: &str) -> Vec<Node<'a, 'a>> {
    node.descendants()
        .filter(|n| n.is_element() && n.has_tag_name(tag))
        .collect()
}
