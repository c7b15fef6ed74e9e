//! Slug derivation for page identifiers.
//!
//! A slug names one preview page: it is the template search key and the
//! output filename stem (`contact` → `contact.html`). Outline headings carry
//! the slug as their first token, optionally followed by a description:
//!
//! - `## contact` → `contact`
//! - `## alternate-contact-type / alternate-contact-name` → `alternate-contact-type`
//! - `## verify-address (B4)` → `verify-address`
//! - `## **bold**` → `bold`
//!
//! Only ASCII letters, digits and `-` survive sanitizing.

/// Strip every character that is not an ASCII alphanumeric or `-`.
pub fn sanitize_slug(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// Derive a slug from heading text: first token before whitespace or `/`,
/// sanitized. `None` when nothing is left.
pub fn slug_from_heading(heading: &str) -> Option<String> {
    let token = heading
        .trim()
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default();
    let slug = sanitize_slug(token);
    (!slug.is_empty()).then_some(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_heading() {
        assert_eq!(slug_from_heading("contact").as_deref(), Some("contact"));
    }

    #[test]
    fn first_token_before_space() {
        assert_eq!(
            slug_from_heading("verify-address (B4)").as_deref(),
            Some("verify-address")
        );
    }

    #[test]
    fn first_token_before_slash() {
        assert_eq!(
            slug_from_heading("alternate-contact-type/alternate-contact-name").as_deref(),
            Some("alternate-contact-type")
        );
        assert_eq!(
            slug_from_heading("alternate-contact-type / name").as_deref(),
            Some("alternate-contact-type")
        );
    }

    #[test]
    fn markup_characters_removed() {
        assert_eq!(slug_from_heading("**review_summary**").as_deref(), Some("reviewsummary"));
        assert_eq!(slug_from_heading("`income`").as_deref(), Some("income"));
    }

    #[test]
    fn surrounding_whitespace_ignored() {
        assert_eq!(slug_from_heading("  welcome  ").as_deref(), Some("welcome"));
    }

    #[test]
    fn nothing_left_is_none() {
        assert_eq!(slug_from_heading("***"), None);
        assert_eq!(slug_from_heading(""), None);
        assert_eq!(slug_from_heading("/ after-slash"), None);
    }

    #[test]
    fn sanitize_keeps_dashes_and_digits() {
        assert_eq!(sanitize_slug("b2-contact!"), "b2-contact");
        assert_eq!(sanitize_slug("über-page"), "ber-page");
    }
}
