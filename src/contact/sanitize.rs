//! Field normalization into a contact message

use super::html::sanitize_html;
use super::locale::{LocaleTable, DEFAULT_LANG};
use super::{ContactMessage, FieldMap};

/// Normalize decoded fields. Never fails; emptiness is left to the validator.
pub fn sanitize(fields: &FieldMap, locale: &LocaleTable) -> ContactMessage {
    let present = |key: &str| fields.get(key).map(String::as_str).filter(|v| !v.is_empty());

    let lang = present("lang")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(DEFAULT_LANG)
        .to_string();

    let subject = match present("subject") {
        Some(subject) => sanitize_html(subject),
        None => locale.subject(&lang).to_string(),
    };

    ContactMessage {
        email: present("email").map(str::trim).unwrap_or_default().to_string(),
        message: present("message").map(sanitize_html).unwrap_or_default(),
        subject,
        lang,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn message(email: &str, message: &str, subject: &str, lang: &str) -> ContactMessage {
        ContactMessage {
            email: email.to_string(),
            message: message.to_string(),
            subject: subject.to_string(),
            lang: lang.to_string(),
        }
    }

    #[test]
    fn test_defaults() {
        let locale = LocaleTable::builtin();
        assert_eq!(sanitize(&fields(&[]), &locale), message("", "", "Contact request", "en"));
        assert_eq!(
            sanitize(&fields(&[("email", "mail")]), &locale),
            message("mail", "", "Contact request", "en")
        );
        assert_eq!(
            sanitize(&fields(&[("message", "message")]), &locale),
            message("", "message", "Contact request", "en")
        );
        assert_eq!(
            sanitize(&fields(&[("subject", "subject")]), &locale),
            message("", "", "subject", "en")
        );
    }

    #[test]
    fn test_trimming_and_html() {
        let locale = LocaleTable::builtin();
        let sanitized = sanitize(
            &fields(&[
                ("email", "  mail@example.com "),
                ("message", "  Hello\nthere <script>x</script> "),
                ("lang", " de "),
            ]),
            &locale,
        );
        assert_eq!(sanitized.email, "mail@example.com");
        assert_eq!(sanitized.message, "Hello<br />there");
        assert_eq!(sanitized.lang, "de");
        assert_eq!(sanitized.subject, "Kontaktanfrage");
    }

    #[test]
    fn test_blank_or_unknown_lang() {
        let locale = LocaleTable::builtin();
        let blank = sanitize(&fields(&[("lang", "   ")]), &locale);
        assert_eq!(blank.lang, "en");

        let unknown = sanitize(&fields(&[("lang", "fr")]), &locale);
        assert_eq!(unknown.lang, "fr");
        assert_eq!(unknown.subject, "Contact request");
    }
}
