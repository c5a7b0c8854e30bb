// file: src/safety.rs
// description: PII redaction applied before text leaves for speech synthesis
// reference: https://docs.rs/regex

use crate::parser::patterns::{ADDRESS, EMAIL, PHONE_IN, TWO_WORD_NAME};

pub struct PiiRedactor;

impl PiiRedactor {
    /// Replaces phone numbers, emails, two-word capitalised names and
    /// street-like addresses, in that order.
    pub fn redact(text: &str) -> String {
        let text = PHONE_IN.replace_all(text, "[PHONE NUMBER]");
        let text = EMAIL.replace_all(&text, "[EMAIL ADDRESS]");
        let text = TWO_WORD_NAME.replace_all(&text, "[NAME]");
        ADDRESS.replace_all(&text, "[ADDRESS]").into_owned()
    }

    pub fn prepare_for_speech(text: &str, allow_pii: bool) -> String {
        if allow_pii {
            text.to_string()
        } else {
            Self::redact(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_redacts_contact_details() {
        let redacted = PiiRedactor::redact("Call 9876543210 or write to tenant@example.com today");
        assert_eq!(redacted, "Call [PHONE NUMBER] or write to [EMAIL ADDRESS] today");
    }

    #[test]
    fn test_redacts_names() {
        let redacted = PiiRedactor::redact("Notice to Ravi Kumar regarding rent");
        assert_eq!(redacted, "Notice to [NAME] regarding rent");
    }

    #[test]
    fn test_redacts_addresses() {
        let redacted = PiiRedactor::redact("Premises at 45 mount road, Chennai");
        assert_eq!(redacted, "Premises at [ADDRESS], Chennai");
    }

    #[test]
    fn test_allow_pii_keeps_text() {
        let text = "Ravi Kumar, 9876543210";
        assert_eq!(PiiRedactor::prepare_for_speech(text, true), text);
        assert_eq!(
            PiiRedactor::prepare_for_speech(text, false),
            "[NAME], [PHONE NUMBER]"
        );
    }
}
