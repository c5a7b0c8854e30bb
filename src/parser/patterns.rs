// file: src/parser/patterns.rs
// description: compiled regex patterns for fact, entity and PII extraction
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

/// Terms whose surrounding sentence is reported as legal context.
pub const LEGAL_TERMS: [&str; 14] = [
    "agreement",
    "contract",
    "lease",
    "rent",
    "deposit",
    "notice",
    "eviction",
    "termination",
    "breach",
    "violation",
    "damages",
    "compensation",
    "refund",
    "penalty",
];

lazy_static! {
    // Dates like 12/05/2023 or 1-6-24
    pub static ref DATE: Regex = Regex::new(
        r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b"
    ).expect("DATE regex is valid");

    pub static ref AMOUNT_INR: Regex = Regex::new(
        r"₹\s*[\d,]+(?:\.\d{2})?|Rs\.?\s*[\d,]+(?:\.\d{2})?"
    ).expect("AMOUNT_INR regex is valid");

    pub static ref ADDRESS: Regex = Regex::new(
        r"(?i)\b\d+[^,\n]*(?:street|road|avenue|nagar|colony)[^,\n]*\b"
    ).expect("ADDRESS regex is valid");

    // Indian mobile numbers with optional +91 or trunk prefix
    pub static ref PHONE_IN: Regex = Regex::new(
        r"\b(?:\+91|0)?[6-9]\d{9}\b"
    ).expect("PHONE_IN regex is valid");

    pub static ref EMAIL: Regex = Regex::new(
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b"
    ).expect("EMAIL regex is valid");

    pub static ref PERSON_NAME: Regex = Regex::new(
        r"\b[A-Z][a-z]+ [A-Z][a-z]+(?:\s+[A-Z][a-z]+)?\b"
    ).expect("PERSON_NAME regex is valid");

    pub static ref TWO_WORD_NAME: Regex = Regex::new(
        r"\b[A-Z][a-z]+ [A-Z][a-z]+\b"
    ).expect("TWO_WORD_NAME regex is valid");

    pub static ref LEGAL_TERM_CONTEXT: Vec<(&'static str, Regex)> = LEGAL_TERMS
        .iter()
        .map(|term| {
            let pattern = format!(r"(?i).{{0,50}}\b{}\b.{{0,50}}", regex::escape(term));
            (*term, Regex::new(&pattern).expect("legal term regex is valid"))
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_pattern() {
        assert!(DATE.is_match("Signed on 12/05/2023"));
        assert!(DATE.is_match("due 1-6-24"));
        assert!(!DATE.is_match("2023"));
    }

    #[test]
    fn test_amount_pattern() {
        let text = "Deposit of ₹50,000 and rent Rs. 12,500.00 monthly";
        let found: Vec<&str> = AMOUNT_INR.find_iter(text).map(|m| m.as_str()).collect();
        assert_eq!(found, vec!["₹50,000", "Rs. 12,500.00"]);
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_IN.is_match("Call 9876543210"));
        assert!(PHONE_IN.is_match("Call 09876543210"));
        assert!(!PHONE_IN.is_match("Call 1234567890"));
    }

    #[test]
    fn test_address_pattern_is_case_insensitive() {
        let m = ADDRESS.find("Flat at 12 Gandhi ROAD, Chennai").unwrap();
        assert_eq!(m.as_str(), "12 Gandhi ROAD");
    }

    #[test]
    fn test_legal_term_patterns_compiled() {
        assert_eq!(LEGAL_TERM_CONTEXT.len(), LEGAL_TERMS.len());
        let (_, rent) = &LEGAL_TERM_CONTEXT[3];
        assert!(rent.is_match("The RENT is overdue"));
        assert!(!rent.is_match("parental consent"));
    }
}
