//! Keyword and personal-data screening of review comments.

use crate::error::ValidationError;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

fn build(pattern: &str) -> Regex {
    #[allow(clippy::expect_used)]
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("compile regex")
}

static OFFENSIVE_LANGUAGE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(idiot|dummkopf|arschloch|scheisse|scheiße|fick|hurensohn|wichser)\b",
        r"\b(fuck|shit|asshole|bastard|bitch)\b",
        r"\b(nazi|rassist)\b",
    ]
    .iter()
    .map(|p| build(p))
    .collect()
});

static PERSONAL_DATA: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b", "an email address"),
        (r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b", "a credit card number"),
        (r"\bIBAN\s*[A-Z]{2}\d{2}[\s\d]+\b", "an IBAN"),
        (r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b", "a phone number"),
    ]
    .iter()
    .map(|(p, label)| (build(p), *label))
    .collect()
});

static INDUSTRY_TERMS: LazyLock<Vec<(&'static str, Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("insurance", r"\b(versicherungsnummer|policy number|kontonummer)\b", "insurance data"),
        ("ecig", r"\b(e-liquid|liquid|nikotin|nicotine|vape)\b", "product mentions"),
        ("medicine", r"\b(heilung|heilt|cures?|before|after|vorher|nachher)\b", "efficacy claims"),
        ("supplements", r"\b(abnehmen|weight loss|muskelaufbau|before|after)\b", "efficacy claims"),
        ("alcohol", r"\b(betrunken|besaufen|drunk|wasted)\b", "alcohol consumption"),
    ]
    .iter()
    .map(|(industry, p, label)| (*industry, build(p), *label))
    .collect()
});

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ContentCheck {
    pub flags: Vec<String>,
    pub reasons: Vec<String>,
}

impl ContentCheck {
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }
}

pub fn check_content(text: &str, category: Option<&str>) -> ContentCheck {
    let mut check = ContentCheck::default();

    if OFFENSIVE_LANGUAGE.iter().any(|re| re.is_match(text)) {
        check.flags.push("offensive_language".to_string());
        check.reasons.push("contains inappropriate language".to_string());
    }

    for (re, label) in PERSONAL_DATA.iter() {
        if re.is_match(text) {
            check.flags.push("personal_data".to_string());
            check.reasons.push(format!("contains {label}"));
        }
    }

    if let Some(category) = category {
        for (industry, re, label) in INDUSTRY_TERMS.iter() {
            if *industry == category && re.is_match(text) {
                check.flags.push(format!("industry_{industry}"));
                check.reasons.push(format!("{label} are not allowed"));
            }
        }
    }

    check
}

pub fn ensure_clean(text: &str, category: Option<&str>) -> Result<(), ValidationError> {
    let check = check_content(text, category);
    if check.is_clean() {
        Ok(())
    } else {
        Err(ValidationError::DisallowedContent(check.reasons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_complaints() {
        assert!(check_content("Item arrived broken and late", None).is_clean());
        assert!(check_content("Great service, fast shipping!", Some("electronics")).is_clean());
    }

    #[test]
    fn flags_offensive_language_once() {
        let check = check_content("What an IDIOT, total shit service", None);
        assert_eq!(check.flags, vec!["offensive_language".to_string()]);
    }

    #[test]
    fn flags_personal_data() {
        let check = check_content("Contact me at jane.doe@example.com please", None);
        assert_eq!(check.flags, vec!["personal_data".to_string()]);
        assert!(check.reasons[0].contains("email"));
        assert!(!check_content("Call 555-123-4567 for details", None).is_clean());
    }

    #[test]
    fn industry_terms_only_apply_to_their_category() {
        let text = "The nicotine level was way off";
        assert!(check_content(text, None).is_clean());
        assert!(check_content(text, Some("electronics")).is_clean());
        assert_eq!(check_content(text, Some("ecig")).flags, vec!["industry_ecig".to_string()]);
    }

    #[test]
    fn ensure_clean_reports_reasons() {
        let err = ensure_clean("mail me: a@b.de", None).unwrap_err();
        assert!(matches!(err, ValidationError::DisallowedContent(reasons) if reasons.len() == 1));
    }
}
