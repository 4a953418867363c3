//! Version label scheme.
//!
//! Labels are `"v{n}"` for plain versions and `"v{n} - {Company}"` for
//! customized ones, where `n` is one past the master's current version count.
//! The company suffix doubles as the customization reuse key: a master that
//! already has a version labeled `"… - Acme"` is considered customized for
//! Acme, regardless of job description. Two postings at the same company
//! collapse onto one customized version.

/// Label for the initial version created with a master document.
pub const INITIAL_LABEL: &str = "v1";

/// Plain label for the `n`-th version.
pub fn version_label(n: i64) -> String {
    format!("v{}", n)
}

/// The reuse-key suffix for a company.
pub fn company_suffix(company: &str) -> String {
    format!(" - {}", company)
}

/// Label for the `n`-th version, customized for a company.
pub fn customized_label(n: i64, company: &str) -> String {
    format!("v{}{}", n, company_suffix(company))
}

/// Whether a label carries the given company's reuse suffix.
pub fn matches_company(label: &str, company: &str) -> bool {
    label.ends_with(&company_suffix(company))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_label_is_v1() {
        assert_eq!(version_label(1), INITIAL_LABEL);
    }

    #[test]
    fn test_customized_label_format() {
        assert_eq!(customized_label(2, "Acme Corp"), "v2 - Acme Corp");
    }

    #[test]
    fn test_matches_company() {
        assert!(matches_company("v2 - Acme", "Acme"));
        assert!(matches_company("v13 - Acme", "Acme"));
        assert!(!matches_company("v2 - AcmeX", "Acme"));
        assert!(!matches_company("v2", "Acme"));
    }

    #[test]
    fn test_suffix_is_a_plain_literal() {
        // The reuse key is literal text, not a pattern; a company name that
        // happens to be a suffix of another must not match.
        assert!(!matches_company("v2 - Great Acme", "Acme"));
        assert!(matches_company("v2 - Great Acme", "Great Acme"));
    }
}
