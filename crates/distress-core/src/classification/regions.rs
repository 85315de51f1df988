//! Emerging-market country list (MSCI Emerging Markets constituents).
//!
//! Countries are matched case-insensitively on ISO 3166 alpha-2 code,
//! alpha-3 code or English name.

/// (alpha-2, alpha-3, lowercase names)
const EMERGING_MARKETS: &[(&str, &str, &[&str])] = &[
    ("BR", "BRA", &["brazil"]),
    ("CL", "CHL", &["chile"]),
    ("CN", "CHN", &["china", "people's republic of china"]),
    ("CO", "COL", &["colombia"]),
    ("CZ", "CZE", &["czech republic", "czechia"]),
    ("EG", "EGY", &["egypt"]),
    ("GR", "GRC", &["greece"]),
    ("HU", "HUN", &["hungary"]),
    ("IN", "IND", &["india"]),
    ("ID", "IDN", &["indonesia"]),
    ("KR", "KOR", &["korea", "south korea", "republic of korea"]),
    ("KW", "KWT", &["kuwait"]),
    ("MY", "MYS", &["malaysia"]),
    ("MX", "MEX", &["mexico"]),
    ("PE", "PER", &["peru"]),
    ("PH", "PHL", &["philippines"]),
    ("PL", "POL", &["poland"]),
    ("QA", "QAT", &["qatar"]),
    ("SA", "SAU", &["saudi arabia"]),
    ("ZA", "ZAF", &["south africa"]),
    ("TW", "TWN", &["taiwan"]),
    ("TH", "THA", &["thailand"]),
    ("TR", "TUR", &["turkey", "türkiye", "turkiye"]),
    ("AE", "ARE", &["united arab emirates", "uae"]),
];

/// Whether a country (code or name) is on the emerging-market list.
pub fn is_emerging_market(country: &str) -> bool {
    let needle = country.trim();
    if needle.is_empty() {
        return false;
    }
    let lower = needle.to_lowercase();
    EMERGING_MARKETS.iter().any(|(alpha2, alpha3, names)| {
        alpha2.eq_ignore_ascii_case(needle)
            || alpha3.eq_ignore_ascii_case(needle)
            || names.contains(&lower.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_names() {
        assert!(is_emerging_market("BR"));
        assert!(is_emerging_market("bra"));
        assert!(is_emerging_market("South Korea"));
        assert!(is_emerging_market(" Türkiye "));
    }

    #[test]
    fn test_developed_and_blank() {
        assert!(!is_emerging_market("US"));
        assert!(!is_emerging_market("Germany"));
        assert!(!is_emerging_market(""));
    }
}
