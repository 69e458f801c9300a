//! Quantity and unit-of-measure extraction from free-text listing titles.
//!
//! Listing titles embed pack sizes in inconsistent ways ("200ml", "200 ml",
//! "500 Gms"). Extraction is tiered: a strict pattern that requires a space
//! between quantity and unit runs first, then a looser pattern that allows
//! none. Unit spellings are folded to a canonical set. No match is a normal
//! outcome, not an error.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Strict first: "200 ml". Looser second: "200ml".
    static ref QUANTITY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s+(ml|g|kg|l|pcs|gm|gms|pack)\b").unwrap(),
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(ml|g|kg|l|pcs|gm|gms|pack)\b").unwrap(),
    ];
}

/// Fold platform-specific unit spellings onto the canonical set.
fn canonical_unit(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "gm" | "gms" => "g".to_string(),
        "pack" => "pcs".to_string(),
        other => other.to_string(),
    }
}

/// Pull `(quantity, unit)` out of a title, e.g. `"Parachute Coconut Oil
/// 200ml"` -> `("200", "ml")`. Returns `None` when no pattern matches.
pub fn extract_quantity_and_unit(text: &str) -> Option<(String, String)> {
    for pattern in QUANTITY_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let quantity = caps.get(1)?.as_str().to_string();
            let unit = canonical_unit(caps.get(2)?.as_str());
            return Some((quantity, unit));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaced_and_unspaced_forms_both_match() {
        for unit in ["ml", "g", "kg", "l", "pcs", "gm", "gms", "pack"] {
            let canonical = canonical_unit(unit);
            let spaced = format!("Brand Item 250 {unit}");
            let tight = format!("Brand Item 250{unit}");
            assert_eq!(
                extract_quantity_and_unit(&spaced),
                Some(("250".to_string(), canonical.clone())),
                "spaced form failed for {unit}"
            );
            assert_eq!(
                extract_quantity_and_unit(&tight),
                Some(("250".to_string(), canonical)),
                "tight form failed for {unit}"
            );
        }
    }

    #[test]
    fn synonyms_are_canonicalized() {
        assert_eq!(
            extract_quantity_and_unit("Tata Salt 500 gms"),
            Some(("500".to_string(), "g".to_string()))
        );
        assert_eq!(
            extract_quantity_and_unit("Maggi Noodles 12 pack"),
            Some(("12".to_string(), "pcs".to_string()))
        );
        assert_eq!(
            extract_quantity_and_unit("Amul Butter 100gm"),
            Some(("100".to_string(), "g".to_string()))
        );
    }

    #[test]
    fn decimal_quantities_are_preserved() {
        assert_eq!(
            extract_quantity_and_unit("Fortune Sunflower Oil 1.5 l"),
            Some(("1.5".to_string(), "l".to_string()))
        );
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(
            extract_quantity_and_unit("Dettol Handwash 200ML"),
            Some(("200".to_string(), "ml".to_string()))
        );
    }

    #[test]
    fn no_pattern_yields_none() {
        assert_eq!(extract_quantity_and_unit("Dove Soap"), None);
        assert_eq!(extract_quantity_and_unit(""), None);
        assert_eq!(extract_quantity_and_unit("grams of sugar"), None);
    }

    #[test]
    fn idempotent_on_normalized_output() {
        let (q, u) = extract_quantity_and_unit("Parachute Coconut Oil 200ml").unwrap();
        assert_eq!((q.as_str(), u.as_str()), ("200", "ml"));
        let again = extract_quantity_and_unit(&format!("{q} {u}")).unwrap();
        assert_eq!(again, (q, u));
    }
}
