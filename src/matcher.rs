//! Lexical scoring of search-result candidates against a target SKU.
//!
//! True product identity is undecidable from text alone, so selection is
//! heuristic: the brand token dominates the score because brand mismatches
//! are the usual source of cross-platform false positives, a known product
//! type adds confidence, and remaining tokens plus the pack size fill in the
//! rest. Candidates below a minimum score are rejected outright.

// ==================== VOCABULARY ====================

const STOP_WORDS: &[&str] = &[
    "with", "and", "for", "the", "a", "an", "in", "on", "by", "to", "of",
];

const PRODUCT_TYPES: &[&str] = &[
    "oil", "shampoo", "conditioner", "soap", "lotion", "cream", "powder", "gel",
];

const MIN_SCORE: i32 = 2;

/// One search-result entry under consideration.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub display_name: String,
    pub url: String,
}

// ==================== TOKENIZATION ====================

/// Strip everything but letters, digits and spaces, collapse whitespace.
pub fn clean_product_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased tokens with stop words and short fragments removed.
fn retained_tokens(name: &str) -> Vec<String> {
    clean_product_name(name)
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.len() > 2 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Target decomposition: leading token is treated as the brand, and the
/// first token matching the product-type vocabulary (if any) as the type.
struct Target {
    brand: Option<String>,
    product_type: Option<String>,
    other_tokens: Vec<String>,
}

fn decompose(target_name: &str) -> Target {
    let tokens = retained_tokens(target_name);
    let brand = tokens.first().cloned();
    let product_type = tokens
        .iter()
        .skip(1)
        .find(|t| PRODUCT_TYPES.contains(&t.as_str()))
        .cloned();
    let other_tokens = tokens
        .into_iter()
        .skip(1)
        .filter(|t| Some(t) != product_type.as_ref())
        .collect();
    Target {
        brand,
        product_type,
        other_tokens,
    }
}

// ==================== SCORING ====================

fn score_candidate(target: &Target, target_uom: &str, display_name: &str) -> i32 {
    let haystack = display_name.to_lowercase();
    let mut score = 0;

    if let Some(brand) = &target.brand {
        if haystack.contains(brand.as_str()) {
            score += 3;
        }
    }
    if let Some(product_type) = &target.product_type {
        if haystack.contains(product_type.as_str()) {
            score += 2;
        }
    }
    for token in &target.other_tokens {
        if haystack.contains(token.as_str()) {
            score += 1;
        }
    }
    let uom = target_uom.trim().to_lowercase();
    if uom.len() > 1 && haystack.contains(uom.as_str()) {
        score += 1;
    }

    score
}

/// Pick the best-matching candidate URL, or `None` when nothing clears the
/// minimum score. Ties keep the earliest candidate (platform result order is
/// itself a relevance signal).
pub fn select_best(target_name: &str, target_uom: &str, candidates: &[Candidate]) -> Option<String> {
    let target = decompose(target_name);

    let mut best: Option<(&Candidate, i32)> = None;
    for candidate in candidates {
        let score = score_candidate(&target, target_uom, &candidate.display_name);
        if score < MIN_SCORE {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }

    best.map(|(c, _)| c.url.clone())
}

/// Short query used for platform searches: the full noisy SKU name tends to
/// miss, so prefer `brand + product type`, falling back to the first couple
/// of retained tokens.
pub fn simplified_query(target_name: &str) -> String {
    let target = decompose(target_name);
    match (&target.brand, &target.product_type) {
        (Some(brand), Some(product_type)) => format!("{brand} {product_type}"),
        (Some(brand), None) => match target.other_tokens.first() {
            Some(next) => format!("{brand} {next}"),
            None => brand.clone(),
        },
        _ => clean_product_name(target_name).to_lowercase(),
    }
}
