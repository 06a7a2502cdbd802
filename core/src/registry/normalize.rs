const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "has", "have",
    "in", "is", "it", "its", "of", "on", "or", "that", "the", "this", "to", "was", "were", "will",
    "with",
];

/// Lowercased, stop-word-filtered projection of claim text.
///
/// Token order and repeated tokens are kept. Leading and trailing
/// non-alphanumeric characters are stripped from every token; inner ones
/// ("u.s.", "covid-19") survive.
pub fn normalize_claim_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out: Vec<&str> = Vec::new();
    for raw in lowered.split_whitespace() {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if token.is_empty() || STOP_WORDS.contains(&token) {
            continue;
        }
        out.push(token);
    }
    out.join(" ")
}

