use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Tokens shorter than this (in characters) are dropped
pub const MIN_TOKEN_LEN: usize = 2;

/// Turkish and English function words, in folded form
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Turkish
        "acaba", "ama", "ancak", "artik", "bana", "bazen", "bazi", "belki", "ben", "beni",
        "benim", "bir", "biraz", "birkac", "biz", "bize", "bizim", "bu", "buna", "bunu",
        "bunun", "da", "daha", "de", "defa", "diye", "en", "fakat", "gibi", "hem", "hep",
        "hepsi", "her", "hic", "icin", "ile", "ise", "kadar", "kez", "ki", "kim", "mi",
        "mu", "ne", "neden", "nasil", "olan", "olarak", "oldu", "olur", "ona", "onu",
        "onun", "sanki", "sen", "siz", "su", "sey", "seyler", "tum", "ve", "veya", "ya",
        "yani", "var", "cok", "sonra", "simdi", "zaten",
        // English
        "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "up", "about", "into", "is", "was", "are", "were", "been", "be", "have",
        "has", "had", "do", "does", "did", "will", "would", "could", "should", "may",
        "might", "must", "can", "am", "an", "my", "me", "it", "its", "this", "that",
        "there", "since", "very", "also", "so", "some",
    ]
    .into_iter()
    .collect()
});

/// Alphanumeric tokens whose digits carry meaning
static MEDICAL_TOKENS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["covid19", "b12", "d3", "hba1c", "h1n1", "h5n1", "t3", "t4", "ldl", "hdl", "ekg", "ecg"]
        .into_iter()
        .collect()
});

/// `covid-19` style spellings are joined before digits are stripped
static HYPHENATED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z]+)-(\d+)").expect("valid hyphenated code regex"));

/// Canonical token sequence derived from raw text. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedText {
    tokens: Vec<String>,
}

impl NormalizedText {
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens joined by single spaces
    pub fn joined(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Language-aware text normalizer (Turkish + English).
///
/// Every step is total: empty or pure-punctuation input yields an empty
/// token sequence.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize raw text into canonical tokens
    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let lowered = raw.to_lowercase();
        let folded = fold_diacritics(&lowered);
        let joined = HYPHENATED_CODE.replace_all(&folded, "$1$2");

        let tokens = split_words(&joined)
            .into_iter()
            .filter(|t| !STOPWORDS.contains(t.as_str()))
            .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
            .collect();

        NormalizedText { tokens }
    }

    pub fn is_stopword(token: &str) -> bool {
        STOPWORDS.contains(token)
    }
}

/// Fold diacritics to base Latin letters.
///
/// Turkish dotless `ı` and a few ligatures have no canonical decomposition
/// and are mapped explicitly; everything else goes through NFD with the
/// combining marks removed.
pub fn fold_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'ı' => out.push('i'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'ø' => out.push('o'),
            'ł' => out.push('l'),
            'đ' | 'ð' => out.push('d'),
            'þ' => out.push_str("th"),
            _ => out.extend(std::iter::once(c).nfd().filter(|d| !is_combining_mark(*d))),
        }
    }
    out
}

/// Lookup key for names: lowercase, folded, punctuation collapsed to single spaces
pub fn fold_key(text: &str) -> String {
    fold_diacritics(&text.to_lowercase())
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        if MEDICAL_TOKENS.contains(word) {
            words.push(word.to_string());
            continue;
        }
        words.extend(
            word.split(|c: char| c.is_numeric())
                .filter(|part| !part.is_empty())
                .map(str::to_string),
        );
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &str) -> Vec<String> {
        TextNormalizer::new().normalize(raw).tokens().to_vec()
    }

    #[test]
    fn test_turkish_scenario_drops_stopwords() {
        let result = tokens("Baş ağrım var ve mide bulantısı yaşıyorum");
        assert_eq!(result, vec!["bas", "agrim", "mide", "bulantisi", "yasiyorum"]);
        assert!(!result.contains(&"var".to_string()));
        assert!(!result.contains(&"ve".to_string()));
    }

    #[test]
    fn test_fold_turkish_letters() {
        assert_eq!(fold_diacritics("çğıöşü"), "cgiosu");
        assert_eq!(fold_diacritics(&"İÇ".to_lowercase()), "ic");
        assert_eq!(fold_diacritics("résumé"), "resume");
        assert_eq!(fold_diacritics("straße"), "strasse");
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(tokens("").is_empty());
        assert!(tokens("?!... ,,, ---").is_empty());
        assert!(tokens("12 34 5").is_empty());
        assert!(tokens("a b c").is_empty());
    }

    #[test]
    fn test_punctuation_and_digits_stripped() {
        assert_eq!(tokens("Ateş: 39 derece!!"), vec!["ates", "derece"]);
        assert_eq!(tokens("3 gündür öksürük"), vec!["gundur", "oksuruk"]);
    }

    #[test]
    fn test_medical_tokens_keep_digits() {
        assert_eq!(tokens("COVID-19 testi"), vec!["covid19", "testi"]);
        assert_eq!(tokens("B12 eksikliği"), vec!["b12", "eksikligi"]);
    }

    #[test]
    fn test_english_input() {
        assert_eq!(
            tokens("I have chest pain and cold sweating"),
            vec!["chest", "pain", "cold", "sweating"]
        );
    }

    #[test]
    fn test_deterministic() {
        let raw = "Göğsümde baskı hissi ve soğuk terleme var";
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize(raw), normalizer.normalize(raw));
    }

    #[test]
    fn test_fold_key() {
        assert_eq!(fold_key("İç Hastalıkları"), "ic hastaliklari");
        assert_eq!(fold_key("  Kulak-Burun-Boğaz "), "kulak burun bogaz");
    }
}
