//! Value normalization for rule matching.
//!
//! Rules are typed by hand and drift from the metric catalogue: "Mídia
//! Paga", "midia-paga" and "MIDIA PAGA" must all compare equal. Every
//! comparison in this crate goes through [`match_key`]:
//! - Unicode decomposition, combining marks dropped (diacritics)
//! - Lowercase conversion
//! - Everything except letters and digits removed (spaces, punctuation)

use lazy_static::lazy_static;
use pivtree_core::value_label;
use regex::Regex;
use serde_json::Value;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    /// Anything that is not a letter or a digit
    static ref NON_ALNUM: Regex = Regex::new(r"[^\p{L}\p{N}]+").unwrap();
}

/// Comparison key of a piece of text
pub fn match_key(text: &str) -> String {
    let folded: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    NON_ALNUM.replace_all(&folded.to_lowercase(), "").into_owned()
}

/// Comparison key of a JSON cell; null is the empty key
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => match_key(s),
        other => match_key(&value_label(other)),
    }
}
