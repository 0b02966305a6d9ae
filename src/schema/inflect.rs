//! English pluralization following the Rails inflector's default rules.
//!
//! Only used to turn `user` into `users` when resolving references, so the
//! rule set stops at the defaults Rails ships with.

use regex::Regex;
use std::sync::OnceLock;

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
];

/// (singular suffix, plural suffix); matched case-insensitively at the end.
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
];

/// Ordered from most to least specific; the first match wins.
const RULES: &[(&str, &str)] = &[
    (r"(?i)(quiz)$", "${1}zes"),
    (r"(?i)^(oxen)$", "${1}"),
    (r"(?i)^(ox)$", "${1}en"),
    (r"(?i)^(m|l)ice$", "${1}ice"),
    (r"(?i)^(m|l)ouse$", "${1}ice"),
    (r"(?i)(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
    (r"(?i)(x|ch|ss|sh)$", "${1}es"),
    (r"(?i)([^aeiouy]|qu)y$", "${1}ies"),
    (r"(?i)(hive)$", "${1}s"),
    (r"(?i)(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
    (r"(?i)sis$", "ses"),
    (r"(?i)([ti])a$", "${1}a"),
    (r"(?i)([ti])um$", "${1}a"),
    (r"(?i)(buffal|tomat)o$", "${1}oes"),
    (r"(?i)(bu)s$", "${1}ses"),
    (r"(?i)(alias|status)$", "${1}es"),
    (r"(?i)(octop|vir)i$", "${1}i"),
    (r"(?i)(octop|vir)us$", "${1}i"),
    (r"(?i)^(ax|test)is$", "${1}es"),
    (r"(?i)s$", "s"),
];

fn compiled_rules() -> &'static [(Regex, &'static str)] {
    static CELL: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    CELL.get_or_init(|| {
        RULES
            .iter()
            .map(|(pat, rep)| {
                let re = Regex::new(pat).expect("inflection rule must compile");
                (re, *rep)
            })
            .collect()
    })
}

/// Pluralize the last word of an underscored name (`line_item` -> `line_items`).
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_lowercase();

    // Uncountables only match as a whole word ("fish", not "big_fish").
    if UNCOUNTABLE.iter().any(|u| lower == *u) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if ends_with_ignore_case(word, plural) {
            return word.to_string();
        }
        if ends_with_ignore_case(word, singular) {
            let cut = word.len() - singular.len();
            // Keep the first letter's case as written ("Person" -> "People").
            let first = &word[cut..cut + 1];
            return format!("{}{first}{}", &word[..cut], &plural[1..]);
        }
    }

    for (re, rep) in compiled_rules() {
        if re.is_match(word) {
            return re.replace(word, *rep).into_owned();
        }
    }

    format!("{word}s")
}

fn ends_with_ignore_case(word: &str, suffix: &str) -> bool {
    word.len() >= suffix.len()
        && word.is_char_boundary(word.len() - suffix.len())
        && word[word.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
