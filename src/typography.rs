//! Language-specific non-breaking space insertion.
//!
//! Every text written to a locale document passes through [`apply_typography`].
//! The rules are table driven: a language either has a [`LanguageRules`] entry or
//! its text is returned untouched.

/// U+00A0 NO-BREAK SPACE.
pub const NBSP: char = '\u{a0}';

/// Units that must stay on the same line as the number in front of them.
const COMMON_UNITS: &[&str] = &[
    "%", "‰", "°", "°C", "°F", "B", "kB", "KB", "MB", "GB", "TB", "mg", "g", "dag", "kg", "t",
    "mm", "cm", "dm", "m", "km", "m²", "m³", "ml", "cl", "dl", "l", "ms", "s", "min", "h", "km/h",
    "W", "kW", "V", "A", "€", "$", "£",
];

/// Typographic rule set of one language.
#[derive(Debug)]
pub struct LanguageRules {
    /// Words that may not end a line; the space after them becomes non-breaking.
    pub orphan_words: &'static [&'static str],
    /// Units specific to the language, checked in addition to the common ones.
    pub units: &'static [&'static str],
    /// Punctuation preceded by a non-breaking space (`Bonjour !`).
    pub spaced_punctuation: &'static [char],
    /// Opening marks followed by a non-breaking space (`« Bonjour`).
    pub opening_marks: &'static [char],
}

static POLISH: LanguageRules = LanguageRules {
    orphan_words: &["a", "i", "o", "u", "w", "z"],
    units: &["zł", "gr", "tys.", "mln", "mld", "r.", "godz."],
    spaced_punctuation: &[],
    opening_marks: &[],
};

static CZECH: LanguageRules = LanguageRules {
    orphan_words: &["a", "i", "k", "o", "s", "u", "v", "z"],
    units: &["Kč", "tis.", "mil.", "hod."],
    spaced_punctuation: &[],
    opening_marks: &[],
};

static SLOVAK: LanguageRules = LanguageRules {
    orphan_words: &["a", "i", "k", "o", "s", "u", "v", "z"],
    units: &["tis.", "mil.", "hod."],
    spaced_punctuation: &[],
    opening_marks: &[],
};

static FRENCH: LanguageRules = LanguageRules {
    orphan_words: &["à", "a", "y"],
    units: &["h"],
    spaced_punctuation: &[':', ';', '!', '?', '»'],
    opening_marks: &['«'],
};

static ENGLISH: LanguageRules =
    LanguageRules { orphan_words: &[], units: &[], spaced_punctuation: &[], opening_marks: &[] };

static GERMAN: LanguageRules = LanguageRules {
    orphan_words: &[],
    units: &["Uhr", "Std."],
    spaced_punctuation: &[],
    opening_marks: &[],
};

/// Rule set for a language code, `None` when the language has no rules.
#[must_use]
pub fn rules_for(language: &str) -> Option<&'static LanguageRules> {
    match language.to_ascii_lowercase().as_str() {
        "pl" => Some(&POLISH),
        "cs" => Some(&CZECH),
        "sk" => Some(&SLOVAK),
        "fr" => Some(&FRENCH),
        "en" => Some(&ENGLISH),
        "de" => Some(&GERMAN),
        _ => None,
    }
}

/// Language code of a locale identifier: everything before the first `-`.
///
/// `pl-pl` and `pl` both map to `pl`.
#[must_use]
pub fn language_of(locale: &str) -> &str {
    locale.split('-').next().unwrap_or(locale)
}

/// Replace breakable spaces with [`NBSP`] where the language's rules require it.
///
/// Only plain spaces are considered; line breaks and existing non-breaking
/// spaces are kept.
#[must_use]
pub fn apply_typography(text: &str, language: &str) -> String {
    let Some(rules) = rules_for(language) else {
        return text.to_string();
    };

    let mut chunks = text.split(' ');
    let Some(first) = chunks.next() else {
        return String::new();
    };

    let mut result = String::with_capacity(text.len());
    result.push_str(first);
    let mut previous = first;
    for chunk in chunks {
        let glue = if rules.binds(last_word(previous), first_word(chunk)) { NBSP } else { ' ' };
        result.push(glue);
        result.push_str(chunk);
        previous = chunk;
    }
    result
}

fn last_word(chunk: &str) -> &str {
    chunk.rsplit(char::is_whitespace).next().unwrap_or(chunk)
}

fn first_word(chunk: &str) -> &str {
    chunk.split(char::is_whitespace).next().unwrap_or(chunk)
}

const fn is_opening_punctuation(c: char) -> bool {
    matches!(c, '(' | '[' | '"' | '\'' | '„' | '“' | '‚' | '«' | '»')
}

const fn is_closing_punctuation(c: char) -> bool {
    matches!(c, ')' | ']' | '"' | '\'' | '”' | '’' | '.' | ',' | ';' | ':' | '!' | '?' | '«' | '»')
}

impl LanguageRules {
    /// Whether the space between `left` and `right` must not break.
    fn binds(&self, left: &str, right: &str) -> bool {
        if left.is_empty() || right.is_empty() {
            return false;
        }

        self.is_orphan(left)
            || (is_number(left) && self.is_unit(right))
            || right.starts_with(self.spaced_punctuation)
            || left.ends_with(self.opening_marks)
    }

    fn is_orphan(&self, word: &str) -> bool {
        let word = word.trim_start_matches(is_opening_punctuation);
        self.orphan_words.iter().any(|orphan| word.to_lowercase() == *orphan)
    }

    fn is_unit(&self, word: &str) -> bool {
        let trimmed = word.trim_end_matches(is_closing_punctuation);
        let matches = |unit: &&str| *unit == trimmed || *unit == word;
        COMMON_UNITS.iter().any(matches) || self.units.iter().any(matches)
    }
}

fn is_number(word: &str) -> bool {
    let word = word.trim_start_matches(is_opening_punctuation);
    word.chars().any(|c| c.is_ascii_digit())
        && word.chars().all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-' | '+' | NBSP))
}
