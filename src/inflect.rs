//! Naming rules: plural/singular inflection and identifier casing.
//!
//! The suffix rules are deliberately small. They handle the regular noun
//! classes found in typical schemas (`Orders`, `Categories`, `Boxes`,
//! `Addresses`) and leave everything else to the irregular-noun table.
//! Known limitations: stems ending in `-se`, `-ie`, `-o` or `-u` do not survive
//! a pluralize/singularize round trip (`Cases` singularizes to `Cas`).

use std::cell::Cell;
use std::sync::LazyLock;

use regex::Regex;

use crate::settings::GeneratorSettings;

/// Canonical name of a primary key column, and suffix of a foreign key column.
pub const PRIMARY_KEY_ID_NAME: &str = "Id";

/// Prefix that turns a reserved word into a usable identifier.
pub const RESERVED_ESCAPE: &str = "@";

static ENDS_WITH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9 _]ID$").expect("static regex"));
static ALL_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9 ]+$").expect("static regex"));
static ALL_LOWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+$").expect("static regex"));
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]+").expect("static regex"));

const RESERVED_WORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Whether `word` is a keyword of the generated language.
pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

/// Strip a trailing `Id` (any case).
pub fn remove_id(name: &str) -> &str {
    match strip_suffix_ci(name, PRIMARY_KEY_ID_NAME) {
        Some(stem) => stem,
        None => name,
    }
}

/// `CustomerID` and `Customer` both become `CustomerId`.
pub fn append_id(name: &str) -> String {
    format!("{}{}", remove_id(name), PRIMARY_KEY_ID_NAME)
}

fn strip_suffix_ci<'a>(word: &'a str, suffix: &str) -> Option<&'a str> {
    let split = word.len().checked_sub(suffix.len())?;
    let tail = word.get(split..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        word.get(..split)
    } else {
        None
    }
}

fn ends_with_ci(word: &str, suffix: &str) -> bool {
    strip_suffix_ci(word, suffix).is_some()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Give `replacement` the capitalisation style of `source`.
fn match_case(source: &str, replacement: &str) -> String {
    let letters: Vec<char> = source.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        replacement.to_uppercase()
    } else if source.chars().next().is_some_and(char::is_uppercase) {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

/// Word-level inflection plus identifier casing, configured with an explicit
/// irregular-noun table.
#[derive(Debug)]
pub struct Inflector {
    /// Lowercase `(singular, plural)` pairs.
    irregulars: Vec<(String, String)>,
    placeholders: Cell<u32>,
}

impl Default for Inflector {
    fn default() -> Self {
        Self::new([("person", "people"), ("child", "children")])
    }
}

impl Inflector {
    pub fn new<I, S>(irregulars: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        Self {
            irregulars: irregulars
                .into_iter()
                .map(|(s, p)| (s.as_ref().to_lowercase(), p.as_ref().to_lowercase()))
                .collect(),
            placeholders: Cell::new(0),
        }
    }

    pub fn from_settings(settings: &GeneratorSettings) -> Self {
        Self::new(settings.irregular_nouns.iter())
    }

    fn irregular_singular(&self, word: &str) -> Option<String> {
        let lower = word.to_lowercase();
        self.irregulars
            .iter()
            .find(|(_, plural)| *plural == lower)
            .map(|(singular, _)| match_case(word, singular))
    }

    fn irregular_plural(&self, word: &str) -> Option<String> {
        let lower = word.to_lowercase();
        self.irregulars
            .iter()
            .find(|(singular, _)| *singular == lower)
            .map(|(_, plural)| match_case(word, plural))
    }

    /// Strip a plural suffix. The first matching rule wins.
    pub fn singularize(&self, word: &str) -> String {
        if let Some(singular) = self.irregular_singular(word) {
            return singular;
        }
        if ends_with_ci(word, "ss") || ends_with_ci(word, "us") {
            // Address, Status
            word.to_string()
        } else if let Some(stem) = strip_suffix_ci(word, "es").filter(|_| ends_with_ci(word, "ses")) {
            // Buses -> Bus
            stem.to_string()
        } else if let Some(stem) = strip_suffix_ci(word, "ies") {
            format!("{stem}y")
        } else if let Some(stem) = strip_suffix_ci(word, "xes") {
            format!("{stem}x")
        } else if let Some(stem) = strip_suffix_ci(word, "s") {
            stem.to_string()
        } else {
            word.to_string()
        }
    }

    pub fn pluralize(&self, word: &str) -> String {
        if word.is_empty() {
            return String::new();
        }
        if let Some(plural) = self.irregular_plural(word) {
            return plural;
        }
        if ends_with_ci(word, "ss") || ends_with_ci(word, "o") || ends_with_ci(word, "x") {
            // Addresses, Heroes, Boxes
            format!("{word}es")
        } else if let Some(stem) = strip_suffix_ci(word, "y") {
            format!("{stem}ies")
        } else {
            format!("{word}s")
        }
    }

    /// Heuristic plural detection. Used for diagnostics, never for naming.
    pub fn is_plural(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        if self.irregulars.iter().any(|(_, plural)| *plural == lower) {
            return true;
        }
        ["ys", "es", "ies", "uses", "ses", "ves", "ices"]
            .iter()
            .any(|suffix| lower.ends_with(suffix))
    }

    /// Collection name for a class: pluralized, or `{class}Collection` when
    /// pluralization is switched off.
    pub fn name_collection(&self, class_name: &str, pluralize: bool) -> String {
        if pluralize {
            self.pluralize(class_name)
        } else {
            format!("{class_name}Collection")
        }
    }

    fn placeholder(&self, prefix: char) -> String {
        let next = self.placeholders.get() + 1;
        self.placeholders.set(next);
        format!("{prefix}{next}")
    }

    /// Database name to a singular PascalCase type name.
    pub fn to_pascal_case(&self, name: &str) -> String {
        if name.is_empty() {
            return self.placeholder('A');
        }
        let ends_with_id = ENDS_WITH_ID.is_match(name);

        let name = self.singularize(&make_pascal_case(name));
        let name = if ends_with_id { fix_trailing_id(name) } else { name };

        self.finish_identifier(NON_WORD.replace_all(&name, "").into_owned(), 'A')
    }

    /// Database name to a camelCase member name. No singularization.
    pub fn to_camel_case(&self, name: &str) -> String {
        if name.is_empty() {
            return self.placeholder('a');
        }
        let ends_with_id = ENDS_WITH_ID.is_match(name);

        let name = make_pascal_case(name);
        let name = if ends_with_id { fix_trailing_id(name) } else { name };
        let name = NON_WORD.replace_all(&name, "");

        let mut chars = name.chars();
        let name = match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        };
        self.finish_identifier(name, 'a')
    }

    fn finish_identifier(&self, name: String, placeholder: char) -> String {
        if name.is_empty() {
            return self.placeholder(placeholder);
        }
        let name = if name.starts_with(|c: char| c.is_ascii_digit()) {
            format!("_{name}")
        } else {
            name
        };
        if is_reserved(&name) {
            format!("{RESERVED_ESCAPE}{name}")
        } else {
            name
        }
    }
}

/// `customerID` style names end in a capital `ID`; make that `Id`.
fn fix_trailing_id(mut name: String) -> String {
    if name.ends_with("ID") {
        name.truncate(name.len() - 2);
        name.push_str(PRIMARY_KEY_ID_NAME);
    }
    name
}

fn make_pascal_case(name: &str) -> String {
    let name = name.replace(['_', '$', '#'], " ");
    let name = if ALL_UPPER.is_match(&name) {
        name.to_lowercase()
    } else {
        name
    };

    // mixed case without breaks is already Pascal (or camel) case
    if !name.contains(' ') && !ALL_LOWER.is_match(&name) {
        return capitalize(&name);
    }

    name.split(' ')
        .map(|word| {
            if word.chars().any(char::is_lowercase) {
                capitalize(&word.to_lowercase())
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
