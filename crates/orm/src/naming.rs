//! Naming conventions for tables, key columns and join tables
//!
//! English-centric inflection plus the column guessing rules used when a
//! relationship does not name its fields explicitly.

const IRREGULARS: &[(&str, &str)] = &[
    ("child", "children"),
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("ox", "oxen"),
    ("datum", "data"),
    ("criterion", "criteria"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("analysis", "analyses"),
    ("crisis", "crises"),
    ("thesis", "theses"),
    ("diagnosis", "diagnoses"),
    ("hypothesis", "hypotheses"),
    ("leaf", "leaves"),
    ("knife", "knives"),
    ("life", "lives"),
    ("wife", "wives"),
    ("half", "halves"),
    ("wolf", "wolves"),
    ("shelf", "shelves"),
];

const UNCOUNTABLES: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "deer",
    "news",
    "staff",
    "metadata",
];

/// Singulars ending in `ie`, whose plurals would otherwise read as `-y` words
const IE_SINGULARS: &[&str] = &[
    "movie", "cookie", "zombie", "rookie", "calorie", "brownie", "selfie", "smoothie", "goalie",
    "prairie", "genie", "hoodie", "birdie", "auntie", "sweetie", "freebie", "newbie", "lingerie",
    "magpie", "necktie", "hippie", "veggie", "bookie", "pixie", "sortie", "junkie", "groupie",
    "cutie", "eyrie", "reverie",
];

/// Singulars ending in `s` that take `es`; any other `-ses` plural drops only the `s`
const SIBILANT_SINGULARS: &[&str] = &[
    "status", "bus", "campus", "virus", "bonus", "census", "focus", "genus", "nexus", "apparatus",
    "prospectus", "syllabus", "abacus", "surplus", "plus", "circus", "onus", "sinus", "thesaurus",
    "walrus", "fetus", "hiatus", "consensus", "octopus", "alias", "atlas", "canvas", "gas", "bias",
    "lens", "iris",
];

/// Singulars ending in a single `z` that double it: `quiz` -> `quizzes`
const DOUBLED_Z_SINGULARS: &[&str] = &["quiz", "whiz", "fez", "biz"];

/// Plural form of `word`.
///
/// Only the last camel-case or snake-case segment is inflected, so
/// `DoctorPatient` gives `DoctorPatients` and `SchoolChild` gives
/// `SchoolChildren`. The case of the segment's first letter is kept.
pub fn pluralize(word: &str) -> String {
    let (prefix, segment) = split_last_segment(word);
    format!("{}{}", prefix, pluralize_segment(segment))
}

/// Singular form of `word`, the inverse of [`pluralize`]
pub fn singularize(word: &str) -> String {
    let (prefix, segment) = split_last_segment(word);
    format!("{}{}", prefix, singularize_segment(segment))
}

fn pluralize_segment(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_lowercase();

    if UNCOUNTABLES.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULARS.iter().find(|(singular, _)| *singular == lower) {
        return match_case(word, plural);
    }
    if IRREGULARS.iter().any(|(_, plural)| *plural == lower) {
        return word.to_string();
    }

    if DOUBLED_Z_SINGULARS.contains(&lower.as_str()) {
        format!("{}zes", word)
    } else if lower.ends_with('y') && !ends_with_any(&lower, &["ay", "ey", "iy", "oy", "uy"]) {
        format!("{}ies", &word[..word.len() - 1])
    } else if ends_with_any(&lower, &["s", "sh", "ch", "x", "z"]) {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

fn singularize_segment(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_lowercase();

    if UNCOUNTABLES.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULARS.iter().find(|(_, plural)| *plural == lower) {
        return match_case(word, singular);
    }
    if IRREGULARS.iter().any(|(singular, _)| *singular == lower) {
        return word.to_string();
    }

    let stem = |suffix: &str| {
        word.get(..word.len().saturating_sub(suffix.len()))
            .unwrap_or(word)
            .to_string()
    };
    let plural_of = |singulars: &[&str], suffix: &str| {
        singulars.iter().any(|singular| lower.len() == singular.len() + suffix.len() && lower.starts_with(singular))
    };

    if lower.ends_with("zzes") && plural_of(DOUBLED_Z_SINGULARS, "zes") {
        stem("zes")
    } else if lower.ends_with("es") && plural_of(SIBILANT_SINGULARS, "es") {
        stem("es")
    } else if lower.ends_with("ies") && (lower.len() == 4 || plural_of(IE_SINGULARS, "s")) {
        // pies, ties, movies
        stem("s")
    } else if lower.ends_with("ies") && word.len() > 3 {
        format!("{}y", stem("ies"))
    } else if ends_with_any(&lower, &["sses", "shes", "ches", "xes", "zzes"]) {
        stem("es")
    } else if ends_with_any(&lower, &["ss", "us", "is"]) {
        word.to_string()
    } else if lower.ends_with('s') && word.len() > 1 {
        stem("s")
    } else {
        word.to_string()
    }
}

/// Split before the last camel-case hump or after the last underscore
fn split_last_segment(word: &str) -> (&str, &str) {
    let hump = word
        .char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_uppercase())
        .map(|(index, _)| index)
        .last();
    let underscore = word.rfind('_').map(|index| index + 1);
    let start = hump.into_iter().chain(underscore).max().unwrap_or(0);
    word.split_at(start)
}

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn decapitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Foreign key column referencing `column` of `table`.
///
/// `("Parents", "id")` gives `"parentId"`; schema-qualified table names use
/// their last segment.
pub fn guess_column_name(table: &str, column: &str) -> String {
    let table = table.rsplit('.').next().unwrap_or(table);
    format!("{}{}", decapitalize(&singularize(table)), capitalize(column))
}

/// Default join table for a many-to-many relationship between two tables.
///
/// Both names are singularized and sorted so that either side of the
/// relationship arrives at the same table: `("Students", "Courses")` and
/// `("Courses", "Students")` both give `"courseStudent"`.
pub fn guess_table_name(local_table: &str, remote_table: &str) -> String {
    let mut names = [
        singularize(local_table.rsplit('.').next().unwrap_or(local_table)),
        singularize(remote_table.rsplit('.').next().unwrap_or(remote_table)),
    ];
    names.sort_by_key(|name| name.to_lowercase());
    format!("{}{}", decapitalize(&names[0]), capitalize(&names[1]))
}

pub fn guess_id_column() -> &'static str {
    "id"
}

fn ends_with_any(word: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|suffix| word.ends_with(suffix))
}

fn match_case(original: &str, replacement: &str) -> String {
    if original.chars().next().is_some_and(char::is_uppercase) {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}
