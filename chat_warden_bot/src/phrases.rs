//! The rule lists. All entries are stored lowercase; matching
//! lowercases the input first, so casing variants of the same phrase
//! collapse into a single entry.

/// Phrases that get a message deleted outright, with no warning
/// counted. These are the "write me privately" solicitations.
pub static FORBIDDEN_PHRASES: &[&str] = &[
    "го в лс",
    "в лс",
    "файлик лс",
    "файлик в лс",
    "файлик в личку",
    "в личке",
    "пиши в лс",
    "напиши в лс",
    "в личные сообщения",
    "скинь в личку",
    "в личку",
    "кину в личку",
    "пишите в личку",
    "вышлю в лс",
    "скинь лс",
    "пиши лс",
    "напиши лс",
    "скинь в лс",
];

/// Phrases that count a warning toward blacklisting the sender.
pub static WARNING_PHRASES: &[&str] = &[
    "есть машинка",
    "скинь машинку",
    "скину машинку",
    "машинка",
    "го машинку",
    "лс машинка",
    "машинка лс",
    "лс машинку",
    "машнка",
    "личка",
    "файл",
    "бот дурак",
];

/// Plain substring containment of any table entry within
/// `lowered_text`. The caller lowercases; no word boundaries, no
/// punctuation handling.
pub fn contains_any(lowered_text: &str, table: &[&str]) -> bool {
    table.iter().any(|phrase| lowered_text.contains(phrase))
}
