//! Text normalisation applied before text reaches a provider.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static SCENE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)scene\s*\d+\s*:?").expect("static regex"));

static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(.*?\)|\[.*?\]").expect("static regex"));

static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").expect("static regex"));

static SENSITIVE_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(blinded|blood|gory|dead|kill|exploding|explosion|violent|destruction|crumbling)",
    )
    .expect("static regex")
});

/// Strip stage directions from a script so only spoken words remain.
///
/// Removes `Scene N:` labels, parenthesised and bracketed annotations,
/// and collapses runs of blank lines.
pub fn clean_narration_text(script: &str) -> String {
    let text = SCENE_LABEL.replace_all(script, "");
    let text = ANNOTATION.replace_all(&text, "");
    let text = BLANK_RUN.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Replace words that commonly trip image safety filters.
///
/// Matches inside longer words too, so "bloody" and "deadline" are softened.
pub fn desensitize_prompt(prompt: &str) -> String {
    SENSITIVE_WORD.replace_all(prompt, "dramatic").into_owned()
}

/// Whether a prompt contains any filter-sensitive words.
pub fn contains_sensitive_words(prompt: &str) -> bool {
    SENSITIVE_WORD.is_match(prompt)
}

/// Compose a scene prompt with the draft's global style.
pub fn styled_scene_prompt(scene_prompt: &str, visual_style: &str) -> String {
    format!("{} | STYLE: {}", scene_prompt, visual_style)
}
