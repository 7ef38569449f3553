//! Text cleanup on both sides of the voice pipeline.
//!
//! Transcripts lose their filler words before they are sent as questions;
//! replies lose their markdown before they are read aloud.

use regex::Regex;

/// Spoken fillers removed from transcripts, matched as whole words
pub const FILLER_PHRASES: &[&str] = &[
    "um", "umm", "uh", "uhh", "uhm", "er", "erm", "ah", "hmm", "you know", "i mean",
];

#[derive(Debug, Clone)]
pub struct TextCleaner {
    fillers: Regex,
    bold: Regex,
    italic: Regex,
    code: Regex,
    link: Regex,
    whitespace: Regex,
}

impl TextCleaner {
    pub fn new() -> Result<Self, regex::Error> {
        let phrases = FILLER_PHRASES
            .iter()
            .map(|p| regex::escape(p).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            fillers: Regex::new(&format!(r"(?i)\b(?:{})\b,?", phrases))?,
            bold: Regex::new(r"\*\*(.*?)\*\*")?,
            italic: Regex::new(r"\*(.*?)\*")?,
            code: Regex::new(r"`(.*?)`")?,
            link: Regex::new(r"\[([^\]]+)\]\([^)]+\)")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Strip filler words and collapse whitespace.
    pub fn clean_transcript(&self, transcript: &str) -> String {
        let stripped = self.fillers.replace_all(transcript, " ");
        self.collapse(&stripped)
    }

    /// Remove markdown markup so a synthesizer reads only the words.
    pub fn clean_for_speech(&self, text: &str) -> String {
        let text = self.bold.replace_all(text, "$1");
        let text = self.italic.replace_all(&text, "$1");
        let text = self.code.replace_all(&text, "$1");
        let text = self.link.replace_all(&text, "$1");
        let text = text.replace(['*', '`'], "");
        self.collapse(&text)
    }

    fn collapse(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> TextCleaner {
        TextCleaner::new().unwrap()
    }

    #[test]
    fn test_strips_fillers() {
        let cleaned = cleaner().clean_transcript("Um, can my landlord uh keep my deposit?");
        assert_eq!(cleaned, "can my landlord keep my deposit?");
    }

    #[test]
    fn test_fillers_are_case_insensitive_phrases() {
        let cleaned = cleaner().clean_transcript("So, You Know, I  mean my boss HMM fired me");
        assert_eq!(cleaned, "So, my boss fired me");
    }

    #[test]
    fn test_fillers_match_whole_words_only() {
        let cleaned = cleaner().clean_transcript("The umbrella policy covers error and harm");
        assert_eq!(cleaned, "The umbrella policy covers error and harm");
    }

    #[test]
    fn test_only_fillers_leaves_nothing() {
        assert!(cleaner().clean_transcript("  um uh  erm ").is_empty());
    }

    #[test]
    fn test_clean_for_speech() {
        let text = "**Important:** you *may* file a `complaint` at [the board](https://example.org).\n\n* Keep records";
        assert_eq!(
            cleaner().clean_for_speech(text),
            "Important: you may file a complaint at the board. Keep records"
        );
    }
}
