use std::collections::HashMap;

use crate::{InkErr, Result};

/// Symbol every sequence ends with.
pub const END_OF_TEXT: usize = 0;

/// Symbol characters outside the alphabet are encoded as.
pub const UNKNOWN: usize = 1;

/// What an unknown symbol decodes to.
pub const UNKNOWN_MARKER: char = char::REPLACEMENT_CHARACTER;

/// Letters, digits, common punctuation and space.
pub const DEFAULT_ALPHABET: &str = concat!(
    " !\"#&'()*+,-./:;?",
    "0123456789",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "abcdefghijklmnopqrstuvwxyz",
);

/// The symbol ids of a text, always terminated by `END_OF_TEXT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterSequence {
    symbols: Vec<usize>,
}

impl CharacterSequence {
    pub fn symbols(&self) -> &[usize] {
        &self.symbols
    }

    /// Amount of symbols, sentinel included.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Amount of characters of the original text.
    pub fn text_len(&self) -> usize {
        self.symbols.len() - 1
    }

    /// Whether the sequence holds nothing but the sentinel.
    pub fn is_empty(&self) -> bool {
        self.text_len() == 0
    }
}

/// Maps characters to the symbol ids the model was built with.
///
/// Ids `0` and `1` are reserved for `END_OF_TEXT` and `UNKNOWN`, the alphabet follows in order.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    alphabet: Vec<char>,
    ids: HashMap<char, usize>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let alphabet: Vec<char> = DEFAULT_ALPHABET.chars().collect();
        let ids = Self::index(&alphabet);
        Self { alphabet, ids }
    }
}

impl Vocabulary {
    /// Creates a vocabulary over `alphabet`.
    ///
    /// # Returns
    /// The vocabulary or a `Config` error if a character is repeated.
    pub fn new(alphabet: &str) -> Result<Self> {
        let alphabet: Vec<char> = alphabet.chars().collect();
        let ids = Self::index(&alphabet);

        if ids.len() != alphabet.len() {
            return Err(InkErr::Config("the alphabet repeats characters".into()));
        }

        Ok(Self { alphabet, ids })
    }

    fn index(alphabet: &[char]) -> HashMap<char, usize> {
        alphabet
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i + 2))
            .collect()
    }

    /// Amount of symbols, reserved ones included.
    pub fn size(&self) -> usize {
        self.alphabet.len() + 2
    }

    pub fn contains(&self, c: char) -> bool {
        self.ids.contains_key(&c)
    }

    pub fn encode(&self, text: &str) -> CharacterSequence {
        let symbols = text
            .chars()
            .map(|c| self.ids.get(&c).copied().unwrap_or(UNKNOWN))
            .chain([END_OF_TEXT])
            .collect();

        CharacterSequence { symbols }
    }

    /// Turns symbol ids back into text. The sentinel is dropped, unknown and out of range ids
    /// become `UNKNOWN_MARKER`.
    pub fn decode(&self, symbols: &[usize]) -> String {
        symbols
            .iter()
            .filter(|&&s| s != END_OF_TEXT)
            .map(|&s| {
                s.checked_sub(2)
                    .and_then(|i| self.alphabet.get(i).copied())
                    .unwrap_or(UNKNOWN_MARKER)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_text_round_trips() {
        let vocab = Vocabulary::default();
        let text = "Hello, World! 42 (it's fine).";
        let seq = vocab.encode(text);

        assert_eq!(seq.text_len(), text.chars().count());
        assert_eq!(seq.symbols().last(), Some(&END_OF_TEXT));
        assert_eq!(vocab.decode(seq.symbols()), text);
    }

    #[test]
    fn unknown_characters_become_the_marker() {
        let vocab = Vocabulary::default();
        let seq = vocab.encode("a€b");

        assert_eq!(seq.symbols()[1], UNKNOWN);
        assert_eq!(vocab.decode(seq.symbols()), "a\u{FFFD}b");
        assert_eq!(vocab.decode(&[vocab.size() + 3]), "\u{FFFD}");
    }

    #[test]
    fn empty_text_is_only_the_sentinel() {
        let seq = Vocabulary::default().encode("");
        assert_eq!(seq.symbols(), &[END_OF_TEXT]);
        assert!(seq.is_empty());
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn custom_alphabet() {
        let vocab = Vocabulary::new("ab").unwrap();
        assert_eq!(vocab.size(), 4);
        assert_eq!(vocab.encode("bac").symbols(), &[3, 2, UNKNOWN, END_OF_TEXT]);
        assert!(matches!(Vocabulary::new("aba"), Err(InkErr::Config(_))));
    }
}
