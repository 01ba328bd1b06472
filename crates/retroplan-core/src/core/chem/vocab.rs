use std::collections::HashMap;
use thiserror::Error;

pub const START_SYMBOL: char = '^';
pub const END_SYMBOL: char = '$';

/// Start and end markers followed by the SMILES character set.
pub const DEFAULT_SYMBOLS: &str =
    "^$#%()*+-./0123456789:=@ABCDEFGHIKLMNOPRSTUVWXYZ[\\]abcdefghiklmnoprstuy";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum VocabularyError {
    #[error("Vocabulary is missing the {role} symbol '{symbol}'")]
    MissingMarker { role: &'static str, symbol: char },

    #[error("Vocabulary contains the symbol '{0}' more than once")]
    DuplicateSymbol(char),
}

/// The ordered symbol alphabet over which the step predictor emits logits.
///
/// Index `i` of a predictor's logit vector refers to `symbols()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    symbols: Vec<char>,
    index: HashMap<char, usize>,
    end_index: usize,
}

impl Vocabulary {
    pub fn new(symbols: impl IntoIterator<Item = char>) -> Result<Self, VocabularyError> {
        let symbols: Vec<char> = symbols.into_iter().collect();
        let mut index = HashMap::with_capacity(symbols.len());
        for (i, &symbol) in symbols.iter().enumerate() {
            if index.insert(symbol, i).is_some() {
                return Err(VocabularyError::DuplicateSymbol(symbol));
            }
        }
        if !index.contains_key(&START_SYMBOL) {
            return Err(VocabularyError::MissingMarker {
                role: "start",
                symbol: START_SYMBOL,
            });
        }
        let end_index = *index.get(&END_SYMBOL).ok_or(VocabularyError::MissingMarker {
            role: "end",
            symbol: END_SYMBOL,
        })?;
        Ok(Self {
            symbols,
            index,
            end_index,
        })
    }

    pub fn from_str_symbols(symbols: &str) -> Result<Self, VocabularyError> {
        Self::new(symbols.chars())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    #[inline]
    pub fn symbol(&self, index: usize) -> Option<char> {
        self.symbols.get(index).copied()
    }

    #[inline]
    pub fn index_of(&self, symbol: char) -> Option<usize> {
        self.index.get(&symbol).copied()
    }

    #[inline]
    pub fn end_index(&self) -> usize {
        self.end_index
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        let symbols: Vec<char> = DEFAULT_SYMBOLS.chars().collect();
        let index: HashMap<char, usize> = symbols.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let end_index = index[&END_SYMBOL];
        Self {
            symbols,
            index,
            end_index,
        }
    }
}
