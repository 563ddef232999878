// words.rs - Alphabet and word-space enumeration

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{KcorrError, Result};

/// Default nucleotide alphabet, in the order used to enumerate words
pub const DNA_ALPHABET: &[u8] = b"ATCG";

/// Ordered set of symbols a sequence may contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alphabet {
    symbols: Vec<u8>,
    rank: Vec<Option<u8>>,
}

impl Alphabet {
    /// Build an alphabet from distinct ASCII symbols. Order is preserved.
    pub fn new(symbols: &[u8]) -> Result<Self> {
        if symbols.is_empty() {
            return Err(KcorrError::InvalidParameter("alphabet must not be empty".to_string()));
        }
        if symbols.len() > u8::MAX as usize {
            return Err(KcorrError::InvalidParameter(format!(
                "alphabet has {} symbols, at most {} supported",
                symbols.len(),
                u8::MAX
            )));
        }

        let mut rank = vec![None; 256];
        for (i, &symbol) in symbols.iter().enumerate() {
            if !symbol.is_ascii_graphic() {
                return Err(KcorrError::InvalidParameter(format!(
                    "alphabet symbol {:#04x} is not a printable ASCII character",
                    symbol
                )));
            }
            if rank[symbol as usize].is_some() {
                return Err(KcorrError::InvalidParameter(format!(
                    "alphabet symbol '{}' appears twice",
                    symbol as char
                )));
            }
            rank[symbol as usize] = Some(i as u8);
        }

        Ok(Self {
            symbols: symbols.to_vec(),
            rank,
        })
    }

    pub fn dna() -> Self {
        Self::new(DNA_ALPHABET).expect("DNA alphabet is valid")
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[inline]
    pub fn contains(&self, symbol: u8) -> bool {
        self.rank[symbol as usize].is_some()
    }

    /// Position of a symbol in the alphabet order
    #[inline]
    pub fn rank(&self, symbol: u8) -> Option<u8> {
        self.rank[symbol as usize]
    }

    /// True when every character of the window belongs to the alphabet
    #[inline]
    pub fn accepts(&self, window: &[u8]) -> bool {
        window.iter().all(|&c| self.contains(c))
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::dna()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.symbols))
    }
}

impl TryFrom<String> for Alphabet {
    type Error = KcorrError;

    fn try_from(value: String) -> Result<Self> {
        Alphabet::new(value.trim().to_ascii_uppercase().as_bytes())
    }
}

impl From<Alphabet> for String {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.to_string()
    }
}

/// Identity of a word space: two vectors are comparable only when these match
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WordSpaceKey {
    pub alphabet: Vec<u8>,
    pub k: usize,
}

impl fmt::Display for WordSpaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k={} over '{}'", self.k, String::from_utf8_lossy(&self.alphabet))
    }
}

/// All words of length k over an alphabet, in Cartesian-product order.
///
/// The first symbol varies slowest, so for `ATCG` and k = 2 the order is
/// `AA, AT, AC, AG, TA, ...`. Position in this order is the index of the
/// word in every frequency vector built from this space.
#[derive(Debug, Clone)]
pub struct WordSpace {
    alphabet: Alphabet,
    k: usize,
    size: usize,
    /// Words back to back, k bytes each
    words: Vec<u8>,
    index: HashMap<Box<[u8]>, usize>,
}

impl WordSpace {
    /// Largest k accepted; at 4^12 words the lookup table alone is about a gigabyte
    pub const MAX_K: usize = 12;

    pub fn new(alphabet: Alphabet, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(KcorrError::InvalidParameter("word length k must be at least 1".to_string()));
        }
        if k > Self::MAX_K {
            return Err(KcorrError::InvalidParameter(format!(
                "word length k = {} exceeds the supported maximum of {}",
                k,
                Self::MAX_K
            )));
        }

        let size = alphabet
            .len()
            .checked_pow(k as u32)
            .ok_or_else(|| KcorrError::InvalidParameter(format!("word space |alphabet|^{} overflows", k)))?;

        let symbols = alphabet.symbols();
        let base = symbols.len();
        let mut words = Vec::with_capacity(size * k);
        let mut index = HashMap::with_capacity(size);
        let mut word = vec![0u8; k];

        for position in 0..size {
            // Decode the position as k base-|alphabet| digits, most significant first
            let mut rest = position;
            for slot in word.iter_mut().rev() {
                *slot = symbols[rest % base];
                rest /= base;
            }
            words.extend_from_slice(&word);
            index.insert(word.clone().into_boxed_slice(), position);
        }

        log::debug!("Word space {} built: {} words", alphabet, size);

        Ok(Self {
            alphabet,
            k,
            size,
            words,
            index,
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Word at a vector position
    pub fn word(&self, position: usize) -> Option<&[u8]> {
        let start = position.checked_mul(self.k)?;
        self.words.get(start..start + self.k)
    }

    /// Vector position of a word (hash lookup)
    #[inline]
    pub fn index_of(&self, word: &[u8]) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn words(&self) -> impl Iterator<Item = &[u8]> {
        self.words.chunks_exact(self.k)
    }

    pub fn key(&self) -> WordSpaceKey {
        WordSpaceKey {
            alphabet: self.alphabet.symbols().to_vec(),
            k: self.k,
        }
    }
}
