use crate::sim::random::RandomModel;

/// Phred+33 for Q40.
const DEFAULT_QUALITY: u8 = b'I';

/// Quality strings (Phred+33) that simulated reads borrow from.
#[derive(Debug, Clone)]
pub struct QualityPool {
    strings: Vec<Vec<u8>>,
}

impl QualityPool {
    /// Empty strings are discarded; an empty pool falls back to constant Q40.
    pub fn new(strings: Vec<Vec<u8>>) -> Self {
        let strings: Vec<Vec<u8>> = strings.into_iter().filter(|s| !s.is_empty()).collect();
        if strings.is_empty() {
            Self::constant()
        } else {
            Self { strings }
        }
    }

    pub fn constant() -> Self {
        Self {
            strings: vec![vec![DEFAULT_QUALITY]],
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// Whether this is the constant Q40 fallback.
    pub fn is_constant(&self) -> bool {
        self.strings.len() == 1 && self.strings[0] == [DEFAULT_QUALITY]
    }

    /// Uniformly picks a string and fits it to `read_length`, padding with its last value.
    pub fn draw(&self, rng: &mut RandomModel, read_length: usize) -> Vec<u8> {
        let source = &self.strings[rng.range(0, self.strings.len())];
        let pad = *source.last().unwrap_or(&DEFAULT_QUALITY);
        let mut qual: Vec<u8> = source.iter().copied().take(read_length).collect();
        qual.resize(read_length, pad);
        qual
    }
}
