//! Receive-side bus monitoring and per-label statistics

use crate::core::{Label, Word};
use crate::encoding::Codec;
use crate::error::{CodecError, Result};
use std::collections::BTreeMap;
use tracing::warn;

/// Reception record for one label
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelStats {
    /// Label the record belongs to
    pub label: Label,
    /// Words received under this label, good or bad
    pub received: u32,
    /// Words that failed the parity check
    pub parity_errors: u32,
    /// Most recent word that passed the parity check
    pub last_good: Option<Word>,
}

impl LabelStats {
    /// Create an empty record
    pub fn new(label: Label) -> Self {
        LabelStats {
            label,
            received: 0,
            parity_errors: 0,
            last_good: None,
        }
    }

    /// Fraction of received words that failed parity (0.0 to 1.0)
    pub fn error_rate(&self) -> f32 {
        if self.received > 0 {
            self.parity_errors as f32 / self.received as f32
        } else {
            0.0
        }
    }
}

/// Validates incoming words and keeps per-label statistics
///
/// The codec only reports parity failures; the monitor is where they are
/// turned into errors so callers can discard the word.
#[derive(Debug, Default)]
pub struct BusMonitor {
    labels: BTreeMap<Label, LabelStats>,
}

impl BusMonitor {
    /// Create a new, empty monitor
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive a word, returning it only if its parity is valid
    pub fn receive(&mut self, word: Word) -> Result<Word> {
        let stats = self
            .labels
            .entry(word.label())
            .or_insert_with(|| LabelStats::new(word.label()));
        stats.received += 1;

        if !Codec::validate(&word) {
            stats.parity_errors += 1;
            warn!(label = %word.label(), raw = word.to_u32(), "parity check failed");
            return Err(CodecError::parity_error(format!(
                "Label {} word 0x{:08X} failed odd parity",
                word.label(),
                word.to_u32()
            )));
        }

        stats.last_good = Some(word);
        Ok(word)
    }

    /// Receive a word in its 32-bit transport form
    pub fn receive_raw(&mut self, raw: u32) -> Result<Word> {
        self.receive(Word::from_u32(raw))
    }

    /// Receive a batch, keeping only the words that pass parity
    pub fn receive_all(&mut self, words: &[u32]) -> Vec<Word> {
        words
            .iter()
            .filter_map(|&raw| self.receive_raw(raw).ok())
            .collect()
    }

    /// Statistics for one label
    pub fn stats(&self, label: Label) -> Option<&LabelStats> {
        self.labels.get(&label)
    }

    /// Statistics for every label seen, in label order
    pub fn all_stats(&self) -> Vec<&LabelStats> {
        self.labels.values().collect()
    }

    /// Total words received
    pub fn total_received(&self) -> u32 {
        self.labels.values().map(|s| s.received).sum()
    }

    /// Total parity failures
    pub fn total_parity_errors(&self) -> u32 {
        self.labels.values().map(|s| s.parity_errors).sum()
    }

    /// Forget all statistics
    pub fn reset(&mut self) {
        self.labels.clear();
    }
}
