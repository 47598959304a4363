//! Scaled-value encoding and decoding for ARINC 429 words

use crate::core::{Label, Sdi, Ssm, Word};
use crate::error::{CodecError, Result};
use crate::wire;

/// Scale factor between a physical value and its data field count
///
/// A scale is always finite and non-zero, so decoding never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct Scale(f64);

impl Scale {
    /// Create a new scale, rejecting zero and non-finite factors
    pub fn new(factor: f64) -> Result<Self> {
        if factor == 0.0 || !factor.is_finite() {
            return Err(CodecError::invalid_scale(format!(
                "Scale {} must be finite and non-zero",
                factor
            )));
        }
        Ok(Scale(factor))
    }

    /// Scale for compile-time constant factors known to be valid
    pub(crate) const fn fixed(factor: f64) -> Self {
        Scale(factor)
    }

    /// Get the raw factor
    pub fn factor(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Scale {
    type Error = CodecError;

    fn try_from(factor: f64) -> Result<Self> {
        Scale::new(factor)
    }
}

impl From<Scale> for f64 {
    fn from(scale: Scale) -> Self {
        scale.0
    }
}

/// What to do when a scaled value does not fit in the data field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverflowPolicy {
    /// Fail with [`CodecError::EncodingRange`]
    #[default]
    Reject,
    /// Keep the low 19 bits and silently wrap
    Wrap,
}

/// ARINC 429 value codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Codec {
    overflow: OverflowPolicy,
    ssm: Ssm,
}

impl Codec {
    /// Create a codec with the given overflow policy, stamping normal-operation SSM
    pub fn new(overflow: OverflowPolicy) -> Self {
        Codec {
            overflow,
            ssm: Ssm::NormalOperation,
        }
    }

    /// Set the SSM stamped on encoded words
    pub fn with_ssm(mut self, ssm: Ssm) -> Self {
        self.ssm = ssm;
        self
    }

    /// Get the overflow policy
    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }

    /// Get the SSM stamped on encoded words
    pub fn ssm(&self) -> Ssm {
        self.ssm
    }

    /// Encode `value` as `round(value * scale)` in the 19-bit data field
    ///
    /// Negative counts within range end up as their 19-bit two's
    /// complement; use [`Codec::decode_signed`] to read them back.
    pub fn encode(&self, value: f64, scale: Scale, label: Label, sdi: Sdi) -> Result<Word> {
        let count = Self::scaled_count(value, scale)?;
        if count.abs() > wire::DATA_MASK as i64 && self.overflow == OverflowPolicy::Reject {
            return Err(CodecError::encoding_range(format!(
                "Label {}: {} * {} = {} exceeds 19 bits",
                label,
                value,
                scale.factor(),
                count
            )));
        }

        Word::new(label, sdi, Self::mask(count), self.ssm)
    }

    /// Encode `value` as a 19-bit two's complement count
    pub fn encode_signed(
        &self,
        value: f64,
        scale: Scale,
        label: Label,
        sdi: Sdi,
    ) -> Result<Word> {
        let count = Self::scaled_count(value, scale)?;
        let in_range = (wire::SIGNED_DATA_MIN..=wire::SIGNED_DATA_MAX).contains(&count);
        if !in_range && self.overflow == OverflowPolicy::Reject {
            return Err(CodecError::encoding_range(format!(
                "Label {}: {} * {} = {} outside signed 19-bit range [{}, {}]",
                label,
                value,
                scale.factor(),
                count,
                wire::SIGNED_DATA_MIN,
                wire::SIGNED_DATA_MAX
            )));
        }

        Word::new(label, sdi, Self::mask(count), self.ssm)
    }

    /// Decode the data field as an unsigned count: `data / scale`
    pub fn decode(word: &Word, scale: Scale) -> f64 {
        word.data() as f64 / scale.factor()
    }

    /// Decode the data field as a 19-bit two's complement count
    pub fn decode_signed(word: &Word, scale: Scale) -> f64 {
        // Move bit 18 into the i32 sign position, then shift back arithmetically
        let count = ((word.data() << 13) as i32) >> 13;
        count as f64 / scale.factor()
    }

    /// Pack a word for transport
    pub fn to_u32(word: &Word) -> u32 {
        word.to_u32()
    }

    /// Unpack a word from transport, keeping its stored parity bit
    pub fn from_u32(raw: u32) -> Word {
        Word::from_u32(raw)
    }

    /// Recompute parity and compare with the stored bit
    ///
    /// This is a wire integrity check only; it says nothing about
    /// whether the data is plausible.
    pub fn validate(word: &Word) -> bool {
        word.is_parity_valid()
    }

    /// Reverse lookup of a label name
    pub fn label_name(label: Label) -> Option<&'static str> {
        label.name()
    }

    fn scaled_count(value: f64, scale: Scale) -> Result<i64> {
        let scaled = (value * scale.factor()).round();
        if !scaled.is_finite() {
            return Err(CodecError::encoding_range(format!(
                "{} * {} is not a finite number",
                value,
                scale.factor()
            )));
        }
        Ok(scaled as i64)
    }

    fn mask(count: i64) -> u32 {
        (count & wire::DATA_MASK as i64) as u32
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(OverflowPolicy::default())
    }
}
