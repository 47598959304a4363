//! Core types and structures for ARINC 429 words

use crate::error::{CodecError, Result};
use crate::wire;
use bitfield::bitfield;

/// ARINC 429 label (8 bits)
///
/// Labels are conventionally written in octal, so the altitude label
/// `0o203` prints as `203`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label(u8);

impl Label {
    /// Barometric altitude
    pub const ALTITUDE: Label = Label(0o203);
    /// Airspeed
    pub const AIRSPEED: Label = Label(0o206);
    /// Mach number
    pub const MACH: Label = Label(0o207);
    /// Total air temperature
    pub const TEMPERATURE: Label = Label(0o211);
    /// Heading
    pub const HEADING: Label = Label(0o222);
    /// Pitch angle
    pub const PITCH: Label = Label(0o324);
    /// Roll angle
    pub const ROLL: Label = Label(0o325);
    /// Vertical speed
    pub const VERTICAL_SPEED: Label = Label(0o365);

    /// Known labels and their names
    const TABLE: [(Label, &'static str); 8] = [
        (Label::ALTITUDE, "ALTITUDE"),
        (Label::AIRSPEED, "AIRSPEED"),
        (Label::MACH, "MACH"),
        (Label::HEADING, "HEADING"),
        (Label::VERTICAL_SPEED, "VERTICAL_SPEED"),
        (Label::PITCH, "PITCH"),
        (Label::ROLL, "ROLL"),
        (Label::TEMPERATURE, "TEMPERATURE"),
    ];

    /// Create a label from its raw value
    pub const fn new(value: u8) -> Self {
        Label(value)
    }

    /// Get the raw label value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Reverse lookup against the fixed label table
    ///
    /// Returns `None` for labels that are not published by this crate.
    pub fn name(&self) -> Option<&'static str> {
        Self::TABLE
            .iter()
            .find(|(label, _)| label == self)
            .map(|(_, name)| *name)
    }
}

impl From<u8> for Label {
    fn from(value: u8) -> Self {
        Label(value)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03o}", self.0)
    }
}

/// Source/Destination Identifier (2 bits, 0-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Sdi(u8);

impl Sdi {
    /// Maximum SDI value
    pub const MAX: u8 = 3;

    /// Create a new SDI, validating it's within range [0, 3]
    pub fn new(sdi: u8) -> Result<Self> {
        if sdi > Self::MAX {
            return Err(CodecError::invalid_field(format!(
                "SDI {} out of range [0, {}]",
                sdi,
                Self::MAX
            )));
        }
        Ok(Sdi(sdi))
    }

    /// Get the raw SDI value
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Sdi {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        Sdi::new(value)
    }
}

impl From<Sdi> for u8 {
    fn from(sdi: Sdi) -> Self {
        sdi.0
    }
}

/// Sign/Status Matrix (2 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ssm {
    /// No computed data
    NoComputedData = 0,
    /// Functional test
    FunctionalTest = 1,
    /// Failure warning
    FailureWarning = 2,
    /// Normal operation
    NormalOperation = 3,
}

impl Ssm {
    /// Decode the SSM from the low two bits of `bits`
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Ssm::NoComputedData,
            1 => Ssm::FunctionalTest,
            2 => Ssm::FailureWarning,
            _ => Ssm::NormalOperation,
        }
    }

    /// Convert SSM to its bit representation
    pub fn as_bits(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for Ssm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ssm::NoComputedData => write!(f, "NCD"),
            Ssm::FunctionalTest => write!(f, "FT"),
            Ssm::FailureWarning => write!(f, "FW"),
            Ssm::NormalOperation => write!(f, "NO"),
        }
    }
}

bitfield! {
    /// Packed 32-bit layout: label(31:24) | sdi(23:22) | data(21:3) | ssm(2:1) | parity(0)
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    struct RawWord(u32);
    u8, label, set_label: 31, 24;
    u8, sdi, set_sdi: 23, 22;
    u32, data, set_data: 21, 3;
    u8, ssm, set_ssm: 2, 1;
    u8, parity, set_parity: 0, 0;
}

/// A single ARINC 429 word
///
/// Words are immutable once built. [`Word::new`] computes the parity bit,
/// so every word built from fields satisfies odd parity. Words unpacked
/// with [`Word::from_u32`] keep whatever parity bit they arrived with and
/// must be checked with [`Word::is_parity_valid`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u32", from = "u32"))]
pub struct Word(RawWord);

impl Word {
    /// Build a word from its fields, computing odd parity
    pub fn new(label: Label, sdi: Sdi, data: u32, ssm: Ssm) -> Result<Self> {
        if data > wire::DATA_MASK {
            return Err(CodecError::invalid_field(format!(
                "Data {:#X} exceeds 19 bits",
                data
            )));
        }

        let mut raw = RawWord(0);
        raw.set_label(label.value());
        raw.set_sdi(sdi.value());
        raw.set_data(data);
        raw.set_ssm(ssm.as_bits());
        raw.set_parity(Self::calculate_parity(raw.0));

        Ok(Word(raw))
    }

    /// Unpack a word from its 32-bit transport form
    ///
    /// The stored parity bit is taken as-is, so a corrupted word keeps
    /// its corrupted parity.
    pub fn from_u32(raw: u32) -> Self {
        Word(RawWord(raw))
    }

    /// Pack the word into its 32-bit transport form
    pub fn to_u32(&self) -> u32 {
        self.0 .0
    }

    /// Get the label
    pub fn label(&self) -> Label {
        Label(self.0.label())
    }

    /// Get the source/destination identifier
    pub fn sdi(&self) -> Sdi {
        Sdi(self.0.sdi())
    }

    /// Get the 19-bit data field
    pub fn data(&self) -> u32 {
        self.0.data()
    }

    /// Get the sign/status matrix
    pub fn ssm(&self) -> Ssm {
        Ssm::from_bits(self.0.ssm())
    }

    /// Get the stored parity bit
    pub fn parity(&self) -> u8 {
        self.0.parity()
    }

    /// Check the stored parity bit against the one computed from the fields
    pub fn is_parity_valid(&self) -> bool {
        Self::calculate_parity(self.0 .0) == self.parity()
    }

    /// Calculate the odd parity bit for a packed word
    ///
    /// Bit 0 of `word` is ignored. The result makes the total number of
    /// set bits across all 32 bits odd.
    ///
    /// Label bit 31 is counted. Producers that compute parity over bits
    /// 30..1 only disagree on the parity bit for every label at or above
    /// 0o200, so their words fail [`Word::is_parity_valid`] here.
    pub fn calculate_parity(word: u32) -> u8 {
        let count_ones = (word & !wire::PARITY_MASK).count_ones();

        // An even count needs a parity bit of 1 to make the total odd
        if count_ones % 2 == 0 {
            1
        } else {
            0
        }
    }
}

impl From<Word> for u32 {
    fn from(word: Word) -> Self {
        word.to_u32()
    }
}

impl From<u32> for Word {
    fn from(raw: u32) -> Self {
        Word::from_u32(raw)
    }
}

impl std::fmt::Debug for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Word")
            .field("label", &self.label())
            .field("sdi", &self.sdi().value())
            .field("data", &self.data())
            .field("ssm", &self.ssm())
            .field("parity", &self.parity())
            .finish()
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Word(label={}, sdi={}, data={}, ssm={}, raw=0x{:08X})",
            self.label(),
            self.sdi().value(),
            self.data(),
            self.ssm(),
            self.to_u32()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdi_creation() {
        assert!(Sdi::new(0).is_ok());
        assert!(Sdi::new(3).is_ok());
        assert!(Sdi::new(4).is_err());
    }

    #[test]
    fn test_sdi_conversions() {
        assert_eq!(Sdi::try_from(2u8).map(u8::from), Ok(2));
        assert!(matches!(Sdi::try_from(7u8), Err(CodecError::InvalidField(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_sdi_deserialize_validates() {
        assert_eq!(serde_json::from_str::<Sdi>("3").ok(), Sdi::new(3).ok());
        assert!(serde_json::from_str::<Sdi>("7").is_err());
        assert_eq!(serde_json::to_string(&Sdi::default()).ok().as_deref(), Some("0"));
    }

    #[test]
    fn test_label_lookup() {
        assert_eq!(Label::ALTITUDE.value(), 131);
        assert_eq!(Label::ALTITUDE.name(), Some("ALTITUDE"));
        assert_eq!(Label::new(0o377).name(), None);
        assert_eq!(Label::ROLL.name(), Some("ROLL"));
    }

    #[test]
    fn test_label_display_is_octal() {
        assert_eq!(Label::VERTICAL_SPEED.to_string(), "365");
        assert_eq!(Label::new(7).to_string(), "007");
    }

    #[test]
    fn test_word_layout() -> Result<()> {
        let word = Word::new(Label::ALTITUDE, Sdi::new(2)?, 35000, Ssm::NormalOperation)?;
        let raw = word.to_u32();

        assert_eq!(raw >> 24, 0o203);
        assert_eq!((raw >> 22) & 0x3, 2);
        assert_eq!((raw >> 3) & 0x7FFFF, 35000);
        assert_eq!((raw >> 1) & 0x3, 3);
        assert_eq!(raw & 1, word.parity() as u32);
        Ok(())
    }

    #[test]
    fn test_word_has_odd_parity() -> Result<()> {
        for data in [0u32, 1, 0x7FFFF, 0x2AAAA, 35000] {
            for ssm in [Ssm::NoComputedData, Ssm::NormalOperation] {
                let word = Word::new(Label::PITCH, Sdi::default(), data, ssm)?;
                assert_eq!(word.to_u32().count_ones() % 2, 1);
                assert!(word.is_parity_valid());
            }
        }
        Ok(())
    }

    #[test]
    fn test_word_data_overflow() {
        let result = Word::new(Label::MACH, Sdi::default(), 0x80000, Ssm::NormalOperation);
        assert!(matches!(result, Err(CodecError::InvalidField(_))));
    }

    #[test]
    fn test_from_u32_keeps_stored_parity() -> Result<()> {
        let word = Word::new(Label::ROLL, Sdi::new(1)?, 1234, Ssm::NormalOperation)?;
        let corrupted = Word::from_u32(word.to_u32() ^ 1);

        assert_eq!(corrupted.parity(), word.parity() ^ 1);
        assert_eq!(corrupted.data(), 1234);
        assert!(!corrupted.is_parity_valid());
        Ok(())
    }

    #[test]
    fn test_calculate_parity() {
        // No ones at all: parity must supply the odd bit
        assert_eq!(Word::calculate_parity(0), 1);
        // Bit 0 is the parity slot and is not counted
        assert_eq!(Word::calculate_parity(1), 1);
        assert_eq!(Word::calculate_parity(0b10), 0);
        // Label bit 31 counts like any other bit
        assert_eq!(Word::calculate_parity(0x8000_0000), 0);
    }

    #[test]
    fn test_parity_counts_top_label_bit() -> Result<()> {
        let word = Word::new(Label::ALTITUDE, Sdi::default(), 35_000, Ssm::NormalOperation)?;
        let low_bits_parity = Word::calculate_parity(word.to_u32() & !(1 << 31));
        assert_ne!(word.parity(), low_bits_parity);

        let foreign = Word::from_u32((word.to_u32() & !1) | u32::from(low_bits_parity));
        assert!(!foreign.is_parity_valid());
        Ok(())
    }

    #[test]
    fn test_ssm_bits() {
        assert_eq!(Ssm::from_bits(0b11), Ssm::NormalOperation);
        assert_eq!(Ssm::from_bits(0b110), Ssm::FailureWarning);
        assert_eq!(Ssm::FunctionalTest.as_bits(), 1);
    }

    #[test]
    fn test_word_display() -> Result<()> {
        let word = Word::new(Label::ALTITUDE, Sdi::default(), 35000, Ssm::NormalOperation)?;
        let text = word.to_string();
        assert!(text.contains("label=203"));
        assert!(text.contains(&format!("raw=0x{:08X}", word.to_u32())));
        Ok(())
    }
}
