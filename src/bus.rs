//! Conversion between flight state snapshots and ARINC 429 words

use crate::core::{Label, Sdi, Word};
use crate::encoding::{Codec, Scale};
use crate::error::{CodecError, Result};
use crate::state::FlightState;
use std::collections::BTreeMap;
use tracing::warn;

/// Parameters published on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BusParameter {
    /// Barometric altitude (feet)
    Altitude,
    /// Airspeed (knots)
    Airspeed,
    /// Mach number
    Mach,
    /// True heading (degrees)
    Heading,
    /// Vertical speed (feet/minute)
    VerticalSpeed,
    /// Pitch angle (degrees)
    Pitch,
    /// Roll angle (degrees)
    Roll,
    /// Total air temperature (Celsius)
    Temperature,
}

impl BusParameter {
    /// All published parameters in transmission order
    pub const ALL: [BusParameter; 8] = [
        BusParameter::Altitude,
        BusParameter::Airspeed,
        BusParameter::Mach,
        BusParameter::Heading,
        BusParameter::VerticalSpeed,
        BusParameter::Pitch,
        BusParameter::Roll,
        BusParameter::Temperature,
    ];

    /// Stable key used in raw data mappings
    pub fn key(&self) -> &'static str {
        match self {
            BusParameter::Altitude => "altitude",
            BusParameter::Airspeed => "airspeed",
            BusParameter::Mach => "mach",
            BusParameter::Heading => "heading",
            BusParameter::VerticalSpeed => "vertical_speed",
            BusParameter::Pitch => "pitch",
            BusParameter::Roll => "roll",
            BusParameter::Temperature => "temperature",
        }
    }

    /// Look up a parameter by its key
    pub fn from_key(key: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.key() == key)
            .ok_or_else(|| CodecError::unknown_parameter(format!("No parameter keyed {:?}", key)))
    }

    /// Look up the parameter carried under a label
    pub fn from_label(label: Label) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }

    /// Label the parameter is transmitted under
    pub fn label(&self) -> Label {
        match self {
            BusParameter::Altitude => Label::ALTITUDE,
            BusParameter::Airspeed => Label::AIRSPEED,
            BusParameter::Mach => Label::MACH,
            BusParameter::Heading => Label::HEADING,
            BusParameter::VerticalSpeed => Label::VERTICAL_SPEED,
            BusParameter::Pitch => Label::PITCH,
            BusParameter::Roll => Label::ROLL,
            BusParameter::Temperature => Label::TEMPERATURE,
        }
    }

    /// Fixed scale factor between the value and its data field count
    pub fn scale(&self) -> Scale {
        match self {
            BusParameter::Altitude => Scale::fixed(1.0),
            BusParameter::Airspeed => Scale::fixed(128.0),
            BusParameter::Mach => Scale::fixed(8192.0),
            BusParameter::Heading => Scale::fixed(182.0444),
            BusParameter::VerticalSpeed => Scale::fixed(32.0),
            BusParameter::Pitch | BusParameter::Roll => Scale::fixed(4096.0),
            BusParameter::Temperature => Scale::fixed(256.0),
        }
    }

    /// Whether the data field carries a two's complement value
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            BusParameter::VerticalSpeed
                | BusParameter::Pitch
                | BusParameter::Roll
                | BusParameter::Temperature
        )
    }
}

impl std::fmt::Display for BusParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for BusParameter {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_key(s)
    }
}

/// Mapping of parameter to its encoded word
pub type RawBusData = BTreeMap<BusParameter, Word>;

/// Subset of flight parameters carried on the bus
///
/// Fields absent from a raw mapping stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightParameters {
    /// Barometric altitude (feet)
    pub altitude: Option<f64>,
    /// Airspeed (knots)
    pub airspeed: Option<f64>,
    /// Mach number
    pub mach: Option<f64>,
    /// Heading (degrees)
    pub heading: Option<f64>,
    /// Vertical speed (feet/minute)
    pub vertical_speed: Option<f64>,
    /// Pitch angle (degrees)
    pub pitch_angle: Option<f64>,
    /// Roll angle (degrees)
    pub roll_angle: Option<f64>,
    /// Temperature (Celsius)
    pub temperature: Option<f64>,
}

impl FlightParameters {
    /// Get the value stored for a parameter
    pub fn get(&self, parameter: BusParameter) -> Option<f64> {
        match parameter {
            BusParameter::Altitude => self.altitude,
            BusParameter::Airspeed => self.airspeed,
            BusParameter::Mach => self.mach,
            BusParameter::Heading => self.heading,
            BusParameter::VerticalSpeed => self.vertical_speed,
            BusParameter::Pitch => self.pitch_angle,
            BusParameter::Roll => self.roll_angle,
            BusParameter::Temperature => self.temperature,
        }
    }

    /// Store a value for a parameter
    pub fn set(&mut self, parameter: BusParameter, value: f64) {
        let slot = match parameter {
            BusParameter::Altitude => &mut self.altitude,
            BusParameter::Airspeed => &mut self.airspeed,
            BusParameter::Mach => &mut self.mach,
            BusParameter::Heading => &mut self.heading,
            BusParameter::VerticalSpeed => &mut self.vertical_speed,
            BusParameter::Pitch => &mut self.pitch_angle,
            BusParameter::Roll => &mut self.roll_angle,
            BusParameter::Temperature => &mut self.temperature,
        };
        *slot = Some(value);
    }
}

impl From<&FlightState> for FlightParameters {
    fn from(state: &FlightState) -> Self {
        FlightParameters {
            altitude: Some(state.altitude),
            airspeed: Some(state.airspeed),
            mach: Some(state.mach),
            heading: Some(state.true_heading),
            vertical_speed: Some(state.vertical_speed),
            pitch_angle: Some(state.pitch_angle),
            roll_angle: Some(state.roll_angle),
            temperature: Some(state.total_air_temperature),
        }
    }
}

/// Converts flight state snapshots to raw bus words and back
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBusAdapter {
    codec: Codec,
    sdi: Sdi,
}

impl RawBusAdapter {
    /// Create an adapter using `codec` and stamping `sdi` on every word
    pub fn new(codec: Codec, sdi: Sdi) -> Self {
        RawBusAdapter { codec, sdi }
    }

    /// Get the codec
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Encode every published parameter of a snapshot
    pub fn to_raw(&self, state: &FlightState) -> Result<RawBusData> {
        self.encode_parameters(&FlightParameters::from(state))
    }

    /// Encode the parameters that are present
    pub fn encode_parameters(&self, params: &FlightParameters) -> Result<RawBusData> {
        let mut raw = RawBusData::new();
        for parameter in BusParameter::ALL {
            if let Some(value) = params.get(parameter) {
                raw.insert(parameter, self.encode(parameter, value)?);
            }
        }
        Ok(raw)
    }

    /// Encode a single parameter value
    pub fn encode(&self, parameter: BusParameter, value: f64) -> Result<Word> {
        let (scale, label) = (parameter.scale(), parameter.label());
        let result = if parameter.is_signed() {
            self.codec.encode_signed(value, scale, label, self.sdi)
        } else {
            self.codec.encode(value, scale, label, self.sdi)
        };

        if let Err(err) = &result {
            warn!(parameter = %parameter, value, error = %err, "parameter not encoded");
        }
        result
    }

    /// Decode the parameters present in a raw mapping
    pub fn from_raw(&self, raw: &RawBusData) -> FlightParameters {
        let mut params = FlightParameters::default();
        for (&parameter, word) in raw {
            params.set(parameter, Self::decode(parameter, word));
        }
        params
    }

    /// Decode a single word as the given parameter
    pub fn decode(parameter: BusParameter, word: &Word) -> f64 {
        if parameter.is_signed() {
            Codec::decode_signed(word, parameter.scale())
        } else {
            Codec::decode(word, parameter.scale())
        }
    }

    /// Pack a raw mapping into transport words, in parameter order
    pub fn to_transport(raw: &RawBusData) -> Vec<u32> {
        raw.values().map(Word::to_u32).collect()
    }

    /// Pair transport words with parameter keys by position
    ///
    /// There must be exactly one key per word, and every key must name a
    /// published parameter.
    pub fn from_transport(words: &[u32], keys: &[&str]) -> Result<RawBusData> {
        if words.len() != keys.len() {
            return Err(CodecError::insufficient_data(format!(
                "{} transport words but {} keys",
                words.len(),
                keys.len()
            )));
        }

        let mut raw = RawBusData::new();
        for (&word, key) in words.iter().zip(keys) {
            raw.insert(BusParameter::from_key(key)?, Word::from_u32(word));
        }
        Ok(raw)
    }

    /// Rebuild a raw mapping from transport words using each word's label
    ///
    /// Words carrying unpublished labels are skipped.
    pub fn from_transport_by_label(words: &[u32]) -> RawBusData {
        words
            .iter()
            .map(|&raw| Word::from_u32(raw))
            .filter_map(|word| BusParameter::from_label(word.label()).map(|p| (p, word)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::OverflowPolicy;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_parameter_keys() -> Result<()> {
        for parameter in BusParameter::ALL {
            assert_eq!(BusParameter::from_key(parameter.key())?, parameter);
            assert_eq!(BusParameter::from_label(parameter.label()), Some(parameter));
        }
        assert!(BusParameter::from_key("flaps").is_err());
        assert_eq!("vertical_speed".parse::<BusParameter>()?, BusParameter::VerticalSpeed);
        Ok(())
    }

    #[test]
    fn test_to_raw_publishes_every_parameter() -> Result<()> {
        let adapter = RawBusAdapter::default();
        let raw = adapter.to_raw(&FlightState::cruise())?;

        assert_eq!(raw.len(), 8);
        assert_eq!(raw[&BusParameter::Altitude].data(), 35_000);
        assert_eq!(raw[&BusParameter::Altitude].label(), Label::ALTITUDE);
        assert_eq!(raw[&BusParameter::Mach].data(), 6_717);
        assert!(raw.values().all(Codec::validate));
        Ok(())
    }

    #[test]
    fn test_round_trip_within_resolution() -> Result<()> {
        let adapter = RawBusAdapter::default();
        let state = FlightState::cruise();
        let params = adapter.from_raw(&adapter.to_raw(&state)?);

        let expected = FlightParameters::from(&state);
        for parameter in BusParameter::ALL {
            let bound = 1.0 / (2.0 * parameter.scale().factor()) + 1e-9;
            let (got, want) = (params.get(parameter), expected.get(parameter));
            assert!(got.is_some());
            assert_abs_diff_eq!(got.unwrap_or_default(), want.unwrap_or_default(), epsilon = bound);
        }
        Ok(())
    }

    #[test]
    fn test_negative_values_survive() -> Result<()> {
        let adapter = RawBusAdapter::default();
        let word = adapter.encode(BusParameter::VerticalSpeed, -1_500.0)?;
        assert_eq!(RawBusAdapter::decode(BusParameter::VerticalSpeed, &word), -1_500.0);

        let word = adapter.encode(BusParameter::Roll, -1.2)?;
        assert_abs_diff_eq!(
            RawBusAdapter::decode(BusParameter::Roll, &word),
            -1.2,
            epsilon = 1.0 / 8192.0
        );
        Ok(())
    }

    #[test]
    fn test_partial_mapping() -> Result<()> {
        let adapter = RawBusAdapter::default();
        let params = FlightParameters {
            altitude: Some(12_000.0),
            heading: Some(270.0),
            ..FlightParameters::default()
        };
        let raw = adapter.encode_parameters(&params)?;
        assert_eq!(raw.len(), 2);

        let decoded = adapter.from_raw(&raw);
        assert_eq!(decoded.altitude, Some(12_000.0));
        assert!(decoded.airspeed.is_none());
        assert!(decoded.temperature.is_none());
        Ok(())
    }

    #[test]
    fn test_overflow_policy_applies() -> Result<()> {
        let mut params = FlightParameters::default();
        params.set(BusParameter::Altitude, 600_000.0);

        let rejecting = RawBusAdapter::default();
        assert!(matches!(
            rejecting.encode_parameters(&params),
            Err(CodecError::EncodingRange(_))
        ));

        let wrapping = RawBusAdapter::new(Codec::new(OverflowPolicy::Wrap), Sdi::default());
        let raw = wrapping.encode_parameters(&params)?;
        assert_eq!(raw[&BusParameter::Altitude].data(), 600_000 & 0x7FFFF);
        Ok(())
    }

    #[test]
    fn test_sdi_is_stamped() -> Result<()> {
        let adapter = RawBusAdapter::new(Codec::default(), Sdi::new(2)?);
        let raw = adapter.to_raw(&FlightState::cruise())?;
        assert!(raw.values().all(|w| w.sdi().value() == 2));
        Ok(())
    }

    #[test]
    fn test_transport_by_key() -> Result<()> {
        let adapter = RawBusAdapter::default();
        let raw = adapter.to_raw(&FlightState::cruise())?;
        let words = RawBusAdapter::to_transport(&raw);
        assert_eq!(words.len(), 8);

        let keys: Vec<&str> = raw.keys().map(BusParameter::key).collect();
        assert_eq!(RawBusAdapter::from_transport(&words, &keys)?, raw);

        let partial = RawBusAdapter::from_transport(&words[..3], &keys[..3])?;
        assert_eq!(partial.len(), 3);

        assert!(matches!(
            RawBusAdapter::from_transport(&words, &keys[..3]),
            Err(CodecError::InsufficientData(_))
        ));
        assert!(matches!(
            RawBusAdapter::from_transport(&words[..1], &keys),
            Err(CodecError::InsufficientData(_))
        ));
        assert!(matches!(
            RawBusAdapter::from_transport(&words[..2], &["altitude", "flaps"]),
            Err(CodecError::UnknownParameter(_))
        ));
        Ok(())
    }

    #[test]
    fn test_transport_by_label() -> Result<()> {
        let adapter = RawBusAdapter::default();
        let raw = adapter.to_raw(&FlightState::cruise())?;
        let mut words = RawBusAdapter::to_transport(&raw);
        words.reverse();
        words.push(0o100 << 24);

        assert_eq!(RawBusAdapter::from_transport_by_label(&words), raw);
        Ok(())
    }
}
