//! Flight state record and its physical limits

use crate::error::{CodecError, Result};
use std::ops::RangeInclusive;

/// Discrete operating regime of the aircraft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum FlightPhase {
    /// On the ground, taxiing or parked
    Ground,
    /// Takeoff roll and initial climb
    Takeoff,
    /// Climb
    Climb,
    /// Cruise
    Cruise,
    /// Descent
    Descent,
    /// Approach
    Approach,
    /// Landing
    Landing,
}

impl FlightPhase {
    /// All phases in operating order
    pub const ALL: [FlightPhase; 7] = [
        FlightPhase::Ground,
        FlightPhase::Takeoff,
        FlightPhase::Climb,
        FlightPhase::Cruise,
        FlightPhase::Descent,
        FlightPhase::Approach,
        FlightPhase::Landing,
    ];

    /// Upper-case name used on displays
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightPhase::Ground => "GROUND",
            FlightPhase::Takeoff => "TAKEOFF",
            FlightPhase::Climb => "CLIMB",
            FlightPhase::Cruise => "CRUISE",
            FlightPhase::Descent => "DESCENT",
            FlightPhase::Approach => "APPROACH",
            FlightPhase::Landing => "LANDING",
        }
    }
}

impl std::fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlightPhase {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        FlightPhase::ALL
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodecError::unknown_parameter(format!("Unknown flight phase: {}", s)))
    }
}

/// Clamp ranges applied to every continuous field after each tick
pub mod limits {
    use std::ops::RangeInclusive;

    /// Barometric altitude (feet)
    pub const ALTITUDE_FT: RangeInclusive<f64> = 0.0..=45_000.0;
    /// Indicated airspeed (knots)
    pub const AIRSPEED_KT: RangeInclusive<f64> = 0.0..=400.0;
    /// Ground speed (knots)
    pub const GROUNDSPEED_KT: RangeInclusive<f64> = 0.0..=700.0;
    /// Mach number
    pub const MACH: RangeInclusive<f64> = 0.0..=0.95;
    /// Pitch angle (degrees)
    pub const PITCH_DEG: RangeInclusive<f64> = -20.0..=25.0;
    /// Roll angle (degrees)
    pub const ROLL_DEG: RangeInclusive<f64> = -45.0..=45.0;
    /// Headings and track (degrees, wrapped)
    pub const HEADING_DEG: RangeInclusive<f64> = 0.0..=360.0;
    /// Pitch and roll rates (degrees/second)
    pub const ATTITUDE_RATE_DPS: RangeInclusive<f64> = -10.0..=10.0;
    /// Heading rate (degrees/second)
    pub const HEADING_RATE_DPS: RangeInclusive<f64> = -5.0..=5.0;
    /// Vertical speed (feet/minute)
    pub const VERTICAL_SPEED_FPM: RangeInclusive<f64> = -6_000.0..=6_000.0;
    /// Lateral and longitudinal body acceleration (g)
    pub const BODY_ACCEL_G: RangeInclusive<f64> = -2.0..=2.0;
    /// Normal body acceleration (g)
    pub const NORMAL_ACCEL_G: RangeInclusive<f64> = -1.0..=3.0;
    /// Latitude (degrees)
    pub const LATITUDE_DEG: RangeInclusive<f64> = -90.0..=90.0;
    /// Longitude (degrees)
    pub const LONGITUDE_DEG: RangeInclusive<f64> = -180.0..=180.0;
    /// Total air temperature (Celsius)
    pub const TAT_C: RangeInclusive<f64> = -80.0..=80.0;
    /// Static air temperature (Celsius)
    pub const SAT_C: RangeInclusive<f64> = -80.0..=55.0;
    /// Wind speed (knots)
    pub const WIND_SPEED_KT: RangeInclusive<f64> = 0.0..=200.0;
    /// Static pressure (millibars)
    pub const STATIC_PRESSURE_MB: RangeInclusive<f64> = 100.0..=1_100.0;
    /// N1 fan speed (%)
    pub const N1_PCT: RangeInclusive<f64> = 20.0..=100.0;
    /// N2 core speed (%)
    pub const N2_PCT: RangeInclusive<f64> = 30.0..=105.0;
    /// Exhaust gas temperature (Celsius)
    pub const EGT_C: RangeInclusive<f64> = 200.0..=950.0;
    /// Fuel flow per engine (lbs/hour)
    pub const FUEL_FLOW_PPH: RangeInclusive<f64> = 200.0..=8_000.0;
    /// Oil pressure (PSI)
    pub const OIL_PRESSURE_PSI: RangeInclusive<f64> = 0.0..=100.0;
    /// Oil temperature (Celsius)
    pub const OIL_TEMPERATURE_C: RangeInclusive<f64> = -40.0..=160.0;
    /// Flap position (degrees)
    pub const FLAPS_DEG: RangeInclusive<f64> = 0.0..=40.0;
    /// Cabin altitude (feet)
    pub const CABIN_ALTITUDE_FT: RangeInclusive<f64> = -1_000.0..=10_000.0;
    /// Cabin differential pressure (PSI)
    pub const CABIN_DIFF_PSI: RangeInclusive<f64> = 0.0..=9.1;
    /// Localizer and glideslope deviation (dots)
    pub const DEVIATION_DOTS: RangeInclusive<f64> = -2.5..=2.5;
    /// DME distance (nautical miles)
    pub const DME_NM: RangeInclusive<f64> = 0.0..=300.0;
}

/// Clamp `value` into `range`
pub(crate) fn clamp(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}

/// Wrap an angle into `[0, 360)`
pub(crate) fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Complete set of simulated flight parameters
///
/// A `FlightState` is a plain snapshot: the simulator builds a new one
/// every tick and consumers only ever see fully formed copies.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightState {
    /// Indicated airspeed (knots)
    pub airspeed: f64,
    /// Barometric altitude (feet)
    pub altitude: f64,
    /// Ground speed (knots)
    pub groundspeed: f64,
    /// Mach number
    pub mach: f64,

    /// Pitch angle (degrees, nose up positive)
    pub pitch_angle: f64,
    /// Roll angle (degrees, right wing down positive)
    pub roll_angle: f64,
    /// True heading (degrees)
    pub true_heading: f64,
    /// Magnetic heading (degrees)
    pub magnetic_heading: f64,

    /// Pitch rate (degrees/second)
    pub pitch_rate: f64,
    /// Roll rate (degrees/second)
    pub roll_rate: f64,
    /// True heading rate (degrees/second)
    pub true_heading_rate: f64,
    /// Vertical speed (feet/minute)
    pub vertical_speed: f64,
    /// True track angle (degrees)
    pub true_track_angle: f64,

    /// Lateral body acceleration (g)
    pub body_lateral_accel: f64,
    /// Longitudinal body acceleration (g)
    pub body_long_accel: f64,
    /// Normal body acceleration (g)
    pub body_normal_accel: f64,

    /// Present position latitude (degrees)
    pub latitude: f64,
    /// Present position longitude (degrees)
    pub longitude: f64,

    /// Total air temperature (Celsius)
    pub total_air_temperature: f64,
    /// Static air temperature (Celsius)
    pub static_air_temperature: f64,
    /// Wind speed (knots)
    pub wind_speed: f64,
    /// Wind direction, true, the wind blows from (degrees)
    pub wind_direction: f64,
    /// Static pressure (millibars)
    pub static_pressure: f64,

    /// N1 fan speed (% RPM)
    pub n1_rpm: f64,
    /// N2 core speed (% RPM)
    pub n2_rpm: f64,
    /// Exhaust gas temperature (Celsius)
    pub egt: f64,
    /// Fuel flow per engine (lbs/hour)
    pub fuel_flow: f64,
    /// Oil pressure (PSI)
    pub oil_pressure: f64,
    /// Oil temperature (Celsius)
    pub oil_temperature: f64,

    /// Flap position (degrees)
    pub flap_position: f64,
    /// Landing gear down
    pub gear_down: bool,

    /// Cabin altitude (feet)
    pub cabin_altitude: f64,
    /// Cabin differential pressure (PSI)
    pub cabin_pressure_diff: f64,

    /// Localizer deviation (dots)
    pub ils_deviation: f64,
    /// Glideslope deviation (dots)
    pub glideslope_deviation: f64,
    /// DME distance (nautical miles)
    pub dme_distance: f64,

    /// Flight phase at this snapshot
    pub flight_phase: FlightPhase,
    /// Simulated time since the simulator started (seconds)
    pub timestamp: f64,
}

impl FlightState {
    /// Airliner in cruise at FL350 over the North Atlantic
    pub fn cruise() -> Self {
        FlightState {
            airspeed: 285.0,
            altitude: 35_000.0,
            groundspeed: 465.0,
            mach: 0.82,

            pitch_angle: 2.5,
            roll_angle: -1.2,
            true_heading: 95.0,
            magnetic_heading: 87.0,

            pitch_rate: 0.1,
            roll_rate: -0.2,
            true_heading_rate: 0.05,
            vertical_speed: 50.0,
            true_track_angle: 97.0,

            body_lateral_accel: -0.02,
            body_long_accel: 0.01,
            body_normal_accel: 1.01,

            latitude: 51.2847,
            longitude: -25.4558,

            total_air_temperature: -54.0,
            static_air_temperature: -56.0,
            wind_speed: 45.0,
            wind_direction: 285.0,
            static_pressure: 238.0,

            n1_rpm: 78.5,
            n2_rpm: 94.2,
            egt: 485.0,
            fuel_flow: 1_650.0,
            oil_pressure: 62.0,
            oil_temperature: 88.0,

            flap_position: 0.0,
            gear_down: false,

            cabin_altitude: 6_800.0,
            cabin_pressure_diff: 8.1,

            ils_deviation: 0.0,
            glideslope_deviation: 0.0,
            dme_distance: 0.0,

            flight_phase: FlightPhase::Cruise,
            timestamp: 0.0,
        }
    }

    /// Aircraft holding short of a runway with engines at idle
    pub fn parked() -> Self {
        FlightState {
            airspeed: 0.0,
            altitude: 0.0,
            groundspeed: 0.0,
            mach: 0.0,
            pitch_angle: 0.0,
            roll_angle: 0.0,
            true_heading: 270.0,
            magnetic_heading: 269.0,
            true_track_angle: 270.0,
            pitch_rate: 0.0,
            roll_rate: 0.0,
            true_heading_rate: 0.0,
            vertical_speed: 0.0,
            body_lateral_accel: 0.0,
            body_long_accel: 0.0,
            body_normal_accel: 1.0,
            latitude: 51.4700,
            longitude: -0.4543,
            total_air_temperature: 15.0,
            static_air_temperature: 15.0,
            wind_speed: 8.0,
            static_pressure: 1_013.25,
            n1_rpm: 21.0,
            n2_rpm: 60.0,
            egt: 380.0,
            fuel_flow: 600.0,
            oil_pressure: 40.0,
            oil_temperature: 60.0,
            flap_position: 5.0,
            gear_down: true,
            cabin_altitude: 0.0,
            cabin_pressure_diff: 0.0,
            flight_phase: FlightPhase::Ground,
            ..FlightState::cruise()
        }
    }

    /// Check that every continuous field sits inside its documented range
    pub fn within_limits(&self) -> bool {
        let checks: [(f64, RangeInclusive<f64>); 33] = [
            (self.altitude, limits::ALTITUDE_FT),
            (self.airspeed, limits::AIRSPEED_KT),
            (self.groundspeed, limits::GROUNDSPEED_KT),
            (self.mach, limits::MACH),
            (self.pitch_angle, limits::PITCH_DEG),
            (self.roll_angle, limits::ROLL_DEG),
            (self.true_heading, limits::HEADING_DEG),
            (self.magnetic_heading, limits::HEADING_DEG),
            (self.pitch_rate, limits::ATTITUDE_RATE_DPS),
            (self.roll_rate, limits::ATTITUDE_RATE_DPS),
            (self.true_heading_rate, limits::HEADING_RATE_DPS),
            (self.vertical_speed, limits::VERTICAL_SPEED_FPM),
            (self.true_track_angle, limits::HEADING_DEG),
            (self.body_lateral_accel, limits::BODY_ACCEL_G),
            (self.body_long_accel, limits::BODY_ACCEL_G),
            (self.body_normal_accel, limits::NORMAL_ACCEL_G),
            (self.latitude, limits::LATITUDE_DEG),
            (self.longitude, limits::LONGITUDE_DEG),
            (self.total_air_temperature, limits::TAT_C),
            (self.static_air_temperature, limits::SAT_C),
            (self.wind_speed, limits::WIND_SPEED_KT),
            (self.wind_direction, limits::HEADING_DEG),
            (self.static_pressure, limits::STATIC_PRESSURE_MB),
            (self.n1_rpm, limits::N1_PCT),
            (self.n2_rpm, limits::N2_PCT),
            (self.egt, limits::EGT_C),
            (self.fuel_flow, limits::FUEL_FLOW_PPH),
            (self.oil_pressure, limits::OIL_PRESSURE_PSI),
            (self.oil_temperature, limits::OIL_TEMPERATURE_C),
            (self.flap_position, limits::FLAPS_DEG),
            (self.cabin_altitude, limits::CABIN_ALTITUDE_FT),
            (self.cabin_pressure_diff, limits::CABIN_DIFF_PSI),
            (self.dme_distance, limits::DME_NM),
        ];

        checks.iter().all(|(value, range)| range.contains(value))
            && limits::DEVIATION_DOTS.contains(&self.ils_deviation)
            && limits::DEVIATION_DOTS.contains(&self.glideslope_deviation)
    }

    /// Serialize the snapshot for display consumers
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Default for FlightState {
    fn default() -> Self {
        Self::cruise()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_cruise() {
        let state = FlightState::default();
        assert_eq!(state.flight_phase, FlightPhase::Cruise);
        assert_eq!(state.altitude, 35_000.0);
        assert!(state.within_limits());
    }

    #[test]
    fn test_parked_within_limits() {
        let state = FlightState::parked();
        assert_eq!(state.flight_phase, FlightPhase::Ground);
        assert!(state.gear_down);
        assert!(state.within_limits());
    }

    #[test]
    fn test_within_limits_detects_excursion() {
        let mut state = FlightState::cruise();
        state.roll_angle = 60.0;
        assert!(!state.within_limits());

        let mut state = FlightState::cruise();
        state.glideslope_deviation = -3.0;
        assert!(!state.within_limits());
    }

    #[test]
    fn test_phase_names() -> Result<()> {
        assert_eq!(FlightPhase::Takeoff.to_string(), "TAKEOFF");
        assert_eq!("approach".parse::<FlightPhase>()?, FlightPhase::Approach);
        assert!("HOLDING".parse::<FlightPhase>().is_err());
        Ok(())
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(370.0), 10.0);
        assert_eq!(wrap_degrees(-10.0), 350.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert!(wrap_degrees(-1e-18) < 360.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(50.0, &limits::ROLL_DEG), 45.0);
        assert_eq!(clamp(-0.5, &limits::ALTITUDE_FT), 0.0);
        assert_eq!(clamp(0.3, &limits::MACH), 0.3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_snapshot() -> std::result::Result<(), serde_json::Error> {
        let json = FlightState::cruise().to_json()?;
        assert!(json.contains("\"flight_phase\":\"CRUISE\""));
        let back: FlightState = serde_json::from_str(&json)?;
        assert_eq!(back.altitude, 35_000.0);
        assert_eq!(back.flight_phase, FlightPhase::Cruise);
        Ok(())
    }
}
