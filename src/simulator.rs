//! Stateful flight-parameter simulation
//!
//! [`step`] derives the next snapshot from the previous one. It runs the
//! phase classifier first and then composes the physical sub-steps, each
//! of which fills in one group of fields of the snapshot being built. Every
//! continuous field is clamped to its range in [`limits`], so no amount of
//! perturbation can push the state outside them.

use crate::phase::{FlightPhaseEngine, PhaseProfile};
use crate::state::{clamp, limits, wrap_degrees, FlightPhase, FlightState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, trace};

/// Speed of sound at sea level in the ISA (knots)
const SEA_LEVEL_SPEED_OF_SOUND_KT: f64 = 661.5;
/// ISA sea level temperature (Kelvin)
const SEA_LEVEL_TEMPERATURE_K: f64 = 288.15;
/// ISA sea level pressure (millibars)
const SEA_LEVEL_PRESSURE_MB: f64 = 1_013.25;
/// Feet per degree of latitude, flat-Earth approximation
const FEET_PER_DEGREE: f64 = 364_000.0;
/// Feet per second in one knot
const FPS_PER_KNOT: f64 = 1.687_81;
/// g per knot/second of acceleration
const G_PER_KNOT_PER_SECOND: f64 = 0.514_444 / 9.806_65;
/// Millibars to PSI
const PSI_PER_MB: f64 = 0.014_503_8;
/// Altitude lost per nautical mile on a 3 degree glideslope (feet)
const GLIDESLOPE_FT_PER_NM: f64 = 318.0;

/// Simulator configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulatorConfig {
    /// State the simulation starts from
    pub initial: FlightState,
    /// PRNG seed; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Simulated time covered by one [`FlightSimulator::tick`]
    pub time_step: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            initial: FlightState::cruise(),
            seed: None,
            time_step: Duration::from_secs(1),
        }
    }
}

/// Builder for [`FlightSimulator`]
#[derive(Debug, Clone, Default)]
pub struct SimulatorBuilder {
    config: SimulatorConfig,
}

impl SimulatorBuilder {
    /// Create a new builder with the default cruise configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial state
    pub fn with_initial_state(mut self, state: FlightState) -> Self {
        self.config.initial = state;
        self
    }

    /// Seed the PRNG for a reproducible run
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the simulated time per tick
    pub fn with_time_step(mut self, time_step: Duration) -> Self {
        self.config.time_step = time_step;
        self
    }

    /// Build the simulator
    pub fn build(self) -> FlightSimulator {
        FlightSimulator::new(self.config)
    }
}

/// Owner of the canonical [`FlightState`]
#[derive(Debug, Clone)]
pub struct FlightSimulator {
    state: FlightState,
    rng: StdRng,
    time_step: Duration,
}

impl FlightSimulator {
    /// Create a simulator from an explicit configuration
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        FlightSimulator {
            state: config.initial,
            rng,
            time_step: config.time_step,
        }
    }

    /// Current snapshot
    pub fn state(&self) -> &FlightState {
        &self.state
    }

    /// Simulated time per tick
    pub fn time_step(&self) -> Duration {
        self.time_step
    }

    /// Advance by the configured time step
    pub fn tick(&mut self) -> FlightState {
        self.advance(self.time_step)
    }

    /// Advance by `dt` and return the new snapshot
    ///
    /// The next snapshot is built in full before it replaces the current
    /// one. A zero `dt` leaves the state untouched.
    pub fn advance(&mut self, dt: Duration) -> FlightState {
        let next = step(&self.state, dt.as_secs_f64(), &mut self.rng);
        self.state = next;
        next
    }

    /// Endless iterator of successive snapshots, one per tick
    pub fn ticks(&mut self) -> Ticks<'_> {
        Ticks { simulator: self }
    }
}

/// Iterator returned by [`FlightSimulator::ticks`]
#[derive(Debug)]
pub struct Ticks<'a> {
    simulator: &'a mut FlightSimulator,
}

impl Iterator for Ticks<'_> {
    type Item = FlightState;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.simulator.tick())
    }
}

/// Derive the snapshot `dt` seconds after `prev`
pub fn step<R: Rng>(prev: &FlightState, dt: f64, rng: &mut R) -> FlightState {
    if dt <= 0.0 || !dt.is_finite() {
        return *prev;
    }

    let phase = FlightPhaseEngine::classify(prev.altitude, prev.groundspeed, prev.vertical_speed);
    if phase != prev.flight_phase {
        debug!(from = %prev.flight_phase, to = %phase, altitude = prev.altitude, "flight phase change");
    }
    let profile = FlightPhaseEngine::profile(phase);

    let mut next = *prev;
    next.flight_phase = phase;
    next.timestamp = prev.timestamp + dt;

    engine_dynamics(prev, &mut next, &profile, rng);
    vertical_dynamics(prev, &mut next, &profile, dt, rng);
    speed_dynamics(prev, &mut next, &profile, dt, rng);
    attitude_dynamics(prev, &mut next, &profile, dt, rng);
    environment(prev, &mut next, &profile, rng);
    navigation(prev, &mut next, &profile, dt, rng);
    configuration(prev, &mut next, phase, dt);
    cabin(prev, &mut next, dt, rng);
    nav_aids(prev, &mut next, phase, rng);

    trace!(
        t = next.timestamp,
        phase = %next.flight_phase,
        altitude = next.altitude,
        airspeed = next.airspeed,
        "tick"
    );
    next
}

/// Symmetric bounded noise in `[-magnitude, magnitude]`
fn jitter<R: Rng>(rng: &mut R, magnitude: f64) -> f64 {
    if magnitude > 0.0 {
        rng.gen_range(-magnitude..=magnitude)
    } else {
        0.0
    }
}

/// Mach number from indicated airspeed (kt) and static air temperature (C)
pub fn mach_from(airspeed: f64, static_air_temperature: f64) -> f64 {
    let temperature_ratio = SEA_LEVEL_TEMPERATURE_K / (static_air_temperature + 273.15);
    airspeed / (SEA_LEVEL_SPEED_OF_SOUND_KT * temperature_ratio.sqrt())
}

/// Exhaust gas temperature (C) for an N1 setting at altitude (ft)
pub fn egt_for(n1: f64, altitude: f64) -> f64 {
    300.0 + n1 * 2.9 - altitude * 0.002
}

/// Fuel flow per engine (lbs/hour) for an N1 setting, derated with altitude (ft)
pub fn fuel_flow_for(n1: f64, altitude: f64) -> f64 {
    let derate = 1.0 - 0.3 * (altitude / 40_000.0).min(1.0);
    400.0 + n1 * 22.0 * derate
}

/// ISA static air temperature (C), constant above the tropopause
pub fn isa_temperature(altitude: f64) -> f64 {
    (15.0 - 1.98 * altitude / 1_000.0).max(-56.5)
}

/// ISA static pressure (millibars) at pressure altitude (ft)
pub fn isa_pressure(altitude: f64) -> f64 {
    SEA_LEVEL_PRESSURE_MB * (1.0 - 6.875_6e-6 * altitude).max(0.0).powf(5.255_9)
}

/// True airspeed (kt) from indicated airspeed using the 2% per 1000 ft rule
pub fn true_airspeed(airspeed: f64, altitude: f64) -> f64 {
    airspeed * (1.0 + 0.02 * altitude / 1_000.0)
}

/// Move a position `dt` seconds along `track` (deg) at `groundspeed` (kt)
///
/// Flat-Earth integration; only suitable for short per-tick distances.
pub fn integrate_position(
    latitude: f64,
    longitude: f64,
    groundspeed: f64,
    track: f64,
    dt: f64,
) -> (f64, f64) {
    let distance_ft = groundspeed * FPS_PER_KNOT * dt;
    let track = track.to_radians();
    let lat_scale = latitude.to_radians().cos().max(1e-6);

    let next_lat = latitude + distance_ft * track.cos() / FEET_PER_DEGREE;
    let next_lon = longitude + distance_ft * track.sin() / (FEET_PER_DEGREE * lat_scale);

    (
        clamp(next_lat, &limits::LATITUDE_DEG),
        (next_lon + 180.0).rem_euclid(360.0) - 180.0,
    )
}

/// N1 relaxes toward the phase power setting; N2, EGT, fuel flow and oil follow
fn engine_dynamics<R: Rng>(
    prev: &FlightState,
    next: &mut FlightState,
    profile: &PhaseProfile,
    rng: &mut R,
) {
    let n1_delta = (profile.power_setting_target - prev.n1_rpm) * 0.02 + jitter(rng, 0.3);
    next.n1_rpm = clamp(prev.n1_rpm + n1_delta, &limits::N1_PCT);
    next.n2_rpm = clamp(next.n1_rpm * 1.18 + jitter(rng, 0.2), &limits::N2_PCT);
    next.egt = clamp(egt_for(next.n1_rpm, prev.altitude) + jitter(rng, 2.0), &limits::EGT_C);
    next.fuel_flow = clamp(
        fuel_flow_for(next.n1_rpm, prev.altitude) + jitter(rng, 10.0),
        &limits::FUEL_FLOW_PPH,
    );
    next.oil_pressure = clamp(
        25.0 + next.n2_rpm * 0.4 + jitter(rng, 0.5),
        &limits::OIL_PRESSURE_PSI,
    );

    let oil_target = 60.0 + next.n1_rpm * 0.35;
    next.oil_temperature = clamp(
        prev.oil_temperature + (oil_target - prev.oil_temperature) * 0.05 + jitter(rng, 0.2),
        &limits::OIL_TEMPERATURE_C,
    );
}

/// Vertical speed relaxes toward the phase target; altitude integrates it
fn vertical_dynamics<R: Rng>(
    prev: &FlightState,
    next: &mut FlightState,
    profile: &PhaseProfile,
    dt: f64,
    rng: &mut R,
) {
    let turbulence = profile.turbulence_intensity();
    let vs_delta =
        (profile.altitude_rate_target - prev.vertical_speed) * 0.05 + jitter(rng, 50.0 * turbulence);
    next.vertical_speed = clamp(prev.vertical_speed + vs_delta, &limits::VERTICAL_SPEED_FPM);
    next.altitude = clamp(
        prev.altitude + next.vertical_speed * dt / 60.0 + jitter(rng, 5.0 * turbulence),
        &limits::ALTITUDE_FT,
    );
}

/// Airspeed relaxes toward the equilibrium for the current power and climb rate
fn speed_dynamics<R: Rng>(
    prev: &FlightState,
    next: &mut FlightState,
    profile: &PhaseProfile,
    dt: f64,
    rng: &mut R,
) {
    let equilibrium = (next.n1_rpm - 20.0) * 5.0 - next.vertical_speed * 0.05;
    let delta = (equilibrium - prev.airspeed) * 0.02 + jitter(rng, profile.speed_change_volatility);
    next.airspeed = clamp(prev.airspeed + delta, &limits::AIRSPEED_KT);

    let accel = (next.airspeed - prev.airspeed) / dt * G_PER_KNOT_PER_SECOND;
    next.body_long_accel = clamp(accel + jitter(rng, 0.01), &limits::BODY_ACCEL_G);
}

/// Pitch follows the climb rate, roll decays toward wings level, heading follows roll
fn attitude_dynamics<R: Rng>(
    prev: &FlightState,
    next: &mut FlightState,
    profile: &PhaseProfile,
    dt: f64,
    rng: &mut R,
) {
    let turbulence = profile.turbulence_intensity();

    let pitch_target = 2.0 + next.vertical_speed / 600.0;
    next.pitch_angle = clamp(
        prev.pitch_angle + (pitch_target - prev.pitch_angle) * 0.1 + jitter(rng, 0.3 * turbulence),
        &limits::PITCH_DEG,
    );

    let roll_decay = 0.5 + 0.45 * profile.stability_factor;
    next.roll_angle = clamp(
        prev.roll_angle * roll_decay + jitter(rng, 1.0 * turbulence),
        &limits::ROLL_DEG,
    );

    next.pitch_rate = clamp(
        (next.pitch_angle - prev.pitch_angle) / dt,
        &limits::ATTITUDE_RATE_DPS,
    );
    next.roll_rate = clamp(
        (next.roll_angle - prev.roll_angle) / dt,
        &limits::ATTITUDE_RATE_DPS,
    );

    // Coordinated turn: rate (deg/s) = 1091 * tan(bank) / TAS (kt)
    let tas = true_airspeed(next.airspeed, next.altitude);
    let turn_rate = if tas > 1.0 {
        1_091.0 * next.roll_angle.to_radians().tan() / tas
    } else {
        0.0
    };
    next.true_heading_rate = clamp(turn_rate, &limits::HEADING_RATE_DPS);

    let variation = prev.true_heading - prev.magnetic_heading;
    next.true_heading = wrap_degrees(
        prev.true_heading + next.true_heading_rate * dt + jitter(rng, 0.05 * turbulence),
    );
    next.magnetic_heading = wrap_degrees(next.true_heading - variation);
}

/// Temperatures and pressure track the ISA at the new altitude; wind wanders
fn environment<R: Rng>(
    prev: &FlightState,
    next: &mut FlightState,
    profile: &PhaseProfile,
    rng: &mut R,
) {
    let turbulence = profile.turbulence_intensity();

    let sat_target = isa_temperature(next.altitude);
    next.static_air_temperature = clamp(
        prev.static_air_temperature
            + (sat_target - prev.static_air_temperature) * 0.1
            + jitter(rng, 0.2 * turbulence),
        &limits::SAT_C,
    );
    next.static_pressure = clamp(
        isa_pressure(next.altitude) + jitter(rng, 0.5 * turbulence),
        &limits::STATIC_PRESSURE_MB,
    );
    next.wind_speed = clamp(
        prev.wind_speed + jitter(rng, 1.0 * turbulence),
        &limits::WIND_SPEED_KT,
    );
    next.wind_direction = wrap_degrees(prev.wind_direction + jitter(rng, 2.0 * turbulence));

    next.mach = clamp(
        mach_from(next.airspeed, next.static_air_temperature) + jitter(rng, 0.0005),
        &limits::MACH,
    );
    let sat_k = next.static_air_temperature + 273.15;
    next.total_air_temperature = clamp(
        sat_k * (1.0 + 0.2 * next.mach * next.mach) - 273.15 + jitter(rng, 0.1),
        &limits::TAT_C,
    );
}

/// Wind triangle for track and ground speed, then position integration
fn navigation<R: Rng>(
    prev: &FlightState,
    next: &mut FlightState,
    profile: &PhaseProfile,
    dt: f64,
    rng: &mut R,
) {
    let turbulence = profile.turbulence_intensity();
    let tas = true_airspeed(next.airspeed, next.altitude);
    let wind_angle = (next.wind_direction - next.true_heading).to_radians();

    let drift = if tas > 1.0 {
        (next.wind_speed * wind_angle.sin() / tas).clamp(-1.0, 1.0).asin()
    } else {
        0.0
    };
    next.true_track_angle =
        wrap_degrees(next.true_heading - drift.to_degrees() + jitter(rng, 0.05 * turbulence));
    next.groundspeed = clamp(
        tas * drift.cos() - next.wind_speed * wind_angle.cos() + jitter(rng, 0.5 * turbulence),
        &limits::GROUNDSPEED_KT,
    );

    let (latitude, longitude) = integrate_position(
        prev.latitude,
        prev.longitude,
        next.groundspeed,
        next.true_track_angle,
        dt,
    );
    next.latitude = latitude;
    next.longitude = longitude;

    next.body_lateral_accel = clamp(jitter(rng, 0.02 * turbulence), &limits::BODY_ACCEL_G);
    let load_factor = 1.0 / next.roll_angle.to_radians().cos();
    next.body_normal_accel = clamp(
        load_factor + jitter(rng, 0.03 * turbulence),
        &limits::NORMAL_ACCEL_G,
    );
}

/// Flaps move toward the phase setting at 1 deg/s; gear follows the phase
fn configuration(prev: &FlightState, next: &mut FlightState, phase: FlightPhase, dt: f64) {
    let flap_target = match phase {
        FlightPhase::Ground | FlightPhase::Takeoff => 5.0,
        FlightPhase::Climb | FlightPhase::Cruise | FlightPhase::Descent => 0.0,
        FlightPhase::Approach => 15.0,
        FlightPhase::Landing => 30.0,
    };
    let max_travel = dt;
    let travel = (flap_target - prev.flap_position).clamp(-max_travel, max_travel);
    next.flap_position = clamp(prev.flap_position + travel, &limits::FLAPS_DEG);

    next.gear_down = match phase {
        FlightPhase::Ground | FlightPhase::Approach | FlightPhase::Landing => true,
        FlightPhase::Takeoff => next.altitude < 400.0,
        FlightPhase::Climb | FlightPhase::Cruise | FlightPhase::Descent => false,
    };
}

/// Cabin altitude climbs at up to 500 fpm toward its schedule
fn cabin<R: Rng>(prev: &FlightState, next: &mut FlightState, dt: f64, rng: &mut R) {
    let target = (next.altitude * 0.2).min(8_000.0);
    let max_change = 500.0 * dt / 60.0;
    let change = (target - prev.cabin_altitude).clamp(-max_change, max_change);
    next.cabin_altitude = clamp(
        prev.cabin_altitude + change + jitter(rng, 2.0),
        &limits::CABIN_ALTITUDE_FT,
    );

    let differential = (isa_pressure(next.cabin_altitude) - next.static_pressure) * PSI_PER_MB;
    next.cabin_pressure_diff = clamp(differential, &limits::CABIN_DIFF_PSI);
}

/// ILS deviations and DME are only live on approach and landing
fn nav_aids<R: Rng>(
    prev: &FlightState,
    next: &mut FlightState,
    phase: FlightPhase,
    rng: &mut R,
) {
    match phase {
        FlightPhase::Approach | FlightPhase::Landing => {
            next.ils_deviation = clamp(
                prev.ils_deviation * 0.95 + jitter(rng, 0.05),
                &limits::DEVIATION_DOTS,
            );
            next.glideslope_deviation = clamp(
                prev.glideslope_deviation * 0.95 + jitter(rng, 0.05),
                &limits::DEVIATION_DOTS,
            );
            next.dme_distance = clamp(next.altitude / GLIDESLOPE_FT_PER_NM, &limits::DME_NM);
        }
        _ => {
            next.ils_deviation = 0.0;
            next.glideslope_deviation = 0.0;
            next.dme_distance = 0.0;
        }
    }
}
