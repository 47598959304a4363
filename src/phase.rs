//! Flight phase classification and per-phase target dynamics

use crate::state::FlightPhase;

/// Target dynamics the simulator relaxes toward in a given phase
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseProfile {
    /// Vertical speed target (feet/minute)
    pub altitude_rate_target: f64,
    /// Peak airspeed perturbation per tick (knots)
    pub speed_change_volatility: f64,
    /// N1 target (%)
    pub power_setting_target: f64,
    /// 0 (unsettled) to 1 (fully settled)
    pub stability_factor: f64,
}

impl PhaseProfile {
    /// Multiplier on environmental noise; calmer phases see less turbulence
    pub fn turbulence_intensity(&self) -> f64 {
        1.5 - self.stability_factor
    }
}

/// Stateless flight phase engine
///
/// Phases are re-derived every tick from the previous snapshot's
/// altitude, ground speed and vertical speed. There is no transition
/// table, so externally manipulated inputs may jump between
/// non-adjacent phases.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlightPhaseEngine;

impl FlightPhaseEngine {
    /// Classify a flight phase from altitude (ft), ground speed (kt) and vertical speed (fpm)
    pub fn classify(altitude: f64, groundspeed: f64, vertical_speed: f64) -> FlightPhase {
        if altitude < 1_000.0 {
            if groundspeed < 50.0 {
                FlightPhase::Ground
            } else if vertical_speed > 500.0 {
                FlightPhase::Takeoff
            } else if vertical_speed < -500.0 {
                FlightPhase::Landing
            } else {
                FlightPhase::Approach
            }
        } else {
            let threshold = if altitude < 10_000.0 {
                1_000.0
            } else if altitude > 30_000.0 {
                500.0
            } else {
                800.0
            };

            if vertical_speed > threshold {
                FlightPhase::Climb
            } else if vertical_speed < -threshold {
                FlightPhase::Descent
            } else {
                FlightPhase::Cruise
            }
        }
    }

    /// Target dynamics for a phase
    pub fn profile(phase: FlightPhase) -> PhaseProfile {
        let (altitude_rate_target, speed_change_volatility, power_setting_target, stability_factor) =
            match phase {
                FlightPhase::Ground => (0.0, 0.5, 25.0, 1.0),
                FlightPhase::Takeoff => (2_500.0, 3.0, 95.0, 0.4),
                FlightPhase::Climb => (2_000.0, 1.5, 90.0, 0.6),
                FlightPhase::Cruise => (0.0, 0.5, 78.0, 0.9),
                FlightPhase::Descent => (-1_800.0, 1.5, 45.0, 0.7),
                FlightPhase::Approach => (-800.0, 1.0, 55.0, 0.6),
                FlightPhase::Landing => (-700.0, 2.0, 40.0, 0.5),
            };

        PhaseProfile {
            altitude_rate_target,
            speed_change_volatility,
            power_setting_target,
            stability_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_altitude_phases() {
        assert_eq!(FlightPhaseEngine::classify(500.0, 20.0, 0.0), FlightPhase::Ground);
        assert_eq!(FlightPhaseEngine::classify(500.0, 20.0, 3_000.0), FlightPhase::Ground);
        assert_eq!(FlightPhaseEngine::classify(200.0, 150.0, 1_200.0), FlightPhase::Takeoff);
        assert_eq!(FlightPhaseEngine::classify(300.0, 140.0, -700.0), FlightPhase::Landing);
        assert_eq!(FlightPhaseEngine::classify(800.0, 140.0, -300.0), FlightPhase::Approach);
    }

    #[test]
    fn test_band_thresholds() {
        // Below 10,000 ft the band is +/-1000 fpm
        assert_eq!(FlightPhaseEngine::classify(5_000.0, 250.0, 900.0), FlightPhase::Cruise);
        assert_eq!(FlightPhaseEngine::classify(5_000.0, 250.0, 1_100.0), FlightPhase::Climb);
        assert_eq!(FlightPhaseEngine::classify(5_000.0, 250.0, -1_100.0), FlightPhase::Descent);

        // 10,000 to 30,000 ft uses +/-800 fpm, boundaries included
        assert_eq!(FlightPhaseEngine::classify(10_000.0, 400.0, 850.0), FlightPhase::Climb);
        assert_eq!(FlightPhaseEngine::classify(30_000.0, 400.0, -850.0), FlightPhase::Descent);
        assert_eq!(FlightPhaseEngine::classify(30_000.0, 400.0, 600.0), FlightPhase::Cruise);

        // Above 30,000 ft the band is +/-500 fpm
        assert_eq!(FlightPhaseEngine::classify(35_000.0, 465.0, 50.0), FlightPhase::Cruise);
        assert_eq!(FlightPhaseEngine::classify(35_000.0, 465.0, 600.0), FlightPhase::Climb);
        assert_eq!(FlightPhaseEngine::classify(35_000.0, 465.0, -600.0), FlightPhase::Descent);
    }

    #[test]
    fn test_classification_is_repeatable() {
        let first = FlightPhaseEngine::classify(12_345.0, 310.0, -790.0);
        for _ in 0..100 {
            assert_eq!(FlightPhaseEngine::classify(12_345.0, 310.0, -790.0), first);
        }
    }

    #[test]
    fn test_profiles() {
        for phase in FlightPhase::ALL {
            let profile = FlightPhaseEngine::profile(phase);
            assert!((20.0..=100.0).contains(&profile.power_setting_target));
            assert!((0.0..=1.0).contains(&profile.stability_factor));
            assert!(profile.turbulence_intensity() > 0.0);
        }

        let climb = FlightPhaseEngine::profile(FlightPhase::Climb);
        let descent = FlightPhaseEngine::profile(FlightPhase::Descent);
        assert!(climb.altitude_rate_target > 0.0);
        assert!(descent.altitude_rate_target < 0.0);
        assert!(climb.power_setting_target > descent.power_setting_target);
    }
}
