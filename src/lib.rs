//! # ARINC 429 Flight Data Bus
//!
//! A Rust library that simulates the flight parameters behind a primary
//! flight display and carries them over ARINC 429 data-bus words.
//!
//! ARINC 429 is the point-to-point avionics data bus used on commercial
//! aircraft. Each 32-bit word carries an octal label, a source/destination
//! identifier, a 19-bit data field, a sign/status matrix and an odd parity
//! bit. This library provides:
//!
//! - Word construction, transport packing and parity validation
//! - Scaled encoding and decoding of physical values
//! - A phase-aware flight-parameter simulator
//! - Conversion of simulator snapshots to labelled bus words and back
//! - Receive-side parity monitoring
//! - Lock-free snapshot publication for display consumers
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization support
//!
//! ## Example
//!
//! ```
//! use arinc429_flightsim::{BusParameter, RawBusAdapter, SimulatorBuilder};
//!
//! let mut simulator = SimulatorBuilder::new().with_seed(7).build();
//! let state = simulator.tick();
//!
//! let adapter = RawBusAdapter::default();
//! let raw = adapter.to_raw(&state)?;
//! println!("Altitude word: {}", raw[&BusParameter::Altitude]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bus;
pub mod core;
pub mod encoding;
pub mod error;
pub mod feed;
pub mod monitor;
pub mod phase;
pub mod simulator;
pub mod state;

pub use bus::{BusParameter, FlightParameters, RawBusAdapter, RawBusData};
pub use crate::core::{Label, Sdi, Ssm, Word};
pub use encoding::{Codec, OverflowPolicy, Scale};
pub use error::{CodecError, Result};
pub use feed::{FeedReader, TickDriver};
pub use monitor::BusMonitor;
pub use phase::{FlightPhaseEngine, PhaseProfile};
pub use simulator::{FlightSimulator, SimulatorBuilder, SimulatorConfig};
pub use state::{FlightPhase, FlightState};

/// ARINC 429 word format constants
pub mod wire {
    /// Width of the data field in bits
    pub const DATA_BITS: u32 = 19;

    /// Mask for the 19-bit data field
    pub const DATA_MASK: u32 = (1 << DATA_BITS) - 1;

    /// Smallest two's complement count the data field holds
    pub const SIGNED_DATA_MIN: i64 = -(1 << (DATA_BITS - 1));

    /// Largest two's complement count the data field holds
    pub const SIGNED_DATA_MAX: i64 = (1 << (DATA_BITS - 1)) - 1;

    /// Mask for the parity bit
    pub const PARITY_MASK: u32 = 1;
}
