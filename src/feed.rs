//! Snapshot publication and the periodic tick driver
//!
//! Snapshots cross threads through a triple buffer: the writer always
//! publishes a complete [`FlightState`] and a reader always gets the most
//! recent complete one, without locks and without ever seeing a partially
//! written state.

use crate::simulator::FlightSimulator;
use crate::state::FlightState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;
use triple_buffer::{Input, Output, TripleBuffer};

/// Writing end of a snapshot feed
pub struct FeedPublisher {
    input: Input<FlightState>,
}

impl FeedPublisher {
    /// Publish a snapshot, replacing the previous one
    pub fn publish(&mut self, state: FlightState) {
        self.input.write(state);
    }
}

/// Reading end of a snapshot feed
pub struct FeedReader {
    output: Output<FlightState>,
}

impl FeedReader {
    /// Most recently published snapshot
    pub fn latest(&mut self) -> FlightState {
        *self.output.read()
    }
}

/// Create a snapshot feed seeded with `initial`
pub fn feed(initial: &FlightState) -> (FeedPublisher, FeedReader) {
    let (input, output) = TripleBuffer::new(initial).split();
    (FeedPublisher { input }, FeedReader { output })
}

/// Runs a simulator on its own thread at a fixed wall-clock interval
///
/// Ticks never overlap: the next one starts only after the previous
/// snapshot has been published. Stopping the driver is the only form of
/// cancellation; a tick in progress always completes.
pub struct TickDriver {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<FlightSimulator>>,
}

impl TickDriver {
    /// Start ticking `simulator` every `interval`
    pub fn spawn(mut simulator: FlightSimulator, interval: Duration) -> (TickDriver, FeedReader) {
        let (mut publisher, reader) = feed(simulator.state());
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        debug!(?interval, time_step = ?simulator.time_step(), "tick driver starting");
        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Acquire) {
                let started = Instant::now();
                publisher.publish(simulator.tick());

                if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                    thread::sleep(remaining);
                }
            }
            debug!(t = simulator.state().timestamp, "tick driver stopped");
            simulator
        });

        (
            TickDriver {
                stop,
                handle: Some(handle),
            },
            reader,
        )
    }

    /// Whether the tick thread is still running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop ticking and hand back the simulator
    ///
    /// Returns `None` if the tick thread panicked.
    pub fn stop(mut self) -> Option<FlightSimulator> {
        self.stop.store(true, Ordering::Release);
        self.handle.take().and_then(|h| h.join().ok())
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulatorBuilder;

    #[test]
    fn test_feed_returns_latest_snapshot() {
        let (mut publisher, mut reader) = feed(&FlightState::cruise());
        assert_eq!(reader.latest(), FlightState::cruise());

        let mut first = FlightState::cruise();
        first.timestamp = 1.0;
        let mut second = first;
        second.timestamp = 2.0;

        publisher.publish(first);
        publisher.publish(second);
        assert_eq!(reader.latest().timestamp, 2.0);
        // Reading again without a new publication returns the same snapshot
        assert_eq!(reader.latest().timestamp, 2.0);
    }

    #[test]
    fn test_driver_publishes_and_stops() {
        let simulator = SimulatorBuilder::new().with_seed(5).build();
        let (driver, mut reader) = TickDriver::spawn(simulator, Duration::from_millis(1));
        assert!(driver.is_running());

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = reader.latest();
        while seen.timestamp < 3.0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
            seen = reader.latest();
        }
        assert!(seen.timestamp >= 3.0);
        assert!(seen.within_limits());
        // Every published snapshot lands on a whole tick
        assert_eq!(seen.timestamp.fract(), 0.0);

        let simulator = driver.stop();
        assert!(simulator.is_some_and(|s| s.state().timestamp >= seen.timestamp));
    }
}
