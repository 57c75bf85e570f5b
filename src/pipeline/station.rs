//! Station abstraction and runner for the pipeline.
//!
//! Each station consumes one input type and produces one output type,
//! running in its own thread and connected to its neighbors by bounded
//! channels. A station exits when its input channel closes, which makes
//! shutdown a cascade: the capture thread hangs up first, then each station
//! drains and closes its own output in turn.

use crate::pipeline::error::{ErrorReporter, StationError};
use crossbeam_channel::{Receiver, Sender};
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A processing station in the pipeline.
pub trait Station: Send + 'static {
    /// The input type this station receives.
    type Input: Send + 'static;
    /// The output type this station produces.
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// Returns:
    /// - `Ok(Some(output))` - produced an output for the next station
    /// - `Ok(None)` - consumed the input without output (filtered)
    /// - `Err(StationError)` - processing failed
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    /// Returns the name of this station for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called when the station is shutting down.
    fn shutdown(&mut self) {}
}

/// Runs a station in a dedicated thread.
pub struct StationRunner<S: Station> {
    handle: Option<JoinHandle<()>>,
    station_name: &'static str,
    _phantom: PhantomData<S>,
}

impl<S: Station> StationRunner<S> {
    /// Spawns a new station in a dedicated thread.
    pub fn spawn(
        mut station: S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let station_name = station.name();

        let handle = thread::spawn(move || {
            Self::run_station(&mut station, input_rx, output_tx, error_reporter);
        });

        Self {
            handle: Some(handle),
            station_name,
            _phantom: PhantomData,
        }
    }

    fn run_station(
        station: &mut S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) {
        let station_name = station.name();

        while let Ok(input) = input_rx.recv() {
            match station.process(input) {
                Ok(Some(output)) => {
                    if output_tx.send(output).is_err() {
                        // Next station hung up, shut down
                        break;
                    }
                }
                Ok(None) => {}
                Err(StationError::Recoverable(msg)) => {
                    error_reporter.report(station_name, &StationError::Recoverable(msg));
                }
                Err(StationError::Fatal(msg)) => {
                    error_reporter.report(station_name, &StationError::Fatal(msg));
                    break;
                }
            }
        }

        station.shutdown();
    }

    /// Waits for the station thread to complete.
    pub fn join(mut self) -> Result<(), String> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| format!("Station '{}' thread panicked", self.station_name))
        } else {
            Ok(())
        }
    }

    /// Returns the name of the station.
    pub fn name(&self) -> &'static str {
        self.station_name
    }
}
