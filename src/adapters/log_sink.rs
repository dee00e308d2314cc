//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured reactor events to the
//! process log. A websocket or MQTT broadcast adapter would implement
//! the same trait.

use log::{info, warn};

use crate::app::events::ReactorEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ReactorEvent`] as a one-line record.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ReactorEvent) {
        match event {
            ReactorEvent::Started { phase } => info!("CYCLE | started in {}", phase.name()),
            ReactorEvent::Stopped { phase } => info!("CYCLE | stopped in {}", phase.name()),
            ReactorEvent::CycleReset => info!("CYCLE | reset"),
            ReactorEvent::PhaseChanged { from, to } => {
                info!("PHASE | {} -> {}", from.name(), to.name());
            }
            ReactorEvent::SafetyCutoff { cycle_elapsed_secs } => {
                warn!("SAFETY | cycle-max hit after {cycle_elapsed_secs}s, restarting cycle");
            }
            ReactorEvent::RelayChanged { unit, coil, on } => {
                info!("RELAY | u{unit} c{coil} {}", if *on { "ON" } else { "OFF" });
            }
            ReactorEvent::RelayModeChanged { unit, coil, mode } => {
                info!("RELAY | u{unit} c{coil} mode {mode:?}");
            }
            ReactorEvent::CalibrationUpdated { channel, scale, offset } => {
                info!("CAL   | ch{channel} scale={scale:.4} offset={offset:.2}");
            }
            ReactorEvent::PhaseTimesChanged(t) => {
                info!(
                    "CONF  | influent>={} effluent<={} react={}m wait={}m dose={}m post={}m \
                     max={}m heat={}..{}",
                    t.influent_threshold,
                    t.effluent_threshold,
                    t.react_minutes,
                    t.wait_minutes,
                    t.dose_nutrients_minutes,
                    t.wait_after_dose_minutes,
                    t.cycle_time_max_minutes,
                    t.heating_on_temp,
                    t.heating_off_temp,
                );
            }
            ReactorEvent::Telemetry(t) => {
                info!(
                    "TELEM | {} {} | cycle={}s phase={}s | level={:.1} temp={:.1} | faults={}",
                    if t.status.active { "RUN " } else { "IDLE" },
                    t.status.phase.name(),
                    t.timer.cycle_elapsed_secs,
                    t.timer.phase_elapsed_secs,
                    t.readings.first().map_or(0.0, |r| r.value),
                    t.readings.get(2).map_or(0.0, |r| r.value),
                    t.fault_total,
                );
            }
        }
    }
}
