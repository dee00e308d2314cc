//! Reactor service: the hexagonal core.
//!
//! [`ReactorService`] owns the cycle sequencer, relay manager, heating
//! controller, calibration table, and fault log. It exposes a clean,
//! bus-agnostic API; all I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters.
//!
//! ```text
//!              ┌──────────────────────────────┐
//!   IoPort ───▶│        ReactorService        │───▶ EventSink
//!              │ Sequencer · Relays · Heating │
//!   IoPort ◀───│ Calibration · FaultLog       │◀─── ReactorCommand
//!              └──────────────────────────────┘
//! ```
//!
//! One `tick` per scheduling period runs, in order: analog reads →
//! calibration → heating evaluation → sequencer → relay want/write
//! resolution → snapshot publication. Bus errors are caught per
//! operation, so one failed channel or coil never aborts the rest of
//! the tick's work.

use std::time::Duration;

use log::{info, warn};

use crate::calibration::{self, CalibrationSummary};
use crate::config::SystemConfig;
use crate::control::heating::HeatingController;
use crate::diagnostics::{FaultKind, FaultLog};
use crate::relay::RelayManager;
use crate::sequencer::phases::{HEATING_VALVE_COIL, PROCESS_COILS, PROCESS_UNIT};
use crate::sequencer::{PhaseTarget, Sequencer, TickOutcome};
use crate::{Error, Result};

use super::commands::ReactorCommand;
use super::events::{
    PhaseTimesSnapshot, ReactorEvent, ReadingSnapshot, RelaySnapshot, StatusSnapshot,
    TelemetrySnapshot, TimerSnapshot,
};
use super::ports::{ConfigPort, EventSink, IoPort};

/// Analog channels polled every tick.
const MONITORED_CHANNELS: [u8; 4] = [
    calibration::LEVEL_CHANNEL,
    calibration::PH_CHANNEL,
    calibration::TEMPERATURE_CHANNEL,
    calibration::OXYGEN_CHANNEL,
];

/// Last good raw/calibrated pair for one channel.
#[derive(Debug, Clone, Copy)]
struct ChannelReading {
    raw: u16,
    value: f32,
}

// ───────────────────────────────────────────────────────────────
// ReactorService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrating all reactor logic.
pub struct ReactorService {
    config: SystemConfig,
    sequencer: Sequencer,
    relays: RelayManager,
    heating: HeatingController,
    /// Last good reading per monitored channel. A failed read leaves the
    /// previous value in place, so snapshots stay consistent (stale for
    /// that channel at worst).
    readings: [ChannelReading; MONITORED_CHANNELS.len()],
    faults: FaultLog,
    tick_count: u64,
    since_telemetry: Duration,
}

impl ReactorService {
    /// Construct the service from loaded configuration.
    pub fn new(config: SystemConfig) -> Self {
        let readings = core::array::from_fn(|i| {
            let channel = MONITORED_CHANNELS[i];
            let raw = calibration::RAW_LOW;
            ChannelReading {
                raw,
                value: config.calibration.calibrate(channel, raw),
            }
        });
        Self {
            config,
            sequencer: Sequencer::new(),
            relays: RelayManager::new(),
            heating: HeatingController::new(),
            readings,
            faults: FaultLog::new(),
            tick_count: 0,
            since_telemetry: Duration::ZERO,
        }
    }

    /// Reconcile cached relay states from confirmed coil reads. Called
    /// once at startup so the first snapshot reflects the plant, not
    /// assumptions. Unreadable coils keep their assumed state.
    pub fn sync_relay_states(&mut self, io: &mut impl IoPort) {
        for coil in 0..crate::relay::COILS_PER_UNIT as u8 {
            match io.read_coil(PROCESS_UNIT, coil) {
                Ok(on) => self.relays.report_physical(PROCESS_UNIT, coil, on),
                Err(e) => warn!("relay sync u{PROCESS_UNIT} c{coil}: {e}"),
            }
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control period.
    ///
    /// `dt` is the elapsed time since the previous tick as measured by
    /// the driver; the cycle timers advance by exactly this amount.
    pub fn tick(&mut self, dt: Duration, io: &mut impl IoPort, sink: &mut impl EventSink) {
        self.tick_count += 1;

        // 1. Analog reads + calibration.
        for (i, &channel) in MONITORED_CHANNELS.iter().enumerate() {
            match io.read_analog(channel) {
                Ok(raw) => {
                    self.readings[i] = ChannelReading {
                        raw,
                        value: self.config.calibration.calibrate(channel, raw),
                    };
                }
                Err(e) => {
                    warn!("analog read ch{channel}: {e}, reusing last value");
                    self.faults
                        .record(self.tick_count, FaultKind::ChannelRead { channel });
                }
            }
        }

        // 2. Heating valve (hysteresis, independent of the cycle).
        let temp = self.reading_value(calibration::TEMPERATURE_CHANNEL);
        let heat_want = self.heating.evaluate(temp, &self.config.heating);
        self.drive_want(io, sink, HEATING_VALVE_COIL, heat_want);

        // 3. Cycle sequencer.
        let readings = self.readings;
        let outcome = self.sequencer.tick(
            |ch| channel_value(&readings, ch),
            dt,
            &self.config,
        );
        match outcome {
            TickOutcome::Held => {}
            TickOutcome::Advanced { from, to } => {
                sink.emit(&ReactorEvent::PhaseChanged { from, to });
            }
            TickOutcome::SafetyCutoff { cycle_elapsed } => {
                self.faults.record(self.tick_count, FaultKind::SafetyCutoff);
                sink.emit(&ReactorEvent::SafetyCutoff {
                    cycle_elapsed_secs: cycle_elapsed.as_secs(),
                });
            }
        }

        // 4. Process relay wants. While the cycle is inactive every AUTO
        //    process relay wants OFF.
        for coil in PROCESS_COILS {
            let want = self.sequencer.auto_want(coil);
            self.drive_want(io, sink, coil, want);
        }

        // 5. Snapshot publication.
        self.since_telemetry += dt;
        let telemetry_every = Duration::from_secs(u64::from(self.config.telemetry_interval_secs));
        if self.since_telemetry >= telemetry_every {
            self.since_telemetry = Duration::ZERO;
            sink.emit(&ReactorEvent::Telemetry(self.telemetry_snapshot()));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process one operator command. Validation failures leave all prior
    /// values in force and are returned to the caller; successful
    /// configuration writes are persisted through `storage`.
    pub fn handle_command(
        &mut self,
        cmd: ReactorCommand,
        io: &mut impl IoPort,
        storage: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let outcome = self.dispatch_command(cmd, io, storage, sink);
        if outcome.is_err() {
            self.faults.record(self.tick_count, FaultKind::CommandRejected);
        }
        outcome
    }

    fn dispatch_command(
        &mut self,
        cmd: ReactorCommand,
        io: &mut impl IoPort,
        storage: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            ReactorCommand::Start => {
                self.sequencer.start();
                sink.emit(&ReactorEvent::Started {
                    phase: self.sequencer.phase(),
                });
            }
            ReactorCommand::Stop => {
                self.sequencer.stop();
                self.all_process_wants_off(io, sink);
                sink.emit(&ReactorEvent::Stopped {
                    phase: self.sequencer.phase(),
                });
            }
            ReactorCommand::Reset => {
                self.sequencer.reset();
                self.all_process_wants_off(io, sink);
                sink.emit(&ReactorEvent::CycleReset);
            }
            ReactorCommand::SetPhaseThreshold { phase, value } => {
                self.config.set_phase_value(phase, value)?;
                info!("phase {} target set to {value}", phase.name());
                self.persist(storage);
                sink.emit(&ReactorEvent::PhaseTimesChanged(self.phase_times_snapshot()));
            }
            ReactorCommand::SetCycleMax { minutes } => {
                self.config.set_cycle_max(minutes)?;
                info!("cycle max set to {minutes} min");
                self.persist(storage);
                sink.emit(&ReactorEvent::PhaseTimesChanged(self.phase_times_snapshot()));
            }
            ReactorCommand::SetHeatingSetpoints { on_temp, off_temp } => {
                self.config.set_heating(on_temp, off_temp)?;
                info!("heating band set to {on_temp}..{off_temp} \u{00b0}C");
                self.persist(storage);
                sink.emit(&ReactorEvent::PhaseTimesChanged(self.phase_times_snapshot()));
            }
            ReactorCommand::SetCalibration {
                channel,
                raw1,
                phys1,
                raw2,
                phys2,
                unit_label,
            } => {
                let summary: CalibrationSummary = self.config.calibration.set_points(
                    channel, raw1, phys1, raw2, phys2, &unit_label,
                )?;
                info!(
                    "calibration ch{channel}: scale {:.4}, offset {:.2} [{}]",
                    summary.scale, summary.offset, summary.unit_label
                );
                self.persist(storage);
                sink.emit(&ReactorEvent::CalibrationUpdated {
                    channel,
                    scale: summary.scale,
                    offset: summary.offset,
                });
            }
            ReactorCommand::SetRelayMode { unit, coil, mode } => {
                self.relays.set_mode(io, unit, coil, mode)?;
                sink.emit(&ReactorEvent::RelayModeChanged { unit, coil, mode });
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Per-phase configuration for the control panel.
    pub fn phase_times_snapshot(&self) -> PhaseTimesSnapshot {
        let c = &self.config;
        let secs = crate::sequencer::phases::minutes_to_secs;
        PhaseTimesSnapshot {
            influent_threshold: c.influent_threshold,
            effluent_threshold: c.effluent_threshold,
            react_minutes: c.react_minutes,
            react_seconds: secs(c.react_minutes),
            wait_minutes: c.wait_minutes,
            wait_seconds: secs(c.wait_minutes),
            dose_nutrients_minutes: c.dose_nutrients_minutes,
            dose_nutrients_seconds: secs(c.dose_nutrients_minutes),
            wait_after_dose_minutes: c.wait_after_dose_minutes,
            wait_after_dose_seconds: secs(c.wait_after_dose_minutes),
            cycle_time_max_minutes: c.cycle_time_max_minutes,
            heating_on_temp: c.heating.on_temp,
            heating_off_temp: c.heating.off_temp,
        }
    }

    /// Run/stop state and current phase.
    pub fn status_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            active: self.sequencer.is_active(),
            phase: self.sequencer.phase(),
            phase_elapsed_secs: self.sequencer.phase_elapsed().as_secs(),
        }
    }

    /// Timer view including the current phase's live target.
    pub fn timer_snapshot(&self) -> TimerSnapshot {
        let phase = self.sequencer.phase();
        TimerSnapshot {
            cycle_elapsed_secs: self.sequencer.cycle_elapsed().as_secs(),
            phase,
            phase_elapsed_secs: self.sequencer.phase_elapsed().as_secs(),
            phase_target: PhaseTarget::for_phase(phase, &self.config),
        }
    }

    /// Calibrated readings with display metadata.
    pub fn readings_snapshot(&self) -> Vec<ReadingSnapshot> {
        MONITORED_CHANNELS
            .iter()
            .zip(self.readings.iter())
            .map(|(&channel, r)| ReadingSnapshot {
                channel,
                label: calibration::channel_label(channel),
                raw: r.raw,
                value: r.value,
                unit_label: self
                    .config
                    .calibration
                    .point(channel)
                    .unit_label
                    .as_str()
                    .to_owned(),
            })
            .collect()
    }

    /// Mode and physical state of every relay coil.
    pub fn relay_snapshot(&self) -> Vec<RelaySnapshot> {
        self.relays
            .iter()
            .map(|(unit, coil, e)| RelaySnapshot {
                unit,
                coil,
                mode: e.mode,
                physical: e.physical,
            })
            .collect()
    }

    /// Full state handoff for the broadcast collaborator.
    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            status: self.status_snapshot(),
            timer: self.timer_snapshot(),
            readings: self.readings_snapshot(),
            relays: self.relay_snapshot(),
            fault_total: self.faults.total(),
        }
    }

    /// Clone of the live configuration (for read-back over the API).
    pub fn current_config(&self) -> SystemConfig {
        self.config.clone()
    }

    /// Last good calibrated value for one monitored channel.
    pub fn reading_value(&self, channel: u8) -> f32 {
        channel_value(&self.readings, channel)
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Lifetime fault count.
    pub fn fault_total(&self) -> u64 {
        self.faults.total()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Push one want-state at a process-unit coil, recording (not
    /// propagating) a write failure so the rest of the tick proceeds.
    fn drive_want(&mut self, io: &mut impl IoPort, sink: &mut impl EventSink, coil: u8, want: bool) {
        match self.relays.apply_auto_want(io, PROCESS_UNIT, coil, want) {
            Ok(true) => sink.emit(&ReactorEvent::RelayChanged {
                unit: PROCESS_UNIT,
                coil,
                on: want,
            }),
            Ok(false) => {}
            Err(Error::RelayWrite { unit, coil }) => {
                warn!("coil write u{unit} c{coil} failed, retrying next tick");
                self.faults
                    .record(self.tick_count, FaultKind::RelayWrite { unit, coil });
            }
            Err(e) => warn!("coil u{PROCESS_UNIT} c{coil}: {e}"),
        }
    }

    /// Drive every AUTO process relay off (cycle stopped or reset).
    fn all_process_wants_off(&mut self, io: &mut impl IoPort, sink: &mut impl EventSink) {
        for coil in PROCESS_COILS {
            self.drive_want(io, sink, coil, false);
        }
    }

    /// Persist the current configuration; failures are logged and
    /// recorded but do not undo the in-memory update.
    fn persist(&mut self, storage: &impl ConfigPort) {
        if let Err(e) = storage.save(&self.config) {
            warn!("config save failed: {e}");
            self.faults.record(self.tick_count, FaultKind::ConfigSave);
        }
    }
}

/// Calibrated value lookup over the monitored-channel array.
fn channel_value(readings: &[ChannelReading; MONITORED_CHANNELS.len()], channel: u8) -> f32 {
    MONITORED_CHANNELS
        .iter()
        .position(|&c| c == channel)
        .map_or(0.0, |i| readings[i].value)
}
