//! Command-dispatch and calibration behavior through the full service.

use std::time::Duration;

use crate::mock_io::{MemoryConfig, RecordingIo, RecordingSink};
use obelix::app::commands::ReactorCommand;
use obelix::app::events::ReactorEvent;
use obelix::app::service::ReactorService;
use obelix::calibration::{LEVEL_CHANNEL, TEMPERATURE_CHANNEL};
use obelix::config::SystemConfig;
use obelix::relay::RelayMode;
use obelix::sequencer::PhaseId;

const TICK: Duration = Duration::from_secs(1);
const UNIT: u8 = 0;

fn make_service() -> (ReactorService, RecordingIo, RecordingSink, MemoryConfig) {
    (
        ReactorService::new(SystemConfig::default()),
        RecordingIo::new(),
        RecordingSink::new(),
        MemoryConfig::new(),
    )
}

// ── Calibration: raw 4095 reads 100.0 and completes influent ──

#[test]
fn full_scale_level_completes_influent() {
    let (mut svc, mut io, mut sink, store) = make_service();

    svc.handle_command(ReactorCommand::Start, &mut io, &store, &mut sink)
        .unwrap();

    io.set_analog(LEVEL_CHANNEL, 4095);
    svc.tick(TICK, &mut io, &mut sink);

    assert!((svc.reading_value(LEVEL_CHANNEL) - 100.0).abs() < 1e-3);
    assert_eq!(
        sink.phase_changes(),
        vec![("influent".to_string(), "react".to_string())]
    );
}

// ── Rejected calibration leaves prior fit in effect ───────────

#[test]
fn equal_raw_calibration_rejected_and_prior_fit_survives() {
    let (mut svc, mut io, mut sink, store) = make_service();

    io.set_analog(LEVEL_CHANNEL, 4095);
    svc.tick(TICK, &mut io, &mut sink);
    let before = svc.reading_value(LEVEL_CHANNEL);

    let result = svc.handle_command(
        ReactorCommand::SetCalibration {
            channel: LEVEL_CHANNEL,
            raw1: 2000,
            phys1: 0.0,
            raw2: 2000,
            phys2: 500.0,
            unit_label: "cm".into(),
        },
        &mut io,
        &store,
        &mut sink,
    );
    assert!(result.is_err());
    assert_eq!(store.save_count(), 0, "rejected write must not persist");

    // Subsequent conversions still use the prior fit.
    svc.tick(TICK, &mut io, &mut sink);
    assert_eq!(svc.reading_value(LEVEL_CHANNEL), before);
}

#[test]
fn accepted_calibration_persists_and_broadcasts_fit() {
    let (mut svc, mut io, mut sink, store) = make_service();

    svc.handle_command(
        ReactorCommand::SetCalibration {
            channel: TEMPERATURE_CHANNEL,
            raw1: 819,
            phys1: -5.0,
            raw2: 4095,
            phys2: 45.0,
            unit_label: "\u{00b0}C".into(),
        },
        &mut io,
        &store,
        &mut sink,
    )
    .unwrap();

    assert_eq!(store.save_count(), 1);
    let cal = sink.events.iter().find_map(|e| match e {
        ReactorEvent::CalibrationUpdated { channel, scale, offset } => {
            Some((*channel, *scale, *offset))
        }
        _ => None,
    });
    let (channel, scale, _offset) = cal.expect("calibration confirmation event");
    assert_eq!(channel, TEMPERATURE_CHANNEL);
    assert!((scale - 50.0 / 3276.0).abs() < 1e-6);
}

// ── Heating: scenario values through the full tick path ───────

#[test]
fn heating_band_holds_between_setpoints() {
    let (mut svc, mut io, mut sink, store) = make_service();
    svc.handle_command(
        ReactorCommand::SetHeatingSetpoints {
            on_temp: 18.0,
            off_temp: 22.0,
        },
        &mut io,
        &store,
        &mut sink,
    )
    .unwrap();

    let heating_coil = 5;
    let raw_for = |temp: f32| -> u16 {
        SystemConfig::default()
            .calibration
            .decalibrate(TEMPERATURE_CHANNEL, temp)
            .round() as u16
    };

    io.set_analog(TEMPERATURE_CHANNEL, raw_for(17.9));
    svc.tick(TICK, &mut io, &mut sink);
    assert!(io.coil(UNIT, heating_coil), "17.9 -> valve opens");

    io.set_analog(TEMPERATURE_CHANNEL, raw_for(20.0));
    svc.tick(TICK, &mut io, &mut sink);
    assert!(io.coil(UNIT, heating_coil), "inside band holds previous want");

    io.set_analog(TEMPERATURE_CHANNEL, raw_for(22.2));
    svc.tick(TICK, &mut io, &mut sink);
    assert!(!io.coil(UNIT, heating_coil), "above band -> valve closes");
}

#[test]
fn inverted_setpoints_rejected() {
    let (mut svc, mut io, mut sink, store) = make_service();
    let before = svc.current_config().heating;
    assert!(svc
        .handle_command(
            ReactorCommand::SetHeatingSetpoints {
                on_temp: 25.0,
                off_temp: 20.0,
            },
            &mut io,
            &store,
            &mut sink,
        )
        .is_err());
    assert_eq!(svc.current_config().heating, before);
    assert_eq!(store.save_count(), 0);
}

// ── Manual overrides ──────────────────────────────────────────

#[test]
fn manual_on_blocks_sequencer_until_cleared() {
    let (mut svc, mut io, mut sink, store) = make_service();

    // Influent pump forced ON while the cycle is stopped.
    svc.handle_command(
        ReactorCommand::SetRelayMode {
            unit: UNIT,
            coil: 0,
            mode: RelayMode::ManualOn,
        },
        &mut io,
        &store,
        &mut sink,
    )
    .unwrap();

    // Idle ticks keep wanting the pump OFF; the override must hold.
    for _ in 0..5 {
        svc.tick(TICK, &mut io, &mut sink);
    }
    assert!(io.coil(UNIT, 0));
    assert_eq!(
        io.writes_to(UNIT, 0).len(),
        1,
        "no further writes while overridden"
    );

    // Back to AUTO: the next tick's OFF want goes through.
    svc.handle_command(
        ReactorCommand::SetRelayMode {
            unit: UNIT,
            coil: 0,
            mode: RelayMode::Auto,
        },
        &mut io,
        &store,
        &mut sink,
    )
    .unwrap();
    svc.tick(TICK, &mut io, &mut sink);
    assert!(!io.coil(UNIT, 0));
}

#[test]
fn set_auto_twice_is_idempotent() {
    let (mut svc, mut io, mut sink, store) = make_service();

    let set_auto = ReactorCommand::SetRelayMode {
        unit: UNIT,
        coil: 1,
        mode: RelayMode::Auto,
    };
    svc.handle_command(set_auto.clone(), &mut io, &store, &mut sink)
        .unwrap();
    let writes_after_first = io.writes.len();
    let snapshot_after_first = svc.relay_snapshot();

    svc.handle_command(set_auto, &mut io, &store, &mut sink)
        .unwrap();
    assert_eq!(io.writes.len(), writes_after_first);
    assert_eq!(svc.relay_snapshot(), snapshot_after_first);
}

// ── Fault paths ───────────────────────────────────────────────

#[test]
fn failed_coil_write_is_retried_next_tick() {
    let (mut svc, mut io, mut sink, store) = make_service();

    svc.handle_command(ReactorCommand::Start, &mut io, &store, &mut sink)
        .unwrap();

    io.fail_writes(true);
    svc.tick(TICK, &mut io, &mut sink);
    assert!(!io.coil(UNIT, 0));
    let faults_after_failure = svc.fault_total();
    assert!(faults_after_failure > 0);

    // Bus recovers: the standing want goes out on the next tick with no
    // operator intervention.
    io.fail_writes(false);
    svc.tick(TICK, &mut io, &mut sink);
    assert!(io.coil(UNIT, 0), "influent pump want retried naturally");
}

#[test]
fn read_faults_do_not_abort_relay_resolution() {
    let (mut svc, mut io, mut sink, store) = make_service();

    svc.handle_command(ReactorCommand::Start, &mut io, &store, &mut sink)
        .unwrap();
    io.fail_reads(true);
    svc.tick(TICK, &mut io, &mut sink);

    // All four channel reads failed, yet the tick still drove the
    // influent pump from the (stale) level value.
    assert!(io.coil(UNIT, 0));
    assert!(svc.fault_total() >= 4);
}

// ── Config snapshots ──────────────────────────────────────────

#[test]
fn threshold_write_persists_and_broadcasts_times() {
    let (mut svc, mut io, mut sink, store) = make_service();

    svc.handle_command(
        ReactorCommand::SetPhaseThreshold {
            phase: PhaseId::React,
            value: 12.5,
        },
        &mut io,
        &store,
        &mut sink,
    )
    .unwrap();

    assert_eq!(store.last_saved().unwrap().react_minutes, 12.5);
    let times = sink.events.iter().find_map(|e| match e {
        ReactorEvent::PhaseTimesChanged(t) => Some(t.clone()),
        _ => None,
    });
    let times = times.expect("phase-times broadcast");
    assert_eq!(times.react_minutes, 12.5);
    assert_eq!(times.react_seconds, 750);
}

#[test]
fn negative_threshold_rejected_without_side_effects() {
    let (mut svc, mut io, mut sink, store) = make_service();
    let before = svc.phase_times_snapshot();

    assert!(svc
        .handle_command(
            ReactorCommand::SetPhaseThreshold {
                phase: PhaseId::Wait,
                value: -2.0,
            },
            &mut io,
            &store,
            &mut sink,
        )
        .is_err());

    assert_eq!(svc.phase_times_snapshot(), before);
    assert_eq!(store.save_count(), 0);
}
