//! Whole-cycle behavior through the service: timed phases, the
//! cycle-max safety ceiling, and freeze/resume semantics.

use std::time::Duration;

use crate::mock_io::{MemoryConfig, RecordingIo, RecordingSink};
use obelix::app::commands::ReactorCommand;
use obelix::app::events::ReactorEvent;
use obelix::app::service::ReactorService;
use obelix::calibration::LEVEL_CHANNEL;
use obelix::config::SystemConfig;
use obelix::sequencer::{PhaseId, PhaseTarget};

const TICK: Duration = Duration::from_secs(1);

fn started_service(config: SystemConfig) -> (ReactorService, RecordingIo, RecordingSink, MemoryConfig) {
    let mut svc = ReactorService::new(config);
    let mut io = RecordingIo::new();
    let mut sink = RecordingSink::new();
    let store = MemoryConfig::new();
    svc.handle_command(ReactorCommand::Start, &mut io, &store, &mut sink)
        .unwrap();
    (svc, io, sink, store)
}

// ── Timed react phase: 600 s then effluent ────────────────────

#[test]
fn react_runs_600_seconds_then_advances_to_effluent() {
    let mut config = SystemConfig::default();
    config.react_minutes = 10.0;
    let (mut svc, mut io, mut sink, _store) = started_service(config);

    // Fill the tank: influent completes immediately.
    io.set_analog(LEVEL_CHANNEL, 4095);
    svc.tick(TICK, &mut io, &mut sink);
    assert_eq!(svc.status_snapshot().phase, PhaseId::React);

    // 599 s of react: still holding.
    for _ in 0..599 {
        svc.tick(TICK, &mut io, &mut sink);
    }
    assert_eq!(svc.status_snapshot().phase, PhaseId::React);
    assert_eq!(svc.status_snapshot().phase_elapsed_secs, 599);

    // Second 600 completes the phase; phase-elapsed restarts at zero.
    svc.tick(TICK, &mut io, &mut sink);
    assert_eq!(svc.status_snapshot().phase, PhaseId::Effluent);
    assert_eq!(svc.status_snapshot().phase_elapsed_secs, 0);
}

// ── Cycle-max ceiling fires regardless of the phase's own gate ─

#[test]
fn cycle_max_forces_restart_during_wait() {
    let mut config = SystemConfig::default();
    config.react_minutes = 1.0;
    config.effluent_threshold = 10.0;
    config.wait_minutes = 600.0; // would outlast the ceiling
    config.cycle_time_max_minutes = 60.0;
    let (mut svc, mut io, mut sink, _store) = started_service(config);

    // Walk to the wait phase: fill, react 60 s, drain.
    io.set_analog(LEVEL_CHANNEL, 4095);
    svc.tick(TICK, &mut io, &mut sink); // -> react
    for _ in 0..60 {
        svc.tick(TICK, &mut io, &mut sink); // -> effluent on the 60th
    }
    io.set_analog(LEVEL_CHANNEL, 819); // tank empty
    svc.tick(TICK, &mut io, &mut sink); // -> wait
    assert_eq!(svc.status_snapshot().phase, PhaseId::Wait);

    // Sit in wait until the cycle hits 3600 s total.
    let so_far = svc.timer_snapshot().cycle_elapsed_secs;
    for _ in 0..(3600 - so_far - 1) {
        svc.tick(TICK, &mut io, &mut sink);
    }
    assert_eq!(svc.status_snapshot().phase, PhaseId::Wait);
    assert_eq!(svc.timer_snapshot().cycle_elapsed_secs, 3599);

    svc.tick(TICK, &mut io, &mut sink);
    let timer = svc.timer_snapshot();
    assert_eq!(timer.phase, PhaseId::Influent);
    assert_eq!(timer.cycle_elapsed_secs, 0);
    assert_eq!(timer.phase_elapsed_secs, 0);
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, ReactorEvent::SafetyCutoff { cycle_elapsed_secs: 3600 })));
}

// ── Freeze and resume ─────────────────────────────────────────

#[test]
fn stop_freezes_timers_and_start_resumes_them() {
    let (mut svc, mut io, mut sink, store) = started_service(SystemConfig::default());

    io.set_analog(LEVEL_CHANNEL, 4095);
    svc.tick(TICK, &mut io, &mut sink); // -> react
    for _ in 0..30 {
        svc.tick(TICK, &mut io, &mut sink);
    }

    svc.handle_command(ReactorCommand::Stop, &mut io, &store, &mut sink)
        .unwrap();
    let frozen = svc.timer_snapshot();
    assert!(!svc.status_snapshot().active);

    // Ticks while stopped change nothing.
    for _ in 0..10 {
        svc.tick(TICK, &mut io, &mut sink);
    }
    assert_eq!(svc.timer_snapshot(), frozen);

    svc.handle_command(ReactorCommand::Start, &mut io, &store, &mut sink)
        .unwrap();
    svc.tick(TICK, &mut io, &mut sink);
    assert_eq!(
        svc.timer_snapshot().phase_elapsed_secs,
        frozen.phase_elapsed_secs + 1
    );
}

#[test]
fn reset_rewinds_to_influent_with_zeroed_timers() {
    let (mut svc, mut io, mut sink, store) = started_service(SystemConfig::default());

    io.set_analog(LEVEL_CHANNEL, 4095);
    svc.tick(TICK, &mut io, &mut sink);
    for _ in 0..10 {
        svc.tick(TICK, &mut io, &mut sink);
    }

    svc.handle_command(ReactorCommand::Reset, &mut io, &store, &mut sink)
        .unwrap();
    let status = svc.status_snapshot();
    assert!(!status.active);
    assert_eq!(status.phase, PhaseId::Influent);
    assert_eq!(status.phase_elapsed_secs, 0);
    assert_eq!(svc.timer_snapshot().cycle_elapsed_secs, 0);
}

// ── Timer snapshot carries the live target ────────────────────

#[test]
fn timer_snapshot_reports_current_phase_target() {
    let (mut svc, mut io, mut sink, store) = started_service(SystemConfig::default());

    match svc.timer_snapshot().phase_target {
        PhaseTarget::Level { threshold, .. } => assert_eq!(threshold, 50.0),
        other => panic!("influent should have a level target, got {other:?}"),
    }

    // Operator change shows up in the very next snapshot.
    svc.handle_command(
        ReactorCommand::SetPhaseThreshold {
            phase: PhaseId::Influent,
            value: 62.0,
        },
        &mut io,
        &store,
        &mut sink,
    )
    .unwrap();
    match svc.timer_snapshot().phase_target {
        PhaseTarget::Level { threshold, .. } => assert_eq!(threshold, 62.0),
        other => panic!("unexpected target {other:?}"),
    }

    io.set_analog(LEVEL_CHANNEL, 4095);
    svc.tick(TICK, &mut io, &mut sink); // -> react
    match svc.timer_snapshot().phase_target {
        PhaseTarget::Seconds(secs) => {
            assert_eq!(secs, SystemConfig::default().react_minutes as u64 * 60);
        }
        other => panic!("react should have a timed target, got {other:?}"),
    }
}

// ── Full cycle order through the service ──────────────────────

#[test]
fn phases_advance_in_fixed_order_and_wrap() {
    let mut config = SystemConfig::default();
    config.react_minutes = 2.0 / 60.0;
    config.wait_minutes = 2.0 / 60.0;
    config.dose_nutrients_minutes = 2.0 / 60.0;
    config.wait_after_dose_minutes = 2.0 / 60.0;
    let (mut svc, mut io, mut sink, _store) = started_service(config);

    for _ in 0..40 {
        let raw = if svc.status_snapshot().phase == PhaseId::Effluent {
            819
        } else {
            4095
        };
        io.set_analog(LEVEL_CHANNEL, raw);
        svc.tick(TICK, &mut io, &mut sink);
    }

    let changes = sink.phase_changes();
    assert!(changes.len() >= 6);
    assert_eq!(
        &changes[..6],
        &[
            ("influent".into(), "react".into()),
            ("react".into(), "effluent".into()),
            ("effluent".into(), "wait".into()),
            ("wait".into(), "dose_nutrients".into()),
            ("dose_nutrients".into(), "wait_after_dose".into()),
            ("wait_after_dose".into(), "influent".into()),
        ]
    );
}

// ── Pump relays follow the phase ──────────────────────────────

#[test]
fn pumps_run_only_in_their_phase() {
    let (mut svc, mut io, mut sink, _store) = started_service(SystemConfig::default());

    svc.tick(TICK, &mut io, &mut sink);
    assert!(io.coil(0, 0), "influent pump on during influent");
    assert!(!io.coil(0, 1));
    assert!(!io.coil(0, 2));

    io.set_analog(LEVEL_CHANNEL, 4095);
    svc.tick(TICK, &mut io, &mut sink); // -> react
    assert!(!io.coil(0, 0), "influent pump off once react starts");
    assert!(!io.coil(0, 1));
}
