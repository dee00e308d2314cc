//! Obelix reactor controller, main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │   SimIo            FileConfig          LogEventSink      │
//! │   (IoPort)         (ConfigPort)        (EventSink)       │
//! │                                                          │
//! │  ────────────── Port Trait Boundary ──────────────       │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │           ReactorService (pure logic)          │      │
//! │  │  Sequencer · Relays · Heating · Calibration    │      │
//! │  └────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! One periodic driver owns the whole control period: operator commands
//! are drained from a channel between ticks, then the service runs read
//! → calibrate → heating → sequencer → relay resolution as a single
//! unit of work. A slow bus lengthens the effective period instead of
//! overlapping writes; the driver never schedules a tick before the
//! previous one finished.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{info, warn};

use obelix::adapters::file_config::FileConfig;
use obelix::adapters::log_sink::LogEventSink;
use obelix::adapters::sim_io::SimIo;
use obelix::app::commands::ReactorCommand;
use obelix::app::ports::ConfigPort;
use obelix::app::service::ReactorService;
use obelix::config::SystemConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Obelix reactor controller v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Load config (or defaults) ──────────────────────────
    let settings_path =
        std::env::var("OBELIX_SETTINGS").unwrap_or_else(|_| "settings.json".to_string());
    let storage = FileConfig::new(&settings_path);
    let config = match storage.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("settings load failed ({e}), running with defaults");
            SystemConfig::default()
        }
    };
    let tick_interval = Duration::from_millis(u64::from(config.tick_interval_ms));

    // ── 2. Wire adapters and service ──────────────────────────
    let mut io = SimIo::new();
    let mut sink = LogEventSink::new();
    let mut service = ReactorService::new(config);
    service.sync_relay_states(&mut io);

    // ── 3. Operator command channel ───────────────────────────
    //
    // The transport collaborator (web panel, RPC) would hold the sender
    // half. The bench starts the cycle on its own so the loop has
    // something to do.
    let (tx, rx) = mpsc::channel::<ReactorCommand>();
    tx.send(ReactorCommand::Start)?;

    // ── 4. Control loop ───────────────────────────────────────
    let mut last_tick = Instant::now();
    loop {
        std::thread::sleep(tick_interval);
        let now = Instant::now();
        let dt = now - last_tick;
        last_tick = now;

        // Commands serialize with the tick: applied strictly between
        // periods, never mid-tick.
        while let Ok(cmd) = rx.try_recv() {
            if let Err(e) = service.handle_command(cmd, &mut io, &storage, &mut sink) {
                warn!("command rejected: {e}");
            }
        }

        io.step_plant(dt);
        service.tick(dt, &mut io, &mut sink);
    }
}
