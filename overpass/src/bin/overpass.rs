use chrono::FixedOffset;
use clap::Parser;
use std::{
    fs,
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{info, warn};

use overpass_lib::{
    config::Config,
    orbit::Sgp4Propagator,
    predictor::PassWindow,
    system::{SystemEnvironment, TickInputs, TrackerSharedState, TrackingSystem},
    units::{Time, Timestamp},
    visibility::VisibilityState,
    TrackingComponent,
};

#[derive(Parser, Debug)]
#[command(version)]
struct Opts {
    /// Configuration toml file.
    ///
    /// Built-in defaults are used when not provided.
    #[arg(long)]
    config: Option<PathBuf>,

    /// TLE file: a name line followed by the two element lines.
    ///
    /// Overrides the config file entry.
    #[arg(long)]
    tle: Option<PathBuf>,

    /// Control loop period in seconds
    #[arg(long, default_value_t = 1.0)]
    tick: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();

    let intr = interruptor::Interruptor::new();
    let intr_clone = intr.clone();
    ctrlc::set_handler(move || {
        if intr_clone.is_set() {
            let exit_code = if cfg!(target_family = "unix") {
                // 128 (fatal error signal "n") + 2 (control-c is fatal error signal 2)
                130
            } else {
                // Windows code 3221225786
                // -1073741510 == C000013A
                -1073741510
            };
            std::process::exit(exit_code);
        } else {
            intr_clone.set();
        }
    })?;

    let config = match &opts.config {
        Some(path) => Config::load(path),
        None => Config::default(),
    };
    let display_offset = FixedOffset::east_opt(config.utc_offset_hours * 3600)
        .expect("utc-offset-hours out of range");

    let mut system = TrackingSystem::new(config.tracking_config(), Box::new(Sgp4Propagator::new()));
    let mut shared = TrackerSharedState::new();

    // Local element set at boot; a refresh from the network belongs to an
    // outer collaborator and arrives through load_tle the same way.
    match opts.tle.clone().or_else(|| config.tle_path.clone()) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(raw) => match system.load_tle(&raw) {
                Ok(()) => {
                    if let Some(set) = system.element_set() {
                        info!(name = %set.name, "tracking element set");
                    }
                }
                Err(e) => warn!(error = %e, "TLE load failed, running degraded"),
            },
            Err(e) => warn!(path = %path.display(), error = %e, "could not read TLE file"),
        },
        None => warn!("no TLE file configured, running degraded"),
    }

    let dt = Time::from_secs(opts.tick);
    let mut iteration: u64 = 0;

    loop {
        if intr.is_set() {
            break;
        }

        let inputs = TickInputs {
            network_epoch: wall_clock_epoch(),
            nav_fix: None,
        };
        let env = SystemEnvironment { inputs: &inputs };

        if iteration == 0 {
            system.init(&env, &mut shared);
        }
        system.step(dt, &env, &mut shared);

        match (shared.orbit, shared.epoch) {
            (Some(orbit), Some(epoch)) => {
                let next = match system.next_pass() {
                    Ok(Some(window)) => format_pass(&window, &display_offset),
                    Ok(None) => "none within 24 h".to_owned(),
                    Err(e) => e.to_string(),
                };
                println!(
                    "{}  {}  vis: {}  next pass: {}",
                    format_display_time(epoch, &display_offset),
                    orbit,
                    visibility_label(shared.signal.state),
                    next,
                );
            }
            _ => {
                if iteration % 10 == 0 {
                    println!("degraded: no valid element set or time source");
                }
            }
        }

        iteration += 1;
        std::thread::sleep(Duration::from_secs_f64(opts.tick));
    }

    Ok(())
}

fn wall_clock_epoch() -> Option<Timestamp> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| Timestamp::from_unix_secs(d.as_secs_f64()))
}

fn format_display_time(t: Timestamp, offset: &FixedOffset) -> String {
    t.as_datetime()
        .map(|dt| {
            dt.with_timezone(offset)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "--".to_owned())
}

/// Acquisition and loss are only step-accurate, so minute precision.
fn format_pass(window: &PassWindow, offset: &FixedOffset) -> String {
    let fmt = |t: Timestamp| {
        t.as_datetime()
            .map(|dt| dt.with_timezone(offset).format("%H:%M").to_string())
            .unwrap_or_else(|| "--".to_owned())
    };
    format!(
        "AOS {} LOS {} max {:.0}° ({:.1} min)",
        fmt(window.aos),
        fmt(window.los),
        window.max_elevation.as_degrees(),
        window.duration_minutes(),
    )
}

fn visibility_label(state: VisibilityState) -> &'static str {
    match state {
        VisibilityState::Acquired => "ACQ",
        VisibilityState::HoldDown => "HOLD",
        VisibilityState::Idle => "idle",
    }
}

mod interruptor {
    use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
    use std::sync::Arc;

    #[derive(Clone, Debug)]
    #[repr(transparent)]
    pub struct Interruptor(Arc<AtomicBool>);

    impl Interruptor {
        pub fn new() -> Self {
            Interruptor(Arc::new(AtomicBool::new(false)))
        }

        pub fn set(&self) {
            self.0.store(true, SeqCst);
        }

        pub fn is_set(&self) -> bool {
            self.0.load(SeqCst)
        }
    }

    impl Default for Interruptor {
        fn default() -> Self {
            Self::new()
        }
    }
}
