//! Epoch source for the tracking core.
//!
//! Maintains seconds-since-Unix-epoch UTC time for everything downstream,
//! fed by a network time service (authoritative once it has synchronized)
//! or by satellite-navigation time fixes. Between syncs the epoch
//! advances with the control loop tick.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::units::{Angle, Time, Timestamp};

/// Date, time, and ground position from a satellite-navigation fix.
/// The date/time fields represent coordinated universal time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NavFix {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,

    pub latitude: Angle,
    pub longitude: Angle,
}

impl NavFix {
    /// Epoch of the fix's UTC fields.
    ///
    /// Goes through chrono's naive-to-UTC path, which never consults the
    /// ambient timezone configuration; the runtime's local offset only
    /// exists for display formatting elsewhere.
    pub fn epoch(&self) -> Option<Timestamp> {
        let datetime = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.minute, self.second)?;
        Some(Timestamp::from_unix_secs(
            datetime.and_utc().timestamp() as f64
        ))
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EpochSource {
    Network,
    NavFix,
}

#[derive(Debug, Copy, Clone)]
pub struct TimeBaseConfig {
    /// Minimum spacing between navigation-fix adoptions once network time
    /// has synchronized, to keep fix jitter out of the epoch base.
    pub nav_resync_interval: Time,

    /// Adoptions that move the epoch by more than this are reported as a
    /// discontinuity instead of silently overwriting.
    pub jump_threshold: Time,
}

impl Default for TimeBaseConfig {
    fn default() -> Self {
        Self {
            nav_resync_interval: Time::from_secs(60.0),
            jump_threshold: Time::from_secs(5.0),
        }
    }
}

pub struct TimeBase {
    config: TimeBaseConfig,
    epoch: Option<Timestamp>,
    source: Option<EpochSource>,
    network_synced: bool,
    last_nav_adoption: Option<Timestamp>,
}

impl TimeBase {
    pub fn new(config: TimeBaseConfig) -> Self {
        Self {
            config,
            epoch: None,
            source: None,
            network_synced: false,
            last_nav_adoption: None,
        }
    }

    /// `None` until the first synchronization from either source.
    pub fn current_epoch(&self) -> Option<Timestamp> {
        self.epoch
    }

    pub fn source(&self) -> Option<EpochSource> {
        self.source
    }

    /// Advance the epoch by one control loop tick.
    pub fn advance(&mut self, dt: Time) {
        if let Some(epoch) = &mut self.epoch {
            *epoch += dt;
        }
    }

    pub fn sync_network(&mut self, t: Timestamp) {
        self.adopt(t, EpochSource::Network);
        self.network_synced = true;
    }

    /// Adopt a navigation-derived time, rate-limited once network time is
    /// the established base.
    pub fn sync_nav_fix(&mut self, fix: &NavFix) {
        let Some(t) = fix.epoch() else {
            warn!(?fix, "navigation fix with nonsense date/time fields");
            return;
        };

        if self.network_synced {
            if let Some(last) = self.last_nav_adoption {
                if t - last < self.config.nav_resync_interval {
                    return;
                }
            }
        }

        self.adopt(t, EpochSource::NavFix);
        self.last_nav_adoption = Some(t);
    }

    fn adopt(&mut self, t: Timestamp, source: EpochSource) {
        if let Some(current) = self.epoch {
            let jump = (t - current).abs();
            if jump > self.config.jump_threshold {
                warn!(from = ?current, to = ?t, ?source, "epoch discontinuity");
            }
        }
        if self.source != Some(source) {
            debug!(?source, "epoch source changed");
        }
        self.epoch = Some(t);
        self.source = Some(source);
    }
}

impl<'a> crate::TrackingComponent<'a> for TimeBase {
    type SharedState = crate::system::TrackerSharedState;
    type Environment = crate::system::SystemEnvironment<'a>;

    fn step(
        &mut self,
        dt: Time,
        env: &'a Self::Environment,
        shared_state: &mut Self::SharedState,
    ) {
        self.advance(dt);
        if let Some(t) = env.inputs.network_epoch {
            self.sync_network(t);
        }
        if let Some(fix) = &env.inputs.nav_fix {
            self.sync_nav_fix(fix);
        }
        shared_state.epoch = self.current_epoch();
    }
}
