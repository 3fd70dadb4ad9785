//! Process-wide automation state shared between the scheduler, the execution
//! engine and operator commands.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::info;

/// Shared pause flag plus the daily-report anchor date.
///
/// Automation starts paused: an operator must explicitly resume before the
/// scheduler will execute anything. The flag is also set by the deposit
/// alert path and by the execution engine's circuit breaker.
pub struct AutomationState {
    paused: AtomicBool,
    last_daily_report: Mutex<Option<NaiveDate>>,
}

impl AutomationState {
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(true),
            last_daily_report: Mutex::new(None),
        }
    }

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        let was = self.paused.swap(paused, Ordering::SeqCst);
        if was != paused {
            if paused {
                info!("Automated transaction execution paused");
            } else {
                info!("Automated transaction execution resumed");
            }
        }
    }

    /// Decide whether the once-daily summary is due and advance the anchor.
    ///
    /// Emission happens at most once per UTC day, at or after `anchor_hour`.
    /// On the first tick after startup the anchor only arms itself: if the
    /// process starts past today's anchor hour, today's report is skipped and
    /// the first emission happens tomorrow.
    pub fn note_daily_report(&self, now: DateTime<Utc>, anchor_hour: u32) -> bool {
        let today = now.date_naive();
        let past_anchor = now.hour() >= anchor_hour;

        let mut last = self
            .last_daily_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match *last {
            None => {
                if past_anchor {
                    *last = Some(today);
                }
                false
            }
            Some(last_date) => {
                if past_anchor && last_date != today {
                    *last = Some(today);
                    true
                } else {
                    false
                }
            }
        }
    }
}

impl Default for AutomationState {
    fn default() -> Self {
        Self::new()
    }
}
