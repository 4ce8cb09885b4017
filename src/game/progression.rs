//! Experience and leveling.
//!
//! Experience is a monotonic running total. Advancing from level `L` to
//! `L + 1` needs the total to reach `25 * L * (L + 1)`; the threshold is
//! compared against, never subtracted. Offline time accrues experience at a
//! configured rate per second, and one hour of accrual counts as "100%" of
//! the offline potential for display.

use chrono::{DateTime, Utc};
use log::debug;

use crate::game::errors::GameError;
use crate::game::types::{PlayerRecord, JOB_UNLOCK_LEVEL};

/// Hard ceiling on levels so `u32` arithmetic can never overflow.
pub const MAX_LEVEL: u32 = 10_000;

/// Seconds of offline accrual that count as 100% of the offline potential.
pub const OFFLINE_POTENTIAL_SECONDS: f64 = 3600.0;

/// Total experience needed to advance past `level`.
pub fn level_threshold(level: u32) -> f64 {
    let l = level as f64;
    25.0 * l * (l + 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUpReport {
    pub previous_level: u32,
    pub new_level: u32,
    /// True only on the grant that first carries the player to the job level.
    pub job_unlocked: bool,
}

impl LevelUpReport {
    pub fn levels_gained(&self) -> u32 {
        self.new_level - self.previous_level
    }
}

/// Add `amount` experience and resolve every level-up it pays for.
///
/// The loop is bounded: experience is finite, `level_threshold` is strictly
/// increasing, and `MAX_LEVEL` caps the level outright.
pub fn grant_experience(player: &mut PlayerRecord, amount: f64) -> Result<LevelUpReport, GameError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(GameError::InvalidArgument(format!(
            "experience grant must be a finite, non-negative number (got {})",
            amount
        )));
    }

    let previous_level = player.level;
    player.experience += amount;
    while player.level < MAX_LEVEL && player.experience >= level_threshold(player.level) {
        player.level += 1;
    }

    let job_unlocked = previous_level < JOB_UNLOCK_LEVEL
        && player.level >= JOB_UNLOCK_LEVEL
        && !player.job_unlock_announced;
    if job_unlocked {
        player.job_unlock_announced = true;
    }
    if player.level != previous_level {
        debug!(
            "level up {} -> {} (exp {:.2})",
            previous_level, player.level, player.experience
        );
    }

    Ok(LevelUpReport {
        previous_level,
        new_level: player.level,
        job_unlocked,
    })
}

/// Experience earned between `last_online_ms` and `now_ms` (epoch millis).
/// Never negative: a clock that ran backwards earns nothing.
pub fn offline_experience(last_online_ms: i64, now_ms: i64, rate_per_second: f64) -> f64 {
    let elapsed_ms = now_ms.saturating_sub(last_online_ms).max(0);
    (elapsed_ms as f64 / 1000.0 * rate_per_second).max(0.0)
}

/// Share of the one-hour offline potential that `gained` represents, capped at 100.
pub fn offline_percentage(gained: f64, rate_per_second: f64) -> f64 {
    if rate_per_second <= 0.0 || !rate_per_second.is_finite() {
        return 0.0;
    }
    (gained / (rate_per_second * OFFLINE_POTENTIAL_SECONDS) * 100.0).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfflineReport {
    pub gained: f64,
    pub percentage: f64,
    pub level_up: LevelUpReport,
}

/// Credit the time since `player.last_online` and refresh the timestamp.
/// The timestamp moves to `now` even when nothing was gained.
pub fn apply_offline_experience(
    player: &mut PlayerRecord,
    now: DateTime<Utc>,
    rate_per_second: f64,
) -> Result<OfflineReport, GameError> {
    let gained = offline_experience(
        player.last_online.timestamp_millis(),
        now.timestamp_millis(),
        rate_per_second,
    );
    player.last_online = now;
    let level_up = grant_experience(player, gained)?;
    Ok(OfflineReport {
        gained,
        percentage: offline_percentage(gained, rate_per_second),
        level_up,
    })
}
