//! Portal stone merging.
//!
//! Merging is a pure function over two stones. Locating the inputs in an
//! inventory, removing them and storing the result is the caller's job.
//!
//! # Rules
//!
//! - Stones of different zones never merge.
//! - Equal levels produce `level + 1`, keeping the shorter duration and the
//!   longer drop interval.
//! - A level-0 stone can top up a higher stone by one second, provided it
//!   lasts at least as long as the stone it feeds.
//! - Any other level combination is rejected.

use std::time::Duration;

use sworld_types::PortalStone;

use crate::error::MergeError;

/// Duration gained when a level-0 stone tops up a higher one.
pub const TOP_UP_DURATION: Duration = Duration::from_secs(1);

/// Merge two stones into a new one. Inputs are never modified.
pub fn merge(a: &PortalStone, b: &PortalStone) -> Result<PortalStone, MergeError> {
    if a.zone != b.zone {
        return Err(MergeError::IncompatibleZones);
    }

    let drop_interval = a.drop_interval.max(b.drop_interval);

    if a.level == b.level {
        let level = a
            .level
            .checked_add(1)
            .ok_or(MergeError::IncompatibleStones)?;
        return Ok(PortalStone {
            level,
            zone: a.zone,
            duration: a.duration.min(b.duration),
            drop_interval,
        });
    }

    let (low, high) = if a.level < b.level { (a, b) } else { (b, a) };

    // Levels differ, so `high` is above zero here.
    if low.level != 0 {
        return Err(MergeError::IncompatibleStones);
    }
    if low.duration < high.duration {
        return Err(MergeError::IncompatibleStones);
    }

    let duration = high
        .duration
        .checked_add(TOP_UP_DURATION)
        .ok_or(MergeError::IncompatibleStones)?;

    Ok(PortalStone {
        level: high.level,
        zone: high.zone,
        duration,
        drop_interval,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use sworld_types::ZoneId;

    fn stone(zone: ZoneId, level: u32, secs: u64) -> PortalStone {
        PortalStone {
            level,
            zone,
            duration: Duration::from_secs(secs),
            drop_interval: Duration::from_secs(1),
        }
    }

    #[test]
    fn same_level_goes_up_one_with_shorter_duration() {
        let zone = ZoneId::new();
        let a = stone(zone, 1, 11);
        let b = stone(zone, 1, 12);

        for (left, right) in [(&a, &b), (&b, &a)] {
            let merged = merge(left, right).unwrap();
            assert_eq!(merged.level, 2);
            assert_eq!(merged.duration, Duration::from_secs(11));
            assert_eq!(merged.zone, zone);
        }
    }

    #[test]
    fn same_level_holds_for_many_durations() {
        let zone = ZoneId::new();
        for level in 0..4 {
            for (x, y) in [(1, 1), (5, 30), (60, 2), (600, 599)] {
                let merged = merge(&stone(zone, level, x), &stone(zone, level, y)).unwrap();
                assert_eq!(merged.level, level + 1);
                assert_eq!(merged.duration, Duration::from_secs(x.min(y)));
            }
        }
    }

    #[test]
    fn same_level_keeps_longer_drop_interval() {
        let zone = ZoneId::new();
        let mut a = stone(zone, 2, 10);
        let mut b = stone(zone, 2, 10);
        a.drop_interval = Duration::from_millis(700);
        b.drop_interval = Duration::from_millis(1500);
        assert_eq!(
            merge(&a, &b).unwrap().drop_interval,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn different_zones_never_merge() {
        for (la, lb) in [(1, 1), (0, 3), (2, 5), (0, 0)] {
            let result = merge(&stone(ZoneId::new(), la, 10), &stone(ZoneId::new(), lb, 10));
            assert_eq!(result, Err(MergeError::IncompatibleZones));
        }
    }

    #[test]
    fn level_zero_top_up_needs_longer_duration() {
        let zone = ZoneId::new();
        let short_zero = stone(zone, 0, 10);
        let three = stone(zone, 3, 15);
        let long_zero = stone(zone, 0, 20);

        assert_eq!(
            merge(&three, &short_zero),
            Err(MergeError::IncompatibleStones)
        );
        assert_eq!(
            merge(&short_zero, &three),
            Err(MergeError::IncompatibleStones)
        );

        let merged = merge(&three, &long_zero).unwrap();
        assert_eq!(merged.level, 3);
        assert_eq!(merged.duration, Duration::from_secs(16));
    }

    #[test]
    fn nonzero_unequal_levels_are_rejected() {
        let zone = ZoneId::new();
        assert_eq!(
            merge(&stone(zone, 2, 10), &stone(zone, 3, 15)),
            Err(MergeError::IncompatibleStones)
        );
    }

    #[test]
    fn inputs_are_untouched() {
        let zone = ZoneId::new();
        let a = stone(zone, 1, 11);
        let b = stone(zone, 1, 12);
        let (a_before, b_before) = (a.clone(), b.clone());
        merge(&a, &b).unwrap();
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn two_level_zero_stones_make_level_one() {
        let zone = ZoneId::new();
        let merged = merge(&stone(zone, 0, 12), &stone(zone, 0, 30)).unwrap();
        assert_eq!(merged.level, 1);
        assert_eq!(merged.duration, Duration::from_secs(12));
    }
}
