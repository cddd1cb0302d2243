//! Night-block composer
//!
//! Splices a recurring redirect to another channel into a daytime lineup so
//! that the channel hands over between `start_hour` and `end_hour` every day.
//! Each cycle is `[programs..., pad?, redirect]` where programs and pad fill
//! exactly one day block.

use crate::error::{Error, Result};
use crate::item::TimedItem;
use crate::time::{check_hour, hours_between, local_to_utc, Clock, MS_PER_DAY, MS_PER_HOUR};
use crate::timebox::take_first_fitting_ms;
use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::debug;

/// A validated night block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightBlock {
    channel: u32,
    start_hour: u32,
    end_hour: u32,
}

/// Lineup produced by the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightComposition {
    pub items: Vec<TimedItem>,
    /// New channel start time, when the variant resets it
    pub start_time: Option<DateTime<Utc>>,
}

impl NightComposition {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of redirects, one per day/night cycle
    pub fn cycles(&self) -> usize {
        self.items.iter().filter(|item| item.is_redirect()).count()
    }
}

impl NightBlock {
    /// Validates the hour range
    ///
    /// Hours outside `[0, 23]` are rejected, never clamped. Equal hours would
    /// describe a full-day block and are rejected too.
    pub fn new(channel: u32, start_hour: u32, end_hour: u32) -> Result<Self> {
        check_hour("start_hour", start_hour)?;
        check_hour("end_hour", end_hour)?;
        if start_hour == end_hour {
            return Err(Error::FullDayNightBlock { hour: start_hour });
        }
        Ok(Self {
            channel,
            start_hour,
            end_hour,
        })
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// Checks that the redirect target is among the known channels
    pub fn validate_target(&self, known_channels: &[u32]) -> Result<()> {
        if known_channels.contains(&self.channel) {
            Ok(())
        } else {
            Err(Error::UnknownChannel(self.channel))
        }
    }

    /// Length of the night block, wrapping past midnight
    pub fn night_ms(&self) -> u64 {
        u64::from(hours_between(self.start_hour, self.end_hour)) * MS_PER_HOUR
    }

    /// Length of the day block
    pub fn day_ms(&self) -> u64 {
        MS_PER_DAY - self.night_ms()
    }

    fn redirect(&self) -> TimedItem {
        TimedItem::redirect(self.channel, self.night_ms())
    }

    /// Fills one segment of `budget_ms` and closes it with the redirect
    ///
    /// Returns the programs left over.
    fn push_segment(
        &self,
        lineup: &mut Vec<TimedItem>,
        programs: Vec<TimedItem>,
        budget_ms: u64,
    ) -> Vec<TimedItem> {
        let segment = take_first_fitting_ms(programs, budget_ms);
        let shortfall = segment.shortfall_ms(budget_ms);
        lineup.extend(segment.items);
        if shortfall > 0 {
            lineup.push(TimedItem::offline(shortfall));
        }
        lineup.push(self.redirect());
        segment.remainder
    }

    /// Repeats full day segments until every program is placed
    fn push_day_cycles(&self, lineup: &mut Vec<TimedItem>, mut programs: Vec<TimedItem>) -> Result<()> {
        let day_ms = self.day_ms();
        while let Some(first) = programs.first() {
            if first.duration_ms() > day_ms {
                return Err(Error::ProgramExceedsBlock {
                    duration_ms: first.duration_ms(),
                    block_ms: day_ms,
                });
            }
            programs = self.push_segment(lineup, programs, day_ms);
        }
        Ok(())
    }

    /// Simple variant: restarts the channel at the end of a night block
    ///
    /// The new start time is `end_hour:00` local time today, or yesterday when
    /// that hour has not been reached yet, so the first day segment begins
    /// exactly when a night block ends.
    pub fn compose<C: Clock + ?Sized>(&self, items: Vec<TimedItem>, clock: &C) -> Result<NightComposition> {
        let offset = clock.local_offset();
        let now_local = clock.now_local();
        let mut start_time = local_to_utc(now_local.date_naive(), self.end_hour, offset);
        if self.end_hour > now_local.hour() {
            start_time -= Duration::days(1);
        }

        let mut lineup = Vec::new();
        self.push_day_cycles(&mut lineup, items)?;

        let composition = NightComposition {
            items: lineup,
            start_time: Some(start_time),
        };
        debug!(
            channel = self.channel,
            start_hour = self.start_hour,
            end_hour = self.end_hour,
            cycles = composition.cycles(),
            %start_time,
            "Composed night blocks"
        );
        Ok(composition)
    }

    /// Alternative variant: keeps the existing channel start time
    ///
    /// A first, partial day segment runs from `channel_start` to the next
    /// `start_hour:00` local time; full day/night cycles follow.
    pub fn compose_from<C: Clock + ?Sized>(
        &self,
        items: Vec<TimedItem>,
        channel_start: DateTime<Utc>,
        clock: &C,
    ) -> Result<NightComposition> {
        let until_night = self.until_night_start(channel_start, clock);

        let mut lineup = Vec::new();
        if !items.is_empty() {
            let remainder = self.push_segment(&mut lineup, items, until_night);
            self.push_day_cycles(&mut lineup, remainder)?;
        }

        let composition = NightComposition {
            items: lineup,
            start_time: None,
        };
        debug!(
            channel = self.channel,
            until_night_ms = until_night,
            cycles = composition.cycles(),
            "Composed night blocks from existing start"
        );
        Ok(composition)
    }

    /// Milliseconds from `channel_start` to the next local `start_hour:00`
    pub fn until_night_start<C: Clock + ?Sized>(&self, channel_start: DateTime<Utc>, clock: &C) -> u64 {
        let offset = clock.local_offset();
        let local_start = channel_start.with_timezone(&offset);
        let mut night_start = local_to_utc(local_start.date_naive(), self.start_hour, offset);
        if night_start < channel_start {
            night_start += Duration::days(1);
        }
        u64::try_from((night_start - channel_start).num_milliseconds()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::total_duration_ms;
    use crate::time::{FixedClock, MS_PER_HOUR};
    use chrono::{FixedOffset, TimeZone};

    fn at(d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, mi, 0).unwrap()
    }

    fn hours(n: u64) -> u64 {
        n * MS_PER_HOUR
    }

    #[test]
    fn test_rejects_invalid_hours() {
        assert!(matches!(
            NightBlock::new(2, 24, 6),
            Err(Error::InvalidHour { name: "start_hour", value: 24 })
        ));
        assert!(matches!(
            NightBlock::new(2, 1, 30),
            Err(Error::InvalidHour { name: "end_hour", value: 30 })
        ));
        let err = NightBlock::new(2, 5, 5).unwrap_err();
        assert!(matches!(err, Error::FullDayNightBlock { hour: 5 }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validate_target() {
        let block = NightBlock::new(7, 1, 6).unwrap();
        assert!(block.validate_target(&[1, 7]).is_ok());
        assert!(matches!(
            block.validate_target(&[1, 2]),
            Err(Error::UnknownChannel(7))
        ));
    }

    #[test]
    fn test_block_lengths_sum_to_a_day() {
        for start in 0..24 {
            for end in 0..24 {
                if start == end {
                    continue;
                }
                let block = NightBlock::new(1, start, end).unwrap();
                assert_eq!(block.night_ms() + block.day_ms(), 86_400_000);
            }
        }
    }

    #[test]
    fn test_compose_one_redirect_per_cycle() {
        let block = NightBlock::new(9, 1, 6).unwrap();
        let clock = FixedClock::utc(at(10, 12, 0));
        // 19h day block: 40 one-hour programs need three cycles
        let items: Vec<TimedItem> = (0..40).map(|i| TimedItem::movie(format!("M{}", i), hours(1))).collect();

        let composed = block.compose(items, &clock).unwrap();
        assert_eq!(composed.cycles(), 3);
        assert_eq!(composed.items.last(), Some(&TimedItem::redirect(9, hours(5))));
        assert_eq!(total_duration_ms(&composed.items), 3 * MS_PER_DAY);
        assert!(composed
            .items
            .iter()
            .filter(|i| i.is_redirect())
            .all(|i| i.duration_ms() == block.night_ms()));
        // end_hour 6 already passed at 12:00
        assert_eq!(composed.start_time, Some(at(10, 6, 0)));
    }

    #[test]
    fn test_compose_start_time_yesterday_and_offset() {
        let block = NightBlock::new(2, 22, 8).unwrap();
        let clock = FixedClock::with_offset(at(10, 4, 0), FixedOffset::east_opt(2 * 3600).unwrap());
        // local 06:00, 08:00 not reached yet: yesterday 08:00 local = 06:00 UTC
        let composed = block.compose(vec![TimedItem::movie("A", hours(2))], &clock).unwrap();
        assert_eq!(composed.start_time, Some(at(9, 6, 0)));
        assert_eq!(
            composed.items,
            vec![
                TimedItem::movie("A", hours(2)),
                TimedItem::offline(hours(12)),
                TimedItem::redirect(2, hours(10)),
            ]
        );
    }

    #[test]
    fn test_compose_empty_lineup() {
        let block = NightBlock::new(2, 1, 6).unwrap();
        let composed = block.compose(Vec::new(), &FixedClock::utc(at(10, 12, 0))).unwrap();
        assert!(composed.is_empty());
    }

    #[test]
    fn test_compose_oversized_program() {
        let block = NightBlock::new(2, 0, 12).unwrap();
        let items = vec![TimedItem::movie("Marathon", hours(13))];
        assert!(matches!(
            block.compose(items, &FixedClock::utc(at(10, 12, 0))),
            Err(Error::ProgramExceedsBlock { .. })
        ));
    }

    #[test]
    fn test_compose_from_front_loads_partial_segment() {
        let block = NightBlock::new(3, 20, 8).unwrap();
        let clock = FixedClock::utc(at(10, 12, 0));
        let items: Vec<TimedItem> = (0..8).map(|i| TimedItem::movie(format!("M{}", i), hours(2))).collect();

        // 15:00 → 20:00 leaves five hours for the first segment
        let composed = block.compose_from(items, at(10, 15, 0), &clock).unwrap();
        assert_eq!(composed.start_time, None);
        assert_eq!(composed.items[0], TimedItem::movie("M0", hours(2)));
        assert_eq!(composed.items[1], TimedItem::movie("M1", hours(2)));
        assert_eq!(composed.items[2], TimedItem::offline(hours(1)));
        assert_eq!(composed.items[3], TimedItem::redirect(3, hours(12)));
        assert_eq!(composed.cycles(), 2);
        assert_eq!(total_duration_ms(&composed.items), hours(5) + hours(12) + MS_PER_DAY);
    }

    #[test]
    fn test_compose_from_everything_fits_first_segment() {
        let block = NightBlock::new(3, 20, 8).unwrap();
        let clock = FixedClock::utc(at(10, 12, 0));
        let composed = block
            .compose_from(vec![TimedItem::movie("A", hours(1))], at(10, 15, 0), &clock)
            .unwrap();
        assert_eq!(composed.cycles(), 1);
        assert_eq!(composed.items.len(), 3);
    }

    #[test]
    fn test_until_night_start_wraps_to_next_day() {
        let block = NightBlock::new(3, 2, 6).unwrap();
        let clock = FixedClock::utc(at(10, 12, 0));
        assert_eq!(block.until_night_start(at(10, 15, 0), &clock), hours(11));
        assert_eq!(block.until_night_start(at(10, 2, 0), &clock), 0);
    }
}
