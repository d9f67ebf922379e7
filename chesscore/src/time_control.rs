//! Multi-period time controls and a per-move [`Tracker`].
//!
//! A [`TimeControl`] is an ordered list of [`Period`]s; a [`Tracker`] walks
//! through them as moves are made, the way a mechanical chess clock's flag
//! advances from one time scale to the next.

use crate::error::{ChessError, Result};

/// How a period's quota is consumed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PeriodKind {
    /// A fixed amount of time for the rest of the game, replenished each
    /// time it runs out (e.g. "game in 5 minutes, plus 3 seconds a move").
    Rollover,
    /// A fixed amount of time for the whole remainder of the game, with no
    /// move count attached.
    GameIn,
    /// A fixed number of moves to be made within a time budget, after which
    /// play proceeds to the next period.
    MovesIn,
}

/// One segment of a time control: `moves` is only meaningful for
/// `MovesIn`/`Rollover` (0 means "unlimited"/"not applicable").
#[derive(Clone, Copy, Debug)]
pub struct Period {
    pub kind: PeriodKind,
    pub moves: u32,
    pub time_seconds: u32,
    pub increment_seconds: u32,
}

/// An ordered list of periods a game is played under.
#[derive(Clone, Debug, Default)]
pub struct TimeControl {
    periods: Vec<Period>,
}

/// Which numeric convention a bare `moves/time` string uses — PGN-style
/// controls are always in seconds, "normal" (human-typed) controls are
/// usually in minutes, and the two are ambiguous without outside context.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimeFormat {
    Pgn,
    Normal,
}

impl TimeControl {
    pub fn new(periods: Vec<Period>) -> TimeControl {
        TimeControl { periods }
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Parses a PGN `TimeControl` tag value (`"40/9000:3600"`,
    /// `"G/5400+30"`, `"40/5400:3600+30"`, `"*180"`) or a "normal format"
    /// string using the same grammar but interpreted in minutes where a
    /// format hint is required to disambiguate `moves/time`.
    pub fn parse(spec: &str, hint: Option<TimeFormat>) -> Result<TimeControl> {
        let mut periods = Vec::new();
        for segment in spec.split(':') {
            periods.push(parse_period(segment, hint)?);
        }
        Ok(TimeControl { periods })
    }

    /// Formats back to the PGN convention (always seconds), the inverse of
    /// `parse(_, Some(TimeFormat::Pgn))`.
    pub fn format(&self) -> String {
        self.periods
            .iter()
            .map(format_period)
            .collect::<Vec<_>>()
            .join(":")
    }
}

fn parse_period(segment: &str, hint: Option<TimeFormat>) -> Result<Period> {
    if let Some(rest) = segment.strip_prefix('*') {
        let seconds = rest
            .parse::<u32>()
            .map_err(|_| ChessError::parse("bad rollover period"))?;
        return Ok(Period {
            kind: PeriodKind::Rollover,
            moves: 0,
            time_seconds: scale(seconds, hint),
            increment_seconds: 0,
        });
    }

    let (base, increment) = match segment.split_once('+') {
        Some((b, i)) => (
            b,
            i.parse::<u32>()
                .map_err(|_| ChessError::parse("bad increment"))?,
        ),
        None => (segment, 0),
    };

    if let Some(rest) = base.strip_prefix("G/") {
        let seconds = rest
            .parse::<u32>()
            .map_err(|_| ChessError::parse("bad game-in period"))?;
        return Ok(Period {
            kind: PeriodKind::GameIn,
            moves: 0,
            time_seconds: scale(seconds, hint),
            increment_seconds: increment,
        });
    }

    match base.split_once('/') {
        Some((moves_str, time_str)) => {
            if hint.is_none() {
                return Err(ChessError::invalid(
                    "ambiguous moves/time period needs a format hint",
                ));
            }
            let moves = moves_str
                .parse::<u32>()
                .map_err(|_| ChessError::parse("bad move count"))?;
            let seconds = time_str
                .parse::<u32>()
                .map_err(|_| ChessError::parse("bad period time"))?;
            Ok(Period {
                kind: PeriodKind::MovesIn,
                moves,
                time_seconds: scale(seconds, hint),
                increment_seconds: increment,
            })
        }
        None => {
            let seconds = base
                .parse::<u32>()
                .map_err(|_| ChessError::parse("bad game-in period"))?;
            Ok(Period {
                kind: PeriodKind::GameIn,
                moves: 0,
                time_seconds: scale(seconds, hint),
                increment_seconds: increment,
            })
        }
    }
}

fn scale(value: u32, hint: Option<TimeFormat>) -> u32 {
    match hint {
        Some(TimeFormat::Normal) => value * 60,
        _ => value,
    }
}

fn format_period(p: &Period) -> String {
    let body = match p.kind {
        PeriodKind::Rollover => format!("*{}", p.time_seconds),
        PeriodKind::GameIn => format!("G/{}", p.time_seconds),
        PeriodKind::MovesIn => format!("{}/{}", p.moves, p.time_seconds),
    };
    if p.increment_seconds > 0 {
        format!("{body}+{}", p.increment_seconds)
    } else {
        body
    }
}

/// Tracks a single side's clock through a [`TimeControl`] as moves are
/// made. Does not itself measure wall-clock time — callers supply elapsed
/// milliseconds via `update`.
pub struct Tracker {
    control: TimeControl,
    period_index: usize,
    time_left_ms: u64,
    moves_made_in_period: u32,
    out_of_time: bool,
    elapsed_since_update_ms: u64,
}

impl Tracker {
    pub fn new(control: TimeControl) -> Tracker {
        let time_left_ms = control
            .periods
            .first()
            .map(|p| p.time_seconds as u64 * 1000)
            .unwrap_or(0);
        Tracker {
            control,
            period_index: 0,
            time_left_ms,
            moves_made_in_period: 0,
            out_of_time: false,
            elapsed_since_update_ms: 0,
        }
    }

    fn current_period(&self) -> Option<Period> {
        self.control.periods().get(self.period_index).copied()
    }

    /// Records that `time_taken_ms` elapsed for the move just made:
    /// decrements `time_left`, adds the current period's increment, and —
    /// if this period's move quota is now exhausted — advances to the next
    /// period. A rollover period never advances; it adds its own quota back
    /// every move, regardless of a move count.
    pub fn update(&mut self, time_taken_ms: u64) {
        self.elapsed_since_update_ms = 0;
        let Some(period) = self.current_period() else {
            // No time control at all: nothing to track.
            return;
        };

        if time_taken_ms >= self.time_left_ms {
            self.time_left_ms = 0;
            self.out_of_time = true;
            return;
        }
        self.time_left_ms -= time_taken_ms;
        self.time_left_ms += period.increment_seconds as u64 * 1000;

        if period.kind == PeriodKind::Rollover {
            self.time_left_ms += period.time_seconds as u64 * 1000;
            return;
        }

        self.moves_made_in_period += 1;
        let exhausted = period.kind == PeriodKind::MovesIn
            && period.moves > 0
            && self.moves_made_in_period >= period.moves;
        if exhausted && self.period_index + 1 < self.control.periods().len() {
            self.moves_made_in_period = 0;
            self.period_index += 1;
            let next = self.control.periods()[self.period_index];
            self.time_left_ms += next.time_seconds as u64 * 1000;
        }
    }

    /// True once a move has taken at least as long as the time that was
    /// left — the clock has flagged.
    pub fn out_of_time(&self) -> bool {
        self.out_of_time
    }

    /// Time remaining as of the last `update`, net of any further elapsed
    /// time the caller reports via `tick`.
    pub fn running_time_left(&self) -> u64 {
        self.time_left_ms.saturating_sub(self.elapsed_since_update_ms)
    }

    /// Advances the "time since last update" clock a GUI would poll
    /// between moves to keep a live countdown; does not itself decrement
    /// `time_left` (that only happens on `update`).
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.elapsed_since_update_ms = elapsed_ms;
    }

    pub fn is_time_forfeit(&self) -> bool {
        self.out_of_time
    }

    /// How many periods (including the current one) remain to be played.
    pub fn periods_remaining(&self) -> usize {
        self.control.periods().len().saturating_sub(self.period_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pgn_format_moves_in_period() {
        let tc = TimeControl::parse("40/9000:3600", Some(TimeFormat::Pgn)).unwrap();
        assert_eq!(tc.periods().len(), 2);
        assert_eq!(tc.periods()[0].kind, PeriodKind::MovesIn);
        assert_eq!(tc.periods()[0].moves, 40);
        assert_eq!(tc.periods()[0].time_seconds, 9000);
        assert_eq!(tc.periods()[1].kind, PeriodKind::GameIn);
    }

    #[test]
    fn ambiguous_moves_time_requires_hint() {
        assert!(TimeControl::parse("40/90", None).is_err());
        assert!(TimeControl::parse("40/90", Some(TimeFormat::Normal)).is_ok());
    }

    #[test]
    fn normal_format_is_minutes() {
        let tc = TimeControl::parse("G/5", Some(TimeFormat::Normal)).unwrap();
        assert_eq!(tc.periods()[0].time_seconds, 300);
    }

    #[test]
    fn format_round_trips_pgn() {
        let tc = TimeControl::parse("40/9000:3600+30", Some(TimeFormat::Pgn)).unwrap();
        assert_eq!(tc.format(), "40/9000:3600+30");
    }

    #[test]
    fn tracker_advances_past_exhausted_period() {
        let tc = TimeControl::parse("1/60:G/30", Some(TimeFormat::Pgn)).unwrap();
        let mut t = Tracker::new(tc);
        assert_eq!(t.running_time_left(), 60_000);
        t.update(10_000);
        assert_eq!(t.periods_remaining(), 1);
        assert_eq!(t.running_time_left(), 30_000 + 50_000);
    }

    #[test]
    fn rollover_period_replenishes_its_own_quota() {
        let tc = TimeControl::parse("*30", Some(TimeFormat::Pgn)).unwrap();
        let mut t = Tracker::new(tc);
        t.update(10_000);
        assert_eq!(t.running_time_left(), 30_000 - 10_000 + 30_000);
    }

    #[test]
    fn flags_out_of_time_when_move_exceeds_budget() {
        let tc = TimeControl::parse("G/10", Some(TimeFormat::Pgn)).unwrap();
        let mut t = Tracker::new(tc);
        t.update(20_000);
        assert!(t.out_of_time());
        assert!(t.is_time_forfeit());
        assert_eq!(t.running_time_left(), 0);
    }
}
