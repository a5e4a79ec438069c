//! Splits an inclusive date range into consecutive request windows.
//!
//! The archive API is queried one window at a time so that a multi-year
//! backfill never asks for more than a few weeks of daily data at once.

use chrono::{Days, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Default number of days a window reaches past its first day.
pub const MAX_WINDOW_DAYS: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid date range: start {start} is after end {end}")]
pub struct InvalidRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// An inclusive range of calendar days handled as one fetch/extract/load unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRangeError> {
        if start > end {
            return Err(InvalidRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Window covering only the day before `today`.
    pub fn yesterday(today: NaiveDate) -> Self {
        Self::single_day(today.pred_opt().unwrap_or(today))
    }

    /// Number of calendar days in the window, both ends included.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl Display for DateWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Lazy, restartable sequence of windows covering `[start, end]`.
///
/// Each window ends `max_span_days` after its start, except the last one which
/// is cut off at `end`. Cloning the iterator restarts from the clone point.
#[derive(Debug, Clone)]
pub struct DateWindows {
    next_start: Option<NaiveDate>,
    end: NaiveDate,
    max_span_days: u32,
}

impl Iterator for DateWindows {
    type Item = DateWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;
        let window_end = if (self.end - start).num_days() < i64::from(self.max_span_days) {
            self.end
        } else {
            start
                .checked_add_days(Days::new(u64::from(self.max_span_days)))
                .unwrap_or(self.end)
        };

        self.next_start = if window_end >= self.end {
            None
        } else {
            window_end.succ_opt()
        };

        Some(DateWindow {
            start,
            end: window_end,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next_start {
            None => (0, Some(0)),
            Some(start) => {
                let days = (self.end - start).num_days() as usize + 1;
                let per_window = self.max_span_days as usize + 1;
                let n = days.div_ceil(per_window);
                (n, Some(n))
            }
        }
    }
}

impl ExactSizeIterator for DateWindows {}

/// Builds the window sequence for a backfill over `[start, end]`.
pub fn windows(
    start: NaiveDate,
    end: NaiveDate,
    max_span_days: u32,
) -> Result<DateWindows, InvalidRangeError> {
    if start > end {
        return Err(InvalidRangeError { start, end });
    }
    Ok(DateWindows {
        next_start: Some(start),
        end,
        max_span_days,
    })
}
