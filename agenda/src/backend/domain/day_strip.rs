//! Day strip generation.
//!
//! The strip is the horizontal row of day chips under the month header. It
//! covers the whole displayed month (agenda, booking) or one week (booking).
//! Whenever it is shown or the selection changes, it asks the view to scroll
//! the selected chip towards the centre of the viewport.

use chrono::Weekday;
use shared::{CalendarDay, DayStripItem, DisplayedMonth};

use super::calendar::{weekday_label, DateCursor};

/// Lazy sequence of every day of a month; clone it to restart
#[derive(Debug, Clone)]
pub struct MonthDays {
    month: DisplayedMonth,
    next_day: u32,
    last_day: u32,
}

impl Iterator for MonthDays {
    type Item = CalendarDay;

    fn next(&mut self) -> Option<CalendarDay> {
        if self.next_day > self.last_day {
            return None;
        }
        let day = self.month.day(self.next_day);
        self.next_day += 1;
        day
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.last_day + 1).saturating_sub(self.next_day) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MonthDays {}

pub fn month_days(month: DisplayedMonth) -> MonthDays {
    MonthDays {
        month,
        next_day: 1,
        last_day: month.days_in_month(),
    }
}

/// Seven days starting the day after the start of `anchor`'s week
///
/// With a Sunday-first week this strip runs Monday to Sunday.
pub fn week_days(
    anchor: CalendarDay,
    first_weekday: Weekday,
) -> impl Iterator<Item = CalendarDay> + Clone {
    let since_week_start = (anchor.weekday().num_days_from_sunday() + 7
        - first_weekday.num_days_from_sunday())
        % 7;
    let start = anchor.add_days(1 - i64::from(since_week_start));
    (0..7).map(move |offset| start.add_days(offset))
}

/// Chip size and viewport width used for the scroll arithmetic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollGeometry {
    pub item_width: f64,
    pub item_margin: f64,
    pub viewport_width: f64,
}

impl ScrollGeometry {
    pub const AGENDA_ITEM_WIDTH: f64 = 60.0;
    pub const AGENDA_ITEM_MARGIN: f64 = 10.0;

    pub fn new(item_width: f64, viewport_width: f64) -> Self {
        Self {
            item_width,
            item_margin: 0.0,
            viewport_width,
        }
    }

    pub fn with_margin(mut self, item_margin: f64) -> Self {
        self.item_margin = item_margin;
        self
    }

    /// Chips of the agenda screen: 60 wide with a 10 margin
    pub fn agenda(viewport_width: f64) -> Self {
        Self::new(Self::AGENDA_ITEM_WIDTH, viewport_width).with_margin(Self::AGENDA_ITEM_MARGIN)
    }

    pub fn stride(&self) -> f64 {
        self.item_width + self.item_margin
    }

    /// Horizontal offset that centres chip `index`; never negative
    pub fn offset_for_index(&self, index: usize) -> f64 {
        let centred = index as f64 * self.stride() - (self.viewport_width / 2.0 - self.item_width / 2.0);
        centred.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripKind {
    Month,
    Week { first_weekday: Weekday },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub index: usize,
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayStrip {
    pub items: Vec<DayStripItem>,
    /// Where to scroll; `None` when neither the selected day nor today is on
    /// the strip
    pub scroll: Option<ScrollRequest>,
}

impl DayStrip {
    pub fn selected_index(&self) -> Option<usize> {
        self.items.iter().position(|item| item.is_selected)
    }
}

/// Signal emitted when a chip is tapped
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChanged {
    pub selected: CalendarDay,
    pub strip: DayStrip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayStripRenderer {
    kind: StripKind,
    geometry: ScrollGeometry,
}

impl DayStripRenderer {
    pub fn month(geometry: ScrollGeometry) -> Self {
        Self {
            kind: StripKind::Month,
            geometry,
        }
    }

    pub fn week(first_weekday: Weekday, geometry: ScrollGeometry) -> Self {
        Self {
            kind: StripKind::Week { first_weekday },
            geometry,
        }
    }

    pub fn kind(&self) -> StripKind {
        self.kind
    }

    /// Days on the strip for the cursor's current state
    pub fn days(&self, cursor: &DateCursor) -> Vec<CalendarDay> {
        match self.kind {
            StripKind::Month => month_days(cursor.displayed_month()).collect(),
            StripKind::Week { first_weekday } => {
                week_days(cursor.week_anchor(), first_weekday).collect()
            }
        }
    }

    pub fn render(&self, cursor: &DateCursor) -> DayStrip {
        let items: Vec<DayStripItem> = self
            .days(cursor)
            .into_iter()
            .map(|day| DayStripItem {
                day,
                weekday_label: weekday_label(day.weekday()).to_string(),
                day_number: day.day(),
                is_selected: day == cursor.selected_day(),
                is_today: day == cursor.today(),
            })
            .collect();

        let target = items
            .iter()
            .position(|item| item.is_selected)
            .or_else(|| items.iter().position(|item| item.is_today));
        let scroll = target.map(|index| ScrollRequest {
            index,
            offset: self.geometry.offset_for_index(index),
        });

        DayStrip { items, scroll }
    }

    /// Apply a tap (toggle rule) and re-render
    pub fn select(&self, cursor: &mut DateCursor, day: CalendarDay) -> SelectionChanged {
        let selected = cursor.select(day);
        SelectionChanged {
            selected,
            strip: self.render(cursor),
        }
    }
}
