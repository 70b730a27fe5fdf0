//! Calendar domain logic for the salon agenda.
//!
//! The [`DateCursor`] holds "today", the month shown in the header and the
//! selected day. Screens own one cursor each; it is plain UI state and never
//! persisted.

use chrono::Weekday;
use shared::{CalendarDay, DisplayedMonth};

const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Indexed by days from Sunday
const WEEKDAY_LABELS: [&str; 7] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

/// Get the pt-BR name for a month number
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[(month - 1) as usize],
        _ => "Mês inválido",
    }
}

/// Header label, e.g. "Março 2024"
pub fn month_label(month: DisplayedMonth) -> String {
    format!("{} {}", month_name(month.month), month.year)
}

/// Capitalised short weekday name, e.g. "Seg"
pub fn weekday_label(weekday: Weekday) -> &'static str {
    WEEKDAY_LABELS[weekday.num_days_from_sunday() as usize]
}

/// "Today", the displayed month and the selected day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCursor {
    today: CalendarDay,
    displayed_month: DisplayedMonth,
    selected_day: CalendarDay,
}

impl DateCursor {
    /// Cursor on `today`'s month with `today` selected
    pub fn new(today: CalendarDay) -> Self {
        Self {
            today,
            displayed_month: DisplayedMonth::containing(today),
            selected_day: today,
        }
    }

    pub fn starting_now() -> Self {
        Self::new(CalendarDay::today())
    }

    pub fn today(&self) -> CalendarDay {
        self.today
    }

    pub fn displayed_month(&self) -> DisplayedMonth {
        self.displayed_month
    }

    pub fn selected_day(&self) -> CalendarDay {
        self.selected_day
    }

    /// Apply a tap on `day` and return the new selection
    ///
    /// Tapping the selected day again goes back to today.
    pub fn select(&mut self, day: CalendarDay) -> CalendarDay {
        self.selected_day = if day == self.selected_day {
            self.today
        } else {
            day
        };
        self.selected_day
    }

    pub fn previous_month(&mut self) -> DisplayedMonth {
        self.displayed_month = self.displayed_month.previous();
        self.displayed_month
    }

    pub fn next_month(&mut self) -> DisplayedMonth {
        self.displayed_month = self.displayed_month.next();
        self.displayed_month
    }

    /// Show today's month and select today
    pub fn go_to_today(&mut self) {
        self.displayed_month = DisplayedMonth::containing(self.today);
        self.selected_day = self.today;
    }

    /// Day whose week the week strip shows: today's day-of-month inside the
    /// displayed month, clamped to the month's length
    pub fn week_anchor(&self) -> CalendarDay {
        self.displayed_month
            .clamped_day(self.today.day())
            .unwrap_or(self.today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> CalendarDay {
        CalendarDay::from_ymd(year, month, day).unwrap()
    }

    #[test]
    fn test_toggle_rule() {
        let today = day(2024, 3, 15);
        let mut cursor = DateCursor::new(today);

        assert_eq!(cursor.select(today), today);
        assert_eq!(cursor.select(day(2024, 3, 20)), day(2024, 3, 20));
        assert_eq!(cursor.select(day(2024, 3, 20)), today);
        assert_eq!(cursor.selected_day(), today);
    }

    #[test]
    fn test_month_navigation_wraps_years() {
        let mut cursor = DateCursor::new(day(2024, 12, 31));
        assert_eq!(cursor.next_month(), DisplayedMonth { year: 2025, month: 1 });
        assert_eq!(cursor.previous_month(), DisplayedMonth { year: 2024, month: 12 });
        assert_eq!(cursor.previous_month(), DisplayedMonth { year: 2024, month: 11 });

        // Selection is untouched by month stepping
        assert_eq!(cursor.selected_day(), day(2024, 12, 31));
    }

    #[test]
    fn test_go_to_today_resets_month_and_selection() {
        let today = day(2024, 3, 15);
        let mut cursor = DateCursor::new(today);
        cursor.next_month();
        cursor.select(day(2024, 4, 2));

        cursor.go_to_today();
        assert_eq!(cursor.displayed_month(), DisplayedMonth { year: 2024, month: 3 });
        assert_eq!(cursor.selected_day(), today);
    }

    #[test]
    fn test_week_anchor_clamps_into_short_months() {
        let mut cursor = DateCursor::new(day(2025, 1, 31));
        assert_eq!(cursor.week_anchor(), day(2025, 1, 31));

        cursor.next_month();
        assert_eq!(cursor.week_anchor(), day(2025, 2, 28));
    }

    #[test]
    fn test_labels() {
        assert_eq!(month_name(3), "Março");
        assert_eq!(month_name(13), "Mês inválido");
        assert_eq!(month_label(DisplayedMonth { year: 2024, month: 12 }), "Dezembro 2024");
        assert_eq!(weekday_label(Weekday::Sun), "Dom");
        assert_eq!(weekday_label(Weekday::Sat), "Sáb");
    }
}
