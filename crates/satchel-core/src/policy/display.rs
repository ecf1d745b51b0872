use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::{self, TimeBlock};
use crate::policy::normalize::{clamp_u8, number_field, number_value};
use crate::week::{parse_weekday, weekday_from_index, weekday_index};

/// The rendering window of the booking calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDisplay {
    start_hour: u8,
    end_hour: u8,
    #[serde(with = "crate::week::weekday_indexes")]
    visible_days: Vec<Weekday>,
}

impl CalendarDisplay {
    pub fn start_hour(&self) -> u8 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u8 {
        self.end_hour
    }

    pub fn visible_days(&self) -> &[Weekday] {
        &self.visible_days
    }

    pub fn is_visible(&self, day: Weekday) -> bool {
        self.visible_days.contains(&day)
    }

    /// The single display interval in minutes.
    pub fn window(&self) -> TimeBlock {
        block::day_window(self.start_hour, self.end_hour)
    }

    pub(crate) fn from_value(raw: Option<&Value>, defaults: &CalendarDisplay) -> CalendarDisplay {
        let Some(raw) = raw else {
            return defaults.clone();
        };
        let start_hour = clamp_u8(number_field(raw, "startHour"), defaults.start_hour, 0, 23);
        let mut end_hour = clamp_u8(number_field(raw, "endHour"), defaults.end_hour, 1, 24);
        if end_hour <= start_hour {
            end_hour = (start_hour + 1).max(defaults.end_hour);
        }
        let visible_days = raw
            .get("visibleDays")
            .and_then(Value::as_array)
            .map(|entries| {
                let mut days: Vec<Weekday> = entries
                    .iter()
                    .filter_map(|entry| match entry {
                        Value::String(s) => parse_weekday(s),
                        other => number_value(other)
                            .and_then(|n| weekday_from_index(n.round() as usize)),
                    })
                    .collect();
                days.sort_by_key(|d| weekday_index(*d));
                days.dedup();
                days
            })
            .filter(|days| !days.is_empty())
            .unwrap_or_else(|| defaults.visible_days.clone());
        CalendarDisplay {
            start_hour,
            end_hour,
            visible_days,
        }
    }
}

impl Default for CalendarDisplay {
    fn default() -> Self {
        CalendarDisplay {
            start_hour: 8,
            end_hour: 20,
            visible_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}
