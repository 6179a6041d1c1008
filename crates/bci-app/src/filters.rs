// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::format::{ValidationError, parse_optional_date};
use crate::{FilterCriteria, RecencyWindow, SelectionField};

pub const END_BEFORE_START_MESSAGE: &str = "End Date must be greater than Start Date.";

/// A single user edit to the filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    /// One option checkbox flipped.
    Toggle {
        field: SelectionField,
        value: String,
        selected: bool,
    },
    /// A multi-select panel committed its whole selection.
    ReplaceSelection {
        field: SelectionField,
        values: Vec<String>,
    },
    StartDate(String),
    EndDate(String),
    Developer(String),
    State(String),
    LastUpdated(RecencyWindow),
    HideViewed(bool),
}

impl FilterChange {
    /// Free text, dates and multi-select panels wait for an explicit apply so
    /// typing does not fire a request per keystroke.
    pub const fn applies_immediately(&self) -> bool {
        match self {
            Self::Toggle { .. } | Self::State(_) | Self::LastUpdated(_) | Self::HideViewed(_) => {
                true
            }
            Self::ReplaceSelection { .. }
            | Self::StartDate(_)
            | Self::EndDate(_)
            | Self::Developer(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
}

impl DateField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "Start Date",
            Self::End => "End Date",
        }
    }
}

/// Advisory message attached to one date input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    pub field: DateField,
    pub message: String,
}

impl FieldMessage {
    fn new(field: DateField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl FilterCriteria {
    /// Merges one change into the criteria. Date input that does not parse is
    /// reported without touching the stored value; everything else always
    /// lands. A date edit returns the full set of date messages to show, parse
    /// error first, so an out-of-order stored range is never hidden.
    pub fn apply_change(&mut self, change: &FilterChange) -> DateCheck {
        match change {
            FilterChange::Toggle {
                field,
                value,
                selected,
            } => {
                let set = self.selection_mut(*field);
                if *selected {
                    set.insert(value);
                } else {
                    set.remove(value);
                }
                DateCheck::Untouched
            }
            FilterChange::ReplaceSelection { field, values } => {
                self.selection_mut(*field).replace(values);
                DateCheck::Untouched
            }
            FilterChange::StartDate(raw) => self.set_date(DateField::Start, raw),
            FilterChange::EndDate(raw) => self.set_date(DateField::End, raw),
            FilterChange::Developer(raw) => {
                self.developer = non_blank(raw);
                DateCheck::Untouched
            }
            FilterChange::State(raw) => {
                self.state = non_blank(raw);
                DateCheck::Untouched
            }
            FilterChange::LastUpdated(window) => {
                self.last_updated = *window;
                DateCheck::Untouched
            }
            FilterChange::HideViewed(flag) => {
                self.hide_viewed_projects = *flag;
                DateCheck::Untouched
            }
        }
    }

    pub fn date_range_message(&self) -> Option<FieldMessage> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end < start => {
                Some(FieldMessage::new(DateField::End, END_BEFORE_START_MESSAGE))
            }
            _ => None,
        }
    }

    fn set_date(&mut self, field: DateField, raw: &str) -> DateCheck {
        let mut messages = Vec::new();
        match parse_optional_date(raw) {
            Ok(parsed) => match field {
                DateField::Start => self.start_date = parsed,
                DateField::End => self.end_date = parsed,
            },
            Err(error @ ValidationError::InvalidDate) => {
                messages.push(FieldMessage::new(field, error.to_string()));
            }
        }
        messages.extend(self.date_range_message());
        DateCheck::Checked(messages)
    }
}

/// Outcome of [`FilterCriteria::apply_change`] for the date messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCheck {
    Untouched,
    Checked(Vec<FieldMessage>),
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{DateCheck, DateField, END_BEFORE_START_MESSAGE, FilterChange};
    use crate::{FilterCriteria, RecencyWindow, SelectionField};
    use time::{Date, Month};

    fn toggle(value: &str, selected: bool) -> FilterChange {
        FilterChange::Toggle {
            field: SelectionField::Category,
            value: value.to_owned(),
            selected,
        }
    }

    #[test]
    fn toggles_keep_exactly_the_last_selected_values() {
        let mut criteria = FilterCriteria::default();
        for change in [
            toggle("Retail", true),
            toggle("Office", true),
            toggle("Retail", true),
            toggle("Industrial", true),
            toggle("Office", false),
            toggle("Office", false),
        ] {
            criteria.apply_change(&change);
        }
        assert_eq!(
            criteria.categories.iter().collect::<Vec<_>>(),
            vec!["Retail", "Industrial"]
        );
    }

    #[test]
    fn replace_selection_deduplicates() {
        let mut criteria = FilterCriteria::default();
        criteria.apply_change(&FilterChange::ReplaceSelection {
            field: SelectionField::Council,
            values: vec!["Sydney".to_owned(), "Sydney".to_owned(), "Parramatta".to_owned()],
        });
        assert_eq!(criteria.councils.len(), 2);

        criteria.apply_change(&FilterChange::ReplaceSelection {
            field: SelectionField::Council,
            values: Vec::new(),
        });
        assert!(criteria.councils.is_empty());
    }

    #[test]
    fn blank_text_unsets_the_field() {
        let mut criteria = FilterCriteria::default();
        criteria.apply_change(&FilterChange::Developer("  Lendlease ".to_owned()));
        assert_eq!(criteria.developer.as_deref(), Some("Lendlease"));

        criteria.apply_change(&FilterChange::Developer("   ".to_owned()));
        assert_eq!(criteria.developer, None);

        criteria.apply_change(&FilterChange::State(String::new()));
        assert_eq!(criteria.state, None);
    }

    #[test]
    fn start_after_end_is_advisory() {
        let mut criteria = FilterCriteria::default();
        assert_eq!(
            criteria.apply_change(&FilterChange::EndDate("2025-01-10".to_owned())),
            DateCheck::Checked(Vec::new())
        );

        let check = criteria.apply_change(&FilterChange::StartDate("2025-02-01".to_owned()));
        let DateCheck::Checked(messages) = check else {
            panic!("expected a field message, got {check:?}");
        };
        let [message] = &messages[..] else {
            panic!("expected one message, got {messages:?}");
        };
        assert_eq!(message.field, DateField::End);
        assert_eq!(message.message, END_BEFORE_START_MESSAGE);
        assert_eq!(
            criteria.end_date,
            Some(Date::from_calendar_date(2025, Month::January, 10).expect("valid date"))
        );
        assert_eq!(
            criteria.start_date,
            Some(Date::from_calendar_date(2025, Month::February, 1).expect("valid date"))
        );

        let fixed = criteria.apply_change(&FilterChange::EndDate("2025-03-01".to_owned()));
        assert_eq!(fixed, DateCheck::Checked(Vec::new()));
    }

    #[test]
    fn unparsable_date_keeps_previous_value() {
        let mut criteria = FilterCriteria::default();
        criteria.apply_change(&FilterChange::StartDate("2025-01-01".to_owned()));
        let check = criteria.apply_change(&FilterChange::StartDate("yesterday".to_owned()));
        let DateCheck::Checked(messages) = check else {
            panic!("expected a parse message, got {check:?}");
        };
        let [message] = &messages[..] else {
            panic!("expected one message, got {messages:?}");
        };
        assert_eq!(message.field, DateField::Start);
        assert!(message.message.contains("YYYY-MM-DD"));
        assert!(criteria.start_date.is_some());
    }

    #[test]
    fn bad_date_keeps_the_range_error_visible() {
        let mut criteria = FilterCriteria::default();
        criteria.apply_change(&FilterChange::StartDate("2025-06-01".to_owned()));
        criteria.apply_change(&FilterChange::EndDate("2025-05-01".to_owned()));

        let check = criteria.apply_change(&FilterChange::EndDate("next week".to_owned()));
        let DateCheck::Checked(messages) = check else {
            panic!("expected date messages, got {check:?}");
        };
        assert_eq!(messages.len(), 2);
        assert!(messages[0].message.contains("YYYY-MM-DD"));
        assert_eq!(messages[1].field, DateField::End);
        assert_eq!(messages[1].message, END_BEFORE_START_MESSAGE);
        assert_eq!(
            criteria.end_date,
            Some(Date::from_calendar_date(2025, Month::May, 1).expect("valid date"))
        );
    }

    #[test]
    fn auto_apply_rules() {
        assert!(toggle("Retail", true).applies_immediately());
        assert!(FilterChange::LastUpdated(RecencyWindow::AllTime).applies_immediately());
        assert!(FilterChange::HideViewed(true).applies_immediately());
        assert!(FilterChange::State("NSW".to_owned()).applies_immediately());
        assert!(!FilterChange::Developer("Acme".to_owned()).applies_immediately());
        assert!(!FilterChange::StartDate("2025-01-01".to_owned()).applies_immediately());
        assert!(
            !FilterChange::ReplaceSelection {
                field: SelectionField::Category,
                values: Vec::new(),
            }
            .applies_immediately()
        );
    }
}
