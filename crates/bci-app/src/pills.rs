// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::format::format_date;
use crate::{FilterCriteria, RecencyWindow, SelectionField};

/// Identifies what removing a pill should undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PillKey {
    StartDate,
    EndDate,
    Developer,
    State,
    LastUpdated,
    HideViewed,
    Selection {
        field: SelectionField,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPill {
    pub key: PillKey,
    pub label: String,
}

const SCALAR_STAGES: usize = 6;

/// Lazily walks the active filters: scalars first, then every selected value
/// of each multi-select field. Clone it to restart.
#[derive(Debug, Clone)]
pub struct FilterPills<'a> {
    criteria: &'a FilterCriteria,
    stage: usize,
    index: usize,
}

impl<'a> FilterPills<'a> {
    pub fn new(criteria: &'a FilterCriteria) -> Self {
        Self {
            criteria,
            stage: 0,
            index: 0,
        }
    }

    fn scalar(&self, stage: usize) -> Option<FilterPill> {
        let criteria = self.criteria;
        match stage {
            0 => criteria.start_date.map(|date| FilterPill {
                key: PillKey::StartDate,
                label: format!("Start Date: {}", format_date(Some(date))),
            }),
            1 => criteria.end_date.map(|date| FilterPill {
                key: PillKey::EndDate,
                label: format!("End Date: {}", format_date(Some(date))),
            }),
            2 => criteria.developer.as_ref().map(|developer| FilterPill {
                key: PillKey::Developer,
                label: format!("Developer: {developer}"),
            }),
            3 => criteria.state.as_ref().map(|state| FilterPill {
                key: PillKey::State,
                label: format!("State: {state}"),
            }),
            4 => (criteria.last_updated != RecencyWindow::default()).then(|| FilterPill {
                key: PillKey::LastUpdated,
                label: format!("Last Updated: {}", criteria.last_updated.as_str()),
            }),
            5 => criteria.hide_viewed_projects.then(|| FilterPill {
                key: PillKey::HideViewed,
                label: "Hide Viewed Projects".to_owned(),
            }),
            _ => None,
        }
    }
}

impl Iterator for FilterPills<'_> {
    type Item = FilterPill;

    fn next(&mut self) -> Option<Self::Item> {
        while self.stage < SCALAR_STAGES {
            let stage = self.stage;
            self.stage += 1;
            if let Some(pill) = self.scalar(stage) {
                return Some(pill);
            }
        }

        while let Some(field) = SelectionField::ALL.get(self.stage - SCALAR_STAGES).copied() {
            if let Some(value) = self.criteria.selection(field).get(self.index) {
                self.index += 1;
                return Some(FilterPill {
                    key: PillKey::Selection {
                        field,
                        value: value.to_owned(),
                    },
                    label: format!("{}: {value}", field.label()),
                });
            }
            self.stage += 1;
            self.index = 0;
        }
        None
    }
}

impl FilterCriteria {
    pub fn pills(&self) -> FilterPills<'_> {
        FilterPills::new(self)
    }

    /// Resets the scalar behind `key` to its default, or drops the selected
    /// value. Returns `false` when the pill was not active.
    pub fn remove_pill(&mut self, key: &PillKey) -> bool {
        match key {
            PillKey::StartDate => self.start_date.take().is_some(),
            PillKey::EndDate => self.end_date.take().is_some(),
            PillKey::Developer => self.developer.take().is_some(),
            PillKey::State => self.state.take().is_some(),
            PillKey::LastUpdated => {
                let changed = self.last_updated != RecencyWindow::default();
                self.last_updated = RecencyWindow::default();
                changed
            }
            PillKey::HideViewed => std::mem::take(&mut self.hide_viewed_projects),
            PillKey::Selection { field, value } => self.selection_mut(*field).remove(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PillKey;
    use crate::{FilterCriteria, RecencyWindow, SelectionField, SelectionSet};
    use time::{Date, Month};

    fn busy_criteria() -> FilterCriteria {
        FilterCriteria {
            categories: SelectionSet::from_iter(["Retail", "Office"]),
            councils: SelectionSet::from_iter(["Sydney"]),
            start_date: Some(Date::from_calendar_date(2025, Month::January, 1).expect("date")),
            developer: Some("Mirvac".to_owned()),
            last_updated: RecencyWindow::Last12Months,
            hide_viewed_projects: true,
            ..FilterCriteria::default()
        }
    }

    #[test]
    fn default_criteria_only_shows_the_default_country() {
        let criteria = FilterCriteria::default();
        let labels = criteria.pills().map(|pill| pill.label).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Country: Australia"]);
    }

    #[test]
    fn pills_cover_scalars_then_each_selected_value() {
        let criteria = busy_criteria();
        let labels = criteria.pills().map(|pill| pill.label).collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                "Start Date: 2025-01-01",
                "Developer: Mirvac",
                "Last Updated: Last 12 Months",
                "Hide Viewed Projects",
                "Category: Retail",
                "Category: Office",
                "Council: Sydney",
                "Country: Australia",
            ]
        );
    }

    #[test]
    fn pills_restart_from_a_clone() {
        let criteria = busy_criteria();
        let mut pills = criteria.pills();
        let fresh = pills.clone();
        pills.next();
        pills.next();
        assert_eq!(pills.count() + 2, fresh.count());
    }

    #[test]
    fn remove_pill_resets_scalars_and_drops_values() {
        let mut criteria = busy_criteria();

        assert!(criteria.remove_pill(&PillKey::Selection {
            field: SelectionField::Category,
            value: "Retail".to_owned(),
        }));
        assert_eq!(criteria.categories.iter().collect::<Vec<_>>(), vec!["Office"]);

        assert!(criteria.remove_pill(&PillKey::LastUpdated));
        assert_eq!(criteria.last_updated, RecencyWindow::Last3Months);
        assert!(!criteria.remove_pill(&PillKey::LastUpdated));

        assert!(criteria.remove_pill(&PillKey::HideViewed));
        assert!(!criteria.hide_viewed_projects);

        assert!(criteria.remove_pill(&PillKey::Developer));
        assert!(!criteria.remove_pill(&PillKey::State));
    }
}
