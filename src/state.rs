use std::path::Path;

use anyhow::{Context, Result};

use marketing_lens::config::DashboardConfig;
use marketing_lens::data::aggregate::{aggregate, AggregateViews};
use marketing_lens::data::filter::{apply, init_filter_selection, FilterSelection};
use marketing_lens::data::loader::load_file;
use marketing_lens::data::model::{CustomerRecord, CustomerTable, Gender};

// ---------------------------------------------------------------------------
// Filter dimensions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    MaritalStatus,
    AgeBracket,
    Gender,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [
        Dimension::MaritalStatus,
        Dimension::AgeBracket,
        Dimension::Gender,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Dimension::MaritalStatus => "Marital status",
            Dimension::AgeBracket => "Age bracket",
            Dimension::Gender => "Gender",
        }
    }
}

/// A change requested by the filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    Toggle(Dimension, String),
    SelectAll(Dimension),
    SelectNone(Dimension),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Derived table (None until user loads a file).
    pub table: Option<CustomerTable>,

    /// Current filter selection.
    pub selection: FilterSelection,

    /// Views for the current selection, rebuilt on every change.
    pub views: AggregateViews,

    /// Customers passing the current selection.
    pub visible_count: usize,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            table: None,
            selection: FilterSelection::default(),
            views: AggregateViews::default(),
            visible_count: 0,
            status_message: None,
        }
    }

    /// Derive a freshly loaded set of records and select everything.
    pub fn set_records(&mut self, records: Vec<CustomerRecord>) {
        let table = self.config.deriver().derive(records);
        self.selection = init_filter_selection(&table);
        self.table = Some(table);
        self.status_message = None;
        self.refilter();
    }

    /// Load a file, reporting failures in the status line.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(records) => self.set_records(records),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Recompute the filtered table and its views.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let filtered = apply(table, &self.selection);
        self.visible_count = filtered.len();
        self.views = aggregate(&filtered, self.config.histogram_bins);
    }

    pub fn is_selected(&self, dim: Dimension, value: &str) -> bool {
        match dim {
            Dimension::MaritalStatus => self.selection.marital_statuses.contains(value),
            Dimension::AgeBracket => self.selection.age_brackets.contains(value),
            Dimension::Gender => {
                gender_from_label(value).is_some_and(|g| self.selection.genders.contains(&g))
            }
        }
    }

    /// Option labels for one dimension, from the unfiltered table.
    pub fn options(&self, dim: Dimension) -> Vec<String> {
        let Some(table) = &self.table else {
            return Vec::new();
        };
        let opts = table.options();
        match dim {
            Dimension::MaritalStatus => opts.marital_statuses.iter().cloned().collect(),
            Dimension::AgeBracket => opts.age_brackets.clone(),
            Dimension::Gender => opts.genders.iter().map(Gender::to_string).collect(),
        }
    }

    /// Apply a panel edit and refresh the views.
    pub fn apply_edit(&mut self, edit: FilterEdit) {
        match edit {
            FilterEdit::Toggle(dim, value) => self.toggle(dim, &value),
            FilterEdit::SelectAll(dim) => {
                let Some(table) = &self.table else { return };
                let all = init_filter_selection(table);
                match dim {
                    Dimension::MaritalStatus => self.selection.marital_statuses = all.marital_statuses,
                    Dimension::AgeBracket => self.selection.age_brackets = all.age_brackets,
                    Dimension::Gender => self.selection.genders = all.genders,
                }
            }
            FilterEdit::SelectNone(dim) => match dim {
                Dimension::MaritalStatus => self.selection.marital_statuses.clear(),
                Dimension::AgeBracket => self.selection.age_brackets.clear(),
                Dimension::Gender => self.selection.genders.clear(),
            },
        }
        self.refilter();
    }

    fn toggle(&mut self, dim: Dimension, value: &str) {
        fn flip<T: Ord>(set: &mut std::collections::BTreeSet<T>, value: T) {
            if !set.remove(&value) {
                set.insert(value);
            }
        }
        match dim {
            Dimension::MaritalStatus => flip(&mut self.selection.marital_statuses, value.to_string()),
            Dimension::AgeBracket => flip(&mut self.selection.age_brackets, value.to_string()),
            Dimension::Gender => {
                if let Some(g) = gender_from_label(value) {
                    flip(&mut self.selection.genders, g);
                }
            }
        }
    }

    /// Write the current views as pretty JSON.
    pub fn export_views(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.views).context("serialising views")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported views to {}", path.display());
        Ok(())
    }
}

fn gender_from_label(label: &str) -> Option<Gender> {
    Gender::ALL.into_iter().find(|g| g.to_string() == label)
}

#[cfg(test)]
mod tests {
    use marketing_lens::data::model::SpendCategory;

    use super::*;

    fn state() -> AppState {
        let records = [(1990, "Married"), (1985, "Single"), (2000, "Married"), (1995, "Together")]
            .iter()
            .map(|&(year, status)| {
                SpendCategory::ALL
                    .iter()
                    .fold(CustomerRecord::new(Some(year), Some(status)), |r, c| {
                        r.with_spend(*c, 10.0)
                    })
            })
            .collect();
        let mut s = AppState::new(DashboardConfig::default());
        s.set_records(records);
        s
    }

    #[test]
    fn loading_selects_everything() {
        let s = state();
        assert_eq!(s.visible_count, 4);
        assert!(!s.views.is_empty());
        assert_eq!(s.options(Dimension::MaritalStatus), ["Married", "Single", "Together"]);
    }

    #[test]
    fn none_then_all_restores_the_population() {
        let mut s = state();
        s.apply_edit(FilterEdit::SelectNone(Dimension::MaritalStatus));
        assert_eq!(s.visible_count, 0);
        assert!(s.views.is_empty());

        s.apply_edit(FilterEdit::SelectAll(Dimension::MaritalStatus));
        assert_eq!(s.visible_count, 4);
    }

    #[test]
    fn toggling_a_value_narrows_and_widens() {
        let mut s = state();
        s.apply_edit(FilterEdit::Toggle(Dimension::MaritalStatus, "Married".into()));
        assert_eq!(s.visible_count, 2);
        assert!(!s.is_selected(Dimension::MaritalStatus, "Married"));

        s.apply_edit(FilterEdit::Toggle(Dimension::MaritalStatus, "Married".into()));
        assert_eq!(s.visible_count, 4);
    }

    #[test]
    fn gender_toggles_by_label() {
        let mut s = state();
        for label in s.options(Dimension::Gender) {
            s.apply_edit(FilterEdit::Toggle(Dimension::Gender, label));
        }
        assert_eq!(s.visible_count, 0);
    }

    #[test]
    fn export_writes_json() {
        let s = state();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("views.json");
        s.export_views(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("pyramid").is_some());
    }
}
