use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{CustomerTable, DerivedCustomer, Gender};

// ---------------------------------------------------------------------------
// Filter selection: which values are kept per dimension
// ---------------------------------------------------------------------------

/// Per-dimension inclusion sets. An empty set keeps nothing for that
/// dimension; the three dimensions combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// Marital status labels (`MISSING_LABEL` for absent statuses).
    pub marital_statuses: BTreeSet<String>,
    /// Age bracket display labels, as produced by `AgeBracket::label`.
    pub age_brackets: BTreeSet<String>,
    pub genders: BTreeSet<Gender>,
}

impl FilterSelection {
    /// Whether a single customer passes all three dimensions.
    pub fn matches(&self, customer: &DerivedCustomer) -> bool {
        self.marital_statuses.contains(customer.status_label())
            && self.age_brackets.contains(&customer.bracket_label())
            && self.genders.contains(&customer.gender)
    }
}

/// Initialise a [`FilterSelection`] with every value present in the unfiltered
/// table selected (i.e., show everything).
pub fn init_filter_selection(table: &CustomerTable) -> FilterSelection {
    let opts = table.options();
    FilterSelection {
        marital_statuses: opts.marital_statuses.clone(),
        age_brackets: opts.age_brackets.iter().cloned().collect(),
        genders: opts.genders.clone(),
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Customers of a table passing a selection, in table order.
#[derive(Debug, Clone)]
pub struct FilteredTable<'a> {
    table: &'a CustomerTable,
    indices: Vec<usize>,
}

impl<'a> FilteredTable<'a> {
    /// A view over every customer of the table.
    pub fn all(table: &'a CustomerTable) -> Self {
        Self {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a DerivedCustomer> + '_ {
        let customers = self.table.customers();
        self.indices.iter().map(move |&i| &customers[i])
    }

    pub fn table(&self) -> &'a CustomerTable {
        self.table
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Return indices of customers that pass all three dimensions.
pub fn filtered_indices(table: &CustomerTable, selection: &FilterSelection) -> Vec<usize> {
    let indices: Vec<usize> = table
        .customers()
        .iter()
        .filter(|c| selection.matches(c))
        .map(|c| c.index)
        .collect();
    log::debug!("Filter kept {} of {} customers", indices.len(), table.len());
    indices
}

/// Apply a selection to the full table.
pub fn apply<'a>(table: &'a CustomerTable, selection: &FilterSelection) -> FilteredTable<'a> {
    FilteredTable {
        table,
        indices: filtered_indices(table, selection),
    }
}
