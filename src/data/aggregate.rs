//! The four aggregate views rendered by the dashboard.
//!
//! Every view is computed independently from a [`FilteredTable`]. An empty
//! table yields empty views rather than an error.

use std::collections::BTreeMap;

use serde::Serialize;

use super::bracket::AgeBracket;
use super::filter::FilteredTable;
use super::model::Gender;

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over the observed age range. The last bin is closed on
/// the right so the maximum age is counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgeHistogram {
    pub bins: Vec<HistogramBin>,
}

impl AgeHistogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Ages of the customers sharing one marital status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusAges {
    pub status: String,
    pub ages: Vec<i32>,
}

/// Mean total spend of the customers in one age bracket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketSpend {
    pub bracket: AgeBracket,
    pub label: String,
    pub mean: f64,
    /// Customers whose spend contributed to the mean.
    pub customers: usize,
}

/// Customer counts at one age, split by gender.
///
/// Sign convention: `male` is negated (always `<= 0`) and drawn on the left,
/// `female` is positive and drawn on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PyramidRow {
    pub age: i32,
    pub male: i64,
    pub female: i64,
}

impl PyramidRow {
    /// Both signed entries of the row. Always exactly one per gender.
    pub fn entries(&self) -> [(Gender, i64); 2] {
        [(Gender::Male, self.male), (Gender::Female, self.female)]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateViews {
    pub histogram: AgeHistogram,
    pub ages_by_status: Vec<StatusAges>,
    pub mean_spend: Vec<BracketSpend>,
    pub pyramid: Vec<PyramidRow>,
}

impl AggregateViews {
    /// True when there is nothing to draw in any view.
    pub fn is_empty(&self) -> bool {
        self.histogram.bins.is_empty()
            && self.ages_by_status.is_empty()
            && self.mean_spend.is_empty()
            && self.pyramid.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Compute all four views.
pub fn aggregate(filtered: &FilteredTable<'_>, histogram_bins: usize) -> AggregateViews {
    AggregateViews {
        histogram: age_histogram(filtered, histogram_bins),
        ages_by_status: ages_by_status(filtered),
        mean_spend: mean_spend_by_bracket(filtered),
        pyramid: population_pyramid(filtered),
    }
}

/// Histogram of known ages. Ages outside the bracket domain are still counted.
pub fn age_histogram(filtered: &FilteredTable<'_>, bins: usize) -> AgeHistogram {
    let ages: Vec<i32> = filtered.iter().filter_map(|c| c.age).collect();
    let (Some(&min), Some(&max)) = (ages.iter().min(), ages.iter().max()) else {
        return AgeHistogram::default();
    };
    if bins == 0 {
        return AgeHistogram::default();
    }

    // A single distinct age gets a unit-wide range centred on it.
    let (lo, hi) = if min == max {
        (min as f64 - 0.5, max as f64 + 0.5)
    } else {
        (min as f64, max as f64)
    };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for age in ages {
        let slot = ((age as f64 - lo) / width).floor() as usize;
        counts[slot.min(bins - 1)] += 1;
    }

    AgeHistogram {
        bins: counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                start: lo + width * i as f64,
                end: lo + width * (i + 1) as f64,
                count,
            })
            .collect(),
    }
}

/// Group known ages by marital status label, for statuses present only.
pub fn ages_by_status(filtered: &FilteredTable<'_>) -> Vec<StatusAges> {
    let mut groups: BTreeMap<&str, Vec<i32>> = BTreeMap::new();
    for c in filtered.iter() {
        if let Some(age) = c.age {
            groups.entry(c.status_label()).or_default().push(age);
        }
    }
    groups
        .into_iter()
        .map(|(status, ages)| StatusAges {
            status: status.to_string(),
            ages,
        })
        .collect()
}

/// Mean known total spend per in-range bracket, ascending. Brackets with no
/// contributing customers are omitted.
pub fn mean_spend_by_bracket(filtered: &FilteredTable<'_>) -> Vec<BracketSpend> {
    let mut sums: BTreeMap<AgeBracket, (f64, usize)> = BTreeMap::new();
    for c in filtered.iter() {
        let (Some(bracket), Some(spend)) = (c.age_bracket, c.total_spend) else {
            continue;
        };
        if !bracket.is_in_range() {
            continue;
        }
        let entry = sums.entry(bracket).or_insert((0.0, 0));
        entry.0 += spend;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(bracket, (sum, n))| BracketSpend {
            bracket,
            label: bracket.label(),
            mean: sum / n as f64,
            customers: n,
        })
        .collect()
}

/// Per-age gender counts, ascending by age, with the male side negated.
pub fn population_pyramid(filtered: &FilteredTable<'_>) -> Vec<PyramidRow> {
    let mut counts: BTreeMap<i32, (i64, i64)> = BTreeMap::new();
    for c in filtered.iter() {
        let Some(age) = c.age else { continue };
        let entry = counts.entry(age).or_insert((0, 0));
        match c.gender {
            Gender::Male => entry.0 += 1,
            Gender::Female => entry.1 += 1,
        }
    }
    counts
        .into_iter()
        .map(|(age, (male, female))| PyramidRow {
            age,
            male: -male,
            female,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::FieldDeriver;
    use crate::data::filter::{apply, init_filter_selection};
    use crate::data::model::{CustomerRecord, CustomerTable, SpendCategory};

    /// Build a table where each row is `(birth_year, status, total, gender)`;
    /// the total is booked entirely under wines.
    fn table(rows: &[(i32, &str, f64, Gender)]) -> CustomerTable {
        let records = rows
            .iter()
            .map(|&(year, status, total, _)| {
                SpendCategory::ALL
                    .iter()
                    .fold(CustomerRecord::new(Some(year), Some(status)), |r, c| {
                        r.with_spend(*c, 0.0)
                    })
                    .with_spend(SpendCategory::Wines, total)
            })
            .collect();
        let genders: Vec<Gender> = rows.iter().map(|r| r.3).collect();
        FieldDeriver::new(2025, move |i: usize| genders[i]).derive(records)
    }

    #[test]
    fn mean_spend_in_bracket_order_without_empty_brackets() {
        let t = table(&[
            (1970, "Single", 300.0, Gender::Male),  // 55
            (1990, "Single", 100.0, Gender::Male),  // 35
            (1995, "Married", 150.0, Gender::Female), // 30
            (1960, "Married", 100.0, Gender::Female), // 65 -> filtered out below
        ]);
        let mut sel = init_filter_selection(&t);
        sel.age_brackets.remove("[60, 70)");
        let views = aggregate(&apply(&t, &sel), 20);

        let labels: Vec<_> = views.mean_spend.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["[30, 40)", "[50, 60)"]);
        assert_eq!(views.mean_spend[0].mean, 125.0);
        assert_eq!(views.mean_spend[0].customers, 2);
        assert_eq!(views.mean_spend[1].mean, 300.0);
    }

    #[test]
    fn out_of_range_ages_skip_brackets_but_stay_in_age_views() {
        let t = table(&[
            (1920, "Widow", 10.0, Gender::Female), // 105
            (2020, "Single", 10.0, Gender::Male),  // 5
            (1980, "Single", 40.0, Gender::Male),  // 45
        ]);
        let views = aggregate(&FilteredTable::all(&t), 4);

        assert_eq!(views.mean_spend.len(), 1);
        assert_eq!(views.mean_spend[0].label, "[40, 50)");
        assert_eq!(views.histogram.total(), 3);
        let ages: Vec<_> = views.pyramid.iter().map(|r| r.age).collect();
        assert_eq!(ages, [5, 45, 105]);
    }

    #[test]
    fn histogram_spans_min_to_max_with_closed_last_bin() {
        let t = table(&[
            (2005, "Single", 0.0, Gender::Male),   // 20
            (1995, "Single", 0.0, Gender::Male),   // 30
            (1985, "Single", 0.0, Gender::Male),   // 40
            (1975, "Single", 0.0, Gender::Female), // 50
            (1965, "Single", 0.0, Gender::Female), // 60
        ]);
        let h = age_histogram(&FilteredTable::all(&t), 4);
        assert_eq!(h.bins.len(), 4);
        assert_eq!(h.bins[0].start, 20.0);
        assert_eq!(h.bins[3].end, 60.0);
        let counts: Vec<_> = h.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, [1, 1, 1, 2]);
    }

    #[test]
    fn histogram_of_a_single_age_is_well_formed() {
        let t = table(&[
            (1990, "Single", 0.0, Gender::Male),
            (1990, "Married", 0.0, Gender::Female),
        ]);
        let h = age_histogram(&FilteredTable::all(&t), 5);
        assert_eq!(h.bins.len(), 5);
        assert_eq!(h.total(), 2);
        assert!(h.bins.iter().all(|b| b.end > b.start));
    }

    #[test]
    fn ages_grouped_by_present_statuses_only() {
        let t = table(&[
            (1990, "Single", 0.0, Gender::Male),
            (1980, "Married", 0.0, Gender::Male),
            (1970, "Single", 0.0, Gender::Female),
            (1960, "Absurd", 0.0, Gender::Female),
        ]);
        let mut sel = init_filter_selection(&t);
        sel.marital_statuses.remove("Absurd");
        let groups = ages_by_status(&apply(&t, &sel));
        assert_eq!(
            groups,
            vec![
                StatusAges { status: "Married".into(), ages: vec![45] },
                StatusAges { status: "Single".into(), ages: vec![35, 55] },
            ]
        );
    }

    #[test]
    fn pyramid_rows_always_carry_both_genders() {
        let t = table(&[
            (1990, "Single", 0.0, Gender::Male),
            (1990, "Single", 0.0, Gender::Male),
            (1990, "Single", 0.0, Gender::Female),
            (1980, "Single", 0.0, Gender::Female),
            (1970, "Single", 0.0, Gender::Male),
        ]);
        let rows = population_pyramid(&FilteredTable::all(&t));
        assert_eq!(
            rows,
            vec![
                PyramidRow { age: 35, male: -2, female: 1 },
                PyramidRow { age: 45, male: 0, female: 1 },
                PyramidRow { age: 55, male: -1, female: 0 },
            ]
        );
        for row in &rows {
            let entries = row.entries();
            assert_eq!(entries[0].0, Gender::Male);
            assert!(entries[0].1 <= 0);
            assert!(entries[1].1 >= 0);
        }
    }

    #[test]
    fn empty_selection_gives_empty_views() {
        let t = table(&[(1990, "Single", 10.0, Gender::Male)]);
        let mut sel = init_filter_selection(&t);
        sel.genders.clear();
        let views = aggregate(&apply(&t, &sel), 20);
        assert!(views.is_empty());
        assert_eq!(views, AggregateViews::default());
    }

    #[test]
    fn missing_spend_does_not_poison_the_bracket_mean() {
        let mut records = vec![
            CustomerRecord::new(Some(1990), Some("Single")),
            CustomerRecord::new(Some(1991), Some("Single")),
        ];
        for c in SpendCategory::ALL {
            records[0].set_spend(c, Some(10.0));
        }
        records[1].set_spend(SpendCategory::Wines, Some(500.0));
        let t = FieldDeriver::new(2025, |_: usize| Gender::Female).derive(records);

        let spend = mean_spend_by_bracket(&FilteredTable::all(&t));
        assert_eq!(spend.len(), 1);
        assert_eq!(spend[0].mean, 60.0);
        assert_eq!(spend[0].customers, 1);
    }
}
