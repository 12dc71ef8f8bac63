use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::bracket::AgeBracket;
use super::model::{
    CustomerRecord, CustomerTable, DerivedCustomer, Gender, RequiredField, SpendCategory,
};

// ---------------------------------------------------------------------------
// Gender labelling capability
// ---------------------------------------------------------------------------

/// Assigns a reproducible gender label to the record at a given position.
///
/// Implementations must be pure: the same index always yields the same label.
pub trait GenderLabeler: Send + Sync {
    fn assign(&self, index: usize) -> Gender;
}

impl<F> GenderLabeler for F
where
    F: Fn(usize) -> Gender + Send + Sync,
{
    fn assign(&self, index: usize) -> Gender {
        self(index)
    }
}

/// Coin-flip labeler. Each index draws from its own ChaCha8 stream under a
/// fixed seed, so a label depends only on `(seed, index)`.
#[derive(Debug, Clone, Copy)]
pub struct SeededGenderLabeler {
    seed: u64,
}

impl SeededGenderLabeler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl GenderLabeler for SeededGenderLabeler {
    fn assign(&self, index: usize) -> Gender {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(index as u64);
        if rng.gen_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

// ---------------------------------------------------------------------------
// Field deriver
// ---------------------------------------------------------------------------

/// Turns raw campaign records into [`DerivedCustomer`]s.
#[derive(Debug, Clone)]
pub struct FieldDeriver<L> {
    reference_year: i32,
    labeler: L,
}

impl<L: GenderLabeler> FieldDeriver<L> {
    pub fn new(reference_year: i32, labeler: L) -> Self {
        Self {
            reference_year,
            labeler,
        }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Derive one customer. Absent raw fields are listed in `missing` and the
    /// fields computed from them are left as `None`.
    pub fn derive_one(&self, index: usize, record: &CustomerRecord) -> DerivedCustomer {
        let mut missing = Vec::new();

        // A birth year too far from the reference year counts as unusable.
        let age = record
            .birth_year
            .and_then(|year| self.reference_year.checked_sub(year));
        if age.is_none() {
            missing.push(RequiredField::BirthYear);
        }

        let mut total = Some(0.0);
        for category in SpendCategory::ALL {
            match record.spend(category) {
                Some(amount) => total = total.map(|t| t + amount),
                None => {
                    missing.push(RequiredField::Spend(category));
                    total = None;
                }
            }
        }

        if record.marital_status.is_none() {
            missing.push(RequiredField::MaritalStatus);
        }

        DerivedCustomer {
            index,
            age,
            total_spend: total,
            marital_status: record.marital_status.clone(),
            gender: self.labeler.assign(index),
            age_bracket: age.map(AgeBracket::for_age),
            missing,
        }
    }

    /// Derive every record, preserving order and cardinality.
    pub fn derive(&self, records: Vec<CustomerRecord>) -> CustomerTable {
        let customers: Vec<DerivedCustomer> = records
            .iter()
            .enumerate()
            .map(|(i, r)| self.derive_one(i, r))
            .collect();

        let incomplete = customers.iter().filter(|c| !c.is_complete()).count();
        if incomplete > 0 {
            log::warn!(
                "{incomplete} of {} records are missing required fields",
                customers.len()
            );
        }
        log::info!(
            "Derived {} customers (reference year {})",
            customers.len(),
            self.reference_year
        );

        CustomerTable::new(records, customers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_delimited;

    fn record(year: i32, status: &str, spend: [f64; 6]) -> CustomerRecord {
        SpendCategory::ALL
            .iter()
            .zip(spend)
            .fold(CustomerRecord::new(Some(year), Some(status)), |r, (c, v)| {
                r.with_spend(*c, v)
            })
    }

    #[test]
    fn computes_age_and_total_spend() {
        let deriver = FieldDeriver::new(2025, SeededGenderLabeler::new(42));
        let c = deriver.derive_one(0, &record(1990, "Married", [10.0, 20.0, 30.0, 1.0, 2.0, 3.0]));
        assert_eq!(c.age, Some(35));
        assert_eq!(c.total_spend, Some(66.0));
        assert_eq!(c.age_bracket, Some(AgeBracket::Span { lower: 30 }));
        assert_eq!(c.marital_status.as_deref(), Some("Married"));
        assert!(c.is_complete());
    }

    #[test]
    fn reference_year_is_a_constructor_input() {
        let r = record(1990, "Single", [0.0; 6]);
        let a = FieldDeriver::new(2025, SeededGenderLabeler::new(1)).derive_one(0, &r);
        let b = FieldDeriver::new(2000, SeededGenderLabeler::new(1)).derive_one(0, &r);
        assert_eq!(a.age, Some(35));
        assert_eq!(b.age, Some(10));
    }

    #[test]
    fn missing_fields_are_flagged_not_zeroed() {
        let mut r = record(1970, "Divorced", [1.0; 6]);
        r.set_spend(SpendCategory::GoldProds, None);
        r.birth_year = None;
        r.marital_status = None;

        let c = FieldDeriver::new(2025, SeededGenderLabeler::new(42)).derive_one(3, &r);
        assert_eq!(c.index, 3);
        assert_eq!(c.age, None);
        assert_eq!(c.age_bracket, None);
        assert_eq!(c.total_spend, None);
        assert_eq!(
            c.missing,
            vec![
                RequiredField::BirthYear,
                RequiredField::Spend(SpendCategory::GoldProds),
                RequiredField::MaritalStatus,
            ]
        );
    }

    #[test]
    fn extreme_birth_year_is_flagged_instead_of_overflowing() {
        let records = parse_delimited("Year_Birth,Marital_Status\n-2147483648,Single\n1990,Married\n")
            .unwrap();
        let table = FieldDeriver::new(2025, SeededGenderLabeler::new(42)).derive(records);
        assert_eq!(table.len(), 2);

        let bad = &table.customers()[0];
        assert_eq!(bad.age, None);
        assert_eq!(bad.age_bracket, None);
        assert!(bad.missing.contains(&RequiredField::BirthYear));
        assert_eq!(table.customers()[1].age, Some(35));
    }

    #[test]
    fn unknown_marital_status_is_kept_verbatim() {
        let c = FieldDeriver::new(2025, SeededGenderLabeler::new(42))
            .derive_one(0, &record(1980, "YOLO", [0.0; 6]));
        assert_eq!(c.marital_status.as_deref(), Some("YOLO"));
    }

    #[test]
    fn seeded_labels_are_reproducible_and_seed_dependent() {
        let a = SeededGenderLabeler::new(42);
        let b = SeededGenderLabeler::new(42);
        let first: Vec<_> = (0..64).map(|i| a.assign(i)).collect();
        let second: Vec<_> = (0..64).map(|i| b.assign(i)).collect();
        assert_eq!(first, second);
        assert!(first.contains(&Gender::Male));
        assert!(first.contains(&Gender::Female));

        let other: Vec<_> = (0..64).map(|i| SeededGenderLabeler::new(7).assign(i)).collect();
        assert_ne!(first, other);
    }

    #[test]
    fn closures_work_as_labelers() {
        let deriver = FieldDeriver::new(2025, |i: usize| {
            if i % 2 == 0 {
                Gender::Female
            } else {
                Gender::Male
            }
        });
        let table = deriver.derive(vec![record(1990, "Single", [0.0; 6]); 3]);
        let genders: Vec<_> = table.customers().iter().map(|c| c.gender).collect();
        assert_eq!(genders, [Gender::Female, Gender::Male, Gender::Female]);
    }
}
