use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::bracket::AgeBracket;

/// Filter label used for a categorical field that is absent on a record.
pub const MISSING_LABEL: &str = "<missing>";

// ---------------------------------------------------------------------------
// FieldValue – an opaque pass-through cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell for campaign columns the engine never inspects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "{MISSING_LABEL}"),
        }
    }
}

impl FieldValue {
    /// Guess the type of a raw text cell. Empty text is `Null`.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return FieldValue::Float(f);
        }
        if s == "true" || s == "false" {
            return FieldValue::Bool(s == "true");
        }
        FieldValue::String(s.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) if v.is_finite() => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// The six product categories whose amounts make up a customer's total spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpendCategory {
    Wines,
    Fruits,
    MeatProducts,
    FishProducts,
    SweetProducts,
    GoldProds,
}

impl SpendCategory {
    pub const ALL: [SpendCategory; 6] = [
        SpendCategory::Wines,
        SpendCategory::Fruits,
        SpendCategory::MeatProducts,
        SpendCategory::FishProducts,
        SpendCategory::SweetProducts,
        SpendCategory::GoldProds,
    ];

    /// Column name in the campaign dataset.
    pub fn column(self) -> &'static str {
        match self {
            SpendCategory::Wines => "MntWines",
            SpendCategory::Fruits => "MntFruits",
            SpendCategory::MeatProducts => "MntMeatProducts",
            SpendCategory::FishProducts => "MntFishProducts",
            SpendCategory::SweetProducts => "MntSweetProducts",
            SpendCategory::GoldProds => "MntGoldProds",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

pub const BIRTH_YEAR_COLUMN: &str = "Year_Birth";
pub const MARITAL_STATUS_COLUMN: &str = "Marital_Status";

/// One row of the campaign table, identified by its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub birth_year: Option<i32>,
    pub marital_status: Option<String>,
    spend: [Option<f64>; 6],
    /// Every other column, carried through untouched.
    pub extra: BTreeMap<String, FieldValue>,
}

impl CustomerRecord {
    pub fn new(birth_year: Option<i32>, marital_status: Option<&str>) -> Self {
        CustomerRecord {
            birth_year,
            marital_status: marital_status.map(str::to_string),
            ..Default::default()
        }
    }

    /// Builder-style setter for one spend amount.
    pub fn with_spend(mut self, category: SpendCategory, amount: f64) -> Self {
        self.set_spend(category, Some(amount));
        self
    }

    pub fn spend(&self, category: SpendCategory) -> Option<f64> {
        self.spend[category.slot()]
    }

    pub fn set_spend(&mut self, category: SpendCategory, amount: Option<f64>) {
        self.spend[category.slot()] = amount.filter(|v| !v.is_nan());
    }
}

// ---------------------------------------------------------------------------
// Derived records
// ---------------------------------------------------------------------------

/// Synthetic two-valued gender label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

/// A required raw field that was absent when deriving a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RequiredField {
    BirthYear,
    MaritalStatus,
    Spend(SpendCategory),
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::BirthYear => write!(f, "{BIRTH_YEAR_COLUMN}"),
            RequiredField::MaritalStatus => write!(f, "{MARITAL_STATUS_COLUMN}"),
            RequiredField::Spend(c) => write!(f, "{}", c.column()),
        }
    }
}

/// A customer with computed demographic and spending fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedCustomer {
    /// Position of the source record; the join key back to the raw table.
    pub index: usize,
    pub age: Option<i32>,
    pub total_spend: Option<f64>,
    pub marital_status: Option<String>,
    pub gender: Gender,
    /// `None` only when `age` is missing.
    pub age_bracket: Option<AgeBracket>,
    /// Required raw fields that were absent. Empty for complete records.
    pub missing: Vec<RequiredField>,
}

impl DerivedCustomer {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Canonical filter label for the marital status dimension.
    pub fn status_label(&self) -> &str {
        self.marital_status.as_deref().unwrap_or(MISSING_LABEL)
    }

    /// Canonical filter label for the age bracket dimension.
    pub fn bracket_label(&self) -> String {
        match self.age_bracket {
            Some(b) => b.label(),
            None => MISSING_LABEL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// CustomerTable – the complete derived dataset
// ---------------------------------------------------------------------------

/// Distinct values present in the unfiltered table, per filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub marital_statuses: BTreeSet<String>,
    /// Bracket labels in ascending bracket order, missing age last.
    pub age_brackets: Vec<String>,
    pub genders: BTreeSet<Gender>,
}

/// Raw records alongside their derived customers. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct CustomerTable {
    records: Vec<CustomerRecord>,
    customers: Vec<DerivedCustomer>,
    options: FilterOptions,
}

impl CustomerTable {
    /// Pair raw records with their derived counterparts and index the
    /// distinct filter values.
    pub(crate) fn new(records: Vec<CustomerRecord>, customers: Vec<DerivedCustomer>) -> Self {
        debug_assert_eq!(records.len(), customers.len());

        let mut statuses = BTreeSet::new();
        let mut brackets: BTreeSet<Option<AgeBracket>> = BTreeSet::new();
        let mut genders = BTreeSet::new();
        for c in &customers {
            statuses.insert(c.status_label().to_string());
            brackets.insert(c.age_bracket);
            genders.insert(c.gender);
        }

        // `None` sorts first in an ordered set; the missing label goes last.
        let mut age_brackets: Vec<String> = brackets.iter().flatten().map(|b| b.label()).collect();
        if brackets.contains(&None) {
            age_brackets.push(MISSING_LABEL.to_string());
        }

        CustomerTable {
            records,
            customers,
            options: FilterOptions {
                marital_statuses: statuses,
                age_brackets,
                genders,
            },
        }
    }

    pub fn customers(&self) -> &[DerivedCustomer] {
        &self.customers
    }

    /// Raw record for a derived customer's positional index.
    pub fn record(&self, index: usize) -> Option<&CustomerRecord> {
        self.records.get(index)
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Number of customers.
    pub fn len(&self) -> usize {
        self.customers.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// Customers with at least one required field missing.
    pub fn incomplete_count(&self) -> usize {
        self.customers.iter().filter(|c| !c.is_complete()).count()
    }
}
