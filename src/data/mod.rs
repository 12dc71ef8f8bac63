/// Data layer: core types, derivation, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<CustomerRecord>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  age, total spend, gender label, bracket → CustomerTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  marital status ∧ age bracket ∧ gender → FilteredTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  histogram, ages by status, mean spend, pyramid
///   └───────────┘
/// ```

pub mod aggregate;
pub mod bracket;
pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
