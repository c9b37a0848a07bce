/// Data layer: core types and loading.
///
/// Architecture:
/// ```text
///  request body / .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse rows → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   Dataset     │  rows, ordered columns, inferred column kinds
///   └──────────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ NumericSubset  │  column-major numeric view fed to the analyzers
///   └───────────────┘
/// ```

pub mod loader;
pub mod model;
