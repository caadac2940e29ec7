/// Data layer: curve types, loading, and cleaning.
///
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → CurveSet
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ CurveSet  │  Vec<SiteCurve>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop NaN rows, validate before fitting
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
