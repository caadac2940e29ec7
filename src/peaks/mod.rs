/// Peak identification core.
///
/// ```text
///  (period, response)
///        │
///        ▼
///   ┌──────────┐
///   │   tree    │  pruned CART regression tree
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ segmenter  │  sample on a log grid → nodes + step values
///   └───────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ evaluator  │  local maxima → plateau walk → 3 criteria
///   └───────────┘
/// ```

pub mod evaluator;
pub mod plateau;
pub mod segmenter;
pub mod tree;
