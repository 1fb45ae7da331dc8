/// Data layer: core types, loading, and the filter/reshape pipeline.
///
/// Architecture:
/// ```text
///  .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → CourseDataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ CourseDataset  │  Vec<CourseRecord>, named Schema
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline  │  grade filter → counts / slice → melt
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod pipeline;
