pub mod cache;

pub use cache::{BenchmarkCatalog, CatalogCache, CatalogSnapshot};
