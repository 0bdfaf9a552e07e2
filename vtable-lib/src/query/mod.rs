//! Filtering, ordering and pagination engines.
//!
//! These are the leaf stages the [`Store`](crate::Store) runs, in this fixed
//! order, on every recompute:
//!
//! - [`FilterSet`] - named filters, all of which must match
//! - [`SortSpec`] - stable ordering by key or custom comparator
//! - [`paginate`] - slicing the ordered rows into a [`PageSlice`]

mod filter;
mod order;
mod page;

pub use filter::BasicFilter;
pub use filter::CustomFilter;
pub use filter::Filter;
pub use filter::FilterSet;
pub use filter::PredicateFn;
pub use order::ComparatorFn;
pub use order::CustomSort;
pub use order::ExtractorFn;
pub use order::SortKey;
pub use order::SortOrder;
pub use order::SortSpec;
pub use page::PageSlice;
pub use page::Pagination;
pub use page::paginate;
