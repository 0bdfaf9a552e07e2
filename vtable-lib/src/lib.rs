//! Reactive table state library
//!
//! Holds the inputs of a data table (rows, filters, sort, pagination and
//! selection) and derives the visible page from them, re-deriving
//! synchronously whenever an input changes.

pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod query;
pub mod selection;
pub mod state;
pub mod store;
pub mod sync;

pub use config::SortIconPosition;
pub use config::TableConfig;
pub use config::TableOptions;
pub use error::TableError;
pub use notify::SubscriptionId;
pub use notify::TableEvent;
pub use selection::SelectionMode;
pub use state::TableState;
pub use store::RevealTarget;
pub use store::Store;
pub use sync::Change;
pub use sync::ListenerId;
pub use sync::Prop;
