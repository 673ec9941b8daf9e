//! Shopping cart module.
//!
//! Contains the line item state, the persisted store and change events.

mod events;
mod state;
mod store;

pub use events::{CartEvent, ChangeNotifier, Subscription};
pub use state::{CartChange, CartState, LineItem, Normalization, MAX_QUANTITY_PER_ITEM};
pub use store::{CartStore, DEFAULT_STORAGE_KEY};
