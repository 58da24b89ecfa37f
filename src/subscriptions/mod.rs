mod service;
mod sqlite_store;
mod store;

pub use service::{ConfirmationOutcome, PendingSubscription, SubscriptionError, SubscriptionService};
pub use sqlite_store::SqliteSubscriptionStore;
pub use store::{StoreError, SubscriptionStore};
