pub mod plan_store;

pub use plan_store::{PlanStore, StoreError, STORAGE_KEY};
