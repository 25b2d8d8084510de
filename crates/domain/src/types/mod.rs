//! Domain types and models

pub mod resource;
pub mod subscription;
pub mod sync;

pub use resource::ResourceId;
pub use subscription::{Subscription, WatchRegistration};
pub use sync::{ChangeItem, ChangePage, DiffEvent, DiffKind, ItemSnapshot, ItemStatus, SyncState};
