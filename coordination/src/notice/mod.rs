//! Notice tracking: identities, change detection, and the dedup baseline
//!
//! A notice is new exactly when its identity is missing from the stored
//! baseline. Separately, a fingerprint over the whole set catches edits
//! and removals that produce nothing new, so the baseline can follow the
//! board without announcing anything.

pub mod detector;
pub mod store;
pub mod types;

pub use detector::{ChangeDetector, ChangeSet};
pub use store::NoticeStore;
pub use types::{content_fingerprint, notice_id, Notice};
