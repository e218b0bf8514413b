pub mod media;
pub mod policy;
pub mod progress;
pub mod reconcile;
pub mod tree;
