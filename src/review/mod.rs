//! Review moderation core: proof policy, lifecycle, drafts and client actions.
pub mod actions;
pub mod content_filter;
pub mod draft;
pub mod lifecycle;
pub mod proof;
pub mod trust;
