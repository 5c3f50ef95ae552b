/// State management module
/// 
/// This module handles state that outlives a single page view:
/// - Per-session key/value storage (session.rs)
/// - Badge rotation position and its timer (badge.rs)
/// - Static project records and category filtering (projects.rs)

pub mod session;
pub mod badge;
pub mod projects;

pub use badge::{BadgeRotationScheduler, BadgeRotationState, Clock, RotationHandle, SystemClock};
pub use projects::{filter_by_category, CategorySelection, ProjectRecord};
pub use session::{SessionStore, SqliteSessionStore};
