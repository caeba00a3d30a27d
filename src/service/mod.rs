//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, token, and media storage operations.

mod user;
mod video;

pub use user::{RegisterInput, UserService};
pub use video::{PublishInput, VideoService};
