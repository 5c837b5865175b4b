mod task;
mod user;

pub use task::*;
pub use user::*;

/// Anything the client lists and reconciles by id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Fresh client-side id for a new entity.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
