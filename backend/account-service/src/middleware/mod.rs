pub mod identity;

pub use identity::{resolve_identity, CurrentUser};
