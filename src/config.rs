//! Backend settings: schema types plus file/environment loading.
//!
//! Settings locate the playlist folder and the library inputs; they are
//! read once and handed to [`crate::backend::Backend::new`].

mod load;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use schema::*;

#[cfg(test)]
mod tests;
