//! Stored playlists: durable named playlists, one `.m3u` file each.
//!
//! The in-memory store and the playlist folder are kept consistent: every
//! mutating operation hits the filesystem first and only updates memory
//! once the file operation succeeded.

mod store;

pub use store::StoredPlaylistsController;
pub(crate) use store::Store;
