//! Recipient module
//!
//! Addressable peers an upload can be targeted at, the client-side
//! selection that survives directory refreshes, and the server-side
//! registry of recently seen addresses.

pub mod directory;
pub mod registry;
pub mod target;

pub use directory::RecipientDirectory;
pub use registry::{PeerRegistry, DEFAULT_PEER_TIMEOUT};
pub use target::{RecipientTarget, EVERYONE};
