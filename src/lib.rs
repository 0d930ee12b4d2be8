#[macro_use]
extern crate lazy_static;

pub mod errors;
pub mod id;
pub mod profile;
pub mod search;
pub mod transport;
pub mod xml;

pub use errors::{Result, SteamError};
pub use id::{steam2_of, SteamId, STEAMID64_BASE};
pub use profile::{FetchState, InGameInfo, Profile};
pub use search::{search, search_with};
pub use transport::{HttpTransport, Transport, TransportError};

/// Base URL of the community service.
pub const STEAM_COMMUNITY_URL: &str = "http://steamcommunity.com";
