use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Offset between an account number and its 64-bit id. Both directions of
/// the legacy conversion depend on this exact value.
pub const STEAMID64_BASE: u64 = 76561197960265728;

lazy_static! {
    static ref STEAM2_RE: Regex =
        Regex::new(r"(?i)^STEAM_([0-1]):([0-1]):([0-9]+)$").unwrap();
    static ref ID64_RE: Regex = Regex::new(r"\b([0-9]{17})\b").unwrap();
    static ref VANITY_RE: Regex = Regex::new(r"/id/([^/?#]+)").unwrap();
}

/// Canonical account identifier: either the 64-bit numeric id or the
/// user-chosen vanity name the service maps to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SteamId {
    Id64(u64),
    Vanity(String),
}

impl SteamId {
    /// Normalize arbitrary user input into one of the two identifier forms.
    ///
    /// Accepts a plain numeric id, the legacy `STEAM_X:Y:Z` encoding, a
    /// profile URL (`/profiles/<id64>` or `/id/<name>`) or a raw vanity
    /// name. Never fails: anything unrecognized is taken as a vanity name
    /// and invalid identifiers surface later, when the fetch fails.
    pub fn resolve(input: &str) -> SteamId {
        let input = input.trim();

        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = input.parse::<u64>() {
                return SteamId::Id64(id);
            }
        }

        if let Some(caps) = STEAM2_RE.captures(input) {
            // STEAM_X:Y:Z, the universe X is ignored by the service
            let type_bit: u64 = caps[2].parse().unwrap_or(0);
            if let Ok(account) = caps[3].parse::<u64>() {
                return SteamId::Id64(account * 2 + type_bit + STEAMID64_BASE);
            }
        }

        if let Some(caps) = ID64_RE.captures(input) {
            if let Ok(id) = caps[1].parse::<u64>() {
                log::trace!("extracted id64 {} from {}", id, input);
                return SteamId::Id64(id);
            }
        }

        if let Some(caps) = VANITY_RE.captures(input) {
            return SteamId::Vanity(caps[1].to_string());
        }

        let name = input.split('?').next().unwrap_or(input);
        let name = name.split('#').next().unwrap_or(name);
        let name = name.trim_matches('/');
        let name = name.rsplit('/').next().unwrap_or(name);
        SteamId::Vanity(name.to_string())
    }

    /// Legacy `STEAM_0:Y:Z` rendering; only numeric ids have one.
    pub fn steam2(&self) -> Option<String> {
        match self {
            SteamId::Id64(id) => Some(steam2_of(*id)),
            SteamId::Vanity(_) => None,
        }
    }
}

/// Derive the legacy colon-delimited id from a 64-bit id.
pub fn steam2_of(id64: u64) -> String {
    let offset = id64.saturating_sub(STEAMID64_BASE);
    format!("STEAM_0:{}:{}", offset % 2, offset / 2)
}

impl From<u64> for SteamId {
    fn from(id: u64) -> Self {
        SteamId::Id64(id)
    }
}

impl From<&str> for SteamId {
    fn from(input: &str) -> Self {
        SteamId::resolve(input)
    }
}

impl From<String> for SteamId {
    fn from(input: String) -> Self {
        SteamId::resolve(&input)
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SteamId::Id64(id) => write!(f, "{}", id),
            SteamId::Vanity(name) => f.write_str(name),
        }
    }
}
