use thiserror::Error;

pub type Result<T> = std::result::Result<T, SteamError>;

#[derive(Error, Debug)]
pub enum SteamError {
    /// Reserved for identifiers that resolve to neither form. Resolution
    /// currently falls back to a vanity name, so this only surfaces when a
    /// record ends up with no identifier at all.
    #[error("Malformed identifier: {0}")]
    MalformedId(String),
    #[error("Unable to connect to steamcommunity.com: {0}")]
    ServiceUnavailable(String),
    #[error("Search request failed: {0}")]
    SearchFailed(String),
    #[error("Parsing error")]
    Parse,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<quick_xml::Error> for SteamError {
    fn from(_: quick_xml::Error) -> Self {
        Self::Parse
    }
}
