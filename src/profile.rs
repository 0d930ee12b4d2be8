use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::id::{steam2_of, SteamId};
use crate::transport::{HttpTransport, Transport};
use crate::xml::ProfileDoc;
use crate::{Result, SteamError, STEAM_COMMUNITY_URL};

/// Where a record stands in its fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Unfetched,
    Fetching,
    Populated,
    Failed,
}

/// Details of the game an account is currently playing. Empty unless the
/// feed carried an `inGameInfo` container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InGameInfo {
    pub server_ip: Option<String>,
    pub game_name: Option<String>,
    pub game_link: Option<String>,
}

#[derive(Debug, Clone)]
enum Failure {
    Service(String),
    Parse,
}

impl Failure {
    fn to_error(&self) -> SteamError {
        match self {
            Failure::Service(reason) => {
                SteamError::ServiceUnavailable(reason.clone())
            }
            Failure::Parse => SteamError::Parse,
        }
    }
}

/// One community profile.
///
/// A record is either fetched eagerly ([`Profile::fetch`]) or lazily
/// ([`Profile::lazy`]). On a lazy record the first getter call performs the
/// network round trip, so every getter is `&mut self`, may block, and may
/// fail. The exclusive borrow doubles as the single-fetch guard: two threads
/// cannot race the `Unfetched` state through a shared reference.
///
/// A failed fetch is sticky. Getters keep returning the recorded error until
/// [`Profile::refetch`] is called; they never retry on their own.
pub struct Profile {
    transport: Arc<dyn Transport>,
    state: FetchState,
    failure: Option<Failure>,

    steamid64: Option<u64>,
    steamid: Option<String>,
    custom_url: Option<String>,
    name: Option<String>,
    privacy_state: Option<String>,
    visibility_state: Option<String>,
    vac_banned: bool,
    ingame: bool,
    ingame_info: InGameInfo,
    member_since: Option<NaiveDate>,
    steam_rating: u32,
    hours_played_2wk: Decimal,
    headline: Option<String>,
    real_name: Option<String>,
    summary: Option<String>,
    avatar: Option<String>,
}

impl Profile {
    /// Construct and immediately fetch a profile.
    pub fn fetch(id: impl Into<SteamId>) -> Result<Profile> {
        Self::fetch_with(id, Arc::new(HttpTransport))
    }

    /// Eager construction over a caller-supplied transport.
    pub fn fetch_with(
        id: impl Into<SteamId>,
        transport: Arc<dyn Transport>,
    ) -> Result<Profile> {
        let mut profile = Self::lazy_with(id, transport);
        profile.load()?;
        Ok(profile)
    }

    /// Construct without fetching; the first field read will fetch.
    pub fn lazy(id: impl Into<SteamId>) -> Profile {
        Self::lazy_with(id, Arc::new(HttpTransport))
    }

    /// Lazy construction over a caller-supplied transport.
    pub fn lazy_with(
        id: impl Into<SteamId>,
        transport: Arc<dyn Transport>,
    ) -> Profile {
        let mut profile = Profile {
            transport,
            state: FetchState::Unfetched,
            failure: None,
            steamid64: None,
            steamid: None,
            custom_url: None,
            name: None,
            privacy_state: None,
            visibility_state: None,
            vac_banned: false,
            ingame: false,
            ingame_info: InGameInfo::default(),
            member_since: None,
            steam_rating: 0,
            hours_played_2wk: Decimal::ZERO,
            headline: None,
            real_name: None,
            summary: None,
            avatar: None,
        };
        match id.into() {
            SteamId::Id64(id64) => profile.steamid64 = Some(id64),
            SteamId::Vanity(name) => profile.custom_url = Some(name),
        }
        profile
    }

    /// Pre-set the display name on an unfetched record, e.g. from a search
    /// hit. The value is overwritten by the real one once a fetch runs.
    pub fn seed_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Current lifecycle state; never triggers a fetch.
    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Drop any previous result and fetch again. This is the only path that
    /// retries a failed record.
    pub fn refetch(&mut self) -> Result<()> {
        self.failure = None;
        self.state = FetchState::Unfetched;
        self.load()
    }

    pub fn steamid64(&mut self) -> Result<Option<u64>> {
        self.ensure_loaded()?;
        Ok(self.steamid64)
    }

    /// Legacy `STEAM_0:Y:Z` identifier, derived from the 64-bit id when the
    /// feed does not supply one.
    pub fn steamid(&mut self) -> Result<Option<String>> {
        self.ensure_loaded()?;
        Ok(self.steamid.clone())
    }

    pub fn custom_url(&mut self) -> Result<Option<String>> {
        self.ensure_loaded()?;
        Ok(self.custom_url.clone())
    }

    /// Display name.
    pub fn name(&mut self) -> Result<Option<String>> {
        self.ensure_loaded()?;
        Ok(self.name.clone())
    }

    pub fn privacy_state(&mut self) -> Result<Option<String>> {
        self.ensure_loaded()?;
        Ok(self.privacy_state.clone())
    }

    pub fn visibility_state(&mut self) -> Result<Option<String>> {
        self.ensure_loaded()?;
        Ok(self.visibility_state.clone())
    }

    pub fn vac_banned(&mut self) -> Result<bool> {
        self.ensure_loaded()?;
        Ok(self.vac_banned)
    }

    pub fn ingame(&mut self) -> Result<bool> {
        self.ensure_loaded()?;
        Ok(self.ingame)
    }

    pub fn ingame_info(&mut self) -> Result<InGameInfo> {
        self.ensure_loaded()?;
        Ok(self.ingame_info.clone())
    }

    pub fn member_since(&mut self) -> Result<Option<NaiveDate>> {
        self.ensure_loaded()?;
        Ok(self.member_since)
    }

    pub fn steam_rating(&mut self) -> Result<u32> {
        self.ensure_loaded()?;
        Ok(self.steam_rating)
    }

    pub fn hours_played_2wk(&mut self) -> Result<Decimal> {
        self.ensure_loaded()?;
        Ok(self.hours_played_2wk)
    }

    pub fn headline(&mut self) -> Result<Option<String>> {
        self.ensure_loaded()?;
        Ok(self.headline.clone())
    }

    pub fn real_name(&mut self) -> Result<Option<String>> {
        self.ensure_loaded()?;
        Ok(self.real_name.clone())
    }

    pub fn summary(&mut self) -> Result<Option<String>> {
        self.ensure_loaded()?;
        Ok(self.summary.clone())
    }

    pub fn avatar(&mut self) -> Result<Option<String>> {
        self.ensure_loaded()?;
        Ok(self.avatar.clone())
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        match self.state {
            FetchState::Populated | FetchState::Fetching => Ok(()),
            FetchState::Unfetched => self.load(),
            FetchState::Failed => match &self.failure {
                Some(failure) => Err(failure.to_error()),
                None => Err(SteamError::ServiceUnavailable(
                    "profile fetch failed".to_string(),
                )),
            },
        }
    }

    fn load(&mut self) -> Result<()> {
        self.state = FetchState::Fetching;

        let url = match (self.steamid64, &self.custom_url) {
            (Some(id64), _) => {
                format!("{}/profiles/{}?xml=1", STEAM_COMMUNITY_URL, id64)
            }
            (None, Some(name)) => {
                format!("{}/id/{}?xml=1", STEAM_COMMUNITY_URL, name)
            }
            (None, None) => {
                self.state = FetchState::Failed;
                let reason = "record has no identifier".to_string();
                self.failure = Some(Failure::Service(reason.clone()));
                return Err(SteamError::MalformedId(reason));
            }
        };

        log::debug!("fetching profile feed: {}", url);
        let body = match self.transport.fetch(&url) {
            Ok(body) => body,
            Err(e) => {
                let reason = e.to_string();
                log::debug!("profile fetch failed: {}", reason);
                self.state = FetchState::Failed;
                self.failure = Some(Failure::Service(reason.clone()));
                return Err(SteamError::ServiceUnavailable(reason));
            }
        };

        let doc = match ProfileDoc::parse(&body) {
            Ok(doc) => doc,
            Err(e) => {
                self.state = FetchState::Failed;
                self.failure = Some(Failure::Parse);
                return Err(e);
            }
        };

        self.populate(&doc);
        self.state = FetchState::Populated;
        Ok(())
        // doc is dropped here; the parsed tree is never kept on the record
    }

    fn populate(&mut self, doc: &ProfileDoc) {
        if let Some(id64) = doc.int("steamID64") {
            self.steamid64 = Some(id64 as u64);
        }
        if let Some(url) = doc.text("customURL") {
            self.custom_url = Some(url.to_string());
        }
        self.name = doc.text("steamID").map(str::to_string);
        self.privacy_state = doc.text("privacyState").map(str::to_string);
        // the feed misspells "visibility"
        self.visibility_state =
            doc.text("vicibilityState").map(str::to_string);
        self.vac_banned = doc.flag("vacBanned");

        self.ingame = doc.has_ingame();
        self.ingame_info = if self.ingame {
            InGameInfo {
                server_ip: doc.ingame_text("inGameServerIP").map(str::to_string),
                game_name: doc.ingame_text("gameName").map(str::to_string),
                game_link: doc.ingame_text("gameLink").map(str::to_string),
            }
        } else {
            InGameInfo::default()
        };

        self.member_since = doc.date("memberSince");
        self.steam_rating = doc
            .int("steamRating")
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);
        self.hours_played_2wk =
            doc.decimal("hoursPlayed2Wk").unwrap_or(Decimal::ZERO);
        self.headline = doc.text("headline").map(str::to_string);
        self.real_name = doc.text("realname").map(str::to_string);
        self.summary = doc.text("summary").map(str::to_string);
        self.avatar = doc.text("avatarFull").map(str::to_string);

        if self.steamid.is_none() {
            if let Some(id64) = self.steamid64 {
                self.steamid = Some(steam2_of(id64));
            }
        }
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("state", &self.state)
            .field("steamid64", &self.steamid64)
            .field("steamid", &self.steamid)
            .field("custom_url", &self.custom_url)
            .field("name", &self.name)
            .field("vac_banned", &self.vac_banned)
            .field("ingame", &self.ingame)
            .finish()
    }
}
