use std::collections::HashMap;

use chrono::NaiveDate;
use quick_xml::{events::Event, Reader};
use rust_decimal::Decimal;

use crate::{Result, SteamError};

const MEMBER_SINCE_FORMAT: &str = "%B %d, %Y";

/// Raw field view over one profile feed document.
///
/// Holds the text of every direct child element of the feed root, plus the
/// children of the optional `inGameInfo` container. Every field is optional;
/// a missing element never aborts extraction of the rest, since the feed's
/// schema varies with the account's privacy setting.
#[derive(Debug, Default)]
pub struct ProfileDoc {
    fields: HashMap<String, String>,
    ingame: Option<HashMap<String, String>>,
}

impl ProfileDoc {
    pub fn parse(xml: &str) -> Result<ProfileDoc> {
        let mut reader = Reader::from_reader(xml.as_bytes());
        reader.config_mut().trim_text(true);

        let mut doc = ProfileDoc::default();
        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut leaf: Option<String> = None;
        let mut text = String::new();
        let mut in_ingame = false;
        let mut seen_root = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    // a child element under an open leaf makes it a container
                    leaf = None;
                    depth += 1;
                    seen_root = true;
                    let name =
                        String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if depth == 2 {
                        if name == "inGameInfo" {
                            in_ingame = true;
                            doc.ingame.get_or_insert_with(HashMap::new);
                        } else {
                            text.clear();
                            leaf = Some(name);
                        }
                    } else if depth == 3 && in_ingame {
                        text.clear();
                        leaf = Some(name);
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if leaf.is_some() {
                        let t = e.unescape().map_err(|_| SteamError::Parse)?;
                        text.push_str(&t);
                    }
                }
                Ok(Event::CData(e)) => {
                    if leaf.is_some() {
                        text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Ok(Event::End(_)) => {
                    if let Some(name) = leaf.take() {
                        let value = std::mem::take(&mut text);
                        let target = if in_ingame {
                            doc.ingame.get_or_insert_with(HashMap::new)
                        } else {
                            &mut doc.fields
                        };
                        // first occurrence wins, like a non-recursive find
                        target.entry(name).or_insert(value);
                    }
                    if in_ingame && depth == 2 {
                        in_ingame = false;
                    }
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(SteamError::Parse);
        }
        Ok(doc)
    }

    /// Raw text of a root-level element; empty elements count as absent.
    pub fn text(&self, elem: &str) -> Option<&str> {
        self.fields
            .get(elem)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn int(&self, elem: &str) -> Option<i64> {
        self.text(elem).and_then(|s| s.trim().parse().ok())
    }

    pub fn decimal(&self, elem: &str) -> Option<Decimal> {
        self.text(elem).and_then(|s| s.trim().parse().ok())
    }

    /// Service booleans are the literal "1".
    pub fn flag(&self, elem: &str) -> bool {
        self.text(elem).map(|s| s.trim() == "1").unwrap_or(false)
    }

    pub fn date(&self, elem: &str) -> Option<NaiveDate> {
        self.text(elem).and_then(|s| {
            NaiveDate::parse_from_str(s.trim(), MEMBER_SINCE_FORMAT).ok()
        })
    }

    /// Whether the feed reported the account as in-game.
    pub fn has_ingame(&self) -> bool {
        self.ingame.is_some()
    }

    /// Text of a child of the `inGameInfo` container.
    pub fn ingame_text(&self, elem: &str) -> Option<&str> {
        self.ingame
            .as_ref()
            .and_then(|m| m.get(elem))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<profile>
    <steamID64>76561197974079449</steamID64>
    <steamID><![CDATA[stoff3]]></steamID>
    <onlineState>in-game</onlineState>
    <privacyState>public</privacyState>
    <vicibilityState>3</vicibilityState>
    <avatarFull><![CDATA[http://media.steampowered.com/steamcommunity/public/images/avatars/f0/f0_full.jpg]]></avatarFull>
    <vacBanned>0</vacBanned>
    <inGameInfo>
        <gameName><![CDATA[Team Fortress 2]]></gameName>
        <gameLink><![CDATA[http://steamcommunity.com/app/440]]></gameLink>
        <inGameServerIP>192.0.2.44:27015</inGameServerIP>
    </inGameInfo>
    <customURL><![CDATA[stoff3]]></customURL>
    <memberSince>September 12, 2003</memberSince>
    <steamRating>7</steamRating>
    <hoursPlayed2Wk>1.5</hoursPlayed2Wk>
    <headline><![CDATA[hello & welcome]]></headline>
    <realname><![CDATA[Stoffe]]></realname>
    <summary><![CDATA[No information given.]]></summary>
    <mostPlayedGames>
        <mostPlayedGame>
            <gameName><![CDATA[Dota 2]]></gameName>
            <hoursPlayed>1.5</hoursPlayed>
        </mostPlayedGame>
    </mostPlayedGames>
</profile>"#;

    const PRIVATE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<profile>
    <steamID64>76561197960265729</steamID64>
    <steamID><![CDATA[quietOne]]></steamID>
    <privacyState>private</privacyState>
    <vicibilityState>1</vicibilityState>
    <vacBanned>1</vacBanned>
    <customURL></customURL>
</profile>"#;

    #[test]
    fn extracts_root_fields() {
        let doc = ProfileDoc::parse(FULL_FEED).unwrap();
        assert_eq!(doc.text("steamID64"), Some("76561197974079449"));
        assert_eq!(doc.text("steamID"), Some("stoff3"));
        assert_eq!(doc.text("privacyState"), Some("public"));
        assert_eq!(doc.text("vicibilityState"), Some("3"));
        assert_eq!(doc.text("customURL"), Some("stoff3"));
        assert_eq!(doc.text("realname"), Some("Stoffe"));
        assert_eq!(doc.text("headline"), Some("hello & welcome"));
        assert_eq!(doc.int("steamRating"), Some(7));
    }

    #[test]
    fn missing_fields_yield_none_without_aborting() {
        let doc = ProfileDoc::parse(PRIVATE_FEED).unwrap();
        assert_eq!(doc.text("headline"), None);
        assert_eq!(doc.text("realname"), None);
        assert_eq!(doc.int("steamRating"), None);
        assert_eq!(doc.decimal("hoursPlayed2Wk"), None);
        assert_eq!(doc.date("memberSince"), None);
        // fields around the missing ones still come through
        assert_eq!(doc.text("steamID"), Some("quietOne"));
        assert_eq!(doc.text("privacyState"), Some("private"));
    }

    #[test]
    fn empty_element_counts_as_absent() {
        let doc = ProfileDoc::parse(PRIVATE_FEED).unwrap();
        assert_eq!(doc.text("customURL"), None);
    }

    #[test]
    fn ingame_container_present() {
        let doc = ProfileDoc::parse(FULL_FEED).unwrap();
        assert!(doc.has_ingame());
        assert_eq!(doc.ingame_text("gameName"), Some("Team Fortress 2"));
        assert_eq!(
            doc.ingame_text("gameLink"),
            Some("http://steamcommunity.com/app/440")
        );
        assert_eq!(doc.ingame_text("inGameServerIP"), Some("192.0.2.44:27015"));
    }

    #[test]
    fn ingame_container_absent() {
        let doc = ProfileDoc::parse(PRIVATE_FEED).unwrap();
        assert!(!doc.has_ingame());
        assert_eq!(doc.ingame_text("gameName"), None);
    }

    #[test]
    fn nested_containers_do_not_leak_into_root_fields() {
        let doc = ProfileDoc::parse(FULL_FEED).unwrap();
        // gameName lives under inGameInfo and mostPlayedGames, not the root
        assert_eq!(doc.text("gameName"), None);
        assert_eq!(doc.text("hoursPlayed"), None);
    }

    #[test]
    fn flag_is_strict_string_compare() {
        let full = ProfileDoc::parse(FULL_FEED).unwrap();
        assert!(!full.flag("vacBanned"));
        let banned = ProfileDoc::parse(PRIVATE_FEED).unwrap();
        assert!(banned.flag("vacBanned"));
        // absent flag reads false
        assert!(!full.flag("noSuchFlag"));
    }

    #[test]
    fn date_parses_month_day_year() {
        let doc = ProfileDoc::parse(FULL_FEED).unwrap();
        assert_eq!(
            doc.date("memberSince"),
            NaiveDate::from_ymd_opt(2003, 9, 12)
        );
    }

    #[test]
    fn hours_are_exact_decimals() {
        let doc = ProfileDoc::parse(FULL_FEED).unwrap();
        let hours = doc.decimal("hoursPlayed2Wk").unwrap();
        assert_eq!(hours, "1.5".parse::<Decimal>().unwrap());

        // repeated small increments must not drift the way floats do
        let tenth = "0.1".parse::<Decimal>().unwrap();
        let mut total = hours;
        for _ in 0..10 {
            total += tenth;
        }
        assert_eq!(total, "2.5".parse::<Decimal>().unwrap());
    }

    #[test]
    fn entity_escaped_text_is_unescaped() {
        let xml = r#"<profile><headline>a &amp; b</headline></profile>"#;
        let doc = ProfileDoc::parse(xml).unwrap();
        assert_eq!(doc.text("headline"), Some("a & b"));
    }

    #[test]
    fn non_xml_body_is_a_parse_error() {
        assert!(matches!(
            ProfileDoc::parse("sorry, something went wrong"),
            Err(SteamError::Parse)
        ));
        assert!(matches!(ProfileDoc::parse(""), Err(SteamError::Parse)));
    }
}
