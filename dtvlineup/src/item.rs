//! Timed items: the unit every lineup operation works on
//!
//! A lineup is an ordered `Vec<TimedItem>`. Each variant carries exactly the
//! metadata that makes sense for it, so the ordering code matches on the kind
//! instead of probing for optional fields.
//!
//! The serde representation mirrors the scheduling server's program JSON
//! (`type` tag, `duration`, `ratingKey`, `showTitle`, `date`, `channel`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminator of a [`TimedItem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Movie,
    Episode,
    Track,
    Redirect,
    Offline,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Movie => "movie",
            ItemKind::Episode => "episode",
            ItemKind::Track => "track",
            ItemKind::Redirect => "redirect",
            ItemKind::Offline => "offline",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movie or music track metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Catalog key used for de-duplication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_key: Option<String>,
    /// ISO `YYYY-MM-DD` release date
    #[serde(rename = "date", default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// Episode of a show
///
/// `season` and `episode` are optional because the upstream catalog does not
/// always provide them; an episode lacking either is not grouped by show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_key: Option<String>,
    #[serde(rename = "date", default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    pub show_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

/// Hand-off to another channel for `duration_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    pub channel: u32,
}

/// Synthetic dead air / flex time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflinePad {
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

/// Identity used by the de-duplication operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKey<'a> {
    /// Catalog (rating) key of a program
    Catalog(&'a str),
    /// Target channel number of a redirect
    Channel(u32),
}

/// One entry of a lineup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TimedItem {
    Movie(Media),
    Episode(Episode),
    Track(Media),
    Redirect(Redirect),
    Offline(OfflinePad),
}

impl TimedItem {
    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn movie(title: impl Into<String>, duration_ms: u64) -> Self {
        TimedItem::Movie(Media {
            duration_ms,
            title: Some(title.into()),
            ..Media::default()
        })
    }

    pub fn track(title: impl Into<String>, duration_ms: u64) -> Self {
        TimedItem::Track(Media {
            duration_ms,
            title: Some(title.into()),
            ..Media::default()
        })
    }

    pub fn episode(show_title: impl Into<String>, season: u32, episode: u32, duration_ms: u64) -> Self {
        TimedItem::Episode(Episode {
            duration_ms,
            show_title: show_title.into(),
            season: Some(season),
            episode: Some(episode),
            ..Episode::default()
        })
    }

    pub fn redirect(channel: u32, duration_ms: u64) -> Self {
        TimedItem::Redirect(Redirect {
            duration_ms,
            channel,
        })
    }

    pub fn offline(duration_ms: u64) -> Self {
        TimedItem::Offline(OfflinePad { duration_ms })
    }

    /// Sets the catalog key (no-op on redirects and pads)
    pub fn with_rating_key(mut self, key: impl Into<String>) -> Self {
        match &mut self {
            TimedItem::Movie(m) | TimedItem::Track(m) => m.rating_key = Some(key.into()),
            TimedItem::Episode(e) => e.rating_key = Some(key.into()),
            TimedItem::Redirect(_) | TimedItem::Offline(_) => {}
        }
        self
    }

    /// Sets the release date (no-op on redirects and pads)
    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        match &mut self {
            TimedItem::Movie(m) | TimedItem::Track(m) => m.release_date = Some(date.into()),
            TimedItem::Episode(e) => e.release_date = Some(date.into()),
            TimedItem::Redirect(_) | TimedItem::Offline(_) => {}
        }
        self
    }

    /// Sets the item title (episode title for episodes)
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        match &mut self {
            TimedItem::Movie(m) | TimedItem::Track(m) => m.title = Some(title.into()),
            TimedItem::Episode(e) => e.title = Some(title.into()),
            TimedItem::Redirect(_) | TimedItem::Offline(_) => {}
        }
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn kind(&self) -> ItemKind {
        match self {
            TimedItem::Movie(_) => ItemKind::Movie,
            TimedItem::Episode(_) => ItemKind::Episode,
            TimedItem::Track(_) => ItemKind::Track,
            TimedItem::Redirect(_) => ItemKind::Redirect,
            TimedItem::Offline(_) => ItemKind::Offline,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        match self {
            TimedItem::Movie(m) | TimedItem::Track(m) => m.duration_ms,
            TimedItem::Episode(e) => e.duration_ms,
            TimedItem::Redirect(r) => r.duration_ms,
            TimedItem::Offline(p) => p.duration_ms,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            TimedItem::Movie(m) | TimedItem::Track(m) => m.title.as_deref(),
            TimedItem::Episode(e) => e.title.as_deref(),
            TimedItem::Redirect(_) | TimedItem::Offline(_) => None,
        }
    }

    /// Key used by alphabetical ordering: show title for episodes, title otherwise
    pub fn sort_title(&self) -> Option<&str> {
        match self {
            TimedItem::Episode(e) => Some(e.show_title.as_str()),
            other => other.title(),
        }
    }

    pub fn rating_key(&self) -> Option<&str> {
        match self {
            TimedItem::Movie(m) | TimedItem::Track(m) => m.rating_key.as_deref(),
            TimedItem::Episode(e) => e.rating_key.as_deref(),
            TimedItem::Redirect(_) | TimedItem::Offline(_) => None,
        }
    }

    pub fn release_date(&self) -> Option<&str> {
        match self {
            TimedItem::Movie(m) | TimedItem::Track(m) => m.release_date.as_deref(),
            TimedItem::Episode(e) => e.release_date.as_deref(),
            TimedItem::Redirect(_) | TimedItem::Offline(_) => None,
        }
    }

    /// De-duplication identity: catalog key for programs, target channel for redirects
    pub fn identity_key(&self) -> Option<IdentityKey<'_>> {
        match self {
            TimedItem::Redirect(r) => Some(IdentityKey::Channel(r.channel)),
            other => other.rating_key().map(IdentityKey::Catalog),
        }
    }

    pub fn show_title(&self) -> Option<&str> {
        match self {
            TimedItem::Episode(e) => Some(e.show_title.as_str()),
            _ => None,
        }
    }

    pub fn season(&self) -> Option<u32> {
        match self {
            TimedItem::Episode(e) => e.season,
            _ => None,
        }
    }

    pub fn episode_number(&self) -> Option<u32> {
        match self {
            TimedItem::Episode(e) => e.episode,
            _ => None,
        }
    }

    /// `(show, season, episode)` when the item can be placed in a show grouping
    pub fn show_slot(&self) -> Option<(&str, u32, u32)> {
        match self {
            TimedItem::Episode(Episode {
                show_title,
                season: Some(season),
                episode: Some(episode),
                ..
            }) => Some((show_title.as_str(), *season, *episode)),
            _ => None,
        }
    }

    pub fn redirect_channel(&self) -> Option<u32> {
        match self {
            TimedItem::Redirect(r) => Some(r.channel),
            _ => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, TimedItem::Redirect(_))
    }

    /// `true` for synthetic offline padding
    pub fn is_offline_pad(&self) -> bool {
        matches!(self, TimedItem::Offline(_))
    }

    /// Offline flag as the scheduling server records it (pads and redirects)
    pub fn is_offline(&self) -> bool {
        matches!(self, TimedItem::Offline(_) | TimedItem::Redirect(_))
    }
}

impl fmt::Display for TimedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimedItem::Episode(e) => {
                write!(f, "{}", e.show_title)?;
                if let (Some(season), Some(episode)) = (e.season, e.episode) {
                    write!(f, " - s{}e{}", season, episode)?;
                }
                if let Some(title) = &e.title {
                    write!(f, " - {}", title)?;
                }
                Ok(())
            }
            TimedItem::Movie(m) | TimedItem::Track(m) => {
                f.write_str(m.title.as_deref().unwrap_or("(untitled)"))
            }
            TimedItem::Redirect(r) => write!(f, "Redirect(#{})", r.channel),
            TimedItem::Offline(p) => write!(f, "Offline({} ms)", p.duration_ms),
        }
    }
}

/// Sum of item durations in milliseconds
pub fn total_duration_ms(items: &[TimedItem]) -> u64 {
    items.iter().map(TimedItem::duration_ms).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_episode_accessors() {
        let ep = TimedItem::episode("Cheers", 2, 5, 1_320_000)
            .with_title("Coach's Daughter")
            .with_rating_key("4411");

        assert_eq!(ep.kind(), ItemKind::Episode);
        assert_eq!(ep.sort_title(), Some("Cheers"));
        assert_eq!(ep.title(), Some("Coach's Daughter"));
        assert_eq!(ep.show_slot(), Some(("Cheers", 2, 5)));
        assert_eq!(ep.identity_key(), Some(IdentityKey::Catalog("4411")));
        assert_eq!(ep.to_string(), "Cheers - s2e5 - Coach's Daughter");
    }

    #[test]
    fn test_redirect_identity_is_channel() {
        let redirect = TimedItem::redirect(7, 3_600_000);
        assert!(redirect.is_redirect());
        assert!(redirect.is_offline());
        assert!(!redirect.is_offline_pad());
        assert_eq!(redirect.title(), None);
        assert_eq!(redirect.identity_key(), Some(IdentityKey::Channel(7)));
    }

    #[test]
    fn test_episode_without_numbers_has_no_slot() {
        let item = TimedItem::Episode(Episode {
            duration_ms: 1000,
            show_title: "Loose".into(),
            season: Some(1),
            ..Episode::default()
        });
        assert_eq!(item.show_slot(), None);
        assert_eq!(item.show_title(), Some("Loose"));
    }

    #[test]
    fn test_deserialize_server_program_json() {
        let raw = json!([
            {
                "type": "episode",
                "duration": 1800000,
                "title": "Pilot",
                "ratingKey": "101",
                "showTitle": "X",
                "season": 1,
                "episode": 1,
                "date": "1999-09-01"
            },
            { "type": "movie", "duration": 5400000, "title": "Heat" },
            { "type": "redirect", "duration": 3600000, "channel": 4 },
            { "type": "offline", "duration": 60000 }
        ]);

        let items: Vec<TimedItem> = serde_json::from_value(raw).unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].show_slot(), Some(("X", 1, 1)));
        assert_eq!(items[0].release_date(), Some("1999-09-01"));
        assert_eq!(items[1].kind(), ItemKind::Movie);
        assert_eq!(items[2].redirect_channel(), Some(4));
        assert!(items[3].is_offline_pad());
        assert_eq!(total_duration_ms(&items), 1_800_000 + 5_400_000 + 3_600_000 + 60_000);

        let back = serde_json::to_value(&items[2]).unwrap();
        assert_eq!(back, json!({ "type": "redirect", "duration": 3600000, "channel": 4 }));
    }
}
