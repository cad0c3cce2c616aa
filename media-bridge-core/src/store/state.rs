//! Media State
//!
//! A [`MediaState`] is one snapshot of everything the store knows about
//! playback, keyed by the names in [`names`]. Snapshots are shared as
//! `Arc<MediaState>` and never mutated once published; a store that
//! changes anything publishes a new `Arc`.
//!
//! Values are dynamic ([`MediaValue`]) because the set of keys belongs to
//! the store, not to this crate. The typed accessors return `None` for a
//! missing key or a value of the wrong shape, so selectors can run against
//! partial or empty snapshots.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::handle::HostHandle;
use crate::error::Result;

/// Names of the state keys published by a media store.
pub mod names {
    pub const MEDIA_AIRPLAY_UNAVAILABLE: &str = "mediaAirplayUnavailable";
    pub const MEDIA_AUDIO_TRACK_ENABLED: &str = "mediaAudioTrackEnabled";
    pub const MEDIA_AUDIO_TRACK_LIST: &str = "mediaAudioTrackList";
    pub const MEDIA_BUFFERED: &str = "mediaBuffered";
    pub const MEDIA_CAST_UNAVAILABLE: &str = "mediaCastUnavailable";
    pub const MEDIA_CURRENT_TIME: &str = "mediaCurrentTime";
    pub const MEDIA_DURATION: &str = "mediaDuration";
    pub const MEDIA_ENDED: &str = "mediaEnded";
    pub const MEDIA_FULLSCREEN_UNAVAILABLE: &str = "mediaFullscreenUnavailable";
    pub const MEDIA_HAS_PLAYED: &str = "mediaHasPlayed";
    pub const MEDIA_IS_AIRPLAYING: &str = "mediaIsAirplaying";
    pub const MEDIA_IS_CASTING: &str = "mediaIsCasting";
    pub const MEDIA_IS_FULLSCREEN: &str = "mediaIsFullscreen";
    pub const MEDIA_IS_PIP: &str = "mediaIsPip";
    pub const MEDIA_LOADING: &str = "mediaLoading";
    pub const MEDIA_MUTED: &str = "mediaMuted";
    pub const MEDIA_PAUSED: &str = "mediaPaused";
    pub const MEDIA_PIP_UNAVAILABLE: &str = "mediaPipUnavailable";
    pub const MEDIA_PLAYBACK_RATE: &str = "mediaPlaybackRate";
    pub const MEDIA_PREVIEW_TIME: &str = "mediaPreviewTime";
    pub const MEDIA_RENDITION_LIST: &str = "mediaRenditionList";
    pub const MEDIA_RENDITION_SELECTED: &str = "mediaRenditionSelected";
    pub const MEDIA_SEEKABLE: &str = "mediaSeekable";
    pub const MEDIA_STREAM_TYPE: &str = "mediaStreamType";
    pub const MEDIA_SUBTITLES_LIST: &str = "mediaSubtitlesList";
    pub const MEDIA_SUBTITLES_SHOWING: &str = "mediaSubtitlesShowing";
    pub const MEDIA_TARGET_LIVE_WINDOW: &str = "mediaTargetLiveWindow";
    pub const MEDIA_TIME_IS_LIVE: &str = "mediaTimeIsLive";
    pub const MEDIA_VOLUME: &str = "mediaVolume";
    pub const MEDIA_VOLUME_LEVEL: &str = "mediaVolumeLevel";
    pub const MEDIA_VOLUME_UNAVAILABLE: &str = "mediaVolumeUnavailable";
}

/// A dynamically typed state value.
///
/// `Number` may hold NaN; a duration is NaN until metadata loads. The
/// derived `PartialEq` is IEEE equality. Selection comparison uses
/// [`SameValue`](crate::select::SameValue) instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<MediaValue>),
    Map(IndexMap<String, MediaValue>),
}

impl MediaValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MediaValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MediaValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MediaValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MediaValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MediaValue]> {
        match self {
            MediaValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, MediaValue>> {
        match self {
            MediaValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for MediaValue {
    fn from(value: bool) -> Self {
        MediaValue::Bool(value)
    }
}

impl From<f64> for MediaValue {
    fn from(value: f64) -> Self {
        MediaValue::Number(value)
    }
}

impl From<&str> for MediaValue {
    fn from(value: &str) -> Self {
        MediaValue::Text(value.to_owned())
    }
}

impl From<String> for MediaValue {
    fn from(value: String) -> Self {
        MediaValue::Text(value)
    }
}

impl From<Vec<MediaValue>> for MediaValue {
    fn from(values: Vec<MediaValue>) -> Self {
        MediaValue::List(values)
    }
}

impl<T: Into<MediaValue>> From<Option<T>> for MediaValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(MediaValue::Null, Into::into)
    }
}

/// A text track as it appears in the subtitles lists and in subtitle
/// requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextTrack {
    /// `captions` or `subtitles`.
    pub kind: String,
    pub label: String,
    pub language: String,
}

impl TextTrack {
    pub fn new(kind: &str, label: &str, language: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            label: label.to_owned(),
            language: language.to_owned(),
        }
    }

    pub fn to_value(&self) -> MediaValue {
        let mut map = IndexMap::new();
        map.insert("kind".to_owned(), MediaValue::from(self.kind.as_str()));
        map.insert("label".to_owned(), MediaValue::from(self.label.as_str()));
        map.insert("language".to_owned(), MediaValue::from(self.language.as_str()));
        MediaValue::Map(map)
    }

    /// Read a track back from a map value. Missing fields default to "".
    pub fn from_value(value: &MediaValue) -> Option<Self> {
        let map = value.as_map()?;
        let field = |name: &str| {
            map.get(name)
                .and_then(MediaValue::as_str)
                .unwrap_or_default()
                .to_owned()
        };
        Some(Self {
            kind: field("kind"),
            label: field("label"),
            language: field("language"),
        })
    }

    pub fn list_value(tracks: &[TextTrack]) -> MediaValue {
        MediaValue::List(tracks.iter().map(TextTrack::to_value).collect())
    }
}

/// Coarse volume bucket derived from volume and mute state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeLevel {
    Off,
    Low,
    Medium,
    High,
}

impl VolumeLevel {
    pub fn from_volume(volume: f64, muted: bool) -> Self {
        if muted || volume <= 0.0 {
            VolumeLevel::Off
        } else if volume < 0.5 {
            VolumeLevel::Low
        } else if volume < 0.75 {
            VolumeLevel::Medium
        } else {
            VolumeLevel::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VolumeLevel::Off => "off",
            VolumeLevel::Low => "low",
            VolumeLevel::Medium => "medium",
            VolumeLevel::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(VolumeLevel::Off),
            "low" => Some(VolumeLevel::Low),
            "medium" => Some(VolumeLevel::Medium),
            "high" => Some(VolumeLevel::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamType {
    Live,
    OnDemand,
    Unknown,
}

impl StreamType {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamType::Live => "live",
            StreamType::OnDemand => "on-demand",
            StreamType::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "live" => Some(StreamType::Live),
            "on-demand" => Some(StreamType::OnDemand),
            "unknown" => Some(StreamType::Unknown),
            _ => None,
        }
    }
}

/// Why a feature (fullscreen, pip, cast, ...) cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    /// Supported in principle but not right now.
    Unavailable,
    /// Not supported by the platform at all.
    Unsupported,
}

impl Availability {
    pub fn as_str(self) -> &'static str {
        match self {
            Availability::Unavailable => "unavailable",
            Availability::Unsupported => "unsupported",
        }
    }
}

/// Host objects attached to the store. Not part of the serialized state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachments {
    pub media: Option<HostHandle>,
    pub fullscreen: Option<HostHandle>,
    pub document: Option<HostHandle>,
}

/// One snapshot of the store's state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaState {
    props: IndexMap<String, MediaValue>,
    #[serde(skip)]
    attachments: Attachments,
}

impl MediaState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a snapshot from a JSON object of state keys.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.props)?)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<MediaValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<MediaValue>) {
        self.props.insert(key.to_owned(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<MediaValue> {
        self.props.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&MediaValue> {
        self.props.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MediaValue)> {
        self.props.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(MediaValue::as_bool)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(MediaValue::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MediaValue::as_str)
    }

    pub fn tracks(&self, key: &str) -> Vec<TextTrack> {
        self.get(key)
            .and_then(MediaValue::as_list)
            .map(|values| values.iter().filter_map(TextTrack::from_value).collect())
            .unwrap_or_default()
    }

    pub fn paused(&self) -> Option<bool> {
        self.bool(names::MEDIA_PAUSED)
    }

    pub fn ended(&self) -> Option<bool> {
        self.bool(names::MEDIA_ENDED)
    }

    pub fn muted(&self) -> Option<bool> {
        self.bool(names::MEDIA_MUTED)
    }

    pub fn volume(&self) -> Option<f64> {
        self.number(names::MEDIA_VOLUME)
    }

    pub fn volume_level(&self) -> Option<VolumeLevel> {
        self.text(names::MEDIA_VOLUME_LEVEL).and_then(VolumeLevel::parse)
    }

    pub fn current_time(&self) -> Option<f64> {
        self.number(names::MEDIA_CURRENT_TIME)
    }

    pub fn duration(&self) -> Option<f64> {
        self.number(names::MEDIA_DURATION)
    }

    pub fn playback_rate(&self) -> Option<f64> {
        self.number(names::MEDIA_PLAYBACK_RATE)
    }

    pub fn is_fullscreen(&self) -> Option<bool> {
        self.bool(names::MEDIA_IS_FULLSCREEN)
    }

    pub fn is_pip(&self) -> Option<bool> {
        self.bool(names::MEDIA_IS_PIP)
    }

    pub fn stream_type(&self) -> Option<StreamType> {
        self.text(names::MEDIA_STREAM_TYPE).and_then(StreamType::parse)
    }

    pub fn subtitles_list(&self) -> Vec<TextTrack> {
        self.tracks(names::MEDIA_SUBTITLES_LIST)
    }

    pub fn subtitles_showing(&self) -> Vec<TextTrack> {
        self.tracks(names::MEDIA_SUBTITLES_SHOWING)
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut Attachments {
        &mut self.attachments
    }

    pub fn media_element(&self) -> Option<&HostHandle> {
        self.attachments.media.as_ref()
    }

    pub fn fullscreen_element(&self) -> Option<&HostHandle> {
        self.attachments.fullscreen.as_ref()
    }

    pub fn document(&self) -> Option<&HostHandle> {
        self.attachments.document.as_ref()
    }
}

/// Shared empty snapshot seen by selectors when no store is provided.
///
/// Always the same `Arc`, so repeated reads hit the memo's identity check.
pub fn empty_state() -> Arc<MediaState> {
    static EMPTY: OnceLock<Arc<MediaState>> = OnceLock::new();
    EMPTY.get_or_init(|| Arc::new(MediaState::new())).clone()
}
