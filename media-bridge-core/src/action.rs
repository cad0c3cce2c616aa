//! Media Requests
//!
//! Every action a UI can send to the store is a *request*: it names the
//! outcome the UI wants, and the store decides whether and how to honor it.
//!
//! [`MediaAction`] is the typed form, one variant per request with its
//! payload. [`MediaActionType`] is the closed vocabulary of request kinds,
//! each with a stable wire name. [`RawAction`] is the loosely typed
//! `{ type, detail }` record for hosts that move actions around as data.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::store::{HostHandle, TextTrack};

/// The closed set of request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaActionType {
    PlayRequest,
    PauseRequest,
    MuteRequest,
    UnmuteRequest,
    VolumeRequest,
    SeekRequest,
    PlaybackRateRequest,
    EnterFullscreenRequest,
    ExitFullscreenRequest,
    EnterPipRequest,
    ExitPipRequest,
    ShowSubtitlesRequest,
    DisableSubtitlesRequest,
    ToggleSubtitlesRequest,
    SeekToLiveRequest,
    PreviewRequest,
    EnterCastRequest,
    ExitCastRequest,
    AirplayRequest,
    RenditionRequest,
    AudioTrackRequest,
    MediaElementChangeRequest,
    FullscreenElementChangeRequest,
    DocumentElementChangeRequest,
}

impl MediaActionType {
    pub const ALL: [MediaActionType; 24] = [
        MediaActionType::PlayRequest,
        MediaActionType::PauseRequest,
        MediaActionType::MuteRequest,
        MediaActionType::UnmuteRequest,
        MediaActionType::VolumeRequest,
        MediaActionType::SeekRequest,
        MediaActionType::PlaybackRateRequest,
        MediaActionType::EnterFullscreenRequest,
        MediaActionType::ExitFullscreenRequest,
        MediaActionType::EnterPipRequest,
        MediaActionType::ExitPipRequest,
        MediaActionType::ShowSubtitlesRequest,
        MediaActionType::DisableSubtitlesRequest,
        MediaActionType::ToggleSubtitlesRequest,
        MediaActionType::SeekToLiveRequest,
        MediaActionType::PreviewRequest,
        MediaActionType::EnterCastRequest,
        MediaActionType::ExitCastRequest,
        MediaActionType::AirplayRequest,
        MediaActionType::RenditionRequest,
        MediaActionType::AudioTrackRequest,
        MediaActionType::MediaElementChangeRequest,
        MediaActionType::FullscreenElementChangeRequest,
        MediaActionType::DocumentElementChangeRequest,
    ];

    /// Wire name of the request kind.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaActionType::PlayRequest => "media-play-request",
            MediaActionType::PauseRequest => "media-pause-request",
            MediaActionType::MuteRequest => "media-mute-request",
            MediaActionType::UnmuteRequest => "media-unmute-request",
            MediaActionType::VolumeRequest => "media-volume-request",
            MediaActionType::SeekRequest => "media-seek-request",
            MediaActionType::PlaybackRateRequest => "media-playback-rate-request",
            MediaActionType::EnterFullscreenRequest => "media-enter-fullscreen-request",
            MediaActionType::ExitFullscreenRequest => "media-exit-fullscreen-request",
            MediaActionType::EnterPipRequest => "media-enter-pip-request",
            MediaActionType::ExitPipRequest => "media-exit-pip-request",
            MediaActionType::ShowSubtitlesRequest => "media-show-subtitles-request",
            MediaActionType::DisableSubtitlesRequest => "media-disable-subtitles-request",
            MediaActionType::ToggleSubtitlesRequest => "media-toggle-subtitles-request",
            MediaActionType::SeekToLiveRequest => "media-seek-to-live-request",
            MediaActionType::PreviewRequest => "media-preview-request",
            MediaActionType::EnterCastRequest => "media-enter-cast-request",
            MediaActionType::ExitCastRequest => "media-exit-cast-request",
            MediaActionType::AirplayRequest => "media-airplay-request",
            MediaActionType::RenditionRequest => "media-rendition-request",
            MediaActionType::AudioTrackRequest => "media-audio-track-request",
            MediaActionType::MediaElementChangeRequest => "media-element-change-request",
            MediaActionType::FullscreenElementChangeRequest => {
                "fullscreen-element-change-request"
            }
            MediaActionType::DocumentElementChangeRequest => "document-element-change-request",
        }
    }
}

impl fmt::Display for MediaActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaActionType {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        MediaActionType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::UnknownActionType(name.to_owned()))
    }
}

/// A typed request to the media store.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaAction {
    PlayRequest,
    PauseRequest,
    MuteRequest,
    UnmuteRequest,
    /// Target volume in `0.0..=1.0`.
    VolumeRequest(f64),
    /// Target time in seconds.
    SeekRequest(f64),
    PlaybackRateRequest(f64),
    EnterFullscreenRequest,
    ExitFullscreenRequest,
    EnterPipRequest,
    ExitPipRequest,
    ShowSubtitlesRequest(Vec<TextTrack>),
    DisableSubtitlesRequest(Vec<TextTrack>),
    /// `Some(true)` forces on, `Some(false)` forces off, `None` flips.
    ToggleSubtitlesRequest(Option<bool>),
    SeekToLiveRequest,
    /// Time under the pointer on a seek bar, `None` when it leaves.
    PreviewRequest(Option<f64>),
    EnterCastRequest,
    ExitCastRequest,
    AirplayRequest,
    /// Rendition id, `None` for automatic selection.
    RenditionRequest(Option<String>),
    AudioTrackRequest(String),
    MediaElementChangeRequest(Option<HostHandle>),
    FullscreenElementChangeRequest(Option<HostHandle>),
    DocumentElementChangeRequest(Option<HostHandle>),
}

impl MediaAction {
    pub fn kind(&self) -> MediaActionType {
        match self {
            MediaAction::PlayRequest => MediaActionType::PlayRequest,
            MediaAction::PauseRequest => MediaActionType::PauseRequest,
            MediaAction::MuteRequest => MediaActionType::MuteRequest,
            MediaAction::UnmuteRequest => MediaActionType::UnmuteRequest,
            MediaAction::VolumeRequest(_) => MediaActionType::VolumeRequest,
            MediaAction::SeekRequest(_) => MediaActionType::SeekRequest,
            MediaAction::PlaybackRateRequest(_) => MediaActionType::PlaybackRateRequest,
            MediaAction::EnterFullscreenRequest => MediaActionType::EnterFullscreenRequest,
            MediaAction::ExitFullscreenRequest => MediaActionType::ExitFullscreenRequest,
            MediaAction::EnterPipRequest => MediaActionType::EnterPipRequest,
            MediaAction::ExitPipRequest => MediaActionType::ExitPipRequest,
            MediaAction::ShowSubtitlesRequest(_) => MediaActionType::ShowSubtitlesRequest,
            MediaAction::DisableSubtitlesRequest(_) => MediaActionType::DisableSubtitlesRequest,
            MediaAction::ToggleSubtitlesRequest(_) => MediaActionType::ToggleSubtitlesRequest,
            MediaAction::SeekToLiveRequest => MediaActionType::SeekToLiveRequest,
            MediaAction::PreviewRequest(_) => MediaActionType::PreviewRequest,
            MediaAction::EnterCastRequest => MediaActionType::EnterCastRequest,
            MediaAction::ExitCastRequest => MediaActionType::ExitCastRequest,
            MediaAction::AirplayRequest => MediaActionType::AirplayRequest,
            MediaAction::RenditionRequest(_) => MediaActionType::RenditionRequest,
            MediaAction::AudioTrackRequest(_) => MediaActionType::AudioTrackRequest,
            MediaAction::MediaElementChangeRequest(_) => MediaActionType::MediaElementChangeRequest,
            MediaAction::FullscreenElementChangeRequest(_) => {
                MediaActionType::FullscreenElementChangeRequest
            }
            MediaAction::DocumentElementChangeRequest(_) => {
                MediaActionType::DocumentElementChangeRequest
            }
        }
    }
}

/// Payload of a [`RawAction`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActionDetail {
    #[default]
    None,
    Bool(bool),
    Number(f64),
    Text(String),
    Tracks(Vec<TextTrack>),
    Handle(HostHandle),
}

/// Loosely typed `{ type, detail }` action record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAction {
    pub kind: MediaActionType,
    pub detail: ActionDetail,
}

impl RawAction {
    pub fn new(kind: MediaActionType, detail: ActionDetail) -> Self {
        Self { kind, detail }
    }

    /// Build a record from a wire name.
    pub fn parse(kind: &str, detail: ActionDetail) -> Result<Self> {
        Ok(Self::new(kind.parse()?, detail))
    }
}

impl From<MediaAction> for RawAction {
    fn from(action: MediaAction) -> Self {
        let kind = action.kind();
        let detail = match action {
            MediaAction::VolumeRequest(value)
            | MediaAction::SeekRequest(value)
            | MediaAction::PlaybackRateRequest(value)
            | MediaAction::PreviewRequest(Some(value)) => ActionDetail::Number(value),
            MediaAction::ShowSubtitlesRequest(tracks)
            | MediaAction::DisableSubtitlesRequest(tracks) => ActionDetail::Tracks(tracks),
            MediaAction::ToggleSubtitlesRequest(Some(force)) => ActionDetail::Bool(force),
            MediaAction::RenditionRequest(Some(id)) | MediaAction::AudioTrackRequest(id) => {
                ActionDetail::Text(id)
            }
            MediaAction::MediaElementChangeRequest(Some(handle))
            | MediaAction::FullscreenElementChangeRequest(Some(handle))
            | MediaAction::DocumentElementChangeRequest(Some(handle)) => {
                ActionDetail::Handle(handle)
            }
            _ => ActionDetail::None,
        };
        Self { kind, detail }
    }
}

impl TryFrom<RawAction> for MediaAction {
    type Error = Error;

    fn try_from(raw: RawAction) -> Result<Self> {
        use ActionDetail as D;
        use MediaActionType as K;

        let RawAction { kind, detail } = raw;
        let invalid = move |expected: &'static str| Error::InvalidDetail {
            action: kind.as_str(),
            expected,
        };

        let action = match (kind, detail) {
            (K::PlayRequest, _) => MediaAction::PlayRequest,
            (K::PauseRequest, _) => MediaAction::PauseRequest,
            (K::MuteRequest, _) => MediaAction::MuteRequest,
            (K::UnmuteRequest, _) => MediaAction::UnmuteRequest,
            (K::EnterFullscreenRequest, _) => MediaAction::EnterFullscreenRequest,
            (K::ExitFullscreenRequest, _) => MediaAction::ExitFullscreenRequest,
            (K::EnterPipRequest, _) => MediaAction::EnterPipRequest,
            (K::ExitPipRequest, _) => MediaAction::ExitPipRequest,
            (K::SeekToLiveRequest, _) => MediaAction::SeekToLiveRequest,
            (K::EnterCastRequest, _) => MediaAction::EnterCastRequest,
            (K::ExitCastRequest, _) => MediaAction::ExitCastRequest,
            (K::AirplayRequest, _) => MediaAction::AirplayRequest,

            (K::VolumeRequest, D::Number(value)) => MediaAction::VolumeRequest(value),
            (K::SeekRequest, D::Number(value)) => MediaAction::SeekRequest(value),
            (K::PlaybackRateRequest, D::Number(value)) => MediaAction::PlaybackRateRequest(value),
            (K::VolumeRequest | K::SeekRequest | K::PlaybackRateRequest, _) => {
                return Err(invalid("a number"))
            }

            (K::PreviewRequest, D::Number(value)) => MediaAction::PreviewRequest(Some(value)),
            (K::PreviewRequest, D::None) => MediaAction::PreviewRequest(None),
            (K::PreviewRequest, _) => return Err(invalid("a number or nothing")),

            (K::ShowSubtitlesRequest, D::Tracks(tracks)) => MediaAction::ShowSubtitlesRequest(tracks),
            (K::DisableSubtitlesRequest, D::Tracks(tracks)) => {
                MediaAction::DisableSubtitlesRequest(tracks)
            }
            (K::ShowSubtitlesRequest | K::DisableSubtitlesRequest, _) => {
                return Err(invalid("a list of text tracks"))
            }

            (K::ToggleSubtitlesRequest, D::Bool(force)) => {
                MediaAction::ToggleSubtitlesRequest(Some(force))
            }
            (K::ToggleSubtitlesRequest, D::None) => MediaAction::ToggleSubtitlesRequest(None),
            (K::ToggleSubtitlesRequest, _) => return Err(invalid("a boolean or nothing")),

            (K::RenditionRequest, D::Text(id)) => MediaAction::RenditionRequest(Some(id)),
            (K::RenditionRequest, D::None) => MediaAction::RenditionRequest(None),
            (K::RenditionRequest, _) => return Err(invalid("a rendition id or nothing")),

            (K::AudioTrackRequest, D::Text(id)) => MediaAction::AudioTrackRequest(id),
            (K::AudioTrackRequest, _) => return Err(invalid("an audio track id")),

            (K::MediaElementChangeRequest, D::Handle(handle)) => {
                MediaAction::MediaElementChangeRequest(Some(handle))
            }
            (K::MediaElementChangeRequest, D::None) => MediaAction::MediaElementChangeRequest(None),
            (K::FullscreenElementChangeRequest, D::Handle(handle)) => {
                MediaAction::FullscreenElementChangeRequest(Some(handle))
            }
            (K::FullscreenElementChangeRequest, D::None) => {
                MediaAction::FullscreenElementChangeRequest(None)
            }
            (K::DocumentElementChangeRequest, D::Handle(handle)) => {
                MediaAction::DocumentElementChangeRequest(Some(handle))
            }
            (K::DocumentElementChangeRequest, D::None) => {
                MediaAction::DocumentElementChangeRequest(None)
            }
            (
                K::MediaElementChangeRequest
                | K::FullscreenElementChangeRequest
                | K::DocumentElementChangeRequest,
                _,
            ) => return Err(invalid("a host handle or nothing")),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for kind in MediaActionType::ALL {
            assert_eq!(kind.as_str().parse::<MediaActionType>().unwrap(), kind);
        }
    }

    #[test]
    fn wire_names_are_distinct() {
        let mut names: Vec<_> = MediaActionType::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MediaActionType::ALL.len());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = "media-rewind-request".parse::<MediaActionType>().unwrap_err();
        assert!(matches!(err, Error::UnknownActionType(name) if name == "media-rewind-request"));
    }

    #[test]
    fn raw_record_converts_to_typed_action() {
        let raw = RawAction::parse("media-seek-request", ActionDetail::Number(12.5)).unwrap();
        assert_eq!(MediaAction::try_from(raw).unwrap(), MediaAction::SeekRequest(12.5));

        let raw = RawAction::parse("media-play-request", ActionDetail::None).unwrap();
        assert_eq!(MediaAction::try_from(raw).unwrap(), MediaAction::PlayRequest);
    }

    #[test]
    fn mismatched_detail_is_rejected() {
        let raw = RawAction::new(MediaActionType::VolumeRequest, ActionDetail::Text("loud".into()));
        let err = MediaAction::try_from(raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "action `media-volume-request` expects a number as detail"
        );
    }

    #[test]
    fn element_detach_carries_no_detail() {
        let handle = HostHandle::new("video");
        let attach: RawAction = MediaAction::MediaElementChangeRequest(Some(handle.clone())).into();
        assert_eq!(attach.kind, MediaActionType::MediaElementChangeRequest);
        assert_eq!(attach.detail, ActionDetail::Handle(handle));

        let detach: RawAction = MediaAction::MediaElementChangeRequest(None).into();
        assert_eq!(detach.detail, ActionDetail::None);
        assert_eq!(
            MediaAction::try_from(detach).unwrap(),
            MediaAction::MediaElementChangeRequest(None)
        );
    }
}
