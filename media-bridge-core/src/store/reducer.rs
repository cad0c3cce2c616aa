//! Optimistic request reducer used by [`MemoryStore::media`].
//!
//! A real player decides asynchronously whether a request succeeded. This
//! reducer applies the request as if it did, which is what tests and
//! headless hosts need. It returns `None` when a request changes nothing so
//! the store can skip the notification.
//!
//! [`MemoryStore::media`]: super::MemoryStore::media

use tracing::trace;

use super::handle::HostHandle;
use super::state::{names, MediaState, MediaValue, TextTrack, VolumeLevel};
use crate::action::MediaAction;
use crate::config::StoreConfig;
use crate::select::same_value;

#[derive(Debug, Clone)]
pub struct MediaReducer {
    unmute_volume: f64,
    clamp_seek_to_duration: bool,
}

impl Default for MediaReducer {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

/// Working copy of a snapshot that remembers whether anything moved.
struct Draft {
    state: MediaState,
    changed: bool,
}

impl Draft {
    fn put(&mut self, key: &str, value: impl Into<MediaValue>) {
        let value = value.into();
        if self.state.get(key).is_some_and(|old| same_value(old, &value)) {
            return;
        }
        self.state.set(key, value);
        self.changed = true;
    }

    fn attach(
        &mut self,
        slot: fn(&mut MediaState) -> &mut Option<HostHandle>,
        handle: &Option<HostHandle>,
    ) {
        let current = slot(&mut self.state);
        if *current != *handle {
            *current = handle.clone();
            self.changed = true;
        }
    }

    /// Whether the store reports `key` as unavailable or unsupported.
    fn unavailable(&self, key: &str) -> bool {
        self.state.get(key).is_some_and(|value| !value.is_null())
    }
}

impl MediaReducer {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            unmute_volume: config.unmute_volume.clamp(0.0, 1.0),
            clamp_seek_to_duration: config.clamp_seek_to_duration,
        }
    }

    pub fn reduce(&self, state: &MediaState, action: &MediaAction) -> Option<MediaState> {
        let mut draft = Draft {
            state: state.clone(),
            changed: false,
        };
        self.apply(&mut draft, action);

        if !draft.changed {
            trace!(action = %action.kind(), "request changed nothing");
        }
        draft.changed.then_some(draft.state)
    }

    fn apply(&self, draft: &mut Draft, action: &MediaAction) {
        match action {
            MediaAction::PlayRequest => {
                draft.put(names::MEDIA_PAUSED, false);
                draft.put(names::MEDIA_ENDED, false);
                draft.put(names::MEDIA_HAS_PLAYED, true);
            }
            MediaAction::PauseRequest => draft.put(names::MEDIA_PAUSED, true),

            MediaAction::MuteRequest => {
                draft.put(names::MEDIA_MUTED, true);
                draft.put(names::MEDIA_VOLUME_LEVEL, VolumeLevel::Off.as_str());
            }
            MediaAction::UnmuteRequest => {
                let mut volume = draft.state.volume().unwrap_or(1.0);
                if volume <= 0.0 {
                    volume = self.unmute_volume;
                    draft.put(names::MEDIA_VOLUME, volume);
                }
                draft.put(names::MEDIA_MUTED, false);
                draft.put(
                    names::MEDIA_VOLUME_LEVEL,
                    VolumeLevel::from_volume(volume, false).as_str(),
                );
            }
            MediaAction::VolumeRequest(volume) => {
                if volume.is_nan() || draft.unavailable(names::MEDIA_VOLUME_UNAVAILABLE) {
                    return;
                }
                let volume = volume.clamp(0.0, 1.0);
                let mut muted = draft.state.muted().unwrap_or(false);
                if volume > 0.0 && muted {
                    muted = false;
                    draft.put(names::MEDIA_MUTED, false);
                }
                draft.put(names::MEDIA_VOLUME, volume);
                draft.put(
                    names::MEDIA_VOLUME_LEVEL,
                    VolumeLevel::from_volume(volume, muted).as_str(),
                );
            }

            MediaAction::SeekRequest(time) => {
                if time.is_nan() {
                    return;
                }
                let mut time = time.max(0.0);
                let duration = draft.state.duration().filter(|d| d.is_finite());
                if let Some(duration) = duration.filter(|_| self.clamp_seek_to_duration) {
                    time = time.min(duration);
                }
                draft.put(names::MEDIA_CURRENT_TIME, time);
                if duration.is_some_and(|duration| time < duration) {
                    draft.put(names::MEDIA_ENDED, false);
                }
            }
            MediaAction::PlaybackRateRequest(rate) => {
                if rate.is_finite() && *rate > 0.0 {
                    draft.put(names::MEDIA_PLAYBACK_RATE, *rate);
                }
            }

            MediaAction::EnterFullscreenRequest | MediaAction::ExitFullscreenRequest => {
                if !draft.unavailable(names::MEDIA_FULLSCREEN_UNAVAILABLE) {
                    let enter = matches!(action, MediaAction::EnterFullscreenRequest);
                    draft.put(names::MEDIA_IS_FULLSCREEN, enter);
                }
            }
            MediaAction::EnterPipRequest | MediaAction::ExitPipRequest => {
                if !draft.unavailable(names::MEDIA_PIP_UNAVAILABLE) {
                    draft.put(names::MEDIA_IS_PIP, matches!(action, MediaAction::EnterPipRequest));
                }
            }

            MediaAction::ShowSubtitlesRequest(tracks) => {
                let mut showing = draft.state.subtitles_showing();
                for track in tracks {
                    if !showing.contains(track) {
                        showing.push(track.clone());
                    }
                }
                draft.put(names::MEDIA_SUBTITLES_SHOWING, TextTrack::list_value(&showing));
            }
            MediaAction::DisableSubtitlesRequest(tracks) => {
                let mut showing = draft.state.subtitles_showing();
                showing.retain(|track| !tracks.contains(track));
                draft.put(names::MEDIA_SUBTITLES_SHOWING, TextTrack::list_value(&showing));
            }
            MediaAction::ToggleSubtitlesRequest(force) => {
                let showing = draft.state.subtitles_showing();
                let turn_on = force.unwrap_or(showing.is_empty());
                if !turn_on {
                    draft.put(names::MEDIA_SUBTITLES_SHOWING, MediaValue::List(Vec::new()));
                } else if showing.is_empty() {
                    if let Some(track) = preferred_track(&draft.state.subtitles_list()) {
                        draft.put(names::MEDIA_SUBTITLES_SHOWING, TextTrack::list_value(&[track]));
                    }
                }
            }

            MediaAction::SeekToLiveRequest => {
                let live_edge = draft
                    .state
                    .get(names::MEDIA_SEEKABLE)
                    .and_then(MediaValue::as_list)
                    .and_then(|range| range.last())
                    .and_then(MediaValue::as_f64);
                if let Some(edge) = live_edge {
                    draft.put(names::MEDIA_CURRENT_TIME, edge);
                }
                draft.put(names::MEDIA_TIME_IS_LIVE, true);
            }
            MediaAction::PreviewRequest(time) => draft.put(names::MEDIA_PREVIEW_TIME, *time),

            MediaAction::EnterCastRequest | MediaAction::ExitCastRequest => {
                if !draft.unavailable(names::MEDIA_CAST_UNAVAILABLE) {
                    draft.put(names::MEDIA_IS_CASTING, matches!(action, MediaAction::EnterCastRequest));
                }
            }
            MediaAction::AirplayRequest => {
                if !draft.unavailable(names::MEDIA_AIRPLAY_UNAVAILABLE) {
                    draft.put(names::MEDIA_IS_AIRPLAYING, true);
                }
            }
            MediaAction::RenditionRequest(id) => {
                draft.put(names::MEDIA_RENDITION_SELECTED, id.clone());
            }
            MediaAction::AudioTrackRequest(id) => {
                draft.put(names::MEDIA_AUDIO_TRACK_ENABLED, id.as_str());
            }

            MediaAction::MediaElementChangeRequest(handle) => {
                draft.attach(|state| &mut state.attachments_mut().media, handle)
            }
            MediaAction::FullscreenElementChangeRequest(handle) => {
                draft.attach(|state| &mut state.attachments_mut().fullscreen, handle)
            }
            MediaAction::DocumentElementChangeRequest(handle) => {
                draft.attach(|state| &mut state.attachments_mut().document, handle)
            }
        }
    }
}

/// Captions win over subtitles when turning text tracks on.
fn preferred_track(list: &[TextTrack]) -> Option<TextTrack> {
    list.iter()
        .find(|track| track.kind == "captions")
        .or_else(|| list.first())
        .cloned()
}
