//! Deterministic fusion of facial and voice labels into one `EmotionState`.
//!
//! Priority, first match wins: frustration, confusion, positive, negative,
//! then neutral. Either modality may be absent; absence never masks the
//! other modality's evidence.

use std::str::FromStr;

use tracing::debug;

use crate::adaptive::error::AdaptiveError;
use crate::adaptive::types::{EmotionState, FacialEmotion, VoiceSentiment};

pub fn fuse(facial: Option<FacialEmotion>, voice: Option<VoiceSentiment>) -> EmotionState {
    if facial == Some(FacialEmotion::Frustrated) || voice == Some(VoiceSentiment::Frustrated) {
        return EmotionState::Frustrated;
    }
    if facial == Some(FacialEmotion::Confused) || voice == Some(VoiceSentiment::Confused) {
        return EmotionState::Confused;
    }
    if facial == Some(FacialEmotion::Happy) || voice == Some(VoiceSentiment::Positive) {
        return EmotionState::Positive;
    }
    if facial == Some(FacialEmotion::Sad) || voice == Some(VoiceSentiment::Negative) {
        return EmotionState::Negative;
    }
    EmotionState::Neutral
}

/// Fuses raw perception text; unknown labels count as absent evidence.
pub fn fuse_labels(facial: Option<&str>, voice: Option<&str>) -> EmotionState {
    let facial = parse_label::<FacialEmotion>(facial).unwrap_or(None);
    let voice = parse_label::<VoiceSentiment>(voice).unwrap_or(None);
    fuse(facial, voice)
}

/// Parses one modality label.
///
/// Missing or blank text is `Ok(None)`; text outside the vocabulary is
/// logged and returned as `UnrecognizedLabel` so callers can count it
/// before coercing it to absence.
pub fn parse_label<T>(raw: Option<&str>) -> Result<Option<T>, AdaptiveError>
where
    T: FromStr<Err = AdaptiveError>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<T>().map(Some).map_err(|err| {
            debug!(error = %err, "perception label treated as absent evidence");
            err
        }),
    }
}
