use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adaptive::error::AdaptiveError;

/// Fused emotional condition of the learner.
///
/// Declaration order is the canonical order used for snapshots.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EmotionState {
    #[default]
    Neutral,
    Positive,
    Negative,
    Confused,
    Frustrated,
}

impl EmotionState {
    pub const COUNT: usize = 5;

    pub const ALL: [EmotionState; Self::COUNT] = [
        Self::Neutral,
        Self::Positive,
        Self::Negative,
        Self::Confused,
        Self::Frustrated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Confused => "Confused",
            Self::Frustrated => "Frustrated",
        }
    }
}

impl fmt::Display for EmotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pedagogical intervention the policy may choose.
///
/// Declaration order is the tie-break order of `ValueStore::best_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    SimplifyContent,
    ProvideExamples,
    InteractiveExercise,
    TakeBreak,
    ContinueCurrent,
}

impl Action {
    pub const COUNT: usize = 5;

    pub const ALL: [Action; Self::COUNT] = [
        Self::SimplifyContent,
        Self::ProvideExamples,
        Self::InteractiveExercise,
        Self::TakeBreak,
        Self::ContinueCurrent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimplifyContent => "SimplifyContent",
            Self::ProvideExamples => "ProvideExamples",
            Self::InteractiveExercise => "InteractiveExercise",
            Self::TakeBreak => "TakeBreak",
            Self::ContinueCurrent => "ContinueCurrent",
        }
    }

    /// Learner-facing sentence shown by the content consumer.
    pub fn description(&self) -> &'static str {
        match self {
            Self::SimplifyContent => "Simplifying content for better understanding",
            Self::ProvideExamples => "Providing relevant examples",
            Self::InteractiveExercise => "Switching to interactive exercises",
            Self::TakeBreak => "Suggesting a short break",
            Self::ContinueCurrent => "Continuing with current approach",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label vocabulary of the facial-expression classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacialEmotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
    Confused,
    Frustrated,
}

impl FromStr for FacialEmotion {
    type Err = AdaptiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "angry" => Ok(Self::Angry),
            "disgust" => Ok(Self::Disgust),
            "fear" => Ok(Self::Fear),
            "happy" => Ok(Self::Happy),
            "sad" => Ok(Self::Sad),
            "surprise" => Ok(Self::Surprise),
            "neutral" => Ok(Self::Neutral),
            "confused" => Ok(Self::Confused),
            "frustrated" => Ok(Self::Frustrated),
            _ => Err(AdaptiveError::UnrecognizedLabel {
                modality: Modality::Facial,
                label: s.to_string(),
            }),
        }
    }
}

/// Label vocabulary of the voice-sentiment classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceSentiment {
    Neutral,
    Positive,
    Negative,
    Frustrated,
    Confused,
}

impl FromStr for VoiceSentiment {
    type Err = AdaptiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "frustrated" => Ok(Self::Frustrated),
            "confused" => Ok(Self::Confused),
            _ => Err(AdaptiveError::UnrecognizedLabel {
                modality: Modality::Voice,
                label: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Facial,
    Voice,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Facial => f.write_str("facial"),
            Self::Voice => f.write_str("voice"),
        }
    }
}

/// Voice label together with the classifier's confidence in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceReading {
    pub sentiment: VoiceSentiment,
    pub confidence: f64,
}

/// One fused observation as delivered to the orchestrator.
///
/// Raw text is kept so an unrecognised label can be logged and counted
/// before it is coerced to absent evidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub facial: Option<String>,
    pub voice: Option<String>,
    pub voice_confidence: Option<f64>,
}

impl Observation {
    pub fn new(facial: Option<&str>, voice: Option<&str>) -> Self {
        Self {
            facial: facial.map(str::to_string),
            voice: voice.map(str::to_string),
            voice_confidence: None,
        }
    }

    pub fn with_voice_confidence(mut self, confidence: f64) -> Self {
        self.voice_confidence = Some(confidence);
        self
    }
}

/// `(state, action, next_state, reward)`, consumed once by the update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: EmotionState,
    pub action: Action,
    pub next_state: EmotionState,
    pub reward: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum UpdateOutcome {
    Applied {
        old_value: f64,
        new_value: f64,
        reward: f64,
    },
    Rejected {
        retained_value: f64,
        reward: f64,
    },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// What one orchestration cycle decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleOutcome {
    pub state: EmotionState,
    pub action: Action,
    pub explored: bool,
    pub update: Option<UpdateOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_orders() {
        assert_eq!(EmotionState::ALL[0], EmotionState::Neutral);
        assert_eq!(EmotionState::ALL[4], EmotionState::Frustrated);
        assert_eq!(EmotionState::default(), EmotionState::Neutral);
        assert!(EmotionState::Neutral < EmotionState::Frustrated);
        assert_eq!(Action::ALL[0], Action::SimplifyContent);
        assert_eq!(Action::ALL[4], Action::ContinueCurrent);
        assert!(Action::SimplifyContent < Action::ContinueCurrent);
    }

    #[test]
    fn test_label_parsing_is_case_insensitive() {
        assert_eq!("happy".parse::<FacialEmotion>().unwrap(), FacialEmotion::Happy);
        assert_eq!(" Sad ".parse::<FacialEmotion>().unwrap(), FacialEmotion::Sad);
        assert_eq!("POSITIVE".parse::<VoiceSentiment>().unwrap(), VoiceSentiment::Positive);
    }

    #[test]
    fn test_unknown_label_is_error() {
        let err = "Bored".parse::<FacialEmotion>().unwrap_err();
        assert!(matches!(
            err,
            AdaptiveError::UnrecognizedLabel { modality: Modality::Facial, .. }
        ));
        assert!("Happy".parse::<VoiceSentiment>().is_err());
    }

    #[test]
    fn test_state_serializes_by_name() {
        let json = serde_json::to_string(&EmotionState::Frustrated).unwrap();
        assert_eq!(json, "\"Frustrated\"");
        let action: Action = serde_json::from_str("\"TakeBreak\"").unwrap();
        assert_eq!(action, Action::TakeBreak);
    }

    #[test]
    fn test_action_description() {
        assert_eq!(Action::TakeBreak.description(), "Suggesting a short break");
    }
}
