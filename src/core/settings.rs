/// User-facing configuration, persisted as RON.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::actor::Actor;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid setting: {0}")]
    Invalid(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),
}

/// Which wounds get a floating damage label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShowWoundLevel {
    None,
    Destroyed,
    Major,
    Serious,
    All,
}

/// How bad a single wound is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WoundSeverity {
    Minor,
    Serious,
    Major,
    /// The body part was destroyed.
    Destroyed,
}

impl ShowWoundLevel {
    pub fn shows(&self, severity: WoundSeverity) -> bool {
        match self {
            Self::None => false,
            Self::Destroyed => severity >= WoundSeverity::Destroyed,
            Self::Major => severity >= WoundSeverity::Major,
            Self::Serious => severity >= WoundSeverity::Serious,
            Self::All => true,
        }
    }
}

/// Which kinds of actors may speak at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerFilter {
    HumanlikeOnly,
    All,
}

impl SpeakerFilter {
    pub fn admits(&self, actor: &Actor) -> bool {
        match self {
            Self::HumanlikeOnly => actor.is_humanlike(),
            Self::All => true,
        }
    }
}

/// Sets `constant` to `value` for actors that have any of `traits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitConstant {
    pub constant: String,
    pub value: String,
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalloutSettings {
    /// Chance in `[0, 1]` that an eligible event produces a callout, before
    /// frequency scaling.
    pub base_callout_chance: f32,
    pub cooldown_ticks: u64,
    pub sweep_interval_ticks: u64,
    pub stagger_delay_ticks: u32,
    pub stagger_delay_frames: u32,
    /// Attach callouts to the speaker instead of throwing them at its feet.
    pub attach_callout_text: bool,
    pub draw_label_background: bool,
    pub show_wound_level: ShowWoundLevel,
    pub speaker_filter: SpeakerFilter,
    pub allow_callouts_targeting_animals: bool,
    /// Stagger text thrown while paused against real frames. When off,
    /// such text is spawned immediately.
    pub queue_while_paused: bool,
    pub trait_constants: Vec<TraitConstant>,
    /// Read by the bundled tools when they install a log subscriber. The
    /// library only emits `tracing` events; hosts pick their own filter.
    pub debug_logging: bool,
}

impl Default for CalloutSettings {
    fn default() -> Self {
        Self {
            base_callout_chance: 0.2,
            cooldown_ticks: 240,
            sweep_interval_ticks: 60,
            stagger_delay_ticks: 30,
            stagger_delay_frames: 30,
            attach_callout_text: true,
            draw_label_background: true,
            show_wound_level: ShowWoundLevel::All,
            speaker_filter: SpeakerFilter::HumanlikeOnly,
            allow_callouts_targeting_animals: false,
            queue_while_paused: true,
            trait_constants: Vec::new(),
            debug_logging: false,
        }
    }
}

impl CalloutSettings {
    /// Filter directive the bundled tools fall back to when `RUST_LOG` is
    /// unset.
    pub fn default_log_level(&self) -> &'static str {
        if self.debug_logging {
            "debug"
        } else {
            "info"
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.base_callout_chance) {
            return Err(SettingsError::Invalid(format!(
                "base_callout_chance {} is outside [0, 1]",
                self.base_callout_chance
            )));
        }
        if self.sweep_interval_ticks == 0 {
            return Err(SettingsError::Invalid(
                "sweep_interval_ticks must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate settings. Missing fields take their defaults.
    pub fn from_ron(input: &str) -> Result<CalloutSettings, SettingsError> {
        let settings: CalloutSettings = ron::from_str(input)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let pretty = ron::ser::PrettyConfig::new().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    pub fn load(path: &Path) -> Result<CalloutSettings, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}
