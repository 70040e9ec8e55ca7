use std::fs;
use std::path::{Path, PathBuf};

use flint_host::{InputCommand, LoopConfig, ScriptedInput, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Spawn timing and the layout rule enemies follow once spawned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SpawnerConfig {
    pub(crate) cadence_seconds: f64,
    pub(crate) capacity: usize,
    pub(crate) spacing: f32,
    pub(crate) offset: f32,
    pub(crate) depth_bias: f32,
    /// Where a new enemy sits until its first position update.
    pub(crate) spawn_position: Vec3,
    pub(crate) box_size: f32,
    pub(crate) color: Vec4,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            cadence_seconds: 1.5,
            capacity: 20,
            spacing: 10.0,
            offset: 60.0,
            depth_bias: 100.0,
            spawn_position: Vec3::new(0.0, 0.0, 999.0),
            box_size: 1.0,
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
        }
    }
}

/// What `StartGame` does with enemies left over from earlier sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RestartPolicy {
    #[default]
    Retain,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MenuConfig {
    pub(crate) label: String,
    pub(crate) position: Vec3,
    pub(crate) text_color: Vec4,
    pub(crate) text_size: f32,
    /// Red channel of the label while gazed at.
    pub(crate) highlight_red: f32,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            label: "Start Game".to_string(),
            position: Vec3::new(-6.0, 0.0, -8.0),
            text_color: Vec4::new(0.1, 0.1, 0.1, 1.0),
            text_size: 12.0,
            highlight_red: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GameplayConfig {
    pub(crate) spawner: SpawnerConfig,
    pub(crate) restart_policy: RestartPolicy,
    pub(crate) menu: MenuConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SessionConfig {
    pub(crate) gameplay: GameplayConfig,
    pub(crate) host: LoopConfig,
    /// Inline input timeline, used when `script_path` is unset.
    pub(crate) script: Vec<ScriptedInput>,
    pub(crate) script_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gameplay: GameplayConfig::default(),
            host: LoopConfig::default(),
            script: demo_script(),
            script_path: None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read session config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse session config {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid session config field {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl SessionConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let spawner = &self.gameplay.spawner;
        if !spawner.cadence_seconds.is_finite() || spawner.cadence_seconds <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "gameplay.spawner.cadence_seconds",
                reason: "must be a positive number",
            });
        }
        if !(spawner.spacing.is_finite()
            && spawner.offset.is_finite()
            && spawner.depth_bias.is_finite())
        {
            return Err(ConfigError::Invalid {
                field: "gameplay.spawner",
                reason: "layout values must be finite",
            });
        }
        if !spawner.box_size.is_finite() || spawner.box_size <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "gameplay.spawner.box_size",
                reason: "must be a positive number",
            });
        }
        if self.host.target_fps == 0 {
            return Err(ConfigError::Invalid {
                field: "host.target_fps",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

pub(crate) fn load_session_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    let config = serde_path_to_error::deserialize::<_, SessionConfig>(&mut deserializer).map_err(
        |error| {
            let json_path = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        },
    )?;
    config.validate()?;
    Ok(config)
}

/// Look at the menu, select it, watch the wave, then back out.
pub(crate) fn demo_script() -> Vec<ScriptedInput> {
    let gaze = |target: Option<&str>| InputCommand::Gaze {
        target: target.map(ToString::to_string),
    };
    vec![
        ScriptedInput {
            at_seconds: 0.5,
            input: gaze(Some("menu")),
        },
        ScriptedInput {
            at_seconds: 1.0,
            input: InputCommand::TouchDown,
        },
        ScriptedInput {
            at_seconds: 1.1,
            input: InputCommand::TouchUp,
        },
        ScriptedInput {
            at_seconds: 34.0,
            input: InputCommand::Back,
        },
        ScriptedInput {
            at_seconds: 36.0,
            input: gaze(None),
        },
    ]
}
