use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::events::HostEvent;
use super::scene::{NodeId, SceneCollaborator, SceneGraph};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputCommand {
    /// `None` looks away from everything.
    Gaze {
        #[serde(default)]
        target: Option<String>,
    },
    TouchDown,
    TouchUp,
    TouchCancel,
    Back,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedInput {
    pub at_seconds: f64,
    pub input: InputCommand,
}

#[derive(Debug, Error)]
pub enum InputScriptError {
    #[error("failed to read input script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse input script {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("input script entry {index} has invalid time {at_seconds}")]
    InvalidTime { index: usize, at_seconds: f64 },
}

/// Time-ordered input timeline. Entries with equal times keep file order.
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    entries: Vec<ScriptedInput>,
    cursor: usize,
}

impl InputScript {
    pub fn from_entries(mut entries: Vec<ScriptedInput>) -> Result<Self, InputScriptError> {
        for (index, entry) in entries.iter().enumerate() {
            if !entry.at_seconds.is_finite() || entry.at_seconds < 0.0 {
                return Err(InputScriptError::InvalidTime {
                    index,
                    at_seconds: entry.at_seconds,
                });
            }
        }
        entries.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));
        Ok(Self { entries, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain_due(&mut self, now_seconds: f64, out: &mut Vec<InputCommand>) {
        while let Some(entry) = self.entries.get(self.cursor) {
            if entry.at_seconds > now_seconds {
                break;
            }
            out.push(entry.input.clone());
            self.cursor += 1;
        }
    }
}

pub fn load_input_script(path: &Path) -> Result<InputScript, InputScriptError> {
    let raw = fs::read_to_string(path).map_err(|source| InputScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    let entries = serde_path_to_error::deserialize::<_, Vec<ScriptedInput>>(&mut deserializer)
        .map_err(|error| {
            let json_path = error.path().to_string();
            InputScriptError::Parse {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        })?;
    InputScript::from_entries(entries)
}

/// Resolves gaze and touch commands into hover and gesture edges.
#[derive(Debug, Default)]
pub struct InteractionCollector {
    gazed: Option<NodeId>,
}

impl InteractionCollector {
    pub fn apply(&mut self, command: &InputCommand, scene: &SceneGraph, out: &mut Vec<HostEvent>) {
        match command {
            InputCommand::Gaze { target } => {
                let next = target.as_deref().and_then(|name| {
                    let resolved = scene.find_by_name(name);
                    if resolved.is_none() {
                        warn!(target = name, "gaze_target_unknown");
                    }
                    resolved.filter(|id| scene.is_attached(*id))
                });
                self.set_gaze(next, scene, out);
            }
            InputCommand::TouchDown => {
                if let Some(node) = self.gesture_target(scene) {
                    out.push(HostEvent::GestureTouchDown { node });
                }
            }
            InputCommand::TouchUp => {
                if let Some(node) = self.gesture_target(scene) {
                    out.push(HostEvent::GestureTouchUp { node });
                }
            }
            InputCommand::TouchCancel => {
                if let Some(node) = self.gesture_target(scene) {
                    out.push(HostEvent::GestureTouchCancel { node });
                }
            }
            InputCommand::Back => out.push(HostEvent::Back),
        }
    }

    /// Emits hover-out for a gazed node that left the scene.
    pub fn refresh(&mut self, scene: &SceneGraph, out: &mut Vec<HostEvent>) {
        if let Some(node) = self.gazed {
            if !scene.is_attached(node) {
                self.set_gaze(None, scene, out);
            }
        }
    }

    fn gesture_target(&self, scene: &SceneGraph) -> Option<NodeId> {
        self.gazed
            .filter(|node| scene.is_attached(*node) && scene.listeners(*node).gesture)
    }

    fn set_gaze(&mut self, next: Option<NodeId>, scene: &SceneGraph, out: &mut Vec<HostEvent>) {
        if self.gazed == next {
            return;
        }
        if let Some(previous) = self.gazed {
            if scene.listeners(previous).gaze_hover {
                out.push(HostEvent::GazeHoverOut { node: previous });
            }
        }
        if let Some(node) = next {
            if scene.listeners(node).gaze_hover {
                out.push(HostEvent::GazeHoverOver { node });
            }
        }
        self.gazed = next;
    }
}
