use flint_host::{App, HostEvent, SceneCollaborator, SceneError, Vec4};
use tracing::{debug, trace, warn};

use super::dispatcher::GameController;
use super::types::{Action, Screen};
use crate::app::config::GameplayConfig;

/// Host-facing side of the game: maps host events on known nodes to actions
/// and keeps menu highlighting out of the action set.
#[derive(Debug)]
pub(crate) struct SpawnerApp {
    config: GameplayConfig,
    controller: Option<GameController>,
    menu_color: Vec4,
}

impl SpawnerApp {
    pub(crate) fn new(config: GameplayConfig) -> Self {
        let menu_color = config.menu.text_color;
        Self {
            config,
            controller: None,
            menu_color,
        }
    }

    pub(crate) fn controller(&self) -> Option<&GameController> {
        self.controller.as_ref()
    }

    /// Translates a host event into an action, if it maps to one.
    pub(crate) fn translate(&self, event: &HostEvent) -> Option<Action> {
        let controller = self.controller.as_ref()?;
        match *event {
            HostEvent::Frame(frame) if frame.node == controller.game_node() => Some(Action::Frame {
                timestamp: frame.now,
            }),
            HostEvent::GestureTouchUp { node } if node == controller.menu_node() => {
                Some(Action::StartGame)
            }
            HostEvent::Back if controller.state().screen == Screen::Game => {
                Some(Action::CancelGame)
            }
            _ => None,
        }
    }

    fn set_menu_highlight(&mut self, highlighted: bool, scene: &mut dyn SceneCollaborator) {
        let Some(controller) = self.controller.as_ref() else {
            return;
        };
        self.menu_color.x = if highlighted {
            self.config.menu.highlight_red
        } else {
            self.config.menu.text_color.x
        };
        if let Err(error) = scene.set_text_color(controller.menu_node(), self.menu_color) {
            warn!(error = %error, "menu_highlight_rejected");
        }
    }
}

impl App for SpawnerApp {
    fn load(&mut self, scene: &mut dyn SceneCollaborator) -> Result<(), SceneError> {
        self.controller = Some(GameController::new(self.config.clone(), scene)?);
        Ok(())
    }

    fn handle_event(&mut self, event: &HostEvent, scene: &mut dyn SceneCollaborator) {
        if let Some(action) = self.translate(event) {
            if let Some(controller) = self.controller.as_mut() {
                controller.dispatch(action, scene);
            }
            return;
        }

        let menu_node = self.controller.as_ref().map(GameController::menu_node);
        match *event {
            HostEvent::GazeHoverOver { node } if Some(node) == menu_node => {
                self.set_menu_highlight(true, scene)
            }
            HostEvent::GazeHoverOut { node } if Some(node) == menu_node => {
                self.set_menu_highlight(false, scene)
            }
            HostEvent::Back => debug!("back_ignored_on_menu"),
            _ => trace!(event = event.label(), target = ?event.target(), "event_unhandled"),
        }
    }

    fn debug_status(&self) -> Option<String> {
        let state = self.controller.as_ref()?.state();
        Some(format!(
            "screen={:?} session={} spawned={} enemies={} elapsed={:.1}s",
            state.screen,
            state.session,
            state.spawned_count,
            state.entities.len(),
            state.elapsed_seconds
        ))
    }
}
