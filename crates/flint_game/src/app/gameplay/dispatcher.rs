use flint_host::{NodeId, SceneCollaborator, SceneError};
use tracing::{debug, info, trace, warn};

use super::clock::{advance_clock, enemy_position, spawn_due};
use super::nodes;
use super::types::{Action, ApplicationState, Enemy, Screen};
use crate::app::config::{GameplayConfig, RestartPolicy};

/// Owns the application state and applies actions to it one at a time.
#[derive(Debug)]
pub(crate) struct GameController {
    config: GameplayConfig,
    state: ApplicationState,
    menu_node: NodeId,
    game_node: NodeId,
}

impl GameController {
    /// Builds the menu and game nodes and shows the menu.
    pub(crate) fn new(
        config: GameplayConfig,
        scene: &mut dyn SceneCollaborator,
    ) -> Result<Self, SceneError> {
        let menu_node = scene.create_node(&nodes::menu_node(&config.menu))?;
        let game_node = scene.create_node(&nodes::game_node())?;
        scene.attach(menu_node)?;
        info!(
            menu = ?menu_node,
            game = ?game_node,
            restart_policy = ?config.restart_policy,
            "controller_ready"
        );
        Ok(Self {
            config,
            state: ApplicationState::default(),
            menu_node,
            game_node,
        })
    }

    pub(crate) fn state(&self) -> &ApplicationState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut ApplicationState {
        &mut self.state
    }

    pub(crate) fn menu_node(&self) -> NodeId {
        self.menu_node
    }

    pub(crate) fn game_node(&self) -> NodeId {
        self.game_node
    }

    pub(crate) fn dispatch(&mut self, action: Action, scene: &mut dyn SceneCollaborator) {
        trace!(action = ?action, "dispatch");
        match action {
            Action::Frame { timestamp } => self.on_frame(timestamp, scene),
            Action::StartGame => self.start_game(scene),
            Action::CancelGame => self.cancel_game(scene),
            Action::SpawnEnemy => self.spawn_enemy(scene),
        }
        self.debug_check_invariants();
    }

    fn on_frame(&mut self, timestamp: f64, scene: &mut dyn SceneCollaborator) {
        if self.state.screen != Screen::Game {
            trace!(timestamp, "frame_ignored");
            return;
        }
        if advance_clock(&mut self.state, timestamp).is_none() {
            warn!(timestamp, "frame_timestamp_rejected");
            return;
        }
        if spawn_due(&self.state, &self.config.spawner) {
            self.dispatch(Action::SpawnEnemy, scene);
        }
        self.update_positions(scene);
    }

    fn start_game(&mut self, scene: &mut dyn SceneCollaborator) {
        self.state.screen = Screen::Game;
        self.state.level = 1;
        self.state.spawned_count = 0;
        self.state.session = self.state.session.saturating_add(1);
        if self.config.restart_policy == RestartPolicy::Clear {
            self.clear_enemies(scene);
        }
        absorb(scene.detach(self.menu_node), "detach_menu");
        absorb(scene.attach(self.game_node), "attach_game");
        info!(
            session = self.state.session,
            retained_enemies = self.state.entities.len(),
            "game_started"
        );
    }

    fn cancel_game(&mut self, scene: &mut dyn SceneCollaborator) {
        self.state.screen = Screen::Menu;
        self.state.level = 1;
        absorb(scene.detach(self.game_node), "detach_game");
        absorb(scene.attach(self.menu_node), "attach_menu");
        info!(
            session = self.state.session,
            spawned = self.state.spawned_count,
            "game_cancelled"
        );
    }

    fn spawn_enemy(&mut self, scene: &mut dyn SceneCollaborator) {
        let spawner = &self.config.spawner;
        let index = self.state.spawned_count;
        let desc = nodes::enemy_node(spawner, self.state.session, index);
        let Some(node) = absorb(scene.create_node(&desc), "create_enemy") else {
            return;
        };
        self.state.spawned_count += 1;
        self.state.entities.push(Enemy {
            index,
            session: self.state.session,
            node,
            position: spawner.spawn_position,
        });
        absorb(scene.add_child(self.game_node, node), "add_enemy");
        debug!(
            index,
            session = self.state.session,
            elapsed_seconds = self.state.elapsed_seconds,
            "enemy_spawned"
        );
        if self.state.spawned_count == spawner.capacity {
            info!(
                session = self.state.session,
                capacity = spawner.capacity,
                "spawn_capacity_reached"
            );
        }
    }

    fn clear_enemies(&mut self, scene: &mut dyn SceneCollaborator) {
        let removed = self.state.entities.take_all();
        for enemy in &removed {
            trace!(index = enemy.index, session = enemy.session, "enemy_removed");
            absorb(scene.destroy_node(enemy.node), "destroy_enemy");
        }
        if !removed.is_empty() {
            debug!(removed = removed.len(), "enemies_cleared");
        }
    }

    fn update_positions(&mut self, scene: &mut dyn SceneCollaborator) {
        let elapsed = self.state.elapsed_seconds;
        let spawner = &self.config.spawner;
        for (slot, enemy) in self.state.entities.iter_mut().enumerate() {
            enemy.position = enemy_position(slot, elapsed, spawner);
            absorb(scene.set_position(enemy.node, enemy.position), "move_enemy");
        }
    }

    fn debug_check_invariants(&self) {
        let state = &self.state;
        debug_assert!(state.level >= 1, "level dropped below 1");
        debug_assert!(state.elapsed_seconds >= 0.0, "negative elapsed time");
        debug_assert_eq!(
            state.spawned_count,
            state.session_entity_count(),
            "spawn count out of step with the session's enemies"
        );
    }
}

/// Scene rejections are logged and dropped; the controller keeps going.
fn absorb<T>(result: Result<T, SceneError>, operation: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(operation, error = %error, "scene_call_rejected");
            None
        }
    }
}
