use flint_host::Vec3;

use super::types::{ApplicationState, Screen};
use crate::app::config::SpawnerConfig;

/// Captures the session baseline on the first call and refreshes
/// `elapsed_seconds`. Timestamps before the baseline clamp to zero.
/// Non-finite timestamps leave the state untouched and yield `None`.
pub(crate) fn advance_clock(state: &mut ApplicationState, timestamp: f64) -> Option<f64> {
    if !timestamp.is_finite() {
        return None;
    }
    let start = *state.clock_start.get_or_insert(timestamp);
    state.elapsed_seconds = (timestamp - start).max(0.0);
    Some(state.elapsed_seconds)
}

/// Spawn gate. Re-evaluated on every frame, so at most one spawn fires per
/// call and a dropped frame only delays the next spawn.
pub(crate) fn spawn_due(state: &ApplicationState, spawner: &SpawnerConfig) -> bool {
    state.screen == Screen::Game
        && state.level == 1
        && state.spawned_count < spawner.capacity
        && spawner.cadence_seconds * state.spawned_count as f64 <= state.elapsed_seconds
}

/// Position of the enemy in registry slot `index` after `elapsed_seconds`.
pub(crate) fn enemy_position(index: usize, elapsed_seconds: f64, spawner: &SpawnerConfig) -> Vec3 {
    Vec3::new(
        index as f32 * spawner.spacing - spawner.offset,
        spawner.spawn_position.y,
        elapsed_seconds as f32 - spawner.depth_bias,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_state() -> ApplicationState {
        ApplicationState {
            screen: Screen::Game,
            ..ApplicationState::default()
        }
    }

    #[test]
    fn first_timestamp_becomes_baseline() {
        let mut state = game_state();
        assert_eq!(advance_clock(&mut state, 100.0), Some(0.0));
        assert_eq!(state.clock_start, Some(100.0));
        assert_eq!(advance_clock(&mut state, 101.5), Some(1.5));
        assert_eq!(advance_clock(&mut state, 99.0), Some(0.0));
        assert_eq!(state.clock_start, Some(100.0));
    }

    #[test]
    fn non_finite_timestamps_never_set_the_baseline() {
        let mut state = game_state();
        assert_eq!(advance_clock(&mut state, f64::NAN), None);
        assert_eq!(advance_clock(&mut state, f64::INFINITY), None);
        assert_eq!(state.clock_start, None);
        assert_eq!(state.elapsed_seconds, 0.0);

        assert_eq!(advance_clock(&mut state, 4.0), Some(0.0));
        assert_eq!(advance_clock(&mut state, f64::NEG_INFINITY), None);
        assert_eq!(advance_clock(&mut state, 5.5), Some(1.5));
        assert_eq!(state.clock_start, Some(4.0));
    }

    #[test]
    fn gate_requires_game_screen_level_one_and_free_capacity() {
        let spawner = SpawnerConfig::default();
        let mut state = game_state();
        assert!(spawn_due(&state, &spawner));

        state.screen = Screen::Menu;
        assert!(!spawn_due(&state, &spawner));

        state.screen = Screen::Game;
        state.level = 2;
        assert!(!spawn_due(&state, &spawner));

        state.level = 1;
        state.spawned_count = spawner.capacity;
        state.elapsed_seconds = 1_000.0;
        assert!(!spawn_due(&state, &spawner));
    }

    #[test]
    fn gate_opens_on_cadence_boundary() {
        let spawner = SpawnerConfig::default();
        let mut state = game_state();
        state.spawned_count = 2;
        state.elapsed_seconds = 2.9;
        assert!(!spawn_due(&state, &spawner));
        state.elapsed_seconds = 3.0;
        assert!(spawn_due(&state, &spawner));
    }

    #[test]
    fn enemy_position_is_pure_and_index_local() {
        let spawner = SpawnerConfig::default();
        let first = enemy_position(3, 12.5, &spawner);
        assert_eq!(first, enemy_position(3, 12.5, &spawner));
        assert_eq!(first, Vec3::new(-30.0, 0.0, -87.5));
        assert_eq!(enemy_position(0, 0.0, &spawner), Vec3::new(-60.0, 0.0, -100.0));
        assert_eq!(enemy_position(7, 12.5, &spawner).z, first.z);
    }
}
