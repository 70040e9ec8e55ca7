use flint_host::{NodeId, Vec3};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Screen {
    #[default]
    Menu,
    Game,
}

/// Closed set of discrete actions consumed by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Action {
    /// Frame tick carrying the host timestamp in seconds.
    Frame { timestamp: f64 },
    StartGame,
    CancelGame,
    SpawnEnemy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Enemy {
    pub(crate) index: usize,
    pub(crate) session: u32,
    pub(crate) node: NodeId,
    pub(crate) position: Vec3,
}

/// Ordered spawned enemies. Slot order is spawn order.
#[derive(Debug, Default)]
pub(crate) struct EnemyRegistry {
    entities: Vec<Enemy>,
}

impl EnemyRegistry {
    pub(crate) fn push(&mut self, enemy: Enemy) {
        self.entities.push(enemy);
    }

    pub(crate) fn len(&self) -> usize {
        self.entities.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entities.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entities.iter_mut()
    }

    pub(crate) fn session_count(&self, session: u32) -> usize {
        self.iter()
            .filter(|enemy| enemy.session == session)
            .count()
    }

    /// Empties the registry, handing back what it held.
    pub(crate) fn take_all(&mut self) -> Vec<Enemy> {
        std::mem::take(&mut self.entities)
    }
}

#[derive(Debug)]
pub(crate) struct ApplicationState {
    pub(crate) screen: Screen,
    pub(crate) level: u32,
    pub(crate) clock_start: Option<f64>,
    pub(crate) elapsed_seconds: f64,
    pub(crate) spawned_count: usize,
    pub(crate) session: u32,
    pub(crate) entities: EnemyRegistry,
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self {
            screen: Screen::Menu,
            level: 1,
            clock_start: None,
            elapsed_seconds: 0.0,
            spawned_count: 0,
            session: 0,
            entities: EnemyRegistry::default(),
        }
    }
}

impl ApplicationState {
    pub(crate) fn session_entity_count(&self) -> usize {
        self.entities.session_count(self.session)
    }
}
