mod boundary;
mod clock;
mod dispatcher;
mod nodes;
mod types;

pub(crate) use boundary::SpawnerApp;
