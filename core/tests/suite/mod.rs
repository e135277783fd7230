// Aggregates all integration tests as modules.
mod persistence;
mod scenarios;
