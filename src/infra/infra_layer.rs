// The infra module contains implementations of the core store ports.
// Each backend implements all of them in its own submodule.

#[path = "sqlite/sqlite_store.rs"]
pub mod sqlite;

// Unit tests run against the in-memory backend.
#[cfg(test)]
#[path = "memory/in_memory_store.rs"]
pub mod memory;
