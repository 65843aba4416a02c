//! Room document store implementations.

pub mod inmemory;

pub use inmemory::InMemoryRoomRepository;
