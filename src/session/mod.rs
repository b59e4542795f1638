//! Networked play through a shared session store.

pub mod accounts;
pub mod poll;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use accounts::{login, register};
pub use poll::{Backoff, PollPolicy, Sleeper, ThreadSleeper};
pub use snapshot::GameSnapshot;
pub use store::{
    AccountStore, MemoryStore, RoomSummary, SessionRecord, SessionStatus, SessionStore,
    SqliteStore,
};
pub use sync::{join_room, list_open_rooms, open_room, Participant, RoomView, Turn};
