//! Turn-ordered play between two processes sharing a session store.
//!
//! A room is a single record. The host opens it and owns the first turn,
//! a guest joins with the room password, and from then on only the
//! participant named in `turn_owner` may write a move. Every write is
//! guarded by the record's version so a stale writer is rejected instead
//! of overwriting its opponent's move.

use chrono::Utc;
use log::{debug, info, warn};

use crate::error::{SessionError, StoreError};
use crate::game::{GameKind, GameOutcome, GameState, Player};

use super::accounts::{hash_password, verify_password};
use super::poll::{Backoff, PollPolicy, Sleeper};
use super::snapshot::GameSnapshot;
use super::store::{RoomSummary, SessionRecord, SessionStatus, SessionStore};

/// A decoded session record.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomView {
    pub room_id: String,
    pub host_id: String,
    pub guest_id: Option<String>,
    pub turn_owner: Option<String>,
    pub status: SessionStatus,
    pub state: GameState,
    pub version: u64,
}

impl RoomView {
    fn from_record(record: SessionRecord) -> Result<Self, SessionError> {
        let state = record.snapshot.to_state()?;
        Ok(RoomView {
            room_id: record.room_id,
            host_id: record.host_id,
            guest_id: record.guest_id,
            turn_owner: record.turn_owner,
            status: record.status,
            state,
            version: record.version,
        })
    }

    pub fn is_turn_of(&self, identity: &str) -> bool {
        self.status == SessionStatus::Playing && self.turn_owner.as_deref() == Some(identity)
    }

    /// Identity of the winner once the game is finished.
    pub fn winner_id(&self) -> Option<&str> {
        match self.state.outcome()? {
            GameOutcome::Winner(Player::One) => Some(self.host_id.as_str()),
            GameOutcome::Winner(Player::Two) => self.guest_id.as_deref(),
            GameOutcome::Draw => None,
        }
    }
}

/// Result of a blocking wait.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    Mine(RoomView),
    Finished(RoomView),
}

/// One side of a room, bound to the store it plays through.
#[derive(Debug)]
pub struct Participant<'s, S: SessionStore> {
    store: &'s S,
    room_id: String,
    identity: String,
    seat: Player,
    policy: PollPolicy,
}

/// Create a room in `Waiting` status with `host` owning the first turn.
pub fn open_room<'s, S: SessionStore>(
    store: &'s S,
    host: &str,
    room_id: &str,
    password: &str,
    kind: GameKind,
) -> Result<Participant<'s, S>, SessionError> {
    if room_id.trim().is_empty() || password.is_empty() {
        return Err(SessionError::InvalidRoom);
    }
    let record = SessionRecord {
        room_id: room_id.to_string(),
        password_hash: hash_password(password)?,
        host_id: host.to_string(),
        guest_id: None,
        turn_owner: Some(host.to_string()),
        snapshot: GameSnapshot::capture(&GameState::initial(kind)),
        status: SessionStatus::Waiting,
        updated_at: Utc::now(),
        version: 0,
    };
    store.create(&record)?;
    info!("{host} opened {kind} room {room_id}");
    Ok(Participant::new(store, room_id, host, Player::One))
}

/// Take the free seat of a waiting room.
pub fn join_room<'s, S: SessionStore>(
    store: &'s S,
    guest: &str,
    room_id: &str,
    password: &str,
) -> Result<Participant<'s, S>, SessionError> {
    let mut record = store.read(room_id)?;
    if !verify_password(password, &record.password_hash)? {
        return Err(SessionError::AuthFailure);
    }
    if record.status != SessionStatus::Waiting || record.host_id == guest {
        return Err(SessionError::RoomUnavailable(room_id.to_string()));
    }
    let version = record.version;
    record.guest_id = Some(guest.to_string());
    record.status = SessionStatus::Playing;
    store.update(&record, version)?;
    info!("{guest} joined room {room_id} hosted by {}", record.host_id);
    Ok(Participant::new(store, room_id, guest, Player::Two))
}

/// Rooms a guest could join.
pub fn list_open_rooms<S: SessionStore>(store: &S) -> Result<Vec<RoomSummary>, SessionError> {
    Ok(store.list_waiting()?)
}

impl<'s, S: SessionStore> Participant<'s, S> {
    fn new(store: &'s S, room_id: &str, identity: &str, seat: Player) -> Self {
        Participant {
            store,
            room_id: room_id.to_string(),
            identity: identity.to_string(),
            seat,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Player One for the host, Player Two for the guest.
    pub fn seat(&self) -> Player {
        self.seat
    }

    /// Read the current record. `SessionNotFound` once the room is gone.
    pub fn refresh(&self) -> Result<RoomView, SessionError> {
        RoomView::from_record(self.store.read(&self.room_id)?)
    }

    /// Play `column` and hand the turn to the opponent in one versioned write.
    pub fn submit_move(&self, column: usize) -> Result<RoomView, SessionError> {
        let mut record = self.store.read(&self.room_id)?;
        match record.status {
            SessionStatus::Waiting => return Err(SessionError::NotYourTurn),
            SessionStatus::Finished => return Err(SessionError::GameOver),
            SessionStatus::Playing => {}
        }
        if record.turn_owner.as_deref() != Some(self.identity.as_str()) {
            return Err(SessionError::NotYourTurn);
        }

        let mut state = record.snapshot.to_state()?;
        state.place_piece(column, self.seat)?;

        let version = record.version;
        record.snapshot = GameSnapshot::capture(&state);
        if state.is_terminal() {
            record.status = SessionStatus::Finished;
            record.turn_owner = None;
        } else {
            record.turn_owner = match self.seat {
                Player::One => record.guest_id.clone(),
                Player::Two => Some(record.host_id.clone()),
            };
        }

        match self.store.update(&record, version) {
            Ok(new_version) => record.version = new_version,
            Err(StoreError::Conflict(room)) => {
                warn!("{} lost a write race in room {room}", self.identity);
                return Err(SessionError::Conflict(room));
            }
            Err(e) => return Err(e.into()),
        }

        let view = RoomView::from_record(record)?;
        if view.status == SessionStatus::Finished {
            match view.winner_id() {
                Some(winner) => info!("room {} finished, {winner} wins", self.room_id),
                None => info!("room {} finished in a draw", self.room_id),
            }
        }
        Ok(view)
    }

    /// Block until it is this participant's turn or the game has ended.
    pub fn wait_for_turn(&self, sleeper: &mut impl Sleeper) -> Result<Turn, SessionError> {
        self.poll(sleeper, |view| match view.status {
            SessionStatus::Finished => Some(Turn::Finished(view.clone())),
            _ if view.is_turn_of(&self.identity) => Some(Turn::Mine(view.clone())),
            _ => None,
        })
    }

    /// Block until a guest has joined.
    pub fn wait_for_opponent(&self, sleeper: &mut impl Sleeper) -> Result<RoomView, SessionError> {
        self.poll(sleeper, |view| {
            (view.status != SessionStatus::Waiting).then(|| view.clone())
        })
    }

    fn poll<T>(
        &self,
        sleeper: &mut impl Sleeper,
        mut ready: impl FnMut(&RoomView) -> Option<T>,
    ) -> Result<T, SessionError> {
        let mut backoff = Backoff::new(self.policy);
        let mut seen_version = None;
        loop {
            let view = self.refresh()?;
            if let Some(done) = ready(&view) {
                return Ok(done);
            }
            if seen_version.is_some_and(|v| v != view.version) {
                backoff.reset();
            }
            seen_version = Some(view.version);
            if backoff.expired() {
                return Err(SessionError::TimedOut(backoff.waited()));
            }
            let delay = backoff.next_delay();
            debug!(
                "{} waiting in room {} ({:?}, version {})",
                self.identity, self.room_id, delay, view.version
            );
            sleeper.sleep(delay);
        }
    }

    /// Delete the room. The opponent sees `SessionNotFound` afterwards.
    pub fn leave(self) -> Result<(), SessionError> {
        match self.store.delete(&self.room_id) {
            Ok(()) => {
                info!("{} dissolved room {}", self.identity, self.room_id);
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell as StdCell;
    use std::time::Duration;

    use super::*;
    use crate::game::Playable;
    use crate::session::MemoryStore;
    use assert_matches::assert_matches;

    fn no_sleep(_: Duration) {}

    type Seat<'s> = Participant<'s, MemoryStore>;

    fn playing_room(store: &MemoryStore, kind: GameKind) -> (Seat<'_>, Seat<'_>) {
        let host = open_room(store, "alice", "12345", "secret", kind).unwrap();
        let guest = join_room(store, "bob", "12345", "secret").unwrap();
        (host, guest)
    }

    #[test]
    fn test_open_and_join() {
        let store = MemoryStore::new();
        let host = open_room(&store, "alice", "12345", "secret", GameKind::Classic).unwrap();
        assert_eq!(host.seat(), Player::One);

        let lobby = list_open_rooms(&store).unwrap();
        assert_eq!(lobby.len(), 1);
        assert_eq!(lobby[0].host_id, "alice");
        assert_eq!(lobby[0].kind, GameKind::Classic);

        let view = host.refresh().unwrap();
        assert_eq!(view.status, SessionStatus::Waiting);
        assert_eq!(view.turn_owner.as_deref(), Some("alice"));

        let guest = join_room(&store, "bob", "12345", "secret").unwrap();
        assert_eq!(guest.seat(), Player::Two);
        let view = guest.refresh().unwrap();
        assert_eq!(view.status, SessionStatus::Playing);
        assert_eq!(view.guest_id.as_deref(), Some("bob"));
        assert!(list_open_rooms(&store).unwrap().is_empty());
    }

    #[test]
    fn test_password_is_not_stored_in_clear() {
        let store = MemoryStore::new();
        open_room(&store, "alice", "12345", "secret", GameKind::Classic).unwrap();
        let record = store.read("12345").unwrap();
        assert!(!record.password_hash.contains("secret"));
    }

    #[test]
    fn test_duplicate_and_invalid_rooms() {
        let store = MemoryStore::new();
        open_room(&store, "alice", "12345", "secret", GameKind::Classic).unwrap();
        assert_matches!(
            open_room(&store, "carol", "12345", "other", GameKind::Cascade),
            Err(SessionError::DuplicateKey(id)) if id == "12345"
        );
        assert_eq!(store.read("12345").unwrap().host_id, "alice");
        assert_matches!(
            open_room(&store, "carol", "", "pw", GameKind::Classic),
            Err(SessionError::InvalidRoom)
        );
        assert_matches!(
            open_room(&store, "carol", "777", "", GameKind::Classic),
            Err(SessionError::InvalidRoom)
        );
    }

    #[test]
    fn test_join_rejections() {
        let store = MemoryStore::new();
        open_room(&store, "alice", "12345", "secret", GameKind::Classic).unwrap();

        assert_matches!(
            join_room(&store, "bob", "12345", "guess"),
            Err(SessionError::AuthFailure)
        );
        assert_eq!(store.read("12345").unwrap().status, SessionStatus::Waiting);

        assert_matches!(
            join_room(&store, "alice", "12345", "secret"),
            Err(SessionError::RoomUnavailable(_))
        );
        assert_matches!(
            join_room(&store, "bob", "99999", "secret"),
            Err(SessionError::SessionNotFound(_))
        );

        join_room(&store, "bob", "12345", "secret").unwrap();
        assert_matches!(
            join_room(&store, "carol", "12345", "secret"),
            Err(SessionError::RoomUnavailable(_))
        );
    }

    #[test]
    fn test_turn_order_is_enforced() {
        let store = MemoryStore::new();
        let host = open_room(&store, "alice", "12345", "secret", GameKind::Classic).unwrap();
        // Nobody to play against yet
        assert_matches!(host.submit_move(3), Err(SessionError::NotYourTurn));

        let guest = join_room(&store, "bob", "12345", "secret").unwrap();
        assert_matches!(guest.submit_move(3), Err(SessionError::NotYourTurn));

        let view = host.submit_move(3).unwrap();
        assert_eq!(view.turn_owner.as_deref(), Some("bob"));
        assert_eq!(view.version, 2);
        assert_matches!(host.submit_move(3), Err(SessionError::NotYourTurn));

        let view = guest.submit_move(3).unwrap();
        assert_eq!(view.turn_owner.as_deref(), Some("alice"));
    }

    #[test]
    fn test_invalid_move_leaves_record_untouched() {
        let store = MemoryStore::new();
        let (host, _guest) = playing_room(&store, GameKind::Classic);
        let before = host.refresh().unwrap();

        assert_matches!(
            host.submit_move(9),
            Err(SessionError::InvalidMove(crate::game::MoveError::InvalidColumn))
        );
        assert_eq!(host.refresh().unwrap(), before);
    }

    #[test]
    fn test_full_column_keeps_turn_owner() {
        let store = MemoryStore::new();
        let (host, guest) = playing_room(&store, GameKind::Classic);
        for _ in 0..3 {
            host.submit_move(0).unwrap();
            guest.submit_move(0).unwrap();
        }
        let before = host.refresh().unwrap();
        assert_eq!(before.turn_owner.as_deref(), Some("alice"));

        assert_matches!(
            host.submit_move(0),
            Err(SessionError::InvalidMove(crate::game::MoveError::ColumnFull))
        );
        let after = host.refresh().unwrap();
        assert_eq!(after, before);
        host.submit_move(1).unwrap();
    }

    #[test]
    fn test_classic_game_to_the_end() {
        let store = MemoryStore::new();
        let (host, guest) = playing_room(&store, GameKind::Classic);

        for _ in 0..3 {
            host.submit_move(0).unwrap();
            guest.submit_move(1).unwrap();
        }
        let view = host.submit_move(0).unwrap();
        assert_eq!(view.status, SessionStatus::Finished);
        assert_eq!(view.turn_owner, None);
        assert_eq!(view.winner_id(), Some("alice"));

        let seen = guest.refresh().unwrap();
        assert_eq!(seen.state.outcome(), Some(GameOutcome::Winner(Player::One)));
        assert_matches!(guest.submit_move(2), Err(SessionError::GameOver));
        assert_matches!(
            guest.wait_for_turn(&mut no_sleep),
            Ok(Turn::Finished(view)) if view.winner_id() == Some("alice")
        );
    }

    #[test]
    fn test_cascade_room_keeps_rules() {
        let store = MemoryStore::new();
        let (host, guest) = playing_room(&store, GameKind::Cascade);
        for col in 0..3 {
            host.submit_move(col).unwrap();
            guest.submit_move(col).unwrap();
        }
        let view = host.submit_move(3).unwrap();
        let GameState::Cascade(game) = view.state else {
            panic!("expected a cascade game");
        };
        assert_eq!(game.scores(), [1, 0]);
        assert_eq!(game.match_count(), 1);
        assert_eq!(view.turn_owner.as_deref(), Some("bob"));
        assert_eq!(view.state.legal_columns().len(), 5);
    }

    #[test]
    fn test_leave_dissolves_room() {
        let store = MemoryStore::new();
        let (host, guest) = playing_room(&store, GameKind::Classic);
        host.leave().unwrap();

        assert_matches!(guest.refresh(), Err(SessionError::SessionNotFound(_)));
        assert_matches!(
            guest.wait_for_turn(&mut no_sleep),
            Err(SessionError::SessionNotFound(_))
        );
        assert_matches!(guest.submit_move(0), Err(SessionError::SessionNotFound(_)));
        // Leaving an already dissolved room is fine
        guest.leave().unwrap();
    }

    #[test]
    fn test_wait_for_turn_sees_opponent_move() {
        let store = MemoryStore::new();
        let (host, guest) = playing_room(&store, GameKind::Classic);
        let sleeps = StdCell::new(0);

        let turn = guest
            .wait_for_turn(&mut |_: Duration| {
                sleeps.set(sleeps.get() + 1);
                if sleeps.get() == 3 {
                    host.submit_move(4).unwrap();
                }
            })
            .unwrap();

        assert_eq!(sleeps.get(), 3);
        let Turn::Mine(view) = turn else {
            panic!("expected guest's turn");
        };
        assert_eq!(view.turn_owner.as_deref(), Some("bob"));
    }

    #[test]
    fn test_wait_for_opponent() {
        let store = MemoryStore::new();
        let host = open_room(&store, "alice", "12345", "secret", GameKind::Cascade).unwrap();
        let mut guest = None;

        let view = host
            .wait_for_opponent(&mut |_: Duration| {
                if guest.is_none() {
                    guest = Some(join_room(&store, "bob", "12345", "secret").unwrap());
                }
            })
            .unwrap();

        assert_eq!(view.status, SessionStatus::Playing);
        assert_eq!(view.guest_id.as_deref(), Some("bob"));
        assert!(guest.is_some());
    }

    #[test]
    fn test_wait_backs_off_and_times_out() {
        let store = MemoryStore::new();
        // Alice never moves, so Bob keeps waiting
        let (_host, guest) = playing_room(&store, GameKind::Classic);
        let guest = guest.with_poll_policy(PollPolicy {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(400),
            factor: 2,
            timeout: Some(Duration::from_secs(1)),
        });
        let mut slept = Vec::new();

        let result = guest.wait_for_turn(&mut |d: Duration| slept.push(d.as_millis() as u64));

        assert_matches!(result, Err(SessionError::TimedOut(_)));
        assert_eq!(slept, vec![100, 200, 400, 400]);
    }

    /// Store that lets another writer slip in between a read and the update.
    struct RacingStore {
        inner: MemoryStore,
        race: StdCell<bool>,
    }

    impl SessionStore for RacingStore {
        fn create(&self, record: &SessionRecord) -> Result<(), StoreError> {
            self.inner.create(record)
        }

        fn read(&self, room_id: &str) -> Result<SessionRecord, StoreError> {
            let record = self.inner.read(room_id)?;
            if self.race.replace(false) {
                self.inner.update(&record, record.version)?;
            }
            Ok(record)
        }

        fn update(&self, record: &SessionRecord, expected: u64) -> Result<u64, StoreError> {
            self.inner.update(record, expected)
        }

        fn delete(&self, room_id: &str) -> Result<(), StoreError> {
            self.inner.delete(room_id)
        }

        fn list_waiting(&self) -> Result<Vec<RoomSummary>, StoreError> {
            self.inner.list_waiting()
        }
    }

    #[test]
    fn test_stale_write_is_rejected() {
        let store = RacingStore {
            inner: MemoryStore::new(),
            race: StdCell::new(false),
        };
        let host = open_room(&store, "alice", "12345", "secret", GameKind::Classic).unwrap();
        join_room(&store, "bob", "12345", "secret").unwrap();

        store.race.set(true);
        assert_matches!(host.submit_move(3), Err(SessionError::Conflict(_)));

        let view = host.refresh().unwrap();
        assert_eq!(view.version, 2);
        assert_eq!(view.state, GameState::initial(GameKind::Classic));
        // A fresh attempt goes through
        host.submit_move(3).unwrap();
    }
}
