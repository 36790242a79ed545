//! Integration tests for room membership, master election, and routing.

use std::sync::Arc;

use roomcast_protocol::Recipient;
use roomcast_room::{RandomRoomPolicy, RoomConfig, RoomError, RoomManager};
use roomcast_transport::ConnectionId;
use tokio::sync::Mutex;

// =========================================================================
// Helpers
// =========================================================================

fn conn(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn deterministic() -> RoomManager {
    RoomManager::new(RoomConfig {
        random_policy: RandomRoomPolicy::FirstByName,
        ..RoomConfig::default()
    })
}

fn assert_consistent(mgr: &RoomManager) {
    if let Err(e) = mgr.directory().check_invariants() {
        panic!("directory invariant broken: {e}");
    }
}

/// Room `shua` with players A, B, C on connections 1, 2, 3. A is master.
fn room_abc() -> RoomManager {
    let mut mgr = deterministic();
    mgr.create_room(conn(1), "shua", "A").unwrap();
    mgr.join_room(conn(2), "shua", "B").unwrap();
    mgr.join_room(conn(3), "shua", "C").unwrap();
    mgr
}

// =========================================================================
// Create / join
// =========================================================================

#[test]
fn test_create_room_derives_prefix_and_sets_master() {
    let mut mgr = deterministic();
    let info = mgr.create_room(conn(1), "shuashua", "alice").unwrap();

    assert_eq!(info.name, "shua");
    assert_eq!(info.master, "alice");
    assert_eq!(info.player_count, 1);
    assert_eq!(mgr.room_names(), ["shua"]);
    assert_eq!(mgr.room_of(conn(1)).unwrap().name(), "shua");
    assert_consistent(&mgr);
}

#[test]
fn test_second_player_joins_existing_room() {
    let mut mgr = deterministic();
    mgr.create_room(conn(1), "shuashua", "alice").unwrap();
    let info = mgr.join_room(conn(2), "shua", "bob").unwrap();

    assert_eq!(info.name, "shua");
    assert_eq!(info.master, "alice");
    assert_eq!(info.player_count, 2);
    assert_consistent(&mgr);
}

#[test]
fn test_join_missing_room_falls_back_to_create() {
    let mut mgr = deterministic();
    let info = mgr.join_room(conn(1), "lobby", "alice").unwrap();

    assert_eq!(info.name, "lobb");
    assert_eq!(info.master, "alice");
    assert_eq!(mgr.room_count(), 1);
    assert_consistent(&mgr);
}

#[test]
fn test_join_fallback_with_short_name_is_invalid() {
    let mut mgr = deterministic();
    let err = mgr.join_room(conn(1), "ab", "alice").unwrap_err();
    assert!(matches!(err, RoomError::InvalidRequest(_)));
    assert_eq!(mgr.room_count(), 0);
    assert_consistent(&mgr);
}

#[test]
fn test_create_on_taken_name_joins_existing_room() {
    let mut mgr = deterministic();
    mgr.create_room(conn(1), "shuashua", "alice").unwrap();
    let info = mgr.create_room(conn(2), "shuaXYZ", "bob").unwrap();

    assert_eq!(info.name, "shua");
    assert_eq!(info.master, "alice", "existing room must not be replaced");
    assert_eq!(info.player_count, 2);
    assert_eq!(mgr.room_count(), 1);
    assert_consistent(&mgr);
}

#[test]
fn test_duplicate_player_id_is_rejected() {
    let mut mgr = deterministic();
    mgr.create_room(conn(1), "shua", "alice").unwrap();
    let err = mgr.join_room(conn(2), "shua", "alice").unwrap_err();

    assert!(matches!(err, RoomError::DuplicatePlayer { .. }));
    assert_eq!(err.code(), 409);
    assert_eq!(mgr.room("shua").unwrap().player_count(), 1);
    assert!(mgr.room_of(conn(2)).is_none());
    assert_consistent(&mgr);
}

#[test]
fn test_connection_cannot_be_in_two_rooms() {
    let mut mgr = deterministic();
    mgr.create_room(conn(1), "shua", "alice").unwrap();
    let err = mgr.create_room(conn(1), "lobby", "alice").unwrap_err();

    assert!(matches!(err, RoomError::AlreadyInRoom(_, ref room) if room == "shua"));
    assert_eq!(mgr.room_count(), 1);
    assert_consistent(&mgr);
}

#[test]
fn test_join_random_with_no_rooms_creates_default_room() {
    let mut mgr = deterministic();
    let info = mgr.join_random_room(conn(1), "alice").unwrap();
    assert_eq!(info.name, "shua");
    assert_eq!(info.master, "alice");
}

#[test]
fn test_join_random_uses_configured_default_room() {
    let mut mgr = RoomManager::new(RoomConfig {
        default_room_name: "arena".into(),
        ..RoomConfig::default()
    });
    let info = mgr.join_random_room(conn(1), "alice").unwrap();
    assert_eq!(info.name, "aren");
}

#[test]
fn test_join_random_first_by_name_picks_lowest_room() {
    let mut mgr = deterministic();
    mgr.create_room(conn(1), "zulu", "a").unwrap();
    mgr.create_room(conn(2), "alfa", "b").unwrap();

    let info = mgr.join_random_room(conn(3), "c").unwrap();
    assert_eq!(info.name, "alfa");
    assert_eq!(info.player_count, 2);
    assert_consistent(&mgr);
}

#[test]
fn test_join_random_uniform_joins_some_existing_room() {
    let mut mgr = RoomManager::default();
    mgr.create_room(conn(1), "zulu", "a").unwrap();
    mgr.create_room(conn(2), "alfa", "b").unwrap();

    let info = mgr.join_random_room(conn(3), "c").unwrap();
    assert!(info.name == "alfa" || info.name == "zulu");
    assert_eq!(mgr.room_count(), 2);
    assert_consistent(&mgr);
}

// =========================================================================
// Leave / election
// =========================================================================

#[test]
fn test_master_leaving_elects_first_remaining_player() {
    let mut mgr = room_abc();
    let departure = mgr.leave_room(conn(1)).unwrap();

    assert_eq!(departure.player.id, "A");
    assert_eq!(departure.new_master.as_deref(), Some("B"));
    assert!(!departure.room_closed);

    let room = mgr.room("shua").unwrap();
    assert_eq!(room.master_id(), "B");
    assert!(!room.has_player("A"));
    assert_consistent(&mgr);
}

#[test]
fn test_non_master_leaving_keeps_master() {
    let mut mgr = room_abc();
    let departure = mgr.leave_room(conn(2)).unwrap();

    assert_eq!(departure.player.id, "B");
    assert!(departure.new_master.is_none());
    assert_eq!(mgr.room("shua").unwrap().master_id(), "A");
    assert_consistent(&mgr);
}

#[test]
fn test_last_player_leaving_removes_room() {
    let mut mgr = deterministic();
    mgr.create_room(conn(1), "shua", "alice").unwrap();

    let departure = mgr.leave_room(conn(1)).unwrap();
    assert!(departure.room_closed);
    assert!(mgr.room("shua").is_none());
    assert_eq!(mgr.room_count(), 0);
    assert_eq!(mgr.directory().bound_connections(), 0);
}

#[test]
fn test_leaving_twice_is_a_no_op() {
    let mut mgr = room_abc();
    mgr.leave_room(conn(2)).unwrap();

    let err = mgr.leave_room(conn(2)).unwrap_err();
    assert!(matches!(err, RoomError::NotInRoom(_)));

    let room = mgr.room("shua").unwrap();
    assert_eq!(room.player_count(), 2);
    assert_eq!(room.master_id(), "A");
    assert_consistent(&mgr);
}

#[test]
fn test_leave_without_joining_is_not_in_room() {
    let mut mgr = deterministic();
    assert!(matches!(
        mgr.leave_room(conn(42)),
        Err(RoomError::NotInRoom(_))
    ));
}

#[test]
fn test_room_can_be_recreated_after_it_empties() {
    let mut mgr = deterministic();
    mgr.create_room(conn(1), "shua", "alice").unwrap();
    mgr.leave_room(conn(1)).unwrap();

    let info = mgr.create_room(conn(2), "shua", "bob").unwrap();
    assert_eq!(info.master, "bob");
    assert_eq!(info.player_count, 1);
}

#[test]
fn test_successive_master_departures_follow_join_order() {
    let mut mgr = room_abc();
    mgr.leave_room(conn(1)).unwrap();
    let departure = mgr.leave_room(conn(2)).unwrap();
    assert_eq!(departure.new_master.as_deref(), Some("C"));
    assert_eq!(mgr.room("shua").unwrap().master_id(), "C");
    assert_consistent(&mgr);
}

// =========================================================================
// Routing
// =========================================================================

#[test]
fn test_others_excludes_sender() {
    let mgr = room_abc();
    let targets = mgr.router().targets(conn(2), &Recipient::Others);
    assert_eq!(targets, [conn(1), conn(3)]);
}

#[test]
fn test_room_includes_sender() {
    let mgr = room_abc();
    let targets = mgr.router().targets(conn(2), &Recipient::Room);
    assert_eq!(targets, [conn(1), conn(2), conn(3)]);
}

#[test]
fn test_sender_is_only_sender() {
    let mgr = room_abc();
    let targets = mgr.router().targets(conn(3), &Recipient::Sender);
    assert_eq!(targets, [conn(3)]);
}

#[test]
fn test_room_named_reaches_members_after_sender_left() {
    let mut mgr = room_abc();
    mgr.leave_room(conn(1)).unwrap();

    let router = mgr.router();
    assert!(router.targets(conn(1), &Recipient::Room).is_empty());
    assert_eq!(
        router.targets(conn(1), &Recipient::RoomNamed("shua".into())),
        [conn(2), conn(3)]
    );
}

#[test]
fn test_routing_from_roomless_sender_reaches_nobody() {
    let mgr = room_abc();
    let router = mgr.router();
    assert!(router.targets(conn(99), &Recipient::Room).is_empty());
    assert!(router.targets(conn(99), &Recipient::Others).is_empty());
}

#[test]
fn test_rooms_are_isolated() {
    let mut mgr = room_abc();
    mgr.create_room(conn(10), "lobby", "Z").unwrap();

    let targets = mgr.router().targets(conn(10), &Recipient::Room);
    assert_eq!(targets, [conn(10)]);
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_on_one_prefix_create_exactly_one_room() {
    const N: u64 = 32;
    let mgr = Arc::new(Mutex::new(RoomManager::default()));

    let mut tasks = Vec::new();
    for i in 0..N {
        let mgr = Arc::clone(&mgr);
        tasks.push(tokio::spawn(async move {
            // Every name shares the prefix "shua".
            let requested = format!("shua{i}");
            let player = format!("player-{i}");
            mgr.lock().await.join_room(conn(i + 1), &requested, &player)
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mgr = mgr.lock().await;
    assert_eq!(mgr.room_count(), 1);
    let room = mgr.room("shua").unwrap();
    assert_eq!(room.player_count(), N as usize);
    assert!(room.has_player(room.master_id()));
    assert_consistent(&mgr);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_and_leaves_keep_invariants() {
    let mgr = Arc::new(Mutex::new(deterministic()));
    mgr.lock().await.create_room(conn(1), "shua", "host").unwrap();

    let mut tasks = Vec::new();
    for i in 2..=40u64 {
        let mgr = Arc::clone(&mgr);
        tasks.push(tokio::spawn(async move {
            let player = format!("p{i}");
            let _ = mgr.lock().await.join_room(conn(i), "shua", &player);
            tokio::task::yield_now().await;
            if i % 2 == 0 {
                let _ = mgr.lock().await.leave_room(conn(i));
            }
            assert_consistent(&*mgr.lock().await);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mgr = mgr.lock().await;
    // host + the 20 odd-numbered connections in 3..=39
    assert_eq!(mgr.room("shua").unwrap().player_count(), 20);
    assert_eq!(mgr.room("shua").unwrap().master_id(), "host");
    assert_consistent(&mgr);
}
