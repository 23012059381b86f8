use std::{
    sync::{Arc, Mutex},
    thread,
};

use crate::{
    game::{
        action::MoveRequest, colour::Colour, movegen::MoveFilter, outcome::GameState,
        piece::PieceKind, play::Game, square::Square,
    },
    pgn::MoveLogOptions,
    protocols::sync::{
        authority::{Authority, Clock, GameConfig, ManualClock, Outbound},
        messages::ServerMessage,
        replica::{DesyncError, Replica, ReplicaEvent},
    },
};

/// Delivers outbound messages to the replicas they are meant for.
fn deliver(
    outbound: Vec<Outbound>,
    replicas: &mut [(&str, &mut Replica)],
    local_now: u64,
) -> Vec<ReplicaEvent> {
    let mut events = vec![];
    for message in outbound {
        for (player, replica) in replicas.iter_mut() {
            if message.to.as_deref().map_or(true, |to| to == *player) {
                events.push(replica.handle(message.message.clone(), local_now));
            }
        }
    }
    events
}

fn hosted_pair(cooldown: u64) -> (Authority<ManualClock>, Replica, Replica) {
    let mut authority = Authority::new(ManualClock::new(1_000), GameConfig::default());
    authority
        .create_game("g", GameConfig::new().with_cooldown(cooldown))
        .unwrap();
    let (mut white, mut black) = (Replica::new("g"), Replica::new("g"));
    let joined = authority.handle("alice", white.join());
    deliver(joined, &mut [("alice", &mut white)], 0);
    let joined = authority.handle("bob", black.join());
    deliver(joined, &mut [("alice", &mut white), ("bob", &mut black)], 0);
    (authority, white, black)
}

#[test]
fn replicas_follow_the_authority() {
    let (mut authority, mut white, mut black) = hosted_pair(1000);
    assert_eq!(white.seat(), Some(Colour::White));
    assert_eq!(black.seat(), Some(Colour::Black));

    let script = [
        ("alice", Square::E2, Square::E4, 0),
        ("bob", Square::D7, Square::D5, 100),
        ("alice", Square::E4, Square::D5, 1200),
        ("bob", Square::D8, Square::D5, 1300),
    ];
    for (player, from, to, at) in script {
        authority.clock().set(1_000 + at);
        let replica = if player == "alice" { &mut white } else { &mut black };
        let sent = replica.request_move(MoveRequest::new(from, to), at).unwrap();
        let outbound = authority.handle(player, sent);
        let events = deliver(
            outbound,
            &mut [("alice", &mut white), ("bob", &mut black)],
            at,
        );
        assert!(events
            .iter()
            .all(|event| matches!(event, ReplicaEvent::Applied { mv, .. } if mv.time == at)));
    }

    let hosted = authority.game("g").unwrap().game();
    for replica in [&white, &black] {
        let game = replica.game().unwrap();
        assert_eq!(game, hosted);
        assert!(replica.pending().is_empty());
    }
    assert_eq!(
        white
            .game()
            .unwrap()
            .move_log(&MoveLogOptions::default()),
        "1.We4 2.Bd5 3.Wexd5 4.BQxd5"
    );
}

#[test]
fn first_joiner_follows_the_game_clock() {
    let mut authority = Authority::new(ManualClock::new(1_000), GameConfig::default());
    authority
        .create_game("g", GameConfig::new().with_cooldown(4000))
        .unwrap();
    let (mut white, mut black) = (Replica::new("g"), Replica::new("g"));
    let joined = authority.handle("alice", white.join());
    deliver(joined, &mut [("alice", &mut white)], 1_000);

    authority.clock().set(61_000);
    let joined = authority.handle("bob", black.join());
    let events = deliver(
        joined,
        &mut [("alice", &mut white), ("bob", &mut black)],
        61_000,
    );
    assert_eq!(events, [ReplicaEvent::Synced, ReplicaEvent::Synced]);
    assert_eq!(white.now(61_000), 0);

    let sent = white
        .request_move(MoveRequest::new(Square::E2, Square::E4), 61_000)
        .unwrap();
    let confirmed = authority.handle("alice", sent);
    deliver(confirmed, &mut [("alice", &mut white), ("bob", &mut black)], 61_000);

    authority.clock().set(62_000);
    let e4e5 = MoveRequest::new(Square::E4, Square::E5);
    assert!(white.request_move(e4e5, 62_000).is_err());
    assert!(white.moves_from(Square::E4, 62_000).is_empty());
    assert_eq!(
        authority.game("g").unwrap().game_time(authority.clock().now()),
        white.now(62_000)
    );
}

#[test]
fn cooldown_rejections_resync_the_replica() {
    let (mut authority, mut white, _) = hosted_pair(1000);
    let e2e4 = MoveRequest::new(Square::E2, Square::E4);
    let e4e5 = MoveRequest::new(Square::E4, Square::E5);
    let outbound = authority.handle("alice", white.request_move(e2e4, 0).unwrap());
    deliver(outbound, &mut [("alice", &mut white)], 0);

    // The replica clock runs ahead of the authority's.
    let sent = white.request_move(e4e5, 1000).unwrap();
    authority.clock().set(1_500);
    let outbound = authority.handle("alice", sent);
    let events = deliver(outbound, &mut [("alice", &mut white)], 1000);
    let [ReplicaEvent::Resync { request, cause }] = &events[..] else {
        panic!("expected a resync, got {events:?}");
    };
    assert!(matches!(cause, DesyncError::Rejected(_)));
    assert!(white.game().is_none());

    let outbound = authority.handle("alice", request.clone());
    let events = deliver(outbound, &mut [("alice", &mut white)], 1000);
    assert_eq!(events, [ReplicaEvent::Synced]);
    assert_eq!(white.now(1000), 500);
    assert_eq!(
        white
            .game()
            .unwrap()
            .position()
            .piece_on(Square::E4)
            .and_then(|piece| piece.last_move_time),
        Some(0)
    );
    assert!(white.moves_from(Square::E4, 1000).is_empty());
    assert_eq!(white.moves_from(Square::E4, 1500).len(), 1);
}

#[test]
fn concurrent_requests_are_serialized() {
    let authority = Arc::new(Mutex::new(Authority::new(
        ManualClock::new(0),
        GameConfig::default(),
    )));
    {
        let mut authority = authority.lock().unwrap();
        authority
            .create_game("g", GameConfig::new().with_cooldown(0))
            .unwrap();
        authority.join("g", "alice").unwrap();
        authority.join("g", "bob").unwrap();
    }

    // Both players race for the same square.
    let racers = [
        ("alice", MoveRequest::new(Square::E2, Square::E4)),
        ("alice", MoveRequest::new(Square::D2, Square::D4)),
        ("bob", MoveRequest::new(Square::E7, Square::E5)),
        ("bob", MoveRequest::new(Square::D7, Square::D5)),
    ];
    let handles: Vec<_> = racers
        .into_iter()
        .map(|(player, request)| {
            let authority = Arc::clone(&authority);
            thread::spawn(move || {
                authority
                    .lock()
                    .unwrap()
                    .request_move("g", player, &request)
                    .is_ok()
            })
        })
        .collect();
    assert!(handles.into_iter().all(|handle| handle.join().unwrap()));

    let authority = authority.lock().unwrap();
    let game = authority.game("g").unwrap().game();
    assert_eq!(game.history().count(), 4);
    assert_eq!(
        game.nfen(),
        "rnbqkbnr/ppp2ppp/8/3pp3/3PP3/8/PPP2PPP/RNBQKBNR KQkq 5"
    );
}

#[test]
fn king_capture_over_the_wire() {
    let mut authority = Authority::new(ManualClock::new(0), GameConfig::default());
    authority
        .create_game_from_nfen("g", "4k3/4P3/8/8/8/8/8/4K3 - 1", GameConfig::default())
        .unwrap();
    let (mut white, mut black) = (Replica::new("g"), Replica::new("g"));
    let joined = authority.handle("alice", white.join());
    deliver(joined, &mut [("alice", &mut white)], 0);
    let joined = authority.handle("bob", black.join());
    deliver(joined, &mut [("bob", &mut black)], 0);

    let capture = black
        .request_move(MoveRequest::new(Square::E8, Square::E7), 0)
        .unwrap();
    let outbound = authority.handle("bob", capture);
    deliver(outbound, &mut [("alice", &mut white), ("bob", &mut black)], 0);
    assert_eq!(black.game().unwrap().state(), GameState::DrawnInsufficientMaterial);

    let outbound = authority.handle(
        "alice",
        white
            .request_move(MoveRequest::new(Square::E1, Square::E2), 0)
            .unwrap_or_else(|e| panic!("{e}")),
    );
    assert!(matches!(
        outbound[0].message,
        ServerMessage::MoveRejected { .. }
    ));
}

#[test]
fn logged_games_replay() {
    let mut game = Game::new();
    let moves = [
        (Square::E2, Square::E4, None),
        (Square::F7, Square::F5, None),
        (Square::E4, Square::F5, None),
        (Square::G7, Square::G6, None),
        (Square::F5, Square::G6, None),
        (Square::A7, Square::A6, None),
        (Square::G6, Square::H7, None),
        (Square::A6, Square::A5, None),
        (Square::H7, Square::G8, Some(PieceKind::Knight)),
    ];
    for (from, to, promotion) in moves {
        let request = MoveRequest {
            promotion,
            ..MoveRequest::new(from, to)
        };
        game.play(&request, MoveFilter::all()).unwrap();
    }
    let log = game.move_log(&MoveLogOptions::default());
    assert!(log.ends_with("9.Whxg8=N"));

    let mut replay = Game::new();
    let played = replay.load_move_log(&log, false).unwrap();
    assert_eq!(played.len(), 9);
    assert_eq!(replay.nfen(), game.nfen());
}
