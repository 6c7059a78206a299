mod common;

use common::{RecordingScriptEngine, corridor, count, load, walk};
use wasteland_core::{
    Animation, CharacterSpec, EntityId, InitialObjectSpec, Position, StaticMap, ZoneKind,
    ZoneSpec,
};
use wasteland_runtime::{ClickOutcome, LevelEvent, PathStopReason, ScriptValue, StepOutcome};

const PLAYER: EntityId = EntityId::PLAYER;

#[test]
fn walking_three_tiles_east_arrives_once() {
    let mut session = load(&corridor(5), RecordingScriptEngine::new());

    assert_eq!(
        session
            .state()
            .grid
            .find_path(Position::new(0, 0), Position::new(3, 0)),
        Some(vec![
            Position::new(1, 0),
            Position::new(2, 0),
            Position::new(3, 0)
        ])
    );

    assert!(session.move_to(PLAYER, Position::new(3, 0)));
    let player = session.state().object(PLAYER).expect("player exists");
    assert_eq!(player.in_flight, Some(Position::new(1, 0)));
    assert_eq!(player.position, Position::new(0, 0));
    assert_eq!(player.animation, Animation::Walk);

    assert_eq!(session.movement_finished(PLAYER), StepOutcome::Continued);
    assert_eq!(session.movement_finished(PLAYER), StepOutcome::Continued);
    assert_eq!(session.movement_finished(PLAYER), StepOutcome::Arrived);

    let player = session.state().object(PLAYER).expect("player exists");
    assert_eq!(player.position, Position::new(3, 0));
    assert!(player.pending_path().is_empty());
    assert_eq!(player.animation, Animation::Idle);
    assert_eq!(session.state().grid.occupant(Position::new(3, 0)), Some(PLAYER));
    assert!(!session.state().grid.is_occupied(Position::new(0, 0)));

    let arrivals = count(session.events(), |event| {
        matches!(event, LevelEvent::DestinationReached { object, .. } if *object == PLAYER)
    });
    assert_eq!(arrivals, 1);
    let steps = count(session.events(), |event| {
        matches!(event, LevelEvent::MoveStarted { .. })
    });
    assert_eq!(steps, 3);
}

#[test]
fn stray_completion_is_ignored() {
    let mut session = load(&corridor(3), RecordingScriptEngine::new());
    assert_eq!(session.movement_finished(PLAYER), StepOutcome::Ignored);
    assert_eq!(session.movement_finished(EntityId(42)), StepOutcome::Ignored);
}

#[test]
fn moving_to_own_tile_reports_arrival_immediately() {
    let mut session = load(&corridor(3), RecordingScriptEngine::new());

    assert!(session.move_to(PLAYER, Position::new(0, 0)));
    assert!(!session.state().object(PLAYER).expect("player exists").is_moving());
    assert_eq!(
        count(session.events(), |event| matches!(
            event,
            LevelEvent::DestinationReached { .. }
        )),
        1
    );
}

#[test]
fn unreachable_target_fails_without_moving() {
    let map = StaticMap::from_layout("walled", &["..#.."])
        .expect("layout is valid")
        .with_object(InitialObjectSpec::character(
            "player",
            Position::new(0, 0),
            CharacterSpec::player(20),
        ))
        .expect("player fits");
    let mut session = load(&map, RecordingScriptEngine::new());

    assert!(!session.move_to(PLAYER, Position::new(4, 0)));
    assert!(!session.state().object(PLAYER).expect("player exists").is_moving());
    assert!(session.events().iter().any(|event| matches!(
        event,
        LevelEvent::PathBlocked {
            reason: PathStopReason::NoPath,
            ..
        }
    )));
}

#[test]
fn tile_taken_mid_route_aborts_the_queue() {
    let mut session = load(&corridor(5), RecordingScriptEngine::new());

    assert_eq!(
        session.tile_clicked(Position::new(4, 0)),
        ClickOutcome::MoveOrdered
    );
    let crate_id = session
        .spawn_object(InitialObjectSpec::prop("crate", Position::new(2, 0)).blocking(true))
        .expect("crate fits");
    assert_eq!(session.state().grid.occupant(Position::new(2, 0)), Some(crate_id));

    assert_eq!(
        session.movement_finished(PLAYER),
        StepOutcome::Stopped(PathStopReason::Blocked)
    );

    let player = session.state().object(PLAYER).expect("player exists");
    assert_eq!(player.position, Position::new(1, 0));
    assert!(player.pending_path().is_empty());
    assert_eq!(player.animation, Animation::Idle);
    assert!(
        player
            .as_character()
            .expect("player is a character")
            .queue
            .is_idle()
    );

    let events = session.events();
    assert!(events.iter().any(|event| matches!(
        event,
        LevelEvent::PathBlocked {
            object: PLAYER,
            reason: PathStopReason::Blocked,
            ..
        }
    )));
    assert_eq!(
        count(events, |event| matches!(event, LevelEvent::QueueCompleted { .. })),
        1
    );
    assert_eq!(
        count(events, |event| matches!(event, LevelEvent::DestinationReached { .. })),
        0
    );
}

#[test]
fn new_order_while_walking_keeps_the_step_in_flight() {
    let mut session = load(&corridor(5), RecordingScriptEngine::new());

    assert!(session.move_to(PLAYER, Position::new(4, 0)));
    assert!(session.move_to(PLAYER, Position::new(2, 0)));

    let player = session.state().object(PLAYER).expect("player exists");
    assert_eq!(player.in_flight, Some(Position::new(1, 0)));
    assert_eq!(player.path.iter().copied().collect::<Vec<_>>(), vec![Position::new(2, 0)]);

    assert_eq!(walk(&mut session, PLAYER), StepOutcome::Arrived);
    assert_eq!(
        session.state().object(PLAYER).expect("player exists").position,
        Position::new(2, 0)
    );
}

#[test]
fn zone_hooks_fire_once_per_transition() {
    let map = corridor(5)
        .with_zone(ZoneSpec {
            name: "alarm".into(),
            kind: ZoneKind::Trigger,
            target: None,
            tiles: vec![Position::new(2, 0), Position::new(3, 0)],
        })
        .expect("zone fits");
    let engine = RecordingScriptEngine::new()
        .with_method(PLAYER, "onZoneEntered", ScriptValue::Null)
        .with_method(PLAYER, "onZoneExited", ScriptValue::Null);
    let log = engine.log();
    let mut session = load(&map, engine);

    assert!(session.move_to(PLAYER, Position::new(4, 0)));
    assert_eq!(walk(&mut session, PLAYER), StepOutcome::Arrived);

    let log = log.borrow();
    assert_eq!(log.count(PLAYER, "onZoneEntered"), 1);
    assert_eq!(log.count(PLAYER, "onZoneExited"), 1);
    assert_eq!(
        log.args_of(PLAYER, "onZoneEntered"),
        vec![vec![ScriptValue::from("alarm")]]
    );
    assert_eq!(
        count(session.events(), |event| matches!(event, LevelEvent::ZoneEntered { .. })),
        1
    );
    assert!(session.exit_request().is_none());
}

#[test]
fn player_in_exit_zone_requests_transition() {
    let map = corridor(4)
        .with_zone(ZoneSpec {
            name: "gate".into(),
            kind: ZoneKind::Exit,
            target: Some("town".into()),
            tiles: vec![Position::new(3, 0)],
        })
        .expect("zone fits");
    let mut session = load(&map, RecordingScriptEngine::new());

    assert!(session.move_to(PLAYER, Position::new(3, 0)));
    assert_eq!(walk(&mut session, PLAYER), StepOutcome::Arrived);

    let request = session.take_exit_request().expect("exit was requested");
    assert_eq!(request.target.as_deref(), Some("town"));
    assert!(session.take_exit_request().is_none());
}

#[test]
fn teleport_moves_the_occupant_and_drops_the_route() {
    let map = corridor(5)
        .with_object(InitialObjectSpec::prop("boulder", Position::new(4, 0)).blocking(true))
        .expect("boulder fits");
    let mut session = load(&map, RecordingScriptEngine::new());

    assert!(session.move_to(PLAYER, Position::new(3, 0)));
    assert!(session.set_character_position(PLAYER, Position::new(2, 0)));

    let player = session.state().object(PLAYER).expect("player exists");
    assert_eq!(player.position, Position::new(2, 0));
    assert!(player.pending_path().is_empty());
    assert_eq!(player.animation, Animation::Idle);
    assert_eq!(session.state().grid.occupant(Position::new(2, 0)), Some(PLAYER));
    assert!(!session.state().grid.is_occupied(Position::new(1, 0)));
    assert_eq!(session.movement_finished(PLAYER), StepOutcome::Ignored);

    assert!(!session.set_character_position(PLAYER, Position::new(4, 0)));
    assert!(!session.set_character_position(PLAYER, Position::new(9, 0)));
    assert_eq!(
        session.state().object(PLAYER).expect("player exists").position,
        Position::new(2, 0)
    );
}

#[test]
fn interaction_position_stops_next_to_the_target() {
    let map = corridor(5)
        .with_object(InitialObjectSpec::character(
            "merchant",
            Position::new(3, 0),
            CharacterSpec::new(10),
        ))
        .expect("merchant fits")
        .with_object(InitialObjectSpec::prop("sign", Position::new(1, 0)))
        .expect("sign fits");
    let session = load(&map, RecordingScriptEngine::new());

    assert_eq!(session.interaction_position(EntityId(1)), Some(Position::new(2, 0)));
    assert_eq!(session.interaction_position(EntityId(2)), Some(Position::new(0, 0)));
    assert_eq!(session.interaction_position(EntityId(9)), None);
}

#[test]
fn removing_an_object_twice_is_harmless() {
    let map = corridor(5)
        .with_object(
            InitialObjectSpec::character("guard", Position::new(2, 0), CharacterSpec::new(10))
                .with_script("guard"),
        )
        .expect("guard fits");
    let engine = RecordingScriptEngine::new();
    let log = engine.log();
    let mut session = load(&map, engine);
    let guard = EntityId(1);
    assert!(session.add_control_zone(guard, [Position::new(1, 0)]).is_some());

    assert!(session.remove_object(guard));
    assert!(!session.remove_object(guard));
    assert!(!session.state().grid.is_occupied(Position::new(2, 0)));
    assert!(!session.orchestrator().is_observed(guard));
    assert_eq!(session.state().grid.zones().count(), 0);
    assert_eq!(log.borrow().detached, vec![guard]);
}
