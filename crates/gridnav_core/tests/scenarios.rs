//! End-to-end episodes through the public API.

use gridnav_core::{
    Action, Command, EnvConfig, Environment, EpisodePhase, GridError, Inbound, Mode,
    ObstacleField, ObstacleLayout, RemoteSession, ScriptedPolicy, SetupController,
    SetupState, Status, Tile,
};

fn empty_5x5() -> Environment {
    Environment::new(EnvConfig::manual(5, 5)).unwrap()
}

#[test]
fn straight_run_to_goal() {
    let mut env = empty_5x5();
    let obs = env.reset().unwrap();
    assert_eq!(obs.len(), 125);
    assert_eq!(obs.coords(), Tile::new(2, 4));

    let mut ys = vec![4];
    let mut transitions = Vec::new();
    for _ in 0..4 {
        let t = env.step(Action::Up).unwrap();
        ys.push(t.info.coords.y);
        transitions.push(t);
    }

    assert_eq!(ys, vec![4, 3, 2, 1, 0]);
    assert!(transitions[..3].iter().all(|t| !t.done && !t.info.won));
    let last = transitions.last().unwrap();
    assert!(last.done);
    assert!(last.info.won);
    assert_eq!(last.reward, 50);
    assert_eq!(last.info.prev_pos, (Tile::new(2, 1), Tile::new(2, 0)));
    assert!(matches!(env.step(Action::Up), Err(GridError::EpisodeFinished)));
}

#[test]
fn detour_around_wall() {
    let mut cfg = EnvConfig::manual(5, 5);
    cfg.manual_layout = vec![Tile::new(2, 2), Tile::new(1, 2)];
    let mut env = Environment::new(cfg).unwrap();
    env.reset().unwrap();

    let plan = [Action::Up, Action::Right, Action::Up, Action::Up, Action::Up];
    let rewards: Vec<i32> = plan.iter().map(|a| env.step(*a).unwrap().reward).collect();

    // (2,3) +2, (3,3) -1, (3,2) +3, (3,1) +4, (3,0) win
    assert_eq!(rewards, vec![2, -1, 3, 4, 50]);
    assert_eq!(env.phase(), EpisodePhase::Won);
    assert_eq!(env.episode_return(), 58);
}

#[test]
fn walking_into_wall_loses() {
    let mut cfg = EnvConfig::manual(5, 5);
    cfg.manual_layout = vec![Tile::new(2, 2)];
    let mut env = Environment::new(cfg).unwrap();
    env.reset().unwrap();

    env.step(Action::Up).unwrap();
    let (_, reward, done, info) = env.step(Action::Up).unwrap().into_parts();
    assert!(done);
    assert!(!info.won);
    assert_eq!(reward, -100);
}

#[test]
fn smart_add_clears_path_to_player() {
    let mut env = Environment::new(EnvConfig::manual(7, 7)).unwrap();
    env.reset().unwrap();
    // Player at (3,6); walk to (3,5)
    env.step(Action::Up).unwrap();
    assert_eq!(env.player().coords(), Tile::new(3, 5));

    env.add_obstacle(Tile::new(3, 3));
    env.add_obstacle(Tile::new(3, 4));
    assert!(env.smart_add_obstacle(Tile::new(3, 2)));

    assert!(!env.obstacles().contains(Tile::new(3, 3)));
    assert!(!env.obstacles().contains(Tile::new(3, 4)));
    assert!(env.obstacles().contains(Tile::new(3, 2)));
}

#[test]
fn remove_absent_obstacle_leaves_field_unchanged() {
    let mut env = empty_5x5();
    env.reset().unwrap();
    env.add_obstacle(Tile::new(1, 1));
    let before: ObstacleField = env.obstacles().clone();

    assert!(!env.remove_obstacle(Tile::new(4, 4)));
    assert_eq!(env.obstacles(), &before);
}

#[test]
fn setup_then_manual_episodes_replay_layout() {
    let mut env = empty_5x5();
    let mut ctl = SetupController::new();
    ctl.enter_setup(&mut env);
    assert_eq!(ctl.state(), SetupState::Setup);

    for cmd in [
        Command::ToggleObstacle(Tile::new(2, 2)),
        Command::ToggleObstacle(Tile::new(0, 3)),
        Command::Start,
    ] {
        ctl.push(cmd);
    }
    assert_eq!(ctl.drain(&mut env).unwrap(), SetupState::Run);

    for _ in 0..3 {
        env.reset().unwrap();
        assert_eq!(env.obstacles().iter().collect::<Vec<_>>(), vec![Tile::new(2, 2), Tile::new(0, 3)]);
        env.step(Action::Up).unwrap();
        assert!(env.step(Action::Up).unwrap().done);
    }
}

#[test]
fn random_mode_switch_regenerates() {
    let mut env = Environment::new(EnvConfig::manual(8, 8).with_seed(42)).unwrap();
    env.reset().unwrap();
    assert!(env.obstacles().is_empty());

    env.set_mode(Mode::Random).unwrap();
    env.reset().unwrap();
    assert_eq!(env.obstacles().len(), 20);
}

#[test]
fn layout_file_round_trip_into_new_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.json");

    let mut env = empty_5x5();
    env.toggle_obstacle(Tile::new(1, 1));
    env.commit_manual_layout();
    ObstacleLayout::from_env(&env).save(&path).unwrap();

    let mut other = empty_5x5();
    ObstacleLayout::load(&path).unwrap().apply(&mut other).unwrap();
    other.reset().unwrap();
    assert!(other.obstacles().contains(Tile::new(1, 1)));
}

#[test]
fn remote_session_raw_messages() {
    let env = empty_5x5();
    let mut session = RemoteSession::new(env, ScriptedPolicy::new(vec![Action::Up]));

    let mut published = Vec::new();
    for (topic, payload) in [
        ("Zumo/Start", &b""[..]),
        ("Zumo/Obst", &b"(0, 0)"[..]),
        ("Zumo/Move", &b""[..]),
        ("Zumo/Move", &b""[..]),
        ("Zumo/Move", &b""[..]),
        ("Zumo/Move", &b""[..]),
    ] {
        for msg in session.handle_raw(topic, payload).unwrap() {
            published.push((msg.topic(), msg.payload()));
        }
    }

    assert_eq!(published.first(), Some(&("Net/Ack", "Start".to_string())));
    assert!(published.contains(&("Net/Ack", "Obst (0, 0)".to_string())));
    assert_eq!(published.last(), Some(&("Net/Status", Status::Finish.to_string())));
    assert!(session.env().is_won());
    assert!(session.handle(Inbound::Coords).unwrap().is_empty());
}
