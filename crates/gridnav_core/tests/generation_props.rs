//! Property tests for obstacle generation and observation shape.

use gridnav_core::{observation_len, Action, EnvConfig, Environment, GridSize, ObstacleField, Tile};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

proptest! {
    /// Anchors stay inside the side-dependent box; partners are adjacent.
    #[test]
    fn prop_generated_pairs_respect_anchor_ranges(
        width in 4i32..24,
        height in 5i32..24,
        min in 0u32..12,
        max in 0u32..12,
        seed in any::<u64>(),
    ) {
        let size = GridSize::new(width, height).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut field = ObstacleField::new();

        let count = field.generate(min, max, size, &mut rng).unwrap();
        prop_assert!(count >= min && count <= max.max(min));
        prop_assert_eq!(field.len(), 2 * count as usize);

        let tiles: Vec<Tile> = field.iter().collect();
        let anchors: Vec<Tile> = tiles.iter().step_by(2).copied().collect();

        let all_side_one = anchors.iter().all(|a| a.x >= 1 && a.x <= width - 3);
        let all_side_zero = anchors.iter().all(|a| a.x >= 2 && a.x <= width - 2);
        prop_assert!(all_side_one || all_side_zero);

        for pair in tiles.chunks(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(a.y >= 2 && a.y <= height - 3);
            let d = (b.x - a.x, b.y - a.y);
            prop_assert!(d == (1, 0) || d == (0, 1) || d == (-1, 0));
        }
    }

    /// Generated obstacles never reach the start row.
    #[test]
    fn prop_random_reset_keeps_start_clear(seed in any::<u64>(), width in 4i32..16, height in 5i32..16) {
        let mut cfg = EnvConfig::default().with_seed(seed);
        cfg.width = width;
        cfg.height = height;
        let mut env = Environment::new(cfg).unwrap();
        let obs = env.reset().unwrap();

        prop_assert_eq!(obs.len(), observation_len(env.size()));
        prop_assert!(!env.obstacles().contains(env.player().coords()));
        prop_assert!(env.obstacles().iter().all(|t| t.y < height - 1));
    }

    /// `is_done` and `reward` depend only on state.
    #[test]
    fn prop_termination_is_pure(actions in prop::collection::vec(0i64..4, 1..12)) {
        let mut cfg = EnvConfig::manual(6, 6);
        cfg.strict_episodes = false;
        let mut env = Environment::new(cfg).unwrap();
        env.reset().unwrap();

        for a in actions {
            let t = env.step(Action::try_from(a).unwrap()).unwrap();
            prop_assert_eq!(t.done, env.is_done());
            prop_assert_eq!(t.done, env.is_done());
            prop_assert_eq!(t.reward, env.reward());
            prop_assert_eq!(env.observe(), t.observation.clone());
        }
    }
}
