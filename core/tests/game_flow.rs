use std::borrow::Cow;

use tile_merge_core::{
    check_game_over, highlights, legal_directions, Cell, Direction, Game, GameState, GameStatus,
    Grid,
};

fn state_from(game: &mut Game, values: [u32; 16]) -> GameState {
    let grid = Grid::from_values(game.tile_ids_mut(), 4, &values).unwrap();
    GameState::from_grid(grid)
}

#[test]
fn init_creates_valid_state() {
    let mut game = Game::new(2048);
    let state = game.init_game();

    assert_eq!(state.score, 0);
    assert_eq!(state.status, GameStatus::Playing);
    assert!(!state.has_won);
    assert_eq!(state.grid.count_tiles(), 2);
    assert!(state.grid.tiles().all(|t| t.value() == 2 || t.value() == 4));
}

#[test]
fn move_and_merge() {
    let mut game = Game::new(1);
    let state = state_from(&mut game, [2, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

    let state = game.make_move(&state, Direction::Left).into_owned();

    assert_eq!(state.score, 4);
    assert_eq!(state.grid.tile_at(Cell::new(0, 0)).map(|t| t.value()), Some(4));
    // One merged tile plus one spawn.
    assert_eq!(state.grid.count_tiles(), 2);
}

#[test]
fn four_equal_tiles_merge_pairwise() {
    let mut game = Game::new(1);
    let state = state_from(&mut game, [2, 2, 2, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

    let state = game.make_move(&state, Direction::Left).into_owned();

    assert_eq!(state.score, 8);
    assert_eq!(&state.grid.values()[..2], &[4, 4]);
}

#[test]
fn win_detected_at_2048() {
    let mut game = Game::new(1);
    let state = state_from(&mut game, [1024, 1024, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

    let state = game.make_move(&state, Direction::Left).into_owned();

    assert_eq!(state.grid.tile_at(Cell::new(0, 0)).map(|t| t.value()), Some(2048));
    assert_eq!(state.status, GameStatus::Won);
    assert!(state.has_won);
}

#[test]
fn nearly_locked_grid_keeps_playing() {
    // Sliding the last row right frees (3, 0); whichever value spawns there
    // matches a neighbour (2 above, 4 to the right).
    let mut game = Game::new(1);
    let state = state_from(&mut game, [2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 0]);

    let state = game.make_move(&state, Direction::Right).into_owned();

    assert_eq!(state.grid.count_tiles(), 16);
    assert_eq!(state.status, GameStatus::Playing);
    assert!(!check_game_over(&state.grid));
}

#[test]
fn continuing_after_win() {
    let mut game = Game::new(1);
    let mut state = state_from(&mut game, [2048, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    state.status = GameStatus::Won;
    state.has_won = true;

    let next = game.make_move(&state, Direction::Down);

    assert!(matches!(next, Cow::Owned(_)));
    assert_eq!(next.grid.tile_at(Cell::new(3, 0)).map(|t| t.value()), Some(2048));
    assert!(next.has_won);
}

#[test]
fn new_game_resets_progress() {
    let mut game = Game::new(77);
    let mut state = game.init_game();
    for direction in [Direction::Left, Direction::Up, Direction::Right] {
        state = game.make_move(&state, direction).into_owned();
    }

    let fresh = game.init_game();
    assert_eq!(fresh.score, 0);
    assert_eq!(fresh.status, GameStatus::Playing);
    assert!(!fresh.has_won);
    assert_eq!(fresh.grid.count_tiles(), 2);
}

#[test]
fn invalid_move_keeps_state() {
    let mut game = Game::new(1);
    let state = state_from(&mut game, [2, 4, 8, 16, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

    for direction in [Direction::Up, Direction::Left, Direction::Right] {
        let next = game.make_move(&state, direction);
        assert!(std::ptr::eq(&*next, &state), "{direction} should be a no-op");
        assert_eq!(next.score, state.score);
    }
}

#[test]
fn random_play_holds_invariants() {
    for seed in 0..10 {
        let mut game = Game::new(seed);
        let mut state = game.init_game();
        let mut turn = 0;

        while state.status != GameStatus::Lost && turn < 5_000 {
            let options = legal_directions(&state.grid);
            let direction = options[turn % options.len()];
            let before_tiles = state.grid.count_tiles();

            let next = game.make_move(&state, direction).into_owned();
            let marks = highlights(Some(&state), &next);

            assert!(next.score >= state.score);
            assert!(!state.has_won || next.has_won);
            assert_eq!(marks.new_tiles.len(), 1);
            assert_eq!(
                next.grid.count_tiles(),
                before_tiles - marks.merged_tiles.len() + 1
            );

            state = next;
            turn += 1;
        }

        assert_eq!(state.status == GameStatus::Lost, check_game_over(&state.grid));
    }
}
