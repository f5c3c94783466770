// engine/tests/env_characterization.rs
#![forbid(unsafe_code)]

/**
 * End-to-end scenarios for the tick environment.
 *
 * Covered:
 * - Fresh-episode shape (first bag piece, queue length, empty board/hold).
 * - Hard drop event order and footprint.
 * - Four-line clear with a vertical I in an open well.
 * - Lock-delay stalling via grounded moves, and locking without them.
 * - Hold semantics: empty-slot consume, swap, once-per-lifecycle.
 * - Scoring law and top-out latching.
 */
use tetricore::engine::SevenBag;
use tetricore::{
    Board, Environment, FrameAction, GameEvent, Kind, Piece, H, LOCK_DELAY_TICKS, W,
};

fn board_with_columns_filled(height: usize, skip_col: usize) -> Board {
    let mut b = Board::new();
    for y in (H - height)..H {
        for x in 0..W {
            if x != skip_col {
                b.grid[y][x] = 1;
            }
        }
    }
    b
}

fn count_filled(b: &Board) -> usize {
    b.cells_flat().iter().filter(|&&c| c != 0).count()
}

#[test]
fn fresh_episode_matches_bag_and_starts_empty() {
    let mut env = Environment::new(42);
    let obs = env.observation();

    // The active piece is the first draw of the 7-bag for this seed, and the
    // preview is the next three draws.
    let mut bag = SevenBag::new(42);
    let first = bag.next();
    let queue: Vec<String> = bag.peek(3).iter().map(|k| k.name().to_string()).collect();

    assert_eq!(obs.current.kind, first.name());
    assert_eq!(obs.next_queue, queue);
    assert_eq!(obs.hold.kind, None);
    assert!(!obs.hold.used);
    assert!(obs.board.cells.iter().all(|&c| c == 0));
    assert_eq!(obs.tick, 0);
    assert_eq!(obs.episode.score, 0);
    assert_eq!(obs.episode.seed, 42);
    assert!(!obs.episode.top_out);
}

#[test]
fn hard_drop_locks_spawn_footprint_at_floor() {
    let mut env = Environment::new(0);
    let spawn = env.current();

    // Expected landing: the spawn footprint translated straight down to the
    // lowest non-colliding row of an empty board.
    let board = Board::new();
    let mut expected = spawn;
    while !board.collides(&expected.translated(0, 1)) {
        expected = expected.translated(0, 1);
    }
    assert_eq!(env.ghost(), expected);

    let r = env.step(FrameAction::Hard);

    assert!(r.info.events.contains(&GameEvent::HardDrop));
    assert!(r.info.events.contains(&GameEvent::Lock));
    assert!(r.info.events.contains(&GameEvent::Spawn));
    assert_eq!(r.info.lines_cleared, 0);

    assert_eq!(count_filled(env.board()), 4);
    for (x, y) in expected.cells() {
        assert_eq!(
            env.board().grid[y as usize][x as usize],
            spawn.kind.idx(),
            "missing cell at ({x},{y})"
        );
    }
}

#[test]
fn vertical_i_in_open_well_clears_four_lines() {
    let mut env = Environment::new(42);
    env.set_board(board_with_columns_filled(4, 9));
    // Vertical I whose cells occupy column 9 (rotation 1 offsets sit at dx=2).
    env.set_current(Piece::new(Kind::I, 7, 0, 1));

    let score_before = env.score();
    let r = env.step(FrameAction::Hard);

    assert_eq!(r.info.lines_cleared, 4);
    assert!(r.info.events.contains(&GameEvent::Clear));
    assert_eq!(env.score(), score_before + 800);
    assert_eq!(env.lines_total(), 4);
    assert_eq!(count_filled(env.board()), 0);
}

#[test]
fn grounded_moves_stall_the_lock_timer_indefinitely() {
    let mut env = Environment::new(7);
    // T resting on the floor: cells span rows 18..=19.
    env.set_current(Piece::new(Kind::T, 3, 18, 0));

    for i in 0..100 {
        let action = if i % 2 == 0 {
            FrameAction::Left
        } else {
            FrameAction::Right
        };
        let r = env.step(action);
        assert!(
            !r.info.events.contains(&GameEvent::Lock),
            "piece locked at tick {i} despite a successful grounded move every tick"
        );
    }
    assert_eq!(count_filled(env.board()), 0);
}

#[test]
fn idle_grounded_piece_locks_after_the_delay() {
    let mut env = Environment::new(7);
    env.set_current(Piece::new(Kind::T, 3, 18, 0));

    let mut locked_at = None;
    for i in 0..(LOCK_DELAY_TICKS + 5) {
        let r = env.step(FrameAction::Noop);
        if r.info.events.contains(&GameEvent::Lock) {
            locked_at = Some(i);
            break;
        }
    }
    assert_eq!(locked_at, Some(LOCK_DELAY_TICKS - 1));
}

#[test]
fn hold_consumes_next_piece_then_becomes_a_noop() {
    let mut env = Environment::new(42);
    let before = env.observation();

    let r = env.step(FrameAction::Hold);
    let obs = &r.obs;

    assert_eq!(obs.hold.kind.as_deref(), Some(before.current.kind.as_str()));
    assert_eq!(obs.current.kind, before.next_queue[0]);
    assert!(obs.hold.used);

    // Second hold before locking: silent no-op.
    let r2 = env.step(FrameAction::Hold);
    assert_eq!(r2.obs.hold.kind, obs.hold.kind);
    assert_eq!(r2.obs.current.kind, obs.current.kind);
    assert!(r2.obs.hold.used);
}

#[test]
fn hold_swaps_with_previously_held_piece_after_lock() {
    let mut env = Environment::new(42);
    let first = env.observation().current.kind.clone();

    env.step(FrameAction::Hold);
    env.step(FrameAction::Hard); // lock clears the used flag

    let before = env.observation();
    assert!(!before.hold.used);
    assert_eq!(before.hold.kind.as_deref(), Some(first.as_str()));

    let r = env.step(FrameAction::Hold);
    assert_eq!(r.obs.current.kind, first);
    assert_eq!(r.obs.hold.kind.as_deref(), Some(before.current.kind.as_str()));
}

#[test]
fn single_line_clear_scores_one_hundred() {
    let mut env = Environment::new(3);
    let mut b = Board::new();
    for x in 0..W {
        if !(3..=6).contains(&x) {
            b.grid[H - 1][x] = 2;
        }
    }
    env.set_board(b);
    // Horizontal I over the gap.
    env.set_current(Piece::new(Kind::I, 3, 0, 0));

    let r = env.step(FrameAction::Hard);
    assert_eq!(r.info.lines_cleared, 1);
    assert_eq!(env.score(), 100);
}

#[test]
fn colliding_spawn_tops_out_and_latches() {
    let mut env = Environment::new(11);
    // Wall across every spawn footprint (columns 3..=7, rows 1..=3), with
    // column 9 left open for the active piece.
    let mut b = Board::new();
    for y in 1..=3 {
        for x in 3..=7 {
            b.grid[y][x] = 1;
        }
    }
    env.set_board(b);
    env.set_current(Piece::new(Kind::I, 7, 10, 1));

    let r = env.step(FrameAction::Hard);
    assert!(r.done);
    assert!(r.info.events.contains(&GameEvent::TopOut));
    assert!(r.obs.episode.top_out);

    // Further steps are no-ops that keep reporting done.
    let tick_before = env.tick_count();
    let r2 = env.step(FrameAction::Left);
    assert!(r2.done);
    assert!(r2.info.events.is_empty());
    assert_eq!(env.tick_count(), tick_before);
}

#[test]
fn soft_drop_descends_one_cell() {
    let mut env = Environment::new(5);
    let y_before = env.current().y;
    env.step(FrameAction::Soft);
    assert_eq!(env.current().y, y_before + 1);
}

#[test]
fn failed_rotation_is_a_silent_noop() {
    let mut env = Environment::new(9);
    // Box a T into a cavity shaped exactly like its footprint; every kick of
    // the rotated piece collides.
    let mut b = Board::new();
    for y in 0..H {
        for x in 0..W {
            b.grid[y][x] = 1;
        }
    }
    let piece = Piece::new(Kind::T, 3, 17, 0);
    for (x, y) in piece.cells() {
        b.grid[y as usize][x as usize] = 0;
    }
    env.set_board(b);
    env.set_current(piece);

    let r = env.step(FrameAction::Cw);
    assert_eq!(env.current().rot, 0);
    assert_eq!(env.current(), piece);
    assert!(r.info.events.is_empty());
}
