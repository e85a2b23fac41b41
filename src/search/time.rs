/* =======================================================================
Rustic is a chess playing engine.
Copyright (C) 2019-2024, Marcel Vanthoor
https://rustic-chess.org/

Rustic is written in the Rust programming language. It is an original
work, not derived from any engine that came before it. However, it does
use a lot of concepts which are well-known and are in use by most if not
all classical alpha/beta-based chess engines.

Rustic is free software: you can redistribute it and/or modify it under
the terms of the GNU General Public License version 3 as published by
the Free Software Foundation.

Rustic is distributed in the hope that it will be useful, but WITHOUT
ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License
for more details.

You should have received a copy of the GNU General Public License along
with this program.  If not, see <http://www.gnu.org/licenses/>.
======================================================================= */

// Time allocation for game-time searches. Byoyomi (a fixed per-move grace
// period once the main clock runs out) has no chess analogue; it folds
// into the same optimum/maximum budget the teacher computed from
// increment alone, since the two serve the same purpose here.

use super::defs::GameTime;
use crate::defs::Sides;

pub const OVERHEAD: i128 = 50;

// Never budget less than this for a single move: a near-flagged clock
// still needs enough time to make a legal reply.
const MIN_BUDGET_MS: i64 = 900;

pub struct TimeManager {
    optimum_ms: i64,
    maximum_ms: i64,
    start: std::time::Instant,
    best_move_changes: u32,
}

impl TimeManager {
    pub fn new(gt: &GameTime, us: usize) -> Self {
        let (time, inc) = if us == Sides::BLACK {
            (gt.btime, gt.binc)
        } else {
            (gt.wtime, gt.winc)
        };
        let byoyomi_margin = 20i64;
        let byoyomi_term = if gt.byoyomi > 0 {
            (gt.byoyomi - byoyomi_margin).max(0)
        } else {
            0
        };
        let inc_term = if inc > 0 { inc } else { 0 };

        let optimum = (time / 35 + byoyomi_term + inc_term).max(MIN_BUDGET_MS);
        let maximum = (time / 10 + byoyomi_term + inc_term).max(MIN_BUDGET_MS);

        TimeManager {
            optimum_ms: optimum,
            maximum_ms: maximum,
            start: std::time::Instant::now(),
            best_move_changes: 0,
        }
    }

    // Called once per completed iterative-deepening iteration whose best
    // root move differs from the previous iteration's: widens the soft
    // budget so an unstable PV gets more time to settle before the next
    // iteration is denied a chance to start.
    pub fn note_best_move_changed(&mut self) {
        self.best_move_changes += 1;
    }

    fn scaled_optimum_ms(&self) -> i64 {
        (self.optimum_ms as f64 * (1.0 + self.best_move_changes as f64 * 0.5)) as i64
    }

    pub fn elapsed_ms(&self) -> i128 {
        self.start.elapsed().as_millis() as i128
    }

    // Hard stop: the point past which continuing risks flagging.
    pub fn must_stop(&self) -> bool {
        self.elapsed_ms() >= (self.maximum_ms as i128 - 10)
    }

    // Soft stop: reasonable to stop here, but only outside of ponder (the
    // caller is responsible for not calling this while pondering).
    pub fn should_stop_soft(&self) -> bool {
        self.elapsed_ms() >= self.scaled_optimum_ms() as i128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_never_drops_below_the_minimum_even_with_almost_no_time_left() {
        let gt = GameTime { btime: 10, wtime: 10, binc: 0, winc: 0, byoyomi: 0, moves_to_go: 0 };
        let tm = TimeManager::new(&gt, Sides::BLACK);
        assert!(tm.optimum_ms >= MIN_BUDGET_MS);
        assert!(tm.maximum_ms >= MIN_BUDGET_MS);
    }

    #[test]
    fn byoyomi_feeds_the_budget_net_of_its_margin() {
        let gt = GameTime { btime: 0, wtime: 0, binc: 0, winc: 0, byoyomi: 10_000, moves_to_go: 0 };
        let tm = TimeManager::new(&gt, Sides::BLACK);
        assert!(tm.optimum_ms > MIN_BUDGET_MS);
    }

    #[test]
    fn pv_instability_widens_the_soft_budget() {
        let gt = GameTime { btime: 60_000, wtime: 60_000, binc: 0, winc: 0, byoyomi: 0, moves_to_go: 0 };
        let mut tm = TimeManager::new(&gt, Sides::BLACK);
        let before = tm.scaled_optimum_ms();
        tm.note_best_move_changed();
        assert!(tm.scaled_optimum_ms() > before);
    }

    #[test]
    fn maximum_is_never_smaller_than_optimum() {
        let gt = GameTime { btime: 120_000, wtime: 120_000, binc: 500, winc: 500, byoyomi: 0, moves_to_go: 0 };
        let tm = TimeManager::new(&gt, Sides::BLACK);
        assert!(tm.maximum_ms >= tm.optimum_ms);
    }
}
