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

// Lazy SMP: every helper thread searches the same position with the same
// transposition table and no other coordination. They desync by skipping
// a few depths each (see `alpha_beta::should_skip_depth`) so the table
// ends up seeded with results from slightly different depths instead of
// every thread doing the exact same work. Only thread 0 sends progress
// reports and its result is the one returned; the helpers exist purely to
// fill the table.

use super::alpha_beta::Worker;
use super::defs::{SearchParams, SearchReport};
use crate::position::Position;
use crate::tt::TranspositionTable;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

pub fn search(pos: &Position, tt: Arc<TranspositionTable>, stop: Arc<AtomicBool>, sp: SearchParams, report_tx: Sender<SearchReport>, num_threads: usize) -> (crate::position::defs::Move, Option<crate::position::defs::Move>) {
    let num_threads = num_threads.max(1);
    let shared_nodes = Arc::new(AtomicU64::new(0));

    std::thread::scope(|scope| {
        for idx in 1..num_threads {
            let pos_clone = pos.clone_for_search();
            let tt = Arc::clone(&tt);
            let stop = Arc::clone(&stop);
            let mut sp_helper = sp.clone();
            sp_helper.quiet = true;
            let shared_nodes = Arc::clone(&shared_nodes);
            scope.spawn(move || {
                let (helper_tx, _helper_rx) = crossbeam_channel::unbounded();
                let mut worker = Worker::new(pos_clone, tt, stop, idx, shared_nodes);
                worker.search_root(&sp_helper, &helper_tx);
            });
        }

        let mut main_worker = Worker::new(pos.clone_for_search(), Arc::clone(&tt), Arc::clone(&stop), 0, shared_nodes);
        let result = main_worker.search_root(&sp, &report_tx);
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::SFEN_START_POSITION;
    use crate::position::attacks::AttackTables;
    use crate::position::zobrist::ZobristRandoms;
    use crate::search::defs::SearchMode;

    #[test]
    fn a_single_helper_thread_still_converges_on_a_legal_best_move() {
        let mut pos = Position::new(Arc::new(AttackTables::new()), Arc::new(ZobristRandoms::new()));
        pos.set_sfen(SFEN_START_POSITION).unwrap();
        let tt = Arc::new(TranspositionTable::new(1));
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, _rx) = crossbeam_channel::unbounded();
        let sp = SearchParams { depth: 2, search_mode: SearchMode::Depth, quiet: true, ..SearchParams::new() };
        let (best, _) = search(&pos, tt, stop, sp, tx, 2);
        assert!(best.is_ok());
    }
}
