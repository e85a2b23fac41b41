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

pub mod about;
pub mod comm_reports;
pub mod defs;
pub mod utils;

use self::defs::Settings;
use crate::book::Book;
use crate::comm::Comm;
use crate::misc::cmdline::CmdLine;
use crate::position::attacks::AttackTables;
use crate::position::zobrist::ZobristRandoms;
use crate::position::Position;
use crate::search::defs::SearchParams;
use crate::tt::TranspositionTable;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

pub struct Engine {
    cmdline: CmdLine,
    comm: Comm,
    settings: Settings,
    position: Position,
    tt: Arc<TranspositionTable>,
    attacks: Arc<AttackTables>,
    zr: Arc<ZobristRandoms>,
    stop: Arc<AtomicBool>,
    search_handle: Option<JoinHandle<()>>,
    book: Option<Book>,
}

impl Engine {
    pub fn new() -> Self {
        let cmdline = CmdLine::new();
        let settings = Settings { threads: cmdline.threads(), quiet: cmdline.has_quiet(), tt_size: cmdline.hash(), ..Settings::default() };
        let attacks = Arc::new(AttackTables::new());
        let zr = Arc::new(ZobristRandoms::new());
        let tt = Arc::new(TranspositionTable::new(settings.tt_size.max(1)));
        let mut position = Position::new(Arc::clone(&attacks), Arc::clone(&zr));
        let _ = position.set_sfen(crate::defs::SFEN_START_POSITION);

        Engine {
            cmdline,
            comm: Comm::new(),
            settings,
            position,
            tt,
            attacks,
            zr,
            stop: Arc::new(AtomicBool::new(false)),
            search_handle: None,
            book: None,
        }
    }

    pub fn run(&mut self) -> crate::defs::EngineRunResult {
        self.print_ascii_logo();
        self.print_about(&self.settings);

        #[cfg(feature = "extra")]
        if self.cmdline.has_wizardry() {
            crate::extra::run_wizardry();
            return Ok(());
        }

        let perft_depth = self.cmdline.perft();
        if perft_depth > 0 {
            self.setup_position()?;
            self.run_perft(perft_depth);
            return Ok(());
        }

        self.setup_position()?;

        let report_rx = self.comm.init();
        loop {
            match report_rx.recv() {
                Ok(crate::comm::CommReport::Usi(report)) => {
                    let is_quit = report == crate::comm::usi::UsiReport::Quit;
                    self.comm_reports(&report);
                    if is_quit {
                        break;
                    }
                }
                Err(_) => break,
            }
        }

        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.search_handle.take() {
            let _ = h.join();
        }
        self.comm.shutdown();
        Ok(())
    }

    fn run_perft(&mut self, depth: i8) {
        let mg = crate::movegen::MoveGenerator::new();
        let mut total = 0u64;
        let start = std::time::Instant::now();
        total += perft(&mut self.position, &mg, depth);
        let elapsed = start.elapsed().as_millis().max(1);
        println!("perft({depth}): {total} nodes in {elapsed} ms");
    }

    pub fn start_search(&mut self, sp: SearchParams) {
        self.stop.store(false, Ordering::Relaxed);
        let pos = self.position.clone_for_engine();
        let tt = Arc::clone(&self.tt);
        let stop = Arc::clone(&self.stop);
        let threads = self.settings.threads;

        let handle = std::thread::spawn(move || {
            let (report_tx, report_rx) = crossbeam_channel::unbounded();
            let drain = std::thread::spawn(move || {
                while let Ok(report) = report_rx.recv() {
                    crate::comm::usi::write(crate::comm::CommControl::SearchCurrentInfo(report));
                }
            });
            let (best, ponder) = crate::search::smp::search(&pos, tt, stop, sp, report_tx, threads);
            let _ = drain.join();
            crate::comm::usi::write(crate::comm::CommControl::BestMove(best, ponder));
        });
        self.search_handle = Some(handle);
    }

    pub fn stop_search(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.search_handle.take() {
            let _ = h.join();
        }
    }

    fn quit(&mut self) {
        self.stop_search();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn perft(pos: &mut Position, mg: &crate::movegen::MoveGenerator, depth: i8) -> u64 {
    use crate::movegen::defs::{MoveList, MoveType};
    if depth == 0 {
        return 1;
    }
    let mut list = MoveList::new();
    mg.generate_moves(pos, &mut list, MoveType::Legal);
    if depth == 1 {
        return list.len() as u64;
    }
    let mut nodes = 0;
    for &mv in list.iter() {
        pos.do_move(mv);
        nodes += perft(pos, mg, depth - 1);
        pos.undo_move();
    }
    nodes
}
