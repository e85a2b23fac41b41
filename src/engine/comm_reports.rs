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

use super::defs::{EngineOptionName, ErrNormal};
use super::Engine;
use crate::book::Book;
use crate::comm::usi::UsiReport;
use crate::comm::CommControl;
use crate::movegen::defs::{MoveList, MoveType};
use crate::movegen::MoveGenerator;
use crate::search::defs::{SearchMode, SearchParams};
use crate::tt::TranspositionTable;
use std::sync::Arc;

// Handles one parsed USI command, sent to the engine by the command-loop
// in mod.rs after it has already broken out on "quit" itself.
impl Engine {
    pub fn comm_reports(&mut self, report: &UsiReport) {
        let mut sp = SearchParams::new();
        sp.quiet = self.settings.quiet;

        match report {
            UsiReport::Usi => self.comm.send(CommControl::Identify),
            UsiReport::IsReady => self.comm.send(CommControl::Ready),

            UsiReport::UsiNewGame => {
                self.tt.clear();
                let _ = self.position.set_sfen(crate::defs::SFEN_START_POSITION);
            }

            UsiReport::SetOption(name) => self.set_option(name),

            UsiReport::Position(sfen, moves) => {
                let result = self.position.set_sfen(sfen);
                if result.is_ok() {
                    for m in moves {
                        if !self.execute_move(m.clone()) {
                            let msg = format!("{m}: {}", ErrNormal::NOT_LEGAL);
                            self.comm.send(CommControl::InfoString(msg));
                            break;
                        }
                    }
                } else {
                    self.comm.send(CommControl::InfoString(ErrNormal::SFEN_FAILED.to_string()));
                }
            }

            UsiReport::GoInfinite => {
                if self.try_play_book_move() {
                    return;
                }
                sp.search_mode = SearchMode::Infinite;
                self.start_search(sp);
            }

            UsiReport::GoDepth(depth) => {
                if self.try_play_book_move() {
                    return;
                }
                sp.depth = *depth;
                sp.search_mode = SearchMode::Depth;
                self.start_search(sp);
            }

            UsiReport::GoMoveTime(msecs) => {
                if self.try_play_book_move() {
                    return;
                }
                sp.move_time = *msecs;
                sp.search_mode = SearchMode::MoveTime;
                self.start_search(sp);
            }

            UsiReport::GoNodes(nodes) => {
                if self.try_play_book_move() {
                    return;
                }
                sp.nodes = *nodes;
                sp.search_mode = SearchMode::Nodes;
                self.start_search(sp);
            }

            UsiReport::GoGameTime(gt) => {
                if self.try_play_book_move() {
                    return;
                }
                sp.game_time = *gt;
                sp.search_mode = SearchMode::GameTime;
                self.start_search(sp);
            }

            UsiReport::GoPonder(gt) => {
                // A pondering side cannot also play an instant book move
                // in place of search: there is no "go" result expected
                // until ponderhit/stop, so the book is skipped here.
                sp.game_time = *gt;
                sp.search_mode = SearchMode::Ponder;
                self.start_search(sp);
            }

            UsiReport::Stop => self.stop_search(),

            // The running ponder search already carries the game clock it
            // was given; there is nothing further to switch over to here.
            UsiReport::PonderHit => (),

            UsiReport::GameOver => self.stop_search(),

            UsiReport::Quit | UsiReport::Unknown => (),
        }
    }

    fn set_option(&mut self, name: &EngineOptionName) {
        match name {
            EngineOptionName::Hash(value) => {
                if let Ok(v) = value.parse::<usize>() {
                    self.stop_search();
                    self.settings.tt_size = v;
                    self.tt = Arc::new(TranspositionTable::new(v.max(1)));
                } else {
                    self.comm.send(CommControl::InfoString(ErrNormal::NOT_INT.to_string()));
                }
            }

            EngineOptionName::ClearHash => self.tt.clear(),

            EngineOptionName::Threads(value) => {
                if let Ok(v) = value.parse::<usize>() {
                    self.settings.threads = v.max(1);
                } else {
                    self.comm.send(CommControl::InfoString(ErrNormal::NOT_INT.to_string()));
                }
            }

            EngineOptionName::MultiPv(value) => {
                if let Ok(v) = value.parse::<usize>() {
                    self.settings.multi_pv = v.max(1);
                } else {
                    self.comm.send(CommControl::InfoString(ErrNormal::NOT_INT.to_string()));
                }
            }

            EngineOptionName::UsiPonder(value) => self.settings.ponder = value == "true",

            EngineOptionName::OwnBook(value) => {
                self.settings.own_book = value == "true";
                self.reload_book();
            }

            EngineOptionName::BookFile(value) => {
                self.settings.book_file = if value.is_empty() { None } else { Some(value.clone()) };
                self.reload_book();
            }

            EngineOptionName::BestBookMove(value) => self.settings.best_book_move = value == "true",

            EngineOptionName::MinBookScore(value) => {
                if let Ok(v) = value.parse::<i32>() {
                    self.settings.min_book_score = v;
                } else {
                    self.comm.send(CommControl::InfoString(ErrNormal::NOT_INT.to_string()));
                }
            }

            EngineOptionName::Contempt(value) => {
                if let Ok(v) = value.parse::<i32>() {
                    self.settings.contempt = v;
                } else {
                    self.comm.send(CommControl::InfoString(ErrNormal::NOT_INT.to_string()));
                }
            }

            EngineOptionName::ByoyomiMargin(value) => {
                if let Ok(v) = value.parse::<i64>() {
                    self.settings.byoyomi_margin = v;
                } else {
                    self.comm.send(CommControl::InfoString(ErrNormal::NOT_INT.to_string()));
                }
            }

            EngineOptionName::Nothing => (),
        }
    }

    // Re-reads the book file whenever OwnBook or BookFile changes. A
    // missing or unreadable file is reported but otherwise tolerated:
    // the book is left unset and search proceeds as if OwnBook were off.
    fn reload_book(&mut self) {
        self.book = None;
        if !self.settings.own_book {
            return;
        }
        let Some(path) = self.settings.book_file.clone() else {
            return;
        };
        match Book::load(&path) {
            Ok(book) => self.book = Some(book),
            Err(e) => self.comm.send(CommControl::InfoString(format!("book '{path}' unreadable: {e}"))),
        }
    }

    // Plays the book's move for the current position instead of
    // searching, if OwnBook is on, a book is loaded, and it has a
    // legal move recorded at this position's key. Returns whether it did.
    fn try_play_book_move(&mut self) -> bool {
        if !self.settings.own_book {
            return false;
        }
        let Some(book) = &self.book else {
            return false;
        };
        let mg = MoveGenerator::new();
        let mut list = MoveList::new();
        mg.generate_moves(&self.position, &mut list, MoveType::Legal);
        let legal: Vec<_> = list.iter().copied().collect();
        match book.probe(self.position.key(), self.settings.min_book_score, &legal) {
            Some(mv) => {
                self.comm.send(CommControl::BestMove(mv, None));
                true
            }
            None => false,
        }
    }
}
