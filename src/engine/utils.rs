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

use super::{defs::ErrNormal, Engine};
use crate::{
    defs::EngineRunResult,
    misc::parse::{self, PotentialMove},
    movegen::{
        defs::{MoveList, MoveType},
        MoveGenerator,
    },
    position::defs::Move,
};

impl Engine {
    // Sets up the position given on the command line. Failure leaves the
    // previous position untouched (§7: bad external input is reported,
    // not fatal).
    pub fn setup_position(&mut self) -> EngineRunResult {
        let sfen = self.cmdline.sfen();
        self.position.set_sfen(&sfen).map_err(|_| ErrNormal::SFEN_FAILED.to_string())
    }

    // Plays a USI move string on the internal position if (and only if)
    // it names a currently legal move. Anything else - bad syntax, a move
    // that doesn't exist in this position - is a no-op reported back to
    // the caller as `false`.
    pub fn execute_move(&mut self, m: String) -> bool {
        let potential = match parse::parse_move(&m) {
            Some(p) => p,
            None => return false,
        };
        let mg = MoveGenerator::new();
        match self.find_legal_move(&mg, potential) {
            Some(mv) => {
                self.position.do_move(mv);
                true
            }
            None => false,
        }
    }

    fn find_legal_move(&self, mg: &MoveGenerator, potential: PotentialMove) -> Option<Move> {
        let mut list = MoveList::new();
        mg.generate_moves(&self.position, &mut list, MoveType::Legal);
        for &mv in list.iter() {
            let is_match = match potential {
                PotentialMove::Board { from, to, promote } => {
                    !mv.is_drop() && mv.from() == from && mv.to() == to && mv.is_promotion() == promote
                }
                PotentialMove::Drop { piece_type, to } => mv.is_drop() && mv.dropped_piece_type() == piece_type && mv.to() == to,
            };
            if is_match {
                return Some(mv);
            }
        }
        None
    }
}
