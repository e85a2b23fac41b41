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

// Shogi's repetition rule (sennichite) has no chess analogue: four
// occurrences of the same position is a draw, unless one side has been
// giving continuous check throughout (that side loses), or unless one
// side's hand has strictly improved across the cycle (the "superior
// repetition" exception some rule sets use to break the draw in the
// improved side's favour).

use super::defs::other_side;
use crate::defs::Sides;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    None,
    Draw,
    PerpetualCheckWin,
    PerpetualCheckLose,
    SuperiorBlack,
    SuperiorWhite,
}

impl super::Position {
    pub fn detect_repetition(&self) -> Repetition {
        let top_key = self.key();
        let mover = self.side_to_move;
        let depth = self.states.len();
        if depth < 9 {
            return Repetition::None;
        }

        let mut occurrences = 1;
        let mut ply = 2usize;
        while ply < depth {
            let idx = depth - 1 - ply;
            let st = self.states.get(idx);
            if st.key() == top_key {
                occurrences += 1;
                if occurrences >= 4 {
                    if self.all_checks_in_window(ply) {
                        // The side that has been checking throughout the
                        // cycle loses it; `ply` plies separate the two
                        // occurrences, so the checking side alternates
                        // with `mover` by the parity of that gap.
                        let checking_side = if ply % 2 == 0 { mover } else { other_side(mover) };
                        return if checking_side == mover {
                            Repetition::PerpetualCheckLose
                        } else {
                            Repetition::PerpetualCheckWin
                        };
                    }
                    // A gap of exactly 2 plies can only be the immediate
                    // back-and-forth of a single move pair; hand counts
                    // cannot have changed, so there is nothing to compare.
                    if ply != 2 {
                        let black_now = self.hand[Sides::BLACK];
                        let black_then = st.black_hand_snapshot;
                        if black_now != black_then {
                            if black_now.dominates(&black_then) {
                                return Repetition::SuperiorBlack;
                            }
                            if black_then.dominates(&black_now) {
                                return Repetition::SuperiorWhite;
                            }
                        }
                    }
                    return Repetition::Draw;
                }
            }
            ply += 2;
        }
        Repetition::None
    }

    fn all_checks_in_window(&self, ply: usize) -> bool {
        let depth = self.states.len();
        for back in 1..=ply {
            if self.states.get(depth - 1 - back).checkers.is_empty() {
                return false;
            }
        }
        true
    }

    pub fn in_repetition(&self) -> bool {
        self.detect_repetition() != Repetition::None
    }
}

#[cfg(test)]
mod tests {
    use super::super::attacks::AttackTables;
    use super::super::defs::{square_of, Move, PieceType};
    use super::super::zobrist::ZobristRandoms;
    use super::super::Position;
    use super::Repetition;
    use std::sync::Arc;

    fn fresh(sfen: &str) -> Position {
        let mut pos = Position::new(Arc::new(AttackTables::new()), Arc::new(ZobristRandoms::new()));
        pos.set_sfen(sfen).unwrap();
        pos
    }

    #[test]
    fn fourfold_repetition_without_checks_is_a_draw() {
        let mut pos = fresh("4k4/9/9/9/4R4/9/9/9/4K4 b - 1");
        let rook_out = Move::new_board_move(square_of(4, 4), square_of(3, 4), false, PieceType::ROOK, PieceType::NONE);
        let rook_back = Move::new_board_move(square_of(3, 4), square_of(4, 4), false, PieceType::ROOK, PieceType::NONE);
        let king_out = Move::new_board_move(square_of(0, 4), square_of(0, 3), false, PieceType::KING, PieceType::NONE);
        let king_back = Move::new_board_move(square_of(0, 3), square_of(0, 4), false, PieceType::KING, PieceType::NONE);

        for _ in 0..3 {
            pos.do_move(rook_out);
            pos.do_move(king_out);
            pos.do_move(rook_back);
            pos.do_move(king_back);
        }

        assert_eq!(pos.detect_repetition(), Repetition::Draw);
        assert!(pos.in_repetition());
    }

    #[test]
    fn continuous_checking_side_loses_by_repetition() {
        // Two rooks, each shuttling between a pair of squares on the
        // opposing king's file, so that every single ply leaves the side
        // about to move in check: black's rook checks white after every
        // black move, white's rook checks black after every white move.
        let mut pos = fresh("8k/9/9/8R/9/9/r8/9/K8 b - 1");
        let br_out = Move::new_board_move(square_of(3, 8), square_of(2, 8), false, PieceType::ROOK, PieceType::NONE);
        let br_back = Move::new_board_move(square_of(2, 8), square_of(3, 8), false, PieceType::ROOK, PieceType::NONE);
        let wr_out = Move::new_board_move(square_of(6, 0), square_of(5, 0), false, PieceType::ROOK, PieceType::NONE);
        let wr_back = Move::new_board_move(square_of(5, 0), square_of(6, 0), false, PieceType::ROOK, PieceType::NONE);

        for _ in 0..3 {
            pos.do_move(br_out);
            pos.do_move(wr_out);
            pos.do_move(br_back);
            pos.do_move(wr_back);
        }

        assert_eq!(pos.detect_repetition(), Repetition::PerpetualCheckLose);
    }

    #[test]
    fn fewer_than_four_occurrences_is_not_a_repetition() {
        let mut pos = fresh("4k4/9/9/9/4R4/9/9/9/4K4 b - 1");
        let rook_out = Move::new_board_move(square_of(4, 4), square_of(3, 4), false, PieceType::ROOK, PieceType::NONE);
        let rook_back = Move::new_board_move(square_of(3, 4), square_of(4, 4), false, PieceType::ROOK, PieceType::NONE);
        let king_out = Move::new_board_move(square_of(0, 4), square_of(0, 3), false, PieceType::KING, PieceType::NONE);
        let king_back = Move::new_board_move(square_of(0, 3), square_of(0, 4), false, PieceType::KING, PieceType::NONE);

        pos.do_move(rook_out);
        pos.do_move(king_out);
        pos.do_move(rook_back);
        pos.do_move(king_back);

        assert_eq!(pos.detect_repetition(), Repetition::None);
    }
}
