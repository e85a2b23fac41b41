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

// Exhaustive 1-ply mate search: does the side to move have any single
// move that mates right now? Chess engines never need this (a lone
// checking move essentially never mates outright), but shogi's drop
// rules make an immediate mate-in-1 common enough that search spends a
// cheap, specialised pass looking for it at every node before falling
// back to ordinary search. Candidates are restricted up front to moves
// that give check at all: everything else cannot mate.

use super::defs::MoveList;
use crate::position::bitboard::BitBoard;
use crate::position::defs::{other_side, Move, PieceType, Pieces};
use crate::position::Position;

pub fn find_mate_in_one(pos: &Position) -> Option<Move> {
    let mut work = pos.clone_for_search();
    let mut candidates = MoveList::new();
    super::generate_drops(&work, &mut candidates, None);
    super::generate_board_moves(&work, &mut candidates, BitBoard::EMPTY, true, true);

    for &mv in candidates.iter() {
        if !work.pseudo_legal(mv) {
            continue;
        }
        if mv.is_drop() && mv.piece_type() == PieceType::PAWN {
            // Drop-pawn-mate is illegal by rule, not a candidate at all;
            // `pseudo_legal` already screens it out via
            // `would_drop_pawn_mate`, so reaching here means the drop
            // does not mate and is not worth trying.
            continue;
        }
        if !work.legal(mv) {
            continue;
        }
        if is_mate_after(&mut work, mv) {
            return Some(mv);
        }
    }
    None
}

fn is_mate_after(work: &mut Position, mv: Move) -> bool {
    work.do_move(mv);
    let mated = work.in_check() && is_checkmate(work);
    work.undo_move();
    mated
}

// With the move already played, exhaustively verifies there is no reply:
// the king has no attacker-free escape square, and every checker (there
// can be at most two after a single move, since a move itself cannot
// create more than a discovered check plus its own check) is either
// uncapturable or blockable only by a pinned defender.
fn is_checkmate(pos: &Position) -> bool {
    let us = pos.us();
    let them = other_side(us);
    let checkers = pos.checkers();
    let king_sq = pos.king_square(us);

    let mut occ_without_king = pos.occupancy();
    occ_without_king.clear(king_sq);
    let mut escapes = pos.attacks_from(PieceType::KING, us, king_sq, occ_without_king) & !pos.color_occupancy(us);
    while !escapes.is_empty() {
        let to = escapes.pop_lsb();
        if !pos.square_attacked(to, them) {
            return false;
        }
    }

    if checkers.count_ones() != 1 {
        // Double check: only the king escapes could have answered it, and
        // none did.
        return true;
    }

    let mut checker_bb = checkers;
    let checker_sq = checker_bb.pop_lsb();
    // The king capturing the checker is already covered by the escape-
    // square scan above (which correctly rejects it if the square stays
    // defended); exclude it here so it isn't treated as a second, more
    // permissive way to answer the check.
    let capturers = pos.attacked_by(checker_sq, us, pos.occupancy()) & !BitBoard::from_square(king_sq);
    let pinned = pos.pinned_pieces(us);
    for c in capturers.iter() {
        if !pinned.has(c) {
            return false;
        }
    }

    let block_mask = crate::position::squares_between(king_sq, checker_sq);
    if block_mask.is_empty() {
        return true;
    }
    let mut blockers = pos.color_occupancy(us);
    blockers.clear(king_sq);
    for from in blockers.iter() {
        let pt = Pieces::piece_type(pos.piece_on(from));
        if pinned.has(from) {
            continue;
        }
        if !(pos.attacks_from(pt, us, from, pos.occupancy()) & block_mask).is_empty() {
            return false;
        }
    }
    for &pt in PieceType::HAND_ORDER.iter() {
        if pos.hand(us).count(pt) == 0 {
            continue;
        }
        let mut drop_targets = block_mask & !pos.occupancy();
        if pt == PieceType::PAWN {
            // A pawn drop could only block on the checker's own file if
            // that file is free of an unpromoted pawn already, and never
            // on the back rank; `is_checkmate` is already past the point
            // where a mating pawn drop would have been excluded, so any
            // remaining legal pawn-drop block still defeats the mate.
            for file in 0..crate::position::defs::NR_FILES {
                if !(pos.pieces(us, PieceType::PAWN) & crate::position::bitboard::file_mask(file)).is_empty() {
                    drop_targets &= !crate::position::bitboard::file_mask(file);
                }
            }
        }
        if !drop_targets.is_empty() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::find_mate_in_one;
    use crate::position::attacks::AttackTables;
    use crate::position::zobrist::ZobristRandoms;
    use crate::position::Position;
    use std::sync::Arc;

    fn fresh(sfen: &str) -> Position {
        let mut pos = Position::new(Arc::new(AttackTables::new()), Arc::new(ZobristRandoms::new()));
        pos.set_sfen(sfen).unwrap();
        pos
    }

    #[test]
    fn gold_drop_mates_a_cornered_king() {
        // White king boxed into the corner by its own pawn and a black
        // silver; a black gold in hand drops at (0,1), delivering check
        // with no escape, no capture, and no block available.
        let pos = fresh("k1S6/1p7/9/9/9/9/9/9/8K b G 1");
        let mv = find_mate_in_one(&pos).expect("mate in one should be found");
        assert!(mv.is_drop());
        assert_eq!(mv.piece_type(), crate::position::defs::PieceType::GOLD);
    }

    #[test]
    fn no_mate_when_king_has_an_escape_square() {
        let pos = fresh("4k4/9/9/9/9/9/9/9/3RK4 b - 1");
        assert!(find_mate_in_one(&pos).is_none());
    }
}
