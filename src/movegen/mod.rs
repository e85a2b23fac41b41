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

// Staged move generation. The generator itself carries no state (the
// attack tables it needs live behind the `Position` it is handed), so one
// instance is shared everywhere the way the teacher shares its own
// `MoveGenerator` behind an `Arc`.

pub mod defs;
pub mod mate1;

use self::defs::{MoveList, MoveType};
use crate::position::bitboard::{self, BitBoard};
use crate::position::defs::{other_side, would_be_stuck, Move, PieceType, Pieces, Square};
use crate::position::Position;
use crate::defs::Sides;

#[derive(Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        MoveGenerator
    }

    pub fn generate_moves(&self, pos: &Position, list: &mut MoveList, mt: MoveType) {
        match mt {
            MoveType::All => {
                generate_board_moves(pos, list, BitBoard::EMPTY, true, true);
                generate_drops(pos, list, None);
            }
            MoveType::Captures => {
                generate_board_moves(pos, list, BitBoard::EMPTY, true, false);
            }
            MoveType::Quiets => {
                generate_board_moves(pos, list, BitBoard::EMPTY, false, true);
                generate_drops(pos, list, None);
            }
            MoveType::Evasions => generate_evasions(pos, list),
            MoveType::Checks => generate_checks(pos, list, false),
            MoveType::QuietChecks => generate_checks(pos, list, true),
            MoveType::RecapturesTo(sq) => generate_recaptures(pos, list, sq),
            MoveType::Legal => {
                let mut scratch = MoveList::new();
                generate_board_moves(pos, &mut scratch, BitBoard::EMPTY, true, true);
                generate_drops(pos, &mut scratch, None);
                let mut work = pos.clone_for_search();
                for &mv in scratch.iter() {
                    if work.legal(mv) {
                        list.push(mv);
                    }
                }
            }
        }
    }
}

// Pushes `mv` plus, when the move allows a choice, its promoted sibling.
// A promotion is offered whenever the piece can promote and either end of
// the move touches the mover's promotion zone; it is the *only* option
// offered when staying unpromoted would leave the piece permanently
// stuck (pawn/lance on the far rank, knight on the far two ranks).
fn push_board_move(list: &mut MoveList, us: usize, pt: usize, from: Square, to: Square, captured: usize) {
    let zone_move = bitboard::in_promotion_zone(from, us) || bitboard::in_promotion_zone(to, us);
    if PieceType::can_promote(pt) && zone_move {
        list.push(Move::new_board_move(from, to, true, pt, captured));
        if !would_be_stuck(pt, to, us) {
            list.push(Move::new_board_move(from, to, false, pt, captured));
        }
    } else {
        list.push(Move::new_board_move(from, to, false, pt, captured));
    }
}

// Generic piece-by-piece board move generator. `only_to` restricts
// destinations to that mask when non-empty (used by evasions/recaptures);
// otherwise `captures`/`quiets` select which destination classes to emit.
fn generate_board_moves(pos: &Position, list: &mut MoveList, only_to: BitBoard, captures: bool, quiets: bool) {
    let us = pos.us();
    let them = other_side(us);
    let occ = pos.occupancy();
    let own = pos.color_occupancy(us);
    let enemy = pos.color_occupancy(them);

    for pt in (PieceType::PAWN..=PieceType::KING).chain(PieceType::PROM_PAWN..=PieceType::DRAGON) {
        let mut pieces = pos.pieces(us, pt);
        while !pieces.is_empty() {
            let from = pieces.pop_lsb();
            let mut targets = pos.attacks_from(pt, us, from, occ) & !own;
            if !only_to.is_empty() {
                targets &= only_to;
            }
            while !targets.is_empty() {
                let to = targets.pop_lsb();
                let is_capture = enemy.has(to);
                if is_capture && !captures {
                    continue;
                }
                if !is_capture && !quiets {
                    continue;
                }
                let captured_pt = if is_capture {
                    Pieces::piece_type(pos.piece_on(to))
                } else {
                    PieceType::NONE
                };
                push_board_move(list, us, pt, from, to, captured_pt);
            }
        }
    }
}

// Drop mask for `pt`: the empty-square set minus whichever stuck-piece
// and nifu restrictions apply, per piece type. `target_mask`, when given,
// further restricts destinations (evasions: only the interposition set).
fn drop_mask(pos: &Position, pt: usize, us: usize) -> BitBoard {
    let mut mask = !pos.occupancy();
    mask &= !back_rank_mask(pt, us);
    if pt == PieceType::PAWN {
        for file in 0..crate::position::defs::NR_FILES {
            if !(pos.pieces(us, PieceType::PAWN) & bitboard::file_mask(file)).is_empty() {
                mask &= !bitboard::file_mask(file);
            }
        }
    }
    mask
}

fn back_rank_mask(pt: usize, us: usize) -> BitBoard {
    let ranks: &[usize] = match pt {
        PieceType::PAWN | PieceType::LANCE => {
            if us == Sides::BLACK {
                &[0]
            } else {
                &[8]
            }
        }
        PieceType::KNIGHT => {
            if us == Sides::BLACK {
                &[0, 1]
            } else {
                &[7, 8]
            }
        }
        _ => &[],
    };
    let mut bb = BitBoard::EMPTY;
    for &r in ranks {
        bb |= bitboard::rank_mask(r);
    }
    bb
}

fn generate_drops(pos: &Position, list: &mut MoveList, target_mask: Option<BitBoard>) {
    let us = pos.us();
    for &pt in PieceType::HAND_ORDER.iter() {
        if pos.hand(us).count(pt) == 0 {
            continue;
        }
        let mut mask = drop_mask(pos, pt, us);
        if let Some(t) = target_mask {
            mask &= t;
        }
        while !mask.is_empty() {
            let to = mask.pop_lsb();
            if pt == PieceType::PAWN && pos.would_drop_pawn_mate(to) {
                continue;
            }
            list.push(Move::new_drop(to, pt));
        }
    }
}

fn generate_recaptures(pos: &Position, list: &mut MoveList, sq: Square) {
    let mut target = BitBoard::EMPTY;
    target.set(sq);
    generate_board_moves(pos, list, target, true, false);
}

// Evasions: king steps off the attacked squares first; if exactly one
// checker, interpositions along the checking ray (or a capture of the
// checker itself) follow. A double check only ever yields king moves.
fn generate_evasions(pos: &Position, list: &mut MoveList) {
    let us = pos.us();
    let them = other_side(us);
    let checkers = pos.checkers();
    let king_sq = pos.king_square(us);
    let occ_without_king = {
        let mut occ = pos.occupancy();
        occ.clear(king_sq);
        occ
    };

    let mut king_targets = pos.attacks_from(PieceType::KING, us, king_sq, occ_without_king) & !pos.color_occupancy(us);
    while !king_targets.is_empty() {
        let to = king_targets.pop_lsb();
        if pos.square_attacked(to, them) {
            continue;
        }
        let captured_pt = if pos.color_occupancy(them).has(to) {
            Pieces::piece_type(pos.piece_on(to))
        } else {
            PieceType::NONE
        };
        list.push(Move::new_board_move(king_sq, to, false, PieceType::KING, captured_pt));
    }

    if checkers.count_ones() != 1 {
        return;
    }
    let checker_sq = {
        let mut c = checkers;
        c.pop_lsb()
    };
    let mut block_mask = crate::position::squares_between(king_sq, checker_sq);
    block_mask.set(checker_sq);

    let mut pieces = pos.color_occupancy(us);
    pieces.clear(king_sq);
    while !pieces.is_empty() {
        let from = pieces.pop_lsb();
        let pt = Pieces::piece_type(pos.piece_on(from));
        let mut targets = pos.attacks_from(pt, us, from, pos.occupancy()) & block_mask;
        while !targets.is_empty() {
            let to = targets.pop_lsb();
            let captured_pt = if to == checker_sq {
                Pieces::piece_type(pos.piece_on(checker_sq))
            } else {
                PieceType::NONE
            };
            push_board_move(list, us, pt, from, to, captured_pt);
        }
    }
    generate_drops(pos, list, Some(block_mask));
}

// Checks/quiet-checks are derived by filtering the relevant pseudo-legal
// candidates through a scratch clone rather than pre-computing "squares
// from which this piece type would check the enemy king" bitboards for
// every piece type; the thin evaluator and shallow qsearch depth this
// feeds do not need the saved cycles badly enough to justify the extra
// bookkeeping surface.
fn generate_checks(pos: &Position, list: &mut MoveList, quiet_only: bool) {
    let mut candidates = MoveList::new();
    if quiet_only {
        generate_board_moves(pos, &mut candidates, BitBoard::EMPTY, false, true);
        generate_drops(pos, &mut candidates, None);
    } else {
        generate_board_moves(pos, &mut candidates, BitBoard::EMPTY, true, true);
        generate_drops(pos, &mut candidates, None);
    }
    let mut work = pos.clone_for_search();
    for &mv in candidates.iter() {
        if work.pseudo_legal(mv) && work.gives_check(mv) {
            list.push(mv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::defs::{MoveList, MoveType};
    use super::MoveGenerator;
    use crate::position::attacks::AttackTables;
    use crate::position::zobrist::ZobristRandoms;
    use crate::position::Position;
    use crate::defs::SFEN_START_POSITION;
    use std::sync::Arc;

    fn fresh(sfen: &str) -> Position {
        let mut pos = Position::new(Arc::new(AttackTables::new()), Arc::new(ZobristRandoms::new()));
        pos.set_sfen(sfen).unwrap();
        pos
    }

    #[test]
    fn start_position_has_thirty_pseudo_legal_moves() {
        let pos = fresh(SFEN_START_POSITION);
        let mg = MoveGenerator::new();
        let mut list = MoveList::new();
        mg.generate_moves(&pos, &mut list, MoveType::All);
        // 9 pawns + 2 lances + 2 knights + 2 silvers + 2 golds (no legal
        // gold moves from the back rank, they are boxed in) + bishop +
        // rook each have exactly one legal opening step; no promotions or
        // drops are possible from the start position.
        assert_eq!(list.len(), 30);
    }

    #[test]
    fn evasion_list_is_nonempty_when_in_check_and_has_a_king_move() {
        let mut pos = fresh("4k4/9/9/9/4R4/9/9/9/4K4 b - 1");
        let mv = crate::position::defs::Move::new_board_move(
            crate::position::defs::square_of(4, 4),
            crate::position::defs::square_of(1, 4),
            false,
            crate::position::defs::PieceType::ROOK,
            crate::position::defs::PieceType::NONE,
        );
        pos.do_move(mv);
        assert!(pos.in_check());

        let mg = MoveGenerator::new();
        let mut list = MoveList::new();
        mg.generate_moves(&pos, &mut list, MoveType::Evasions);
        assert!(!list.is_empty());
        let has_king_move = list
            .iter()
            .any(|m| m.piece_type() == crate::position::defs::PieceType::KING);
        assert!(has_king_move);
    }

    #[test]
    fn double_check_only_yields_king_moves() {
        // A black lance pins the white king along the file while a black
        // knight jumps in to check it at the same time: genuine double
        // check, no single-capture or block can answer both at once.
        let pos = fresh("4k4/9/5N3/9/9/4L4/9/9/4K4 w - 1");
        assert_eq!(pos.checkers().count_ones(), 2);
        let mg = MoveGenerator::new();
        let mut list = MoveList::new();
        mg.generate_moves(&pos, &mut list, MoveType::Evasions);
        assert!(!list.is_empty());
        assert!(list
            .iter()
            .all(|m| m.piece_type() == crate::position::defs::PieceType::KING));
    }

    #[test]
    fn legal_filters_out_moves_that_self_check() {
        // Black king pinned by a white rook along the file: moving the
        // king sideways off the file must still be legal, but a knight
        // sitting between them is pinned and cannot legally move away.
        let pos = fresh("9/9/9/4r4/4N4/4K4/9/9/9 b - 1");
        let mg = MoveGenerator::new();
        let mut all = MoveList::new();
        mg.generate_moves(&pos, &mut all, MoveType::All);
        let mut legal = MoveList::new();
        mg.generate_moves(&pos, &mut legal, MoveType::Legal);
        assert!(legal.len() < all.len());
        assert!(legal
            .iter()
            .all(|m| m.piece_type() != crate::position::defs::PieceType::KNIGHT));
    }
}
