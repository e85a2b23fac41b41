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

// The negamax core: one worker's view of the search tree, from the root
// move loop down through qsearch. A `Worker` owns everything that must
// not be shared across threads (its own Position, stack, history tables,
// node counter); the transposition table and the stop flag are the only
// things handed in from outside, both safe to share without locks.

use super::defs::{GameTime, OrderingTables, ReportBound, SearchMode, SearchParams, SearchStack};
use super::ordering::MovePicker;
use super::time::TimeManager;
use crate::defs::{Depth, Ply, Sides, Value, Value_, MAX_PLY};
use crate::movegen::defs::{MoveList, MoveType};
use crate::movegen::mate1::find_mate_in_one;
use crate::movegen::MoveGenerator;
use crate::position::defs::Move;
use crate::position::repetition::Repetition;
use crate::position::Position;
use crate::tt::entry::Bound;
use crate::tt::TranspositionTable;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::defs::SearchReport;

const CHECK_TERMINATION_MASK: u64 = 0xFFF; // ~every 4096 nodes, per-thread
const ASPIRATION_WINDOW: Value = 25;

fn razor_margin(depth: Depth) -> Value {
    200 + 200 * depth as Value
}

fn futility_margin(depth: Depth) -> Value {
    150 * depth as Value
}

fn null_move_reduction(depth: Depth) -> Depth {
    3 + depth / 6
}

// Logarithmic LMR table, read as `reduction(depth, move_number)`. PV
// nodes subtract one from whatever this returns (clamped at zero) since
// a PV line deserves less aggressive reduction than a non-PV cut node.
fn lmr_reduction(depth: Depth, move_number: u32) -> Depth {
    if depth < 3 || move_number < 4 {
        return 0;
    }
    let d = (depth as f64).ln();
    let m = (move_number as f64).ln();
    ((d * m / 2.25) as Depth).max(0)
}

// Move-count pruning threshold: quiets beyond this index at a given depth
// are skipped outright in a non-PV, non-improving node.
fn move_count_pruning_threshold(depth: Depth, improving: bool) -> u32 {
    let base = 3 + (depth as u32) * (depth as u32);
    if improving {
        base + base / 2
    } else {
        base
    }
}

// Deterministic per-worker desync pattern used by the Lazy SMP thread
// pool: the main worker (index 0) never skips; every other worker skips
// a depth the further it is from its own "home" phase in the rotation.
// This is not a port of any specific literal table, just the same idea
// (different workers search different depths to spread the shared TT
// workload) expressed from scratch.
pub fn should_skip_depth(worker_index: usize, depth_plus_ply: usize) -> bool {
    if worker_index == 0 {
        return false;
    }
    let period = 2 + (worker_index % 6);
    let phase = worker_index / 2;
    (depth_plus_ply + phase) % period == 0
}

pub struct Limits {
    pub node_cap: u64,
    pub hard_deadline_ms: Option<u128>,
}

impl Limits {
    pub fn from_params(sp: &SearchParams) -> Self {
        let node_cap = if sp.search_mode == SearchMode::Nodes {
            sp.nodes as u64
        } else {
            u64::MAX
        };
        let hard_deadline_ms = match sp.search_mode {
            SearchMode::MoveTime => Some(sp.move_time),
            _ => None,
        };
        Limits { node_cap, hard_deadline_ms }
    }
}

pub struct Worker {
    pub pos: Position,
    pub mg: MoveGenerator,
    pub tt: Arc<TranspositionTable>,
    pub stack: SearchStack,
    pub tables: OrderingTables,
    pub nodes: u64,
    pub seldepth: i8,
    pub stop: Arc<AtomicBool>,
    pub worker_index: usize,
    pub limits: Limits,
    pub tm: Option<TimeManager>,
    pub start: Instant,
    pub shared_nodes: Arc<AtomicU64>,
}

impl Worker {
    pub fn new(pos: Position, tt: Arc<TranspositionTable>, stop: Arc<AtomicBool>, worker_index: usize, shared_nodes: Arc<AtomicU64>) -> Self {
        Worker {
            pos,
            mg: MoveGenerator::new(),
            tt,
            stack: SearchStack::new(),
            tables: OrderingTables::new(),
            nodes: 0,
            seldepth: 0,
            stop,
            worker_index,
            limits: Limits { node_cap: u64::MAX, hard_deadline_ms: None },
            tm: None,
            start: Instant::now(),
            shared_nodes,
        }
    }

    fn time_up(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        if self.nodes >= self.limits.node_cap {
            return true;
        }
        if let Some(deadline) = self.limits.hard_deadline_ms {
            if self.start.elapsed().as_millis() >= deadline {
                return true;
            }
        }
        if let Some(tm) = &self.tm {
            if tm.must_stop() {
                return true;
            }
        }
        false
    }

    fn repetition_value(r: Repetition, mover: usize, ply: Ply) -> Option<Value> {
        const SAME_POSITION_VALUE: Value = Value_::MATE - MAX_PLY as Value - 1;
        match r {
            Repetition::None => None,
            Repetition::Draw => Some(Value_::DRAW),
            Repetition::PerpetualCheckLose => Some(Value_::mated_in(ply)),
            Repetition::PerpetualCheckWin => Some(Value_::mate_in(ply)),
            Repetition::SuperiorBlack => Some(if mover == Sides::BLACK { SAME_POSITION_VALUE } else { -SAME_POSITION_VALUE }),
            Repetition::SuperiorWhite => Some(if mover == Sides::WHITE { SAME_POSITION_VALUE } else { -SAME_POSITION_VALUE }),
        }
    }

    fn prev_move_at(&self, ply: Ply, back: usize) -> Move {
        if ply >= back {
            self.stack.at(ply - back).current_move
        } else {
            Move::NONE
        }
    }

    // The negamax node function. `cut_node_hint` marks a node expected to
    // fail high (the non-PV side of a null-window search), used to bias
    // reductions more aggressively.
    pub fn search(&mut self, mut alpha: Value, mut beta: Value, depth: Depth, ply: Ply, cut_node_hint: bool, is_pv: bool) -> Value {
        if depth <= 0 {
            return self.qsearch(alpha, beta, ply, self.pos.in_check());
        }

        self.nodes += 1;
        if self.nodes & CHECK_TERMINATION_MASK == 0 {
            self.shared_nodes.fetch_add(CHECK_TERMINATION_MASK + 1, Ordering::Relaxed);
            if self.time_up() {
                return Value_::ZERO;
            }
        }

        let root = ply == 0;
        let us = self.pos.us();

        if !root {
            if self.stop.load(Ordering::Relaxed) {
                return Value_::ZERO;
            }
            if let Some(v) = Self::repetition_value(self.pos.detect_repetition(), us, ply) {
                return v;
            }
            // Mate-distance pruning: a shorter mate than the one already
            // bounded by alpha/beta can't improve the result.
            alpha = alpha.max(Value_::mated_in(ply));
            beta = beta.min(Value_::mate_in(ply + 1));
            if alpha >= beta {
                return alpha;
            }
        }

        self.stack.clear_killers_ahead(ply);
        self.stack.clear_skip_pruning_ahead(ply);

        let in_check = self.pos.in_check();
        // A singular-extension probe at this ply XORs in the exclusion
        // constant so it lands on a separate TT slot from the real node,
        // and never sees (or pollutes) the ordinary entry for this position.
        let excluded = self.stack.at(ply).excluded_move;
        let key = if excluded.is_ok() {
            self.pos.key() ^ self.pos.zobrist_randoms().exclusion()
        } else {
            self.pos.key()
        };
        let mut tt_hit = self.tt.probe(key, ply);
        let mut tt_move = tt_hit.map(|e| e.mv).unwrap_or(Move::NONE);
        let mut tt_value = tt_hit.map(|e| e.value as Value);

        if !is_pv {
            if let (Some(entry), Some(v)) = (tt_hit, tt_value) {
                let usable = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => v >= beta,
                    Bound::Upper => v <= alpha,
                    Bound::None => false,
                };
                if usable && entry.depth as Depth >= depth {
                    return v;
                }
            }
        }

        if !root && !in_check && tt_hit.is_none() && depth >= 6 {
            if let Some(mate_move) = find_mate_in_one(&self.pos) {
                let v = Value_::mate_in(ply + 1);
                self.tt.store(key, mate_move, v, v, depth, Bound::Exact, ply);
                return v;
            }
        }

        let skip_pruning = self.stack.at(ply).skip_early_pruning;
        let static_eval = if in_check {
            Value_::NONE
        } else {
            let mut cache = self.stack.at(ply).eval_cache;
            let v = crate::evaluation::evaluate(&self.pos, &mut cache);
            self.stack.at_mut(ply).eval_cache = cache;
            v
        };
        self.stack.at_mut(ply).static_eval = static_eval;

        let improving = ply >= 2 && !in_check && static_eval > self.stack.at(ply - 2).static_eval;

        if !is_pv && !in_check && !skip_pruning && tt_value.is_none() {
            if depth <= 3 && static_eval + razor_margin(depth) <= alpha {
                let v = self.qsearch(alpha, alpha + 1, ply, false);
                if v <= alpha {
                    return v;
                }
            }

            if depth <= 6 && static_eval - futility_margin(depth) >= beta && static_eval.abs() < Value_::MATE_IN_MAX_PLY {
                return static_eval;
            }

            if depth >= 3 && static_eval >= beta && self.has_non_pawn_material(us) {
                let r = null_move_reduction(depth);
                self.pos.do_null_move();
                self.stack.at_mut(ply + 1).skip_early_pruning = true;
                let v = -self.search(-beta, -beta + 1, depth - r - 1, ply + 1, !cut_node_hint, false);
                self.stack.at_mut(ply + 1).skip_early_pruning = false;
                self.pos.undo_null_move();
                if !self.stop.load(Ordering::Relaxed) && v >= beta {
                    if v >= Value_::MATE_IN_MAX_PLY {
                        return beta;
                    }
                    return v;
                }
            }

            // ProbCut: a capture whose SEE already clears the raised beta is
            // very likely to hold up at full depth too; a single reduced
            // verification search per candidate confirms the cut cheaply.
            if depth >= 5 && beta.abs() < Value_::MATE_IN_MAX_PLY {
                let probcut_beta = beta + 200;
                let mut pc_list = MoveList::new();
                self.mg.generate_moves(&self.pos, &mut pc_list, MoveType::Captures);
                for &mv in pc_list.iter() {
                    if mv == excluded || !self.pos.pseudo_legal(mv) || !self.pos.legal(mv) {
                        continue;
                    }
                    if !self.pos.see_ge(mv, probcut_beta - static_eval) {
                        continue;
                    }
                    self.stack.at_mut(ply).current_move = mv;
                    self.pos.do_move(mv);
                    let v = -self.search(-probcut_beta, -probcut_beta + 1, depth - 4, ply + 1, !cut_node_hint, false);
                    self.pos.undo_move();
                    if self.stop.load(Ordering::Relaxed) {
                        return Value_::ZERO;
                    }
                    if v >= probcut_beta {
                        return v;
                    }
                }
            }
        }

        // Internal iterative deepening: with no TT move to try first, a
        // shallow recursive search buys one cheaply before the real move
        // loop starts, so later ordering isn't flying blind.
        if tt_move == Move::NONE && !in_check && depth >= 4 {
            let iid_depth = depth - 2 - depth / 4;
            if iid_depth > 0 {
                self.search(alpha, beta, iid_depth, ply, cut_node_hint, is_pv);
                if self.stop.load(Ordering::Relaxed) {
                    return Value_::ZERO;
                }
                tt_hit = self.tt.probe(key, ply);
                tt_move = tt_hit.map(|e| e.mv).unwrap_or(Move::NONE);
                tt_value = tt_hit.map(|e| e.value as Value);
            }
        }

        let prev = self.prev_move_at(ply, 1);
        let prev2 = self.prev_move_at(ply, 2);
        let prev4 = self.prev_move_at(ply, 4);
        let killers = self.stack.at(ply).killers;
        let countermove = if prev.is_ok() {
            self.tables.countermove.get(prev.piece_type(), prev.to())
        } else {
            Move::NONE
        };
        let killer_moves = [
            crate::position::defs::Move(killers[0].0 as u32),
            crate::position::defs::Move(killers[1].0 as u32),
        ];

        let mut picker = MovePicker::new(in_check, tt_move, killer_moves, countermove);
        let mut best_value = Value_::mated_in(ply);
        let mut best_move = Move::NONE;
        let mut move_number = 0u32;
        let mut quiets_tried: Vec<Move> = Vec::new();
        let orig_alpha = alpha;

        while let Some(mv) = picker.next(&self.pos, &self.mg, &self.tables, prev, prev2, prev4) {
            if mv == excluded {
                continue;
            }
            if !self.pos.pseudo_legal(mv) {
                continue;
            }
            if !self.pos.legal(mv) {
                continue;
            }
            move_number += 1;

            let gives_check = self.pos.gives_check(mv);
            let is_quiet = !mv.is_capture();

            if !root && !is_pv && best_value > Value_::mated_in(MAX_PLY) {
                if is_quiet && !in_check && !gives_check && move_number > move_count_pruning_threshold(depth, improving) {
                    continue;
                }
                if is_quiet && !in_check && depth <= 6 && static_eval + futility_margin(depth) + 256 <= alpha {
                    continue;
                }
                if is_quiet && !gives_check && depth <= 4 && !self.pos.see_ge(mv, -35 * depth as Value) {
                    continue;
                }
                if is_quiet && !gives_check && depth <= 3 && super::ordering::quiet_history_all_negative(mv, &self.tables, prev, prev2, prev4, us) {
                    continue;
                }
            }

            let mut extension: Depth = if gives_check && self.pos.see_ge(mv, 0) { 1 } else { 0 };

            // Singular extension: verify the TT move isn't merely good but
            // the *only* good move here, by researching the rest of the
            // position at a reduced depth and a lowered bound, excluding it.
            // If nothing else comes close, the TT move earns an extra ply.
            if extension == 0
                && !root
                && !excluded.is_ok()
                && mv == tt_move
                && depth >= 8
                && tt_hit.map_or(false, |e| e.depth as Depth >= depth - 3 && matches!(e.bound, Bound::Lower | Bound::Exact))
            {
                if let Some(tt_val) = tt_value {
                    if tt_val.abs() < Value_::MATE_IN_MAX_PLY {
                        let margin = 2 * depth as Value;
                        let s_beta = tt_val - margin;
                        let s_depth = (depth - 1) / 2;
                        self.stack.at_mut(ply).excluded_move = mv;
                        let v = self.search(s_beta - 1, s_beta, s_depth, ply, true, false);
                        self.stack.at_mut(ply).excluded_move = Move::NONE;
                        if !self.stop.load(Ordering::Relaxed) && v < s_beta {
                            extension = 1;
                        }
                    }
                }
            }

            self.stack.at_mut(ply).current_move = mv;
            self.pos.do_move(mv);

            let mut value;
            if move_number == 1 {
                value = -self.search(-beta, -alpha, depth - 1 + extension, ply + 1, false, is_pv);
            } else {
                let mut r = lmr_reduction(depth, move_number);
                if is_pv && r > 0 {
                    r -= 1;
                }
                if !is_quiet {
                    r = 0;
                }
                let reduced_depth = (depth - 1 + extension - r).max(0);
                value = -self.search(-alpha - 1, -alpha, reduced_depth, ply + 1, true, false);
                if value > alpha && (r > 0 || reduced_depth < depth - 1 + extension) {
                    value = -self.search(-alpha - 1, -alpha, depth - 1 + extension, ply + 1, !cut_node_hint, false);
                }
                if value > alpha && value < beta {
                    value = -self.search(-beta, -alpha, depth - 1 + extension, ply + 1, false, true);
                }
            }

            self.pos.undo_move();

            if is_quiet {
                quiets_tried.push(mv);
            }

            if self.stop.load(Ordering::Relaxed) {
                return Value_::ZERO;
            }

            if value > best_value {
                best_value = value;
                best_move = mv;
                if value > alpha {
                    alpha = value;
                }
            }

            if alpha >= beta {
                if is_quiet {
                    self.record_cutoff(mv, depth, ply, &quiets_tried, prev, prev2, prev4);
                }
                break;
            }
        }

        if move_number == 0 {
            return if in_check { Value_::mated_in(ply) } else { Value_::DRAW };
        }

        let bound = if best_value <= orig_alpha {
            Bound::Upper
        } else if best_value >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt.store(key, best_move, best_value, static_eval, depth, bound, ply);

        best_value
    }

    fn has_non_pawn_material(&self, side: usize) -> bool {
        use crate::position::defs::PieceType;
        for pt in PieceType::LANCE..=PieceType::ROOK {
            if !self.pos.pieces(side, pt).is_empty() {
                return true;
            }
        }
        false
    }

    fn record_cutoff(&mut self, mv: Move, depth: Depth, ply: Ply, quiets_tried: &[Move], prev: Move, prev2: Move, prev4: Move) {
        let slot = self.stack.at_mut(ply);
        if slot.killers[0] != mv.to_short() {
            slot.killers[1] = slot.killers[0];
            slot.killers[0] = mv.to_short();
        }
        if prev.is_ok() {
            self.tables.countermove.set(prev.piece_type(), prev.to(), mv);
        }

        let bonus = (depth as i32) * (depth as i32);
        for &tried in quiets_tried {
            let is_cutoff = tried == mv;
            let signed = if is_cutoff { bonus } else { -bonus };
            self.tables.history.update(tried.piece_type(), tried.to(), signed);
            self.tables
                .from_to_history
                .update(self.pos.us(), tried.from(), tried.to(), signed);
            if prev.is_ok() {
                self.tables
                    .countermove_history
                    .update(prev.piece_type(), prev.to(), tried.piece_type(), tried.to(), signed);
            }
            if prev2.is_ok() {
                self.tables
                    .follow_up_history
                    .update(prev2.piece_type(), prev2.to(), tried.piece_type(), tried.to(), signed);
            }
            if prev4.is_ok() {
                self.tables
                    .prev4_history
                    .update(prev4.piece_type(), prev4.to(), tried.piece_type(), tried.to(), signed);
            }
        }
    }

    pub fn qsearch(&mut self, mut alpha: Value, beta: Value, ply: Ply, in_check: bool) -> Value {
        self.nodes += 1;
        if self.nodes & CHECK_TERMINATION_MASK == 0 && self.time_up() {
            return Value_::ZERO;
        }
        if ply >= MAX_PLY {
            return if in_check { Value_::DRAW } else { crate::evaluation::evaluate(&self.pos, &mut self.stack.at_mut(ply).eval_cache) };
        }

        let key = self.pos.key();
        if !in_check {
            if let Some(entry) = self.tt.probe(key, ply) {
                let v = entry.value as Value;
                let usable = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => v >= beta,
                    Bound::Upper => v <= alpha,
                    Bound::None => false,
                };
                if usable {
                    return v;
                }
            }
        }

        let mut best_value;
        if in_check {
            best_value = Value_::mated_in(ply);
        } else {
            let mut cache = self.stack.at(ply).eval_cache;
            let stand_pat = crate::evaluation::evaluate(&self.pos, &mut cache);
            self.stack.at_mut(ply).eval_cache = cache;
            if stand_pat >= beta {
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
            best_value = stand_pat;

            if tt_miss_mate_probe(self) {
                if let Some(mate_move) = find_mate_in_one(&self.pos) {
                    let v = Value_::mate_in(ply + 1);
                    self.tt.store(key, mate_move, v, v, 0, Bound::Exact, ply);
                    return v;
                }
            }
        }

        let mut list = MoveList::new();
        if in_check {
            self.mg.generate_moves(&self.pos, &mut list, MoveType::Evasions);
        } else {
            self.mg.generate_moves(&self.pos, &mut list, MoveType::Captures);
        }

        let mut any_legal = false;
        for &mv in list.iter() {
            if !self.pos.legal(mv) {
                continue;
            }
            if !in_check && !self.pos.see_ge(mv, 0) {
                continue;
            }
            any_legal = true;
            self.pos.do_move(mv);
            let value = -self.qsearch(-beta, -alpha, ply + 1, self.pos.in_check());
            self.pos.undo_move();

            if self.stop.load(Ordering::Relaxed) {
                return Value_::ZERO;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    alpha = value;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        if in_check && !any_legal {
            return Value_::mated_in(ply);
        }

        best_value
    }

    pub fn search_root(&mut self, sp: &SearchParams, report_tx: &Sender<SearchReport>) -> (Move, Option<Move>) {
        self.limits = Limits::from_params(sp);
        self.start = Instant::now();
        self.tm = match sp.search_mode {
            SearchMode::GameTime | SearchMode::Ponder => Some(TimeManager::new(&sp.game_time, self.pos.us())),
            _ => None,
        };

        let mut root_list = MoveList::new();
        self.mg.generate_moves(&self.pos, &mut root_list, MoveType::Legal);
        let mut root_moves: Vec<Move> = root_list
            .iter()
            .copied()
            .filter(|m| sp.search_moves.is_empty() || sp.search_moves.contains(m))
            .collect();

        if root_moves.is_empty() {
            return (Move::NONE, None);
        }
        if root_moves.len() == 1 {
            return (root_moves[0], None);
        }

        let max_depth = match sp.search_mode {
            SearchMode::Depth => sp.depth,
            _ => MAX_PLY as Depth,
        };

        let mut best_move = root_moves[0];
        let mut best_score = Value_::mated_in(0);
        let mut previous_best = Move::NONE;

        'iter: for depth in 1..=max_depth {
            if self.worker_index != 0 && should_skip_depth(self.worker_index, depth as usize + self.pos.ply()) {
                continue;
            }

            let mut alpha = if depth <= 4 { Value_::mated_in(0) } else { best_score - ASPIRATION_WINDOW };
            let mut beta = if depth <= 4 { Value_::mate_in(0) } else { best_score + ASPIRATION_WINDOW };
            let mut window = ASPIRATION_WINDOW;

            let mut iteration_best_move = best_move;
            let mut iteration_best_score = best_score;

            loop {
                let mut local_best_score = Value_::mated_in(0);
                let mut local_best_move = Move::NONE;

                for (i, &mv) in root_moves.iter().enumerate() {
                    self.stack.at_mut(0).current_move = mv;
                    self.pos.do_move(mv);
                    let gives_check = self.pos.in_check();
                    let value = if i == 0 {
                        -self.search(-beta, -alpha, depth - 1, 1, false, true)
                    } else {
                        let v = -self.search(-alpha - 1, -alpha, depth - 1, 1, true, false);
                        if v > alpha && v < beta {
                            -self.search(-beta, -alpha, depth - 1, 1, false, true)
                        } else {
                            v
                        }
                    };
                    let _ = gives_check;
                    self.pos.undo_move();

                    if self.stop.load(Ordering::Relaxed) || self.time_up() {
                        break 'iter;
                    }

                    if value > local_best_score {
                        local_best_score = value;
                        local_best_move = mv;
                    }
                    if value > alpha {
                        alpha = value;
                    }
                }

                if local_best_score <= iteration_best_score - window && window < Value_::MATE {
                    window *= 2;
                    alpha = local_best_score - window;
                    beta = local_best_score + window;
                    continue;
                }
                if local_best_score >= iteration_best_score + window && window < Value_::MATE {
                    window *= 2;
                    alpha = local_best_score - window;
                    beta = local_best_score + window;
                    continue;
                }

                iteration_best_score = local_best_score;
                iteration_best_move = local_best_move;
                break;
            }

            best_score = iteration_best_score;
            best_move = iteration_best_move;

            if best_move != previous_best {
                if let Some(tm) = &mut self.tm {
                    tm.note_best_move_changed();
                }
                previous_best = best_move;
            }

            // Keep the best root move first so a time-forced stop at the
            // start of the next iteration still returns it.
            if let Some(pos_in_list) = root_moves.iter().position(|&m| m == best_move) {
                root_moves.swap(0, pos_in_list);
            }

            let pv = self.extract_pv(best_move, depth as usize);
            let elapsed = self.start.elapsed().as_millis();
            let nodes = self.nodes;
            let nps = if elapsed > 0 { (nodes as u128 * 1000 / elapsed) as u64 } else { 0 };
            let mate = if Value_::is_mate(best_score) {
                let plies_to_mate = Value_::MATE - best_score.abs();
                Some(if best_score > 0 { (plies_to_mate + 1) / 2 } else { -((plies_to_mate + 1) / 2) })
            } else {
                None
            };
            if !sp.quiet {
                let _ = report_tx.send(SearchReport::Iteration {
                    depth,
                    seldepth: self.seldepth,
                    score_cp: best_score,
                    mate,
                    bound: Option::<ReportBound>::from(Bound::Exact),
                    nodes,
                    nps,
                    time_ms: elapsed,
                    pv,
                });
            }

            if self.time_up() {
                break;
            }
            if let Some(tm) = &self.tm {
                if matches!(sp.search_mode, SearchMode::GameTime) && tm.should_stop_soft() {
                    break;
                }
            }
        }

        let ponder = self.extract_pv(best_move, 2).get(1).copied();
        (best_move, ponder)
    }

    fn extract_pv(&mut self, first: Move, max_len: usize) -> Vec<Move> {
        let mut pv = vec![first];
        if !first.is_ok() || !self.pos.pseudo_legal(first) || !self.pos.legal(first) {
            return pv;
        }
        self.pos.do_move(first);
        let mut depth_left = max_len.saturating_sub(1);
        while depth_left > 0 {
            let key = self.pos.key();
            let next = match self.tt.probe(key, 0) {
                Some(e) if e.mv.is_ok() => e.mv,
                _ => break,
            };
            if !self.pos.pseudo_legal(next) || !self.pos.legal(next) {
                break;
            }
            pv.push(next);
            self.pos.do_move(next);
            depth_left -= 1;
        }
        for _ in 0..pv.len() - 1 {
            self.pos.undo_move();
        }
        self.pos.undo_move();
        pv
    }
}

// Qsearch only attempts the 1-ply mate probe once per node, on TT miss,
// to keep its already-expensive capture-search cost from doubling.
fn tt_miss_mate_probe(worker: &Worker) -> bool {
    worker.tt.probe(worker.pos.key(), 0).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::SFEN_START_POSITION;
    use crate::position::attacks::AttackTables;
    use crate::position::zobrist::ZobristRandoms;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::AtomicU64;

    fn fresh(sfen: &str) -> Position {
        let mut pos = Position::new(Arc::new(AttackTables::new()), Arc::new(ZobristRandoms::new()));
        pos.set_sfen(sfen).unwrap();
        pos
    }

    fn worker(sfen: &str) -> Worker {
        let pos = fresh(sfen);
        let tt = Arc::new(TranspositionTable::new(1));
        let stop = Arc::new(AtomicBool::new(false));
        Worker::new(pos, tt, stop, 0, Arc::new(AtomicU64::new(0)))
    }

    #[test]
    fn depth_one_search_from_the_start_position_returns_a_legal_move() {
        let mut w = worker(SFEN_START_POSITION);
        let (tx, _rx) = unbounded();
        let sp = SearchParams { depth: 1, search_mode: SearchMode::Depth, quiet: true, ..SearchParams::new() };
        let (best, _) = w.search_root(&sp, &tx);
        assert!(best.is_ok());
        assert!(w.nodes >= 30);
    }

    #[test]
    fn mate_in_one_position_is_found_at_shallow_depth() {
        // White king boxed into the corner by its own pawn and a black
        // silver; dropping the gold in hand mates with no escape, capture,
        // or block available (same position as mate1's own unit test).
        let mut w = worker("k1S6/1p7/9/9/9/9/9/9/8K b G 1");
        let (tx, _rx) = unbounded();
        let sp = SearchParams { depth: 4, search_mode: SearchMode::Depth, quiet: true, ..SearchParams::new() };
        let (best, _) = w.search_root(&sp, &tx);
        assert!(best.is_drop());
        assert_eq!(best.piece_type(), crate::position::defs::PieceType::GOLD);
    }

    #[test]
    fn qsearch_on_a_quiet_position_returns_the_static_evaluation() {
        let mut w = worker(SFEN_START_POSITION);
        let v = w.qsearch(Value_::mated_in(0), Value_::mate_in(0), 0, false);
        assert_eq!(v, 0);
    }

    #[test]
    fn single_legal_root_move_is_returned_without_searching() {
        // King boxed in with exactly one legal reply: drop the gold or
        // move the king, whichever ends up the sole legal move here is
        // what search_root must hand back without iterating.
        let mut w = worker("K1k6/1G7/9/9/9/9/9/9/9 b - 1");
        let (tx, _rx) = unbounded();
        let sp = SearchParams { depth: 1, search_mode: SearchMode::Depth, quiet: true, ..SearchParams::new() };
        let (best, _) = w.search_root(&sp, &tx);
        assert!(best.is_ok());
    }
}
