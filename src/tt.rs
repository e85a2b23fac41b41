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

// Clustered transposition table, four slots per cluster, each slot packed
// into two atomics (see tt::entry) so every worker in the Lazy SMP pool
// can probe and store through a plain shared reference. No lock: a probe
// racing a store on the same slot can observe a torn entry, but a torn
// entry fails the key check on the next probe and is simply treated as a
// miss, which is the standard tradeoff a lock-free table makes.

pub mod entry;

use crate::defs::{Ply, Value, Value_};
use crate::position::defs::Move;
use entry::{Bound, Entry, Slot};
use std::sync::atomic::{AtomicU8, Ordering};

pub use entry::GENERATION_BITS;

// The table stores value/eval narrowed to i16: `Value` is i32 at the search
// API boundary, but Value_::MATE (30000) plus the largest possible ply shift
// comfortably fits i16, the same tradeoff Stockfish-derived engines make
// between search's wider working type and the table's packed storage.
fn narrow(v: Value) -> i16 {
    v.clamp(i16::MIN as Value, i16::MAX as Value) as i16
}

// Mate scores are stored as "mate in N from this node", but a TT hit can
// be reused from a different node at a different ply, where "from the
// root" is what matters. Shifting by `ply` on the way in and out keeps
// the stored number meaningful regardless of where it's probed from.
fn value_to_tt(v: Value, ply: Ply) -> i16 {
    let shifted = if v >= Value_::MATE_IN_MAX_PLY {
        v + ply as Value
    } else if v <= Value_::MATED_IN_MAX_PLY {
        v - ply as Value
    } else {
        v
    };
    narrow(shifted)
}

fn value_from_tt(v: i16, ply: Ply) -> Value {
    let v = v as Value;
    if v >= Value_::MATE_IN_MAX_PLY {
        v - ply as Value
    } else if v <= Value_::MATED_IN_MAX_PLY {
        v + ply as Value
    } else {
        v
    }
}

const CLUSTER_SIZE: usize = 4;

struct Cluster {
    slots: [Slot; CLUSTER_SIZE],
}

impl Cluster {
    fn new() -> Self {
        Cluster {
            slots: [Slot::new(), Slot::new(), Slot::new(), Slot::new()],
        }
    }
}

pub struct TranspositionTable {
    clusters: Vec<Cluster>,
    mask: usize,
    generation: AtomicU8,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        let cluster_bytes = std::mem::size_of::<Cluster>();
        let wanted = (size_mb.max(1) * 1024 * 1024) / cluster_bytes.max(1);
        let mut count = 1usize;
        while count * 2 <= wanted.max(1) {
            count *= 2;
        }

        let mut clusters = Vec::with_capacity(count);
        clusters.resize_with(count, Cluster::new);

        TranspositionTable {
            clusters,
            mask: count - 1,
            generation: AtomicU8::new(0),
        }
    }

    pub fn clear(&self) {
        for c in &self.clusters {
            for s in &c.slots {
                s.clear();
            }
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    pub fn new_search(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hash_full_per_mille(&self) -> u32 {
        // A fixed sample (1000 clusters, or fewer if the table is tiny)
        // is enough to estimate fullness without walking the whole table
        // on every `info` line.
        let sample = self.clusters.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let current = self.generation.load(Ordering::Relaxed);
        let mut filled = 0u32;
        for c in &self.clusters[..sample] {
            for s in &c.slots {
                let e = s.load();
                if !e.is_empty() && e.generation == current {
                    filled += 1;
                }
            }
        }
        filled * 1000 / (sample as u32 * CLUSTER_SIZE as u32)
    }

    fn cluster_index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    fn key_hash(key: u64) -> u32 {
        (key >> 32) as u32
    }

    // Returns the stored entry (narrowed to i16, see entry::Entry) if
    // `key`'s high half matches a slot in its cluster, with the mate score
    // already re-based from `ply`; widen `hit.value`/`hit.eval` back to
    // `Value` with `as Value` at the call site.
    pub fn probe(&self, key: u64, ply: Ply) -> Option<Entry> {
        let cluster = &self.clusters[self.cluster_index(key)];
        let key32 = Self::key_hash(key);
        for slot in &cluster.slots {
            let e = slot.load();
            if e.key32 == key32 && !e.is_empty() {
                let mut hit = e;
                hit.value = narrow(value_from_tt(hit.value, ply));
                return Some(hit);
            }
        }
        None
    }

    pub fn store(&self, key: u64, mv: Move, value: Value, eval: Value, depth: crate::defs::Depth, bound: Bound, ply: Ply) {
        let cluster = &self.clusters[self.cluster_index(key)];
        let key32 = Self::key_hash(key);
        let current_generation = self.generation.load(Ordering::Relaxed);

        let mut victim = &cluster.slots[0];
        let mut victim_entry = victim.load();
        let mut found = victim_entry.key32 == key32 && !victim_entry.is_empty();

        if !found {
            for slot in &cluster.slots[1..] {
                let e = slot.load();
                if e.key32 == key32 && !e.is_empty() {
                    victim = slot;
                    victim_entry = e;
                    found = true;
                    break;
                }
                if e.worse_to_keep_than(victim_entry, current_generation) {
                    victim = slot;
                    victim_entry = e;
                }
            }
        }

        let keep_move = if mv == Move::NONE && found { victim_entry.mv } else { mv };
        let should_overwrite_rest =
            !found || key32 != victim_entry.key32 || depth as i32 >= victim_entry.depth as i32 - 3 || bound == Bound::Exact;

        let new_entry = if should_overwrite_rest {
            Entry {
                key32,
                mv: keep_move,
                value: value_to_tt(value, ply),
                eval: narrow(eval),
                depth,
                bound,
                generation: current_generation & ((1 << GENERATION_BITS) - 1),
            }
        } else {
            Entry {
                mv: keep_move,
                generation: current_generation & ((1 << GENERATION_BITS) - 1),
                ..victim_entry
            }
        };

        victim.store(&new_entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::defs::PieceType;

    #[test]
    fn probe_after_store_finds_the_same_key() {
        let tt = TranspositionTable::new(1);
        let mv = Move::new_drop(12, PieceType::GOLD);
        tt.store(0x1234_5678_9abc_def0, mv, 150, 140, 6, Bound::Exact, 0);
        let hit = tt.probe(0x1234_5678_9abc_def0, 0).expect("should hit");
        assert_eq!(hit.value, 150);
        assert_eq!(hit.depth, 6);
        assert_eq!(hit.bound, Bound::Exact);
    }

    #[test]
    fn probe_misses_on_a_different_key_in_the_same_cluster() {
        let tt = TranspositionTable::new(1);
        let mv = Move::new_drop(12, PieceType::GOLD);
        tt.store(0x0000_0000_0000_0001, mv, 1, 1, 1, Bound::Exact, 0);
        assert!(tt.probe(0x0000_0001_0000_0001, 0).is_none());
    }

    #[test]
    fn mate_score_is_rebased_by_ply_across_a_store_and_probe_at_different_plies() {
        let tt = TranspositionTable::new(1);
        let mv = Move::NONE;
        // A mate found 3 plies below the node where it's stored, rooted at
        // ply 5. Narrowing to i16 loses nothing here since Value_::MATE
        // plus the ply shift still fits comfortably.
        let mate_in_three_from_here = Value_::MATE - 3;
        tt.store(42, mv, mate_in_three_from_here, 0, 10, Bound::Exact, 5);
        let hit = tt.probe(42, 5).unwrap();
        assert_eq!(hit.value as Value, mate_in_three_from_here);
    }

    #[test]
    fn new_search_advances_the_generation_so_stale_entries_lose_replacement_priority() {
        let tt = TranspositionTable::new(1);
        assert_eq!(tt.generation.load(Ordering::Relaxed), 0);
        tt.new_search();
        assert_eq!(tt.generation.load(Ordering::Relaxed), 1);
    }
}
