//! Where a note sits on the board.
//!
//! A hash of the wish id picks the slot a note would like. Notes are placed
//! oldest first and a note whose slot is taken moves on to the next free one,
//! so a note keeps its place across reloads and doesn't shift when newer
//! wishes arrive. Once every slot is used the board starts stacking again
//! from an empty table.

use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Desktop,
    Mobile,
}

impl Layout {
    /// Narrow viewports get the mobile table.
    pub fn for_width(width_px: u32) -> Self {
        if width_px < 768 { Layout::Mobile } else { Layout::Desktop }
    }

    pub fn slots(self) -> &'static [Position] {
        match self {
            Layout::Desktop => &DESKTOP_SLOTS,
            Layout::Mobile => &MOBILE_SLOTS,
        }
    }
}

/// Offset of the note's top-left corner, in percent of the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub top_pct: f32,
    pub left_pct: f32,
}

const fn pos(top_pct: f32, left_pct: f32) -> Position {
    Position { top_pct, left_pct }
}

const DESKTOP_SLOTS: [Position; 16] = [
    pos(8.0, 12.0),
    pos(5.0, 35.0),
    pos(10.0, 58.0),
    pos(25.0, 8.0),
    pos(22.0, 28.0),
    pos(28.0, 48.0),
    pos(20.0, 72.0),
    pos(45.0, 15.0),
    pos(42.0, 38.0),
    pos(48.0, 62.0),
    pos(65.0, 10.0),
    pos(68.0, 32.0),
    pos(62.0, 52.0),
    pos(70.0, 75.0),
    pos(85.0, 20.0),
    pos(82.0, 45.0),
];

// Two columns, staggered
const MOBILE_SLOTS: [Position; 10] = [
    pos(4.0, 6.0),
    pos(8.0, 52.0),
    pos(22.0, 10.0),
    pos(26.0, 55.0),
    pos(40.0, 5.0),
    pos(44.0, 50.0),
    pos(58.0, 12.0),
    pos(62.0, 54.0),
    pos(76.0, 8.0),
    pos(80.0, 52.0),
];

fn preferred_slot(wish_id: &Uuid, len: usize) -> usize {
    let digest = Sha256::digest(wish_id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) % len as u64) as usize
}

/// Positions for `ids`, which must be ordered oldest first. The result is in
/// the same order.
pub fn place_all<'a>(ids: impl IntoIterator<Item = &'a Uuid>, layout: Layout) -> Vec<Position> {
    let slots = layout.slots();
    let mut taken = vec![false; slots.len()];
    let mut free = slots.len();

    ids.into_iter()
        .map(|id| {
            if free == 0 {
                taken.fill(false);
                free = slots.len();
            }
            let mut idx = preferred_slot(id, slots.len());
            while taken[idx] {
                idx = (idx + 1) % slots.len();
            }
            taken[idx] = true;
            free -= 1;
            slots[idx]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn key(p: Position) -> (u32, u32) {
        (p.top_pct as u32, p.left_pct as u32)
    }

    #[test]
    fn same_ids_same_slots() {
        let ids: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
        assert_eq!(place_all(&ids, Layout::Desktop), place_all(&ids, Layout::Desktop));
        assert_eq!(place_all(&ids, Layout::Mobile), place_all(&ids, Layout::Mobile));
    }

    #[test]
    fn slot_comes_from_layout_table() {
        let ids: Vec<Uuid> = (0..50).map(|_| Uuid::new_v4()).collect();
        assert!(place_all(&ids, Layout::Desktop).iter().all(|p| DESKTOP_SLOTS.contains(p)));
        assert!(place_all(&ids, Layout::Mobile).iter().all(|p| MOBILE_SLOTS.contains(p)));
    }

    #[test]
    fn full_board_uses_every_slot_once() {
        let ids: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();
        let used: HashSet<_> = place_all(&ids, Layout::Desktop).into_iter().map(key).collect();
        assert_eq!(used.len(), 16);

        let used: HashSet<_> = place_all(&ids[..10], Layout::Mobile).into_iter().map(key).collect();
        assert_eq!(used.len(), 10);
    }

    #[test]
    fn sequential_ids_do_not_overlap() {
        let ids: Vec<Uuid> = (1..=5u128).map(Uuid::from_u128).collect();
        let used: HashSet<_> = place_all(&ids, Layout::Desktop).into_iter().map(key).collect();
        assert_eq!(used.len(), 5);
    }

    #[test]
    fn newer_note_does_not_move_older_ones() {
        let mut ids: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();
        let before = place_all(&ids, Layout::Desktop);
        ids.push(Uuid::new_v4());
        let after = place_all(&ids, Layout::Desktop);
        assert_eq!(&after[..7], &before[..]);
        assert!(!before.contains(&after[7]));
    }

    #[test]
    fn seventeenth_note_starts_a_new_layer() {
        let ids: Vec<Uuid> = (0..17).map(|_| Uuid::new_v4()).collect();
        let placed = place_all(&ids, Layout::Desktop);
        assert_eq!(placed[16], DESKTOP_SLOTS[preferred_slot(&ids[16], 16)]);
    }

    #[test]
    fn width_picks_layout() {
        assert_eq!(Layout::for_width(390), Layout::Mobile);
        assert_eq!(Layout::for_width(1280), Layout::Desktop);
    }
}
