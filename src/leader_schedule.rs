//! One contiguous window of the cluster leader schedule.

use crate::{pubkey::Pubkey, Slot};

/// Number of leaders fetched per `getSlotLeaders` request.
pub const SLOT_LEADERS_LIMIT: usize = 32;

/// Slot-to-leader cache covering `[first_slot, last_slot]`. Lookups
/// outside the window yield none; a refill replaces the whole window.
#[derive(Debug, Default)]
pub struct LeaderSchedule {
    first_slot: Slot,
    slot_leaders: Vec<Pubkey>,
}

impl LeaderSchedule {
    /// False until the first `getSlotLeaders` response lands.
    pub fn has_response(&self) -> bool {
        !self.slot_leaders.is_empty()
    }

    pub fn last_slot(&self) -> Slot {
        self.first_slot + self.slot_leaders.len().saturating_sub(1) as Slot
    }

    pub fn set_window(&mut self, first_slot: Slot, slot_leaders: Vec<Pubkey>) {
        self.first_slot = first_slot;
        self.slot_leaders = slot_leaders;
    }

    pub fn leader_of(&self, slot: Slot) -> Option<&Pubkey> {
        let index = slot.checked_sub(self.first_slot)?;
        self.slot_leaders.get(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_lookup() {
        let mut schedule = LeaderSchedule::default();
        assert!(!schedule.has_response());
        assert_eq!(schedule.leader_of(0), None);

        let k1 = Pubkey::new_from_array([1; 32]);
        let k2 = Pubkey::new_from_array([2; 32]);
        schedule.set_window(64, vec![k1, k2]);

        assert!(schedule.has_response());
        assert_eq!(schedule.last_slot(), 65);
        assert_eq!(schedule.leader_of(63), None);
        assert_eq!(schedule.leader_of(64), Some(&k1));
        assert_eq!(schedule.leader_of(65), Some(&k2));
        assert_eq!(schedule.leader_of(66), None);
    }

    #[test]
    fn test_refill_replaces_window() {
        let mut schedule = LeaderSchedule::default();
        let k1 = Pubkey::new_from_array([1; 32]);
        let k2 = Pubkey::new_from_array([2; 32]);
        schedule.set_window(10, vec![k1; 32]);
        schedule.set_window(40, vec![k2; 32]);

        assert_eq!(schedule.leader_of(10), None);
        assert_eq!(schedule.leader_of(40), Some(&k2));
        assert_eq!(schedule.last_slot(), 71);
    }
}
