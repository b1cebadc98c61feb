//! Score and achievement ledger.
//!
//! Cumulative per-player statistics, one-time achievement derivation,
//! and leadership tracking. Unknown player ids are no-ops throughout:
//! a disconnect racing a final score update must not turn into an
//! error.

use protocol::messages::{LeaderInfo, ScoreEntry};
use protocol::{AchievementKind, ItemKind};
use std::collections::{HashMap, HashSet};

/// Per-player cumulative statistics.
#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub id: u32,
    pub name: String,
    pub score: u32,
    pub items_collected: u32,
    pub coins_collected: u32,
    pub gems_collected: u32,
    pub diamonds_collected: u32,
    /// Epoch-millisecond join timestamp.
    pub joined_at: u64,
    /// Insertion order, used as the ranking tie-break.
    join_seq: u64,
    /// Achievements already granted; each fires at most once.
    granted: HashSet<AchievementKind>,
}

impl ScoreRecord {
    fn to_entry(&self) -> ScoreEntry {
        ScoreEntry {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
            items_collected: self.items_collected,
            coins_collected: self.coins_collected,
            gems_collected: self.gems_collected,
            diamonds_collected: self.diamonds_collected,
            joined_at: self.joined_at,
        }
    }
}

/// The ledger: score records plus the current leader.
#[derive(Debug, Default)]
pub struct ScoreLedger {
    records: HashMap<u32, ScoreRecord>,
    leader: Option<u32>,
    next_join_seq: u64,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Create a zeroed record if absent. Idempotent on duplicates.
    pub fn register_player(&mut self, id: u32, name: &str, now: u64) {
        if self.records.contains_key(&id) {
            return;
        }
        let join_seq = self.next_join_seq;
        self.next_join_seq += 1;
        self.records.insert(
            id,
            ScoreRecord {
                id,
                name: name.to_string(),
                score: 0,
                items_collected: 0,
                coins_collected: 0,
                gems_collected: 0,
                diamonds_collected: 0,
                joined_at: now,
                join_seq,
                granted: HashSet::new(),
            },
        );
    }

    /// Apply a pickup: bump score and per-kind counters, recompute
    /// leadership, and return the achievements crossed for the first
    /// time. Unknown ids yield an empty result.
    pub fn apply_pickup(&mut self, id: u32, points: u32, kind: ItemKind) -> Vec<AchievementKind> {
        let Some(record) = self.records.get_mut(&id) else {
            return Vec::new();
        };

        record.score += points;
        record.items_collected += 1;
        match kind {
            ItemKind::Coin => record.coins_collected += 1,
            ItemKind::Gem => record.gems_collected += 1,
            ItemKind::Diamond => record.diamonds_collected += 1,
        }

        let new_achievements = Self::check_achievements(record);
        self.update_leadership();
        new_achievements
    }

    /// Thresholds crossed by the record's current stats that have not
    /// fired yet. Re-crossing a granted threshold yields nothing.
    fn check_achievements(record: &mut ScoreRecord) -> Vec<AchievementKind> {
        let mut earned = Vec::new();

        if record.items_collected == 1 {
            earned.push(AchievementKind::FirstPickup);
        }
        if record.items_collected == 10 {
            earned.push(AchievementKind::Collector);
        }
        if record.score >= 100 {
            earned.push(AchievementKind::Centurion);
        }

        earned.retain(|kind| record.granted.insert(*kind));
        earned
    }

    /// Remove a record. A departing leader unsets leadership, which is
    /// then recomputed from the remaining players.
    pub fn unregister_player(&mut self, id: u32) {
        if self.leader == Some(id) {
            self.leader = None;
        }
        self.records.remove(&id);
        self.update_leadership();
    }

    /// Recompute the leader; returns true when it changed.
    fn update_leadership(&mut self) -> bool {
        let new_leader = self.top_players(1).first().map(|record| record.id);
        if new_leader != self.leader {
            self.leader = new_leader;
            return true;
        }
        false
    }

    /// The current top-scoring player.
    pub fn leader(&self) -> Option<LeaderInfo> {
        let record = self.records.get(&self.leader?)?;
        Some(LeaderInfo {
            id: record.id,
            name: record.name.clone(),
            score: record.score,
        })
    }

    /// Leadership announcements are suppressed with 0 or 1 players.
    pub fn should_announce_leadership(&self) -> bool {
        self.records.len() >= 2
    }

    /// Top-`n` records by descending score; ties rank the earlier
    /// joiner higher so ranking stays deterministic.
    pub fn top_players(&self, n: usize) -> Vec<&ScoreRecord> {
        let mut records: Vec<&ScoreRecord> = self.records.values().collect();
        records.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.join_seq.cmp(&b.join_seq))
        });
        records.truncate(n);
        records
    }

    /// The full score table in ranking order, for transmission.
    pub fn snapshot(&self) -> Vec<ScoreEntry> {
        self.top_players(self.records.len())
            .into_iter()
            .map(ScoreRecord::to_entry)
            .collect()
    }

    /// Top-`n` as wire entries.
    pub fn top_entries(&self, n: usize) -> Vec<ScoreEntry> {
        self.top_players(n)
            .into_iter()
            .map(ScoreRecord::to_entry)
            .collect()
    }

    pub fn get(&self, id: u32) -> Option<&ScoreRecord> {
        self.records.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let mut ledger = ScoreLedger::new();
        ledger.register_player(1, "alice", 100);
        ledger.apply_pickup(1, 10, ItemKind::Coin);
        ledger.register_player(1, "alice again", 200);

        let record = ledger.get(1).unwrap();
        assert_eq!(record.name, "alice");
        assert_eq!(record.score, 10);
    }

    #[test]
    fn unknown_player_pickup_is_a_noop() {
        let mut ledger = ScoreLedger::new();
        assert!(ledger.apply_pickup(99, 10, ItemKind::Coin).is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn first_pickup_fires_exactly_once() {
        let mut ledger = ScoreLedger::new();
        ledger.register_player(1, "alice", 0);

        let first = ledger.apply_pickup(1, 10, ItemKind::Coin);
        assert_eq!(first, vec![AchievementKind::FirstPickup]);

        for _ in 0..5 {
            let later = ledger.apply_pickup(1, 10, ItemKind::Coin);
            assert!(!later.contains(&AchievementKind::FirstPickup));
        }
    }

    #[test]
    fn collector_fires_on_the_tenth_item() {
        let mut ledger = ScoreLedger::new();
        ledger.register_player(1, "alice", 0);

        for i in 1..=9 {
            let earned = ledger.apply_pickup(1, 1, ItemKind::Coin);
            assert!(!earned.contains(&AchievementKind::Collector), "item {i}");
        }
        let tenth = ledger.apply_pickup(1, 1, ItemKind::Coin);
        assert!(tenth.contains(&AchievementKind::Collector));
    }

    #[test]
    fn centurion_fires_when_score_crosses_100() {
        let mut ledger = ScoreLedger::new();
        ledger.register_player(1, "alice", 0);

        ledger.apply_pickup(1, 50, ItemKind::Diamond);
        let crossing = ledger.apply_pickup(1, 50, ItemKind::Diamond);
        assert!(crossing.contains(&AchievementKind::Centurion));

        let after = ledger.apply_pickup(1, 50, ItemKind::Diamond);
        assert!(!after.contains(&AchievementKind::Centurion));
    }

    #[test]
    fn leadership_announcement_needs_two_players() {
        let mut ledger = ScoreLedger::new();
        ledger.register_player(1, "alice", 0);
        ledger.apply_pickup(1, 10, ItemKind::Coin);
        assert!(!ledger.should_announce_leadership());

        ledger.register_player(2, "bob", 1);
        assert!(ledger.should_announce_leadership());
    }

    #[test]
    fn leader_removal_recomputes_from_remaining() {
        let mut ledger = ScoreLedger::new();
        ledger.register_player(1, "alice", 0);
        ledger.register_player(2, "bob", 1);
        ledger.apply_pickup(1, 50, ItemKind::Diamond);
        ledger.apply_pickup(2, 10, ItemKind::Coin);
        assert_eq!(ledger.leader().unwrap().id, 1);

        ledger.unregister_player(1);
        assert_eq!(ledger.leader().unwrap().id, 2);

        ledger.unregister_player(2);
        assert!(ledger.leader().is_none());
    }

    #[test]
    fn ranking_ties_break_by_join_order() {
        let mut ledger = ScoreLedger::new();
        ledger.register_player(1, "first", 0);
        ledger.register_player(2, "second", 1);
        ledger.register_player(3, "third", 2);
        ledger.apply_pickup(2, 25, ItemKind::Gem);
        ledger.apply_pickup(3, 25, ItemKind::Gem);

        let top = ledger.top_players(3);
        let ids: Vec<u32> = top.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn per_kind_counters_track_pickups() {
        let mut ledger = ScoreLedger::new();
        ledger.register_player(1, "alice", 0);
        ledger.apply_pickup(1, 10, ItemKind::Coin);
        ledger.apply_pickup(1, 25, ItemKind::Gem);
        ledger.apply_pickup(1, 25, ItemKind::Gem);
        ledger.apply_pickup(1, 50, ItemKind::Diamond);

        let record = ledger.get(1).unwrap();
        assert_eq!(record.coins_collected, 1);
        assert_eq!(record.gems_collected, 2);
        assert_eq!(record.diamonds_collected, 1);
        assert_eq!(record.items_collected, 4);
        assert_eq!(record.score, 110);
    }
}
