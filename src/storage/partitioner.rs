use crate::membership::types::Node;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const DEFAULT_PARTITIONS: u32 = 256;

/// Maps keys to partitions and partitions to their owning server.
pub struct PartitionManager {
    pub(crate) num_partitions: u32,
}

impl PartitionManager {
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    pub fn with_partitions(num_partitions: u32) -> Self {
        Self {
            num_partitions: num_partitions.max(1),
        }
    }

    pub fn get_partition(&self, key: i64) -> u32 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish() as u32;
        hash % self.num_partitions
    }

    /// Picks the owner of `partition` among `servers`, ordered by id so that every client
    /// with the same member list makes the same choice.
    pub fn get_owner(&self, partition: u32, servers: &[Node]) -> Option<Node> {
        let mut candidates: Vec<&Node> = servers
            .iter()
            .filter(|node| node.is_server() && node.addr.is_some())
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        let idx = (partition as usize) % candidates.len();
        Some(candidates[idx].clone())
    }

    pub fn owner_of(&self, key: i64, servers: &[Node]) -> Option<Node> {
        self.get_owner(self.get_partition(key), servers)
    }
}

impl Default for PartitionManager {
    fn default() -> Self {
        Self::new()
    }
}
