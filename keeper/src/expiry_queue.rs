//! Priority queue for pool tick deadlines (min-heap by next crossing time)

use priority_queue::PriorityQueue;
use solana_sdk::pubkey::Pubkey;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Pool deadline snapshot
#[derive(Debug, Clone)]
pub struct PoolDeadline {
    /// Pool account
    pub pool: Pubkey,
    /// Pool id from the registry directory
    pub pool_id: u64,
    /// Estimated unix time of the next tick boundary
    pub next_crossing: i64,
    /// Active covers still parked in the pool
    pub remaining_covers: u64,
    /// Pool clock's last refresh time
    pub last_update: u64,
}

impl PoolDeadline {
    /// Check if the pool's next boundary has passed
    pub fn is_due(&self, now: i64, grace_secs: i64) -> bool {
        self.next_crossing.saturating_add(grace_secs) <= now
    }
}

/// Deadline-based priority queue (min-heap: earliest crossing first)
pub struct ExpiryQueue {
    /// Priority queue (using Reverse for min-heap)
    queue: PriorityQueue<Pubkey, Reverse<i64>>,
    /// Map for O(1) lookups
    map: HashMap<Pubkey, PoolDeadline>,
}

impl ExpiryQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            map: HashMap::new(),
        }
    }

    /// Push or reschedule a pool deadline
    pub fn push(&mut self, deadline: PoolDeadline) {
        let pool = deadline.pool;
        let at = deadline.next_crossing;

        // Update map
        self.map.insert(pool, deadline);

        // Update priority queue (using Reverse for min-heap)
        self.queue.push(pool, Reverse(at));
    }

    /// Pop the pool with the earliest crossing
    pub fn pop(&mut self) -> Option<PoolDeadline> {
        let (pool, _priority) = self.queue.pop()?;
        self.map.remove(&pool)
    }

    /// Peek at the earliest crossing without removing
    pub fn peek(&self) -> Option<&PoolDeadline> {
        let (pool, _priority) = self.queue.peek()?;
        self.map.get(pool)
    }

    /// Remove a pool from the queue
    pub fn remove(&mut self, pool: &Pubkey) -> Option<PoolDeadline> {
        self.queue.remove(pool);
        self.map.remove(pool)
    }

    /// Get a pool deadline by account
    pub fn get(&self, pool: &Pubkey) -> Option<&PoolDeadline> {
        self.map.get(pool)
    }

    /// Check if queue tracks a pool
    pub fn contains(&self, pool: &Pubkey) -> bool {
        self.map.contains_key(pool)
    }

    /// Get number of tracked pools
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Get all pools whose next boundary has passed
    pub fn get_due(&self, now: i64, grace_secs: i64) -> Vec<PoolDeadline> {
        self.map
            .values()
            .filter(|d| d.is_due(now, grace_secs))
            .cloned()
            .collect()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.queue.clear();
        self.map.clear();
    }
}

impl Default for ExpiryQueue {
    fn default() -> Self {
        Self::new()
    }
}
