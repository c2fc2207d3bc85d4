use std::collections::VecDeque;
use std::num::NonZeroUsize;

use des::{Agent, AgentId, Response};
use tracing::{trace, warn};

use crate::{Event, Station, Stats};

/// Statistics tracked by a resource pool
#[derive(Debug, Clone, PartialEq)]
pub struct PoolStats {
    pub station: Station,
    pub capacity: usize,

    // Current state
    pub held: usize,
    pub queue_length: usize,

    // High-water marks
    pub peak_held: usize,
    pub peak_queue_length: usize,

    // Cumulative metrics
    pub requests: usize,
    pub grants: usize,
    pub releases: usize,
    /// Minutes spent in the wait-list by every granted requester
    pub total_queue_delay: f64,
}

impl PoolStats {
    fn new(station: Station, capacity: usize) -> Self {
        PoolStats {
            station,
            capacity,
            held: 0,
            queue_length: 0,
            peak_held: 0,
            peak_queue_length: 0,
            requests: 0,
            grants: 0,
            releases: 0,
            total_queue_delay: 0.0,
        }
    }

    pub fn is_at_capacity(&self) -> bool {
        self.held == self.capacity
    }

    pub fn utilization(&self) -> f64 {
        self.held as f64 / self.capacity as f64
    }

    /// Average time a granted requester spent waiting for a unit
    pub fn mean_queue_delay(&self) -> Option<f64> {
        if self.grants == 0 {
            return None;
        }
        Some(self.total_queue_delay / self.grants as f64)
    }
}

/// Bounded pool of identical units (employees at one station).
///
/// Requesters that find every unit held wait in arrival order; a released
/// unit goes straight to the head of the wait-list at the release time.
pub struct ResourcePool {
    capacity: usize,
    held: usize,
    waiting: VecDeque<(AgentId, f64)>,
    stats: PoolStats,
}

impl ResourcePool {
    pub fn new(station: Station, capacity: NonZeroUsize) -> Self {
        ResourcePool {
            capacity: capacity.get(),
            held: 0,
            waiting: VecDeque::new(),
            stats: PoolStats::new(station, capacity.get()),
        }
    }

    pub fn station(&self) -> Station {
        self.stats.station
    }

    /// Request one unit for `customer`.
    ///
    /// Returns the customer back if the unit is granted on the spot, `None`
    /// if it has to wait behind earlier requesters.
    pub fn acquire(&mut self, customer: AgentId, current_t: f64) -> Option<AgentId> {
        self.stats.requests += 1;
        if self.held < self.capacity && self.waiting.is_empty() {
            self.grant(customer, current_t, current_t);
            Some(customer)
        } else {
            self.waiting.push_back((customer, current_t));
            self.stats.queue_length = self.waiting.len();
            self.stats.peak_queue_length = self.stats.peak_queue_length.max(self.waiting.len());
            trace!(station = %self.station(), %customer, queue = self.waiting.len(), "queued");
            None
        }
    }

    /// Return one unit held by `customer`.
    ///
    /// Returns the longest-waiting requester if the freed unit was handed on.
    pub fn release(&mut self, customer: AgentId, current_t: f64) -> Option<AgentId> {
        if self.held == 0 {
            warn!(station = %self.station(), %customer, "release on a pool with no units held");
            return None;
        }
        self.held -= 1;
        self.stats.held = self.held;
        self.stats.releases += 1;
        trace!(station = %self.station(), %customer, t = current_t, "released");

        let (next, requested_at) = self.waiting.pop_front()?;
        self.stats.queue_length = self.waiting.len();
        self.grant(next, requested_at, current_t);
        Some(next)
    }

    fn grant(&mut self, customer: AgentId, requested_at: f64, current_t: f64) {
        self.held += 1;
        debug_assert!(self.held <= self.capacity);
        self.stats.held = self.held;
        self.stats.peak_held = self.stats.peak_held.max(self.held);
        self.stats.grants += 1;
        self.stats.total_queue_delay += current_t - requested_at;
        trace!(station = %self.station(), %customer, t = current_t, "granted");
    }

    fn granted(&self, customer: Option<AgentId>, current_t: f64) -> Response<Event, Stats> {
        match customer {
            Some(customer) => Response::event(
                current_t,
                customer,
                Event::Granted {
                    station: self.station(),
                },
            ),
            None => Response::new(),
        }
    }
}

impl Agent<Event, Stats> for ResourcePool {
    fn act(&mut self, _me: AgentId, current_t: f64, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::Acquire { customer } => {
                let granted = self.acquire(*customer, current_t);
                self.granted(granted, current_t)
            }
            Event::Release { customer } => {
                let granted = self.release(*customer, current_t);
                self.granted(granted, current_t)
            }
            _ => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Pool(self.stats.clone())
    }
}

/// A unit held by a moviegoer.
///
/// Not `Clone`: releasing consumes the lease, so a unit can only be handed
/// back once.
#[must_use = "a lease must be released back to its pool"]
#[derive(Debug, PartialEq)]
pub struct Lease {
    station: Station,
    pool: AgentId,
    granted_at: f64,
}

impl Lease {
    pub fn new(station: Station, pool: AgentId, granted_at: f64) -> Self {
        Lease {
            station,
            pool,
            granted_at,
        }
    }

    pub fn station(&self) -> Station {
        self.station
    }

    pub fn granted_at(&self) -> f64 {
        self.granted_at
    }

    /// The release event that hands the unit back to its pool now
    pub fn release(self, customer: AgentId, current_t: f64) -> (f64, AgentId, Event) {
        (current_t, self.pool, Event::Release { customer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_stats(pool: &ResourcePool) -> PoolStats {
        match pool.stats() {
            Stats::Pool(stats) => stats,
            other => panic!("Expected pool stats, got {:?}", other),
        }
    }

    fn pool(station: Station, capacity: usize) -> ResourcePool {
        ResourcePool::new(station, NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_free_unit_granted_immediately() {
        let mut pool = pool(Station::Cashier, 2);

        let response = pool.act(AgentId(0), 10.0, &Event::Acquire { customer: AgentId(42) });

        assert_eq!(response.events.len(), 1);
        assert_eq!(
            response.events[0],
            (
                10.0,
                AgentId(42),
                Event::Granted {
                    station: Station::Cashier
                }
            )
        );
        let stats = pool_stats(&pool);
        assert_eq!(stats.held, 1);
        assert_eq!(stats.queue_length, 0);
        assert!(!stats.is_at_capacity());
    }

    #[test]
    fn test_full_pool_queues_requester() {
        let mut pool = pool(Station::Cashier, 1);
        pool.act(AgentId(0), 10.0, &Event::Acquire { customer: AgentId(1) });

        let response = pool.act(AgentId(0), 15.0, &Event::Acquire { customer: AgentId(2) });

        assert!(response.events.is_empty());
        let stats = pool_stats(&pool);
        assert!(stats.is_at_capacity());
        assert_eq!(stats.utilization(), 1.0);
        assert_eq!(stats.queue_length, 1);
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.grants, 1);
    }

    #[test]
    fn test_release_grants_longest_waiting() {
        let mut pool = pool(Station::FoodServer, 1);
        pool.act(AgentId(0), 10.0, &Event::Acquire { customer: AgentId(1) });
        pool.act(AgentId(0), 15.0, &Event::Acquire { customer: AgentId(2) });
        pool.act(AgentId(0), 17.0, &Event::Acquire { customer: AgentId(3) });

        let response = pool.act(AgentId(0), 25.0, &Event::Release { customer: AgentId(1) });

        assert_eq!(
            response.events,
            vec![(
                25.0,
                AgentId(2),
                Event::Granted {
                    station: Station::FoodServer
                }
            )]
        );
        let stats = pool_stats(&pool);
        assert_eq!(stats.held, 1);
        assert_eq!(stats.queue_length, 1);
        // customer 2 waited from 15 to 25
        assert_eq!(stats.total_queue_delay, 10.0);

        let response = pool.act(AgentId(0), 30.0, &Event::Release { customer: AgentId(2) });
        assert_eq!(response.events[0].1, AgentId(3));
        let stats = pool_stats(&pool);
        assert_eq!(stats.total_queue_delay, 23.0);
        assert_eq!(stats.grants, 3);
        assert_eq!(stats.mean_queue_delay(), Some(23.0 / 3.0));
    }

    #[test]
    fn test_release_without_waiters_frees_unit() {
        let mut pool = pool(Station::Usher, 1);
        pool.acquire(AgentId(1), 0.0);

        assert_eq!(pool.release(AgentId(1), 1.0), None);

        let stats = pool_stats(&pool);
        assert_eq!(stats.held, 0);
        assert_eq!(stats.releases, 1);
        assert_eq!(pool.acquire(AgentId(2), 2.0), Some(AgentId(2)));
    }

    #[test]
    fn test_release_on_idle_pool_is_ignored() {
        let mut pool = pool(Station::Usher, 1);
        assert_eq!(pool_stats(&pool).mean_queue_delay(), None);

        assert_eq!(pool.release(AgentId(1), 1.0), None);
        assert_eq!(pool_stats(&pool).held, 0);
        assert_eq!(pool_stats(&pool).releases, 0);
    }

    #[test]
    fn test_unrelated_events_ignored() {
        let mut pool = pool(Station::Cashier, 1);

        let response = pool.act(AgentId(0), 1.0, &Event::Arrival);

        assert!(response.events.is_empty());
        assert_eq!(pool_stats(&pool).requests, 0);
    }

    #[test]
    fn test_lease_release_targets_its_pool() {
        let lease = Lease::new(Station::Usher, AgentId(1), 4.0);
        assert_eq!(lease.station(), Station::Usher);
        assert_eq!(lease.granted_at(), 4.0);

        let release = lease.release(AgentId(9), 4.5);
        assert_eq!(
            release,
            (
                4.5,
                AgentId(1),
                Event::Release {
                    customer: AgentId(9)
                }
            )
        );
    }
}
