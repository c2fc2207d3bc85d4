use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use tracing::{trace, warn};

pub mod parallel;

/// Handle of a registered agent: its index in the event loop's registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub usize);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pending wake-up in the future event set.
///
/// Ordered earliest-first; equal times fall back to insertion order so that
/// a seeded run always replays in the same sequence.
struct Event<T> {
    t: f64,
    seq: u64,
    target: AgentId,
    data: T,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Event<T> {}

impl<T> Ord for Event<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Scheduling actions an agent performs while it is resumed
pub struct Response<T, S> {
    /// Addressed events: (time, recipient, payload)
    pub events: Vec<(f64, AgentId, T)>,
    /// New agents, each with the payload it is first woken with
    pub agents: Vec<(Box<dyn Agent<T, S>>, T)>,
}

impl<T, S> Default for Response<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Response<T, S> {
    pub fn new() -> Response<T, S> {
        Response {
            events: Vec::new(),
            agents: Vec::new(),
        }
    }

    pub fn event(t: f64, target: AgentId, data: T) -> Response<T, S> {
        Response {
            events: vec![(t, target, data)],
            agents: Vec::new(),
        }
    }

    pub fn events(events: Vec<(f64, AgentId, T)>) -> Response<T, S> {
        Response {
            events,
            agents: Vec::new(),
        }
    }

    pub fn schedule(&mut self, t: f64, target: AgentId, data: T) {
        self.events.push((t, target, data));
    }

    /// Register a new agent; it is woken with `data` at the current time
    pub fn spawn(&mut self, agent: Box<dyn Agent<T, S>>, data: T) {
        self.agents.push((agent, data));
    }
}

pub trait Agent<T, S> {
    /// Resume this agent with an event addressed to it.
    ///
    /// `me` is the agent's own handle, so it can hand it to others or
    /// schedule its own wake-ups.
    fn act(&mut self, _me: AgentId, _current_t: f64, _data: &T) -> Response<T, S> {
        Response::new()
    }

    fn stats(&self) -> S;
}

/// Single-threaded cooperative scheduler.
///
/// Owns the clock, the future event set and every registered agent. Each
/// event wakes exactly the agent it is addressed to.
pub struct EventLoop<T, S> {
    queue: BinaryHeap<Event<T>>,
    current_t: f64,
    next_seq: u64,
    delivered: usize,
    agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> EventLoop<T, S> {
    pub fn new(
        events: Vec<(f64, AgentId, T)>,
        agents: Vec<Box<dyn Agent<T, S>>>,
    ) -> EventLoop<T, S> {
        let mut event_loop = EventLoop {
            queue: BinaryHeap::with_capacity(events.len()),
            current_t: 0.0,
            next_seq: 0,
            delivered: 0,
            agents,
        };
        for (t, target, data) in events {
            event_loop.schedule(t, target, data);
        }
        event_loop
    }

    pub fn current_t(&self) -> f64 {
        self.current_t
    }

    /// Number of events not yet delivered
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of events delivered so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Insert an event into the future event set.
    ///
    /// The clock never runs backwards: a time before the current time (or NaN)
    /// is moved up to the current time.
    pub fn schedule(&mut self, t: f64, target: AgentId, data: T) {
        let t = if t >= self.current_t {
            t
        } else {
            warn!(
                requested = t,
                current = self.current_t,
                agent = %target,
                "event scheduled in the past, clamping to current time"
            );
            self.current_t
        };
        self.queue.push(Event {
            t,
            seq: self.next_seq,
            target,
            data,
        });
        self.next_seq += 1;
    }

    /// Register an agent and wake it with `data` at the current time
    pub fn spawn(&mut self, agent: Box<dyn Agent<T, S>>, data: T) -> AgentId {
        let id = AgentId(self.agents.len());
        self.agents.push(agent);
        self.schedule(self.current_t, id, data);
        id
    }

    fn step(&mut self) {
        let Some(event) = self.queue.pop() else {
            return;
        };
        self.current_t = event.t;

        let Some(agent) = self.agents.get_mut(event.target.0) else {
            warn!(agent = %event.target, t = event.t, "event addressed to unknown agent dropped");
            return;
        };
        trace!(t = event.t, seq = event.seq, agent = %event.target, "deliver");
        let response = agent.act(event.target, self.current_t, &event.data);
        self.delivered += 1;

        for (t, target, data) in response.events {
            self.schedule(t, target, data);
        }
        for (agent, data) in response.agents {
            self.spawn(agent, data);
        }
    }

    /// Deliver every event due at or before `until`.
    ///
    /// Events scheduled past `until` stay queued and are never delivered by
    /// this call; agents waiting on them are simply left where they are.
    pub fn run(&mut self, until: f64) {
        while let Some(event) = self.queue.peek() {
            if event.t > until {
                break;
            }
            self.step();
        }
    }

    pub fn stats(&self) -> Vec<S> {
        self.agents.iter().map(|agent| agent.stats()).collect()
    }

    /// Stats of a single agent, `None` if no agent has that handle
    pub fn agent_stats(&self, id: AgentId) -> Option<S> {
        self.agents.get(id.0).map(|agent| agent.stats())
    }
}
