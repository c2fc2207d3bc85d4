use des::{Agent, AgentId, Response};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::resource::Lease;
use crate::samplers::ServiceTimes;
use crate::{Event, Floor, Station, Stats};

/// Where a moviegoer is in its itinerary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Arrived,
    AtCashier,
    TicketCheck,
    Food,
    Seated,
}

impl Stage {
    fn at(station: Station) -> Stage {
        match station {
            Station::Cashier => Stage::AtCashier,
            Station::Usher => Stage::TicketCheck,
            Station::FoodServer => Stage::Food,
        }
    }
}

/// Timeline of one visit to a station
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord {
    pub station: Station,
    pub requested_at: f64,
    pub started_at: Option<f64>,
    /// Sampled service duration
    pub service: Option<f64>,
    pub finished_at: Option<f64>,
}

impl StageRecord {
    /// Time spent waiting for an employee to become free
    pub fn queue_delay(&self) -> Option<f64> {
        self.started_at.map(|started| started - self.requested_at)
    }
}

/// Statistics tracked by a moviegoer
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerStats {
    pub customer_id: usize,
    pub stage: Stage,
    pub arrived_at: Option<f64>,
    pub stages: Vec<StageRecord>,
    /// Decided once the ticket has been checked
    pub wants_food: Option<bool>,
    pub seated_at: Option<f64>,
}

impl CustomerStats {
    fn new(customer_id: usize) -> Self {
        CustomerStats {
            customer_id,
            stage: Stage::Arrived,
            arrived_at: None,
            stages: Vec::new(),
            wants_food: None,
            seated_at: None,
        }
    }

    pub fn is_seated(&self) -> bool {
        self.stage == Stage::Seated
    }

    /// Minutes from arrival to seat, once seated
    pub fn wait(&self) -> Option<f64> {
        Some(self.seated_at? - self.arrived_at?)
    }

    /// Sum of the service durations of every finished stage
    pub fn total_service(&self) -> f64 {
        self.stages
            .iter()
            .filter(|s| s.finished_at.is_some())
            .filter_map(|s| s.service)
            .sum()
    }

    pub fn stage_record(&self, station: Station) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.station == station)
    }
}

/// One moviegoer working through cashier, usher and (maybe) food server.
///
/// Every visit is the same: ask the pool for a unit, hold the lease for a
/// sampled service time, hand the lease back. Once seated, the total time
/// since arrival goes to the wait-time recorder.
pub struct Customer {
    floor: Floor,
    service_times: ServiceTimes,
    rng: StdRng,
    lease: Option<Lease>,
    stats: CustomerStats,
}

impl Customer {
    pub fn new(customer_id: usize, floor: Floor, service_times: ServiceTimes, seed: u64) -> Self {
        Customer {
            floor,
            service_times,
            rng: StdRng::seed_from_u64(seed),
            lease: None,
            stats: CustomerStats::new(customer_id),
        }
    }

    fn request(
        &mut self,
        me: AgentId,
        current_t: f64,
        station: Station,
        response: &mut Response<Event, Stats>,
    ) {
        self.stats.stage = Stage::at(station);
        self.stats.stages.push(StageRecord {
            station,
            requested_at: current_t,
            started_at: None,
            service: None,
            finished_at: None,
        });
        response.schedule(
            current_t,
            self.floor.pool(station),
            Event::Acquire { customer: me },
        );
    }

    fn begin_service(&mut self, me: AgentId, current_t: f64, station: Station) -> Response<Event, Stats> {
        if self.lease.is_some() || self.stats.stage != Stage::at(station) {
            warn!(customer = self.stats.customer_id, %station, "unexpected grant ignored");
            return Response::new();
        }
        let duration = self.service_times.sample(station, &mut self.rng);
        self.lease = Some(Lease::new(station, self.floor.pool(station), current_t));
        if let Some(record) = self.stats.stages.last_mut() {
            record.started_at = Some(current_t);
            record.service = Some(duration);
        }
        Response::event(current_t + duration, me, Event::ServiceDone { station })
    }

    fn finish_service(&mut self, me: AgentId, current_t: f64, station: Station) -> Response<Event, Stats> {
        let lease = match self.lease.take() {
            Some(lease) if lease.station() == station => lease,
            other => {
                warn!(customer = self.stats.customer_id, %station, "service ended without a matching lease");
                self.lease = other;
                return Response::new();
            }
        };
        if let Some(record) = self.stats.stages.last_mut() {
            record.finished_at = Some(current_t);
        }
        debug!(
            customer = self.stats.customer_id,
            %station,
            held = current_t - lease.granted_at(),
            "service done"
        );

        let mut response = Response::events(vec![lease.release(me, current_t)]);
        match station {
            Station::Cashier => self.request(me, current_t, Station::Usher, &mut response),
            Station::Usher => {
                let wants_food = self.rng.random_bool(0.5);
                self.stats.wants_food = Some(wants_food);
                if wants_food {
                    self.request(me, current_t, Station::FoodServer, &mut response);
                } else {
                    self.take_seat(current_t, &mut response);
                }
            }
            Station::FoodServer => self.take_seat(current_t, &mut response),
        }
        response
    }

    fn take_seat(&mut self, current_t: f64, response: &mut Response<Event, Stats>) {
        self.stats.stage = Stage::Seated;
        self.stats.seated_at = Some(current_t);
        let wait = current_t - self.stats.arrived_at.unwrap_or(current_t);
        debug!(customer = self.stats.customer_id, t = current_t, wait, "seated");
        response.schedule(
            current_t,
            self.floor.recorder,
            Event::Seated {
                customer_id: self.stats.customer_id,
                wait,
            },
        );
    }
}

impl Agent<Event, Stats> for Customer {
    fn act(&mut self, me: AgentId, current_t: f64, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::Arrived => {
                if self.stats.arrived_at.is_some() {
                    return Response::new();
                }
                self.stats.arrived_at = Some(current_t);
                let mut response = Response::new();
                self.request(me, current_t, Station::Cashier, &mut response);
                response
            }
            Event::Granted { station } => self.begin_service(me, current_t, *station),
            Event::ServiceDone { station } => self.finish_service(me, current_t, *station),
            _ => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Customer(self.stats.clone())
    }
}
