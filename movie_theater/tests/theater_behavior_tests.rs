// Given-When-Then tests of whole simulation runs

use approx::assert_relative_eq;
use movie_theater::customer::Stage;
use movie_theater::{ArrivalPolicy, RunReport, Simulation, Staffing, Station, TheaterError};

const SEED: u64 = 42;
const HORIZON: f64 = 50.0;

fn run(cashiers: usize, ushers: usize, food_servers: usize) -> RunReport {
    Simulation::new(Staffing::new(cashiers, ushers, food_servers).unwrap(), SEED)
        .unwrap()
        .run_detailed(HORIZON)
        .unwrap()
}

#[test]
fn given_one_employee_per_station_when_run_then_some_moviegoers_are_seated() {
    // GIVEN: the smallest possible staff
    let sim = Simulation::new(Staffing::new(1, 1, 1).unwrap(), SEED).unwrap();

    // WHEN: fifty minutes are simulated
    let log = sim.run(HORIZON).unwrap();

    // THEN: somebody got a seat, after a positive wait
    assert!(!log.is_empty());
    let mean = log.mean().unwrap();
    assert!(mean.is_finite() && mean > 0.0, "mean wait {mean}");
    assert!(log.samples().iter().all(|w| *w > 0.0 && *w <= HORIZON));
}

#[test]
fn given_an_unstaffed_station_when_creating_simulation_then_rejected() {
    let staffing = Staffing {
        cashiers: 0,
        ushers: 1,
        food_servers: 1,
    };

    let result = Simulation::new(staffing, SEED);

    assert!(matches!(
        result,
        Err(TheaterError::ZeroCapacity {
            station: Station::Cashier
        })
    ));
}

#[test]
fn given_same_seed_when_run_twice_then_identical_wait_times() {
    let sim = Simulation::new(Staffing::new(3, 2, 2).unwrap(), 7).unwrap();

    let first = sim.run(HORIZON).unwrap();
    let second = sim.run(HORIZON).unwrap();

    assert_eq!(first, second);
}

#[test]
fn given_different_seeds_when_run_then_wait_times_differ() {
    let staffing = Staffing::new(2, 2, 2).unwrap();

    let a = Simulation::new(staffing, 1).unwrap().run(HORIZON).unwrap();
    let b = Simulation::new(staffing, 2).unwrap().run(HORIZON).unwrap();

    assert_ne!(a, b);
}

#[test]
fn given_seated_moviegoers_then_wait_is_service_plus_queueing() {
    // GIVEN: a staff small enough that moviegoers queue at every station
    let report = run(2, 1, 1);
    assert!(report.seated().count() > 0);

    for customer in report.seated() {
        // WHEN: adding up what happened at each station
        let queueing: f64 = customer.stages.iter().filter_map(|s| s.queue_delay()).sum();
        let wait = customer.wait().unwrap();

        // THEN: the wait is exactly time served plus time spent in line
        assert!(wait + 1e-9 >= customer.total_service());
        assert_relative_eq!(wait, customer.total_service() + queueing, epsilon = 1e-9);
    }

    // THEN: somebody actually had to queue
    assert!(report.pools.iter().any(|p| p.total_queue_delay > 0.0));
}

#[test]
fn given_seated_moviegoers_then_itinerary_is_complete() {
    let report = run(3, 3, 3);

    for customer in report.seated() {
        let stations: Vec<Station> = customer.stages.iter().map(|s| s.station).collect();
        let expected = if customer.wants_food == Some(true) {
            vec![Station::Cashier, Station::Usher, Station::FoodServer]
        } else {
            vec![Station::Cashier, Station::Usher]
        };
        assert_eq!(stations, expected, "customer {}", customer.customer_id);
        assert!(customer.stages.iter().all(|s| s.finished_at.is_some()));
    }
}

#[test]
fn given_one_cashier_when_queue_builds_then_tickets_are_sold_in_arrival_order() {
    // GIVEN: a single cashier and moviegoers arriving faster than a ticket sale
    let report = run(1, 5, 5);

    // WHEN: looking at the cashier visits in arrival order
    let visits: Vec<_> = report
        .customers
        .iter()
        .filter_map(|c| c.stage_record(Station::Cashier))
        .collect();
    assert!(visits.len() > 2);

    // THEN: nobody starts before the previous sale is over
    for pair in visits.windows(2) {
        let (before, after) = (pair[0], pair[1]);
        let Some(started) = after.started_at else {
            continue;
        };
        let finished = before.finished_at.unwrap();
        assert!(started >= finished, "started {started} before {finished}");
    }

    // THEN: whoever is still waiting arrived after everyone served
    let first_waiting = visits.iter().position(|v| v.started_at.is_none());
    if let Some(first_waiting) = first_waiting {
        assert!(visits[first_waiting..].iter().all(|v| v.started_at.is_none()));
    }

    let cashier = report.pool(Station::Cashier).unwrap();
    assert!(cashier.peak_queue_length > 0);

    // THEN: the pool's average delay agrees with what moviegoers experienced
    let delays: Vec<f64> = visits.iter().filter_map(|v| v.queue_delay()).collect();
    assert_eq!(cashier.grants, delays.len());
    assert_relative_eq!(
        cashier.mean_queue_delay().unwrap(),
        delays.iter().sum::<f64>() / delays.len() as f64,
        epsilon = 1e-9
    );
}

#[test]
fn given_any_staffing_then_no_pool_exceeds_its_capacity() {
    for staffing in Staffing::within_budget(6) {
        let report = Simulation::new(staffing, SEED)
            .unwrap()
            .run_detailed(HORIZON)
            .unwrap();

        for pool in &report.pools {
            assert!(pool.peak_held <= pool.capacity, "{staffing}: {pool:?}");
            assert!(pool.held <= pool.capacity);
            assert_eq!(pool.grants, pool.requests - pool.queue_length);
        }
    }
}

#[test]
fn given_horizon_cut_then_only_seated_moviegoers_are_logged() {
    // GIVEN: a staff far too small for the crowd, so many are stuck in line
    let report = run(1, 1, 1);

    // THEN: one sample per seated moviegoer and none for the rest
    let seated = report.seated().count();
    assert_eq!(report.wait_times.len(), seated);
    assert!(report.customers.len() > seated);
    assert!(report.customers.iter().any(|c| c.stage != Stage::Seated));

    let mut logged = report.wait_times.samples().to_vec();
    let mut waits: Vec<f64> = report.seated().filter_map(|c| c.wait()).collect();
    logged.sort_by(f64::total_cmp);
    waits.sort_by(f64::total_cmp);
    assert_eq!(logged, waits);
}

#[test]
fn given_fixed_interval_then_arrivals_are_evenly_spaced() {
    let report = run(2, 2, 2);

    let arrivals = report.arrivals.clone().unwrap();
    assert_eq!(arrivals.policy, ArrivalPolicy::PerRun);
    assert_eq!(arrivals.intervals_drawn, 1);
    assert_eq!(arrivals.spawned, report.customers.len());

    let interval = arrivals.interval.unwrap();
    let times: Vec<f64> = report.customers.iter().filter_map(|c| c.arrived_at).collect();
    for (k, t) in times.iter().enumerate() {
        assert_relative_eq!(*t, (k + 1) as f64 * interval, max_relative = 1e-9);
    }
}

#[test]
fn given_per_gap_policy_then_each_gap_is_drawn() {
    let report = Simulation::new(Staffing::new(2, 2, 2).unwrap(), SEED)
        .unwrap()
        .with_arrival_policy(ArrivalPolicy::PerGap)
        .run_detailed(HORIZON)
        .unwrap();

    let arrivals = report.arrivals.unwrap();
    assert_eq!(arrivals.policy, ArrivalPolicy::PerGap);
    assert!(arrivals.intervals_drawn >= arrivals.spawned);
    assert!(!report.wait_times.is_empty());
}

#[test]
fn given_more_staff_then_mean_wait_does_not_get_worse() {
    let small = run(1, 1, 1).wait_times.mean().unwrap();
    let large = run(8, 8, 8).wait_times.mean().unwrap();

    assert!(large <= small, "{large} > {small}");
}
