//! Lifecycle of one trip, from destination submission to arrival or cancellation.
//!
//! ```text
//! Idle --start_trip--> Active --route within threshold--> Completed
//!  ^                     |
//!  +------stop_trip------+          any state --clear--> Idle
//! ```
//!
//! While a target is set, a refresh cycle re-requests the route against the
//! current origin at a fixed interval. The cycle is owned by the session and
//! stops on `clear`, on completion, on a new destination, and on drop.

use std::{sync::Arc, time::Duration};

use navigation_lib::{
    coordinate::Coordinate,
    destination::Destination,
    error::NavError,
    gateway::{HistoryStore, MapsGateway},
    planner::plan_route,
    route::RouteResult,
};
use serde::Serialize;
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

pub const REFRESH_INTERVAL: Duration = Duration::from_millis(15_000);
pub const ARRIVAL_THRESHOLD_METERS: f64 = 30.0;
pub const WAITING_FOR_LOCATION: &str = "Waiting for your current location.";

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub refresh_interval: Duration,
    /// Compared against the provider's remaining route distance.
    pub arrival_threshold_meters: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            refresh_interval: REFRESH_INTERVAL,
            arrival_threshold_meters: ARRIVAL_THRESHOLD_METERS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TripStatus {
    #[default]
    Idle,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RouteUpdated(RouteResult),
    /// A refresh failed; the previous route is still current.
    RefreshFailed(NavError),
    WaitingForLocation,
    Arrived(RouteResult),
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotArmed,
    RequestInFlight,
    WaitingForLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated(RouteResult),
    Arrived(RouteResult),
    Failed(NavError),
    Skipped(SkipReason),
    /// The answer came back after the cycle that asked for it was disarmed.
    Discarded,
}

/// Derived state for a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub origin: Option<Coordinate>,
    pub target: Option<Destination>,
    pub last_route: Option<RouteResult>,
    pub trip_status: TripStatus,
    pub refresh_armed: bool,
    pub waiting_for_location: bool,
}

#[derive(Default)]
struct SessionState {
    target: Option<Destination>,
    last_route: Option<RouteResult>,
    trip_status: TripStatus,
    /// Bumped on every disarm. Results stamped with an older generation are dropped.
    generation: u64,
    cycle: Option<CancellationToken>,
    in_flight: bool,
}

impl SessionState {
    fn arm(&mut self, token: CancellationToken) -> u64 {
        self.disarm();
        self.cycle = Some(token);
        self.generation
    }

    fn disarm(&mut self) {
        self.generation += 1;
        self.in_flight = false;
        if let Some(token) = self.cycle.take() {
            token.cancel();
        }
    }

    fn is_armed(&self) -> bool {
        self.cycle.is_some()
    }

    fn reset(&mut self) {
        self.disarm();
        self.target = None;
        self.last_route = None;
        self.trip_status = TripStatus::Idle;
    }

    /// Completes an active trip once the remaining distance is within the threshold.
    /// Completion is terminal and disarms the cycle.
    fn check_arrival(&mut self, threshold_meters: f64) -> bool {
        if self.trip_status != TripStatus::Active {
            return false;
        }

        match &self.last_route {
            Some(route) if route.is_within(threshold_meters) => {
                self.trip_status = TripStatus::Completed;
                self.disarm();
                true
            },
            _ => false,
        }
    }
}

struct Shared {
    state: Mutex<SessionState>,
    maps: Arc<dyn MapsGateway>,
    origin: watch::Receiver<Option<Coordinate>>,
    events: broadcast::Sender<SessionEvent>,
    settings: SessionSettings,
}

impl Shared {
    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    /// An out-of-range fix counts as no fix.
    fn current_origin(&self) -> Option<Coordinate> {
        (*self.origin.borrow()).filter(Coordinate::is_valid)
    }

    /// One guarded refresh. `generation` pins the cycle that asked; `None` means the current one.
    async fn refresh(&self, generation: Option<u64>) -> RefreshOutcome {
        let (generation, origin, destination) = {
            let mut state = self.state.lock().await;
            let generation = generation.unwrap_or(state.generation);

            let target = match &state.target {
                Some(target) if state.is_armed() && state.generation == generation => target.clone(),
                _ => return RefreshOutcome::Skipped(SkipReason::NotArmed),
            };
            if state.in_flight {
                tracing::debug!("Skipping refresh, previous route request still in flight");
                return RefreshOutcome::Skipped(SkipReason::RequestInFlight);
            }
            let Some(origin) = self.current_origin() else {
                tracing::debug!("Skipping refresh, no location fix");
                self.emit(SessionEvent::WaitingForLocation);
                return RefreshOutcome::Skipped(SkipReason::WaitingForLocation);
            };

            state.in_flight = true;
            (generation, origin, target)
        };

        let result = plan_route(self.maps.as_ref(), origin, destination).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            tracing::debug!("Discarding route for disarmed refresh cycle {generation}");
            return RefreshOutcome::Discarded;
        }
        state.in_flight = false;

        match result {
            Ok(route) => {
                tracing::debug!("Route refreshed: {:.0} m remaining", route.distance_meters);
                state.last_route = Some(route.clone());
                self.emit(SessionEvent::RouteUpdated(route.clone()));

                if state.check_arrival(self.settings.arrival_threshold_meters) {
                    tracing::info!("Arrived at {}", route.destination.place_name);
                    self.emit(SessionEvent::Arrived(route.clone()));
                    RefreshOutcome::Arrived(route)
                } else {
                    RefreshOutcome::Updated(route)
                }
            },
            Err(err) => {
                tracing::warn!("Route refresh failed: {err}");
                self.emit(SessionEvent::RefreshFailed(err.clone()));
                RefreshOutcome::Failed(err)
            },
        }
    }
}

/// The running timer. Dropping it stops every tick, including one in flight.
struct RefreshCycle {
    token: CancellationToken,
    ticker: JoinHandle<()>,
}

impl RefreshCycle {
    fn spawn(shared: Arc<Shared>, generation: u64, token: CancellationToken) -> Self {
        let period = shared.settings.refresh_interval;
        let cycle_token = token.clone();

        let ticker = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = cycle_token.cancelled() => break,
                    _ = interval.tick() => {
                        // Requests run beside the ticker so a slow one makes later ticks skip, not queue.
                        let shared = shared.clone();
                        let request_token = cycle_token.clone();
                        tokio::spawn(async move {
                            tokio::select! {
                                biased;
                                _ = request_token.cancelled() => {},
                                _ = shared.refresh(Some(generation)) => {},
                            }
                        });
                    },
                }
            }

            tracing::debug!("Refresh cycle {generation} stopped");
        });

        Self {
            token,
            ticker,
        }
    }
}

impl Drop for RefreshCycle {
    fn drop(&mut self) {
        self.token.cancel();
        self.ticker.abort();
    }
}

/// One navigation session. A single owner drives it; `&mut self` operations
/// are not meant to race each other.
pub struct NavigationSession {
    shared: Arc<Shared>,
    history: Arc<dyn HistoryStore>,
    refresh: Option<RefreshCycle>,
}

impl NavigationSession {
    pub fn new(maps: Arc<dyn MapsGateway>, history: Arc<dyn HistoryStore>, origin: watch::Receiver<Option<Coordinate>>) -> Self {
        Self::with_settings(maps, history, origin, SessionSettings::default())
    }

    pub fn with_settings(
        maps: Arc<dyn MapsGateway>,
        history: Arc<dyn HistoryStore>,
        origin: watch::Receiver<Option<Coordinate>>,
        settings: SessionSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                maps,
                origin,
                events,
                settings,
            }),
            history,
            refresh: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    pub fn current_origin(&self) -> Option<Coordinate> {
        self.shared.current_origin()
    }

    /// Geocodes `raw_address`, routes to it from `origin`, records it in the
    /// history and arms the refresh cycle.
    ///
    /// Any previous trip is torn down first, a completed one included. On
    /// failure nothing is left armed and exactly one error is returned.
    pub async fn submit_destination(&mut self, raw_address: &str, origin: Option<Coordinate>) -> Result<RouteResult, NavError> {
        let address = raw_address.trim();
        if address.is_empty() {
            return Err(NavError::invalid_input(&["destinationAddress"], "Enter a destination address."));
        }
        let Some(origin) = origin else {
            return Err(NavError::invalid_input(&["origin"], WAITING_FOR_LOCATION));
        };
        let issues = origin.issues(&["origin"]);
        if !issues.is_empty() {
            return Err(NavError::from_issues(issues));
        }

        self.teardown().await;

        tracing::info!("Navigating to {address}");
        let destination = self.shared.maps.geocode(address).await?;
        let route = plan_route(self.shared.maps.as_ref(), origin, destination.clone()).await?;

        let token = CancellationToken::new();
        let generation = {
            let mut state = self.shared.state.lock().await;
            state.target = Some(destination);
            state.last_route = Some(route.clone());
            state.trip_status = TripStatus::Idle;
            state.arm(token.clone())
        };

        if let Err(err) = self.history.append(address, &route.destination).await {
            tracing::warn!("Failed to record {address} in history: {err}");
        }

        self.refresh = Some(RefreshCycle::spawn(self.shared.clone(), generation, token));
        self.shared.emit(SessionEvent::RouteUpdated(route.clone()));

        Ok(route)
    }

    /// Idle to Active. Arrival is checked straight away against the current route.
    pub async fn start_trip(&mut self) -> Result<TripStatus, NavError> {
        let (status, arrived) = {
            let mut state = self.shared.state.lock().await;
            if state.last_route.is_none() {
                return Err(NavError::invalid_input(&["trip"], "No route to start."));
            }

            match state.trip_status {
                TripStatus::Completed => {
                    return Err(NavError::invalid_input(&["trip"], "Trip already completed. Submit the destination again to start a new trip."));
                },
                TripStatus::Idle | TripStatus::Active => state.trip_status = TripStatus::Active,
            }

            let arrived = if state.check_arrival(self.shared.settings.arrival_threshold_meters) {
                state.last_route.clone()
            } else {
                None
            };
            (state.trip_status, arrived)
        };

        if let Some(route) = arrived {
            tracing::info!("Arrived at {}", route.destination.place_name);
            self.refresh = None;
            self.shared.emit(SessionEvent::Arrived(route));
        }

        Ok(status)
    }

    /// Active back to Idle. The refresh cycle keeps running.
    pub async fn stop_trip(&mut self) -> Result<TripStatus, NavError> {
        let mut state = self.shared.state.lock().await;
        if state.last_route.is_none() {
            return Err(NavError::invalid_input(&["trip"], "No route to stop."));
        }

        match state.trip_status {
            TripStatus::Completed => Err(NavError::invalid_input(&["trip"], "Trip already completed.")),
            TripStatus::Idle | TripStatus::Active => {
                state.trip_status = TripStatus::Idle;
                Ok(state.trip_status)
            },
        }
    }

    /// Refreshes once right now, through the same in-flight guard as the timer.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        // Spawned so that dropping this future cannot strand the in-flight flag.
        let shared = self.shared.clone();
        tokio::spawn(async move { shared.refresh(None).await })
            .await
            .unwrap_or_else(|err| RefreshOutcome::Failed(NavError::Unexpected(format!("Refresh task failed: {err}"))))
    }

    /// Disarms the cycle and forgets the trip. Safe to call any number of times.
    pub async fn clear(&mut self) {
        self.teardown().await;
        self.shared.emit(SessionEvent::Cleared);
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.state.lock().await;
        let origin = self.current_origin();

        SessionSnapshot {
            origin,
            target: state.target.clone(),
            last_route: state.last_route.clone(),
            trip_status: state.trip_status,
            refresh_armed: state.is_armed(),
            waiting_for_location: state.target.is_some() && origin.is_none(),
        }
    }

    pub async fn trip_status(&self) -> TripStatus {
        self.shared.state.lock().await.trip_status
    }

    pub async fn last_route(&self) -> Option<RouteResult> {
        self.shared.state.lock().await.last_route.clone()
    }

    pub async fn is_refresh_armed(&self) -> bool {
        self.shared.state.lock().await.is_armed()
    }

    async fn teardown(&mut self) {
        self.shared.state.lock().await.reset();
        self.refresh = None;
    }
}
