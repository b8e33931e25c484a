use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::gateway::{
    GatewayError, PlaceResolver, ResolvedPlace, VenueSearch, VenueSearchResult,
};

/// Monotonic id of a neighborhood lookup. Only the newest one may touch the view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared between the view model, which bumps it, and the driver, which reads it.
#[derive(Clone, Debug, Default)]
pub struct GenerationCounter(Arc<AtomicU64>);

impl GenerationCounter {
    pub fn bump(&self) -> Generation {
        Generation(self.0.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.0.load(Ordering::Acquire))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LookupRequest {
    pub generation: Generation,
    pub query: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupStage {
    Resolve,
    Search,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LookupEvent {
    Resolved {
        generation: Generation,
        place: ResolvedPlace,
    },
    Venues {
        generation: Generation,
        result: VenueSearchResult,
    },
    Failed {
        generation: Generation,
        stage: LookupStage,
        error: GatewayError,
    },
}

impl LookupEvent {
    pub fn generation(&self) -> Generation {
        match self {
            LookupEvent::Resolved { generation, .. }
            | LookupEvent::Venues { generation, .. }
            | LookupEvent::Failed { generation, .. } => *generation,
        }
    }
}

/// The driver's ends of the channels a view model talks through.
pub struct Lookups {
    pub requests: flume::Receiver<LookupRequest>,
    pub events: flume::Sender<LookupEvent>,
    pub generation: GenerationCounter,
}

/// Runs lookups against the gateways and reports back over a channel.
pub struct LookupDriver<P, V> {
    resolver: Arc<P>,
    search: Arc<V>,
}

impl<P: PlaceResolver, V: VenueSearch> LookupDriver<P, V> {
    pub fn new(resolver: P, search: V) -> Self {
        Self {
            resolver: Arc::new(resolver),
            search: Arc::new(search),
        }
    }

    /// Serves requests until the view model drops its sender.
    ///
    /// Lookups run concurrently, so responses may arrive out of order; each
    /// event carries its generation and the view model drops stale ones.
    pub async fn run(self, lookups: Lookups) {
        let Lookups {
            requests,
            events,
            generation,
        } = lookups;
        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                req = requests.recv_async() => {
                    let Ok(req) = req else {
                        break;
                    };
                    tasks.spawn(lookup(
                        self.resolver.clone(),
                        self.search.clone(),
                        generation.clone(),
                        req,
                        events.clone(),
                    ));
                }
                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(err) = res {
                        warn!(?err, "lookup task failed");
                    }
                }
            }
        }
        while tasks.join_next().await.is_some() {}
        debug!("lookup driver stopped");
    }
}

async fn lookup<P: PlaceResolver, V: VenueSearch>(
    resolver: Arc<P>,
    search: Arc<V>,
    latest: GenerationCounter,
    req: LookupRequest,
    events: flume::Sender<LookupEvent>,
) {
    let LookupRequest { generation, query } = req;
    info!(%query, %generation, "resolving neighborhood");
    let place = match resolver.resolve(&query).await {
        Ok(place) => place,
        Err(error) => {
            warn!(%query, %generation, %error, "neighborhood lookup failed");
            let _ = events.send(LookupEvent::Failed {
                generation,
                stage: LookupStage::Resolve,
                error,
            });
            return;
        }
    };
    let center = place.center;
    if events
        .send(LookupEvent::Resolved { generation, place })
        .is_err()
    {
        return;
    }
    if !latest.is_current(generation) {
        debug!(%generation, "lookup superseded, skipping venue search");
        return;
    }
    let event = match search.search(center).await {
        Ok(result) => {
            info!(%generation, venues = result.venues.len(), "venue search finished");
            LookupEvent::Venues { generation, result }
        }
        Err(error) => {
            warn!(%generation, %error, "venue search failed");
            LookupEvent::Failed {
                generation,
                stage: LookupStage::Search,
                error,
            }
        }
    };
    let _ = events.send(event);
}
