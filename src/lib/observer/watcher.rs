use super::types::{Endpoint, EndpointId, EndpointsLister};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::{Mutex, watch},
    time::MissedTickBehavior,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Receives endpoint changes from an [`EndpointsWatcher`].
pub trait Notify: Send + Sync {
    fn on_add(&self, added: &[Endpoint]);
    fn on_remove(&self, removed: &[Endpoint]);
    fn on_change(&self, changed: &[Endpoint]);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointsDiff {
    pub added: Vec<Endpoint>,
    pub removed: Vec<Endpoint>,
    pub changed: Vec<Endpoint>,
}

impl EndpointsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compares two full listings by endpoint id. An id present in both with a
/// different value counts as changed.
pub fn diff_endpoints(previous: &[Endpoint], current: &[Endpoint]) -> EndpointsDiff {
    let before: HashMap<&EndpointId, &Endpoint> =
        previous.iter().map(|e| (&e.id, e)).collect();
    let after: HashSet<&EndpointId> = current.iter().map(|e| &e.id).collect();

    let mut diff = EndpointsDiff::default();
    for endpoint in current {
        match before.get(&endpoint.id) {
            None => diff.added.push(endpoint.clone()),
            Some(old) if *old != endpoint => diff.changed.push(endpoint.clone()),
            Some(_) => {}
        }
    }
    diff.removed = previous
        .iter()
        .filter(|e| !after.contains(&e.id))
        .cloned()
        .collect();
    diff
}

fn dedup_by_id(endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    let mut seen = HashSet::new();
    endpoints
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect()
}

/// Polls an [`EndpointsLister`] and fans the differences between successive
/// listings out to subscribers.
pub struct EndpointsWatcher {
    lister: Arc<dyn EndpointsLister>,
    refresh_interval: Duration,
    // Held across the listing call so refreshes never interleave.
    refresh_lock: Mutex<()>,
    // Held while callbacks run so a new subscriber's initial add always
    // precedes the first diff it is sent.
    delivery_lock: Mutex<()>,
    known: Mutex<Vec<Endpoint>>,
    subscribers: Mutex<HashMap<Uuid, Arc<dyn Notify>>>,
}

impl EndpointsWatcher {
    pub fn new(lister: Arc<dyn EndpointsLister>, refresh_interval: Duration) -> Self {
        EndpointsWatcher {
            lister,
            refresh_interval,
            refresh_lock: Mutex::new(()),
            delivery_lock: Mutex::new(()),
            known: Mutex::new(Vec::new()),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `notify`. It is told about every endpoint already known
    /// before it sees any later change.
    pub async fn subscribe(&self, notify: Arc<dyn Notify>) -> Uuid {
        let _delivery = self.delivery_lock.lock().await;

        let id = Uuid::new_v4();
        let snapshot = {
            let known = self.known.lock().await;
            self.subscribers.lock().await.insert(id, notify.clone());
            known.clone()
        };

        if !snapshot.is_empty() {
            notify.on_add(&snapshot);
        }
        debug!(subscriber = %id, "subscriber added");
        id
    }

    pub async fn unsubscribe(&self, id: Uuid) -> bool {
        let removed = self.subscribers.lock().await.remove(&id).is_some();
        if removed {
            debug!(subscriber = %id, "subscriber removed");
        }
        removed
    }

    pub async fn endpoints(&self) -> Vec<Endpoint> {
        self.known.lock().await.clone()
    }

    pub async fn refresh(&self) -> EndpointsDiff {
        let _refresh = self.refresh_lock.lock().await;
        let current = dedup_by_id(self.lister.list_endpoints().await);

        let _delivery = self.delivery_lock.lock().await;
        let (diff, subscribers) = {
            let mut known = self.known.lock().await;
            let diff = diff_endpoints(&known, &current);
            *known = current;
            let subscribers: Vec<Arc<dyn Notify>> =
                self.subscribers.lock().await.values().cloned().collect();
            (diff, subscribers)
        };

        if diff.is_empty() {
            return diff;
        }

        for notify in subscribers {
            if !diff.removed.is_empty() {
                notify.on_remove(&diff.removed);
            }
            if !diff.added.is_empty() {
                notify.on_add(&diff.added);
            }
            if !diff.changed.is_empty() {
                notify.on_change(&diff.changed);
            }
        }

        diff
    }

    /// Refreshes now and then on every tick until `shutdown` turns true or
    /// its sender goes away.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?self.refresh_interval, "starting endpoints watcher");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let diff = self.refresh().await;
                    debug!(
                        added = diff.added.len(),
                        removed = diff.removed.len(),
                        changed = diff.changed.len(),
                        "endpoints refreshed"
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("endpoints watcher stopped");
    }
}

/// Logs every endpoint change.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotify;

impl Notify for LogNotify {
    fn on_add(&self, added: &[Endpoint]) {
        for endpoint in added {
            info!(id = %endpoint.id, target = %endpoint.target, image = %endpoint.image, "endpoint added");
        }
    }

    fn on_remove(&self, removed: &[Endpoint]) {
        for endpoint in removed {
            info!(id = %endpoint.id, target = %endpoint.target, "endpoint removed");
        }
    }

    fn on_change(&self, changed: &[Endpoint]) {
        for endpoint in changed {
            info!(id = %endpoint.id, target = %endpoint.target, "endpoint changed");
        }
    }
}
