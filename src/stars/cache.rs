// Stars cache with a freshness window and in-flight lookup de-duplication.
// Serves known counts immediately and refreshes stale entries in background tasks.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{HubError, Result};

use super::clock::Clock;
use super::record::{RepoId, StarRecord, StarsSnapshot};
use super::store::KeyValueStore;

/// Store key holding the serialized cache.
pub const CACHE_KEY: &str = "github-stars-cache";

/// Maximum age of a cached count before it is refreshed: 1 hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound on a single lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of fresh star counts.
#[async_trait]
pub trait StarLookup: Send + Sync {
    async fn stargazers(&self, repo: &RepoId) -> Result<u64>;
}

/// What every [`Resolution`] observes.
#[derive(Debug, Clone, Default)]
struct Published {
    snapshot: StarsSnapshot,
    pending: BTreeSet<RepoId>,
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<RepoId, StarRecord>,
    in_flight: BTreeSet<RepoId>,
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    lookup: Arc<dyn StarLookup>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    lookup_timeout: Duration,
    state: Mutex<State>,
    published: watch::Sender<Published>,
}

/// Star counts keyed by repository, refreshed on demand.
///
/// Cloning is cheap and clones share the same cache.
#[derive(Clone)]
pub struct StarsCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for StarsCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StarsCache")
            .field("ttl", &self.inner.ttl)
            .field("lookup_timeout", &self.inner.lookup_timeout)
            .field("pending", &self.pending())
            .finish()
    }
}

impl StarsCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        lookup: Arc<dyn StarLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (published, _) = watch::channel(Published::default());
        Self {
            inner: Arc::new(Inner {
                store,
                lookup,
                clock,
                ttl: DEFAULT_TTL,
                lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
                state: Mutex::new(State::default()),
                published,
            }),
        }
    }

    /// Override the freshness window. Must be called before the cache is shared.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.ttl = ttl;
        }
        self
    }

    /// Override the per-lookup timeout. Must be called before the cache is shared.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.lookup_timeout = timeout;
        }
        self
    }

    /// Number of lookups currently in flight.
    pub fn pending(&self) -> usize {
        self.inner.lock_state().in_flight.len()
    }

    /// Resolve star counts for a set of repositories.
    ///
    /// Returns immediately with every known count for the requested
    /// repositories. Entries that are missing or older than the TTL are looked
    /// up in background tasks unless a lookup for them is already in flight;
    /// the returned [`Resolution`] observes their results as they land.
    /// Blank and malformed identifiers are ignored.
    ///
    /// Must be called from within a tokio runtime.
    pub fn resolve<I, S>(&self, repos: I) -> Resolution
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let requested: BTreeSet<RepoId> = repos
            .into_iter()
            .filter_map(|raw| {
                let raw = raw.as_ref();
                let repo = RepoId::parse(raw);
                if repo.is_none() && !raw.trim().is_empty() {
                    debug!(repo = raw, "ignoring malformed repository identifier");
                }
                repo
            })
            .collect();

        let scheduled = self.inner.schedule(&requested);
        let receiver = self.inner.published.subscribe();

        for repo in scheduled {
            tokio::spawn(refresh(Arc::clone(&self.inner), repo));
        }

        Resolution {
            requested,
            receiver,
        }
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> HashMap<RepoId, StarRecord> {
        match self.store.get(CACHE_KEY) {
            Ok(Some(raw)) => {
                let records = parse_persisted(&raw);
                debug!(entries = records.len(), "loaded stars cache");
                records
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(error = %e, "failed to read stars cache, starting empty");
                HashMap::new()
            }
        }
    }

    /// Mark stale or unknown repositories as in flight and return the ones
    /// that need a new lookup.
    ///
    /// Every call re-reads the persisted cache so values written by other
    /// sessions are picked up before deciding what is stale.
    fn schedule(&self, requested: &BTreeSet<RepoId>) -> Vec<RepoId> {
        let persisted = self.load();
        let now = self.clock.now();
        let mut state = self.lock_state();

        merge_newer(&mut state.records, persisted);
        let stale: Vec<RepoId> = requested
            .iter()
            .filter(|repo| {
                !state
                    .records
                    .get(*repo)
                    .is_some_and(|record| record.is_fresh(now, self.ttl))
            })
            .cloned()
            .collect();

        let scheduled: Vec<RepoId> = stale
            .into_iter()
            .filter(|repo| state.in_flight.insert(repo.clone()))
            .collect();

        if !scheduled.is_empty() {
            debug!(
                count = scheduled.len(),
                in_flight = state.in_flight.len(),
                "scheduling star lookups"
            );
        }

        self.publish(&state);
        scheduled
    }

    /// Clear the in-flight mark for `repo`, storing `stars` if the lookup succeeded.
    fn finish(&self, repo: &RepoId, stars: Option<u64>) {
        let mut state = self.lock_state();
        state.in_flight.remove(repo);

        if let Some(stars) = stars {
            let record = StarRecord::new(stars, self.clock.now());
            let superseded = state
                .records
                .get(repo)
                .is_some_and(|existing| existing.observed_at > record.observed_at);
            if !superseded {
                state.records.insert(repo.clone(), record);
                self.persist(&state.records);
            }
        }

        self.publish(&state);
    }

    /// Merge `records` into the persisted cache and write it back.
    fn persist(&self, records: &HashMap<RepoId, StarRecord>) {
        let mut merged = match self.store.get(CACHE_KEY) {
            Ok(Some(raw)) => parse_persisted(&raw),
            _ => HashMap::new(),
        };
        merge_newer(
            &mut merged,
            records.iter().map(|(repo, record)| (repo.clone(), *record)),
        );

        let ordered: BTreeMap<&RepoId, &StarRecord> = merged.iter().collect();
        let result = serde_json::to_string(&ordered)
            .map_err(HubError::from)
            .and_then(|json| self.store.set(CACHE_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist stars cache");
        }
    }

    fn publish(&self, state: &State) {
        let snapshot = state
            .records
            .iter()
            .map(|(repo, record)| (repo.clone(), record.stars))
            .collect();
        self.published.send_replace(Published {
            snapshot,
            pending: state.in_flight.clone(),
        });
    }
}

/// Insert each incoming record unless the target already holds a later observation.
fn merge_newer(
    target: &mut HashMap<RepoId, StarRecord>,
    incoming: impl IntoIterator<Item = (RepoId, StarRecord)>,
) {
    for (repo, record) in incoming {
        let newer = target
            .get(&repo)
            .is_none_or(|existing| existing.observed_at <= record.observed_at);
        if newer {
            target.insert(repo, record);
        }
    }
}

/// Parse the persisted cache, treating corrupted contents as empty.
fn parse_persisted(raw: &str) -> HashMap<RepoId, StarRecord> {
    if raw.trim().is_empty() {
        return HashMap::new();
    }

    match serde_json::from_str::<HashMap<String, StarRecord>>(raw) {
        Ok(entries) => entries
            .into_iter()
            .filter_map(|(repo, record)| RepoId::parse(&repo).map(|repo| (repo, record)))
            .collect(),
        Err(e) => {
            warn!(error = %e, "stars cache is corrupted, treating as empty");
            HashMap::new()
        }
    }
}

/// In-flight lookup. Clears its in-flight mark when dropped, including when
/// the lookup panics.
struct PendingLookup {
    inner: Arc<Inner>,
    repo: RepoId,
    stars: Option<u64>,
}

impl Drop for PendingLookup {
    fn drop(&mut self) {
        self.inner.finish(&self.repo, self.stars.take());
    }
}

async fn refresh(inner: Arc<Inner>, repo: RepoId) {
    let mut pending = PendingLookup {
        inner: Arc::clone(&inner),
        repo: repo.clone(),
        stars: None,
    };

    let lookup = inner.lookup.stargazers(&repo);
    match tokio::time::timeout(inner.lookup_timeout, lookup).await {
        Ok(Ok(stars)) => {
            info!(repo = %repo, stars, "refreshed star count");
            pending.stars = Some(stars);
        }
        Ok(Err(e)) => warn!(repo = %repo, error = %e, "failed to fetch star count"),
        Err(_) => warn!(repo = %repo, error = %HubError::Timeout, "failed to fetch star count"),
    }
}

/// Live view of the star counts for one set of repositories.
#[derive(Debug, Clone)]
pub struct Resolution {
    requested: BTreeSet<RepoId>,
    receiver: watch::Receiver<Published>,
}

impl Resolution {
    pub fn requested(&self) -> &BTreeSet<RepoId> {
        &self.requested
    }

    /// Current counts for the requested repositories.
    pub fn snapshot(&self) -> StarsSnapshot {
        view(&self.requested, &self.receiver.borrow())
    }

    /// Whether no lookup for a requested repository is in flight.
    pub fn is_settled(&self) -> bool {
        let published = self.receiver.borrow();
        self.requested
            .iter()
            .all(|repo| !published.pending.contains(repo))
    }

    /// Wait for the next cache update. Returns `false` once the cache is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Snapshot if the cache changed since the last poll.
    pub fn poll_update(&mut self) -> Option<StarsSnapshot> {
        match self.receiver.has_changed() {
            Ok(true) => Some(view(&self.requested, &self.receiver.borrow_and_update())),
            _ => None,
        }
    }

    /// Wait until every requested lookup has finished, then snapshot.
    pub async fn settled(&mut self) -> StarsSnapshot {
        while !self.is_settled() {
            if !self.changed().await {
                break;
            }
        }
        self.snapshot()
    }
}

fn view(requested: &BTreeSet<RepoId>, published: &Published) -> StarsSnapshot {
    requested
        .iter()
        .filter_map(|repo| published.snapshot.get(repo).map(|stars| (repo.clone(), stars)))
        .collect()
}
