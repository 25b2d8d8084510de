use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use calrelay_core::{ChangeFeedProvider, WatchProvider};
use calrelay_domain::{
    CalRelayError, ChangeItem, ChangePage, ResourceId, Result as DomainResult, Subscription,
    WatchRegistration,
};
use chrono::{DateTime, Utc};

/// Change feed that replays scripted pages.
///
/// Baseline listings are served from a fixed page list per resource, indexed
/// by `page-N` tokens. Incremental listings pop one scripted response per
/// call; once the script is exhausted an empty page echoing the cursor is
/// returned.
#[derive(Default)]
pub struct ScriptedFeed {
    baseline: Mutex<HashMap<ResourceId, Vec<ChangePage>>>,
    incremental: Mutex<HashMap<ResourceId, VecDeque<DomainResult<ChangePage>>>>,
    calls: Mutex<Vec<String>>,
    baseline_windows: Mutex<Vec<DateTime<Utc>>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call open for `delay`, to expose overlapping passes.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script a baseline listing split across `pages`; the last page carries `cursor`.
    pub fn set_baseline(&self, resource: &ResourceId, pages: Vec<Vec<ChangeItem>>, cursor: Option<&str>) {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(index, items)| {
                let last = index + 1 == count;
                ChangePage {
                    items,
                    next_page_token: (!last).then(|| format!("page-{}", index + 1)),
                    next_cursor: if last { cursor.map(str::to_string) } else { None },
                }
            })
            .collect();
        self.baseline.lock().unwrap().insert(resource.clone(), pages);
    }

    /// Queue one incremental response.
    pub fn push_incremental(&self, resource: &ResourceId, response: DomainResult<ChangePage>) {
        self.incremental
            .lock()
            .unwrap()
            .entry(resource.clone())
            .or_default()
            .push_back(response);
    }

    /// Queue a single-page incremental response ending at `cursor`.
    pub fn push_page(&self, resource: &ResourceId, items: Vec<ChangeItem>, cursor: &str) {
        self.push_incremental(
            resource,
            Ok(ChangePage { items, next_page_token: None, next_cursor: Some(cursor.to_string()) }),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// `since` of every baseline page request, in call order.
    pub fn baseline_windows(&self) -> Vec<DateTime<Utc>> {
        self.baseline_windows.lock().unwrap().clone()
    }

    /// Highest number of listing calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChangeFeedProvider for ScriptedFeed {
    async fn list_baseline(
        &self,
        resource: &ResourceId,
        since: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> DomainResult<ChangePage> {
        self.baseline_windows.lock().unwrap().push(since);
        self.enter(format!("baseline:{resource}:{}", page_token.unwrap_or("-"))).await;

        let index = page_token
            .and_then(|token| token.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let page = self
            .baseline
            .lock()
            .unwrap()
            .get(resource)
            .and_then(|pages| pages.get(index).cloned())
            .ok_or_else(|| CalRelayError::NotFound(format!("no baseline scripted for {resource}")));

        self.leave();
        page
    }

    async fn list_incremental(
        &self,
        resource: &ResourceId,
        cursor: &str,
        page_token: Option<&str>,
    ) -> DomainResult<ChangePage> {
        self.enter(format!("incremental:{resource}:{cursor}:{}", page_token.unwrap_or("-"))).await;

        let scripted =
            self.incremental.lock().unwrap().get_mut(resource).and_then(VecDeque::pop_front);
        let response = scripted.unwrap_or_else(|| {
            Ok(ChangePage { items: Vec::new(), next_page_token: None, next_cursor: Some(cursor.to_string()) })
        });

        self.leave();
        response
    }
}

/// Records watch registrations and unregistrations.
#[derive(Default)]
pub struct FakeWatcher {
    pub registered: Mutex<Vec<(ResourceId, String, String)>>,
    pub unregistered: Mutex<Vec<String>>,
    failing_resources: Mutex<HashSet<ResourceId>>,
    fail_unregister: bool,
}

impl FakeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_unregister() -> Self {
        Self { fail_unregister: true, ..Self::default() }
    }

    pub fn fail_for(&self, resource: &ResourceId) {
        self.failing_resources.lock().unwrap().insert(resource.clone());
    }
}

#[async_trait]
impl WatchProvider for FakeWatcher {
    async fn register_watch(
        &self,
        resource: &ResourceId,
        subscription_id: &str,
        callback_address: &str,
    ) -> DomainResult<WatchRegistration> {
        if self.failing_resources.lock().unwrap().contains(resource) {
            return Err(CalRelayError::Auth(format!("watch refused for {resource}")));
        }
        self.registered.lock().unwrap().push((
            resource.clone(),
            subscription_id.to_string(),
            callback_address.to_string(),
        ));
        Ok(WatchRegistration { handle: format!("handle-{resource}"), expiry: None })
    }

    async fn unregister(&self, subscription: &Subscription) -> DomainResult<()> {
        if self.fail_unregister {
            return Err(CalRelayError::Network("provider unreachable".into()));
        }
        self.unregistered.lock().unwrap().push(subscription.subscription_id.clone());
        Ok(())
    }
}
