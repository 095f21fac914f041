use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use super::{Collector, ContentMap, ContentType, Services, Sources, Visibility};
use crate::error::CollectError;
use crate::input::Input;
use crate::transcript::Summary;

/// Time source for TTL checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: Instant,
}

/// One content type's collector plus its cached value.
///
/// `entry` is read-locked on the hot path; `refresh` serializes refreshes of
/// this type only, so concurrent misses run the collector once.
struct Slot {
    collector: Collector,
    entry: RwLock<Option<CacheEntry>>,
    refresh: Mutex<()>,
}

impl Slot {
    fn fresh(&self, now: Instant) -> Option<String> {
        let entry = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        entry
            .as_ref()
            .filter(|e| now < e.expires_at)
            .map(|e| e.value.clone())
    }
}

/// Owns the collector registry and one cache entry per content type.
pub struct Manager {
    slots: HashMap<ContentType, Slot>,
    order: Vec<ContentType>,
    services: Services,
    clock: Arc<dyn Clock>,
    visibility: Visibility,
}

impl Manager {
    /// Later registrations for the same content type replace earlier ones.
    pub fn new(collectors: Vec<Collector>, services: Services, clock: Arc<dyn Clock>) -> Self {
        let mut slots = HashMap::with_capacity(collectors.len());
        let mut order = Vec::with_capacity(collectors.len());
        for collector in collectors {
            let ty = collector.content_type();
            if !order.contains(&ty) {
                order.push(ty);
            }
            slots.insert(
                ty,
                Slot {
                    collector,
                    entry: RwLock::new(None),
                    refresh: Mutex::new(()),
                },
            );
        }
        Self {
            slots,
            order,
            services,
            clock,
            visibility: Visibility::default(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Cached value within TTL, otherwise a fresh collection. Errors are
    /// returned as-is and leave the cache untouched.
    pub fn get(
        &self,
        ty: ContentType,
        input: &Input,
        summary: &Summary,
    ) -> Result<String, CollectError> {
        let slot = self
            .slots
            .get(&ty)
            .ok_or(CollectError::Missing(ty.as_str()))?;

        if let Some(value) = slot.fresh(self.clock.now()) {
            return Ok(value);
        }

        let _guard = slot.refresh.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have refreshed while we waited.
        if let Some(value) = slot.fresh(self.clock.now()) {
            return Ok(value);
        }

        let sources = Sources {
            input,
            summary,
            settings: &self.services.settings,
            git: &self.services.git,
            quota: &self.services.quota,
        };
        let value = slot.collector.collect(&sources)?;
        tracing::trace!("refreshed {}", ty);

        let mut entry = slot.entry.write().unwrap_or_else(PoisonError::into_inner);
        *entry = Some(CacheEntry {
            value: value.clone(),
            expires_at: self.clock.now() + slot.collector.ttl(),
        });
        Ok(value)
    }

    /// Best-effort sweep over every visible content type. Failed collectors
    /// are logged and left out of the map.
    pub fn get_all(&self, input: &Input, summary: &Summary) -> ContentMap {
        let mut content = ContentMap::new();
        for ty in &self.order {
            if !self.visibility.allows(*ty) {
                continue;
            }
            match self.get(*ty, input, summary) {
                Ok(value) => {
                    content.insert(*ty, value);
                }
                Err(e) => {
                    let optional = self.slots.get(ty).is_some_and(|s| s.collector.optional());
                    if optional {
                        tracing::debug!("{} skipped: {}", ty, e);
                    } else {
                        tracing::warn!("{} failed: {}", ty, e);
                    }
                }
            }
        }
        content
    }
}

/// Clock advanced by hand in tests.
#[cfg(test)]
pub struct ManualClock(Mutex<Instant>);

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self(Mutex::new(Instant::now()))
    }

    pub fn advance(&self, by: std::time::Duration) {
        *self.0.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap()
    }
}
