use crate::cache::QueryCache;
use crate::config::Config;
use crate::models::{Day, Habit, HabitId, StoreData, UserId};
use std::{collections::BTreeSet, sync::Arc};
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct Caches {
    pub habits: QueryCache<UserId, Vec<Habit>>,
    pub completions: QueryCache<HabitId, BTreeSet<Day>>,
}

/// Shared handles. Lock `data` before `cache` when both are needed.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub data: Arc<Mutex<StoreData>>,
    pub cache: Arc<Mutex<Caches>>,
}

impl AppState {
    pub fn new(config: Config, data: StoreData) -> Self {
        let caches = Caches {
            habits: QueryCache::new(config.cache_ttl),
            completions: QueryCache::new(config.cache_ttl),
        };
        Self {
            config: Arc::new(config),
            data: Arc::new(Mutex::new(data)),
            cache: Arc::new(Mutex::new(caches)),
        }
    }
}
