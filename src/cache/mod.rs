/*!
# Project Cache

Кэш собранных проектов, ключ - исходный путь проекта.

Проект после сборки неизменяем и хранится как `Arc<Project>`, поэтому повторные
запросы того же пути возвращают тот же экземпляр. Кэш всегда содержит только
полностью собранные проекты: запись выполняется одной операцией `insert` после
завершения разбора. При гонке первых загрузок одного пути побеждает последний
записавший.

Реализации:
- [`UnboundedProjectCache`] - без вытеснения, живет все время процесса
- [`LruProjectCache`] - ограниченная емкость, LRU вытеснение

## Использование

```rust
use pbi_model_analyzer::cache::{project_cache, ProjectCache};

let cache = project_cache(Some(16));
assert!(cache.get("Sales.pbip").is_none());
```
*/

pub mod lru_cache;

pub use lru_cache::{CacheStats, LruCache};

use crate::model::Project;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Хранилище собранных проектов
pub trait ProjectCache: Send + Sync {
    /// Возвращает проект из кэша
    fn get(&self, source_path: &str) -> Option<Arc<Project>>;

    /// Сохраняет полностью собранный проект
    fn insert(&self, source_path: &str, project: Arc<Project>);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}

/// Создает кэш: `None` - без ограничения, `Some(n)` - LRU на n проектов
pub fn project_cache(capacity: Option<usize>) -> Box<dyn ProjectCache> {
    match capacity {
        Some(capacity) => Box::new(LruProjectCache::new(capacity)),
        None => Box::new(UnboundedProjectCache::new()),
    }
}

/// Кэш без вытеснения
#[derive(Default)]
pub struct UnboundedProjectCache {
    entries: RwLock<HashMap<String, Arc<Project>>>,
}

impl UnboundedProjectCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectCache for UnboundedProjectCache {
    fn get(&self, source_path: &str) -> Option<Arc<Project>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let hit = entries.get(source_path).cloned();
        tracing::debug!(
            "Project cache {}: {}",
            if hit.is_some() { "hit" } else { "miss" },
            source_path
        );
        hit
    }

    fn insert(&self, source_path: &str, project: Arc<Project>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(source_path.to_string(), project);
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn clear(&self) {
        self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Кэш с ограниченной емкостью и LRU вытеснением
pub struct LruProjectCache {
    inner: Mutex<LruCache<String, Arc<Project>>>,
}

impl LruProjectCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Снимок статистики обращений
    pub fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .stats()
            .clone()
    }
}

impl ProjectCache for LruProjectCache {
    fn get(&self, source_path: &str) -> Option<Arc<Project>> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let hit = inner.get(&source_path.to_string());
        tracing::debug!(
            "Project cache {}: {}",
            if hit.is_some() { "hit" } else { "miss" },
            source_path
        );
        hit
    }

    fn insert(&self, source_path: &str, project: Arc<Project>) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.put(source_path.to_string(), project);
        let stats = inner.stats();
        tracing::debug!(
            "Project cache: {}/{} entries, hit rate {:.0}%, {} evictions",
            inner.len(),
            inner.capacity(),
            stats.hit_rate() * 100.0,
            stats.evictions
        );
    }

    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
