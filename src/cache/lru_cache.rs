/*!
# LRU Cache Implementation

Реализация LRU (Least Recently Used) кэша без `unsafe`: порядок использования
хранится как монотонный счетчик обращений, индексированный в `BTreeMap`.
Операции get/put выполняются за O(log n), вытесняется запись с наименьшим
счетчиком.
*/

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// LRU кэш с заданной емкостью
pub struct LruCache<K: Clone + Eq + Hash, V: Clone> {
    /// Значения и номер последнего обращения
    entries: HashMap<K, (V, u64)>,
    /// Номер обращения -> ключ (от самого старого к самому новому)
    order: BTreeMap<u64, K>,
    /// Следующий номер обращения
    tick: u64,
    /// Максимальная емкость кэша
    capacity: usize,
    /// Статистика кэша
    stats: CacheStats,
}

/// Статистика кэша
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Общее количество операций get
    pub get_operations: u64,
    /// Количество попаданий
    pub hits: u64,
    /// Количество промахов
    pub misses: u64,
    /// Количество операций put
    pub put_operations: u64,
    /// Количество вытеснений
    pub evictions: u64,
}

impl<K: Clone + Eq + Hash, V: Clone> LruCache<K, V> {
    /// Создает новый LRU кэш с заданной емкостью (минимум 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            tick: 0,
            capacity,
            stats: CacheStats::default(),
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Получает значение по ключу и делает запись самой новой
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.stats.get_operations += 1;
        let tick = self.next_tick();

        match self.entries.get_mut(key) {
            Some((value, last_used)) => {
                self.order.remove(last_used);
                *last_used = tick;
                self.order.insert(tick, key.clone());
                self.stats.hits += 1;
                Some(value.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Вставляет или обновляет значение
    pub fn put(&mut self, key: K, value: V) {
        self.stats.put_operations += 1;
        let tick = self.next_tick();

        if let Some((_, last_used)) = self.entries.insert(key.clone(), (value, tick)) {
            self.order.remove(&last_used);
        }
        self.order.insert(tick, key);

        while self.entries.len() > self.capacity {
            if self.pop_lru().is_none() {
                break;
            }
            self.stats.evictions += 1;
        }
    }

    /// Удаляет и возвращает наименее используемый элемент
    fn pop_lru(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        let (value, _) = self.entries.remove(&key)?;
        Some((key, value))
    }

    /// Проверяет наличие ключа без изменения порядка
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl CacheStats {
    /// Доля попаданий среди операций get
    pub fn hit_rate(&self) -> f64 {
        if self.get_operations == 0 {
            0.0
        } else {
            self.hits as f64 / self.get_operations as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_cache_basic_operations() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_cache_eviction_respects_access_order() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.get(&"a");
        cache.put("c", 3);

        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_lru_cache_update_existing() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("a", 10);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a"), Some(10));
    }

    #[test]
    fn test_lru_cache_pop_lru_and_clear() {
        let mut cache = LruCache::new(3);
        cache.put(1, "one");
        cache.put(2, "two");
        cache.put(3, "three");
        cache.get(&1);
        assert_eq!(cache.pop_lru(), Some((2, "two")));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_cache_stats() {
        let mut cache = LruCache::new(1);
        cache.put("a", 1);
        cache.get(&"a");
        cache.get(&"b");
        let stats = cache.stats();
        assert_eq!(stats.get_operations, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
