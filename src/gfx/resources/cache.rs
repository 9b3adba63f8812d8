// src/gfx/resources/cache.rs
//! Named GPU resource registry
//!
//! A typed, string-keyed cache decoupling resource lifetime from pass
//! code. Within one type, names are unique; adding over a live key or
//! fetching an absent one is a contract violation and panics loudly.
//! There is no eviction: entries live until explicitly removed, which
//! only happens during construction or window resizes.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

#[derive(Default)]
pub struct ResourceCache {
    entries: HashMap<TypeId, HashMap<String, Box<dyn Any>>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts a resource under `key`.
    ///
    /// # Panics
    /// Panics if a resource of the same type already exists under `key`.
    pub fn add<T: 'static>(&mut self, key: impl Into<String>, resource: T) {
        let key = key.into();
        let by_name = self.entries.entry(TypeId::of::<T>()).or_default();
        if by_name.contains_key(&key) {
            panic!(
                "resource cache: duplicate add of {}['{}'] (remove it first)",
                type_name::<T>(),
                key
            );
        }
        by_name.insert(key, Box::new(resource));
    }

    /// Fetches a resource by key.
    ///
    /// # Panics
    /// Panics if nothing of type `T` is registered under `key`.
    pub fn get<T: 'static>(&self, key: &str) -> &T {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|by_name| by_name.get(key))
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .unwrap_or_else(|| {
                panic!(
                    "resource cache: missing {}['{}']",
                    type_name::<T>(),
                    key
                )
            })
    }

    /// Fetches a resource mutably by key.
    ///
    /// # Panics
    /// Panics if nothing of type `T` is registered under `key`.
    pub fn get_mut<T: 'static>(&mut self, key: &str) -> &mut T {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|by_name| by_name.get_mut(key))
            .and_then(|boxed| boxed.downcast_mut::<T>())
            .unwrap_or_else(|| {
                panic!(
                    "resource cache: missing {}['{}']",
                    type_name::<T>(),
                    key
                )
            })
    }

    /// Probe used before conditional remove-and-recreate during resize.
    pub fn exists<T: 'static>(&self, key: &str) -> bool {
        self.entries
            .get(&TypeId::of::<T>())
            .is_some_and(|by_name| by_name.contains_key(key))
    }

    /// Releases ownership of the resource under `key`, returning it.
    ///
    /// # Panics
    /// Panics if nothing of type `T` is registered under `key`.
    pub fn remove<T: 'static>(&mut self, key: &str) -> T {
        let boxed = self
            .entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|by_name| by_name.remove(key))
            .unwrap_or_else(|| {
                panic!(
                    "resource cache: removing absent {}['{}']",
                    type_name::<T>(),
                    key
                )
            });
        *boxed
            .downcast::<T>()
            .expect("type map invariant violated")
    }

    /// Removes the resource under `key` if present; the resize idiom
    /// `replace` = exists -> remove -> add in one call.
    pub fn replace<T: 'static>(&mut self, key: &str, resource: T) {
        if self.exists::<T>(key) {
            self.remove::<T>(key);
        }
        self.add(key, resource);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mut cache = ResourceCache::new();
        cache.add("splits", vec![20.0f32, 40.0, 100.0]);
        assert_eq!(cache.get::<Vec<f32>>("splits").len(), 3);
        assert!(cache.exists::<Vec<f32>>("splits"));

        let removed = cache.remove::<Vec<f32>>("splits");
        assert_eq!(removed, vec![20.0, 40.0, 100.0]);
        assert!(!cache.exists::<Vec<f32>>("splits"));
    }

    #[test]
    fn same_key_different_types_coexist() {
        let mut cache = ResourceCache::new();
        cache.add("scene", 1u32);
        cache.add("scene", String::from("color"));
        assert_eq!(*cache.get::<u32>("scene"), 1);
        assert_eq!(cache.get::<String>("scene"), "color");
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut cache = ResourceCache::new();
        cache.add("frame", 0u64);
        *cache.get_mut::<u64>("frame") += 1;
        assert_eq!(*cache.get::<u64>("frame"), 1);
    }

    #[test]
    fn replace_is_idempotent() {
        let mut cache = ResourceCache::new();
        // Mirrors the resize path: recreating under the same key twice
        // must not trip the duplicate-add contract.
        cache.replace("scene.color", (800u32, 600u32));
        cache.replace("scene.color", (800u32, 600u32));
        assert_eq!(*cache.get::<(u32, u32)>("scene.color"), (800, 600));
    }

    #[test]
    #[should_panic(expected = "duplicate add")]
    fn duplicate_add_panics() {
        let mut cache = ResourceCache::new();
        cache.add("depth", 1u8);
        cache.add("depth", 2u8);
    }

    #[test]
    #[should_panic(expected = "missing")]
    fn get_absent_panics() {
        let cache = ResourceCache::new();
        cache.get::<u32>("nope");
    }

    #[test]
    #[should_panic(expected = "removing absent")]
    fn remove_absent_panics() {
        let mut cache = ResourceCache::new();
        cache.remove::<u32>("nope");
    }
}
