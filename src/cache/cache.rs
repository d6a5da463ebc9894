use std::future::Future;

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{CacheError, Error};

// Caching - keys

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum CacheKeyType {
    ShoppingList,
    Custom(String),
}

impl CacheKeyType {
    pub fn new<T: ToString + Serialize>(self, key: T) -> CacheKey<T> {
        CacheKey::from(self, key)
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct CacheKey<T: ToString + Serialize> {
    _value: T,
    _type: CacheKeyType,
}

impl<T: ToString + Serialize> CacheKey<T> {
    pub fn from(r#type: CacheKeyType, key: T) -> Self {
        Self {
            _value: key,
            _type: r#type,
        }
    }

    pub fn to_string(&self) -> String {
        self.into()
    }
}

impl<T: ToString + Serialize> From<&CacheKey<T>> for String {
    fn from(value: &CacheKey<T>) -> Self {
        match &value._type {
            CacheKeyType::ShoppingList => format!("shopping-list-{}", value._value.to_string()),
            CacheKeyType::Custom(_) => value._value.to_string(),
        }
    }
}

// Cache - wrappers

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct CachedValue<T: Serialize + Send + Sync + Clone> {
    pub value: T,
}

impl<T: Serialize + DeserializeOwned + Send + Sync + Clone> CachedValue<T> {
    /// Read-through fetch: serve the cached rendition when present, otherwise
    /// run the callback and store its result. An undecodable entry is dropped
    /// and refetched rather than surfaced.
    pub async fn get_or<'a, F, Fut, K>(
        key: CacheKey<K>,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<T, Error>
    where
        K: ToString + Serialize + Clone + Send + Sync,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'a,
    {
        let cached = match get_cache_value::<String, CachedValue<T>>((&key).into(), cache).await {
            Ok(value) => value,
            Err(_) => {
                log::error!("> Failed to decode cached value. Deleting {}", key.to_string());
                if let Err(e) = delete_cache_value(key.to_string(), cache).await {
                    log::error!("> Failed to delete cached value! {e}");
                }
                None
            }
        };

        match cached {
            Some(cached) => {
                log::trace!("> Found {:?}", key.to_string());
                Ok(cached.value)
            }
            None => {
                log::trace!("> Fetching {:?}", key.to_string());
                let value = callback().await?;

                let entry = CachedValue {
                    value: value.clone(),
                };
                if let Err(e) =
                    set_cache_value::<String, CachedValue<T>>((&key).into(), entry, cache).await
                {
                    log::error!("{e:?}");
                }

                Ok(value)
            }
        }
    }
}

/// Drops a cached rendition; mutating actions call this so the next read
/// refetches.
pub async fn invalidate<K: ToString + Serialize>(
    key: CacheKey<K>,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    log::trace!("> Invalidated {}", key.to_string());
    delete_cache_value(key.to_string(), cache).await
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache
        .set(key, value)
        .await
        .map_err(|e| CacheError::from(e).into())?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache
        .del(key)
        .await
        .map_err(|e| CacheError::from(e).into())?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, Error> {
    let value: Option<V> = cache
        .get(key)
        .await
        .map_err(|e| CacheError::from(e).into())?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_user() {
        let key = CacheKeyType::ShoppingList.new(42);
        assert_eq!(key.to_string(), "shopping-list-42");
    }

    #[test]
    fn custom_keys_pass_through() {
        let key = CacheKeyType::Custom(String::from("raw")).new(String::from("tag-index"));
        assert_eq!(key.to_string(), "tag-index");
    }

    #[test]
    fn cached_values_roundtrip_through_serde() {
        let entry = CachedValue {
            value: vec![1, 2, 3],
        };

        let encoded = serde_json::to_string(&entry).unwrap();
        let decoded: CachedValue<Vec<i32>> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.value, vec![1, 2, 3]);
    }
}
