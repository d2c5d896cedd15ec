//! Response wrapper with cache status

use chrono::DateTime;
use chrono::Utc;

/// The outcome of a page request, with where the rows came from.
///
/// # Example
///
/// ```ignore
/// let response = pagination.fetch_data(FetchOptions::new(2, 10)).await?;
///
/// if response.is_cached() {
///     println!("Page 2 from cache, stored at {:?}", response.cached_at());
/// }
///
/// let rows = response.into_inner();
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    data: T,
    /// Information about whether this response came from cache.
    pub cache: CacheStatus,
}

impl<T> Response<T> {
    /// Creates a response for a request that bypassed the cache.
    pub fn bypassed(data: T) -> Self {
        Self {
            data,
            cache: CacheStatus::Bypassed,
        }
    }

    /// Creates a response for a cache miss (fresh fetch).
    pub fn cache_miss(data: T, fetched_at: DateTime<Utc>) -> Self {
        Self {
            data,
            cache: CacheStatus::Miss { fetched_at },
        }
    }

    /// Creates a response served from the cache.
    pub fn cache_hit(data: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            data,
            cache: CacheStatus::Hit { cached_at },
        }
    }

    /// Returns `true` if this response came from the cache.
    pub fn is_cached(&self) -> bool {
        self.cache.is_hit()
    }

    /// Returns `true` if the rows were fetched from the backend.
    pub fn is_fresh(&self) -> bool {
        !self.is_cached()
    }

    /// Returns when the rows were cached, for cache hits.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        match &self.cache {
            CacheStatus::Hit { cached_at } => Some(*cached_at),
            _ => None,
        }
    }

    /// Returns a reference to the inner data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the response and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Maps the inner data using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        Response {
            data: f(self.data),
            cache: self.cache,
        }
    }
}

/// Cache status for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The cache was bypassed (`force_refresh`).
    Bypassed,
    /// Cache miss - rows were freshly fetched.
    Miss {
        /// When the rows were fetched.
        fetched_at: DateTime<Utc>,
    },
    /// Cache hit - rows were served from the cache.
    Hit {
        /// When the page was cached.
        cached_at: DateTime<Utc>,
    },
}

impl CacheStatus {
    /// Returns `true` if this is a cache hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    /// Returns `true` if this is a cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss { .. })
    }

    /// Returns `true` if the cache was bypassed.
    pub fn is_bypassed(&self) -> bool {
        matches!(self, Self::Bypassed)
    }
}
