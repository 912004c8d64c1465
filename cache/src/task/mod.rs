//! This module contains the background tasks for the cache, currently the
//! janitor that sweeps expired entries.

pub(crate) mod janitor;
