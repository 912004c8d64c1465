use std::hash::Hash;

/// A cache key with a canonical form.
///
/// [`ResourceCache`](crate::ResourceCache) normalizes every key before
/// lookup, so keys that normalize to the same value share one resource.
pub trait NormalizedKey: Eq + Hash + Clone + Send + Sync + 'static {
  /// Returns the canonical form of this key.
  fn normalize(&self) -> Self;
}

/// Strings are compared case-insensitively, ignoring surrounding whitespace.
impl NormalizedKey for String {
  fn normalize(&self) -> Self {
    self.trim().to_lowercase()
  }
}

macro_rules! identity_key {
  ($($ty:ty),* $(,)?) => {
    $(
      impl NormalizedKey for $ty {
        #[inline]
        fn normalize(&self) -> Self {
          *self
        }
      }
    )*
  };
}

identity_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);
