use flathash_path::FlatRecord;

use crate::error::MapperResult;

/// Converts values of type `T` to and from flat hash records.
///
/// This is the whole contract a record store needs from a mapper.
/// Implementations must satisfy:
/// - `from_hash(&to_hash(v)?)? == v` for every supported value.
/// - A failed call produces no partial record and no partial value.
/// - Calls share no mutable state apart from the type registry, so a mapper
///   may be used from many threads at once.
pub trait HashMapper<T>: Send + Sync {
    /// Flattens a value into a new record.
    fn to_hash(&self, value: &T) -> MapperResult<FlatRecord>;

    /// Rebuilds a value from a record.
    fn from_hash(&self, record: &FlatRecord) -> MapperResult<T>;

    /// Flattens several values, failing on the first error.
    fn to_hash_batch(&self, values: &[T]) -> MapperResult<Vec<FlatRecord>> {
        values.iter().map(|value| self.to_hash(value)).collect()
    }
}
