use flathash_hint::{Polymorphic, TypeHintingMode, TypeRegistry};
use flathash_path::{FlatRecord, Flattener};
use flathash_tree::{from_tree, to_tree};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::traits::HashMapper;

/// Maps serde values to flat hash records and back.
///
/// The mapper holds only its configuration, so it is cheap to copy and safe
/// to share between threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlatHashMapper {
    config: MapperConfig,
}

impl FlatHashMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// A mapper that hints every object.
    pub fn neutral() -> Self {
        Self::new(MapperConfig::neutral())
    }

    /// A mapper that hints polymorphic positions only.
    pub fn lenient() -> Self {
        Self::new(MapperConfig::lenient())
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn mode(&self) -> TypeHintingMode {
        self.config.type_hinting
    }

    fn flattener(&self) -> Flattener {
        Flattener::new(self.config.max_depth)
    }

    /// Registers a polymorphic type up front.
    ///
    /// Types are also registered when first serialized, so this is only
    /// needed by processes that read records they did not write.
    pub fn register<T: Polymorphic>(&self) -> MapperResult<()> {
        TypeRegistry::global().register::<T>()?;
        Ok(())
    }

    /// Flattens a value into a new record.
    pub fn to_hash<T: Serialize + ?Sized>(&self, value: &T) -> MapperResult<FlatRecord> {
        let tree = to_tree(value).map_err(MapperError::Serialize)?;
        let tree = self.config.type_hinting.annotate(tree);
        let record = self
            .flattener()
            .flatten(&tree)
            .map_err(MapperError::Flatten)?;
        debug!(
            mode = %self.config.type_hinting,
            entries = record.len(),
            "mapped value to hash"
        );
        Ok(record)
    }

    /// Rebuilds a value from a record.
    pub fn from_hash<T: DeserializeOwned>(&self, record: &FlatRecord) -> MapperResult<T> {
        let tree = self
            .flattener()
            .unflatten(record)
            .map_err(MapperError::Record)?;
        let value = from_tree(tree, TypeRegistry::global()).map_err(MapperError::Deserialize)?;
        debug!(entries = record.len(), "mapped hash to value");
        Ok(value)
    }
}

impl<T: Serialize + DeserializeOwned> HashMapper<T> for FlatHashMapper {
    fn to_hash(&self, value: &T) -> MapperResult<FlatRecord> {
        FlatHashMapper::to_hash(self, value)
    }

    fn from_hash(&self, record: &FlatRecord) -> MapperResult<T> {
        FlatHashMapper::from_hash(self, record)
    }
}
