//! Block factory registry
//!
//! Hosts instantiate adapted blocks by path. Paths mirror the namespace of the legacy class,
//! e.g. `gr::blocks::copy` registers at `/gr/blocks/copy`. Descriptions are published as JSON
//! under [`DOCS_PREFIX`] followed by the block path.
use std::collections::BTreeMap;
use std::fmt;

use crate::runtime::Block;
use crate::runtime::BlockDescription;
use crate::runtime::Error;
use crate::runtime::Pmt;
use crate::runtime::Result;

/// Prefix of description entries
pub const DOCS_PREFIX: &str = "/blocks/docs";

/// Factory creating a block from host arguments
pub type BlockFactory = Box<dyn Fn(&[Pmt]) -> Result<Box<dyn Block>> + Send + Sync>;

/// Registry path of a class in a `::` separated namespace.
pub fn block_path(namespace: &str, class: &str) -> String {
    let ns = namespace.trim_matches(':').replace("::", "/");
    if ns.is_empty() {
        format!("/{class}")
    } else {
        format!("/{ns}/{class}")
    }
}

/// Path of the description entry of a block.
pub fn docs_path(path: &str) -> String {
    format!("{DOCS_PREFIX}{path}")
}

/// Block registry
#[derive(Default)]
pub struct BlockRegistry {
    factories: BTreeMap<String, BlockFactory>,
    docs: BTreeMap<String, BlockDescription>,
}

impl BlockRegistry {
    /// Create empty registry
    pub fn new() -> BlockRegistry {
        BlockRegistry::default()
    }

    /// Create registry with the blocks of this crate.
    pub fn with_builtin() -> BlockRegistry {
        let mut r = BlockRegistry::new();
        if let Err(e) = crate::blocks::register(&mut r) {
            warn!("registering builtin blocks failed: {e}");
        }
        r
    }

    /// Register a factory.
    pub fn register<F>(&mut self, path: &str, factory: F) -> Result<(), Error>
    where
        F: Fn(&[Pmt]) -> Result<Box<dyn Block>> + Send + Sync + 'static,
    {
        if self.factories.contains_key(path) {
            return Err(Error::DuplicateBlock(path.to_string()));
        }
        debug!("registering block {path}");
        self.factories.insert(path.to_string(), Box::new(factory));
        Ok(())
    }

    /// Register the description of a block, keyed by its path.
    pub fn register_description(&mut self, description: BlockDescription) -> Result<(), Error> {
        let path = description.path.clone();
        if self.docs.contains_key(&path) {
            return Err(Error::DuplicateBlock(docs_path(&path)));
        }
        if !self.factories.contains_key(&path) {
            warn!("description for {path} without factory");
        }
        self.docs.insert(path, description.normalized());
        Ok(())
    }

    /// Instantiate a block.
    pub fn make(&self, path: &str, args: &[Pmt]) -> Result<Box<dyn Block>, Error> {
        let factory = self
            .factories
            .get(path)
            .ok_or_else(|| Error::UnknownBlock(path.to_string()))?;
        factory(args).map_err(|e| Error::InvalidArguments(format!("{path}: {e:#}")))
    }

    /// Check if a factory is registered at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.factories.contains_key(path)
    }

    /// Registered paths, sorted
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Description of the block at `path`
    pub fn description(&self, path: &str) -> Option<&BlockDescription> {
        self.docs.get(path)
    }

    /// Description of the block at `path` as JSON
    pub fn description_json(&self, path: &str) -> Option<String> {
        match self.docs.get(path)?.to_json() {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("serializing description of {path} failed: {e}");
                None
            }
        }
    }
}

impl fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("docs", &self.docs.keys().collect::<Vec<_>>())
            .finish()
    }
}
