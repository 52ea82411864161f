use serde::Deserialize;
use serde::Serialize;

/// Description of a registered block.
///
/// Serialized to JSON and published next to the block factory so that hosts can render
/// documentation and parameter forms without instantiating the block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockDescription {
    /// Registry path, e.g. `/blocks/copy`
    pub path: String,
    /// Human readable name
    pub name: String,
    /// Search keywords
    pub keywords: Vec<String>,
    /// Category paths, each starting with `/`
    pub categories: Vec<String>,
    /// Factory arguments, in call order
    pub args: Vec<ArgDescription>,
    /// Documentation, one entry per line
    pub docs: Vec<String>,
}

/// Description of a single factory argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgDescription {
    /// Argument name
    pub name: String,
    /// Expected PMT kind, e.g. `U64`
    pub kind: String,
    /// Default value, rendered as a PMT string
    pub default: Option<String>,
}

impl BlockDescription {
    /// Normalize categories so that every entry starts with `/`.
    pub fn normalized(mut self) -> Self {
        for c in self.categories.iter_mut() {
            if !c.starts_with('/') {
                c.insert(0, '/');
            }
        }
        self
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
