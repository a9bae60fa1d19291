//! File naming for collections
//!
//! The default collection uses fixed names in its directory. Named
//! collections live side by side in the registry directory as
//! `<name>.index` + `<name>_metadata.msgpack`; the `.index` suffix is what
//! collection discovery scans for.

use std::path::{Path, PathBuf};

/// Vector file of the default collection
pub const DEFAULT_VECTOR_FILE: &str = "xmodal_index.bin";

/// Metadata file of the default collection
pub const DEFAULT_METADATA_FILE: &str = "index_metadata.msgpack";

/// Suffix of a named collection's vector file
pub const NAMED_VECTOR_SUFFIX: &str = ".index";

/// Suffix of a named collection's metadata file
pub const NAMED_METADATA_SUFFIX: &str = "_metadata.msgpack";

/// The file pair backing one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPaths {
    vector_file: PathBuf,
    metadata_file: PathBuf,
}

impl CollectionPaths {
    /// Explicit pair
    pub fn new(vector_file: impl Into<PathBuf>, metadata_file: impl Into<PathBuf>) -> Self {
        CollectionPaths {
            vector_file: vector_file.into(),
            metadata_file: metadata_file.into(),
        }
    }

    /// Default collection files inside `dir`
    pub fn default_in(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_VECTOR_FILE), dir.join(DEFAULT_METADATA_FILE))
    }

    /// Named collection files inside `dir`
    ///
    /// The name is not validated here.
    pub fn named(dir: &Path, name: &str) -> Self {
        Self::new(
            dir.join(format!("{name}{NAMED_VECTOR_SUFFIX}")),
            dir.join(format!("{name}{NAMED_METADATA_SUFFIX}")),
        )
    }

    /// Path of the vector file
    pub fn vector_file(&self) -> &Path {
        &self.vector_file
    }

    /// Path of the metadata file
    pub fn metadata_file(&self) -> &Path {
        &self.metadata_file
    }
}

/// Collection name for a `<name>.index` file, `None` for anything else
pub fn collection_name_from_index_file(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.strip_suffix(NAMED_VECTOR_SUFFIX)?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_paths() {
        let paths = CollectionPaths::named(Path::new("/data/indexes"), "pets");
        assert_eq!(paths.vector_file(), Path::new("/data/indexes/pets.index"));
        assert_eq!(
            paths.metadata_file(),
            Path::new("/data/indexes/pets_metadata.msgpack")
        );
    }

    #[test]
    fn test_default_paths() {
        let paths = CollectionPaths::default_in(Path::new("/srv"));
        assert_eq!(paths.vector_file(), Path::new("/srv/xmodal_index.bin"));
        assert_eq!(
            paths.metadata_file(),
            Path::new("/srv/index_metadata.msgpack")
        );
    }

    #[test]
    fn test_name_from_index_file() {
        assert_eq!(
            collection_name_from_index_file(Path::new("/d/pets.index")),
            Some("pets".to_string())
        );
        assert_eq!(
            collection_name_from_index_file(Path::new("/d/pets_metadata.msgpack")),
            None
        );
        assert_eq!(collection_name_from_index_file(Path::new("/d/.index")), None);
        assert_eq!(
            collection_name_from_index_file(Path::new("/d/pets.index.tmp")),
            None
        );
    }
}
