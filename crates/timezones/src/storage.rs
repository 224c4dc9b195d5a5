//! JSON data files.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// A serde-backed file under the plugin's data directory.
pub struct DataFile<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> DataFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// `<dir>/<name>.json`
    pub fn in_dir(dir: impl AsRef<Path>, name: &str) -> Self {
        Self::new(dir.as_ref().join(format!("{name}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and parse the file. A literal `null` yields `None`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn read(&self) -> Result<Option<T>> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str::<Option<T>>(&contents)?)
    }

    /// Serialize `value` to the file, replacing it atomically.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::trace!("Wrote {}", self.path.display());
        Ok(())
    }

    /// Read the file, falling back to `T::default()` on any problem.
    pub fn load_or_default(&self) -> T {
        match self.read() {
            Ok(Some(value)) => {
                tracing::info!("Loaded {}", self.path.display());
                value
            }
            Ok(None) => {
                tracing::warn!("{} is empty, creating new datafile", self.path.display());
                T::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Couldn't load {} ({e}), creating new datafile",
                    self.path.display()
                );
                T::default()
            }
        }
    }
}
