use std::path::{Path, PathBuf};

/// The environment file baked into the runtime image.
///
/// Only keys are kept; values may be secrets and never leave the file.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    keys: Vec<String>,
}

impl EnvFile {
    /// Parse the file with dotenv syntax.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.is_file() {
            return Err(crate::Error::EnvFileMissing {
                path: path.to_path_buf(),
            });
        }

        let parse_err = |e| crate::Error::EnvFileParse {
            path: path.to_path_buf(),
            source: e,
        };
        let mut keys = Vec::new();
        for item in dotenvy::from_path_iter(path).map_err(parse_err)? {
            let (key, _value) = item.map_err(parse_err)?;
            keys.push(key);
        }

        tracing::debug!(path = %path.display(), keys = keys.len(), "environment file parsed");
        Ok(Self {
            path: path.to_path_buf(),
            keys,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Required keys that the file does not define, in the order given.
    pub fn missing<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|key| !self.keys.contains(*key))
            .map(String::as_str)
            .collect()
    }

    /// Error unless every required key is defined.
    pub fn require(&self, required: &[String]) -> crate::Result<()> {
        let missing = self.missing(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::EnvKeysMissing {
                path: self.path.clone(),
                keys: missing.into_iter().map(str::to_owned).collect(),
            })
        }
    }
}
