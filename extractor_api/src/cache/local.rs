use std::{fs, io::ErrorKind, path::PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use super::api::MapAPI;

/// Cache stored as one file per key, under `<cache dir>/tubescope/<pool>/<key>`.
#[derive(Clone)]
pub struct LocalCache {
    base_location: PathBuf,
}

impl LocalCache {
    pub fn from_location(base_location: PathBuf) -> Self {
        LocalCache { base_location }
    }

    fn entry(&self, pool: &str, key: &str) -> PathBuf {
        self.base_location.join(pool).join(sanitize(key))
    }
}

// keys are derived from remote URLs, never let them escape the pool directory
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[async_trait]
impl MapAPI for LocalCache {
    fn new() -> Self {
        LocalCache {
            base_location: std::env::var("XDG_CACHE_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".cache")))
                .unwrap_or_else(|_| std::env::temp_dir())
                .join("tubescope"),
        }
    }

    async fn get(&self, pool: &str, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.entry(pool, key)) {
            Ok(c) => Ok(Some(c)),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(None)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn set(&self, pool: &str, key: &str, data: &[u8]) -> Result<()> {
        fs::create_dir_all(self.base_location.join(pool))?;
        fs::write(self.entry(pool, key), data).map_err(anyhow::Error::from)
    }

    async fn has(&self, pool: &str, key: &str) -> Result<bool> {
        self.entry(pool, key)
            .try_exists()
            .map_err(anyhow::Error::from)
    }

    async fn delete(&self, pool: &str, key: &str) -> Result<()> {
        match fs::remove_file(self.entry(pool, key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
