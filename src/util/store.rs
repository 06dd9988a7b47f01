use std::{io::ErrorKind, path::PathBuf};

use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};
use tokio::fs;
use tracing::{debug, info};

use crate::{
    errors::Result,
    util::{format_local, now_local},
};

const NAME_RANDOM_LEN: usize = 12;

/// Directory of uploaded pictures, addressed by generated file name.
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub async fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// `%Y%m%d%H%M%S-<random>.<ext>`
    pub fn generate_name(ext: &str) -> String {
        let timestamp = format_local(&now_local(), "%Y%m%d%H%M%S");
        let random: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(NAME_RANDOM_LEN)
            .map(char::from)
            .collect();
        format!("{timestamp}-{random}.{ext}")
    }

    pub async fn persist(&self, data: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.root).await?;
        let name = Self::generate_name("png");
        fs::write(self.root.join(&name), data).await?;
        info!(target: "uploads", %name, bytes = data.len(), "upload stored");
        Ok(name)
    }

    /// `None` for names that could escape the directory or do not exist.
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if !is_plain_name(name) {
            return Ok(None);
        }
        match fs::read(self.root.join(name)).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Regular files directly inside the store, in directory order.
    pub async fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(names),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// A uniformly drawn stored picture for the gallery, `None` when empty.
    pub async fn random(&self) -> Result<Option<(String, Vec<u8>)>> {
        let names = self.names().await?;
        if names.is_empty() {
            return Ok(None);
        }
        let name = &names[OsRng.gen_range(0..names.len())];
        debug!(target: "uploads", %name, of = names.len(), "random picture drawn");
        Ok(self.read(name).await?.map(|data| (name.clone(), data)))
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\'])
}
