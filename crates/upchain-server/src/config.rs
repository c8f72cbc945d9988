use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use upchain_fingerprint::DocumentKind;
use upchain_journal::JournalConfig;
use upchain_types::OwnerId;

use crate::error::{ServerError, ServerResult};

const DEFAULT_EXTENSIONS: [&str; 12] = [
    "txt", "pdf", "doc", "docx", "jpg", "jpeg", "png", "dcm", "mp3", "wav", "mp4", "avi",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory uploaded files are written to.
    pub upload_dir: PathBuf,
    /// Lowercase extensions accepted for upload.
    pub allowed_extensions: BTreeSet<String>,
    /// Largest accepted request body, in bytes.
    pub max_upload_size: usize,
    /// Block journal location. Without one the chain lives only in memory.
    pub journal_path: Option<PathBuf>,
    pub journal: JournalConfig,
    /// Read size for raw-byte fingerprints.
    pub hash_chunk_size: usize,
    /// Bearer token to owner.
    pub tokens: BTreeMap<String, OwnerId>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            upload_dir: PathBuf::from("./uploads"),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_upload_size: 64 * 1024 * 1024,
            journal_path: None,
            journal: JournalConfig::default(),
            hash_chunk_size: 4096,
            tokens: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let mut config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.allowed_extensions = config
            .allowed_extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        config.check()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Case-insensitive membership test against `allowed_extensions`.
    pub fn is_allowed(&self, ext: &str) -> bool {
        self.allowed_extensions.contains(&ext.to_ascii_lowercase())
    }

    /// Allowed extensions that are fingerprinted by extracted text.
    pub fn text_bearing_extensions(&self) -> Vec<&str> {
        self.allowed_extensions
            .iter()
            .map(String::as_str)
            .filter(|e| DocumentKind::from_extension(e).is_some())
            .collect()
    }

    fn check(&self) -> ServerResult<()> {
        if self.hash_chunk_size == 0 {
            return Err(ServerError::Config("hash_chunk_size must be positive".into()));
        }
        if let Some((token, _)) = self.tokens.iter().find(|(_, owner)| owner.is_genesis()) {
            let shown: String = token.chars().take(4).collect();
            return Err(ServerError::Config(format!(
                "token {shown}... maps to owner 0, which is reserved for genesis"
            )));
        }
        Ok(())
    }
}
