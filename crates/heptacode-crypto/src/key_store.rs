//! Device key persistence and generate-once lifecycle.
//!
//! The codec and crest functions never touch storage; they receive a
//! [`DeviceKey`] argument. [`DeviceKeyProvider`] is the one component that
//! decides whether to load an existing key or mint and persist a new one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

use crate::device_key::DeviceKey;
use crate::error::CryptoError;

/// Secure storage for the device key.
///
/// Implementations wrap whatever the platform offers (keychain, keystore,
/// a protected file). Errors are surfaced, never swallowed.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Load the stored key, or `None` if nothing has been stored yet.
    async fn load(&self) -> Result<Option<DeviceKey>, CryptoError>;

    /// Persist `key`, replacing any previous value.
    async fn store(&self, key: &DeviceKey) -> Result<(), CryptoError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store. Useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    slot: Mutex<Option<DeviceKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with `key`.
    pub fn with_key(key: DeviceKey) -> Self {
        Self {
            slot: Mutex::new(Some(key)),
        }
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn load(&self) -> Result<Option<DeviceKey>, CryptoError> {
        Ok(self.slot.lock().clone())
    }

    async fn store(&self, key: &DeviceKey) -> Result<(), CryptoError> {
        *self.slot.lock() = Some(key.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Stores the key as a hex line in a single file.
///
/// Writes go through a sibling temp file, created with mode 0600 on Unix, and
/// a rename. The temp file is removed if any step after its creation fails.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl KeyStore for FileKeyStore {
    async fn load(&self) -> Result<Option<DeviceKey>, CryptoError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => Zeroizing::new(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        DeviceKey::from_hex(contents.trim()).map(Some)
    }

    async fn store(&self, key: &DeviceKey) -> Result<(), CryptoError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.temp_path();
        remove_if_present(&tmp).await?;
        let mut file = create_private(&tmp).await?;

        let encoded = key.to_hex();
        let written = async {
            file.write_all(encoded.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = remove_if_present(&tmp).await {
                tracing::warn!(error = %cleanup, "failed to remove temporary key file");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// Create `path` exclusively, readable only by the owner on Unix.
async fn create_private(path: &Path) -> std::io::Result<tokio::fs::File> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path).await
}

async fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Generate-once / load-once access to the device key.
///
/// The first successful [`get`](Self::get) either loads the stored key or
/// generates and persists a new one. Every later call, including concurrent
/// ones, returns the same key. A failed initialization is not cached.
pub struct DeviceKeyProvider<S: KeyStore> {
    store: S,
    key: OnceCell<Arc<DeviceKey>>,
}

impl<S: KeyStore> DeviceKeyProvider<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: OnceCell::new(),
        }
    }

    /// Get the device key, initializing it on first use.
    pub async fn get(&self) -> Result<Arc<DeviceKey>, CryptoError> {
        let key = self
            .key
            .get_or_try_init(|| async {
                if let Some(existing) = self.store.load().await? {
                    tracing::debug!("loaded existing device key");
                    return Ok::<_, CryptoError>(Arc::new(existing));
                }
                let fresh = DeviceKey::generate()?;
                self.store.store(&fresh).await?;
                tracing::info!("generated and persisted new device key");
                Ok(Arc::new(fresh))
            })
            .await?;
        Ok(Arc::clone(key))
    }

    /// Whether the key has been initialized in this process.
    pub fn is_initialized(&self) -> bool {
        self.key.initialized()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyStore + std::fmt::Debug> std::fmt::Debug for DeviceKeyProvider<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceKeyProvider")
            .field("store", &self.store)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_starts_empty() {
        let store = MemoryKeyStore::new();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn provider_generates_once_and_persists() {
        let provider = DeviceKeyProvider::new(MemoryKeyStore::new());
        assert!(!provider.is_initialized());

        let first = provider.get().await.unwrap();
        let second = provider.get().await.unwrap();
        assert_eq!(*first, *second);
        assert!(provider.is_initialized());

        let stored = provider.store().load().await.unwrap().unwrap();
        assert_eq!(stored, *first);
    }

    #[tokio::test]
    async fn provider_reuses_existing_key() {
        let existing = DeviceKey::from_bytes([7u8; 32]);
        let provider = DeviceKeyProvider::new(MemoryKeyStore::with_key(existing.clone()));
        assert_eq!(*provider.get().await.unwrap(), existing);
    }

    #[tokio::test]
    async fn concurrent_first_use_yields_one_key() {
        let provider = Arc::new(DeviceKeyProvider::new(MemoryKeyStore::new()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let p = Arc::clone(&provider);
                tokio::spawn(async move { p.get().await.unwrap() })
            })
            .collect();

        let mut keys = Vec::new();
        for h in handles {
            keys.push(h.await.unwrap());
        }
        assert!(keys.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("device.key"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_survives_new_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("device.key");

        let first = DeviceKeyProvider::new(FileKeyStore::new(&path))
            .get()
            .await
            .unwrap();
        let second = DeviceKeyProvider::new(FileKeyStore::new(&path))
            .get()
            .await
            .unwrap();
        assert_eq!(*first, *second);
        assert!(!dir.path().join("keys").join("device.key.tmp").exists());
    }

    #[tokio::test]
    async fn file_store_rejects_corrupt_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.key");
        tokio::fs::write(&path, "zz-not-a-key").await.unwrap();

        let provider = DeviceKeyProvider::new(FileKeyStore::new(&path));
        assert!(matches!(
            provider.get().await,
            Err(CryptoError::MalformedStoredKey(_))
        ));
        // The corrupt file is left in place for inspection.
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "zz-not-a-key");
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.key");
        // A non-empty directory at the target path makes the rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupant"), b"x").unwrap();

        let result = FileKeyStore::new(&path)
            .store(&DeviceKey::from_bytes([9u8; 32]))
            .await;
        assert!(matches!(result, Err(CryptoError::Io(_))));
        assert!(!dir.path().join("device.key.tmp").exists());
    }

    #[tokio::test]
    async fn stale_temp_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.key");
        std::fs::write(dir.path().join("device.key.tmp"), b"leftover").unwrap();

        let key = DeviceKey::from_bytes([3u8; 32]);
        let store = FileKeyStore::new(&path);
        store.store(&key).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(key));
        assert!(!dir.path().join("device.key.tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.key");
        FileKeyStore::new(&path)
            .store(&DeviceKey::from_bytes([1u8; 32]))
            .await
            .unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
