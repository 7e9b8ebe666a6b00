//! Token Storage Module
//!
//! Persists the session bearer token, encrypted at rest with Windows DPAPI.

use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, error, debug};

#[cfg(windows)]
use windows::Win32::Security::Cryptography::{
    CryptProtectData, CryptUnprotectData, CRYPTPROTECT_UI_FORBIDDEN,
};
#[cfg(windows)]
use windows::Win32::Security::Cryptography::CRYPT_INTEGER_BLOB;

const TOKEN_FILE: &str = "session-token.dat";

/// On-disk wrapper around the opaque token.
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Durable store for the single session token.
///
/// Exactly one token file under one fixed key; the session context is the
/// only writer.
pub struct TokenStore {
    storage_path: PathBuf,
}

impl TokenStore {
    /// Store rooted at the platform-local data directory.
    pub fn new() -> Self {
        let storage_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("EkoKampus");

        debug!("Token store initialized at: {:?}", storage_path);

        Self { storage_path }
    }

    /// Store rooted at an explicit directory.
    pub fn at(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
        }
    }

    fn token_path(&self) -> PathBuf {
        self.storage_path.join(TOKEN_FILE)
    }

    /// Read the persisted token.
    ///
    /// An absent token is `Ok(None)`; an unreadable or undecryptable file
    /// is a `StorageError`.
    pub fn get(&self) -> Result<Option<String>, StorageError> {
        let file_path = self.token_path();

        if !file_path.exists() {
            return Ok(None);
        }

        let encrypted = std::fs::read(&file_path)
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let decrypted = decrypt(&encrypted)?;

        let json = String::from_utf8(decrypted)
            .map_err(|e| StorageError::Decryption(e.to_string()))?;

        let record: StoredToken = serde_json::from_str(&json)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Some(record.token))
    }

    /// Persist a non-empty token, replacing any prior value.
    pub fn set(&self, token: &str) -> Result<(), StorageError> {
        if token.is_empty() {
            return Err(StorageError::EmptyToken);
        }

        if let Err(e) = std::fs::create_dir_all(&self.storage_path) {
            error!("Failed to create storage directory: {}", e);
            return Err(StorageError::Io(e.to_string()));
        }

        let record = StoredToken {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let encrypted = encrypt(json.as_bytes())?;

        std::fs::write(self.token_path(), encrypted)
            .map_err(|e| StorageError::Io(e.to_string()))?;

        info!("Session token persisted");
        Ok(())
    }

    /// Remove any persisted token. Idempotent.
    pub fn clear(&self) -> Result<(), StorageError> {
        let file_path = self.token_path();

        if file_path.exists() {
            std::fs::remove_file(&file_path)
                .map_err(|e| StorageError::Io(e.to_string()))?;
            info!("Session token deleted");
        }

        Ok(())
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
fn encrypt(data: &[u8]) -> Result<Vec<u8>, StorageError> {
    use std::ptr::null_mut;

    let input = CRYPT_INTEGER_BLOB {
        cbData: data.len() as u32,
        pbData: data.as_ptr() as *mut u8,
    };

    let mut output = CRYPT_INTEGER_BLOB {
        cbData: 0,
        pbData: null_mut(),
    };

    unsafe {
        let result = CryptProtectData(
            &input,
            None,
            None,
            None,
            None,
            CRYPTPROTECT_UI_FORBIDDEN,
            &mut output,
        );

        if result.is_err() {
            return Err(StorageError::Encryption("DPAPI encryption failed".into()));
        }

        let encrypted = std::slice::from_raw_parts(
            output.pbData,
            output.cbData as usize,
        ).to_vec();

        // Free the memory allocated by CryptProtectData
        windows::Win32::Foundation::LocalFree(
            windows::Win32::Foundation::HLOCAL(output.pbData as *mut std::ffi::c_void)
        );

        Ok(encrypted)
    }
}

#[cfg(windows)]
fn decrypt(data: &[u8]) -> Result<Vec<u8>, StorageError> {
    use std::ptr::null_mut;

    let input = CRYPT_INTEGER_BLOB {
        cbData: data.len() as u32,
        pbData: data.as_ptr() as *mut u8,
    };

    let mut output = CRYPT_INTEGER_BLOB {
        cbData: 0,
        pbData: null_mut(),
    };

    unsafe {
        let result = CryptUnprotectData(
            &input,
            None,
            None,
            None,
            None,
            CRYPTPROTECT_UI_FORBIDDEN,
            &mut output,
        );

        if result.is_err() {
            return Err(StorageError::Decryption("DPAPI decryption failed".into()));
        }

        let decrypted = std::slice::from_raw_parts(
            output.pbData,
            output.cbData as usize,
        ).to_vec();

        // Free the memory allocated by CryptUnprotectData
        windows::Win32::Foundation::LocalFree(
            windows::Win32::Foundation::HLOCAL(output.pbData as *mut std::ffi::c_void)
        );

        Ok(decrypted)
    }
}

#[cfg(not(windows))]
fn encrypt(data: &[u8]) -> Result<Vec<u8>, StorageError> {
    // Fallback for non-Windows (development only)
    Ok(data.to_vec())
}

#[cfg(not(windows))]
fn decrypt(data: &[u8]) -> Result<Vec<u8>, StorageError> {
    // Fallback for non-Windows (development only)
    Ok(data.to_vec())
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Refusing to store an empty token")]
    EmptyToken,
}
