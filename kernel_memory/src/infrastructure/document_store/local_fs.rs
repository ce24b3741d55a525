// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Local-disk [`DocumentStore`]: files live at
//! `<root>/<index>/<document_id>/<file_name>`. Writes go to a sibling
//! `.tmp` file and are renamed into place, so a reader never observes a
//! torn write (spec.md §4.3's single-writer guarantee).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::stream;
use tokio::fs;
use tokio::io::AsyncReadExt;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, FileStream};
use kernel_memory_domain::value_objects::{DocumentId, IndexName};

pub struct LocalFsDocumentStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl LocalFsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), tmp_counter: AtomicU64::new(0) }
    }

    fn index_dir(&self, index: &IndexName) -> PathBuf {
        self.root.join(index.as_str())
    }

    fn document_dir(&self, index: &IndexName, document_id: &DocumentId) -> PathBuf {
        self.index_dir(index).join(document_id.as_str())
    }

    fn tmp_path(&self, dir: &Path) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        dir.join(format!(".tmp-{n}-{}", std::process::id()))
    }

    async fn not_found_if_missing(path: &Path, what: &str) -> Result<(), KmError> {
        if !fs::try_exists(path).await? {
            return Err(KmError::not_found(what.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalFsDocumentStore {
    async fn create_index(&self, index: &IndexName) -> Result<(), KmError> {
        fs::create_dir_all(self.index_dir(index)).await?;
        Ok(())
    }

    async fn delete_index(&self, index: &IndexName) -> Result<(), KmError> {
        let dir = self.index_dir(index);
        if fs::try_exists(&dir).await? {
            fs::remove_dir_all(&dir).await?;
        }
        Ok(())
    }

    async fn create_document(&self, index: &IndexName, document_id: &DocumentId) -> Result<(), KmError> {
        fs::create_dir_all(self.document_dir(index, document_id)).await?;
        Ok(())
    }

    async fn delete_document(&self, index: &IndexName, document_id: &DocumentId) -> Result<(), KmError> {
        let dir = self.document_dir(index, document_id);
        if fs::try_exists(&dir).await? {
            fs::remove_dir_all(&dir).await?;
        }
        Ok(())
    }

    async fn empty_document(&self, index: &IndexName, document_id: &DocumentId) -> Result<(), KmError> {
        let dir = self.document_dir(index, document_id);
        Self::not_found_if_missing(&dir, &format!("document '{}'", document_id.as_str())).await?;
        fs::remove_dir_all(&dir).await?;
        fs::create_dir_all(&dir).await?;
        Ok(())
    }

    async fn write_file(&self, index: &IndexName, document_id: &DocumentId, name: &str, content: Vec<u8>) -> Result<(), KmError> {
        let dir = self.document_dir(index, document_id);
        fs::create_dir_all(&dir).await?;
        let target = dir.join(name);
        let tmp = self.tmp_path(&dir);
        fs::write(&tmp, &content).await?;
        fs::rename(&tmp, &target).await?;
        Ok(())
    }

    async fn read_file(&self, index: &IndexName, document_id: &DocumentId, name: &str) -> Result<FileStream, KmError> {
        let path = self.document_dir(index, document_id).join(name);
        Self::not_found_if_missing(&path, &format!("file '{name}'")).await?;
        let mut file = fs::File::open(&path).await?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer).await?;
        Ok(Box::pin(stream::once(async move { Ok(buffer) })))
    }

    async fn list_files(&self, index: &IndexName, document_id: &DocumentId) -> Result<Vec<String>, KmError> {
        let dir = self.document_dir(index, document_id);
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }
        let mut entries = fs::read_dir(&dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };
            if !name.starts_with(".tmp-") {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn exists(&self, index: &IndexName, document_id: &DocumentId) -> Result<bool, KmError> {
        Ok(fs::try_exists(self.document_dir(index, document_id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips_bytes() {
        let temp = tempfile::tempdir().unwrap();
        let store = LocalFsDocumentStore::new(temp.path());
        let index = IndexName::new("default");
        let doc_id = DocumentId::new("d1");
        store.create_document(&index, &doc_id).await.unwrap();
        store.write_file(&index, &doc_id, "a.txt", b"hello".to_vec()).await.unwrap();

        let bytes = store.read_file_to_vec(&index, &doc_id, "a.txt").await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let store = LocalFsDocumentStore::new(temp.path());
        let index = IndexName::new("default");
        let doc_id = DocumentId::new("d1");
        store.create_document(&index, &doc_id).await.unwrap();

        let err = store.read_file_to_vec(&index, &doc_id, "missing.txt").await.unwrap_err();
        assert!(matches!(err, KmError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_document_removes_all_files() {
        let temp = tempfile::tempdir().unwrap();
        let store = LocalFsDocumentStore::new(temp.path());
        let index = IndexName::new("default");
        let doc_id = DocumentId::new("d1");
        store.create_document(&index, &doc_id).await.unwrap();
        store.write_file(&index, &doc_id, "a.txt", b"x".to_vec()).await.unwrap();

        store.delete_document(&index, &doc_id).await.unwrap();
        assert!(!store.exists(&index, &doc_id).await.unwrap());
    }

    #[tokio::test]
    async fn list_files_excludes_temp_artifacts() {
        let temp = tempfile::tempdir().unwrap();
        let store = LocalFsDocumentStore::new(temp.path());
        let index = IndexName::new("default");
        let doc_id = DocumentId::new("d1");
        store.create_document(&index, &doc_id).await.unwrap();
        store.write_file(&index, &doc_id, "a.txt", b"x".to_vec()).await.unwrap();
        store.write_file(&index, &doc_id, "b.txt", b"y".to_vec()).await.unwrap();

        let files = store.list_files(&index, &doc_id).await.unwrap();
        assert_eq!(files, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }
}
