//! Documents visible to the caller, keyed by document id

use remote_sheets_core::{Enumerate, LazyOrderedMap};
use tracing::debug;

use crate::client::Client;
use crate::error::Result;
use crate::spreadsheet::Spreadsheet;

struct DocumentSource<'c> {
    client: &'c Client,
}

impl<'c> Enumerate for DocumentSource<'c> {
    type Key = String;
    type Value = Spreadsheet<'c>;
    type Error = crate::Error;

    fn enumerate(&mut self) -> Result<Vec<(String, Spreadsheet<'c>)>> {
        let files = self.client.call(|service| service.list_documents())?;
        debug!(count = files.len(), "listed documents");
        Ok(files
            .into_iter()
            .map(|file| (file.id.clone(), Spreadsheet::new(self.client, file.id)))
            .collect())
    }

    /// Fetch one document directly instead of listing everything
    fn construct(&mut self, key: &String) -> Result<Option<Spreadsheet<'c>>> {
        self.client.open(key).map(Some)
    }
}

/// Lazily listed documents, in the order the listing returned them.
///
/// Looking up an id before the listing ran fetches just that document.
pub struct Collection<'c> {
    documents: LazyOrderedMap<DocumentSource<'c>>,
}

impl<'c> Collection<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        Self {
            documents: LazyOrderedMap::new(DocumentSource { client }),
        }
    }

    /// The document with the given id
    pub fn get(&mut self, key: &str) -> Result<&mut Spreadsheet<'c>> {
        self.documents.get(key)
    }

    /// The document at a position in listing order (negative counts from the end)
    pub fn get_index(&mut self, index: isize) -> Result<&mut Spreadsheet<'c>> {
        Ok(self.documents.get_index(index)?.1)
    }

    pub fn contains(&mut self, key: &str) -> Result<bool> {
        self.documents.contains_key(key)
    }

    pub fn keys(&mut self) -> Result<Vec<String>> {
        Ok(self.documents.keys()?.cloned().collect())
    }

    pub fn iter_mut(
        &mut self,
    ) -> Result<impl Iterator<Item = (&String, &mut Spreadsheet<'c>)> + '_> {
        self.documents.iter_mut()
    }

    pub fn len(&mut self) -> Result<usize> {
        self.documents.len()
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        self.documents.is_empty()
    }

    pub fn is_populated(&self) -> bool {
        self.documents.is_populated()
    }

    /// Forget the listing; the next access lists documents again
    pub fn refresh(&mut self) {
        self.documents.refresh();
    }
}
