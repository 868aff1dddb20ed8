use std::fmt;

use crate::StoreError;

/// Slash-separated path to a collection: an odd number of segments
/// (`users`, `chats/{id}/data`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath(String);

/// Slash-separated path to a single document: an even number of segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

fn check_segment(segment: &str, whole: &str) -> Result<(), StoreError> {
    if segment.is_empty() || segment.contains('/') {
        return Err(StoreError::InvalidPath(whole.to_string()));
    }
    Ok(())
}

fn split(path: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = path.split('/').collect();
    for segment in &segments {
        check_segment(segment, path)?;
    }
    Ok(segments)
}

impl CollectionPath {
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let segments = split(path)?;
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(Self(path.to_string()))
    }

    pub fn doc(&self, id: &str) -> Result<DocumentPath, StoreError> {
        check_segment(id, &format!("{}/{}", self.0, id))?;
        Ok(DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocumentPath {
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let (collection, id) = path
            .rsplit_once('/')
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        CollectionPath::parse(collection)?.doc(id)
    }

    /// Subcollection below this document.
    pub fn collection(&self, name: &str) -> Result<CollectionPath, StoreError> {
        check_segment(name, &format!("{self}/{name}"))?;
        Ok(CollectionPath(format!("{self}/{name}")))
    }

    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collections_and_documents() {
        let chats = CollectionPath::parse("chats").unwrap();
        let chat = chats.doc("global").unwrap();
        let data = chat.collection("data").unwrap();
        assert_eq!(data.as_str(), "chats/global/data");
        assert_eq!(chat.to_string(), "chats/global");

        let msg = DocumentPath::parse("chats/global/data/m1").unwrap();
        assert_eq!(msg.id(), "m1");
        assert_eq!(msg.parent(), &data);
        assert_eq!(msg.to_string(), "chats/global/data/m1");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(CollectionPath::parse("").is_err());
        assert!(CollectionPath::parse("chats/global").is_err());
        assert!(CollectionPath::parse("chats//data").is_err());
        assert!(DocumentPath::parse("users").is_err());
        assert!(DocumentPath::parse("chats/x/data").is_err());

        let users = CollectionPath::parse("users").unwrap();
        assert!(users.doc("").is_err());
        assert!(users.doc("a/b").is_err());
    }
}
