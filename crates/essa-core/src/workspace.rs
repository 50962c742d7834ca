//! # Workspace
//!
//! Named sessions held by a long-running host. Names are unique after
//! trimming; lookups trim too.

use crate::reference::Catalog;
use crate::session::Session;
use crate::types::EssaError;
use std::collections::BTreeMap;

/// Sessions keyed by project name, listed alphabetically.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    sessions: BTreeMap<String, Session>,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a project. Fails if the name is empty or taken.
    pub fn create(&mut self, name: &str, catalog: &Catalog) -> Result<&mut Session, EssaError> {
        let session = Session::new(name, catalog)?;
        let key = session.project().name().to_string();
        if self.sessions.contains_key(&key) {
            return Err(EssaError::ProjectExists(key));
        }
        Ok(self.sessions.entry(key).or_insert(session))
    }

    pub fn get(&self, name: &str) -> Result<&Session, EssaError> {
        self.sessions
            .get(name.trim())
            .ok_or_else(|| EssaError::ProjectNotFound(name.trim().to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Session, EssaError> {
        self.sessions
            .get_mut(name.trim())
            .ok_or_else(|| EssaError::ProjectNotFound(name.trim().to_string()))
    }

    /// Delete a project, returning its session.
    pub fn delete(&mut self, name: &str) -> Result<Session, EssaError> {
        self.sessions
            .remove(name.trim())
            .ok_or_else(|| EssaError::ProjectNotFound(name.trim().to_string()))
    }

    /// Add a session loaded elsewhere. An existing project of the same
    /// name is only replaced when `replace` is set.
    pub fn import(&mut self, session: Session, replace: bool) -> Result<(), EssaError> {
        let key = session.project().name().to_string();
        if !replace && self.sessions.contains_key(&key) {
            return Err(EssaError::ProjectExists(key));
        }
        self.sessions.insert(key, session);
        Ok(())
    }

    /// Project names, alphabetically.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_get_delete() {
        let catalog = Catalog::standard();
        let mut workspace = Workspace::new();

        workspace.create(" Bio-resin ", &catalog).expect("create");
        assert!(workspace.get("Bio-resin").is_ok());
        assert_eq!(workspace.names().collect::<Vec<_>>(), ["Bio-resin"]);

        workspace.delete("Bio-resin").expect("delete");
        assert!(workspace.is_empty());
        assert_eq!(
            workspace.get("Bio-resin").map(|_| ()),
            Err(EssaError::ProjectNotFound("Bio-resin".into()))
        );
    }

    #[test]
    fn duplicate_names_conflict() {
        let catalog = Catalog::standard();
        let mut workspace = Workspace::new();
        workspace.create("A", &catalog).expect("create");
        assert_eq!(
            workspace.create("A ", &catalog).map(|_| ()),
            Err(EssaError::ProjectExists("A".into()))
        );
        assert_eq!(workspace.create("", &catalog).map(|_| ()), Err(EssaError::EmptyName));
    }

    #[test]
    fn import_respects_replace_flag() {
        let catalog = Catalog::standard();
        let mut workspace = Workspace::new();
        workspace.create("A", &catalog).expect("create");

        let mut incoming = Session::new("A", &catalog).expect("valid");
        incoming.advance();

        assert!(workspace.import(incoming.clone(), false).is_err());
        workspace.import(incoming, true).expect("replace");
        assert_eq!(workspace.len(), 1);
        assert_ne!(workspace.get("A").map(Session::step).ok(), Some(crate::Step::Trl));
    }
}
