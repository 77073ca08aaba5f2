//! Registry of site-wide actions listed on the admin index
//!
//! Actions are registered on an [`ActionRegistryBuilder`] at startup. The
//! built [`ActionRegistry`] is read-only and is handed to whatever renders
//! the action list.

use serde::{Deserialize, Serialize};

/// A registered action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier
    pub gid: String,
    pub short_description: String,
    /// Name of the route the action links to
    pub url_name: String,
}

impl Action {
    pub fn new(
        gid: impl Into<String>,
        short_description: impl Into<String>,
        url_name: impl Into<String>,
    ) -> Self {
        Action {
            gid: gid.into(),
            short_description: short_description.into(),
            url_name: url_name.into(),
        }
    }
}

/// Registering an action whose gid is already taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGid {
    pub gid: String,
}

impl std::fmt::Display for DuplicateGid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gid: {}", self.gid)
    }
}

impl std::error::Error for DuplicateGid {}

/// Collects actions before the registry is frozen
#[derive(Debug, Clone, Default)]
pub struct ActionRegistryBuilder {
    actions: Vec<Action>,
}

impl ActionRegistryBuilder {
    pub fn new() -> Self {
        ActionRegistryBuilder::default()
    }

    /// Add an action; fails if its gid is taken
    pub fn register(&mut self, action: Action) -> Result<&mut Self, DuplicateGid> {
        if self.actions.iter().any(|a| a.gid == action.gid) {
            return Err(DuplicateGid { gid: action.gid });
        }
        log::debug!("Registered action: {}", action.gid);
        self.actions.push(action);
        Ok(self)
    }

    /// Remove the action with `gid`; unknown gids are ignored
    pub fn unregister(&mut self, gid: &str) -> &mut Self {
        if let Some(idx) = self.actions.iter().position(|a| a.gid == gid) {
            self.actions.remove(idx);
        }
        self
    }

    pub fn build(self) -> ActionRegistry {
        ActionRegistry {
            actions: self.actions,
        }
    }
}

/// Frozen, ordered list of actions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionRegistry {
    actions: Vec<Action>,
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::new()
    }

    /// Build a registry from a list, rejecting duplicate gids
    pub fn from_actions<I>(actions: I) -> Result<Self, DuplicateGid>
    where
        I: IntoIterator<Item = Action>,
    {
        let mut builder = ActionRegistryBuilder::new();
        for action in actions {
            builder.register(action)?;
        }
        Ok(builder.build())
    }

    /// Actions in registration order
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn get(&self, gid: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.gid == gid)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_keeps_order() {
        let mut builder = ActionRegistry::builder();
        builder
            .register(Action::new("import", "Import pupils", "import_pupils"))
            .unwrap()
            .register(Action::new("mail", "Send mail", "send_mail"))
            .unwrap();
        let registry = builder.build();

        let gids: Vec<_> = registry.actions().iter().map(|a| a.gid.as_str()).collect();
        assert_eq!(gids, vec!["import", "mail"]);
        assert_eq!(registry.get("mail").map(|a| a.url_name.as_str()), Some("send_mail"));
    }

    #[test]
    fn test_duplicate_gid() {
        let mut builder = ActionRegistry::builder();
        builder.register(Action::new("mail", "Send mail", "send_mail")).unwrap();
        let err = builder
            .register(Action::new("mail", "Other", "other"))
            .unwrap_err();
        assert_eq!(err.to_string(), "gid: mail");
    }

    #[test]
    fn test_unregister() {
        let mut builder = ActionRegistry::builder();
        builder.register(Action::new("a", "A", "a")).unwrap();
        builder.register(Action::new("b", "B", "b")).unwrap();
        builder.unregister("a").unregister("missing");
        let registry = builder.build();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("a").is_none());
    }

    #[test]
    fn test_from_actions_rejects_duplicates() {
        let result = ActionRegistry::from_actions(vec![
            Action::new("a", "A", "a"),
            Action::new("a", "Again", "a"),
        ]);
        assert_eq!(result, Err(DuplicateGid { gid: "a".into() }));
    }
}
