//! Indexed view of the color-scheme (hrd) section of a catalog.
//!
//! Entries live in one flat map keyed by `(class, name)`; a separate list of
//! distinct classes keeps enumeration order stable. The registry is strict
//! about duplicates: the first registration of a pair wins and later ones are
//! rejected instead of overwriting it.

use crate::error::FactoryError;
use indexmap::IndexMap;

/// Locations and description registered for one `(class, name)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrdEntry {
    pub description: String,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HrdRegistry {
    entries: IndexMap<(String, String), HrdEntry>,
    classes: Vec<String>,
}

/// Key under which a scheme description is published.
pub fn description_key(class: &str, name: &str) -> String {
    format!("{class}-{name}")
}

impl HrdRegistry {
    /// Register a scheme. `description` defaults to `name`.
    ///
    /// Returns [`FactoryError::DuplicateRegistration`] when the pair is
    /// already present; the stored entry is left untouched.
    pub fn register(
        &mut self,
        class: &str,
        name: &str,
        description: Option<&str>,
        locations: Vec<String>,
    ) -> Result<(), FactoryError> {
        if !self.classes.iter().any(|c| c == class) {
            self.classes.push(class.to_string());
        }

        let key = (class.to_string(), name.to_string());
        if self.entries.contains_key(&key) {
            return Err(FactoryError::DuplicateRegistration {
                class: class.to_string(),
                name: name.to_string(),
            });
        }

        self.entries.insert(
            key,
            HrdEntry {
                description: description.unwrap_or(name).to_string(),
                locations,
            },
        );
        Ok(())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn class_at(&self, idx: usize) -> Option<&str> {
        self.classes.get(idx).map(String::as_str)
    }

    /// Distinct classes in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Names registered under `class`, in registration order.
    pub fn names<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .keys()
            .filter(move |(c, _)| c == class)
            .map(|(_, n)| n.as_str())
    }

    pub fn name_count(&self, class: &str) -> usize {
        self.names(class).count()
    }

    /// The result borrows from the registry only, not from `class`.
    pub fn name_at(&self, class: &str, idx: usize) -> Option<&str> {
        self.entries
            .keys()
            .filter(|(c, _)| c == class)
            .nth(idx)
            .map(|(_, n)| n.as_str())
    }

    pub fn entry(&self, class: &str, name: &str) -> Option<&HrdEntry> {
        self.entries.get(&(class.to_string(), name.to_string()))
    }

    pub fn locations(&self, class: &str, name: &str) -> Option<&[String]> {
        self.entry(class, name).map(|e| e.locations.as_slice())
    }

    pub fn description(&self, class: &str, name: &str) -> Option<&str> {
        self.entry(class, name).map(|e| e.description.as_str())
    }

    /// All descriptions keyed by [`description_key`].
    pub fn descriptions(&self) -> impl Iterator<Item = (String, &str)> {
        self.entries
            .iter()
            .map(|((c, n), e)| (description_key(c, n), e.description.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicate_pair_keeps_first_registration() {
        let mut registry = HrdRegistry::default();
        registry
            .register("rgb", "default", None, locs(&["a.hrd", "b.hrd"]))
            .unwrap();
        let err = registry
            .register("rgb", "default", Some("other"), locs(&["c.hrd"]))
            .unwrap_err();
        assert!(matches!(err, FactoryError::DuplicateRegistration { .. }));
        assert_eq!(
            registry.locations("rgb", "default").unwrap(),
            ["a.hrd", "b.hrd"]
        );
        assert_eq!(registry.description("rgb", "default"), Some("default"));
    }

    #[test]
    fn enumeration_follows_registration_order() {
        let mut registry = HrdRegistry::default();
        registry.register("rgb", "white", Some("White"), vec![]).unwrap();
        registry.register("text", "default", None, vec![]).unwrap();
        registry.register("rgb", "black", None, vec![]).unwrap();

        assert_eq!(registry.class_count(), 2);
        assert_eq!(registry.class_at(0), Some("rgb"));
        assert_eq!(registry.class_at(1), Some("text"));
        assert_eq!(registry.class_at(2), None);

        assert_eq!(registry.name_count("rgb"), 2);
        assert_eq!(registry.name_at("rgb", 0), Some("white"));
        assert_eq!(registry.name_at("rgb", 1), Some("black"));
        assert_eq!(registry.name_count("missing"), 0);
        assert_eq!(registry.name_at("missing", 0), None);
    }

    #[test]
    fn name_outlives_class_argument() {
        let mut registry = HrdRegistry::default();
        registry.register("rgb", "default", None, vec![]).unwrap();
        let name = {
            let class = String::from("rgb");
            registry.name_at(&class, 0)
        };
        assert_eq!(name, Some("default"));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut registry = HrdRegistry::default();
        registry.register("rgb", "Default", None, vec![]).unwrap();
        registry.register("rgb", "default", None, vec![]).unwrap();
        registry.register("RGB", "default", None, vec![]).unwrap();
        assert_eq!(registry.class_count(), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn descriptions_use_composite_key() {
        let mut registry = HrdRegistry::default();
        registry
            .register("console", "far", Some("FAR Manager"), vec![])
            .unwrap();
        let descriptions: Vec<_> = registry.descriptions().collect();
        assert_eq!(descriptions, vec![("console-far".to_string(), "FAR Manager")]);
    }
}
