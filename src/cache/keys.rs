//! Cache key derivation.
//!
//! Entity views live under the singular kind (`course:{id}`), collection
//! views under the plural kind (`courses:all`, `quizzes:{moduleId}`). The two
//! namespaces never share a prefix, so an entity whose id happens to be
//! `all` cannot shadow a collection key.

use std::fmt;

use thiserror::Error;

const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("cache key for {0} requires a non-empty id")]
    EmptyId(KeyKind),

    #[error("`all` is reserved and cannot be used as a {0} scope id")]
    ReservedId(KeyKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Course,
    Module,
    Lesson,
    Quiz,
    Enrollment,
}

impl KeyKind {
    fn singular(self) -> &'static str {
        match self {
            KeyKind::Course => "course",
            KeyKind::Module => "module",
            KeyKind::Lesson => "lesson",
            KeyKind::Quiz => "quiz",
            KeyKind::Enrollment => "enrollment",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            KeyKind::Course => "courses",
            KeyKind::Module => "modules",
            KeyKind::Lesson => "lessons",
            KeyKind::Quiz => "quizzes",
            KeyKind::Enrollment => "enrollments",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope<'a> {
    /// A single entity view.
    Entity(&'a str),
    /// The global listing for a kind.
    All,
    /// A listing narrowed to one parent, e.g. the quizzes of a module.
    Scoped(&'a str),
}

pub fn derive_key(kind: KeyKind, scope: KeyScope<'_>) -> Result<String, KeyError> {
    match scope {
        KeyScope::Entity(id) => {
            if id.trim().is_empty() {
                return Err(KeyError::EmptyId(kind));
            }
            Ok(format!("{}:{}", kind.singular(), id))
        }
        KeyScope::All => Ok(format!("{}:{}", kind.plural(), ALL)),
        KeyScope::Scoped(parent_id) => {
            if parent_id.trim().is_empty() {
                return Err(KeyError::EmptyId(kind));
            }
            if parent_id == ALL {
                return Err(KeyError::ReservedId(kind));
            }
            Ok(format!("{}:{}", kind.plural(), parent_id))
        }
    }
}

pub fn course(id: &str) -> Result<String, KeyError> {
    derive_key(KeyKind::Course, KeyScope::Entity(id))
}

pub fn all_courses() -> String {
    format!("{}:{}", KeyKind::Course.plural(), ALL)
}

pub fn module(id: &str) -> Result<String, KeyError> {
    derive_key(KeyKind::Module, KeyScope::Entity(id))
}

pub fn lesson(id: &str) -> Result<String, KeyError> {
    derive_key(KeyKind::Lesson, KeyScope::Entity(id))
}

pub fn quiz(id: &str) -> Result<String, KeyError> {
    derive_key(KeyKind::Quiz, KeyScope::Entity(id))
}

pub fn all_quizzes() -> String {
    format!("{}:{}", KeyKind::Quiz.plural(), ALL)
}

pub fn module_quizzes(module_id: &str) -> Result<String, KeyError> {
    derive_key(KeyKind::Quiz, KeyScope::Scoped(module_id))
}

pub fn enrollment(id: &str) -> Result<String, KeyError> {
    derive_key(KeyKind::Enrollment, KeyScope::Entity(id))
}

pub fn all_enrollments() -> String {
    format!("{}:{}", KeyKind::Enrollment.plural(), ALL)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_entity_key_format() {
        assert_eq!(course("C1").unwrap(), "course:C1");
        assert_eq!(module("M1").unwrap(), "module:M1");
        assert_eq!(quiz("Q1").unwrap(), "quiz:Q1");
    }

    #[test]
    fn test_collection_and_scoped_keys() {
        assert_eq!(all_courses(), "courses:all");
        assert_eq!(all_enrollments(), "enrollments:all");
        assert_eq!(derive_key(KeyKind::Quiz, KeyScope::All).unwrap(), all_quizzes());
        assert_eq!(module_quizzes("M1").unwrap(), "quizzes:M1");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_key(KeyKind::Lesson, KeyScope::Entity("L1")).unwrap();
        let b = derive_key(KeyKind::Lesson, KeyScope::Entity("L1")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_inputs_never_collide() {
        let kinds = [
            KeyKind::Course,
            KeyKind::Module,
            KeyKind::Lesson,
            KeyKind::Quiz,
            KeyKind::Enrollment,
        ];
        let ids = ["1", "2", "all", "C1", "a:b", "a"];

        let mut seen = HashSet::new();
        let mut total = 0;
        for kind in kinds {
            total += 1;
            assert!(seen.insert(derive_key(kind, KeyScope::All).unwrap()));
            for id in ids {
                total += 1;
                assert!(seen.insert(derive_key(kind, KeyScope::Entity(id)).unwrap()));
                if let Ok(key) = derive_key(kind, KeyScope::Scoped(id)) {
                    total += 1;
                    assert!(seen.insert(key));
                }
            }
        }
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn test_entity_named_all_does_not_shadow_listing() {
        assert_ne!(course("all").unwrap(), all_courses());
    }

    #[test]
    fn test_empty_ids_are_rejected() {
        assert_eq!(course(""), Err(KeyError::EmptyId(KeyKind::Course)));
        assert_eq!(module_quizzes("  "), Err(KeyError::EmptyId(KeyKind::Quiz)));
    }

    #[test]
    fn test_reserved_scope_id_is_rejected() {
        assert_eq!(module_quizzes("all"), Err(KeyError::ReservedId(KeyKind::Quiz)));
    }
}
