//! Which cache keys a write makes stale.
//!
//! A mutation is described by the entity it touched plus the parents it had
//! before and after the write. Edges run from a child view to every view that
//! embeds it; the affected set is everything reachable from the mutated
//! entity. Both lineages contribute edges, so a rehome always reaches the old
//! and the new parent.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::keys::{self, KeyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Course,
    Module,
    Lesson,
    Quiz,
    Enrollment,
}

/// Parent ids of an entity at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    pub module_id: Option<String>,
    pub course_id: Option<String>,
}

impl Lineage {
    pub fn course(course_id: impl Into<String>) -> Self {
        Self {
            module_id: None,
            course_id: Some(course_id.into()),
        }
    }

    pub fn module(module_id: impl Into<String>, course_id: Option<String>) -> Self {
        Self {
            module_id: Some(module_id.into()),
            course_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub kind: EntityKind,
    pub id: String,
    pub before: Lineage,
    pub after: Lineage,
}

impl MutationEvent {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            before: Lineage::default(),
            after: Lineage::default(),
        }
    }

    pub fn before(mut self, lineage: Lineage) -> Self {
        self.before = lineage;
        self
    }

    pub fn after(mut self, lineage: Lineage) -> Self {
        self.after = lineage;
        self
    }

    /// Same parents on both sides of the write.
    pub fn within(self, lineage: Lineage) -> Self {
        self.before(lineage.clone()).after(lineage)
    }

    fn lineages(&self) -> [&Lineage; 2] {
        [&self.before, &self.after]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node {
    Course(String),
    CourseList,
    Module(String),
    Lesson(String),
    Quiz(String),
    QuizList,
    ModuleQuizzes(String),
    Enrollment(String),
    EnrollmentList,
}

impl Node {
    fn key(&self) -> Result<String, KeyError> {
        match self {
            Node::Course(id) => keys::course(id),
            Node::CourseList => Ok(keys::all_courses()),
            Node::Module(id) => keys::module(id),
            Node::Lesson(id) => keys::lesson(id),
            Node::Quiz(id) => keys::quiz(id),
            Node::QuizList => Ok(keys::all_quizzes()),
            Node::ModuleQuizzes(module_id) => keys::module_quizzes(module_id),
            Node::Enrollment(id) => keys::enrollment(id),
            Node::EnrollmentList => Ok(keys::all_enrollments()),
        }
    }

    /// Edges that hold regardless of the event.
    fn static_parents(&self) -> Vec<Node> {
        match self {
            Node::Course(_) => vec![Node::CourseList],
            Node::Quiz(_) => vec![Node::QuizList],
            Node::Enrollment(_) => vec![Node::EnrollmentList],
            _ => Vec::new(),
        }
    }
}

fn root(event: &MutationEvent) -> Node {
    let id = event.id.clone();
    match event.kind {
        EntityKind::Course => Node::Course(id),
        EntityKind::Module => Node::Module(id),
        EntityKind::Lesson => Node::Lesson(id),
        EntityKind::Quiz => Node::Quiz(id),
        EntityKind::Enrollment => Node::Enrollment(id),
    }
}

/// Edges contributed by the event's lineages.
fn lineage_edges(event: &MutationEvent, root: &Node) -> HashMap<Node, Vec<Node>> {
    let mut edges: HashMap<Node, Vec<Node>> = HashMap::new();

    // Quiz listings of a module carry its title and liveness.
    if event.kind == EntityKind::Module {
        edges
            .entry(root.clone())
            .or_default()
            .push(Node::ModuleQuizzes(event.id.clone()));
    }

    for lineage in event.lineages() {
        match event.kind {
            EntityKind::Lesson => {
                if let Some(module_id) = &lineage.module_id {
                    let module = Node::Module(module_id.clone());
                    edges.entry(root.clone()).or_default().push(module.clone());
                    if let Some(course_id) = &lineage.course_id {
                        edges
                            .entry(module)
                            .or_default()
                            .push(Node::Course(course_id.clone()));
                    }
                }
            }
            EntityKind::Module => {
                if let Some(course_id) = &lineage.course_id {
                    edges
                        .entry(root.clone())
                        .or_default()
                        .push(Node::Course(course_id.clone()));
                }
            }
            EntityKind::Quiz => {
                if let Some(module_id) = &lineage.module_id {
                    edges
                        .entry(root.clone())
                        .or_default()
                        .push(Node::ModuleQuizzes(module_id.clone()));
                }
            }
            EntityKind::Course | EntityKind::Enrollment => {}
        }
    }

    edges
}

/// Every key that must be deleted after `event` is persisted.
pub fn affected_keys(event: &MutationEvent) -> Result<BTreeSet<String>, KeyError> {
    let start = root(event);
    let edges = lineage_edges(event, &start);

    let mut visited: HashSet<Node> = HashSet::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        if !visited.insert(node.clone()) {
            continue;
        }
        queue.extend(node.static_parents());
        if let Some(parents) = edges.get(&node) {
            queue.extend(parents.iter().cloned());
        }
    }

    visited.iter().map(Node::key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_of(event: MutationEvent) -> Vec<String> {
        affected_keys(&event).unwrap().into_iter().collect()
    }

    #[test]
    fn test_lesson_write_reaches_module_and_course() {
        let event = MutationEvent::new(EntityKind::Lesson, "L1")
            .within(Lineage::module("M1", Some("C1".to_string())));

        assert_eq!(keys_of(event), vec!["course:C1", "lesson:L1", "module:M1"]);
    }

    #[test]
    fn test_lesson_rehome_reaches_both_branches() {
        let event = MutationEvent::new(EntityKind::Lesson, "L1")
            .before(Lineage::module("M1", Some("C1".to_string())))
            .after(Lineage::module("M2", Some("C2".to_string())));

        assert_eq!(
            keys_of(event),
            vec!["course:C1", "course:C2", "lesson:L1", "module:M1", "module:M2"]
        );
    }

    #[test]
    fn test_module_rehome_invalidates_origin_and_destination() {
        let event = MutationEvent::new(EntityKind::Module, "M1")
            .before(Lineage::course("C1"))
            .after(Lineage::course("C2"));

        assert_eq!(
            keys_of(event),
            vec!["course:C1", "course:C2", "module:M1", "quizzes:M1"]
        );
    }

    #[test]
    fn test_module_write_without_rehome() {
        let event = MutationEvent::new(EntityKind::Module, "M1").within(Lineage::course("C1"));
        assert_eq!(keys_of(event), vec!["course:C1", "module:M1", "quizzes:M1"]);
    }

    #[test]
    fn test_lesson_write_leaves_quiz_listings_alone() {
        let event = MutationEvent::new(EntityKind::Lesson, "L1")
            .within(Lineage::module("M1", Some("C1".to_string())));

        assert!(!keys_of(event).contains(&"quizzes:M1".to_string()));
    }

    #[test]
    fn test_course_write_reaches_listing() {
        let event = MutationEvent::new(EntityKind::Course, "C1");
        assert_eq!(keys_of(event), vec!["course:C1", "courses:all"]);
    }

    #[test]
    fn test_enrollment_write_reaches_listing() {
        let event = MutationEvent::new(EntityKind::Enrollment, "E1");
        assert_eq!(keys_of(event), vec!["enrollment:E1", "enrollments:all"]);
    }

    #[test]
    fn test_quiz_rehome_reaches_both_module_listings() {
        let event = MutationEvent::new(EntityKind::Quiz, "Q1")
            .before(Lineage::module("M1", None))
            .after(Lineage::module("M2", None));

        assert_eq!(
            keys_of(event),
            vec!["quiz:Q1", "quizzes:M1", "quizzes:M2", "quizzes:all"]
        );
    }

    #[test]
    fn test_created_entity_has_no_before_lineage() {
        let event = MutationEvent::new(EntityKind::Lesson, "L9")
            .after(Lineage::module("M1", Some("C1".to_string())));

        assert_eq!(keys_of(event), vec!["course:C1", "lesson:L9", "module:M1"]);
    }

    #[test]
    fn test_empty_id_is_an_error() {
        let event = MutationEvent::new(EntityKind::Course, "");
        assert!(affected_keys(&event).is_err());
    }
}
