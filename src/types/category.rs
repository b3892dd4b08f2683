use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A named, prioritized bucket of rules.
///
/// Identity is the name alone: two categories with the same name are equal
/// and hash alike whatever their sequence numbers. Ordering is by sequence
/// number (lower first), with the name as a tie-break. Two equal categories
/// with different sequence numbers therefore do not compare `Equal`, so do
/// not mix them in ordered sets.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Category {
    name: String,
    description: String,
    sequence_number: i32,
}

impl Category {
    /// A category whose description is its name.
    pub fn new(name: impl Into<String>, sequence_number: i32) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            sequence_number,
        }
    }

    pub fn with_description(
        name: impl Into<String>,
        description: impl Into<String>,
        sequence_number: i32,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            sequence_number,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Lower numbers mean higher priority.
    #[must_use]
    pub fn sequence_number(&self) -> i32 {
        self.sequence_number
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Category {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Category {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sequence_number
            .cmp(&other.sequence_number)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn description_defaults_to_name() {
        let c = Category::new("loans", 10);
        assert_eq!(c.description(), "loans");
        assert_eq!(c.sequence_number(), 10);
    }

    #[test]
    fn equality_ignores_sequence_number() {
        let a = Category::new("loans", 10);
        let b = Category::with_description("loans", "Loan rules", 99);
        assert_eq!(a, b);

        let set: HashSet<Category> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn ordered_by_sequence_number() {
        let mut categories = vec![
            Category::new("c", 30),
            Category::new("a", 10),
            Category::new("b", 20),
        ];
        categories.sort();
        let names: Vec<&str> = categories.iter().map(Category::name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn display_is_name() {
        assert_eq!(Category::new("pricing", 1).to_string(), "pricing");
    }
}
