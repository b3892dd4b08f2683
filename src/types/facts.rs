use std::collections::{BTreeMap, HashMap};

use super::Value;

/// The facts supplied to one evaluation call, keyed by variable name.
///
/// Every entry is visible to conditions as a variable (`amount` or `#amount`).
/// Dot-separated names nest into [`Value::Map`]s, so
/// `Facts::new().set("customer.age", 30_i64)` is read back by the condition
/// `customer.age > 18`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facts {
    data: HashMap<String, Value>,
}

impl Facts {
    /// Create an empty fact set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fact at a dot-separated path. Creates intermediate maps as needed.
    #[must_use]
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value.into());
        self
    }

    /// Insert a fact at a dot-separated path (mutable reference version).
    pub fn insert(&mut self, path: &str, value: Value) {
        match path.split_once('.') {
            None => {
                self.data.insert(path.to_owned(), value);
            }
            Some((head, rest)) => {
                let segments: Vec<&str> = rest.split('.').collect();
                let entry = self
                    .data
                    .entry(head.to_owned())
                    .or_insert_with(|| Value::Map(BTreeMap::new()));
                insert_nested(entry, &segments, value);
            }
        }
    }

    /// Look up a top-level fact by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Look up a value by dot-separated path, descending into maps.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.data.get(segments.next()?)?;
        for segment in segments {
            match current {
                Value::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over the top-level facts in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Top-level fact names, sorted. Used for log output.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.data.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn insert_nested(target: &mut Value, segments: &[&str], value: Value) {
    if !matches!(target, Value::Map(_)) {
        *target = Value::Map(BTreeMap::new());
    }
    let Value::Map(map) = target else {
        return;
    };
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_owned(), value);
        }
        [first, rest @ ..] => {
            let entry = map
                .entry((*first).to_owned())
                .or_insert_with(|| Value::Map(BTreeMap::new()));
            insert_nested(entry, rest, value);
        }
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Facts {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut facts = Self::new();
        facts.extend(iter);
        facts
    }
}

impl<K: AsRef<str>, V: Into<Value>> Extend<(K, V)> for Facts {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name.as_ref(), value.into());
        }
    }
}

impl From<HashMap<String, Value>> for Facts {
    fn from(data: HashMap<String, Value>) -> Self {
        data.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_simple() {
        let facts = Facts::new().set("name", "alice");
        assert_eq!(facts.get("name"), Some(&Value::String("alice".to_owned())));
    }

    #[test]
    fn set_nested_builds_maps() {
        let facts = Facts::new().set("customer.profile.age", 25_i64);
        assert_eq!(facts.get_path("customer.profile.age"), Some(&Value::Int(25)));
        assert!(matches!(facts.get("customer"), Some(Value::Map(_))));
    }

    #[test]
    fn get_missing_returns_none() {
        let facts = Facts::new().set("customer.age", 25_i64);
        assert_eq!(facts.get_path("customer.name"), None);
        assert_eq!(facts.get("nonexistent"), None);
        assert_eq!(facts.get_path("customer.age.years"), None);
    }

    #[test]
    fn sibling_nested_fields() {
        let facts = Facts::new()
            .set("customer.age", 25_i64)
            .set("customer.level", "Gold");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts.get_path("customer.age"), Some(&Value::Int(25)));
        assert_eq!(
            facts.get_path("customer.level"),
            Some(&Value::String("Gold".to_owned()))
        );
    }

    #[test]
    fn overwrite_leaf_with_nested() {
        let facts = Facts::new().set("user", "old").set("user.age", 30_i64);
        assert_eq!(facts.get_path("user.age"), Some(&Value::Int(30)));
    }

    #[test]
    fn overwrite_value() {
        let facts = Facts::new().set("score", 10_i64).set("score", 20_i64);
        assert_eq!(facts.get("score"), Some(&Value::Int(20)));
    }

    #[test]
    fn from_iterator() {
        let facts: Facts = [("a", 1_i64), ("b", 2_i64)].into_iter().collect();
        assert_eq!(facts.names(), vec!["a", "b"]);
    }

    #[test]
    fn collected_dotted_names_nest_like_set() {
        let via_set = Facts::new()
            .set("customer.age", 30_i64)
            .set("customer.tier", "gold");
        let via_iter: Facts = [("customer.age", Value::Int(30)), ("customer.tier", "gold".into())]
            .into_iter()
            .collect();
        let via_map = Facts::from(HashMap::from([
            ("customer.age".to_owned(), Value::Int(30)),
            ("customer.tier".to_owned(), Value::from("gold")),
        ]));
        assert_eq!(via_iter, via_set);
        assert_eq!(via_map, via_set);
        assert_eq!(via_map.get_path("customer.age"), Some(&Value::Int(30)));
    }

    #[test]
    fn empty_facts() {
        let facts = Facts::new();
        assert!(facts.is_empty());
        assert_eq!(facts.get("anything"), None);
    }
}
