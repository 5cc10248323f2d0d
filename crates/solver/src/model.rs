/// A model (counterexample) from the solver.
///
/// Contains the constant assignments extracted from `(get-model)` output,
/// in the order the solver printed them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    /// Variable assignments: `(name, value_string)` pairs.
    pub assignments: Vec<(String, String)>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignments(assignments: Vec<(String, String)>) -> Self {
        Self { assignments }
    }

    /// Look up a variable's value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assignments
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_model() {
        let model = Model::new();
        assert!(model.is_empty());
        assert_eq!(model.get("x"), None);
    }

    #[test]
    fn lookup_and_iteration_order() {
        let model = Model::with_assignments(vec![
            ("y".to_string(), "true".to_string()),
            ("x".to_string(), "42".to_string()),
        ]);
        assert_eq!(model.len(), 2);
        assert_eq!(model.get("x"), Some("42"));
        assert_eq!(model.get("z"), None);
        let names: Vec<_> = model.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["y", "x"]);
    }
}
