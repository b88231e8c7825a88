//! Execution planner: turns an unordered active rule set into a run order.
//!
//! Depth-first topological sort over `dependency -> rule` edges. Roots are
//! visited in ascending priority (insertion order breaks priority ties) so the
//! result is deterministic. Dependencies naming rules outside the active set
//! are treated as satisfied.

use super::engine::FormatRule;
use crate::error::FormatError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

pub struct ExecutionPlanner;

impl ExecutionPlanner {
    /// Order the rules so that every active dependency runs first.
    ///
    /// Fails with `CyclicDependency` without returning any partial order.
    pub fn plan(rules: Vec<Box<dyn FormatRule>>) -> Result<Vec<Box<dyn FormatRule>>, FormatError> {
        let order = Self::order(&rules)?;
        let mut slots: Vec<Option<Box<dyn FormatRule>>> = rules.into_iter().map(Some).collect();
        Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
    }

    /// Names in execution order, without consuming the rules.
    pub fn plan_names(rules: &[Box<dyn FormatRule>]) -> Result<Vec<String>, FormatError> {
        Ok(Self::order(rules)?
            .into_iter()
            .map(|i| rules[i].name().to_string())
            .collect())
    }

    /// Indices into `rules` in execution order.
    fn order(rules: &[Box<dyn FormatRule>]) -> Result<Vec<usize>, FormatError> {
        // Names are expected to be unique; Formatter rejects duplicates before
        // planning. Direct callers get the first rule with a given name.
        let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            by_name.entry(rule.name()).or_insert(index);
        }

        // Stable sort: equal priorities keep their insertion order
        let mut roots: Vec<usize> = (0..rules.len()).collect();
        roots.sort_by_key(|&i| rules[i].priority());

        let mut walk = Walk {
            rules,
            by_name: &by_name,
            marks: vec![Mark::Unvisited; rules.len()],
            stack: Vec::new(),
            order: Vec::with_capacity(rules.len()),
        };
        for root in roots {
            walk.visit(root)?;
        }
        Ok(walk.order)
    }
}

struct Walk<'a> {
    rules: &'a [Box<dyn FormatRule>],
    by_name: &'a HashMap<&'a str, usize>,
    marks: Vec<Mark>,
    stack: Vec<usize>,
    order: Vec<usize>,
}

impl Walk<'_> {
    fn visit(&mut self, index: usize) -> Result<(), FormatError> {
        match self.marks[index] {
            Mark::Done => return Ok(()),
            Mark::InProgress => return Err(self.cycle_error(index)),
            Mark::Unvisited => {}
        }

        self.marks[index] = Mark::InProgress;
        self.stack.push(index);

        let mut deps: Vec<usize> = self.rules[index]
            .dependencies()
            .iter()
            .filter_map(|dep| self.by_name.get(dep.as_str()).copied())
            .collect();
        deps.sort_by_key(|&i| (self.rules[i].priority(), i));
        deps.dedup();

        for dep in deps {
            self.visit(dep)?;
        }

        self.stack.pop();
        self.marks[index] = Mark::Done;
        self.order.push(index);
        Ok(())
    }

    fn cycle_error(&self, index: usize) -> FormatError {
        let start = self
            .stack
            .iter()
            .position(|&i| i == index)
            .unwrap_or(0);
        let mut cycle: Vec<String> = self.stack[start..]
            .iter()
            .map(|&i| self.rules[i].name().to_string())
            .collect();
        cycle.push(self.rules[index].name().to_string());
        FormatError::CyclicDependency {
            rule: self.rules[index].name().to_string(),
            cycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::engine::RuleOutput;

    struct Stub {
        name: &'static str,
        priority: i32,
        deps: Vec<&'static str>,
    }

    impl FormatRule for Stub {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn dependencies(&self) -> Vec<String> {
            self.deps.iter().map(|d| d.to_string()).collect()
        }
        fn apply(&self, text: &str) -> RuleOutput {
            RuleOutput::unchanged(text)
        }
    }

    fn stub(name: &'static str, priority: i32, deps: &[&'static str]) -> Box<dyn FormatRule> {
        Box::new(Stub {
            name,
            priority,
            deps: deps.to_vec(),
        })
    }

    #[test]
    fn test_priority_order_without_dependencies() {
        let rules = vec![stub("c", 30, &[]), stub("a", 10, &[]), stub("b", 20, &[])];
        assert_eq!(ExecutionPlanner::plan_names(&rules).unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let rules = vec![stub("x", 5, &[]), stub("y", 5, &[]), stub("w", 5, &[])];
        assert_eq!(ExecutionPlanner::plan_names(&rules).unwrap(), ["x", "y", "w"]);
    }

    #[test]
    fn test_dependency_overrides_priority() {
        // "early" would run first by priority but depends on "late"
        let rules = vec![stub("early", 1, &["late"]), stub("late", 99, &[])];
        assert_eq!(ExecutionPlanner::plan_names(&rules).unwrap(), ["late", "early"]);
    }

    #[test]
    fn test_transitive_dependencies() {
        let rules = vec![
            stub("a", 1, &["b"]),
            stub("b", 2, &["c"]),
            stub("c", 3, &[]),
            stub("d", 0, &[]),
        ];
        assert_eq!(
            ExecutionPlanner::plan_names(&rules).unwrap(),
            ["d", "c", "b", "a"]
        );
    }

    #[test]
    fn test_missing_dependency_is_skipped() {
        let rules = vec![stub("a", 1, &["not_active"]), stub("b", 0, &[])];
        assert_eq!(ExecutionPlanner::plan_names(&rules).unwrap(), ["b", "a"]);
    }

    #[test]
    fn test_two_rule_cycle() {
        let rules = vec![stub("a", 1, &["b"]), stub("b", 2, &["a"])];
        let err = ExecutionPlanner::plan(rules).unwrap_err();
        match err {
            FormatError::CyclicDependency { rule, cycle } => {
                assert_eq!(rule, "a");
                assert_eq!(cycle, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let rules = vec![stub("loop", 1, &["loop"])];
        assert!(matches!(
            ExecutionPlanner::plan(rules),
            Err(FormatError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_every_rule_appears_once() {
        let rules = vec![
            stub("a", 3, &["b", "c"]),
            stub("b", 2, &["c"]),
            stub("c", 1, &[]),
        ];
        let planned = ExecutionPlanner::plan(rules).unwrap();
        let names: Vec<_> = planned.iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, ["c", "b", "a"]);
    }
}
