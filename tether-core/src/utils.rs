//! Utility types for the container

/// Dependency resolution utilities
pub mod dependency {
    /// Ordered trail of keys currently being resolved by one top-level `get`.
    ///
    /// The stack is owned by a single resolution and never shared between
    /// concurrent callers, so it needs no locking.
    #[derive(Debug, Default, Clone)]
    pub struct ResolutionStack {
        keys: Vec<String>,
    }

    impl ResolutionStack {
        /// Creates a new empty stack.
        pub fn new() -> Self {
            Self { keys: Vec::new() }
        }

        /// Checks if a key is currently being resolved.
        pub fn contains(&self, key: &str) -> bool {
            self.keys.iter().any(|current| current == key)
        }

        /// Pushes `key` onto the stack.
        ///
        /// # Errors
        ///
        /// Returns the full cycle path (current stack followed by `key`) if
        /// `key` is already being resolved.
        pub fn enter(&mut self, key: &str) -> Result<(), Vec<String>> {
            if self.contains(key) {
                let mut path = self.keys.clone();
                path.push(key.to_string());
                return Err(path);
            }
            self.keys.push(key.to_string());
            Ok(())
        }

        /// Pops `key`; the most recent entry is expected to match.
        pub fn leave(&mut self, key: &str) {
            match self.keys.last() {
                Some(last) if last == key => {
                    self.keys.pop();
                }
                _ => {
                    tracing::error!(key, stack = ?self.keys, "Resolution stack out of order");
                    if let Some(position) = self.keys.iter().rposition(|current| current == key) {
                        self.keys.remove(position);
                    }
                }
            }
        }

        pub fn depth(&self) -> usize {
            self.keys.len()
        }

        pub fn is_empty(&self) -> bool {
            self.keys.is_empty()
        }

        /// Snapshot of the keys being resolved, outermost first.
        pub fn path(&self) -> &[String] {
            &self.keys
        }
    }
}

#[cfg(test)]
mod tests {
    mod dependency_tests {
        use super::super::dependency::*;

        #[test]
        fn test_resolution_stack() {
            let mut stack = ResolutionStack::new();

            // Initially nothing is being resolved
            assert!(!stack.contains("serviceA"));

            stack.enter("serviceA").unwrap();
            assert!(stack.contains("serviceA"));

            // Entering serviceA again is a cycle
            let cycle = stack.enter("serviceA").unwrap_err();
            assert_eq!(cycle, vec!["serviceA".to_string(), "serviceA".to_string()]);

            stack.leave("serviceA");
            assert!(!stack.contains("serviceA"));
            assert!(stack.is_empty());
        }

        #[test]
        fn test_cycle_path_keeps_order() {
            let mut stack = ResolutionStack::new();

            stack.enter("serviceA").unwrap();
            stack.enter("serviceB").unwrap();
            stack.enter("serviceC").unwrap();

            let cycle = stack.enter("serviceB").unwrap_err();
            assert_eq!(cycle, vec!["serviceA", "serviceB", "serviceC", "serviceB"]);
            assert_eq!(stack.depth(), 3);
        }

        #[test]
        fn test_leave_unwinds_to_empty() {
            let mut stack = ResolutionStack::new();

            stack.enter("config").unwrap();
            stack.enter("database").unwrap();
            stack.leave("database");
            stack.leave("config");

            assert!(stack.is_empty());
            assert!(stack.path().is_empty());
        }
    }
}
