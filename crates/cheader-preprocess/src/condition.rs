//! Conditional inclusion state.

/// Nested `#if` state: whether each level is active, and whether any
/// branch of each level has been taken yet.
#[derive(Debug, Clone)]
pub(crate) struct ConditionStack {
    active: Vec<bool>,
    hit: Vec<bool>,
}

/// Stray `#elif`/`#else`/`#endif`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unbalanced;

impl ConditionStack {
    pub fn new() -> Self {
        Self {
            active: vec![true],
            hit: Vec::new(),
        }
    }

    /// Lines at the current position are kept
    pub fn is_active(&self) -> bool {
        self.active.last().copied().unwrap_or(true)
    }

    fn parents_active(&self) -> bool {
        self.active[..self.active.len() - 1].iter().all(|a| *a)
    }

    /// Open `#if` blocks
    pub fn depth(&self) -> usize {
        self.hit.len()
    }

    /// Enter an `#if`. `condition` is only evaluated when the enclosing
    /// region is active.
    pub fn push_if(&mut self, condition: impl FnOnce() -> bool) {
        let taken = self.is_active() && condition();
        self.active.push(taken);
        self.hit.push(taken);
    }

    /// `condition` is only evaluated when no earlier branch was taken and
    /// the enclosing region is active.
    pub fn elif(&mut self, condition: impl FnOnce() -> bool) -> Result<(), Unbalanced> {
        let hit = *self.hit.last().ok_or(Unbalanced)?;
        let taken = !hit && self.parents_active() && condition();
        let depth = self.hit.len();
        self.active[depth] = taken;
        self.hit[depth - 1] = hit || taken;
        Ok(())
    }

    pub fn else_branch(&mut self) -> Result<(), Unbalanced> {
        let hit = *self.hit.last().ok_or(Unbalanced)?;
        let depth = self.hit.len();
        self.active[depth] = !hit && self.parents_active();
        self.hit[depth - 1] = true;
        Ok(())
    }

    pub fn endif(&mut self) -> Result<(), Unbalanced> {
        self.hit.pop().ok_or(Unbalanced)?;
        self.active.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_else() {
        let mut stack = ConditionStack::new();
        stack.push_if(|| false);
        assert!(!stack.is_active());
        stack.else_branch().unwrap();
        assert!(stack.is_active());
        stack.endif().unwrap();
        assert!(stack.is_active());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_only_first_true_branch_taken() {
        let mut stack = ConditionStack::new();
        stack.push_if(|| false);
        stack.elif(|| true).unwrap();
        assert!(stack.is_active());
        stack.elif(|| true).unwrap();
        assert!(!stack.is_active());
        stack.else_branch().unwrap();
        assert!(!stack.is_active());
    }

    #[test]
    fn test_inactive_parent_suppresses_children() {
        let mut stack = ConditionStack::new();
        stack.push_if(|| false);
        let mut evaluated = false;
        stack.push_if(|| {
            evaluated = true;
            true
        });
        assert!(!evaluated);
        stack.else_branch().unwrap();
        assert!(!stack.is_active());
        stack.endif().unwrap();
        stack.else_branch().unwrap();
        assert!(stack.is_active());
    }

    #[test]
    fn test_underflow() {
        let mut stack = ConditionStack::new();
        assert_eq!(stack.endif(), Err(Unbalanced));
        assert_eq!(stack.else_branch(), Err(Unbalanced));
        assert_eq!(stack.elif(|| true), Err(Unbalanced));
        assert!(stack.is_active());
    }
}
