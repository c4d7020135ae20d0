use crate::message::{DrawOperation, OperationId};
use std::collections::HashSet;
use std::fmt;

/// Relay-owned log of every operation since the last clear. Append-only;
/// `clear` is the only way it shrinks.
#[derive(Debug, Default, Clone)]
pub struct OperationHistory {
    operations: Vec<DrawOperation>,
    ids: HashSet<OperationId>,
}

/// An operation with this id is already in the history.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DuplicateOperation(pub OperationId);

impl fmt::Display for DuplicateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation {} is already in the history", self.0)
    }
}

impl std::error::Error for DuplicateOperation {}

impl OperationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects an operation whose id was already appended since the last
    /// clear, leaving the history untouched.
    pub fn append(&mut self, op: DrawOperation) -> Result<(), DuplicateOperation> {
        if !self.ids.insert(op.id) {
            return Err(DuplicateOperation(op.id));
        }
        self.operations.push(op);
        Ok(())
    }

    pub fn clear(&mut self) {
        log::debug!("History cleared ({} operations dropped)", self.operations.len());
        self.operations.clear();
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[DrawOperation] {
        &self.operations
    }

    /// Copy handed to a joining client.
    pub fn snapshot(&self) -> Vec<DrawOperation> {
        self.operations.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Shape};
    use euclid::default::Point2D;

    fn op(x: f32) -> DrawOperation {
        DrawOperation::new(
            uuid::Uuid::new_v4(),
            Point2D::new(x, 0.0),
            1.0,
            Color::default(),
            Shape::Circle,
            false,
        )
    }

    #[test]
    fn it_should_keep_arrival_order() {
        let mut history = OperationHistory::new();
        let ops = vec![op(1.0), op(2.0), op(3.0)];
        for op in &ops {
            history.append(op.clone()).expect("fresh id");
        }
        assert_eq!(history.snapshot(), ops);
    }

    #[test]
    fn it_should_drop_everything_on_clear() {
        let mut history = OperationHistory::new();
        let first = op(1.0);
        history.append(first.clone()).expect("fresh id");
        history.clear();
        assert!(history.is_empty());
        history.append(op(2.0)).expect("fresh id");
        assert_eq!(history.len(), 1);
        // ids are forgotten with the operations they belonged to
        assert_eq!(history.append(first), Ok(()));
    }

    #[test]
    fn it_should_reject_an_operation_appended_twice() {
        let mut history = OperationHistory::new();
        let repeated = op(1.0);
        history.append(repeated.clone()).expect("fresh id");
        history.append(op(2.0)).expect("fresh id");

        assert_eq!(
            history.append(repeated.clone()),
            Err(DuplicateOperation(repeated.id))
        );
        assert_eq!(history.len(), 2);
        assert_eq!(history.operations()[0], repeated);
    }
}
