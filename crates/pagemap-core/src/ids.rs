use crate::NodeId;

/// Source of fresh page ids for operations that mint new nodes (duplicate).
///
/// Generators do not need to know the model; callers skip any id that is
/// already taken.
pub trait IdGenerator {
    fn next_id(&mut self) -> NodeId;
}

/// Random v4 UUID ids. Default for interactive sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> NodeId {
        NodeId(uuid::Uuid::new_v4().to_string())
    }
}

/// Deterministic `<prefix><n>` ids, handy for scripts and tests.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_count_up() {
        let mut ids = SequentialIds::new("copy-");
        assert_eq!(ids.next_id(), NodeId::from("copy-1"));
        assert_eq!(ids.next_id(), NodeId::from("copy-2"));
    }

    #[test]
    fn test_uuid_ids_differ() {
        let mut ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
