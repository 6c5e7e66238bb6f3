//! Relations between record types by identifier.

/// Relation from a field to another record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Name of the target record type
    pub target: String,
}

impl Relation {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Pairing of a relation's identifier column with its semantic name.
///
/// Identifier-level comparisons use `column`; writes into a partial
/// update use `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationAlias {
    /// Storage column holding the related identifier
    pub column: String,
    /// Semantic relation name
    pub name: String,
    /// Related record type
    pub target: String,
}
