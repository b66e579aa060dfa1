use thiserror::Error;

/// Raised only when an input has the wrong overall shape.
///
/// Bad individual records are skipped instead; see the catalog walker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("catalog has no `Items` object at its root")]
    MissingItemsRoot,
    #[error("market snapshot is not a sequence of records")]
    SnapshotNotSequence,
}
