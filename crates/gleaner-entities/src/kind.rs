//! Entity kinds of the provenance graph

use std::fmt;

/// The eight repository types a harvested run is described with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A submitter of the run
    Person,
    /// One transferred artifact file
    FileObject,
    /// An aggregate of files (per-group or the root)
    Dataset,
    /// The run itself, as an action with a time window
    CreateAction,
    /// A declared input parameter of the workflow
    FormalParameter,
    /// A concrete value bound to an input parameter
    PropertyValue,
    /// The language the workflow is written in
    ComputerLanguage,
    /// The reconstructed workflow definition
    Workflow,
}

impl EntityKind {
    /// Every kind, in saga creation order.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Person,
        EntityKind::FileObject,
        EntityKind::Dataset,
        EntityKind::CreateAction,
        EntityKind::FormalParameter,
        EntityKind::PropertyValue,
        EntityKind::ComputerLanguage,
        EntityKind::Workflow,
    ];

    /// Repository type name this kind is created as.
    #[inline]
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::FileObject => "FileObject",
            Self::Dataset => "Dataset",
            Self::CreateAction => "CreateAction",
            Self::FormalParameter => "FormalParameter",
            Self::PropertyValue => "PropertyValue",
            Self::ComputerLanguage => "ComputerLanguage",
            Self::Workflow => "Workflow",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
