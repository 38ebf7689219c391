//! Command name routing.
//!
//! DAS commands are addressed by name. Server-level commands (`dsn`) need no
//! data source; every other command is routed to a registered source.

use super::errors::DasError;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Known DAS commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Lists the data sources the server answers for.
    Dsn,
    /// Annotated features over segments or feature identifiers.
    Features,
    /// Feature type summaries.
    Types,
    /// Reference sequence.
    Sequence,
    /// Reference sequence under its legacy name.
    Dna,
    /// Top-level segments of a reference source.
    EntryPoints,
    /// Rendering hints for clients.
    Stylesheet,
    /// External link for an annotation element.
    Link,
    /// Macromolecular structure.
    Structure,
    /// Multiple alignment.
    Alignment,
}

impl Command {
    /// Every command, in routing order.
    pub const ALL: [Self; 10] = [
        Self::Dsn,
        Self::Features,
        Self::Types,
        Self::Sequence,
        Self::Dna,
        Self::EntryPoints,
        Self::Stylesheet,
        Self::Link,
        Self::Structure,
        Self::Alignment,
    ];

    /// Parses a command name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `DasError::BadCommand` if the name is not a DAS command.
    pub fn parse(value: &str) -> Result<Self, DasError> {
        let lowered = value.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|command| command.as_str() == lowered)
            .ok_or_else(|| DasError::bad_command(value))
    }

    /// Returns the canonical command name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dsn => "dsn",
            Self::Features => "features",
            Self::Types => "types",
            Self::Sequence => "sequence",
            Self::Dna => "dna",
            Self::EntryPoints => "entry_points",
            Self::Stylesheet => "stylesheet",
            Self::Link => "link",
            Self::Structure => "structure",
            Self::Alignment => "alignment",
        }
    }

    /// Returns `true` for commands answered by the server itself.
    #[must_use]
    pub const fn is_server_level(self) -> bool {
        matches!(self, Self::Dsn)
    }
}
