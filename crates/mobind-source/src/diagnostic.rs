//! Generation-time diagnostics.
//!
//! Every stage pushes into a `Diagnostics` list instead of returning on the
//! first problem. The driver inspects the list between stages and aborts the
//! run as soon as it contains an error, reporting all of them at once.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::Backend;

/// A problem found while binding a package.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum BindDiagnostic {
    /// A declaration or member was left out of the binding surface.
    #[error("skipped {decl}: {reason}")]
    #[diagnostic(code("BIND-W01"), severity(Warning))]
    Excluded { decl: String, reason: String },

    /// An interface is bound as a value proxy only.
    #[error("interface {interface} cannot be implemented by target code: {reason}")]
    #[diagnostic(code("BIND-W02"), severity(Warning))]
    NotImplementable { interface: String, reason: String },

    #[error("unsupported construct in {decl}: {ty} ({reason})")]
    #[diagnostic(
        code("BIND-001"),
        help("Remove the declaration from the exported surface or change it to use supported types")
    )]
    UnsupportedConstruct {
        decl: String,
        ty: String,
        reason: String,
    },

    #[error("unsupported construct in {decl}: {ty} cannot be represented by the {backend} backend ({reason})")]
    #[diagnostic(
        code("BIND-002"),
        help("Drop the backend from the target list or avoid this type in exported declarations")
    )]
    UnsupportedOnBackend {
        decl: String,
        ty: String,
        backend: Backend,
        reason: String,
    },

    #[error("name collision in {backend} output: {first} and {second} both generate `{generated}`")]
    #[diagnostic(
        code("BIND-003"),
        help("Rename one of the declarations or choose a different prefix")
    )]
    NameCollision {
        backend: Backend,
        generated: String,
        first: String,
        second: String,
    },

    #[error("invalid export metadata for {decl}: {message}")]
    #[diagnostic(code("BIND-004"))]
    InvalidMetadata { decl: String, message: String },
}

/// Broad category of a diagnostic, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Excluded,
    NotImplementable,
    UnsupportedConstruct,
    NameCollision,
    InvalidMetadata,
}

impl BindDiagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            BindDiagnostic::Excluded { .. } => DiagnosticKind::Excluded,
            BindDiagnostic::NotImplementable { .. } => DiagnosticKind::NotImplementable,
            BindDiagnostic::UnsupportedConstruct { .. }
            | BindDiagnostic::UnsupportedOnBackend { .. } => DiagnosticKind::UnsupportedConstruct,
            BindDiagnostic::NameCollision { .. } => DiagnosticKind::NameCollision,
            BindDiagnostic::InvalidMetadata { .. } => DiagnosticKind::InvalidMetadata,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            BindDiagnostic::Excluded { .. } | BindDiagnostic::NotImplementable { .. }
        )
    }
}

/// An ordered diagnostic list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<BindDiagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: BindDiagnostic) {
        if diagnostic.is_error() {
            log::debug!("error: {}", diagnostic);
        } else {
            log::warn!("{}", diagnostic);
        }
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(BindDiagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &BindDiagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &BindDiagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BindDiagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<BindDiagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = BindDiagnostic;
    type IntoIter = std::vec::IntoIter<BindDiagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut diags = Diagnostics::new();
        diags.push(BindDiagnostic::Excluded {
            decl: "Pipe".into(),
            reason: "channel types are not supported".into(),
        });
        assert!(!diags.has_errors());

        diags.push(BindDiagnostic::NameCollision {
            backend: Backend::ObjC,
            generated: "GoPkgFoo".into(),
            first: "type Foo".into(),
            second: "func Foo".into(),
        });
        assert!(diags.has_errors());
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn messages_name_the_declaration_and_type() {
        let diag = BindDiagnostic::UnsupportedOnBackend {
            decl: "func Hash".into(),
            ty: "uint64".into(),
            backend: Backend::Java,
            reason: "no unsigned 64-bit type".into(),
        };
        let text = diag.to_string();
        assert!(text.contains("func Hash"));
        assert!(text.contains("uint64"));
        assert!(text.contains("java"));
        assert_eq!(diag.kind(), DiagnosticKind::UnsupportedConstruct);
    }
}
