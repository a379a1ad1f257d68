//! Intermediate representation of an exported package surface.
//!
//! The IR is produced once per generation run by `mobind-extract` and read by
//! every later stage. It is a closed set of variants so that each backend's
//! mapping can match exhaustively over type kinds.

mod decl;
mod package;
mod types;

pub use decl::{
    ConstDecl, ConstValue, Decl, FieldDecl, FuncDecl, InterfaceDecl, MethodDecl, Receiver,
    StructDecl, TypeDecl, TypeDeclKind, VarDecl,
};
pub use package::{PackageModel, PackageSet};
pub use types::{BasicKind, Param, Signature, Type, TypeKind, TypeName};

/// Upper-cases the first character of an identifier.
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-cases the leading run of capitals, keeping the last one of a
/// longer run when it starts a new word (`URLPath` → `urlPath`).
pub fn lower_first(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let upper = chars.iter().take_while(|c| c.is_uppercase()).count();
    let cut = match upper {
        0 => return s.to_string(),
        n if n == chars.len() => n,
        1 => 1,
        n => n - 1,
    };
    chars[..cut]
        .iter()
        .flat_map(|c| c.to_lowercase())
        .chain(chars[cut..].iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_casing() {
        assert_eq!(title_case("testpkg"), "Testpkg");
        assert_eq!(title_case(""), "");
        assert_eq!(lower_first("Value"), "value");
        assert_eq!(lower_first("URLPath"), "urlPath");
        assert_eq!(lower_first("ID"), "id");
        assert_eq!(lower_first("already"), "already");
    }
}
