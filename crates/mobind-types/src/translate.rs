//! Generation-side translation of the source failure convention.
//!
//! A source signature carries at most one value result plus a trailing
//! failure indicator. Each backend signals that failure its own way.

use mobind_ir::{Signature, Type};
use mobind_source::Backend;

use crate::error::MapResult;
use crate::mapping::{TypeMapper, TypeMapping, ABI_HANDLE};

/// How a backend signals the failure indicator of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureIdiom {
    /// The target method declares a checked throwable.
    Throws { class: String },
    /// A trailing out-parameter receives the error object.
    OutParam { ty: String },
    /// The error travels back as an extra result handle.
    ExtraResult { abi: String },
}

pub fn failure_idiom(backend: Backend) -> FailureIdiom {
    match backend {
        Backend::Java => FailureIdiom::Throws {
            class: "java.lang.Exception".to_string(),
        },
        Backend::ObjC => FailureIdiom::OutParam {
            ty: "NSError* _Nullable* _Nullable".to_string(),
        },
        Backend::Go => FailureIdiom::ExtraResult {
            abi: ABI_HANDLE.to_string(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedParam {
    pub name: String,
    pub ty: Type,
    pub mapping: TypeMapping,
}

/// A signature with every type mapped onto one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSignature {
    pub params: Vec<MappedParam>,
    pub ret: Option<TypeMapping>,
    pub failure: Option<FailureIdiom>,
}

impl MappedSignature {
    /// Objective-C methods that can only fail report success as `BOOL`.
    pub fn returns_status(&self) -> bool {
        self.ret.is_none() && matches!(self.failure, Some(FailureIdiom::OutParam { .. }))
    }

    pub fn is_fallible(&self) -> bool {
        self.failure.is_some()
    }
}

impl<'a> TypeMapper<'a> {
    pub fn map_signature(&self, sig: &Signature) -> MapResult<MappedSignature> {
        let params = sig
            .params
            .iter()
            .map(|p| {
                Ok(MappedParam {
                    name: p.name.clone(),
                    ty: p.ty.clone(),
                    mapping: self.map(&p.ty)?,
                })
            })
            .collect::<MapResult<Vec<_>>>()?;
        let ret = sig.ret.as_ref().map(|r| self.map(r)).transpose()?;
        let failure = sig.fallible.then(|| failure_idiom(self.backend));
        Ok(MappedSignature {
            params,
            ret,
            failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingTable;
    use crate::naming::Naming;
    use mobind_ir::{BasicKind, PackageSet, Param};

    #[test]
    fn fallible_signatures_use_the_backend_idiom() {
        let table = MappingTable::standard();
        let set = PackageSet::default();
        let naming = Naming::default();
        let sig = Signature::new(vec![Param::new("s", Type::Basic(BasicKind::String))], None, true);

        let objc = TypeMapper::new(&table, &set, &naming, Backend::ObjC)
            .map_signature(&sig)
            .unwrap();
        assert!(objc.returns_status());

        let java = TypeMapper::new(&table, &set, &naming, Backend::Java)
            .map_signature(&sig)
            .unwrap();
        assert!(!java.returns_status());
        assert_eq!(
            java.failure,
            Some(FailureIdiom::Throws {
                class: "java.lang.Exception".into()
            })
        );

        let infallible = Signature::new(vec![], Some(Type::Basic(BasicKind::Int32)), false);
        let go = TypeMapper::new(&table, &set, &naming, Backend::Go)
            .map_signature(&infallible)
            .unwrap();
        assert!(!go.is_fallible());
        assert_eq!(go.ret.unwrap().native, "C.int32_t");
    }
}
