use mobind_source::Backend;

use crate::context::EmitContext;
use crate::unit::EmissionUnit;
use crate::{go, java, objc};

/// Every unit `backend` generates for the packages of a run, in package
/// order. The go backend adds the table glue its packages share.
pub fn emit_backend(ctx: &EmitContext<'_>, backend: Backend) -> Vec<EmissionUnit> {
    let mut units = Vec::new();
    if backend == Backend::Go {
        units.push(go::runtime(ctx));
    }
    for pkg in ctx.set.packages() {
        let emitted = match backend {
            Backend::Java => java::emit(ctx, pkg),
            Backend::ObjC => objc::emit(ctx, pkg),
            Backend::Go => go::emit(ctx, pkg),
        };
        log::debug!("{}: {} unit(s) for {}", backend, emitted.len(), pkg.path);
        units.extend(emitted);
    }
    units
}
