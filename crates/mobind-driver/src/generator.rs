//! The binding pipeline.
//!
//! extract -> per-backend type check -> proxies -> name collisions -> emit.
//! Each stage appends to one diagnostic list. Extraction drops the
//! declarations it rejects, so the later checks still run on what survived
//! and a single run reports every problem. Any error in the list stops the
//! run before emission.

use mobind_codegen::{check_collisions, emit_backend, EmitContext, UnitSet};
use mobind_extract::extract;
use mobind_ir::PackageSet;
use mobind_proxy::{generate_proxies, ProxySet};
use mobind_source::{Backend, BindOptions, Diagnostics, ExportData};
use mobind_types::{check_backends, MappingTable, Naming};

use crate::error::{DriverError, DriverResult};

/// Output of a successful run.
#[derive(Debug)]
pub struct Generation {
    pub units: UnitSet,
    /// Warnings only; a run with errors never produces a `Generation`.
    pub diagnostics: Diagnostics,
}

/// A validated model, ready for emission.
struct Checked {
    set: PackageSet,
    proxies: ProxySet,
    diagnostics: Diagnostics,
}

pub struct Generator {
    options: BindOptions,
    table: MappingTable,
    naming: Naming,
}

impl Generator {
    /// The source-side glue is part of every run, so `go` is always added
    /// to the requested targets.
    pub fn new(mut options: BindOptions) -> Self {
        if !options.wants(Backend::Go) {
            options.targets.push(Backend::Go);
            options.targets.sort();
        }
        let naming = Naming::from_options(&options);
        Generator {
            options,
            table: MappingTable::standard(),
            naming,
        }
    }

    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    fn stop_on_errors(diagnostics: &Diagnostics) -> DriverResult<()> {
        if !diagnostics.has_errors() {
            return Ok(());
        }
        let errors = diagnostics.errors().count();
        log::error!("Validation reported {} error(s); nothing will be written", errors);
        Err(DriverError::Aborted {
            errors,
            diagnostics: diagnostics.iter().cloned().collect(),
        })
    }

    fn context<'a>(&'a self, checked: &'a Checked) -> EmitContext<'a> {
        EmitContext {
            set: &checked.set,
            table: &self.table,
            naming: &self.naming,
            options: &self.options,
            proxies: &checked.proxies,
        }
    }

    fn validate(&self, data: &ExportData) -> DriverResult<Checked> {
        let extraction = extract(data);
        let mut diagnostics = extraction.diagnostics;
        let set = extraction.packages;

        diagnostics.extend(check_backends(&set, &self.table, &self.naming, &self.options.targets));

        let output = generate_proxies(&set, &self.table, &self.naming, &self.options);
        diagnostics.extend(output.diagnostics);

        let mut checked = Checked {
            set,
            proxies: output.proxies,
            diagnostics: Diagnostics::new(),
        };
        diagnostics.extend(check_collisions(&self.context(&checked)));
        Self::stop_on_errors(&diagnostics)?;
        checked.diagnostics = diagnostics;
        Ok(checked)
    }

    /// Runs every validation stage without emitting anything.
    pub fn check(&self, data: &ExportData) -> DriverResult<Diagnostics> {
        Ok(self.validate(data)?.diagnostics)
    }

    /// Runs the whole pipeline. Backends are emitted concurrently, one
    /// scoped worker each.
    pub fn generate(&self, data: &ExportData) -> DriverResult<Generation> {
        let checked = self.validate(data)?;
        let ctx = self.context(&checked);

        let emitted = crossbeam::thread::scope(|scope| {
            let workers: Vec<_> = self
                .options
                .targets
                .iter()
                .map(|&backend| {
                    let ctx = &ctx;
                    (backend, scope.spawn(move |_| emit_backend(ctx, backend)))
                })
                .collect();
            workers
                .into_iter()
                .map(|(backend, worker)| {
                    worker
                        .join()
                        .map_err(|_| DriverError::EmitterPanicked(backend.to_string()))
                })
                .collect::<DriverResult<Vec<_>>>()
        })
        .map_err(|_| DriverError::EmitterPanicked("a backend".to_string()))??;

        let mut units = UnitSet::new();
        for batch in emitted {
            units.extend(batch);
        }
        log::info!(
            "Generated {} file(s) for {} package(s)",
            units.len(),
            checked.set.packages().len()
        );
        Ok(Generation {
            units,
            diagnostics: checked.diagnostics,
        })
    }
}
