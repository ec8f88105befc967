//! Shared fixture for checker integration tests.

use gdsem_ast::builder::AstBuilder;
use gdsem_ast::node::NodeIndex;
use gdsem_ast::FileAst;
use gdsem_binder::BinderState;
use gdsem_checker::CheckerContext;
use gdsem_common::interner::{Atom, ShardedInterner};
use gdsem_common::options::AnalysisOptions;
use gdsem_runtime::{core_catalog, RuntimeCatalog};
use std::sync::Arc;

pub struct Fixture {
    pub file: FileAst,
    pub binder: BinderState,
    pub catalog: RuntimeCatalog,
}

impl Fixture {
    /// Build an AST, bind it, and seed the core runtime catalog.
    pub fn new(build: impl FnOnce(&mut AstBuilder) -> NodeIndex) -> Self {
        let interner = Arc::new(ShardedInterner::new());
        let catalog = core_catalog(Arc::clone(&interner));
        let mut b = AstBuilder::new(Arc::clone(&interner));
        let root = build(&mut b);
        let file = b.finish("res://fixture.gd", root);
        let binder = BinderState::bind_file(&file.arena, file.root, interner);
        Fixture {
            file,
            binder,
            catalog,
        }
    }

    pub fn ctx(&self) -> CheckerContext<'_> {
        CheckerContext::new(
            &self.file.arena,
            &self.binder,
            &self.catalog,
            AnalysisOptions::default(),
        )
    }

    pub fn atom(&self, text: &str) -> Atom {
        self.binder.interner.intern(text)
    }
}
