//! Shared fixture for model integration tests.

use gdsem_ast::builder::AstBuilder;
use gdsem_ast::node::NodeIndex;
use gdsem_ast::FileAst;
use gdsem_common::interner::{Atom, ShardedInterner};
use gdsem_common::options::AnalysisOptions;
use gdsem_model::{ProjectModel, SemanticModel};
use gdsem_runtime::{core_catalog, RuntimeCatalog, RuntimeProvider};
use std::sync::Arc;

pub struct Workbench {
    pub interner: Arc<ShardedInterner>,
    pub catalog: Arc<RuntimeCatalog>,
}

impl Workbench {
    pub fn new() -> Self {
        // Honor RUST_LOG when a test run wants analyzer traces.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        let interner = Arc::new(ShardedInterner::new());
        let catalog = Arc::new(core_catalog(Arc::clone(&interner)));
        Workbench { interner, catalog }
    }

    pub fn file(
        &self,
        path: &str,
        build: impl FnOnce(&mut AstBuilder) -> NodeIndex,
    ) -> FileAst {
        let mut b = AstBuilder::new(Arc::clone(&self.interner));
        let root = build(&mut b);
        b.finish(path, root)
    }

    pub fn model(&self, path: &str, build: impl FnOnce(&mut AstBuilder) -> NodeIndex) -> SemanticModel {
        SemanticModel::build(
            self.file(path, build),
            self.catalog.as_ref(),
            AnalysisOptions::default(),
        )
    }

    pub fn project(&self) -> ProjectModel {
        let runtime: Arc<dyn RuntimeProvider> = Arc::clone(&self.catalog) as Arc<dyn RuntimeProvider>;
        ProjectModel::new(runtime, AnalysisOptions::default())
    }

    pub fn atom(&self, text: &str) -> Atom {
        self.interner.intern(text)
    }
}
