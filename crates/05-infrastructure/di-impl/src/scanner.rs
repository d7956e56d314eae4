//! 基于类型目录的扫描器

use di_abstractions::{TypeCatalog, TypeScanner};
use infrastructure_common::ComponentError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// 在类型目录中按路径前缀筛选候选类型
#[derive(Debug, Clone)]
pub struct CatalogScanner {
    catalog: Arc<TypeCatalog>,
}

impl CatalogScanner {
    /// 在给定类型目录上创建扫描器
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self { catalog }
    }
}

impl TypeScanner for CatalogScanner {
    fn scan(&self, roots: &[String]) -> Result<Vec<String>, ComponentError> {
        let mut found = BTreeSet::new();
        for root in roots {
            let before = found.len();
            for name in self.catalog.type_names() {
                if infrastructure_common::TypeKey::named(&name).is_under(root) {
                    found.insert(name);
                }
            }
            debug!("扫描根 '{}' 找到 {} 个类型", root, found.len() - before);
        }
        Ok(found.into_iter().collect())
    }

    fn name(&self) -> &str {
        "CatalogScanner"
    }
}
