use component_macros::component;
use di_abstractions::{DeclaredComponent, TypeCatalog};
use once_cell::sync::OnceCell;
use std::sync::Arc;

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[component(implements(dyn Clock))]
struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        0
    }
}

#[component(name = "reportService", order = 5, primary)]
#[lifecycle(post_construct = "open")]
struct ReportService {
    #[autowired]
    clock: Arc<dyn Clock>,
    #[value("reports.title:Daily")]
    title: String,
    #[autowired(optional)]
    fallback: OnceCell<Arc<SystemClock>>,
    rendered: parking_lot::Mutex<usize>,
}

impl ReportService {
    fn open(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

fn main() {
    let definition = ReportService::type_definition();
    assert_eq!(definition.constructors.len(), 1);
    assert_eq!(definition.members.len(), 1);
    assert!(definition.is_primary());

    let mut catalog = TypeCatalog::new();
    catalog
        .register_declared::<SystemClock>()
        .unwrap()
        .register_declared::<ReportService>()
        .unwrap();
}
