use component_macros::{beans, configuration};
use di_abstractions::{BeanMethods, DeclaredComponent};

struct Pool {
    url: String,
}

#[configuration(name = "dataConfig")]
struct DataConfig;

#[beans]
impl DataConfig {
    #[bean(name = "mainPool", primary)]
    fn pool(&self, #[value("db.url:memory")] url: String) -> Pool {
        Pool { url }
    }
}

#[configuration]
struct EmptyConfig;

impl BeanMethods for EmptyConfig {}

fn main() {
    let methods = DataConfig::bean_methods();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].component_name(), "mainPool");
    assert!(DataConfig::type_definition().is_configuration());
    assert!(EmptyConfig::type_definition().factory_methods.is_empty());
}
