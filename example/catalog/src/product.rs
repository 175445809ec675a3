use fluent_query_rust_lib::Entity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price_cents: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Entity for Product {
    const TYPE: &'static str = "product";

    fn id(&self) -> String {
        self.id.clone()
    }
}

fn product(id: &str, name: &str, category: &str, price_cents: u64, tags: &[&str]) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        price_cents,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn catalog() -> Vec<Product> {
    vec![
        product("p-001", "Espresso cup", "kitchen", 900, &["ceramic"]),
        product("p-002", "French press", "kitchen", 3_400, &["glass"]),
        product("p-003", "Desk lamp", "office", 4_900, &["led"]),
        product("p-004", "Notebook", "office", 650, &[]),
        product("p-005", "Fountain pen", "office", 12_000, &["gift"]),
        product("p-006", "Tea kettle", "kitchen", 5_500, &["steel", "gift"]),
    ]
}
