use crate::Entity;
use crate::template::memory::InMemoryTemplate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub pages: u32,
    pub genre: String,
}

impl Entity for Book {
    const TYPE: &'static str = "Book";

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Entity for Author {
    const TYPE: &'static str = "Author";

    fn id(&self) -> String {
        self.id.clone()
    }
}

pub fn book(id: &str, title: &str, pages: u32, genre: &str) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        pages,
        genre: genre.to_string(),
    }
}

pub fn books() -> Vec<Book> {
    vec![
        book("b1", "Foundation", 310, "sf"),
        book("b2", "Dune", 896, "sf"),
        book("b3", "Emma", 412, "classic"),
        book("b4", "Candide", 180, "classic"),
    ]
}

/// Stores `books()` plus one author in `collection`.
pub async fn seed_books(template: &InMemoryTemplate, collection: &str) {
    for book in books() {
        template.upsert(collection, &book).await.unwrap();
    }
    let author = Author {
        id: "a1".to_string(),
        name: "Voltaire".to_string(),
    };
    template.upsert(collection, &author).await.unwrap();
}
