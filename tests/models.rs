#![allow(dead_code)]

use fluent_query_rust_lib::Entity;
use fluent_query_rust_lib::template::memory::InMemoryTemplate;
use serde::{Deserialize, Serialize};

pub const AIRLINES: &str = "inventory.airline";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Airline {
    pub id: String,
    pub name: String,
    pub country: String,
    pub callsign: Option<String>,
}

impl Entity for Airline {
    const TYPE: &'static str = "airline";

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub id: String,
    pub city: String,
}

impl Entity for Airport {
    const TYPE: &'static str = "airport";

    fn id(&self) -> String {
        self.id.clone()
    }
}

fn airline(id: &str, name: &str, country: &str, callsign: Option<&str>) -> Airline {
    Airline {
        id: id.to_string(),
        name: name.to_string(),
        country: country.to_string(),
        callsign: callsign.map(str::to_string),
    }
}

pub fn airlines() -> Vec<Airline> {
    vec![
        airline("airline_10", "40-Mile Air", "United States", Some("MILE-AIR")),
        airline("airline_137", "Air France", "France", Some("AIRFRANS")),
        airline("airline_1355", "British Airways", "United Kingdom", Some("SPEEDBIRD")),
        airline("airline_5209", "United Airlines", "United States", Some("UNITED")),
        airline("airline_9833", "Texas Wings", "United States", None),
    ]
}

pub async fn seed(template: &InMemoryTemplate, collection: &str) {
    for airline in airlines() {
        template.upsert(collection, &airline).await.unwrap();
    }
    let airport = Airport {
        id: "airport_1254".to_string(),
        city: "Calais".to_string(),
    };
    template.upsert(collection, &airport).await.unwrap();
}
