// file: src/parser/facts.rs
// description: fact and entity extraction from uploaded document text
// reference: https://docs.rs/regex

use crate::parser::patterns::{
    ADDRESS, AMOUNT_INR, DATE, EMAIL, LEGAL_TERM_CONTEXT, PERSON_NAME, PHONE_IN,
};
use serde::{Deserialize, Serialize};

const CONTEXT_MATCHES_PER_TERM: usize = 3;
const MAX_PERSON_ENTITIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Phone,
    Email,
    Person,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub value: String,
}

pub struct FactExtractor {
    max_facts: usize,
}

impl FactExtractor {
    pub fn new(max_facts: usize) -> Self {
        Self { max_facts }
    }

    /// Dates, rupee amounts, addresses and legal-term context, in that
    /// order, capped at `max_facts`.
    pub fn extract_facts(&self, text: &str) -> Vec<String> {
        let mut facts = Vec::new();

        facts.extend(
            DATE.find_iter(text)
                .map(|m| format!("Date mentioned: {}", m.as_str())),
        );

        facts.extend(
            AMOUNT_INR
                .find_iter(text)
                .map(|m| format!("Amount mentioned: {}", m.as_str())),
        );

        facts.extend(
            ADDRESS
                .find_iter(text)
                .map(|m| format!("Address mentioned: {}", m.as_str().trim())),
        );

        for (_, pattern) in LEGAL_TERM_CONTEXT.iter() {
            facts.extend(
                pattern
                    .find_iter(text)
                    .take(CONTEXT_MATCHES_PER_TERM)
                    .map(|m| format!("Legal context: {}", m.as_str().trim())),
            );
        }

        facts.truncate(self.max_facts);
        facts
    }

    pub fn extract_entities(&self, text: &str) -> Vec<Entity> {
        let phones = PHONE_IN.find_iter(text).map(|m| Entity {
            entity_type: EntityType::Phone,
            value: m.as_str().to_string(),
        });

        let emails = EMAIL.find_iter(text).map(|m| Entity {
            entity_type: EntityType::Email,
            value: m.as_str().to_string(),
        });

        let people = PERSON_NAME
            .find_iter(text)
            .take(MAX_PERSON_ENTITIES)
            .map(|m| Entity {
                entity_type: EntityType::Person,
                value: m.as_str().to_string(),
            });

        phones.chain(emails).chain(people).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LEASE: &str = "Lease agreement dated 01/04/2023 between Ravi Kumar and Meena Sundaram.\n\
        Premises: 12 Anna Nagar, Chennai.\n\
        Monthly rent ₹15,000 and deposit Rs. 50,000.\n\
        Contact 9876543210 or ravi@example.com.";

    #[test]
    fn test_fact_ordering_and_kinds() {
        let facts = FactExtractor::new(20).extract_facts(LEASE);

        assert_eq!(facts[0], "Date mentioned: 01/04/2023");
        assert_eq!(facts[1], "Amount mentioned: ₹15,000");
        assert_eq!(facts[2], "Amount mentioned: Rs. 50,000");
        assert_eq!(facts[3], "Address mentioned: 12 Anna Nagar");
        assert!(facts.iter().any(|f| f.starts_with("Legal context:") && f.contains("agreement")));
        assert!(facts.iter().any(|f| f.starts_with("Legal context:") && f.contains("deposit")));
    }

    #[test]
    fn test_fact_cap() {
        let text = "notice ".repeat(10) + &"12/12/2020 ".repeat(30);
        let facts = FactExtractor::new(20).extract_facts(&text);
        assert_eq!(facts.len(), 20);
        assert!(facts.iter().all(|f| f.starts_with("Date mentioned")));
    }

    #[test]
    fn test_context_limited_per_term() {
        let text = ["the penalty applies"; 6].join("\n");
        let facts = FactExtractor::new(20).extract_facts(&text);
        assert_eq!(facts.len(), 3);
    }

    #[test]
    fn test_entities() {
        let entities = FactExtractor::new(20).extract_entities(LEASE);

        assert_eq!(
            entities[0],
            Entity {
                entity_type: EntityType::Phone,
                value: "9876543210".to_string()
            }
        );
        assert_eq!(entities[1].entity_type, EntityType::Email);
        assert_eq!(entities[1].value, "ravi@example.com");
        assert!(
            entities
                .iter()
                .any(|e| e.entity_type == EntityType::Person && e.value == "Ravi Kumar")
        );
    }

    #[test]
    fn test_entity_serializes_with_type_key() {
        let entity = Entity {
            entity_type: EntityType::Person,
            value: "Meena Sundaram".to_string(),
        };
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "person");
    }
}
