//! The `.entities` text format.
//!
//! A document is the `Version 6` header followed by definition blocks, each holding
//! exactly one entity block:
//!
//! ```text
//! Version 6
//! entity {
//!     entityDef player_start {
//!         class = "idPlayerStart";
//!         edit = {
//!             spawnPosition = { x = 12.5; y = -3; z = 0; }
//!         }
//!     }
//! }
//! ```

use std::io::{ErrorKind, Read};

mod builder;
mod error;
mod tokenizer;
mod value;

use builder::EntityBuilder;
use indexmap::IndexMap;

pub use error::ParseError;
pub use tokenizer::{Direction, Event, Tokenizer};
pub use value::{to_list, to_matrix, Map, Value};

pub const HEADER: &[u8; 9] = b"Version 6";

const CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub definition_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub fields: Map,
}

impl Entity {
    #[inline(always)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The entity as a JSON object, with the header fields alongside its own fields.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert(
            "definition_type".into(),
            self.definition_type.clone().into(),
        );
        object.insert("entity_type".into(), self.entity_type.clone().into());
        object.insert("entity_id".into(), self.entity_id.clone().into());
        for (key, value) in self.fields.iter() {
            object.insert(key.clone(), value.to_json());
        }
        serde_json::Value::Object(object)
    }
}

/// A parsed document, keyed by entity id in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities(IndexMap<String, Entity>);

impl Entities {
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.0.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.0.values()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(id, entity)| (id.clone(), entity.to_json()))
                .collect(),
        )
    }

    pub fn into_inner(self) -> IndexMap<String, Entity> {
        self.0
    }
}

/// Incremental parser for the body of a document, after its header.
#[derive(Debug)]
pub struct Parser {
    tokenizer: Tokenizer,
    builder: EntityBuilder,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            tokenizer: Tokenizer::starting_at(HEADER.len() as u64),
            builder: EntityBuilder::new(),
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        let builder = &mut self.builder;
        self.tokenizer
            .feed(chunk, |event, at| builder.handle(event, at))
    }

    pub fn finish(self) -> Result<Entities, ParseError> {
        let Parser { tokenizer, builder } = self;
        let at = tokenizer.offset();
        let trailing = tokenizer.finish()?;
        let mut builder = builder;
        if !trailing.is_empty() {
            builder.handle(Event::Token(trailing), at)?;
        }
        let entities = builder.finish()?;
        tracing::debug!(entities = entities.len(), bytes = at, "parsed entities");
        Ok(Entities(entities))
    }
}

fn check_header(data: &[u8]) -> Result<(), ParseError> {
    if data.len() < HEADER.len() || &data[..HEADER.len()] != HEADER {
        return Err(ParseError::InvalidHeader(
            data[..data.len().min(HEADER.len())].to_vec(),
        ));
    }
    Ok(())
}

/// Parses a whole document held in memory.
pub fn parse(data: &[u8]) -> Result<Entities, ParseError> {
    check_header(data)?;

    let mut parser = Parser::new();
    for chunk in data[HEADER.len()..].chunks(CHUNK_SIZE) {
        parser.feed(chunk)?;
    }
    parser.finish()
}

/// Parses a document from a reader, a chunk at a time.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<Entities, ParseError> {
    let mut header = Vec::with_capacity(HEADER.len());
    (&mut reader)
        .take(HEADER.len() as u64)
        .read_to_end(&mut header)?;
    check_header(&header)?;

    let mut parser = Parser::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        parser.feed(&buf[..n])?;
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &[u8] = br#"Version 6
HierarchyVersion 1
entity {
	entityDef player_start {
	inherit = "player/start";
	class = "idPlayerStart";
	expandInheritance = false;
	poolCount = 0;
	edit = {
		spawnPosition = {
			x = 12.5;
			y = -3;
			z = 0;
		}
		targets = {
			num = 2;
			item[0] = "door_1";
			item[1] = "door_2";
		}
		flavour = "say \"hi\"";
		owner = NULL;
	}
}
}
entity {
	entityDef door_1 {
	class = "idDoor";
	}
}
"#;

    #[test]
    fn scenario_a() {
        let entities = parse(b"Version 6\nuserdef {\n idEntity e1 {\n hp = 100;\n }\n}\n").unwrap();
        assert_eq!(entities.len(), 1);

        let entity = entities.get("e1").unwrap();
        assert_eq!(entity.definition_type, "userdef");
        assert_eq!(entity.entity_type, "idEntity");
        assert_eq!(entity.entity_id, "e1");
        assert_eq!(entity.get("hp").and_then(Value::as_str), Some("100"));
    }

    #[test]
    fn level_document() {
        let entities = parse(LEVEL).unwrap();
        assert_eq!(entities.len(), 2);

        let start = entities.get("player_start").unwrap();
        assert_eq!(start.get("poolCount"), Some(&Value::Literal("0".into())));
        assert_eq!(start.get("expandInheritance"), Some(&Value::Bool(false)));

        let edit = start.get("edit").unwrap();
        assert_eq!(
            edit.get("spawnPosition").and_then(|p| p.get("y")),
            Some(&Value::Literal("-3".into()))
        );
        assert_eq!(
            edit.get("flavour"),
            Some(&Value::String("say \"hi\"".into()))
        );
        assert_eq!(edit.get("owner"), Some(&Value::Null));

        let targets = edit.get("targets").and_then(Value::as_list).unwrap();
        let targets: Vec<_> = targets.iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(targets, vec!["door_1", "door_2"]);
    }

    #[test]
    fn scenario_c() {
        let entities = parse(
            b"Version 6\nentity { entityDef e { list = {num=\"2\"; item[0]=\"a\"; item[1]=\"b\";} } }",
        )
        .unwrap();
        let list = entities.get("e").unwrap().get("list").unwrap();
        let items: Vec<_> = list
            .as_list()
            .unwrap()
            .into_iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn deterministic_across_chunk_sizes() {
        let whole = parse(LEVEL).unwrap();
        assert_eq!(parse(LEVEL).unwrap(), whole);

        for size in [1, 2, 3, 7, 64, 1000] {
            let mut parser = Parser::new();
            for chunk in LEVEL[HEADER.len()..].chunks(size) {
                parser.feed(chunk).unwrap();
            }
            assert_eq!(parser.finish().unwrap(), whole, "chunk size {}", size);
        }

        assert_eq!(parse_reader(LEVEL).unwrap(), whole);
    }

    #[test]
    fn duplicate_entity() {
        let data = b"Version 6\nentity { t a { } }\nentity { t a { } }\n";
        assert!(matches!(
            parse(data),
            Err(ParseError::DuplicateEntity { ref id, .. }) if id == "a"
        ));
    }

    #[test]
    fn escaped_quote_does_not_toggle() {
        let data = b"Version 6\nentity { t e { k = a\\\"b; } }";
        let entities = parse(data).unwrap();
        assert_eq!(
            entities.get("e").unwrap().get("k"),
            Some(&Value::Literal("a\"b".into()))
        );
    }

    #[test]
    fn bad_header() {
        assert!(matches!(
            parse(b"Version 7\n"),
            Err(ParseError::InvalidHeader(_))
        ));
        assert!(matches!(parse(b"Vers"), Err(ParseError::InvalidHeader(_))));
        assert!(matches!(
            parse_reader(&b"Ver"[..]),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn unbalanced() {
        assert!(matches!(
            parse(b"Version 6\nentity { t e { } } }"),
            Err(ParseError::UnbalancedClose { .. })
        ));
        assert!(matches!(
            parse(b"Version 6\nentity { t e { }"),
            Err(ParseError::UnclosedBlocks { depth: 1 })
        ));
        assert!(matches!(
            parse(b"Version 6\nentity { t e { k = \"open; } }"),
            Err(ParseError::UnterminatedString)
        ));
    }

    #[test]
    fn document_order() {
        let entities = parse(LEVEL).unwrap();
        let ids: Vec<_> = entities.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["player_start", "door_1"]);

        let start = entities.get("player_start").unwrap();
        let keys: Vec<_> = start.fields.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["inherit", "class", "expandInheritance", "poolCount", "edit"]
        );

        let json = entities.to_json();
        let ids: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(ids, vec!["player_start", "door_1"]);
        let keys: Vec<_> = json["player_start"]["edit"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["spawnPosition", "targets", "flavour", "owner"]);
    }

    #[test]
    fn json_output() {
        let entities = parse(b"Version 6\nuserdef {\n idEntity e1 {\n hp = 100;\n }\n}\n").unwrap();
        assert_eq!(
            entities.to_json(),
            serde_json::json!({
                "e1": {
                    "definition_type": "userdef",
                    "entity_type": "idEntity",
                    "entity_id": "e1",
                    "hp": "100"
                }
            })
        );
    }
}
