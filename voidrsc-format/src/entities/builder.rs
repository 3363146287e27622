use indexmap::map::Entry;
use indexmap::IndexMap;

use super::error::ParseError;
use super::tokenizer::{Direction, Event};
use super::value::{self, Map, Value};
use super::Entity;

#[derive(Debug)]
struct PendingHeader {
    definition_type: String,
    /// `(entity_type, entity_id)`, once the entity block has opened.
    entity: Option<(String, String)>,
}

/// Turns tokenizer events into entities.
///
/// Depth 0 is the document, depth 1 is inside a definition block, depth 2 inside
/// its entity block. Deeper frames are nested value groups.
#[derive(Debug, Default)]
pub(crate) struct EntityBuilder {
    depth: usize,
    stack: Vec<Map>,
    header: Option<PendingHeader>,
    tokens: Vec<Vec<u8>>,
    entities: IndexMap<String, Entity>,
    finalized: usize,
}

impl EntityBuilder {
    pub fn new() -> EntityBuilder {
        EntityBuilder::default()
    }

    pub fn handle(&mut self, event: Event, at: u64) -> Result<(), ParseError> {
        match event {
            Event::Token(token) => {
                self.tokens.push(token);
                Ok(())
            }
            Event::ValueEnd(token) => self.assign(token, at),
            Event::Frame(direction) => self.frame(direction, at),
        }
    }

    fn pop_token(&mut self, at: u64) -> Result<Vec<u8>, ParseError> {
        self.tokens.pop().ok_or(ParseError::MissingToken { at })
    }

    fn pop_text(&mut self, at: u64) -> Result<String, ParseError> {
        let token = self.pop_token(at)?;
        String::from_utf8(token).map_err(|_| ParseError::InvalidUtf8 { at })
    }

    fn assign(&mut self, token: Vec<u8>, at: u64) -> Result<(), ParseError> {
        // `key = value ;` leaves the value in the queue.
        let token = if token.is_empty() {
            self.pop_token(at)?
        } else {
            token
        };
        let value = value::decode(&token, at)?;
        let key = self.pop_text(at)?;

        let frame = self
            .stack
            .last_mut()
            .ok_or(ParseError::ValueOutsideBlock { at })?;
        tracing::trace!(%key, ?value, depth = self.depth, "assign");
        frame.insert(key, value);
        Ok(())
    }

    fn frame(&mut self, direction: Direction, at: u64) -> Result<(), ParseError> {
        use Direction::*;

        match (self.depth, direction) {
            (0, Open) => {
                let definition_type = self.pop_text(at)?;
                self.header = Some(PendingHeader {
                    definition_type,
                    entity: None,
                });
                self.stack.push(Map::new());
                self.depth = 1;
            }
            (1, Open) => {
                let entity_id = self.pop_text(at)?;
                let entity_type = self.pop_text(at)?;
                let header = self
                    .header
                    .as_mut()
                    .ok_or(ParseError::MissingEntityHeader { at })?;
                if header.entity.is_some() {
                    return Err(ParseError::UnexpectedEntityHeader { at });
                }
                header.entity = Some((entity_type, entity_id));
                self.depth = 2;
            }
            (_, Open) => {
                self.stack.push(Map::new());
                self.depth += 1;
            }
            (0, Close) => return Err(ParseError::UnbalancedClose { at }),
            (1, Close) => {
                self.finalize(at)?;
                self.depth = 0;
            }
            (2, Close) => self.depth = 1,
            (_, Close) => {
                let key = self.pop_text(at)?;
                let frame = self.stack.pop().ok_or(ParseError::UnbalancedClose { at })?;
                let parent = self
                    .stack
                    .last_mut()
                    .ok_or(ParseError::UnbalancedClose { at })?;
                parent.insert(key, Value::Map(frame));
                self.depth -= 1;
            }
        }

        Ok(())
    }

    fn finalize(&mut self, at: u64) -> Result<(), ParseError> {
        let header = self
            .header
            .take()
            .ok_or(ParseError::MissingEntityHeader { at })?;
        let (entity_type, entity_id) = header
            .entity
            .ok_or(ParseError::MissingEntityHeader { at })?;
        let fields = self.stack.pop().ok_or(ParseError::UnbalancedClose { at })?;

        match self.entities.entry(entity_id) {
            Entry::Occupied(entry) => {
                return Err(ParseError::DuplicateEntity {
                    id: entry.key().clone(),
                    at,
                })
            }
            Entry::Vacant(entry) => {
                tracing::trace!(id = %entry.key(), %entity_type, fields = fields.len(), "entity");
                let entity = Entity {
                    definition_type: header.definition_type,
                    entity_type,
                    entity_id: entry.key().clone(),
                    fields,
                };
                entry.insert(entity);
            }
        }

        self.finalized += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<IndexMap<String, Entity>, ParseError> {
        if self.depth != 0 {
            return Err(ParseError::UnclosedBlocks { depth: self.depth });
        }

        if self.finalized != self.entities.len() {
            return Err(ParseError::DuplicateEntities {
                found: self.finalized,
                kept: self.entities.len(),
            });
        }

        if !self.tokens.is_empty() {
            tracing::warn!(
                count = self.tokens.len(),
                "ignoring tokens outside of any entity"
            );
        }

        Ok(self.entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> Event {
        Event::Token(s.as_bytes().to_vec())
    }

    fn value(s: &str) -> Event {
        Event::ValueEnd(s.as_bytes().to_vec())
    }

    const OPEN: Event = Event::Frame(Direction::Open);
    const CLOSE: Event = Event::Frame(Direction::Close);

    fn build(events: Vec<Event>) -> Result<IndexMap<String, Entity>, ParseError> {
        let mut builder = EntityBuilder::new();
        for (at, event) in events.into_iter().enumerate() {
            builder.handle(event, at as u64)?;
        }
        builder.finish()
    }

    #[test]
    fn single_entity() {
        let entities = build(vec![
            token("entity"),
            OPEN,
            token("entityDef"),
            token("light_1"),
            OPEN,
            token("class"),
            value("\"idLight\""),
            CLOSE,
            CLOSE,
        ])
        .unwrap();

        let entity = &entities["light_1"];
        assert_eq!(entity.definition_type, "entity");
        assert_eq!(entity.entity_type, "entityDef");
        assert_eq!(entity.entity_id, "light_1");
        assert_eq!(
            entity.fields.get("class"),
            Some(&Value::String("idLight".into()))
        );
    }

    #[test]
    fn nested_groups() {
        let entities = build(vec![
            token("entity"),
            OPEN,
            token("entityDef"),
            token("e"),
            OPEN,
            token("edit"),
            OPEN,
            token("spawnPosition"),
            OPEN,
            token("x"),
            value("1.5"),
            CLOSE,
            CLOSE,
            CLOSE,
            CLOSE,
        ])
        .unwrap();

        let edit = entities["e"].fields.get("edit").unwrap();
        let position = edit.get("spawnPosition").unwrap();
        assert_eq!(position.get("x"), Some(&Value::Literal("1.5".into())));
    }

    #[test]
    fn value_from_queue() {
        // `k = v ;`
        let entities = build(vec![
            token("entity"),
            OPEN,
            token("t"),
            token("e"),
            OPEN,
            token("k"),
            token("true"),
            value(""),
            CLOSE,
            CLOSE,
        ])
        .unwrap();
        assert_eq!(entities["e"].fields.get("k"), Some(&Value::Bool(true)));
    }

    #[test]
    fn leftover_tokens_are_tolerated() {
        let entities = build(vec![
            token("HierarchyVersion"),
            token("1"),
            token("entity"),
            OPEN,
            token("t"),
            token("e"),
            OPEN,
            CLOSE,
            CLOSE,
        ])
        .unwrap();
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn duplicate_entity() {
        let block = |id: &str| {
            vec![
                token("entity"),
                OPEN,
                token("t"),
                token(id),
                OPEN,
                CLOSE,
                CLOSE,
            ]
        };
        let mut events = block("a");
        events.extend(block("a"));
        match build(events) {
            Err(ParseError::DuplicateEntity { id, .. }) => assert_eq!(id, "a"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn structural_errors() {
        assert!(matches!(
            build(vec![CLOSE]),
            Err(ParseError::UnbalancedClose { at: 0 })
        ));
        assert!(matches!(
            build(vec![OPEN]),
            Err(ParseError::MissingToken { at: 0 })
        ));
        assert!(matches!(
            build(vec![token("k"), value("1")]),
            Err(ParseError::ValueOutsideBlock { at: 1 })
        ));
        assert!(matches!(
            build(vec![token("entity"), OPEN, CLOSE]),
            Err(ParseError::MissingEntityHeader { at: 2 })
        ));
        assert!(matches!(
            build(vec![token("entity"), OPEN, token("t"), token("e"), OPEN]),
            Err(ParseError::UnclosedBlocks { depth: 2 })
        ));
        assert!(matches!(
            build(vec![
                token("entity"),
                OPEN,
                token("t"),
                token("a"),
                OPEN,
                CLOSE,
                token("t"),
                token("b"),
                OPEN,
            ]),
            Err(ParseError::UnexpectedEntityHeader { at: 8 })
        ));
    }
}
