//! Per-sprite program store
//!
//! Ordered block sequences keyed by sprite id. Written by the editor outside
//! of play and by the collision monitor during play; read live by the
//! interpreters on every step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::SpriteId;
use crate::blocks::{BlockCategory, BlockInstance, BlockTemplate, InputType, sanitize_number_input};
use crate::error::{EditError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramStore {
    programs: BTreeMap<SpriteId, Vec<BlockInstance>>,
    /// Session-wide block id counter
    next_block: u64,
}

impl ProgramStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a session-unique block id, skipping ids already placed
    /// through `set`
    pub fn next_block_id(&mut self) -> String {
        loop {
            self.next_block += 1;
            let id = format!("block-{}", self.next_block);
            if !self.contains_block(&id) {
                return id;
            }
        }
    }

    fn contains_block(&self, block_id: &str) -> bool {
        self.programs.values().flatten().any(|b| b.id == block_id)
    }

    /// Create an empty program for a new sprite
    pub(crate) fn create(&mut self, sprite: &SpriteId) {
        self.programs.entry(sprite.clone()).or_default();
    }

    pub fn contains(&self, sprite: &SpriteId) -> bool {
        self.programs.contains_key(sprite)
    }

    /// Current block sequence (empty for unknown sprites)
    pub fn get(&self, sprite: &SpriteId) -> &[BlockInstance] {
        self.programs.get(sprite).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn block_at(&self, sprite: &SpriteId, index: usize) -> Option<&BlockInstance> {
        self.get(sprite).get(index)
    }

    fn program_mut(&mut self, sprite: &SpriteId) -> Result<&mut Vec<BlockInstance>> {
        self.programs
            .get_mut(sprite)
            .ok_or_else(|| EditError::UnknownSprite(sprite.clone()))
    }

    /// Replace a whole sequence. Event blocks are moved to the top.
    pub fn set(&mut self, sprite: &SpriteId, mut blocks: Vec<BlockInstance>) -> Result<()> {
        pin_events(&mut blocks);
        *self.program_mut(sprite)? = blocks;
        Ok(())
    }

    /// Drop a copy of `template` at `index`. Returns the new block id.
    pub fn insert(&mut self, sprite: &SpriteId, template: &BlockTemplate, index: usize) -> Result<String> {
        if !self.contains(sprite) {
            return Err(EditError::UnknownSprite(sprite.clone()));
        }
        let id = self.next_block_id();
        let block = template.instantiate(id.clone());
        let program = self.program_mut(sprite)?;
        let index = drop_index(program, &block, index);
        program.insert(index, block);
        Ok(id)
    }

    /// Move the block at `from` to `to`
    pub fn reorder(&mut self, sprite: &SpriteId, from: usize, to: usize) -> Result<()> {
        let program = self.program_mut(sprite)?;
        if from >= program.len() {
            return Err(EditError::IndexOutOfRange {
                index: from,
                len: program.len(),
            });
        }
        let block = program.remove(from);
        let to = drop_index(program, &block, to);
        program.insert(to, block);
        Ok(())
    }

    pub fn remove(&mut self, sprite: &SpriteId, index: usize) -> Result<BlockInstance> {
        let program = self.program_mut(sprite)?;
        if index >= program.len() {
            return Err(EditError::IndexOutOfRange {
                index,
                len: program.len(),
            });
        }
        Ok(program.remove(index))
    }

    /// Type into slot `slot` of a block. Number slots are sanitized.
    pub fn set_input(&mut self, sprite: &SpriteId, block_id: &str, slot: usize, value: &str) -> Result<()> {
        let program = self.program_mut(sprite)?;
        let block = program
            .iter_mut()
            .find(|b| b.id == block_id)
            .ok_or_else(|| EditError::UnknownBlock {
                sprite: sprite.clone(),
                block: block_id.to_string(),
            })?;
        if slot >= block.slot_count() {
            return Err(EditError::IndexOutOfRange {
                index: slot,
                len: block.slot_count(),
            });
        }
        let value = match block.input_type(slot) {
            InputType::Number => sanitize_number_input(value),
            InputType::Text => value.to_string(),
        };
        block.inputs.insert(slot, value);
        Ok(())
    }

    /// Append a block at the end (runtime mutation path)
    pub(crate) fn push(&mut self, sprite: &SpriteId, block: BlockInstance) {
        self.programs.entry(sprite.clone()).or_default().push(block);
    }

    /// First Motion block mentioning "Move", if any
    pub fn first_move(&self, sprite: &SpriteId) -> Option<&BlockInstance> {
        self.get(sprite).iter().find(|b| b.is_move_carrier())
    }

    pub(crate) fn first_move_mut(&mut self, sprite: &SpriteId) -> Option<&mut BlockInstance> {
        self.programs
            .get_mut(sprite)?
            .iter_mut()
            .find(|b| b.is_move_carrier())
    }
}

/// Where a dropped block lands: Event blocks go to the top, everything else
/// lands at `index` but never above a pinned Event block.
fn drop_index(program: &[BlockInstance], block: &BlockInstance, index: usize) -> usize {
    if block.category == BlockCategory::Event {
        return 0;
    }
    let floor = program
        .iter()
        .take_while(|b| b.category == BlockCategory::Event)
        .count();
    index.clamp(floor, program.len())
}

/// Stable partition: Event blocks first, everything else in relative order
fn pin_events(blocks: &mut Vec<BlockInstance>) {
    let (mut events, rest): (Vec<_>, Vec<_>) = blocks
        .drain(..)
        .partition(|b| b.category == BlockCategory::Event);
    events.extend(rest);
    *blocks = events;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{MOVE_STEPS, SAY_HELLO, TURN_DEGREES, WHEN_CLICKED};

    fn store_with(sprite: &SpriteId) -> ProgramStore {
        let mut store = ProgramStore::new();
        store.create(sprite);
        store
    }

    fn texts(store: &ProgramStore, sprite: &SpriteId) -> Vec<String> {
        store.get(sprite).iter().map(|b| b.text.clone()).collect()
    }

    #[test]
    fn test_block_ids_are_unique() {
        let cat = SpriteId::from("cat");
        let mut store = store_with(&cat);
        let a = store.insert(&cat, &MOVE_STEPS, 0).unwrap();
        let b = store.insert(&cat, &MOVE_STEPS, 0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fresh_ids_skip_ids_from_set() {
        let cat = SpriteId::from("cat");
        let dog = SpriteId::from("dog");
        let mut store = store_with(&cat);
        store.create(&dog);
        store.set(&cat, vec![MOVE_STEPS.instantiate("block-1")]).unwrap();
        store.set(&dog, vec![MOVE_STEPS.instantiate("block-2")]).unwrap();

        let fresh = store.insert(&cat, &MOVE_STEPS, 1).unwrap();
        assert_eq!(fresh, "block-3");

        store.set_input(&cat, &fresh, 0, "42").unwrap();
        let inputs: Vec<_> = store.get(&cat).iter().map(|b| b.inputs.get(&0).cloned()).collect();
        assert_eq!(inputs, [None, Some("42".to_string())]);
    }

    #[test]
    fn test_event_pinned_on_insert() {
        let cat = SpriteId::from("cat");
        let mut store = store_with(&cat);
        store.insert(&cat, &MOVE_STEPS, 0).unwrap();
        store.insert(&cat, &TURN_DEGREES, 1).unwrap();
        store.insert(&cat, &WHEN_CLICKED, 2).unwrap();

        assert_eq!(store.get(&cat)[0].category, BlockCategory::Event);
        assert_eq!(texts(&store, &cat)[1..], ["Move ___ steps", "Turn ___ degree"]);
    }

    #[test]
    fn test_event_not_displaced_by_reorder() {
        let cat = SpriteId::from("cat");
        let mut store = store_with(&cat);
        store.insert(&cat, &WHEN_CLICKED, 0).unwrap();
        store.insert(&cat, &MOVE_STEPS, 1).unwrap();
        store.insert(&cat, &TURN_DEGREES, 2).unwrap();

        // Drag Turn above the event block
        store.reorder(&cat, 2, 0).unwrap();
        assert_eq!(store.get(&cat)[0].category, BlockCategory::Event);
        assert_eq!(texts(&store, &cat)[1], "Turn ___ degree");

        // Drag the event block to the bottom
        store.reorder(&cat, 0, 2).unwrap();
        assert_eq!(store.get(&cat)[0].category, BlockCategory::Event);
    }

    #[test]
    fn test_insert_past_end_appends() {
        let cat = SpriteId::from("cat");
        let mut store = store_with(&cat);
        store.insert(&cat, &MOVE_STEPS, 0).unwrap();
        store.insert(&cat, &SAY_HELLO, 99).unwrap();
        assert_eq!(texts(&store, &cat), ["Move ___ steps", "Say Hello"]);
    }

    #[test]
    fn test_set_pins_events() {
        let cat = SpriteId::from("cat");
        let mut store = store_with(&cat);
        let blocks = vec![
            MOVE_STEPS.instantiate("a"),
            WHEN_CLICKED.instantiate("b"),
            TURN_DEGREES.instantiate("c"),
        ];
        store.set(&cat, blocks).unwrap();
        let ids: Vec<_> = store.get(&cat).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn test_set_input_sanitizes_numbers() {
        let cat = SpriteId::from("cat");
        let mut store = store_with(&cat);
        let id = store.insert(&cat, &MOVE_STEPS, 0).unwrap();
        store.set_input(&cat, &id, 0, "1x5.0.1").unwrap();
        assert_eq!(store.get(&cat)[0].inputs[&0], "15.01");

        assert!(matches!(
            store.set_input(&cat, &id, 1, "3"),
            Err(EditError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            store.set_input(&cat, "block-999", 0, "3"),
            Err(EditError::UnknownBlock { .. })
        ));
    }

    #[test]
    fn test_unknown_sprite() {
        let mut store = ProgramStore::new();
        let ghost = SpriteId::from("ghost");
        assert!(store.get(&ghost).is_empty());
        assert_eq!(
            store.insert(&ghost, &MOVE_STEPS, 0),
            Err(EditError::UnknownSprite(ghost.clone()))
        );
    }

    #[test]
    fn test_first_move() {
        let cat = SpriteId::from("cat");
        let mut store = store_with(&cat);
        store.insert(&cat, &TURN_DEGREES, 0).unwrap();
        assert!(store.first_move(&cat).is_none());
        let id = store.insert(&cat, &MOVE_STEPS, 1).unwrap();
        store.insert(&cat, &MOVE_STEPS, 2).unwrap();
        assert_eq!(store.first_move(&cat).map(|b| b.id.as_str()), Some(id.as_str()));
    }
}
