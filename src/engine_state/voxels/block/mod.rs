//! # Block Module
//!
//! Block values and the material registry the terrain generator resolves names through.
//!
//! Built-in materials are kept in a compile-time perfect hash map; materials declared in
//! the configuration are layered on top at runtime.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

pub use block_type::BlockType;
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

pub mod block_type;

/// The underlying integer type used to represent block ids in chunk grids.
pub type BlockTypeSize = u8;

/// Built-in materials by registry name.
static BUILTIN_MATERIALS: phf::Map<&'static str, BlockType> = phf_map! {
    "air" => BlockType::AIR,
    "grass" => BlockType::GRASS,
    "dirt" => BlockType::DIRT,
    "stone" => BlockType::STONE,
    "gravel" => BlockType::GRAVEL,
};

/// An immutable material description.
///
/// Two blocks are equal when their ids are equal; the name and flags are descriptive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    /// Id stored in chunk grids.
    pub id: BlockTypeSize,
    /// Registry name.
    pub name: String,
    /// Whether bodies collide with this block.
    pub solid: bool,
    /// Whether light passes through this block.
    pub transparent: bool,
}

impl Block {
    /// Creates the block value of a built-in type.
    ///
    /// # Arguments
    /// * `block_type` - The built-in type to describe
    ///
    /// # Returns
    /// A new `Block` carrying the type's id, name and flags.
    pub fn new(block_type: BlockType) -> Self {
        Block {
            id: block_type.id(),
            name: block_type.name().to_string(),
            solid: block_type.is_solid(),
            transparent: block_type.is_transparent(),
        }
    }

    /// Whether this is the empty block.
    pub fn is_air(&self) -> bool {
        self.id == BlockType::AIR.id()
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Block {}

impl Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Resolves material names to blocks.
#[derive(Clone, Debug, Default)]
pub struct MaterialRegistry {
    extra: HashMap<String, Block>,
}

impl MaterialRegistry {
    /// Creates a registry holding only the built-in materials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with additional materials.
    ///
    /// A material whose name matches a built-in one shadows it.
    pub fn with_materials(materials: impl IntoIterator<Item = Block>) -> Self {
        let extra = materials
            .into_iter()
            .map(|block| (block.name.clone(), block))
            .collect();
        Self { extra }
    }

    /// Looks a material up by name.
    ///
    /// # Errors
    /// `WorldError::UnknownMaterial` if neither the config materials nor the built-ins
    /// know the name. Callers must treat this as fatal for the work at hand.
    pub fn find_material_by_name(&self, name: &str) -> Result<Block, WorldError> {
        if let Some(block) = self.extra.get(name) {
            return Ok(block.clone());
        }
        BUILTIN_MATERIALS
            .get(name)
            .map(|block_type| Block::new(*block_type))
            .ok_or_else(|| WorldError::UnknownMaterial {
                name: name.to_string(),
            })
    }

    /// Looks a material up by id.
    pub fn find_material_by_id(&self, id: BlockTypeSize) -> Option<Block> {
        if let Some(block_type) = BlockType::from_id(id) {
            return Some(Block::new(block_type));
        }
        self.extra.values().find(|block| block.id == id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve_by_name() {
        let registry = MaterialRegistry::new();
        let stone = registry.find_material_by_name("stone").unwrap();
        assert_eq!(stone, Block::new(BlockType::STONE));
        assert!(stone.solid);
    }

    #[test]
    fn unknown_names_are_configuration_errors() {
        let registry = MaterialRegistry::new();
        match registry.find_material_by_name("obsidian") {
            Err(WorldError::UnknownMaterial { name }) => assert_eq!(name, "obsidian"),
            other => panic!("expected UnknownMaterial, got {other:?}"),
        }
    }

    #[test]
    fn config_materials_are_found_by_name_and_id() {
        let sand = Block {
            id: 40,
            name: "sand".to_string(),
            solid: true,
            transparent: false,
        };
        let registry = MaterialRegistry::with_materials([sand.clone()]);
        assert_eq!(registry.find_material_by_name("sand").unwrap(), sand);
        assert_eq!(registry.find_material_by_id(40), Some(sand));
        assert_eq!(registry.find_material_by_id(41), None);
    }

    #[test]
    fn identity_is_by_id() {
        let mut renamed = Block::new(BlockType::DIRT);
        renamed.name = "mud".to_string();
        assert_eq!(renamed, Block::new(BlockType::DIRT));
    }
}
