/// Block types a player can place, plus the generic fallback used when
/// a type has no entry in the appearance table.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    Grass = 0,
    Dirt = 1,
    Stone = 2,
    Wood = 3,
    Leaves = 4,
    Brick = 5,
    Generic = 255,
}

/// Selectable block types, in hotbar order
pub const SELECTABLE_BLOCKS: [BlockType; 6] = [
    BlockType::Grass,
    BlockType::Dirt,
    BlockType::Stone,
    BlockType::Wood,
    BlockType::Leaves,
    BlockType::Brick,
];

/// What the renderer needs to shade a cube: a texture unit and a base color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    pub texture_unit: u8,
    pub color: [f32; 3],
}

impl Appearance {
    pub const GENERIC: Appearance = Appearance { texture_unit: 0, color: [0.8, 0.8, 0.8] };

    /// Untextured, color only (panda parts, outlines)
    pub fn solid(color: [f32; 3]) -> Self {
        Appearance { texture_unit: u8::MAX, color }
    }

    pub fn is_textured(&self) -> bool {
        self.texture_unit != u8::MAX
    }
}

impl BlockType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => BlockType::Grass,
            1 => BlockType::Dirt,
            2 => BlockType::Stone,
            3 => BlockType::Wood,
            4 => BlockType::Leaves,
            5 => BlockType::Brick,
            _ => BlockType::Generic,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Position in the hotbar, `None` for the fallback type
    pub fn selection_index(self) -> Option<usize> {
        SELECTABLE_BLOCKS.iter().position(|&b| b == self)
    }

    pub fn from_selection_index(index: usize) -> Self {
        SELECTABLE_BLOCKS.get(index).copied().unwrap_or(BlockType::Generic)
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockType::Grass => "Grass",
            BlockType::Dirt => "Dirt",
            BlockType::Stone => "Stone",
            BlockType::Wood => "Wood",
            BlockType::Leaves => "Leaves",
            BlockType::Brick => "Brick",
            BlockType::Generic => "Block",
        }
    }

    pub fn color(self) -> [f32; 3] {
        match self {
            BlockType::Grass => [0.4, 0.8, 0.4],
            BlockType::Dirt => [0.6, 0.4, 0.2],
            BlockType::Stone => [0.7, 0.7, 0.7],
            BlockType::Wood => [0.6, 0.4, 0.2],
            BlockType::Leaves => [0.0, 0.7, 0.0],
            BlockType::Brick => [0.8, 0.4, 0.4],
            BlockType::Generic => Appearance::GENERIC.color,
        }
    }

    /// Texture unit bound for this type, if the table has one
    fn texture_unit(self) -> Option<u8> {
        match self {
            BlockType::Grass => Some(0),
            BlockType::Dirt => Some(1),
            BlockType::Stone => Some(2),
            BlockType::Brick => Some(3),
            BlockType::Wood => Some(4),
            BlockType::Leaves => Some(6),
            BlockType::Generic => None,
        }
    }

    pub fn appearance(self) -> Appearance {
        match self.texture_unit() {
            Some(texture_unit) => Appearance { texture_unit, color: self.color() },
            None => Appearance::GENERIC,
        }
    }
}
