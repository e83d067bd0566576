// VIEW: what the external renderer draws each frame
pub mod render;

pub use render::{build_draw_list, pack_draw_list, panda_parts, DrawItem, MeshHandle, MeshLibrary, PACKED_ITEM_LEN};
