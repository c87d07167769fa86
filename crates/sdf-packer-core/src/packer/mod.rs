use crate::config::AtlasConfig;
use crate::model::Rect;

pub mod guillotine;
pub mod maxrects;
pub mod shelf;

pub use guillotine::GuillotinePacker;
pub use maxrects::MaxRectsPacker;
pub use shelf::ShelfPacker;

/// Where a packer put one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot<K> {
    pub key: K,
    /// Content rectangle, inset from `reserved` by the extrusion and half the padding.
    pub frame: Rect,
    /// Full reserved cell including padding and extrusion.
    pub reserved: Rect,
}

/// A packer places rectangles into a single page.
///
/// Implementations must ensure no two reserved cells overlap and that every cell stays inside
/// the page border. `pack` returns `None` when the rectangle does not fit.
pub trait Packer<K> {
    fn can_pack(&self, w: u32, h: u32) -> bool;
    fn pack(&mut self, key: K, w: u32, h: u32) -> Option<Slot<K>>;
}

/// Usable page area: the configured maximum inset by `border_padding` on every side.
pub(crate) fn page_border(cfg: &AtlasConfig) -> Rect {
    let pad = cfg.border_padding;
    let w = cfg.max_width.saturating_sub(pad.saturating_mul(2));
    let h = cfg.max_height.saturating_sub(pad.saturating_mul(2));
    Rect::new(pad, pad, w, h)
}

/// Builds the slot for content `w x h` placed in the reserved cell `place`.
pub(crate) fn slot_in<K>(cfg: &AtlasConfig, key: K, place: Rect, w: u32, h: u32) -> Slot<K> {
    let off = cfg.content_offset();
    Slot {
        key,
        frame: Rect::new(place.x + off, place.y + off, w, h),
        reserved: place,
    }
}

/// Drops every free rectangle contained in another one.
pub(crate) fn prune_free_list(free: &mut Vec<Rect>) {
    let mut i = 0;
    while i < free.len() {
        let mut j = i + 1;
        let a = free[i];
        let mut remove_i = false;
        while j < free.len() {
            let b = free[j];
            if b.contains(&a) {
                remove_i = true;
                break;
            }
            if a.contains(&b) {
                free.remove(j);
                continue;
            }
            j += 1;
        }
        if remove_i {
            free.remove(i);
        } else {
            i += 1;
        }
    }
}
