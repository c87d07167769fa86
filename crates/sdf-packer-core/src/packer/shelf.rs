use super::{Packer, Slot, page_border, slot_in};
use crate::config::AtlasConfig;
use crate::model::Rect;

struct Shelf {
    y: u32,
    h: u32,
    next_x: u32,
}

/// Row-based packer: items go left to right on horizontal shelves.
///
/// An item lands on the existing shelf that wastes the least height; a new shelf is opened
/// below the last one when none fits.
pub struct ShelfPacker {
    config: AtlasConfig,
    border: Rect,
    shelves: Vec<Shelf>,
    next_y: u32,
}

impl ShelfPacker {
    pub fn new(config: AtlasConfig) -> Self {
        let border = page_border(&config);
        Self {
            next_y: border.y,
            config,
            border,
            shelves: Vec::new(),
        }
    }

    /// `Ok(i)` for shelf `i`, `Err(y)` when a new shelf at `y` is needed.
    fn choose(&self, w: u32, h: u32) -> Option<Result<usize, u32>> {
        let right = self.border.x + self.border.w;
        let best = self
            .shelves
            .iter()
            .enumerate()
            .filter(|(_, s)| s.h >= h && s.next_x + w <= right)
            .min_by_key(|(_, s)| s.h - h)
            .map(|(i, _)| i);
        if let Some(i) = best {
            return Some(Ok(i));
        }
        let bottom = self.border.y + self.border.h;
        if w <= self.border.w && self.next_y + h <= bottom {
            Some(Err(self.next_y))
        } else {
            None
        }
    }
}

impl<K> Packer<K> for ShelfPacker {
    fn can_pack(&self, w: u32, h: u32) -> bool {
        let (rw, rh) = self.config.reserved_size(w, h);
        self.choose(rw, rh).is_some()
    }

    fn pack(&mut self, key: K, w: u32, h: u32) -> Option<Slot<K>> {
        let (rw, rh) = self.config.reserved_size(w, h);
        let place = match self.choose(rw, rh)? {
            Ok(i) => {
                let shelf = &mut self.shelves[i];
                let place = Rect::new(shelf.next_x, shelf.y, rw, rh);
                shelf.next_x += rw;
                place
            }
            Err(y) => {
                self.shelves.push(Shelf {
                    y,
                    h: rh,
                    next_x: self.border.x + rw,
                });
                self.next_y = y + rh;
                Rect::new(self.border.x, y, rw, rh)
            }
        };
        Some(slot_in(&self.config, key, place, w, h))
    }
}
