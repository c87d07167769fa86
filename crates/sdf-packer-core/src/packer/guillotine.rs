use super::{Packer, Slot, page_border, prune_free_list, slot_in};
use crate::config::AtlasConfig;
use crate::model::Rect;

/// Guillotine packer: best-area-fit choice, split along the shorter leftover axis, and free
/// rectangles merged back together when they line up.
pub struct GuillotinePacker {
    config: AtlasConfig,
    free: Vec<Rect>,
}

impl GuillotinePacker {
    pub fn new(config: AtlasConfig) -> Self {
        let border = page_border(&config);
        Self {
            config,
            free: vec![border],
        }
    }

    fn choose(&self, w: u32, h: u32) -> Option<(usize, Rect)> {
        let mut best: Option<(usize, Rect)> = None;
        let mut best_score = (i64::MAX, i64::MAX);
        for (i, fr) in self.free.iter().enumerate() {
            if fr.w < w || fr.h < h {
                continue;
            }
            let area_fit = fr.area() as i64 - (w as i64 * h as i64);
            let short_fit = (fr.w - w).min(fr.h - h) as i64;
            if (area_fit, short_fit) < best_score {
                best_score = (area_fit, short_fit);
                best = Some((i, Rect::new(fr.x, fr.y, w, h)));
            }
        }
        best
    }

    fn split(fr: &Rect, placed: &Rect) -> (Option<Rect>, Option<Rect>) {
        let w_right = (fr.x + fr.w).saturating_sub(placed.x + placed.w);
        let h_bottom = (fr.y + fr.h).saturating_sub(placed.y + placed.h);
        let split_horizontal = h_bottom < w_right;

        let mut bottom = Rect::new(fr.x, placed.y + placed.h, 0, fr.h.saturating_sub(placed.h));
        let mut right = Rect::new(placed.x + placed.w, fr.y, fr.w.saturating_sub(placed.w), 0);
        if split_horizontal {
            bottom.w = fr.w;
            right.h = placed.h;
        } else {
            bottom.w = placed.w;
            right.h = fr.h;
        }
        let keep = |r: Rect| (r.w > 0 && r.h > 0).then_some(r);
        (keep(bottom), keep(right))
    }

    fn place(&mut self, idx: usize, placed: &Rect) {
        let fr = self.free.swap_remove(idx);
        let (a, b) = Self::split(&fr, placed);
        self.free.extend(a);
        self.free.extend(b);
        prune_free_list(&mut self.free);
        self.merge_free_list();
    }

    fn merge_free_list(&mut self) {
        let mut merged = true;
        while merged {
            merged = false;
            'outer: for i in 0..self.free.len() {
                for j in i + 1..self.free.len() {
                    let a = self.free[i];
                    let b = self.free[j];
                    let joined = if a.y == b.y && a.h == b.h && a.x + a.w == b.x {
                        Some(Rect::new(a.x, a.y, a.w + b.w, a.h))
                    } else if a.y == b.y && a.h == b.h && b.x + b.w == a.x {
                        Some(Rect::new(b.x, a.y, a.w + b.w, a.h))
                    } else if a.x == b.x && a.w == b.w && a.y + a.h == b.y {
                        Some(Rect::new(a.x, a.y, a.w, a.h + b.h))
                    } else if a.x == b.x && a.w == b.w && b.y + b.h == a.y {
                        Some(Rect::new(a.x, b.y, a.w, a.h + b.h))
                    } else {
                        None
                    };
                    if let Some(r) = joined {
                        self.free[i] = r;
                        self.free.remove(j);
                        merged = true;
                        break 'outer;
                    }
                }
            }
        }
    }
}

impl<K> Packer<K> for GuillotinePacker {
    fn can_pack(&self, w: u32, h: u32) -> bool {
        let (rw, rh) = self.config.reserved_size(w, h);
        self.choose(rw, rh).is_some()
    }

    fn pack(&mut self, key: K, w: u32, h: u32) -> Option<Slot<K>> {
        let (rw, rh) = self.config.reserved_size(w, h);
        let (idx, place) = self.choose(rw, rh)?;
        self.place(idx, &place);
        Some(slot_in(&self.config, key, place, w, h))
    }
}
