use super::{Packer, Slot, page_border, prune_free_list, slot_in};
use crate::config::{AtlasConfig, MaxRectsHeuristic};
use crate::model::Rect;

/// MaxRects packer: keeps every maximal free rectangle and scores candidates by `heuristic`.
pub struct MaxRectsPacker {
    config: AtlasConfig,
    free: Vec<Rect>,
    heuristic: MaxRectsHeuristic,
}

impl MaxRectsPacker {
    pub fn new(config: AtlasConfig, heuristic: MaxRectsHeuristic) -> Self {
        let border = page_border(&config);
        Self {
            config,
            free: vec![border],
            heuristic,
        }
    }

    fn place_rect(&mut self, node: &Rect) {
        // split every free rectangle that intersects the node
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.iter() {
            if !fr.intersects(node) {
                new_free.push(*fr);
                continue;
            }
            let fr_x2 = fr.x + fr.w;
            let fr_y2 = fr.y + fr.h;
            let n_x2 = node.x + node.w;
            let n_y2 = node.y + node.h;

            // above
            if node.y > fr.y {
                new_free.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
            }
            // below
            if n_y2 < fr_y2 {
                new_free.push(Rect::new(fr.x, n_y2, fr.w, fr_y2 - n_y2));
            }
            // left
            if node.x > fr.x {
                new_free.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
            }
            // right
            if n_x2 < fr_x2 {
                new_free.push(Rect::new(n_x2, fr.y, fr_x2 - n_x2, fr.h));
            }
        }
        self.free = new_free;
        prune_free_list(&mut self.free);
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let leftover_h = (fr.w - w) as i64;
        let leftover_v = (fr.h - h) as i64;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = fr.area() as i64 - (w as i64 * h as i64);
        match self.heuristic {
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BottomLeft => ((fr.y + h) as i64, fr.x as i64),
        }
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Rect> {
        let mut best: Option<Rect> = None;
        let mut best_score = (i64::MAX, i64::MAX);
        // tie-break: smaller top side, then smaller x
        let mut best_top = u32::MAX;
        let mut best_left = u32::MAX;

        for fr in &self.free {
            if fr.w < w || fr.h < h {
                continue;
            }
            if fr.w == w && fr.h == h {
                return Some(Rect::new(fr.x, fr.y, w, h));
            }
            let s = self.score(fr, w, h);
            let top = fr.y + h;
            if s < best_score || (s == best_score && (top, fr.x) < (best_top, best_left)) {
                best_score = s;
                best_top = top;
                best_left = fr.x;
                best = Some(Rect::new(fr.x, fr.y, w, h));
            }
        }
        best
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }
}

impl<K> Packer<K> for MaxRectsPacker {
    fn can_pack(&self, w: u32, h: u32) -> bool {
        let (rw, rh) = self.config.reserved_size(w, h);
        self.find_position(rw, rh).is_some()
    }

    fn pack(&mut self, key: K, w: u32, h: u32) -> Option<Slot<K>> {
        let (rw, rh) = self.config.reserved_size(w, h);
        let place = self.find_position(rw, rh)?;
        self.place_rect(&place);
        Some(slot_in(&self.config, key, place, w, h))
    }
}
