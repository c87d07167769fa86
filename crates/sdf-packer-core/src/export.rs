use crate::error::{Result, SdfPackerError};
use crate::model::{AtlasLayout, AtlasMeta, Border, Placement, Rect};
use serde::Deserialize;
use serde_json::{Value, json};

/// Serializes the layout as `{ sprites: [...], meta }`, one entry per sprite in input order.
///
/// Per sprite: `name`, `index`, `frame {x,y,w,h}`, `uvMin`, `uvMax`,
/// `border {left,bottom,right,top}`, `pivot {x,y}`, `gradientPx`, `gradientUv`.
pub fn to_json(layout: &AtlasLayout) -> Value {
    let sprites: Vec<Value> = layout
        .placements
        .iter()
        .map(|p| {
            let frame = json!({"x": p.rect.x, "y": p.rect.y, "w": p.rect.w, "h": p.rect.h});
            let border = json!({
                "left": p.border.left,
                "bottom": p.border.bottom,
                "right": p.border.right,
                "top": p.border.top,
            });
            json!({
                "name": p.name,
                "index": p.sprite_index,
                "frame": frame,
                "uvMin": p.uv_min,
                "uvMax": p.uv_max,
                "border": border,
                "pivot": {"x": p.pivot[0], "y": p.pivot[1]},
                "gradientPx": p.gradient_px,
                "gradientUv": p.gradient_uv,
            })
        })
        .collect();
    json!({ "sprites": sprites, "meta": &layout.meta })
}

#[derive(Deserialize)]
struct JsonPivot {
    x: f32,
    y: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonSprite {
    name: String,
    index: usize,
    frame: Rect,
    uv_min: [f32; 2],
    uv_max: [f32; 2],
    border: Border,
    pivot: JsonPivot,
    gradient_px: f32,
    gradient_uv: f32,
}

#[derive(Deserialize)]
struct JsonAtlas {
    sprites: Vec<JsonSprite>,
    meta: AtlasMeta,
}

/// Reads back a document written by [`to_json`].
pub fn from_json(value: &Value) -> Result<AtlasLayout> {
    let doc = JsonAtlas::deserialize(value)
        .map_err(|e| SdfPackerError::InvalidInput(format!("atlas JSON: {e}")))?;
    let placements = doc
        .sprites
        .into_iter()
        .map(|s| Placement {
            sprite_index: s.index,
            name: s.name,
            rect: s.frame,
            uv_min: s.uv_min,
            uv_max: s.uv_max,
            border: s.border,
            pivot: [s.pivot.x, s.pivot.y],
            gradient_px: s.gradient_px,
            gradient_uv: s.gradient_uv,
        })
        .collect();
    Ok(AtlasLayout {
        placements,
        meta: doc.meta,
    })
}
