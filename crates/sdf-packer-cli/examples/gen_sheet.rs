//! Writes a small sprite sheet plus its sprite list for trying the CLI:
//!
//! ```text
//! cargo run -p sdf-packer-cli --example gen_sheet -- target/demo
//! cargo run -p sdf-packer-cli -- generate target/demo/sheet.png --sprites target/demo/sprites.json
//! ```
use image::{Rgba, RgbaImage};
use sdf_packer_core::{Border, Rect, SpriteRect};
use std::fs;
use std::path::PathBuf;

const CELL: u32 = 64;

fn disc(cx: f32, cy: f32, r: f32, x: u32, y: u32) -> bool {
    (x as f32 + 0.5 - cx).powi(2) + (y as f32 + 0.5 - cy).powi(2) <= r * r
}

fn shape(kind: usize, x: u32, y: u32) -> bool {
    let c = CELL as f32 / 2.0;
    match kind {
        0 => disc(c, c, 24.0, x, y),
        1 => disc(c, c, 26.0, x, y) && !disc(c, c, 14.0, x, y),
        2 => (8..56).contains(&x) && (20..44).contains(&y),
        _ => {
            let (dx, dy) = ((x as f32 - c).abs(), (y as f32 - c).abs());
            dx + dy <= 26.0
        }
    }
}

fn main() -> anyhow::Result<()> {
    let out = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target/demo"));
    fs::create_dir_all(&out)?;

    let names = ["disc", "ring", "bar", "diamond"];
    let mut sheet = RgbaImage::new(CELL * names.len() as u32, CELL);
    for (i, _) in names.iter().enumerate() {
        for y in 0..CELL {
            for x in 0..CELL {
                if shape(i, x, y) {
                    sheet.put_pixel(i as u32 * CELL + x, y, Rgba([255, 255, 255, 255]));
                }
            }
        }
    }
    sheet.save(out.join("sheet.png"))?;

    let sprites: Vec<SpriteRect> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let s = SpriteRect::new(*name, Rect::new(i as u32 * CELL, 0, CELL, CELL));
            if *name == "bar" {
                s.with_border(Border::new(12.0, 0.0, 12.0, 0.0))
            } else {
                s
            }
        })
        .collect();
    fs::write(out.join("sprites.json"), serde_json::to_string_pretty(&sprites)?)?;
    println!("wrote {}", out.display());
    Ok(())
}
