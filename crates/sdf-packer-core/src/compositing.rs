use image::RgbaImage;

/// Copies all of `src` into `canvas` with its top-left at `(dx, dy)`, then extrudes `extrude`
/// pixels around it by repeating the nearest edge pixel (corners included).
///
/// Pixels that would land outside `canvas` are skipped.
pub fn blit_extruded(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, extrude: u32) {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return;
    }
    let (cw, ch) = canvas.dimensions();
    let e = extrude as i64;
    for yy in -e..(sh as i64 + e) {
        let ty = dy as i64 + yy;
        if ty < 0 || ty >= ch as i64 {
            continue;
        }
        let sy = yy.clamp(0, sh as i64 - 1) as u32;
        for xx in -e..(sw as i64 + e) {
            let tx = dx as i64 + xx;
            if tx < 0 || tx >= cw as i64 {
                continue;
            }
            let sx = xx.clamp(0, sw as i64 - 1) as u32;
            canvas.put_pixel(tx as u32, ty as u32, *src.get_pixel(sx, sy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn extrusion_repeats_edges() {
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, Rgba([10, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([20, 0, 0, 128]));
        let mut canvas = RgbaImage::new(6, 3);
        blit_extruded(&src, &mut canvas, 2, 1, 1);
        assert_eq!(canvas.get_pixel(1, 0)[0], 10);
        assert_eq!(canvas.get_pixel(2, 1)[0], 10);
        assert_eq!(canvas.get_pixel(3, 1)[3], 128);
        assert_eq!(canvas.get_pixel(4, 2)[0], 20);
        assert_eq!(canvas.get_pixel(5, 1)[3], 0);
        assert_eq!(canvas.get_pixel(0, 1)[3], 0);
    }
}
