use super::*;
use crate::{identicon::Cell, spectrogram::Saturation};

fn flat_spectrogram(value: u8) -> SpectrogramImage {
    SpectrogramImage {
        image: RgbaImage::from_pixel(64, 64, Rgba([value, value, value, 255])),
        saturation: Saturation::default(),
    }
}

fn near(a: u8, b: u8) -> bool {
    a.abs_diff(b) <= 1
}

#[test]
fn glyph_side_is_forty_percent_on_the_grid() {
    assert_eq!(glyph_side(ARTWORK_SIZE), 410);
    assert_eq!(glyph_side(500), 200);
    assert_eq!(glyph_side(ARTWORK_SIZE) % GRID as u32, 0);
}

#[test]
fn artwork_is_square_and_opaque() {
    let art = compose(&flat_spectrogram(120), &IdenticonGlyph::generate(9));
    assert_eq!(art.image.dimensions(), (ARTWORK_SIZE, ARTWORK_SIZE));
    assert_eq!(art.side(), ARTWORK_SIZE);
    assert!(art.image.pixels().all(|p| p[3] == 255));
}

#[test]
fn artwork_is_deterministic() {
    let spec = flat_spectrogram(80);
    let glyph = IdenticonGlyph::generate(0xABCD);
    let a = compose_at(&spec, &glyph, 200);
    let b = compose_at(&spec, &glyph, 200);
    assert_eq!(a.image.as_raw(), b.image.as_raw());
}

#[test]
fn layers_stack_in_order() {
    let glyph = IdenticonGlyph::generate(3);
    let art = compose(&flat_spectrogram(200), &glyph);

    // Spectrogram at half opacity over black.
    let corner = art.image.get_pixel(0, 0);
    assert!(near(corner[0], 100), "corner {corner:?}");

    // Plate margin darkens the spectrogram further.
    let plate = art.image.get_pixel(290, 290);
    assert!(near(plate[0], 62), "plate {plate:?}");
    assert!(plate[0] < corner[0]);

    // Glyph cells replace what is below them.
    let anchor = (ARTWORK_SIZE - glyph_side(ARTWORK_SIZE)) / 2;
    assert_eq!(anchor, 307);
    let cell_px = glyph_side(ARTWORK_SIZE) / GRID as u32;
    for row in 0..GRID {
        for col in 0..GRID {
            let x = anchor + col as u32 * cell_px + cell_px / 2;
            let y = anchor + row as u32 * cell_px + cell_px / 2;
            let px = art.image.get_pixel(x, y).0;
            match glyph.cell(row, col) {
                Cell::Primary => assert_eq!(px, glyph.palette().primary),
                Cell::Accent => assert_eq!(px, glyph.palette().accent),
                Cell::Empty => assert!(near(px[0], 62), "empty cell {px:?}"),
            }
        }
    }
}
