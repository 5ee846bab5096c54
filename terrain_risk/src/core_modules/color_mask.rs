// THEORY:
// A `ColorMask` is the bridge between single-pixel predicates and image-wide
// statistics. For one named colour predicate it records, for every pixel of an
// RGB image, whether that pixel matched. The classifier builds one mask per
// predicate and only ever asks it two questions: how many pixels matched, and
// what share of the image that is.
//
// Key principles:
// 1.  **Independence**: Each mask is computed on its own. Masks are not a
//     partition of the image; a pixel may land in none of them, and nothing
//     stops a pixel from satisfying several predicates at once.
// 2.  **Literal thresholds**: The predicate bounds are kept exactly as tuned,
//     strict inequalities included. A channel sitting on a bound (e.g. red ==
//     100) matches neither side.
// 3.  **Transience**: Masks exist only while a classification runs.

pub mod color_mask {
    use crate::core_modules::pixel::pixel::Pixel;
    use image::RgbImage;

    pub type Percentage = f64;

    /// The three colour predicates the risk engine evaluates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ColorPredicate {
        /// "Green" pixels: low red, strong green, low blue.
        VegetationAbsence,
        /// "Blue" pixels: strong blue over low red and green.
        WaterPresence,
        /// "Brown" pixels: red and green over low blue.
        BareSoil,
    }

    impl ColorPredicate {
        pub const ALL: [ColorPredicate; 3] = [
            ColorPredicate::VegetationAbsence,
            ColorPredicate::WaterPresence,
            ColorPredicate::BareSoil,
        ];

        /// Evaluates the predicate for a single pixel.
        #[inline]
        pub fn matches(&self, pixel: &Pixel) -> bool {
            let Pixel { red, green, blue } = *pixel;
            match self {
                ColorPredicate::VegetationAbsence => red < 100 && green > 120 && blue < 100,
                ColorPredicate::WaterPresence => blue > 120 && red < 100 && green < 100,
                ColorPredicate::BareSoil => red > 100 && green > 80 && blue < 80,
            }
        }

        pub fn name(&self) -> &'static str {
            match self {
                ColorPredicate::VegetationAbsence => "vegetation-absence",
                ColorPredicate::WaterPresence => "water-presence",
                ColorPredicate::BareSoil => "bare-soil",
            }
        }
    }

    /// A boolean grid marking which pixels of an image satisfy a predicate.
    #[derive(Debug, Clone)]
    pub struct ColorMask {
        pub predicate: ColorPredicate,
        pub width: u32,
        pub height: u32,
        /// Row-major match flags, one per pixel.
        cells: Vec<bool>,
    }

    impl ColorMask {
        /// Evaluates `predicate` over every pixel of `image`.
        pub fn from_image(image: &RgbImage, predicate: ColorPredicate) -> Self {
            let cells = image
                .pixels()
                .map(|rgb| predicate.matches(&Pixel::from(rgb)))
                .collect();

            Self {
                predicate,
                width: image.width(),
                height: image.height(),
                cells,
            }
        }

        pub fn total_pixels(&self) -> u64 {
            self.width as u64 * self.height as u64
        }

        pub fn matched_pixels(&self) -> u64 {
            self.cells.iter().filter(|&&cell| cell).count() as u64
        }

        /// Share of matched pixels in percent. `None` for an image without pixels.
        pub fn percentage(&self) -> Option<Percentage> {
            let total = self.total_pixels();
            if total == 0 {
                return None;
            }
            Some(self.matched_pixels() as Percentage / total as Percentage * 100.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::color_mask::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use image::{Rgb, RgbImage};

    #[test]
    fn predicates_match_their_namesakes() {
        let green = Pixel::new(0, 255, 0);
        let blue = Pixel::new(0, 0, 255);
        let brown = Pixel::new(150, 100, 40);

        assert!(ColorPredicate::VegetationAbsence.matches(&green));
        assert!(!ColorPredicate::VegetationAbsence.matches(&blue));
        assert!(ColorPredicate::WaterPresence.matches(&blue));
        assert!(!ColorPredicate::WaterPresence.matches(&brown));
        assert!(ColorPredicate::BareSoil.matches(&brown));
        assert!(!ColorPredicate::BareSoil.matches(&green));
    }

    #[test]
    fn bounds_are_strict() {
        // red == 100 sits on the boundary of every red test.
        let boundary = Pixel::new(100, 200, 50);
        for predicate in ColorPredicate::ALL {
            assert!(!predicate.matches(&boundary), "{} matched", predicate.name());
        }
        assert!(!ColorPredicate::VegetationAbsence.matches(&Pixel::new(0, 120, 0)));
        assert!(!ColorPredicate::WaterPresence.matches(&Pixel::new(0, 0, 120)));
        assert!(!ColorPredicate::BareSoil.matches(&Pixel::new(101, 80, 0)));
        assert!(!ColorPredicate::BareSoil.matches(&Pixel::new(101, 81, 80)));
    }

    #[test]
    fn mask_counts_matches() {
        let image = RgbImage::from_fn(4, 2, |x, _| {
            if x == 0 { Rgb([0, 0, 255]) } else { Rgb([255, 255, 255]) }
        });
        let mask = ColorMask::from_image(&image, ColorPredicate::WaterPresence);

        assert_eq!(mask.total_pixels(), 8);
        assert_eq!(mask.matched_pixels(), 2);
        assert_eq!(mask.percentage(), Some(25.0));
    }

    #[test]
    fn empty_image_has_no_percentage() {
        let mask = ColorMask::from_image(&RgbImage::new(0, 3), ColorPredicate::BareSoil);
        assert_eq!(mask.matched_pixels(), 0);
        assert_eq!(mask.percentage(), None);
    }
}
