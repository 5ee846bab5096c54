// THEORY (Single-Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the risk engine. It is a
// "dumb" data container for a single RGB sample plus the handful of metrics that
// can be computed from that sample alone, with no knowledge of neighbours.
// Anything that needs more than one pixel (masks, percentages, histograms) lives
// in the modules built on top of it.
//
// What lives here:
// - Raw channels (RGB, 8 bits each). Alpha never reaches this layer; images are
//   coerced to RGB before classification.
// - Brightness as an 8-bit gray intensity: the Rec. 601 weighting in 16-bit
//   fixed point with rounding, which is what the brightness histogram buckets on.
//
// The fixed-point weights 19595 + 38470 + 7471 sum to exactly 65536, so a white
// pixel maps to 255 and the result can never leave the 0..=255 range.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Intensity = u8;

    const LUMA_RED_WEIGHT: u32 = 19595;
    const LUMA_GREEN_WEIGHT: u32 = 38470;
    const LUMA_BLUE_WEIGHT: u32 = 7471;
    const LUMA_ROUNDING: u32 = 1 << 15;
    const LUMA_SHIFT: u32 = 16;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// Integer grayscale intensity used for histogram bucketing.
        #[inline]
        pub fn gray(&self) -> Intensity {
            let weighted = LUMA_RED_WEIGHT * self.red as u32
                + LUMA_GREEN_WEIGHT * self.green as u32
                + LUMA_BLUE_WEIGHT * self.blue as u32
                + LUMA_ROUNDING;
            (weighted >> LUMA_SHIFT) as Intensity
        }
    }

    impl From<image::Rgb<u8>> for Pixel {
        fn from(rgb: image::Rgb<u8>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::new(red, green, blue)
        }
    }

    impl From<&image::Rgb<u8>> for Pixel {
        fn from(rgb: &image::Rgb<u8>) -> Self {
            Pixel::from(*rgb)
        }
    }

    impl From<Pixel> for image::Rgb<u8> {
        fn from(pixel: Pixel) -> Self {
            image::Rgb([pixel.red, pixel.green, pixel.blue])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn gray_of_extremes() {
        assert_eq!(Pixel::new(0, 0, 0).gray(), 0);
        assert_eq!(Pixel::new(255, 255, 255).gray(), 255);
    }

    #[test]
    fn gray_matches_rec601_rounding() {
        // 0.299 * 255 = 76.245
        assert_eq!(Pixel::new(255, 0, 0).gray(), 76);
        // 0.587 * 255 = 149.685
        assert_eq!(Pixel::new(0, 255, 0).gray(), 150);
        // 0.114 * 255 = 29.07
        assert_eq!(Pixel::new(0, 0, 255).gray(), 29);
    }

    #[test]
    fn gray_tracks_float_luma() {
        for value in [0u8, 17, 100, 128, 200, 254] {
            let pixel = Pixel::new(value, value.wrapping_mul(3), 255 - value);
            let luma = 0.299 * pixel.red as f64 + 0.587 * pixel.green as f64 + 0.114 * pixel.blue as f64;
            let difference = (pixel.gray() as f64 - luma).abs();
            assert!(difference <= 0.51, "pixel {pixel:?} differs by {difference}");
        }
    }

    #[test]
    fn converts_from_image_rgb() {
        let pixel = Pixel::from(image::Rgb([10, 20, 30]));
        assert_eq!(pixel, Pixel::new(10, 20, 30));
        let back: image::Rgb<u8> = pixel.into();
        assert_eq!(back.0, [10, 20, 30]);
    }
}
