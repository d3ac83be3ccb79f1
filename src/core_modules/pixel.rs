// THEORY (single-pixel colour math):
// The `Pixel` module is the most fundamental unit of the census. It is a "dumb"
// data container for one RGBA sample plus the handful of single-pixel transforms
// the classification rules need. Nothing here knows about neighbours, bands or
// policies; a pixel's category is a pure function of its four bytes.
//
// What lives here:
// - Raw channels (RGBA) exactly as decoded, 0..255.
// - `Rgb`, the opaque colour triple used for exact-match rules.
// - `Hsv`, the standard hexcone conversion of the RGB triple.
//
// The HSV conversion runs in `f64` on channels normalised by 255. Threshold rules
// compare against these values directly, so the conversion must be the textbook
// one: no gamma handling, no linearisation, hue in [0, 360).

pub mod pixel {
    use serde::{Deserialize, Serialize};

    pub type Byte = u8;
    pub type Channel = Byte;
    pub type NormalizedChannel = f64;
    pub type Hue = f64;
    pub type SaturationHSV = f64;
    pub type ValueHSV = f64;

    /// Bytes per RGBA sample.
    pub const CHANNELS: usize = 4;

    /// Alpha value of a fully opaque sample.
    pub const OPAQUE: Channel = 255;

    /// An opaque 8-bit sRGB colour triple.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Rgb {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Rgb {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Formats the triple as an upper-case `#RRGGBB` string.
        pub fn to_hex(&self) -> String {
            format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
        }
    }

    /// A colour in the HSV hexcone model.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Hsv {
        /// Hue angle in degrees, [0, 360). Zero for achromatic colours.
        pub hue: Hue,
        /// Saturation, [0, 1]. Zero when value is zero.
        pub saturation: SaturationHSV,
        /// Value (brightness of the strongest channel), [0, 1].
        pub value: ValueHSV,
    }

    /// A "dumb" data container representing a single RGBA sample.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (opacity) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub const fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Reads one sample from a 4-byte RGBA slice.
        ///
        /// Callers slice the buffer with `chunks_exact(CHANNELS)`, so the length
        /// is guaranteed by construction.
        #[inline]
        pub fn from_rgba(bytes: &[Byte; CHANNELS]) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }

        #[inline]
        pub fn is_opaque(&self) -> bool {
            self.alpha == OPAQUE
        }

        #[inline]
        pub fn rgb(&self) -> Rgb {
            Rgb::new(self.red, self.green, self.blue)
        }

        #[inline]
        fn normalized(channel: Channel) -> NormalizedChannel {
            channel as NormalizedChannel / 255.0
        }

        /// Standard RGB → HSV conversion.
        ///
        /// - V is the maximum normalised channel.
        /// - S is `(max - min) / max`, or 0 for black.
        /// - H uses the six-sector formula, 60° per sector, wrapped into [0, 360).
        ///   It is 0 for greys, so the result is never NaN.
        pub fn hsv(&self) -> Hsv {
            let red = Self::normalized(self.red);
            let green = Self::normalized(self.green);
            let blue = Self::normalized(self.blue);

            let maximum_channel = red.max(green.max(blue));
            let minimum_channel = red.min(green.min(blue));
            let delta = maximum_channel - minimum_channel;

            let saturation = if maximum_channel == 0.0 {
                0.0
            } else {
                delta / maximum_channel
            };

            let hue = if delta == 0.0 {
                0.0
            } else {
                let sector = if maximum_channel == red {
                    ((green - blue) / delta) % 6.0
                } else if maximum_channel == green {
                    (blue - red) / delta + 2.0
                } else {
                    (red - green) / delta + 4.0
                };
                let mut hue_degrees = sector * 60.0;
                if hue_degrees < 0.0 {
                    hue_degrees += 360.0;
                }
                hue_degrees
            };

            Hsv {
                hue,
                saturation,
                value: maximum_channel,
            }
        }
    }

    impl From<[Byte; CHANNELS]> for Pixel {
        fn from(bytes: [Byte; CHANNELS]) -> Self {
            Pixel::from_rgba(&bytes)
        }
    }

    impl From<Pixel> for [Byte; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue, pixel.alpha]
        }
    }
}
