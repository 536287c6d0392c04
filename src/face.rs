use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Arc, Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder},
};

use crate::layout::rgb;
use crate::status::Expression;

const FACE_OUTLINE: Rgb565 = rgb(232, 235, 240);
const FACE_FEATURES: Rgb565 = rgb(20, 24, 32);

/// Face drawn in the header, one per expression family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaceGlyph {
    #[default]
    Default,
    Pleased,
    Neutral,
    Alarmed,
}

impl FaceGlyph {
    /// Straight lookup, no priorities: anything unlisted gets the default.
    pub fn for_expression(expression: &Expression) -> FaceGlyph {
        match expression {
            Expression::Warning | Expression::Error => FaceGlyph::Alarmed,
            Expression::Thinking => FaceGlyph::Neutral,
            Expression::Happy => FaceGlyph::Pleased,
            Expression::Idle | Expression::Other(_) => FaceGlyph::Default,
        }
    }

    #[cfg(test)]
    pub(crate) fn label(self) -> &'static str {
        match self {
            FaceGlyph::Default => "default",
            FaceGlyph::Pleased => "pleased",
            FaceGlyph::Neutral => "neutral",
            FaceGlyph::Alarmed => "alarmed",
        }
    }

    pub fn fill(self) -> Rgb565 {
        match self {
            FaceGlyph::Default => rgb(120, 144, 176),
            FaceGlyph::Pleased => rgb(255, 204, 0),
            FaceGlyph::Neutral => rgb(255, 159, 10),
            FaceGlyph::Alarmed => rgb(230, 60, 60),
        }
    }

    /// Draw the face centered on `center`.
    pub fn draw<D>(self, target: &mut D, center: Point, diameter: u32)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let d = diameter as i32;
        let head = PrimitiveStyleBuilder::new()
            .fill_color(self.fill())
            .stroke_color(FACE_OUTLINE)
            .stroke_width(2)
            .build();
        Circle::with_center(center, diameter)
            .into_styled(head)
            .draw(target)
            .ok();

        // Eyes
        let eye = PrimitiveStyle::with_fill(FACE_FEATURES);
        let eye_d = (diameter / 8).max(3);
        let eye_dx = d / 5;
        let eye_y = center.y - d / 8;
        for dx in [-eye_dx, eye_dx] {
            let eye_center = match self {
                // Looking up and to the side.
                FaceGlyph::Neutral => Point::new(center.x + dx + 1, eye_y - 2),
                _ => Point::new(center.x + dx, eye_y),
            };
            let size = if self == FaceGlyph::Alarmed { eye_d + 2 } else { eye_d };
            Circle::with_center(eye_center, size)
                .into_styled(eye)
                .draw(target)
                .ok();
        }

        // Mouth
        let stroke = PrimitiveStyle::with_stroke(FACE_FEATURES, 2);
        let mouth_y = center.y + d / 5;
        match self {
            FaceGlyph::Pleased => {
                Arc::with_center(
                    Point::new(center.x, center.y + d / 16),
                    diameter / 2,
                    30.0.deg(),
                    120.0.deg(),
                )
                .into_styled(stroke)
                .draw(target)
                .ok();
            }
            FaceGlyph::Neutral => {
                Line::new(
                    Point::new(center.x - d / 6, mouth_y + 2),
                    Point::new(center.x + d / 6, mouth_y - 2),
                )
                .into_styled(stroke)
                .draw(target)
                .ok();
            }
            FaceGlyph::Alarmed => {
                Circle::with_center(Point::new(center.x, mouth_y), diameter / 5)
                    .into_styled(stroke)
                    .draw(target)
                    .ok();
            }
            FaceGlyph::Default => {
                Line::new(
                    Point::new(center.x - d / 8, mouth_y),
                    Point::new(center.x + d / 8, mouth_y),
                )
                .into_styled(stroke)
                .draw(target)
                .ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::Framebuffer;
    use embedded_graphics::primitives::Rectangle;

    #[test]
    fn expression_to_glyph_mapping() {
        let cases = [
            (Expression::Warning, FaceGlyph::Alarmed),
            (Expression::Error, FaceGlyph::Alarmed),
            (Expression::Thinking, FaceGlyph::Neutral),
            (Expression::Happy, FaceGlyph::Pleased),
            (Expression::Idle, FaceGlyph::Default),
            (Expression::parse("focused"), FaceGlyph::Default),
            (Expression::default(), FaceGlyph::Default),
        ];
        for (expression, glyph) in cases {
            assert_eq!(FaceGlyph::for_expression(&expression), glyph, "{:?}", expression);
        }
    }

    #[test]
    fn every_glyph_draws_head_and_features() {
        let area = Rectangle::new(Point::zero(), Size::new(48, 48));
        for glyph in [
            FaceGlyph::Default,
            FaceGlyph::Pleased,
            FaceGlyph::Neutral,
            FaceGlyph::Alarmed,
        ] {
            let mut fb = Framebuffer::new(48, 48);
            glyph.draw(&mut fb, Point::new(24, 24), 44);
            assert!(fb.count_in(&area, glyph.fill()) > 500, "{}", glyph.label());
            assert!(fb.count_in(&area, FACE_FEATURES) > 10, "{}", glyph.label());
        }
    }
}
