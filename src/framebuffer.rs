use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, Size},
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    primitives::{PointsIter, Rectangle},
    Pixel,
};

/// Logical panel dimensions (landscape).
pub const FB_WIDTH: u32 = 320;
pub const FB_HEIGHT: u32 = 240;

/// Lines per band when a frame is painted in strips. A full frame would not
/// fit in one block of internal RAM next to the Wi-Fi stack.
pub const BAND_LINES: u32 = 40;

/// RGB565 strip of full-width rows, placed at a vertical offset on the
/// panel. Drawing uses panel coordinates; anything outside the strip is
/// clipped. With `top == 0` and a full height it is a whole frame.
pub struct Framebuffer {
    buf: Vec<u16>,
    width: u32,
    height: u32,
    top: u32,
}

/// Something that can show a band of the frame at its position.
pub trait Screen {
    fn present(&mut self, band: &Framebuffer) -> anyhow::Result<()>;
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: vec![0; (width * height) as usize],
            width,
            height,
            top: 0,
        }
    }

    /// Buffer for band-by-band painting of a `FB_WIDTH` wide frame.
    pub fn band() -> Self {
        Self::new(FB_WIDTH, BAND_LINES)
    }

    /// Move the strip so its first row is panel row `top`.
    pub fn set_top(&mut self, top: u32) {
        self.top = top;
    }

    pub fn clear_color(&mut self, color: Rgb565) {
        let raw = RawU16::from(color).into_inner();
        self.buf.fill(raw);
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y < self.top || y >= self.top + self.height {
            return None;
        }
        Some(((y - self.top) * self.width + x) as usize)
    }

    /// Pixel at panel coordinates, None outside the strip.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        let idx = self.index(x, y)?;
        Some(RawU16::new(self.buf[idx]).into())
    }

    /// Pixels in row-major order, as the panel expects them.
    pub fn colors(&self) -> impl Iterator<Item = Rgb565> + '_ {
        self.buf.iter().map(|raw| RawU16::new(*raw).into())
    }

    /// Pixels of `color` inside `area`.
    pub fn count_in(&self, area: &Rectangle, color: Rgb565) -> usize {
        let raw = RawU16::from(color).into_inner();
        let area = area.intersection(&self.bounding_box());
        area.points()
            .filter_map(|p| self.index(p.x as u32, p.y as u32))
            .filter(|idx| self.buf[*idx] == raw)
            .count()
    }
}

impl Dimensions for Framebuffer {
    fn bounding_box(&self) -> Rectangle {
        Rectangle::new(
            Point::new(0, self.top as i32),
            Size::new(self.width, self.height),
        )
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            if let Some(idx) = self.index(point.x as u32, point.y as u32) {
                self.buf[idx] = RawU16::from(color).into_inner();
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let raw = RawU16::from(color).into_inner();
        let area = area.intersection(&self.bounding_box());
        let w = self.width;
        for y in area.rows() {
            let row_start = ((y as u32 - self.top) * w) as usize;
            for x in area.columns() {
                self.buf[row_start + x as usize] = raw;
            }
        }
        Ok(())
    }
}

/// Paint a `frame_height` tall frame through `band`, top to bottom,
/// handing each finished band to `screen`. Stops at the first screen error.
pub fn paint_frame<S, F>(
    band: &mut Framebuffer,
    screen: &mut S,
    frame_height: u32,
    mut draw: F,
) -> anyhow::Result<()>
where
    S: Screen,
    F: FnMut(&mut Framebuffer),
{
    let mut top = 0;
    while top < frame_height {
        band.set_top(top);
        draw(band);
        screen.present(band)?;
        top += band.height;
    }
    Ok(())
}
