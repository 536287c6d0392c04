use anyhow::{anyhow, Result};
use embedded_graphics::prelude::*;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig, SPI2};
use esp_idf_hal::units::Hertz;
use log::info;
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9341Rgb565;
use mipidsi::options::{ColorOrder, Orientation, Rotation};
use mipidsi::{Builder, NoResetPin};

use crate::debug_flags;
use crate::framebuffer::{Framebuffer, Screen, FB_HEIGHT, FB_WIDTH};

// ── SPI ─────────────────────────────────────────────────────────────
const PCLK_HZ: u32 = 40_000_000;
const SPI_BUFFER_BYTES: usize = 512;

type Interface = SpiInterface<
    'static,
    SpiDeviceDriver<'static, SpiDriver<'static>>,
    PinDriver<'static, AnyOutputPin, Output>,
>;
type Ili9341 = mipidsi::Display<Interface, ILI9341Rgb565, NoResetPin>;

/// Pins of the 2.8" ILI9341 board (HSPI).
pub struct PanelPins {
    pub sclk: AnyOutputPin,
    pub mosi: AnyOutputPin,
    pub miso: AnyIOPin,
    pub cs: AnyOutputPin,
    pub dc: AnyOutputPin,
    pub backlight: AnyOutputPin,
}

/// ILI9341 in landscape. Each `present` writes one band at its row offset.
pub struct Panel {
    display: Ili9341,
    _backlight: PinDriver<'static, AnyOutputPin, Output>,
}

impl Panel {
    pub fn new(spi: SPI2, pins: PanelPins) -> Result<Self> {
        let driver = SpiDriver::new(
            spi,
            pins.sclk,
            pins.mosi,
            Some(pins.miso),
            &SpiDriverConfig::new(),
        )?;
        let device = SpiDeviceDriver::new(
            driver,
            Some(pins.cs),
            &SpiConfig::new().baudrate(Hertz(PCLK_HZ)),
        )?;
        let dc = PinDriver::output(pins.dc)?;

        // Lives as long as the panel, which is the whole program.
        let buffer: &'static mut [u8] = Box::leak(vec![0u8; SPI_BUFFER_BYTES].into_boxed_slice());
        let interface = SpiInterface::new(device, dc, buffer);

        let mut delay = Ets;
        let display = Builder::new(ILI9341Rgb565, interface)
            .display_size(FB_HEIGHT as u16, FB_WIDTH as u16)
            .orientation(Orientation::new().rotate(Rotation::Deg90))
            .color_order(ColorOrder::Bgr)
            .init(&mut delay)
            .map_err(|e| anyhow!("ILI9341 init failed: {:?}", e))?;
        if debug_flags::verbose() {
            info!("Display initialized OK");
        }

        let mut backlight = PinDriver::output(pins.backlight)?;
        backlight.set_high()?;
        if debug_flags::verbose() {
            info!("Backlight ON");
        }

        Ok(Self {
            display,
            _backlight: backlight,
        })
    }
}

impl Screen for Panel {
    fn present(&mut self, band: &Framebuffer) -> Result<()> {
        self.display
            .fill_contiguous(&band.bounding_box(), band.colors())
            .map_err(|e| anyhow!("panel write failed: {:?}", e))
    }
}
