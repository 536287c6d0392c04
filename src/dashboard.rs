use std::net::Ipv4Addr;
use std::time::Duration;

use embedded_graphics::{
    mono_font::MonoTextStyle,
    prelude::*,
    primitives::{Circle, PrimitiveStyle, Rectangle},
    text::{Alignment, Text},
};
use profont::{PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT, PROFONT_9_POINT};

use crate::clock::{self, ServerTime};
use crate::face::FaceGlyph;
use crate::framebuffer::Framebuffer;
use crate::layout::*;
use crate::status::StatusSnapshot;

pub const BOTTOM_LINE_CHARS: usize = 22;
pub const WORD_LINE_CHARS: usize = 22;
pub const SERVICE_NAME_CHARS: usize = 16;

pub const OFFLINE_TEXT: &str = "API offline";
pub const NO_TIME_TEXT: &str = "No time";
pub const NO_SERVICES_TEXT: &str = "No services";
const WORD_PREFIX: &str = "Word: ";

/// Everything outside the snapshot that a frame depends on.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// UTC seconds from the system clock, None if never set.
    pub wall_utc: Option<i64>,
    pub utc_offset_secs: i32,
    /// Latest server time any payload carried. Kept across payloads that
    /// omit it.
    pub server_time: Option<ServerTime>,
    /// Monotonic time since `server_time` was captured.
    pub since_capture: Duration,
    pub local_ip: Option<Ipv4Addr>,
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Clock { time: String, date: String },
    NoTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRow {
    pub name: String,
    pub is_up: bool,
}

/// One frame's worth of text and glyphs, already truncated to fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub header: Header,
    pub face: FaceGlyph,
    pub services: Vec<ServiceRow>,
    pub bottom_line: String,
    pub offline: bool,
    pub word_line: String,
    /// IP line and render-time line, only with debug on.
    pub footer: Option<(String, String)>,
}

impl Dashboard {
    pub fn build(snapshot: &StatusSnapshot, offline: bool, ctx: &RenderContext) -> Dashboard {
        let shown = clock::header_time(
            ctx.server_time,
            ctx.wall_utc,
            ctx.utc_offset_secs,
            ctx.since_capture,
        );
        let header = match shown {
            Some(t) => Header::Clock {
                time: t.time_text(),
                date: t.date_text(),
            },
            None => Header::NoTime,
        };

        let services = snapshot
            .services
            .iter()
            .map(|s| ServiceRow {
                name: truncate(&s.name, SERVICE_NAME_CHARS).to_string(),
                is_up: s.is_up,
            })
            .collect();

        let bottom = if offline { OFFLINE_TEXT } else { snapshot.bottom_line.as_str() };
        let word_line = format!("{}{}", WORD_PREFIX, snapshot.word_of_day);

        let footer = ctx.debug.then(|| {
            let ip = match ctx.local_ip {
                Some(ip) => format!("IP: {}", ip),
                None => "IP: offline".to_string(),
            };
            let rendered = shown
                .or_else(|| ctx.wall_utc.map(|utc| clock::local_from_utc(utc, ctx.utc_offset_secs)));
            let rendered = match rendered {
                Some(t) => format!("Render: {}", t.time_text_secs()),
                None => "Render: no time".to_string(),
            };
            (ip, rendered)
        });

        Dashboard {
            header,
            face: FaceGlyph::for_expression(&snapshot.expression_state),
            services,
            bottom_line: truncate(bottom, BOTTOM_LINE_CHARS).to_string(),
            offline,
            word_line: truncate(&word_line, WORD_LINE_CHARS).to_string(),
            footer,
        }
    }

    /// Clear the whole frame and draw every region.
    pub fn draw(&self, fb: &mut Framebuffer) {
        fb.clear_color(BG_DASHBOARD);

        // 1. Clock (left)
        match &self.header {
            Header::Clock { time, date } => {
                let clock_style = MonoTextStyle::new(&PROFONT_24_POINT, TEXT_CLOCK);
                Text::new(time, Point::new(MARGIN, CLOCK_BASELINE_Y), clock_style)
                    .draw(fb)
                    .ok();
                let date_style = MonoTextStyle::new(&PROFONT_14_POINT, TEXT_DATE);
                Text::new(date, Point::new(DATE_X, CLOCK_BASELINE_Y), date_style)
                    .draw(fb)
                    .ok();
            }
            Header::NoTime => {
                let style = MonoTextStyle::new(&PROFONT_18_POINT, TEXT_SECONDARY);
                Text::new(NO_TIME_TEXT, Point::new(MARGIN, CLOCK_BASELINE_Y), style)
                    .draw(fb)
                    .ok();
            }
        }

        // 2. Face (right)
        self.face.draw(
            fb,
            Point::new(FACE_CENTER_X, FACE_CENTER_Y),
            FACE_DIAMETER,
        );

        draw_hline(fb, HEADER_LINE_Y, LINE_COLOR);

        // 3. Services
        draw_card(
            fb,
            Rectangle::new(
                Point::new(MARGIN, SERVICES_CARD_Y),
                Size::new((SCREEN_W - 2 * MARGIN) as u32, SERVICES_CARD_H as u32),
            ),
            10,
            CARD_FILL_SERVICES,
            CARD_BORDER_SERVICES,
        );

        let name_style = MonoTextStyle::new(&PROFONT_14_POINT, TEXT_PRIMARY);
        if self.services.is_empty() {
            Text::new(
                NO_SERVICES_TEXT,
                Point::new(SERVICE_NAME_X, SERVICE_ROW_FIRST_BASELINE),
                name_style,
            )
            .draw(fb)
            .ok();
        }
        for (i, row) in self.services.iter().enumerate() {
            let baseline = SERVICE_ROW_FIRST_BASELINE + i as i32 * SERVICE_ROW_STRIDE;
            let dot = if row.is_up { SERVICE_UP } else { SERVICE_DOWN };
            Circle::with_center(Point::new(SERVICE_DOT_X, baseline - 5), SERVICE_DOT_DIAMETER)
                .into_styled(PrimitiveStyle::with_fill(dot))
                .draw(fb)
                .ok();
            Text::new(&row.name, Point::new(SERVICE_NAME_X, baseline), name_style)
                .draw(fb)
                .ok();
        }

        // 4. Bottom line + word of the day
        let bottom_color = if self.offline { TEXT_OFFLINE } else { TEXT_PRIMARY };
        let bottom_style = MonoTextStyle::new(&PROFONT_18_POINT, bottom_color);
        Text::new(&self.bottom_line, Point::new(MARGIN, BOTTOM_LINE_BASELINE), bottom_style)
            .draw(fb)
            .ok();

        let word_style = MonoTextStyle::new(&PROFONT_14_POINT, TEXT_SECONDARY);
        Text::new(&self.word_line, Point::new(MARGIN, WORD_LINE_BASELINE), word_style)
            .draw(fb)
            .ok();

        // 5. Debug footer
        if let Some((ip, rendered)) = &self.footer {
            let debug_style = MonoTextStyle::new(&PROFONT_9_POINT, TEXT_DEBUG);
            Text::new(ip, Point::new(MARGIN, DEBUG_IP_BASELINE), debug_style)
                .draw(fb)
                .ok();
            Text::new(rendered, Point::new(MARGIN, DEBUG_RENDER_BASELINE), debug_style)
                .draw(fb)
                .ok();
        }
    }
}

/// Boot screen shown while the link and clock come up.
pub fn draw_splash(fb: &mut Framebuffer, status: &str) {
    fb.clear_color(BG_SPLASH);
    let cx = SCREEN_W / 2;
    let cy = SCREEN_H / 2;

    let title_style = MonoTextStyle::new(&PROFONT_24_POINT, TEXT_SPLASH_TITLE);
    Text::with_alignment("Homelab", Point::new(cx, cy - 20), title_style, Alignment::Center)
        .draw(fb)
        .ok();

    let status_style = MonoTextStyle::new(&PROFONT_14_POINT, TEXT_SPLASH_STATUS);
    Text::with_alignment(
        truncate(status, 30),
        Point::new(cx, cy + 24),
        status_style,
        Alignment::Center,
    )
    .draw(fb)
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{paint_frame, Screen, FB_HEIGHT, FB_WIDTH};
    use crate::status::{Expression, ServiceItem, Services};
    use embedded_graphics::pixelcolor::Rgb565;
    use embedded_graphics::Pixel;

    fn render(
        fb: &mut Framebuffer,
        snapshot: &StatusSnapshot,
        offline: bool,
        ctx: &RenderContext,
    ) -> Dashboard {
        let dashboard = Dashboard::build(snapshot, offline, ctx);
        dashboard.draw(fb);
        dashboard
    }

    fn at_1430() -> Option<ServerTime> {
        ServerTime::parse("2024-03-05T14:30:00")
    }

    fn snapshot_with(services: &[(&str, bool)]) -> StatusSnapshot {
        let mut list = Services::new();
        for (name, is_up) in services {
            list.push(ServiceItem {
                name: name.to_string(),
                is_up: *is_up,
            })
            .unwrap();
        }
        StatusSnapshot {
            bottom_line: "Everything nominal".to_string(),
            word_of_day: "petrichor".to_string(),
            expression_state: Expression::Happy,
            expression_message: "All good!".to_string(),
            services: list,
            server_time: ServerTime::parse("2024-03-05T14:30:00"),
        }
    }

    fn services_area() -> Rectangle {
        Rectangle::new(
            Point::new(0, SERVICES_CARD_Y),
            Size::new(SCREEN_W as u32, SERVICES_CARD_H as u32),
        )
    }

    #[test]
    fn long_texts_are_cut_to_their_budgets() {
        let mut snapshot = snapshot_with(&[("a-very-long-service-x", true)]);
        snapshot.bottom_line = "abcdefghijklmnopqrstuvwxyz0123".to_string();
        snapshot.word_of_day = "antidisestablishmentarianism".to_string();
        let d = Dashboard::build(&snapshot, false, &RenderContext::default());

        assert_eq!(d.bottom_line, "abcdefghijklmnopqrstuv");
        assert_eq!(d.services[0].name, "a-very-long-serv");
        assert_eq!(d.word_line, "Word: antidisestablish");
        assert_eq!(d.word_line.chars().count(), 22);
        // Storage keeps the full text.
        assert_eq!(snapshot.bottom_line.len(), 30);
    }

    #[test]
    fn offline_overrides_bottom_line_only_on_screen() {
        let snapshot = snapshot_with(&[("nas", true)]);
        let before = snapshot.clone();
        let mut fb = Framebuffer::new(FB_WIDTH, FB_HEIGHT);

        let offline = render(&mut fb, &snapshot, true, &RenderContext::default());
        assert_eq!(offline.bottom_line, OFFLINE_TEXT);
        assert_eq!(offline.services.len(), 1);
        assert_eq!(offline.word_line, "Word: petrichor");
        assert_eq!(snapshot, before);

        let online = render(&mut fb, &snapshot, false, &RenderContext::default());
        assert_eq!(online.bottom_line, "Everything nominal");
    }

    #[test]
    fn clock_placeholder_until_server_time_known() {
        let snapshot = snapshot_with(&[]);
        let ctx = RenderContext {
            wall_utc: Some(1_709_649_000),
            ..Default::default()
        };
        assert_eq!(Dashboard::build(&snapshot, false, &ctx).header, Header::NoTime);

        let ctx = RenderContext {
            wall_utc: Some(1_709_649_000 + 600),
            utc_offset_secs: 3600,
            server_time: at_1430(),
            ..Default::default()
        };
        assert_eq!(
            Dashboard::build(&snapshot, false, &ctx).header,
            Header::Clock {
                time: "15:40".to_string(),
                date: "05/03".to_string()
            }
        );
    }

    #[test]
    fn header_uses_remembered_server_time_when_payload_has_none() {
        let mut snapshot = snapshot_with(&[]);
        snapshot.server_time = None;
        let ctx = RenderContext {
            server_time: at_1430(),
            since_capture: Duration::from_secs(120),
            ..Default::default()
        };
        assert_eq!(
            Dashboard::build(&snapshot, false, &ctx).header,
            Header::Clock {
                time: "14:32".to_string(),
                date: "05/03".to_string()
            }
        );
    }

    #[test]
    fn footer_time_matches_header_without_sntp() {
        let snapshot = snapshot_with(&[]);
        let ctx = RenderContext {
            server_time: at_1430(),
            since_capture: Duration::from_secs(75),
            debug: true,
            ..Default::default()
        };
        let d = Dashboard::build(&snapshot, false, &ctx);
        assert_eq!(
            d.header,
            Header::Clock {
                time: "14:31".to_string(),
                date: "05/03".to_string()
            }
        );
        assert_eq!(
            d.footer,
            Some(("IP: offline".to_string(), "Render: 14:31:15".to_string()))
        );
    }

    #[test]
    fn face_follows_expression() {
        let mut snapshot = snapshot_with(&[]);
        snapshot.expression_state = Expression::Error;
        let d = Dashboard::build(&snapshot, false, &RenderContext::default());
        assert_eq!(d.face, FaceGlyph::Alarmed);
    }

    #[test]
    fn debug_footer_only_when_enabled() {
        let snapshot = snapshot_with(&[]);
        let quiet = Dashboard::build(&snapshot, false, &RenderContext::default());
        assert_eq!(quiet.footer, None);

        let ctx = RenderContext {
            wall_utc: Some(1_709_649_005),
            local_ip: Some(Ipv4Addr::new(192, 168, 1, 42)),
            debug: true,
            ..Default::default()
        };
        let d = Dashboard::build(&snapshot, false, &ctx);
        assert_eq!(
            d.footer,
            Some(("IP: 192.168.1.42".to_string(), "Render: 14:30:05".to_string()))
        );

        let offline_ctx = RenderContext {
            debug: true,
            ..Default::default()
        };
        let d = Dashboard::build(&snapshot, true, &offline_ctx);
        assert_eq!(
            d.footer,
            Some(("IP: offline".to_string(), "Render: no time".to_string()))
        );
    }

    #[test]
    fn empty_service_list_draws_placeholder_and_no_dots() {
        let snapshot = snapshot_with(&[]);
        let mut fb = Framebuffer::new(FB_WIDTH, FB_HEIGHT);
        let d = render(&mut fb, &snapshot, false, &RenderContext::default());
        assert!(d.services.is_empty());
        assert_eq!(fb.count_in(&services_area(), SERVICE_UP), 0);
        assert_eq!(fb.count_in(&services_area(), SERVICE_DOWN), 0);
        assert!(fb.count_in(&services_area(), TEXT_PRIMARY) > 0);
    }

    #[test]
    fn service_dots_use_up_and_down_colors() {
        let snapshot = snapshot_with(&[("nas", true), ("pihole", false), ("ha", true)]);
        let mut fb = Framebuffer::new(FB_WIDTH, FB_HEIGHT);
        render(&mut fb, &snapshot, false, &RenderContext::default());

        let up = fb.count_in(&services_area(), SERVICE_UP);
        let down = fb.count_in(&services_area(), SERVICE_DOWN);
        assert!(up > 0 && down > 0);
        assert!(up > down);
    }

    #[test]
    fn every_render_starts_from_a_clean_frame() {
        let mut fb = Framebuffer::new(FB_WIDTH, FB_HEIGHT);
        fb.clear_color(Rgb565::WHITE);
        render(&mut fb, &snapshot_with(&[]), false, &RenderContext::default());
        assert_eq!(fb.pixel(0, 0), Some(BG_DASHBOARD));
        assert_eq!(fb.pixel(FB_WIDTH - 1, FB_HEIGHT - 1), Some(BG_DASHBOARD));
    }

    struct Stitcher(Framebuffer);

    impl Screen for Stitcher {
        fn present(&mut self, band: &Framebuffer) -> anyhow::Result<()> {
            let pixels = band
                .bounding_box()
                .points()
                .zip(band.colors())
                .map(|(p, c)| Pixel(p, c));
            self.0.draw_iter(pixels).ok();
            Ok(())
        }
    }

    #[test]
    fn banded_paint_matches_full_frame() {
        let snapshot = snapshot_with(&[("nas", true), ("pihole", false), ("ha", true)]);
        let ctx = RenderContext {
            server_time: at_1430(),
            local_ip: Some(Ipv4Addr::new(10, 0, 0, 7)),
            debug: true,
            ..Default::default()
        };
        let d = Dashboard::build(&snapshot, false, &ctx);

        let mut full = Framebuffer::new(FB_WIDTH, FB_HEIGHT);
        d.draw(&mut full);

        let mut band = Framebuffer::band();
        let mut screen = Stitcher(Framebuffer::new(FB_WIDTH, FB_HEIGHT));
        paint_frame(&mut band, &mut screen, FB_HEIGHT, |fb| d.draw(fb)).unwrap();
        assert!(screen.0.colors().eq(full.colors()));

        let mut splash_full = Framebuffer::new(FB_WIDTH, FB_HEIGHT);
        draw_splash(&mut splash_full, "Connecting to Wi-Fi");
        paint_frame(&mut band, &mut screen, FB_HEIGHT, |fb| {
            draw_splash(fb, "Connecting to Wi-Fi")
        })
        .unwrap();
        assert!(screen.0.colors().eq(splash_full.colors()));
    }
}
