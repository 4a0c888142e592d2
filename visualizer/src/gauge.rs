use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Size, Theme,
};

/// Horizontal bar showing the anomalous share of the scene.
#[derive(Clone)]
pub struct RatioGauge {
    ratio: f32,
}

impl RatioGauge {
    pub fn new(ratio: f32) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
        }
    }

    /// Filled width for a gauge `width` pixels wide; tiny non-zero shares stay visible.
    pub fn fill_width(&self, width: f32) -> f32 {
        if self.ratio <= 0.0 {
            0.0
        } else {
            (self.ratio * width).max(2.0).min(width)
        }
    }
}

impl<Message> canvas::Program<Message> for RatioGauge {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let filled = self.fill_width(bounds.width);
        if filled > 0.0 {
            frame.fill_rectangle(
                Point::ORIGIN,
                Size::new(filled, bounds.height),
                Color::from_rgb(0.95, 0.55, 0.2),
            );
        }

        let ticks = Path::new(|builder| {
            for quarter in 1..4 {
                let x = bounds.width * quarter as f32 / 4.0;
                builder.move_to(Point::new(x, 0.0));
                builder.line_to(Point::new(x, bounds.height));
            }
        });
        frame.stroke(
            &ticks,
            Stroke::default()
                .with_width(1.0)
                .with_color(Color::from_rgb(0.35, 0.35, 0.45)),
        );

        vec![frame.into_geometry()]
    }
}
