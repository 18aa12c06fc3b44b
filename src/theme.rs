use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Blends toward a grey `level` as `lighting` drops from 1.0 to 0.0.
    fn dim_toward(self, level: f32, lighting: f32) -> Rgb {
        let mix = |c: u8| (c as f32 * lighting + (1.0 - lighting) * level).round() as u8;
        Rgb(mix(self.0), mix(self.1), mix(self.2))
    }

    pub fn lightened(self, amount: f32) -> Rgb {
        let amount = amount.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f32 + (255.0 - c as f32) * amount).round() as u8;
        Rgb(mix(self.0), mix(self.1), mix(self.2))
    }

    fn scaled(self, factor: f32) -> Rgb {
        let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Rgb(scale(self.0), scale(self.1), scale(self.2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Forest,
    Classic,
    Warm,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Forest, Theme::Classic, Theme::Warm, Theme::Dark];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Forest => "Forest",
            Theme::Classic => "Classic",
            Theme::Warm => "Warm",
            Theme::Dark => "Dark",
        }
    }

    pub fn next(self) -> Theme {
        let at = Theme::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Theme::ALL[(at + 1) % Theme::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    /// Gradient stops from top-left to bottom-right; a flat colour has one.
    pub stops: Vec<Rgb>,
    /// Opacity of the two corner glows, forest only.
    pub glow: Option<(f32, f32)>,
}

impl Background {
    pub fn for_theme(theme: Theme, lighting: f32) -> Self {
        let lighting = lighting.clamp(0.0, 1.0);
        match theme {
            Theme::Forest => Background {
                stops: vec![
                    Rgb(26, 82, 64).dim_toward(40.0, lighting),
                    Rgb(42, 96, 80).dim_toward(60.0, lighting),
                    Rgb(35, 89, 75).dim_toward(50.0, lighting),
                ],
                glow: Some((0.1 * lighting, 0.15 * lighting)),
            },
            Theme::Warm => Background {
                stops: vec![Rgb(139, 125, 107).dim_toward(80.0, lighting)],
                glow: None,
            },
            Theme::Dark => Background {
                stops: vec![Rgb(45, 45, 50).dim_toward(20.0, lighting)],
                glow: None,
            },
            Theme::Classic => Background {
                stops: vec![Rgb(200, 200, 200).scaled(lighting)],
                glow: None,
            },
        }
    }

    /// How strongly the corner glows light a cell at `(x, y)`, both in
    /// `[0, 1]`. The first glow sits at 20%/80%, the second at 80%/20%.
    pub fn glow_at(&self, x: f32, y: f32) -> f32 {
        let Some((first, second)) = self.glow else {
            return 0.0;
        };
        let falloff = |cx: f32, cy: f32| {
            let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            (1.0 - d / 0.5).max(0.0)
        };
        first * falloff(0.2, 0.8) + second * falloff(0.8, 0.2)
    }

    pub fn sample(&self, t: f32) -> Rgb {
        match self.stops.as_slice() {
            [] => Rgb(0, 0, 0),
            [only] => *only,
            stops => {
                let t = t.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
                let i = (t.floor() as usize).min(stops.len() - 2);
                let f = t - i as f32;
                let (a, b) = (stops[i], stops[i + 1]);
                let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * f).round() as u8;
                Rgb(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
            }
        }
    }
}

pub const PAPER: Rgb = Rgb(250, 247, 240);

pub fn paper_color(lighting: f32) -> Rgb {
    PAPER.dim_toward(120.0, lighting.clamp(0.0, 1.0).max(0.35))
}

/// Typefaces offered in settings. A terminal draws in its own font, so only
/// the name is kept.
pub const FONTS: [&str; 4] = [
    "Special Elite",
    "Gabriele",
    "American Typewriter",
    "Courier New",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lighting_keeps_base_colours() {
        let bg = Background::for_theme(Theme::Forest, 1.0);
        assert_eq!(bg.stops, vec![Rgb(26, 82, 64), Rgb(42, 96, 80), Rgb(35, 89, 75)]);
        assert_eq!(bg.glow, Some((0.1, 0.15)));
    }

    #[test]
    fn dark_room_blends_to_grey() {
        let bg = Background::for_theme(Theme::Warm, 0.0);
        assert_eq!(bg.stops, vec![Rgb(80, 80, 80)]);
        let bg = Background::for_theme(Theme::Classic, 0.5);
        assert_eq!(bg.stops, vec![Rgb(100, 100, 100)]);
    }

    #[test]
    fn lighting_is_clamped() {
        assert_eq!(
            Background::for_theme(Theme::Dark, 3.0),
            Background::for_theme(Theme::Dark, 1.0)
        );
    }

    #[test]
    fn gradient_sampling_hits_stops() {
        let bg = Background::for_theme(Theme::Forest, 1.0);
        assert_eq!(bg.sample(0.0), Rgb(26, 82, 64));
        assert_eq!(bg.sample(0.5), Rgb(42, 96, 80));
        assert_eq!(bg.sample(1.0), Rgb(35, 89, 75));
    }

    #[test]
    fn themes_cycle() {
        assert_eq!(Theme::Dark.next(), Theme::Forest);
        assert_eq!(Theme::Forest.next(), Theme::Classic);
    }

    #[test]
    fn glow_peaks_at_its_corner() {
        let bg = Background::for_theme(Theme::Forest, 1.0);
        assert!((bg.glow_at(0.2, 0.8) - 0.1).abs() < 1e-6);
        assert!((bg.glow_at(0.8, 0.2) - 0.15).abs() < 1e-6);
        assert_eq!(bg.glow_at(0.0, 0.0), 0.0);
        assert_eq!(Background::for_theme(Theme::Dark, 1.0).glow_at(0.2, 0.8), 0.0);
        assert_eq!(Background::for_theme(Theme::Forest, 0.0).glow_at(0.2, 0.8), 0.0);
    }

    #[test]
    fn lightening_moves_toward_white() {
        assert_eq!(Rgb(0, 100, 255).lightened(0.5), Rgb(128, 178, 255));
        assert_eq!(Rgb(10, 20, 30).lightened(0.0), Rgb(10, 20, 30));
    }
}
