use crate::frame::Rgba;

/// Classifies a pixel as target or background.
pub trait TargetPredicate {
    fn is_target(&self, px: Rgba) -> bool;
}

impl<F> TargetPredicate for F
where
    F: Fn(Rgba) -> bool,
{
    fn is_target(&self, px: Rgba) -> bool {
        self(px)
    }
}

/// Blue-dominant color test: `blue > 2 * red && green > red`.
///
/// Constant cost per pixel; tuned for the tracked target under the vehicle's
/// camera, not a general color model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlueDominant;

impl TargetPredicate for BlueDominant {
    #[inline]
    fn is_target(&self, px: Rgba) -> bool {
        let (r, g, b) = (px.r as u16, px.g as u16, px.b as u16);
        b > 2 * r && g > r
    }
}
