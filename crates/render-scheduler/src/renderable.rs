//! Display capability the scheduler draws into.

use field_engine::FieldFrame;

/// A surface that shows field frames.
///
/// The scheduler calls `attach` when the layer becomes active, `render`
/// with every accepted frame, `invalidate` when the current image must be
/// cleared, and `detach` when the layer is turned off. Layer opacity is a
/// display property: changing it never triggers a recompute.
pub trait Renderable {
    fn attach(&mut self) {}

    fn detach(&mut self) {}

    fn set_opacity(&mut self, _opacity: f32) {}

    /// Drop whatever is currently shown.
    fn invalidate(&mut self);

    /// Show `frame` in place of the current image.
    fn render(&mut self, frame: &FieldFrame);
}

impl<R: Renderable + ?Sized> Renderable for Box<R> {
    fn attach(&mut self) {
        (**self).attach()
    }

    fn detach(&mut self) {
        (**self).detach()
    }

    fn set_opacity(&mut self, opacity: f32) {
        (**self).set_opacity(opacity)
    }

    fn invalidate(&mut self) {
        (**self).invalidate()
    }

    fn render(&mut self, frame: &FieldFrame) {
        (**self).render(frame)
    }
}
