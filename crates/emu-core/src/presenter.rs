//! Frame output capability.

/// Receives completed frames from a machine.
///
/// Host front-ends implement this over a window or a capture file. The
/// frame is row-major ARGB, `width * height` pixels.
pub trait Presenter {
    fn present(&mut self, frame: &[u32], width: usize, height: usize);
}
