use crate::geometry::Dimensions;

/// Player state the engine reads when marking scene boundaries.
///
/// Implemented by whatever hosts the source video. The engine never decodes
/// media itself.
pub trait PlaybackSurface {
    /// Current playhead position in seconds, if a source is loaded.
    fn current_time(&self) -> Option<f64>;

    /// Native frame size of the loaded source.
    fn source_dimensions(&self) -> Option<Dimensions>;
}

/// Surface with no player attached, used by headless tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPlayback;

impl PlaybackSurface for NoPlayback {
    fn current_time(&self) -> Option<f64> {
        None
    }

    fn source_dimensions(&self) -> Option<Dimensions> {
        None
    }
}

impl<P> PlaybackSurface for &P
where
    P: PlaybackSurface + ?Sized,
{
    fn current_time(&self) -> Option<f64> {
        (**self).current_time()
    }

    fn source_dimensions(&self) -> Option<Dimensions> {
        (**self).source_dimensions()
    }
}
