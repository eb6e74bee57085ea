use std::cell::RefCell;
use std::rc::Rc;

/// Mutable visual surface a sequence drives.
///
/// Implementations cover whatever presentation backend hosts the sprite: a
/// DOM element, a terminal cell grid, a render node. The sequencer only needs
/// these setters; tasks use the subset matching their job.
pub trait VisualTarget {
    /// Sets the sprite-sheet or image source.
    fn set_image(&mut self, src: &str);

    /// Sets the sheet offset (background position) in pixels.
    fn set_offset(&mut self, x: f32, y: f32);

    /// Sets the absolute position in pixels.
    fn set_position(&mut self, x: f32, y: f32);
}

/// A target shared between queued tasks.
///
/// Everything runs on one logical thread, so shared mutation needs no
/// locking; tasks borrow the target only for the duration of one frame
/// update.
pub type SharedTarget = Rc<RefCell<dyn VisualTarget>>;

/// In-memory target recording the last applied state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sprite {
    pub image: Option<String>,
    pub offset: (f32, f32),
    pub position: (f32, f32),
}

impl Sprite {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sprite wrapped for sharing with queued tasks.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }
}

impl VisualTarget for Sprite {
    fn set_image(&mut self, src: &str) {
        self.image = Some(src.to_string());
    }

    fn set_offset(&mut self, x: f32, y: f32) {
        self.offset = (x, y);
    }

    fn set_position(&mut self, x: f32, y: f32) {
        self.position = (x, y);
    }
}
