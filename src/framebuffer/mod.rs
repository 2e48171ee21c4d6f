//! Shared Pixel Buffer
//!
//! The rectangular raw-pixel surface shared between the active desktop
//! backend and the serving engine. The backend writes pixels, the serving
//! engine reads them; every write must be followed by an `add_changed`
//! notification before the engine next reads (see [`crate::engine`]).
//!
//! Pixel format is fixed at 32 bits per pixel, BGRX byte order (the
//! fourth byte is reserved and written as zero).

use parking_lot::RwLock;
use std::sync::Arc;

/// Bytes per pixel (BGRX).
pub const BYTES_PER_PIXEL: usize = 4;

/// A pixel buffer behind a reader/writer lock, shared between the active
/// backend (writer) and the serving engine (reader).
pub type SharedPixelBuffer = Arc<RwLock<PixelBuffer>>;

/// A point in framebuffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    /// X coordinate
    pub x: u16,
    /// Y coordinate
    pub y: u16,
}

impl Point {
    /// Create a new point
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle, half-open on the right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive)
    pub x1: u16,
    /// Top edge (inclusive)
    pub y1: u16,
    /// Right edge (exclusive)
    pub x2: u16,
    /// Bottom edge (exclusive)
    pub y2: u16,
}

impl Rect {
    /// Create a rectangle from its edges
    pub fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a rectangle from an origin and a size
    pub fn from_size(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x.saturating_add(width),
            y2: y.saturating_add(height),
        }
    }

    /// Rectangle width
    pub fn width(&self) -> u16 {
        self.x2.saturating_sub(self.x1)
    }

    /// Rectangle height
    pub fn height(&self) -> u16 {
        self.y2.saturating_sub(self.y1)
    }

    /// True if the rectangle encloses no pixels
    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Intersection with another rectangle (empty if disjoint)
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        }
    }

    /// Smallest rectangle covering both rectangles
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }
}

/// An RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red component
    pub r: u8,
    /// Green component
    pub g: u8,
    /// Blue component
    pub b: u8,
}

impl Rgb {
    /// Create a color from components
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    /// Black
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
}

/// A cursor image handed from the session engine to the serving engine.
///
/// `data` is BGRA, `width * height * 4` bytes. The hotspot is relative to
/// the top-left corner of the image.
#[derive(Debug, Clone)]
pub struct CursorImage {
    /// Image width in pixels
    pub width: u16,
    /// Image height in pixels
    pub height: u16,
    /// Hotspot position within the image
    pub hotspot: Point,
    /// BGRA pixel data
    pub data: Vec<u8>,
    /// Last known cursor position, if the engine reported one before a
    /// serving engine was attached
    pub position: Option<Point>,
}

/// A 32bpp BGRX framebuffer.
#[derive(Debug)]
pub struct PixelBuffer {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer filled with the given color.
    pub fn new(width: u16, height: u16, fill: Rgb) -> Self {
        let mut buffer = Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        };
        buffer.fill_rect(Rect::from_size(0, 0, width, height), fill);
        buffer
    }

    /// Create a shared buffer filled with the given color.
    pub fn new_shared(width: u16, height: u16, fill: Rgb) -> SharedPixelBuffer {
        Arc::new(RwLock::new(Self::new(width, height, fill)))
    }

    /// Buffer width in pixels
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in pixels
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Row stride in bytes
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Raw BGRX pixel data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bounds as a rectangle
    pub fn bounds(&self) -> Rect {
        Rect::from_size(0, 0, self.width, self.height)
    }

    /// Write one pixel. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u16, y: u16, color: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.data[offset] = color.b;
        self.data[offset + 1] = color.g;
        self.data[offset + 2] = color.r;
        self.data[offset + 3] = 0;
    }

    /// Read one pixel, or `None` if out of bounds.
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        Some(Rgb::new(
            self.data[offset + 2],
            self.data[offset + 1],
            self.data[offset],
        ))
    }

    /// Fill a rectangle, clipped to the buffer bounds.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let rect = rect.intersect(&self.bounds());
        for y in rect.y1..rect.y2 {
            for x in rect.x1..rect.x2 {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Replace the buffer contents with new dimensions, refilled with the
    /// given color. Used when the session desktop is resized.
    pub fn resize(&mut self, width: u16, height: u16, fill: Rgb) {
        self.width = width;
        self.height = height;
        self.data = vec![0; width as usize * height as usize * BYTES_PER_PIXEL];
        self.fill_rect(Rect::from_size(0, 0, width, height), fill);
    }
}
