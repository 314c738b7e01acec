use crate::content::Asset;
use crate::engine::{Point, Rect, Size};

/// Evenly sliced sprite image, frames numbered row by row from the top left:
///
/// ┌────┬────┬────┐
/// │ 0  │ 1  │ 2  │
/// ├────┼────┼────┤
/// │ 3  │ 4  │ 5  │
/// └────┴────┴────┘
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSheet {
    image: Asset,
    frame_size: Size,
}

impl SpriteSheet {
    /// A zero frame size means "one frame covering the whole image"
    pub fn new(image: Asset, frame_size: Size) -> Self {
        let frame_size = Size {
            width: if frame_size.width > 0 { frame_size.width } else { image.size.width },
            height: if frame_size.height > 0 { frame_size.height } else { image.size.height },
        };
        SpriteSheet { image, frame_size }
    }

    pub fn image(&self) -> &Asset {
        &self.image
    }

    pub fn frame_size(&self) -> Size {
        self.frame_size
    }

    pub fn cols(&self) -> u32 {
        if self.frame_size.width <= 0 {
            return 0;
        }
        (self.image.size.width / self.frame_size.width).max(0) as u32
    }

    pub fn rows(&self) -> u32 {
        if self.frame_size.height <= 0 {
            return 0;
        }
        (self.image.size.height / self.frame_size.height).max(0) as u32
    }

    pub fn count(&self) -> u32 {
        // huge grids with tiny frames don't fit a u32
        self.cols().saturating_mul(self.rows())
    }

    /// Source rectangle of `frame`, wrapped by the frame count. A sheet too
    /// small to hold a single frame clips to an empty rect.
    pub fn clip(&self, frame: u32) -> Rect {
        let count = self.count();
        if count == 0 {
            return Rect::default();
        }
        let frame = frame % count;
        let col = (frame % self.cols()) as i32;
        let row = (frame / self.cols()) as i32;
        Rect::new(
            Point {
                x: col * self.frame_size.width,
                y: row * self.frame_size.height,
            },
            self.frame_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> SpriteSheet {
        SpriteSheet::new(
            Asset::image("hero", Size { width: 96, height: 64 }),
            Size { width: 32, height: 32 },
        )
    }

    #[test]
    fn grid_dimensions() {
        let sheet = sheet();
        assert_eq!((sheet.cols(), sheet.rows(), sheet.count()), (3, 2, 6));
    }

    #[test]
    fn clips_row_major() {
        let sheet = sheet();
        assert_eq!(sheet.clip(0), Rect::from_xywh(0, 0, 32, 32));
        assert_eq!(sheet.clip(2), Rect::from_xywh(64, 0, 32, 32));
        assert_eq!(sheet.clip(4), Rect::from_xywh(32, 32, 32, 32));
    }

    #[test]
    fn frame_indices_wrap() {
        let sheet = sheet();
        assert_eq!(sheet.clip(7), sheet.clip(1));
    }

    #[test]
    fn degenerate_sheets_clip_to_nothing() {
        let sheet = SpriteSheet::new(
            Asset::image("tiny", Size { width: 8, height: 8 }),
            Size { width: 32, height: 32 },
        );
        assert_eq!(sheet.count(), 0);
        assert!(sheet.clip(3).is_empty());
    }

    #[test]
    fn huge_grids_saturate() {
        let sheet = SpriteSheet::new(
            Asset::image("atlas", Size { width: 70_000, height: 70_000 }),
            Size { width: 1, height: 1 },
        );
        assert_eq!(sheet.count(), u32::MAX);
        assert_eq!(sheet.clip(70_001), Rect::from_xywh(1, 1, 1, 1));
    }

    #[test]
    fn zero_frame_size_uses_whole_image() {
        let image = Asset::image("bg", Size { width: 600, height: 400 });
        let sheet = SpriteSheet::new(image, Size::default());
        assert_eq!(sheet.count(), 1);
        assert_eq!(sheet.clip(0), Rect::from_xywh(0, 0, 600, 400));
    }
}
