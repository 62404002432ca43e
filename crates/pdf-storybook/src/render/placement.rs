//! Content placement math and drawing operators
//!
//! Frames are given in the upright output page. A 180° item is drawn as if
//! the whole page were turned about its centre: its rectangle is mirrored
//! through the page centre and its content painted upside down.

use crate::layout::Rect;
use crate::types::{PageSize, Rotation, ScalingMode};

/// Where content of a given natural size lands in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Drawn area of the content, possibly larger than the frame
    pub rect: Rect,
    /// Clip applied while drawing (the frame)
    pub clip: Option<Rect>,
}

/// Size `content_w × content_h` into `frame`, centred
pub fn place_content(
    content_w: f32,
    content_h: f32,
    frame: &Rect,
    scaling: ScalingMode,
) -> Placement {
    if content_w <= 0.0 || content_h <= 0.0 {
        return Placement {
            rect: *frame,
            clip: None,
        };
    }

    let (w, h) = match scaling {
        ScalingMode::Fit => {
            let scale = (frame.width / content_w).min(frame.height / content_h);
            (content_w * scale, content_h * scale)
        }
        ScalingMode::Fill => {
            let scale = (frame.width / content_w).max(frame.height / content_h);
            (content_w * scale, content_h * scale)
        }
        ScalingMode::Stretch => (frame.width, frame.height),
    };

    let rect = Rect::new(
        frame.x + (frame.width - w) / 2.0,
        frame.y + (frame.height - h) / 2.0,
        w,
        h,
    );
    let clip = (scaling == ScalingMode::Fill).then_some(*frame);
    Placement { rect, clip }
}

/// Mirror a rectangle through the page centre
pub fn mirror(rect: &Rect, page: &PageSize) -> Rect {
    Rect::new(
        page.width_pt - rect.x - rect.width,
        page.height_pt - rect.y - rect.height,
        rect.width,
        rect.height,
    )
}

/// Apply an item's rotation to its placement on the page
pub fn oriented(placement: Placement, rotation: Rotation, page: &PageSize) -> Placement {
    match rotation {
        Rotation::None => placement,
        Rotation::Clockwise180 => Placement {
            rect: mirror(&placement.rect, page),
            clip: placement.clip.map(|c| mirror(&c, page)),
        },
    }
}

/// Draw an Image XObject (unit square) into `placement`
pub fn image_command(name: &str, placement: &Placement, rotation: Rotation) -> String {
    let r = &placement.rect;
    let matrix = match rotation {
        Rotation::None => [r.width, 0.0, 0.0, r.height, r.x, r.y],
        Rotation::Clockwise180 => [-r.width, 0.0, 0.0, -r.height, r.right(), r.top()],
    };
    wrap(name, &matrix, placement.clip.as_ref())
}

/// Draw a Form XObject whose BBox is `source` into `placement`
pub fn form_command(
    name: &str,
    source: &Rect,
    placement: &Placement,
    rotation: Rotation,
) -> String {
    let r = &placement.rect;
    let sx = r.width / source.width;
    let sy = r.height / source.height;
    let matrix = match rotation {
        Rotation::None => [sx, 0.0, 0.0, sy, r.x - source.x * sx, r.y - source.y * sy],
        Rotation::Clockwise180 => [
            -sx,
            0.0,
            0.0,
            -sy,
            r.right() + source.x * sx,
            r.top() + source.y * sy,
        ],
    };
    wrap(name, &matrix, placement.clip.as_ref())
}

fn wrap(name: &str, m: &[f32; 6], clip: Option<&Rect>) -> String {
    let clip = clip
        .map(|c| format!("{} {} {} {} re W n ", c.x, c.y, c.width, c.height))
        .unwrap_or_default();
    format!(
        "q {}{} {} {} {} {} {} cm /{} Do Q\n",
        clip, m[0], m[1], m[2], m[3], m[4], m[5], name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_centres_and_preserves_aspect() {
        let frame = Rect::new(0.0, 0.0, 400.0, 400.0);
        let p = place_content(800.0, 600.0, &frame, ScalingMode::Fit);
        assert_eq!(p.rect, Rect::new(0.0, 50.0, 400.0, 300.0));
        assert_eq!(p.clip, None);
    }

    #[test]
    fn test_fill_overflows_and_clips() {
        let frame = Rect::new(0.0, 0.0, 400.0, 400.0);
        let p = place_content(800.0, 400.0, &frame, ScalingMode::Fill);
        assert_eq!(p.rect, Rect::new(-200.0, 0.0, 800.0, 400.0));
        assert_eq!(p.clip, Some(frame));
    }

    #[test]
    fn test_stretch_matches_frame() {
        let frame = Rect::new(10.0, 20.0, 100.0, 50.0);
        let p = place_content(3.0, 7.0, &frame, ScalingMode::Stretch);
        assert_eq!(p.rect, frame);
    }

    #[test]
    fn test_mirror_moves_left_half_to_right() {
        let page = PageSize::new(842.0, 595.0);
        let left = Rect::new(0.0, 0.0, 421.0, 595.0);
        assert_eq!(mirror(&left, &page), Rect::new(421.0, 0.0, 421.0, 595.0));
    }

    #[test]
    fn test_image_command_rotated() {
        let p = Placement {
            rect: Rect::new(421.0, 0.0, 421.0, 595.0),
            clip: None,
        };
        assert_eq!(
            image_command("Im0", &p, Rotation::Clockwise180),
            "q -421 0 0 -595 842 595 cm /Im0 Do Q\n"
        );
    }

    #[test]
    fn test_form_command_offsets_source_origin() {
        let source = Rect::new(100.0, 0.0, 100.0, 200.0);
        let p = Placement {
            rect: Rect::new(0.0, 0.0, 50.0, 100.0),
            clip: None,
        };
        assert_eq!(
            form_command("P0", &source, &p, Rotation::None),
            "q 0.5 0 0 0.5 -50 0 cm /P0 Do Q\n"
        );
    }
}
