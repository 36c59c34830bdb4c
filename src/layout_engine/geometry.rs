use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::layout_engine::Orientation;

/// Integer pixel rectangle. Widths and heights are never negative once a
/// rectangle has gone through [`Rect::new`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    pub fn area(&self) -> i64 { i64::from(self.width) * i64::from(self.height) }

    pub fn right(&self) -> i32 { self.x + self.width }

    pub fn bottom(&self) -> i32 { self.y + self.height }

    /// Length along the axis an orientation divides.
    pub fn extent(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// Cuts `first_len` pixels off the start of the axis; the second part
    /// keeps whatever is left so nothing is lost to rounding.
    pub fn split_at(&self, orientation: Orientation, first_len: i32) -> (Rect, Rect) {
        let first_len = first_len.clamp(0, self.extent(orientation));
        match orientation {
            Orientation::Horizontal => (
                Rect { width: first_len, ..*self },
                Rect {
                    x: self.x + first_len,
                    width: self.width - first_len,
                    ..*self
                },
            ),
            Orientation::Vertical => (
                Rect { height: first_len, ..*self },
                Rect {
                    y: self.y + first_len,
                    height: self.height - first_len,
                    ..*self
                },
            ),
        }
    }

    pub fn is_wide(&self) -> bool { self.width > self.height }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// `WIDTHxHEIGHT+X+Y`, the usual X11 geometry notation. Offsets may be
/// negative (`1280x1024-1280+0`).
impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rectangle \"{0}\", expected WIDTHxHEIGHT+X+Y")]
pub struct RectParseError(pub String);

impl FromStr for Rect {
    type Err = RectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RectParseError(s.to_string());
        let trimmed = s.trim();
        let (size, offsets) = match trimmed.find(['+', '-']) {
            Some(pos) => trimmed.split_at(pos),
            None => (trimmed, ""),
        };
        let (w, h) = size.split_once('x').ok_or_else(err)?;
        let width: i32 = w.parse().map_err(|_| err())?;
        let height: i32 = h.parse().map_err(|_| err())?;
        if width < 0 || height < 0 {
            return Err(err());
        }

        let mut coords = [0i32; 2];
        let mut rest = offsets;
        for coord in coords.iter_mut() {
            if rest.is_empty() {
                break;
            }
            let sign = &rest[..1];
            let body = &rest[1..];
            let end = body.find(['+', '-']).unwrap_or(body.len());
            let value: i32 = body[..end].parse().map_err(|_| err())?;
            *coord = if sign == "-" { -value } else { value };
            rest = &body[end..];
        }
        if !rest.is_empty() {
            return Err(err());
        }
        Ok(Rect::new(coords[0], coords[1], width, height))
    }
}
