//! Axis-aligned bounding boxes and segment picking

use crate::point::*;
use crate::transform::Transform3D;
use serde::{Deserialize, Serialize};

/// A line segment in world space, typically a picking ray clipped to a range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point3f,
    pub end: Point3f,
}

impl Segment {
    pub fn new(start: Point3f, end: Point3f) -> Self {
        Self { start, end }
    }

    /// Map both endpoints through `transform`
    pub fn transformed(&self, transform: &Transform3D) -> Self {
        Self {
            start: transform.transform_point(&self.start),
            end: transform.transform_point(&self.end),
        }
    }
}

/// Axis-aligned box in object space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3f,
    pub max: Point3f,
}

impl BoundingBox {
    pub fn new(min: Point3f, max: Point3f) -> Self {
        Self { min, max }
    }

    /// Box around the complete xyz triplets of a flat vertex buffer.
    ///
    /// `None` when the buffer holds no complete vertex.
    pub fn from_flat(vertices: &[f32]) -> Option<Self> {
        Self::from_points(points_from_flat(vertices))
    }

    /// Box around a set of points, `None` when empty
    pub fn from_points<I: IntoIterator<Item = Point3f>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;

        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some(Self { min, max })
    }

    /// Get the center point of the box
    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }

    /// Segment test in object space.
    ///
    /// `model` is the owning object's model matrix; the segment is brought
    /// into object space with its inverse. A singular model never intersects.
    pub fn is_intersecting(&self, segment: &Segment, model: &Transform3D) -> bool {
        match model.inverse() {
            Some(inv) => self.intersects_segment(&segment.transformed(&inv)),
            None => false,
        }
    }

    /// Slab test restricted to the segment's parameter range `[0, 1]`
    pub fn intersects_segment(&self, segment: &Segment) -> bool {
        let dir = segment.end - segment.start;
        let mut t_min = 0.0f32;
        let mut t_max = 1.0f32;

        for axis in 0..3 {
            let origin = segment.start[axis];
            let d = dir[axis];
            if d.abs() < f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return false;
                }
                continue;
            }

            let mut t1 = (self.min[axis] - origin) / d;
            let mut t2 = (self.max[axis] - origin) / d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return false;
            }
        }

        true
    }
}
