// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Geometric primitives and predicates.
//
// The sweep runs with x as the sweep direction and y as the vertical
// position of edges crossing the sweep line. The `vert_*`/`edge_*`
// predicates order and compare vertices in that frame; the `trans_*`
// variants swap the roles of x and y.

pub type Real = f64;
pub type Point = euclid::default::Point2D<Real>;
pub type Vector = euclid::default::Vector2D<Real>;
pub type BoundingBox = euclid::default::Box2D<Real>;

/// Tolerance used by the orientation predicates and the Delaunay builder.
pub const EPSILON: Real = 1e-9;

#[inline]
pub fn point(x: Real, y: Real) -> Point {
    Point::new(x, y)
}

#[inline]
pub fn vector(x: Real, y: Real) -> Vector {
    Vector::new(x, y)
}

/// -1, 0 or 1.
#[inline]
pub fn sign(value: Real) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Returns true if u is lexicographically <= v (x first, then y).
#[inline]
pub fn vert_leq(u: Point, v: Point) -> bool {
    u.x < v.x || (u.x == v.x && u.y <= v.y)
}

/// Exact positional equality.
#[inline]
pub fn vert_eq(u: Point, v: Point) -> bool {
    u.x == v.x && u.y == v.y
}

/// Returns true if u is lexicographically <= v with x and y transposed.
#[inline]
pub fn trans_leq(u: Point, v: Point) -> bool {
    u.y < v.y || (u.y == v.y && u.x <= v.x)
}

/// Given u, v, w with `vert_leq(u, v) && vert_leq(v, w)`, evaluates the
/// y-coordinate of segment uw at the x-coordinate of v and returns
/// `v.y - uw(v.x)`, the signed distance from uw to v. If uw is vertical
/// (passes through v) the result is zero.
pub fn edge_eval(u: Point, v: Point, w: Point) -> Real {
    let gap_l = v.x - u.x;
    let gap_r = w.x - v.x;
    if gap_l + gap_r > 0.0 {
        if gap_l < gap_r {
            (v.y - u.y) + (u.y - w.y) * (gap_l / (gap_l + gap_r))
        } else {
            (v.y - w.y) + (w.y - u.y) * (gap_r / (gap_l + gap_r))
        }
    } else {
        0.0
    }
}

/// Same sign as [`edge_eval`].
///
/// The cheaper cross-multiplied form loses accuracy when x-coordinates are
/// close to zero, so this simply forwards to `edge_eval`.
#[inline]
pub fn edge_sign(u: Point, v: Point, w: Point) -> Real {
    edge_eval(u, v, w)
}

/// [`edge_eval`] with x and y transposed.
pub fn trans_eval(u: Point, v: Point, w: Point) -> Real {
    let gap_l = v.y - u.y;
    let gap_r = w.y - v.y;
    if gap_l + gap_r > 0.0 {
        if gap_l < gap_r {
            (v.x - u.x) + (u.x - w.x) * (gap_l / (gap_l + gap_r))
        } else {
            (v.x - w.x) + (w.x - u.x) * (gap_r / (gap_l + gap_r))
        }
    } else {
        0.0
    }
}

/// Same sign as [`trans_eval`].
pub fn trans_sign(u: Point, v: Point, w: Point) -> Real {
    let gap_l = v.y - u.y;
    let gap_r = w.y - v.y;
    if gap_l + gap_r > 0.0 {
        (v.x - w.x) * gap_l + (v.x - u.x) * gap_r
    } else {
        0.0
    }
}

/// True if (u, v, w) turn counter-clockwise or are collinear.
#[inline]
pub fn vert_ccw(u: Point, v: Point, w: Point) -> bool {
    u.x * (v.y - w.y) + v.x * (w.y - u.y) + w.x * (u.y - v.y) >= 0.0
}

#[inline]
pub fn vert_l1_dist(u: Point, v: Point) -> Real {
    (u.x - v.x).abs() + (u.y - v.y).abs()
}

/// Twice the signed area of triangle (p1, p2, p3); positive when CCW.
#[inline]
pub fn twice_signed_area(p1: Point, p2: Point, p3: Point) -> Real {
    (p2 - p1).cross(p3 - p1)
}

#[inline]
pub fn signed_area(p1: Point, p2: Point, p3: Point) -> Real {
    0.5 * twice_signed_area(p1, p2, p3)
}

#[inline]
pub fn is_ccw(p1: Point, p2: Point, p3: Point, eps: Real) -> bool {
    twice_signed_area(p1, p2, p3) > eps
}

#[inline]
pub fn is_cw(p1: Point, p2: Point, p3: Point, eps: Real) -> bool {
    twice_signed_area(p1, p2, p3) < -eps
}

#[inline]
pub fn is_aligned(p1: Point, p2: Point, p3: Point, eps: Real) -> bool {
    twice_signed_area(p1, p2, p3).abs() <= eps
}

/// Signed area of a closed polygon; positive when CCW.
pub fn polygon_signed_area(points: &[Point]) -> Real {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        twice += p.x * q.y - q.x * p.y;
    }
    0.5 * twice
}

/// In-circle determinant: positive when `test` lies strictly inside the
/// circle through the CCW triangle (a, b, c).
pub fn in_circle(a: Point, b: Point, c: Point, test: Point) -> Real {
    let ad = a - test;
    let bd = b - test;
    let cd = c - test;

    let ab_det = ad.cross(bd);
    let bc_det = bd.cross(cd);
    let ca_det = cd.cross(ad);

    ad.square_length() * bc_det + bd.square_length() * ca_det + cd.square_length() * ab_det
}

#[inline]
pub fn is_in_circle(a: Point, b: Point, c: Point, test: Point) -> bool {
    in_circle(a, b, c, test) > 0.0
}

/// Numerically stable interpolation: `(b*x + a*y) / (a + b)`, or the midpoint
/// when both weights are zero. Negative weights are clamped to zero, and the
/// result always lies between x and y.
#[inline]
pub fn real_interpolate(mut a: Real, x: Real, mut b: Real, y: Real) -> Real {
    if a < 0.0 {
        a = 0.0;
    }
    if b < 0.0 {
        b = 0.0;
    }
    if a <= b {
        if b == 0.0 {
            x / 2.0 + y / 2.0
        } else {
            x + (y - x) * (a / (a + b))
        }
    } else {
        y + (x - y) * (b / (a + b))
    }
}

/// Intersection of segments (o1, d1) and (o2, d2).
///
/// Each coordinate is computed separately from the ordering along that
/// axis, which keeps the result inside the bounding rectangles of both
/// segments even when they are nearly parallel.
pub fn edge_intersect(o1: Point, d1: Point, o2: Point, d2: Point) -> Point {
    let x = {
        let (mut a, mut b, mut c, mut d) = (o1, d1, o2, d2);
        if !vert_leq(a, b) {
            std::mem::swap(&mut a, &mut b);
        }
        if !vert_leq(c, d) {
            std::mem::swap(&mut c, &mut d);
        }
        if !vert_leq(a, c) {
            std::mem::swap(&mut a, &mut c);
            std::mem::swap(&mut b, &mut d);
        }

        if !vert_leq(c, b) {
            // No overlap in x.
            c.x / 2.0 + b.x / 2.0
        } else if vert_leq(b, d) {
            let mut z1 = edge_eval(a, c, b);
            let mut z2 = edge_eval(c, b, d);
            if z1 + z2 < 0.0 {
                z1 = -z1;
                z2 = -z2;
            }
            real_interpolate(z1, c.x, z2, b.x)
        } else {
            // c..d lies inside a..b
            let mut z1 = edge_sign(a, c, b);
            let mut z2 = -edge_sign(a, d, b);
            if z1 + z2 < 0.0 {
                z1 = -z1;
                z2 = -z2;
            }
            real_interpolate(z1, c.x, z2, d.x)
        }
    };

    let y = {
        let (mut a, mut b, mut c, mut d) = (o1, d1, o2, d2);
        if !trans_leq(a, b) {
            std::mem::swap(&mut a, &mut b);
        }
        if !trans_leq(c, d) {
            std::mem::swap(&mut c, &mut d);
        }
        if !trans_leq(a, c) {
            std::mem::swap(&mut a, &mut c);
            std::mem::swap(&mut b, &mut d);
        }

        if !trans_leq(c, b) {
            c.y / 2.0 + b.y / 2.0
        } else if trans_leq(b, d) {
            let mut z1 = trans_eval(a, c, b);
            let mut z2 = trans_eval(c, b, d);
            if z1 + z2 < 0.0 {
                z1 = -z1;
                z2 = -z2;
            }
            real_interpolate(z1, c.y, z2, b.y)
        } else {
            let mut z1 = trans_sign(a, c, b);
            let mut z2 = -trans_sign(a, d, b);
            if z1 + z2 < 0.0 {
                z1 = -z1;
                z2 = -z2;
            }
            real_interpolate(z1, c.y, z2, d.y)
        }
    };

    point(x, y)
}
