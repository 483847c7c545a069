use std::sync::OnceLock;

use num_bigint::BigUint;
use poseidon_bn254::Fr;

use crate::{CurveError, Result};

/// Twisted Edwards coefficient `a` in `a*x^2 + y^2 = 1 + d*x^2*y^2`.
pub const A: u64 = 168700;
/// Twisted Edwards coefficient `d`.
pub const D: u64 = 168696;
pub const COFACTOR: u64 = 8;

const CURVE_ORDER_BE: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x59, 0xf7, 0x6d, 0xc1, 0xc9, 0x07, 0x70, 0x53, 0x3b, 0x94, 0xbe, 0xe1, 0xc9, 0x09, 0x37, 0x88,
];

const GENERATOR_X_BE: [u8; 32] = [
    0x24, 0x91, 0xab, 0xa8, 0xd3, 0xa1, 0x91, 0xa7, 0x6e, 0x35, 0xbc, 0x47, 0xbd, 0x9a, 0xfe, 0x6c,
    0xc8, 0x8f, 0xee, 0x14, 0xd6, 0x07, 0xcb, 0xe7, 0x79, 0xf2, 0x34, 0x90, 0x47, 0xd5, 0xc1, 0x57,
];

const GENERATOR_Y_BE: [u8; 32] = [
    0x2e, 0x07, 0x29, 0x7f, 0x8d, 0x3c, 0x3d, 0x78, 0x18, 0xdb, 0xdd, 0xfd, 0x24, 0xc3, 0x55, 0x83,
    0xf9, 0xa9, 0xd4, 0xed, 0x0c, 0xb0, 0xc1, 0xd1, 0x34, 0x8d, 0xd8, 0xf7, 0xf9, 0x91, 0x52, 0xd7,
];

/// Order of the full curve group, `#E = 8 * L`.
pub fn curve_order() -> &'static BigUint {
    static E: OnceLock<BigUint> = OnceLock::new();
    E.get_or_init(|| BigUint::from_bytes_be(&CURVE_ORDER_BE))
}

/// Order `L` of the prime subgroup generated by [`Point::generator`].
pub fn subgroup_order() -> &'static BigUint {
    static L: OnceLock<BigUint> = OnceLock::new();
    L.get_or_init(|| curve_order() / BigUint::from(COFACTOR))
}

fn coeff_a() -> Fr {
    Fr::from_u64(A)
}

fn coeff_d() -> Fr {
    Fr::from_u64(D)
}

/// Affine point on Baby-Jubjub.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    x: Fr,
    y: Fr,
}

impl Point {
    /// Builds a point, rejecting coordinates that are not on the curve.
    pub fn new(x: Fr, y: Fr) -> Result<Self> {
        let point = Point { x, y };
        if !point.is_on_curve() {
            return Err(CurveError::NotOnCurve);
        }
        Ok(point)
    }

    pub fn identity() -> Self {
        Point {
            x: Fr::zero(),
            y: Fr::one(),
        }
    }

    /// Base point `B` of the prime-order subgroup.
    pub fn generator() -> Self {
        static B: OnceLock<Point> = OnceLock::new();
        B.get_or_init(|| Point {
            x: Fr::reduce(&BigUint::from_bytes_be(&GENERATOR_X_BE)),
            y: Fr::reduce(&BigUint::from_bytes_be(&GENERATOR_Y_BE)),
        })
        .clone()
    }

    pub fn x(&self) -> &Fr {
        &self.x
    }

    pub fn y(&self) -> &Fr {
        &self.y
    }

    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y == Fr::one()
    }

    pub fn is_on_curve(&self) -> bool {
        let xx = self.x.square();
        let yy = self.y.square();
        let lhs = coeff_a().mul(&xx).add(&yy);
        let rhs = Fr::one().add(&coeff_d().mul(&xx).mul(&yy));
        lhs == rhs
    }

    /// True when `L * self` is the identity.
    pub fn in_subgroup(&self) -> bool {
        self.mul(subgroup_order()).is_identity()
    }

    pub fn neg(&self) -> Point {
        Point {
            x: self.x.neg(),
            y: self.y.clone(),
        }
    }

    pub fn add(&self, other: &Point) -> Point {
        ProjectivePoint::from(self)
            .add(&ProjectivePoint::from(other))
            .to_affine()
    }

    pub fn double(&self) -> Point {
        self.add(self)
    }

    /// Scalar multiplication, MSB-first double-and-add in projective form with a
    /// single inversion at the end.
    pub fn mul(&self, scalar: &BigUint) -> Point {
        let base = ProjectivePoint::from(self);
        let mut acc = ProjectivePoint::identity();
        for i in (0..scalar.bits()).rev() {
            acc = acc.add(&acc);
            if scalar.bit(i) {
                acc = acc.add(&base);
            }
        }
        acc.to_affine()
    }

    /// Compressed encoding `y | (sign(x) << 255)`, as 32 little-endian bytes.
    pub fn compress(&self) -> [u8; 32] {
        let mut out = self.y.to_bytes_le();
        if self.x.is_negative() {
            out[31] |= 0x80;
        }
        out
    }

    /// Same value as [`Point::compress`], big-endian; this is the integer form
    /// embedded in `uint256` message fields.
    pub fn compress_be(&self) -> [u8; 32] {
        let mut out = self.compress();
        out.reverse();
        out
    }

    /// Inverse of [`Point::compress`].
    pub fn decompress(bytes: &[u8; 32]) -> Result<Point> {
        let mut y_bytes = *bytes;
        let sign = y_bytes[31] & 0x80 != 0;
        y_bytes[31] &= 0x7f;
        let y = Fr::from_bytes_le(&y_bytes).map_err(|_| CurveError::InvalidEncoding)?;
        Self::from_y(y, sign)
    }

    pub fn decompress_be(bytes: &[u8; 32]) -> Result<Point> {
        let mut le = *bytes;
        le.reverse();
        Self::decompress(&le)
    }

    /// Recovers `x` from `y` via `x^2 = (y^2 - 1) / (d*y^2 - a)`, picking the
    /// root whose sign matches `negative`.
    pub fn from_y(y: Fr, negative: bool) -> Result<Point> {
        let yy = y.square();
        let numerator = yy.sub(&Fr::one());
        let denominator = coeff_d().mul(&yy).sub(&coeff_a());
        let inv = denominator.inverse().ok_or(CurveError::InvalidEncoding)?;
        let mut x = numerator
            .mul(&inv)
            .sqrt()
            .ok_or(CurveError::InvalidEncoding)?;
        if x.is_negative() != negative {
            x = x.neg();
        }
        if x.is_zero() && negative {
            return Err(CurveError::InvalidEncoding);
        }
        Point::new(x, y)
    }
}

/// Projective coordinates for the unified add-2008-bbjlp formula; it has no
/// exceptional cases on this curve, so it also serves for doubling.
#[derive(Clone, Debug)]
struct ProjectivePoint {
    x: Fr,
    y: Fr,
    z: Fr,
}

impl ProjectivePoint {
    fn identity() -> Self {
        ProjectivePoint {
            x: Fr::zero(),
            y: Fr::one(),
            z: Fr::one(),
        }
    }

    fn add(&self, other: &ProjectivePoint) -> ProjectivePoint {
        let a = self.z.mul(&other.z);
        let b = a.square();
        let c = self.x.mul(&other.x);
        let d = self.y.mul(&other.y);
        let e = coeff_d().mul(&c).mul(&d);
        let f = b.sub(&e);
        let g = b.add(&e);

        let cross = self.x.add(&self.y).mul(&other.x.add(&other.y));
        let x3 = a.mul(&f).mul(&cross.sub(&c).sub(&d));
        let y3 = a.mul(&g).mul(&d.sub(&coeff_a().mul(&c)));
        let z3 = f.mul(&g);
        ProjectivePoint { x: x3, y: y3, z: z3 }
    }

    fn to_affine(&self) -> Point {
        match self.z.inverse() {
            Some(z_inv) => Point {
                x: self.x.mul(&z_inv),
                y: self.y.mul(&z_inv),
            },
            // unreachable for points produced by `add`, since d is a non-square
            None => Point::identity(),
        }
    }
}

impl From<&Point> for ProjectivePoint {
    fn from(p: &Point) -> Self {
        ProjectivePoint {
            x: p.x.clone(),
            y: p.y.clone(),
            z: Fr::one(),
        }
    }
}
