use crate::codec::TokenStream;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Four-component value: (time, x, y, z) for positions or (E, px, py, pz) for momenta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector4 {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector4 {
    pub const ZERO: Vector4 = Vector4 {
        t: 0.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(t: f64, x: f64, y: f64, z: f64) -> Self {
        Self { t, x, y, z }
    }

    /// Build from a time-like component plus a spatial 3-vector.
    pub const fn from_parts(t: f64, spatial: [f64; 3]) -> Self {
        Self {
            t,
            x: spatial[0],
            y: spatial[1],
            z: spatial[2],
        }
    }

    pub const fn spatial(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Minkowski product with metric (+, -, -, -).
    pub fn dot(&self, other: &Vector4) -> f64 {
        self.t * other.t - self.x * other.x - self.y * other.y - self.z * other.z
    }

    /// Append the four tokens `t x y z`, each followed by a space.
    pub fn encode_into(&self, out: &mut String) {
        use std::fmt::Write;
        // Writing into a String cannot fail.
        let _ = write!(out, "{} {} {} {} ", self.t, self.x, self.y, self.z);
    }

    /// Consume exactly four numeric tokens.
    pub fn decode(tokens: &mut TokenStream<'_>) -> Result<Self> {
        let t = tokens.next_f64("vector t")?;
        let x = tokens.next_f64("vector x")?;
        let y = tokens.next_f64("vector y")?;
        let z = tokens.next_f64("vector z")?;
        Ok(Self { t, x, y, z })
    }
}

impl From<[f64; 4]> for Vector4 {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl Add for Vector4 {
    type Output = Vector4;

    fn add(self, rhs: Vector4) -> Vector4 {
        Vector4::new(self.t + rhs.t, self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector4 {
    type Output = Vector4;

    fn sub(self, rhs: Vector4) -> Vector4 {
        Vector4::new(self.t - rhs.t, self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Vector4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.t, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    #[test]
    fn test_arithmetic() {
        let a = Vector4::new(1.0, 2.0, 3.0, 4.0);
        let b = Vector4::from_parts(0.5, [1.0, 1.0, 1.0]);

        assert_eq!(a + b, Vector4::new(1.5, 3.0, 4.0, 5.0));
        assert_eq!(a - b, Vector4::new(0.5, 1.0, 2.0, 3.0));
        assert_eq!(a.dot(&b), 0.5 - 2.0 - 3.0 - 4.0);
    }

    #[test]
    fn test_decode_reads_exactly_four_tokens() {
        let mut tokens = TokenStream::new("1 2.5 -3 4e2 99");
        let v = Vector4::decode(&mut tokens).unwrap();

        assert_eq!(v, Vector4::new(1.0, 2.5, -3.0, 400.0));
        assert_eq!(tokens.next_token(), Some("99"));
    }

    #[test]
    fn test_decode_rejects_short_or_non_numeric_input() {
        let mut short = TokenStream::new("1 2 3");
        assert!(matches!(
            Vector4::decode(&mut short),
            Err(GraphError::Format(_))
        ));

        let mut bad = TokenStream::new("1 2 x 4");
        assert!(matches!(Vector4::decode(&mut bad), Err(GraphError::Format(_))));
    }

    #[test]
    fn test_encode_is_lossless() {
        let v = Vector4::new(0.1 + 0.2, 1e-300, -7.25, 123456.789);
        let mut out = String::new();
        v.encode_into(&mut out);

        let decoded = Vector4::decode(&mut TokenStream::new(&out)).unwrap();
        assert_eq!(decoded, v);
    }
}
