use core::{fmt, iter::once, ops::{Add, Mul, Sub}};

#[allow(unused_imports)]
use micromath::F32Ext;
use serde::Deserialize;

use crate::ArgumentMnumonic;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum XYZId { X, Y, Z }
pub static XYZ_ID_LIST:[XYZId;3] = [XYZId::X, XYZId::Y, XYZId::Z];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct XYZData<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

/// A point or direction in machine units.
pub type Vector3 = XYZData<f32>;

impl<T> Add for XYZData<T> where T: Add::<Output=T> {
    type Output=XYZData<T>;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl<T> Sub for XYZData<T> where T: Sub::<Output=T> {
    type Output=XYZData<T>;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl<T> Mul<T> for XYZData<T> where T: Mul::<Output=T> + Copy {
    type Output=XYZData<T>;
    fn mul(self, rhs: T) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl<T> Default for XYZData<T> where T: Default {
    fn default() -> Self {
        Self {
            x: Default::default(),
            y: Default::default(),
            z: Default::default(),
        }
    }
}

impl<T> XYZData<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
    pub fn iter(&self) -> impl Iterator<Item=&T> {
        once(&self.x).chain(once(&self.y)).chain(once(&self.z))
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item=&mut T> {
        once(&mut self.x).chain(once(&mut self.y)).chain(once(&mut self.z))
    }
    /// Pairs every component with its axis, in X, Y, Z order.
    pub fn iter_axes(&self) -> impl Iterator<Item=(XYZId, &T)> {
        XYZ_ID_LIST.iter().copied().zip(self.iter())
    }
    pub fn match_id(&self, id: XYZId) -> &T {
        match id {
            XYZId::X => &self.x,
            XYZId::Y => &self.y,
            XYZId::Z => &self.z,
        }
    }
    pub fn match_id_mut(&mut self, id: XYZId) -> &mut T {
        match id {
            XYZId::X => &mut self.x,
            XYZId::Y => &mut self.y,
            XYZId::Z => &mut self.z,
        }
    }

    pub fn all(&self, predicate: impl Fn(&T) -> bool) -> bool {
        predicate(&self.x) && predicate(&self.y) && predicate(&self.z)
    }

    pub fn map<TR>(&self, p: impl Fn(&T) -> TR) -> XYZData<TR> {
        XYZData { x: p(&self.x), y: p(&self.y), z: p(&self.z) }
    }

    pub fn zip_map<U, TR>(&self, other: &XYZData<U>, p: impl Fn(&T, &U) -> TR) -> XYZData<TR> {
        XYZData { x: p(&self.x, &other.x), y: p(&self.y, &other.y), z: p(&self.z, &other.z) }
    }
}

impl<T: PartialOrd> XYZData<T> {
    /// Axis holding the largest component. Ties go to the earlier axis in X, Y, Z order.
    pub fn max_axis(&self) -> XYZId {
        XYZ_ID_LIST.iter().copied().fold(XYZId::X, |best, id| {
            if self.match_id(id) > self.match_id(best) { id } else { best }
        })
    }
}

impl XYZData<f32> {
    pub fn magnitude(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn dot(&self, rhs: &Self) -> f32 {
        (self.x * rhs.x) + (self.y * rhs.y) + (self.z * rhs.z)
    }

    /// Cosine of the angle between two vectors. Zero when either one has no length.
    pub fn cosine(&self, rhs: &Self) -> f32 {
        let magnitudes = self.magnitude() * rhs.magnitude();
        if magnitudes == 0.0 {
            return 0.0;
        }
        self.dot(rhs) / magnitudes
    }

    pub fn is_finite(&self) -> bool {
        self.all(|v| v.is_finite())
    }
}

impl XYZId {
    pub fn from_arg(value: ArgumentMnumonic) -> Option<Self> {
        match value {
            ArgumentMnumonic::X => Some(XYZId::X),
            ArgumentMnumonic::Y => Some(XYZId::Y),
            ArgumentMnumonic::Z => Some(XYZId::Z),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            XYZId::X => "X",
            XYZId::Y => "Y",
            XYZId::Z => "Z",
        }
    }
}

impl fmt::Display for XYZId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
