//! Rectangular extents and rotation-aware fitting.
//!
//! A [`Dimensions`] value is an immutable `(height, width, length)` triple.
//! Fitting allows any of the six 90° axis permutations, compared
//! component-wise against the container without tolerance.

use std::fmt;

use serde::Serialize;

use crate::error::{DomainError, Result};

pub const NON_POSITIVE_REASON: &str = "All dimensions must be positive numbers";
pub const NON_FINITE_REASON: &str = "All dimensions must be finite numbers";

/// Immutable height/width/length triple with positive, finite extents.
///
/// Equality is exact and positional: `10 x 20 x 30` is not equal to
/// `20 x 10 x 30` even though one is a rotation of the other.
///
/// # Examples
/// ```
/// use order_packer::dimensions::Dimensions;
///
/// let dims = Dimensions::new(10.0, 20.0, 30.0).unwrap();
/// assert_eq!(dims.volume(), 6000.0);
/// assert!(Dimensions::new(0.0, 20.0, 30.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Dimensions {
    height: f64,
    width: f64,
    length: f64,
}

impl Dimensions {
    /// Creates validated dimensions.
    ///
    /// Positivity is checked on all three axes before finiteness, so `-inf`
    /// reports as non-positive while `NaN` and `+inf` report as non-finite.
    pub fn new(height: f64, width: f64, length: f64) -> Result<Self> {
        validation::validate_extents(height, width, length)?;
        Ok(Self {
            height,
            width,
            length,
        })
    }

    /// Builds dimensions from extents known to be valid (permutations of a
    /// validated value, compile-time catalog entries).
    #[inline]
    pub(crate) const fn new_unchecked(height: f64, width: f64, length: f64) -> Self {
        Self {
            height,
            width,
            length,
        }
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    #[inline]
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.height, self.width, self.length)
    }

    /// Product of the three extents.
    ///
    /// Extents are multiplied smallest first, so every rotation of the same
    /// triple yields a bit-identical volume.
    pub fn volume(&self) -> f64 {
        let mut extents = [self.height, self.width, self.length];
        extents.sort_by(f64::total_cmp);
        extents[0] * extents[1] * extents[2]
    }

    /// Component-wise containment without rotation.
    #[inline]
    pub fn fits_within(&self, container: &Dimensions) -> bool {
        self.height <= container.height
            && self.width <= container.width
            && self.length <= container.length
    }

    /// Returns the distinct axis permutations of these dimensions.
    ///
    /// Enumeration order is (h,w,l), (h,l,w), (w,h,l), (w,l,h), (l,h,w),
    /// (l,w,h). Coinciding permutations keep their first occurrence, so the
    /// result has 1, 3 or 6 entries.
    pub fn all_rotations(&self) -> Vec<Dimensions> {
        let (h, w, l) = self.as_tuple();
        let candidates = [
            Self::new_unchecked(h, w, l),
            Self::new_unchecked(h, l, w),
            Self::new_unchecked(w, h, l),
            Self::new_unchecked(w, l, h),
            Self::new_unchecked(l, h, w),
            Self::new_unchecked(l, w, h),
        ];

        let mut rotations: Vec<Dimensions> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !rotations.contains(&candidate) {
                rotations.push(candidate);
            }
        }
        rotations
    }

    /// Checks whether some rotation fits inside `container`.
    pub fn can_fit_inside(&self, container: &Dimensions) -> bool {
        self.all_rotations()
            .iter()
            .any(|rotation| rotation.fits_within(container))
    }

    /// Picks the fitting rotation with the highest volume ratio.
    ///
    /// Ties keep the first rotation in enumeration order. Returns `None` if no
    /// rotation fits.
    pub fn best_fit_rotation(&self, container: &Dimensions) -> Option<Dimensions> {
        let container_volume = container.volume();
        let mut best: Option<(Dimensions, f64)> = None;

        for rotation in self.all_rotations() {
            if !rotation.fits_within(container) {
                continue;
            }
            let utilization = rotation.volume() / container_volume;
            match best {
                Some((_, best_utilization)) if utilization <= best_utilization => {}
                _ => best = Some((rotation, utilization)),
            }
        }

        best.map(|(rotation, _)| rotation)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} x {}", self.height, self.width, self.length)
    }
}

impl TryFrom<(f64, f64, f64)> for Dimensions {
    type Error = DomainError;

    fn try_from(tuple: (f64, f64, f64)) -> Result<Self> {
        Self::new(tuple.0, tuple.1, tuple.2)
    }
}

impl From<Dimensions> for (f64, f64, f64) {
    fn from(dims: Dimensions) -> Self {
        dims.as_tuple()
    }
}

/// Trait for entities that own a [`Dimensions`] value.
pub trait Dimensional {
    fn dimensions(&self) -> &Dimensions;

    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    /// Checks whether this object fits into a container in some rotation.
    fn can_fit_inside(&self, container: &Dimensions) -> bool {
        self.dimensions().can_fit_inside(container)
    }

    fn best_fit_rotation(&self, container: &Dimensions) -> Option<Dimensions> {
        self.dimensions().best_fit_rotation(container)
    }
}

/// Extent validation shared by every constructor.
pub mod validation {
    use super::{NON_FINITE_REASON, NON_POSITIVE_REASON};
    use crate::error::{DomainError, Result};

    pub fn validate_extents(height: f64, width: f64, length: f64) -> Result<()> {
        if height <= 0.0 || width <= 0.0 || length <= 0.0 {
            return Err(DomainError::invalid(NON_POSITIVE_REASON));
        }
        if !height.is_finite() || !width.is_finite() || !length.is_finite() {
            return Err(DomainError::invalid(NON_FINITE_REASON));
        }
        Ok(())
    }
}
