//! Affine transforms for drawing surfaces.
//!
//! Drawing uses the surface's current transform to find the device scale
//! used for baseline pixel alignment.

/// A 2D affine transformation matrix.
///
/// Stored as a 3x2 matrix in column-major order:
/// ```text
/// | m00 m10 m20 |   | scale_x  skew_x   translate_x |
/// | m01 m11 m21 | = | skew_y   scale_y  translate_y |
/// ```
///
/// # Examples
///
/// ```
/// use horizon_lattice_textframe::Transform2D;
///
/// assert_eq!(Transform2D::scale_xy(1.0, 2.0).vertical_scale(), 2.0);
/// assert_eq!(Transform2D::IDENTITY.vertical_scale(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    m: [f32; 6],
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Create a non-uniform scaling transform.
    #[inline]
    pub const fn scale_xy(sx: f32, sy: f32) -> Self {
        Self {
            m: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Length of the transformed unit y vector.
    #[inline]
    pub fn vertical_scale(&self) -> f32 {
        self.m[2].hypot(self.m[3])
    }
}

/// A stack of transforms for save/restore functionality.
#[derive(Debug, Clone)]
pub struct TransformStack {
    stack: Vec<Transform2D>,
    current: Transform2D,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    /// Create a new transform stack with identity transform.
    #[inline]
    pub fn new() -> Self {
        Self::with_base(Transform2D::IDENTITY)
    }

    /// Create a stack whose bottom transform is `base`.
    #[inline]
    pub fn with_base(base: Transform2D) -> Self {
        Self {
            stack: Vec::new(),
            current: base,
        }
    }

    #[inline]
    pub fn current(&self) -> &Transform2D {
        &self.current
    }

    /// Save the current transform state.
    #[inline]
    pub fn save(&mut self) {
        self.stack.push(self.current);
    }

    /// Restore the previously saved transform state.
    ///
    /// Does nothing if the stack is empty.
    #[inline]
    pub fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.current = transform;
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
