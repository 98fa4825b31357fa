pub trait Progress {
    fn inc(&self, i: u64);
    fn finish(&self);
}

/// Bin-wise accumulation of compatible objects
pub trait AddScaled<Rhs = Self> {
    type Error;

    /// Add `weight * other` to `self`
    ///
    /// On error `self` is left unchanged.
    fn add_scaled(&mut self, other: &Rhs, weight: f64) -> Result<(), Self::Error>;

    /// Add `other` to `self`
    fn add(&mut self, other: &Rhs) -> Result<(), Self::Error> {
        self.add_scaled(other, 1.)
    }
}

/// Multiplication of all contents by a constant factor
pub trait Scale {
    fn scale(&mut self, factor: f64);
}
