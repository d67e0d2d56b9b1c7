//! The 3-D tracer block indexed by (tracer, layer, cell).

/// Tracer values for every (tracer, layer, cell).
///
/// Storage is cell-major: all layers of one column are contiguous, and
/// within a layer the tracers are contiguous. A column is therefore the
/// slice `column(c)` of length `level_count * tracer_count`, indexed as
/// `k * tracer_count + t`.
#[derive(Clone, Debug, PartialEq)]
pub struct TracerBlock {
    tracer_count: usize,
    level_count: usize,
    data: Vec<f64>,
}

impl TracerBlock {
    /// Zero-initialised block.
    pub fn new(tracer_count: usize, level_count: usize, cell_count: usize) -> Self {
        Self {
            tracer_count,
            level_count,
            data: vec![0.0; tracer_count * level_count * cell_count],
        }
    }

    /// Number of tracers.
    pub fn tracer_count(&self) -> usize {
        self.tracer_count
    }

    /// Number of vertical layers.
    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Values per column.
    pub fn column_len(&self) -> usize {
        self.tracer_count * self.level_count
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.data.len().checked_div(self.column_len()).unwrap_or(0)
    }

    fn index(&self, tracer: usize, layer: usize, cell: usize) -> usize {
        (cell * self.level_count + layer) * self.tracer_count + tracer
    }

    /// Value of `tracer` in `layer` of `cell`.
    pub fn get(&self, tracer: usize, layer: usize, cell: usize) -> f64 {
        self.data[self.index(tracer, layer, cell)]
    }

    /// Set the value of `tracer` in `layer` of `cell`.
    pub fn set(&mut self, tracer: usize, layer: usize, cell: usize, value: f64) {
        let i = self.index(tracer, layer, cell);
        self.data[i] = value;
    }

    /// One column, layer-major.
    pub fn column(&self, cell: usize) -> &[f64] {
        let n = self.column_len();
        &self.data[cell * n..(cell + 1) * n]
    }

    /// Mutable column, layer-major.
    pub fn column_mut(&mut self, cell: usize) -> &mut [f64] {
        let n = self.column_len();
        &mut self.data[cell * n..(cell + 1) * n]
    }

    /// Flat storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable flat storage.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_contiguous() {
        let mut t = TracerBlock::new(2, 3, 4);
        assert_eq!(t.cell_count(), 4);
        t.set(1, 2, 3, 7.0);
        t.set(0, 0, 3, 1.0);
        let col = t.column(3);
        assert_eq!(col.len(), 6);
        assert_eq!(col[0], 1.0);
        assert_eq!(col[2 * 2 + 1], 7.0);
        assert_eq!(t.get(1, 2, 3), 7.0);
    }

    #[test]
    fn zero_tracers_has_no_cells() {
        let t = TracerBlock::new(0, 3, 4);
        assert_eq!(t.column_len(), 0);
        assert_eq!(t.cell_count(), 0);
    }
}
