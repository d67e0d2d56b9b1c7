//! The typed field table: [`FieldName`], [`ElementKind`] and the [`FieldSet`] bitset.
//!
//! Every evolving field a block carries is named here. Stages declare the
//! fields they read and write as [`FieldSet`]s, which lets the pipeline
//! validator reason about halo staleness without string lookups.

use std::fmt;

/// Mesh element a field is located on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Cell centres (one column per cell).
    Cell,
    /// Edge midpoints between two cells.
    Edge,
    /// Vertices shared by `vertex_degree` cells.
    Vertex,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell => write!(f, "cell"),
            Self::Edge => write!(f, "edge"),
            Self::Vertex => write!(f, "vertex"),
        }
    }
}

/// Names of the per-block evolving fields held in a state snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldName {
    /// Total ice thickness per cell.
    Thickness = 0,
    /// Layer thickness per (cell, layer).
    LayerThickness = 1,
    /// Tracer values per (tracer, layer, cell).
    Tracers = 2,
    /// Cell mask bits.
    CellMask = 3,
    /// Edge mask bits.
    EdgeMask = 4,
    /// Vertex mask bits.
    VertexMask = 5,
    /// Upper surface elevation per cell.
    UpperSurface = 6,
    /// Lower surface elevation per cell.
    LowerSurface = 7,
    /// Edge-normal velocity per (edge, layer).
    NormalVelocity = 8,
    /// Reconstructed x velocity per (cell, layer).
    UReconstructX = 9,
    /// Reconstructed y velocity per (cell, layer).
    UReconstructY = 10,
    /// Upwinded layer thickness per (edge, layer).
    LayerThicknessEdge = 11,
    /// Ice thickness interpolated to vertices.
    ThicknessVertex = 12,
    /// Upper surface elevation interpolated to vertices.
    UpperSurfaceVertex = 13,
}

impl FieldName {
    /// All field names in declaration order.
    pub const ALL: [FieldName; 14] = [
        Self::Thickness,
        Self::LayerThickness,
        Self::Tracers,
        Self::CellMask,
        Self::EdgeMask,
        Self::VertexMask,
        Self::UpperSurface,
        Self::LowerSurface,
        Self::NormalVelocity,
        Self::UReconstructX,
        Self::UReconstructY,
        Self::LayerThicknessEdge,
        Self::ThicknessVertex,
        Self::UpperSurfaceVertex,
    ];

    /// The element kind this field lives on.
    pub fn element(self) -> ElementKind {
        match self {
            Self::Thickness
            | Self::LayerThickness
            | Self::Tracers
            | Self::CellMask
            | Self::UpperSurface
            | Self::LowerSurface
            | Self::UReconstructX
            | Self::UReconstructY => ElementKind::Cell,
            Self::EdgeMask | Self::NormalVelocity | Self::LayerThicknessEdge => ElementKind::Edge,
            Self::VertexMask | Self::ThicknessVertex | Self::UpperSurfaceVertex => {
                ElementKind::Vertex
            }
        }
    }

    /// Whether the field stores one value per vertical layer.
    pub fn is_layered(self) -> bool {
        matches!(
            self,
            Self::LayerThickness
                | Self::Tracers
                | Self::NormalVelocity
                | Self::UReconstructX
                | Self::UReconstructY
                | Self::LayerThicknessEdge
        )
    }

    /// Whether the field holds [`Mask`](crate::Mask) bits rather than reals.
    pub fn is_mask(self) -> bool {
        matches!(self, Self::CellMask | Self::EdgeMask | Self::VertexMask)
    }

    /// Canonical snake_case name, used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thickness => "thickness",
            Self::LayerThickness => "layer_thickness",
            Self::Tracers => "tracers",
            Self::CellMask => "cell_mask",
            Self::EdgeMask => "edge_mask",
            Self::VertexMask => "vertex_mask",
            Self::UpperSurface => "upper_surface",
            Self::LowerSurface => "lower_surface",
            Self::NormalVelocity => "normal_velocity",
            Self::UReconstructX => "u_reconstruct_x",
            Self::UReconstructY => "u_reconstruct_y",
            Self::LayerThicknessEdge => "layer_thickness_edge",
            Self::ThicknessVertex => "thickness_vertex",
            Self::UpperSurfaceVertex => "upper_surface_vertex",
        }
    }

    /// Resolve a canonical name back to a [`FieldName`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    fn bit(self) -> u32 {
        1u32 << (self as u8)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of field names implemented as a single-word bitset.
///
/// Used by stages to declare which fields they read and write, so the
/// pipeline validator can check halo-exchange ordering once at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldSet {
    bits: u32,
}

impl FieldSet {
    /// Create an empty field set.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Insert a field into the set.
    pub fn insert(&mut self, field: FieldName) {
        self.bits |= field.bit();
    }

    /// Remove a field from the set.
    pub fn remove(&mut self, field: FieldName) {
        self.bits &= !field.bit();
    }

    /// Check whether the set contains a field.
    pub fn contains(&self, field: FieldName) -> bool {
        self.bits & field.bit() != 0
    }

    /// Return the union of two sets (`self | other`).
    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Return the intersection of two sets (`self & other`).
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    /// Return the set difference (`self - other`).
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    /// Returns `true` if the set contains no fields.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns the number of fields in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterate over the fields in the set, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = FieldName> + '_ {
        FieldName::ALL.into_iter().filter(|f| self.contains(*f))
    }
}

impl FromIterator<FieldName> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldName>>(iter: I) -> Self {
        let mut set = Self::empty();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, field) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_field_set() -> impl Strategy<Value = FieldSet> {
        prop::collection::vec(0usize..FieldName::ALL.len(), 0..10)
            .prop_map(|ids| ids.into_iter().map(|i| FieldName::ALL[i]).collect())
    }

    #[test]
    fn names_round_trip() {
        for field in FieldName::ALL {
            assert_eq!(FieldName::from_name(field.as_str()), Some(field));
        }
        assert_eq!(FieldName::from_name("velocity"), None);
    }

    #[test]
    fn layered_fields_live_on_cells_or_edges() {
        for field in FieldName::ALL.into_iter().filter(|f| f.is_layered()) {
            assert_ne!(field.element(), ElementKind::Vertex, "{field}");
        }
    }

    #[test]
    fn display_lists_members_in_order() {
        let set: FieldSet = [FieldName::EdgeMask, FieldName::Thickness]
            .into_iter()
            .collect();
        assert_eq!(set.to_string(), "{thickness, edge_mask}");
    }

    proptest! {
        #[test]
        fn union_commutative(a in arb_field_set(), b in arb_field_set()) {
            prop_assert_eq!(a.union(&b), b.union(&a));
        }

        #[test]
        fn difference_removes_common(a in arb_field_set(), b in arb_field_set()) {
            let diff = a.difference(&b);
            for field in diff.iter() {
                prop_assert!(a.contains(field));
                prop_assert!(!b.contains(field));
            }
        }

        #[test]
        fn insert_then_remove(idx in 0usize..14) {
            let field = FieldName::ALL[idx];
            let mut set = FieldSet::empty();
            set.insert(field);
            prop_assert!(set.contains(field));
            prop_assert_eq!(set.len(), 1);
            set.remove(field);
            prop_assert!(set.is_empty());
        }

        #[test]
        fn len_matches_iter_count(a in arb_field_set()) {
            prop_assert_eq!(a.len(), a.iter().count());
        }
    }
}
