//! Data definitions for the world's geometry and BSP tree.

use crate::*;

/// Type of plane depending on normal vector.
///
/// Referenced from the [Quake file format documentation](https://www.gamers.org/dEngine/quake/spec/quake-spec34/qkspec_4.htm#BL1), which Source still follows.
#[derive(BspValue, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(i32)]
pub enum BspPlaneType {
	/// Axial plane, in X
	AxialX = 0,
	/// Axial plane, in Y
	AxialY = 1,
	/// Axial plane, in Z
	AxialZ = 2,
	/// Non axial plane, roughly toward X
	AroundX = 3,
	/// Non axial plane, roughly toward Y
	AroundY = 4,
	/// Non axial plane, roughly toward Z
	AroundZ = 5,
}

#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspPlane {
	pub normal: Vec3,
	pub dist: f32,
	/// Type of plane depending on normal vector.
	pub ty: BspPlaneType,
}

#[derive(BspValue, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspEdge {
	/// The index to the first vertex this edge connects
	pub a: u16,
	/// The index to the second vertex this edge connects
	pub b: u16,
}

#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspFace {
	/// Index of the plane the face is parallel to
	pub plane_idx: u16,
	/// If not zero, the face is on the back side of its plane
	pub side: u8,
	/// Non-zero if the face lies on a node rather than a leaf
	pub on_node: u8,

	/// Index of the first edge (in the surface edge array)
	pub first_edge: i32,
	/// Number of consecutive edges (in the surface edge array)
	pub num_edges: i16,

	/// Index of the texture info structure
	pub tex_info_idx: i16,
	/// Index into the displacement info lump, or `-1` if this isn't a displacement.
	pub disp_info_idx: i16,
	pub surface_fog_volume_id: i16,

	/// Up to 4 lightmap styles, 255 meaning no lightmap in that slot.
	pub lightmap_styles: [u8; 4],
	/// Offset of the lightmap (in bytes) in the lighting lump, or -1 if no lightmap
	pub lightmap_offset: i32,

	/// Area of the face in world units squared.
	pub area: f32,
	pub lightmap_mins_in_luxels: IVec2,
	pub lightmap_size_in_luxels: IVec2,

	/// Index into [`BspData::original_faces`].
	pub original_face: i32,
	pub num_primitives: u16,
	pub first_primitive_id: u16,
	pub smoothing_groups: u32,
}

impl BspFace {
	/// Returns `true` if this face is the base of a displacement.
	#[inline]
	pub fn is_displacement(&self) -> bool {
		self.disp_info_idx != -1
	}

	/// Returns an iterator that retrieves the vertex positions that make up this face from `bsp`, in winding order.
	///
	/// Yields `None` for any vertex with an out-of-range surface edge, edge, or vertex index.
	pub fn vertices<'a>(&self, bsp: &'a BspData) -> impl Iterator<Item = Option<Vec3>> + 'a {
		let first_edge = self.first_edge.max(0) as usize;
		(first_edge..first_edge + self.num_edges.max(0) as usize).map(move |i| {
			let surf_edge = *bsp.surface_edges.get(i)?;
			let edge = bsp.edges.get(surf_edge.unsigned_abs() as usize)?;
			let vert_idx = if surf_edge.is_negative() { edge.b } else { edge.a };

			bsp.vertices.get(vert_idx as usize).copied()
		})
	}
}

#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspModel {
	pub bound: BoundingBox,
	/// Origin of model, usually (0,0,0)
	pub origin: Vec3,

	/// Index of the root node of this model's BSP tree.
	pub head_node: i32,
	pub first_face: i32,
	pub num_faces: i32,
}

#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspBrush {
	pub first_side: i32,
	pub num_sides: i32,
	/// `CONTENTS_*` flags of the brush.
	pub contents: i32,
}

#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspBrushSide {
	pub plane_idx: u16,
	pub tex_info_idx: i16,
	pub disp_info_idx: i16,
	/// Non-zero if this side is a bevel plane, used only for collision.
	pub bevel: i16,
}

/// A reference to a [`BspNode`]. Reads an `i32`, if positive it's an index of a node, if negative it's the index of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BspNodeRef {
	Node(u32),
	Leaf(u32),
}

impl BspNodeRef {
	pub fn from_i32(value: i32) -> Self {
		if value.is_negative() {
			Self::Leaf(value.unsigned_abs() - 1) // - 1 because you can't have -0
		} else {
			Self::Node(value as u32)
		}
	}

	pub fn node(&self) -> Option<u32> {
		match *self {
			Self::Node(i) => Some(i),
			Self::Leaf(_) => None,
		}
	}

	pub fn leaf(&self) -> Option<u32> {
		match *self {
			Self::Leaf(i) => Some(i),
			Self::Node(_) => None,
		}
	}
}

impl BspValue for BspNodeRef {
	fn bsp_parse(reader: &mut BspByteReader) -> BspResult<Self> {
		Ok(Self::from_i32(reader.read()?))
	}
	fn bsp_struct_size(_ctx: &BspParseContext) -> usize {
		size_of::<i32>()
	}
}

#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspNode {
	/// Index of the [`BspPlane`] that splits the node.
	pub plane_idx: i32,

	pub front: BspNodeRef,
	pub back: BspNodeRef,

	/// Bounding box of the node and all its children, for frustum culling.
	pub bound: ShortBoundingBox,
	/// Index of the first [`BspFace`] the node contains.
	pub first_face: u16,
	/// Number of faces this node contains, counting both sides.
	pub num_faces: u16,
	/// If all leaves below this node are in the same area, the index of that area, else `-1`.
	pub area: i16,
	pub _padding: Padding<2>,
}
