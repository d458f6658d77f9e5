//! Light data definitions.

use crate::*;

/// How a [`BspWorldLight`] emits light.
#[derive(BspValue, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(i32)]
pub enum BspEmitType {
	/// 90 degree spotlight.
	Surface = 0,
	/// Simple point light source.
	Point = 1,
	/// Spotlight with penumbra.
	Spotlight = 2,
	/// Directional light with no falloff (surface must trace to a sky texture).
	Skylight = 3,
	/// Linear falloff, non-lambertian.
	QuakeLight = 4,
	/// Spherical light source with no falloff (surface must trace to a sky texture).
	SkyAmbient = 5,
}

/// A light used when compiling the map, kept around for lighting dynamic models.
#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspWorldLight {
	pub origin: Vec3,
	/// RGB intensity of the light.
	pub intensity: Vec3,
	/// Direction of spotlights and sky lights.
	pub normal: Vec3,
	/// Only present in files newer than version 20, see [`BspWorldLight::has_shadow_cast_offset`].
	#[bsp(present_if = Self::has_shadow_cast_offset)]
	pub shadow_cast_offset: Option<Vec3>,
	/// Visibility cluster the light is in.
	pub cluster: i32,
	pub ty: BspEmitType,
	/// Lightmap style, for flickering and switchable lights.
	pub style: i32,

	/// Cosine of the inner cone angle, for spotlights.
	pub stop_dot: f32,
	/// Cosine of the outer cone angle, for spotlights.
	pub stop_dot2: f32,
	pub exponent: f32,
	pub radius: f32,

	pub constant_attenuation: f32,
	pub linear_attenuation: f32,
	pub quadratic_attenuation: f32,

	pub flags: i32,
	pub tex_info_idx: i32,
	/// Entity that this light is for.
	pub owner: i32,
}

impl BspWorldLight {
	/// Whether world lights in a file of the given version store [`shadow_cast_offset`](Self::shadow_cast_offset).
	#[inline]
	pub fn has_shadow_cast_offset(ctx: &BspParseContext) -> bool {
		ctx.version > 20
	}
}
