#[cfg(feature = "bevy_reflect")]
pub(crate) use bevy_reflect::prelude::*;
pub(crate) use glam::*;
#[cfg(feature = "serde")]
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use thiserror::Error;
pub(crate) use vbsp_macros::BspValue;

pub(crate) use crate::util::*;

pub use crate::{BspData, BspParseError, BspParseInput, BspParseSettings};
